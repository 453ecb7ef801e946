use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::cluster_status::{
    CLUSTER_STATUS_PERSIST_KEY, ClusterStatusPatch, ClusterStatusValue, RunMode,
};
use crate::fixtures;
use crate::service::{HostComponent, Service, WorkStatus};
use crate::slider::{SliderApp, SliderAppRecord};

const REQUESTED_BY: &str = "ambari-cockpit";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and how to reach the cluster manager.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GatewaySettings {
    pub server: String,
    pub cluster: Option<String>,
    pub user: String,
    pub password: String,
    pub slider_instance: Option<String>,
    pub slider_version: String,
    pub mode: RunMode,
}

#[derive(Debug, Deserialize)]
struct ItemList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ClusterItem {
    #[serde(rename = "Clusters")]
    clusters: ClusterInfo,
}

#[derive(Debug, Deserialize)]
struct ClusterInfo {
    cluster_name: String,
}

#[derive(Debug, Deserialize)]
struct ServiceItem {
    #[serde(rename = "ServiceInfo")]
    info: ServiceInfo,
    #[serde(default)]
    alerts_summary: Option<AlertsSummary>,
}

#[derive(Debug, Deserialize)]
struct ServiceInfo {
    service_name: String,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    maintenance_state: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct AlertsSummary {
    #[serde(rename = "CRITICAL", default)]
    critical: u32,
}

#[derive(Debug, Deserialize)]
struct HostComponentItem {
    #[serde(rename = "HostRoles")]
    roles: HostRoles,
}

#[derive(Debug, Deserialize)]
struct HostRoles {
    service_name: String,
    component_name: String,
    host_name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    stale_configs: bool,
}

#[derive(Debug, Deserialize)]
struct HostItem {
    #[serde(rename = "Hosts")]
    info: HostInfo,
}

#[derive(Debug, Deserialize)]
struct HostInfo {
    host_name: String,
    #[serde(default)]
    public_host_name: Option<String>,
}

#[derive(Clone)]
pub struct AmbariGateway {
    client: reqwest::Client,
    base_url: String,
    user: String,
    password: String,
    cluster: String,
    slider_apps_path: Option<String>,
    mode: RunMode,
}

impl AmbariGateway {
    pub fn new(settings: &GatewaySettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        let slider_apps_path = settings.slider_instance.as_ref().map(|instance| {
            format!(
                "/api/v1/views/SLIDER/versions/{}/instances/{instance}/apps",
                settings.slider_version
            )
        });
        Ok(Self {
            client,
            base_url: settings.server.trim_end_matches('/').to_string(),
            user: settings.user.clone(),
            password: settings.password.clone(),
            cluster: settings.cluster.clone().unwrap_or_default(),
            slider_apps_path,
            mode: settings.mode,
        })
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn server(&self) -> &str {
        match self.mode {
            RunMode::Live => &self.base_url,
            RunMode::Offline => "offline",
        }
    }

    /// Uses the configured cluster, or the first one the server reports.
    pub async fn discover_cluster(&mut self) -> Result<String> {
        if !self.cluster.is_empty() {
            return Ok(self.cluster.clone());
        }
        let clusters: ItemList<ClusterItem> = self.get_json("/api/v1/clusters").await?;
        let Some(first) = clusters.items.into_iter().next() else {
            bail!("server {} reports no clusters", self.server());
        };
        self.cluster = first.clusters.cluster_name;
        info!(cluster = %self.cluster, "discovered cluster");
        Ok(self.cluster.clone())
    }

    pub async fn fetch_services(&self) -> Result<Vec<Service>> {
        let cluster = self.cluster_path()?;
        let services_path = format!(
            "{cluster}/services?fields=ServiceInfo/state,ServiceInfo/maintenance_state,alerts_summary"
        );
        let components_path = format!(
            "{cluster}/host_components?fields=HostRoles/state,HostRoles/stale_configs,\
             HostRoles/service_name,HostRoles/display_name"
        );
        let hosts_path = format!("{cluster}/hosts?fields=Hosts/public_host_name");

        let (services, components, hosts) = futures::try_join!(
            self.get_json::<ItemList<ServiceItem>>(&services_path),
            self.get_json::<ItemList<HostComponentItem>>(&components_path),
            self.get_json::<ItemList<HostItem>>(&hosts_path),
        )?;
        Ok(assemble_services(services.items, components.items, hosts.items))
    }

    /// Reads the persisted console status. `None` when nothing was stored yet.
    pub async fn fetch_cluster_status(&self) -> Result<Option<ClusterStatusPatch>> {
        let path = format!("/api/v1/persist/{CLUSTER_STATUS_PERSIST_KEY}");
        let Some(raw) = self.get_optional_text(&path).await? else {
            debug!("no persisted cluster status");
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let patch = serde_json::from_str(&raw).context("failed to decode persisted cluster status")?;
        Ok(Some(patch))
    }

    pub async fn persist_cluster_status(&self, value: &ClusterStatusValue) -> Result<()> {
        if self.mode == RunMode::Offline {
            debug!("offline mode, skipping cluster status persist");
            return Ok(());
        }
        let encoded = serde_json::to_string(value).context("failed to encode cluster status")?;
        let body = json!({ CLUSTER_STATUS_PERSIST_KEY: encoded });
        let url = format!("{}/api/v1/persist", self.base_url);
        self.client
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .header("X-Requested-By", REQUESTED_BY)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {url} failed"))?
            .error_for_status()
            .with_context(|| format!("POST {url} was rejected"))?;
        info!(state = %value.cluster_state, "persisted cluster status");
        Ok(())
    }

    pub async fn fetch_slider_apps(&self) -> Result<Vec<SliderApp>> {
        let path = match (&self.slider_apps_path, self.mode) {
            (Some(path), _) => format!("{path}?fields=*"),
            (None, RunMode::Offline) => "/apps".to_string(),
            (None, RunMode::Live) => return Ok(Vec::new()),
        };
        let apps: ItemList<SliderAppRecord> = self.get_json(&path).await?;
        Ok(apps.items.into_iter().map(SliderApp::from).collect())
    }

    fn cluster_path(&self) -> Result<String> {
        if self.cluster.is_empty() {
            bail!("no cluster selected");
        }
        Ok(format!("/api/v1/clusters/{}", self.cluster))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = match self.mode {
            RunMode::Offline => offline_payload(path)?,
            RunMode::Live => {
                let url = format!("{}{path}", self.base_url);
                self.client
                    .get(&url)
                    .basic_auth(&self.user, Some(&self.password))
                    .send()
                    .await
                    .with_context(|| format!("GET {url} failed"))?
                    .error_for_status()
                    .with_context(|| format!("GET {url} was rejected"))?
                    .json::<Value>()
                    .await
                    .with_context(|| format!("GET {url} returned invalid JSON"))?
            }
        };
        serde_json::from_value(value).with_context(|| format!("unexpected payload for {path}"))
    }

    async fn get_optional_text(&self, path: &str) -> Result<Option<String>> {
        if self.mode == RunMode::Offline {
            return Ok(fixtures::respond(path).map(|value| value.to_string()));
        }
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let text = response
            .error_for_status()
            .with_context(|| format!("GET {url} was rejected"))?
            .text()
            .await
            .with_context(|| format!("GET {url} returned an unreadable body"))?;
        Ok(Some(text))
    }
}

fn offline_payload(path: &str) -> Result<Value> {
    match fixtures::respond(path) {
        Some(value) => Ok(value),
        None => bail!("no offline data for {path}"),
    }
}

/// Joins the three polled collections into service records. Components that
/// reference a service missing from the service list produce an unloaded
/// placeholder for it.
fn assemble_services(
    services: Vec<ServiceItem>,
    components: Vec<HostComponentItem>,
    hosts: Vec<HostItem>,
) -> Vec<Service> {
    let public_names = hosts
        .into_iter()
        .filter_map(|host| {
            host.info
                .public_host_name
                .map(|public| (host.info.host_name, public))
        })
        .collect::<HashMap<_, _>>();

    let mut assembled = services
        .into_iter()
        .map(|item| {
            let mut service = Service::new(item.info.service_name)
                .with_work_status(WorkStatus::parse_reported(item.info.state.as_deref()));
            service.passive_state = item.info.maintenance_state;
            service.critical_alerts_count = item
                .alerts_summary
                .map(|summary| summary.critical)
                .unwrap_or(0);
            service
        })
        .collect::<Vec<_>>();

    for item in components {
        let roles = item.roles;
        let component = HostComponent {
            display_name: roles
                .display_name
                .unwrap_or_else(|| component_display_name(&roles.component_name)),
            public_host_name: public_names.get(&roles.host_name).cloned(),
            work_status: WorkStatus::parse_reported(roles.state.as_deref()),
            stale_configs: roles.stale_configs,
            component_name: roles.component_name,
            host_name: roles.host_name,
        };
        match assembled
            .iter_mut()
            .find(|service| service.service_name == roles.service_name)
        {
            Some(service) => service.push_host_component(component),
            None => {
                debug!(service = %roles.service_name, "component references unknown service");
                assembled.push(
                    Service::placeholder(roles.service_name).with_host_components(vec![component]),
                );
            }
        }
    }
    assembled
}

fn component_display_name(component_name: &str) -> String {
    component_name
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
