use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::i18n::{Messages, RESTART_TOOLTIP_KEY};

const CLIENTS_ONLY_SERVICES: [&str; 5] = ["GLUSTERFS", "SQOOP", "PIG", "TEZ", "HCATALOG"];

const CONFIGURABLE_SERVICES: [&str; 18] = [
    "HDFS",
    "GLUSTERFS",
    "YARN",
    "MAPREDUCE",
    "MAPREDUCE2",
    "HBASE",
    "OOZIE",
    "HIVE",
    "WEBHCAT",
    "ZOOKEEPER",
    "PIG",
    "NAGIOS",
    "GANGLIA",
    "HUE",
    "TEZ",
    "STORM",
    "FALCON",
    "FLUME",
];

const MONITORING_SERVICES: [&str; 2] = ["GANGLIA", "NAGIOS"];

pub const SERVICES_SORT_ORDER: [&str; 20] = [
    "HDFS",
    "GLUSTERFS",
    "YARN",
    "MAPREDUCE",
    "MAPREDUCE2",
    "TEZ",
    "HBASE",
    "HIVE",
    "HCATALOG",
    "WEBHCAT",
    "FLUME",
    "FALCON",
    "STORM",
    "OOZIE",
    "GANGLIA",
    "NAGIOS",
    "ZOOKEEPER",
    "PIG",
    "SQOOP",
    "HUE",
];

/// HCatalog configuration is owned by Hive, so Hive's restart requirement
/// also covers stale HCatalog components.
const HIVE_HCATALOG_AGGREGATION: (&str, &str) = ("HIVE", "HCATALOG");

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkStatus {
    Init,
    Installing,
    InstallFailed,
    Installed,
    Starting,
    Started,
    Stopping,
    Uninstalling,
    Uninstalled,
    WipingOut,
    Upgrading,
    Maintenance,
    Unknown,
}

impl WorkStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::Installing => "INSTALLING",
            Self::InstallFailed => "INSTALL_FAILED",
            Self::Installed => "INSTALLED",
            Self::Starting => "STARTING",
            Self::Started => "STARTED",
            Self::Stopping => "STOPPING",
            Self::Uninstalling => "UNINSTALLING",
            Self::Uninstalled => "UNINSTALLED",
            Self::WipingOut => "WIPING_OUT",
            Self::Upgrading => "UPGRADING",
            Self::Maintenance => "MAINTENANCE",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Parses a reported state, mapping anything unrecognized to `None` so it
    /// takes the same path as an absent status.
    pub fn parse_reported(raw: Option<&str>) -> Option<Self> {
        let raw = raw?;
        match raw.parse() {
            Ok(status) => Some(status),
            Err(()) => {
                debug!("unrecognized work status '{raw}'");
                None
            }
        }
    }
}

impl FromStr for WorkStatus {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "INIT" => Ok(Self::Init),
            "INSTALLING" => Ok(Self::Installing),
            "INSTALL_FAILED" => Ok(Self::InstallFailed),
            "INSTALLED" => Ok(Self::Installed),
            "STARTING" => Ok(Self::Starting),
            "STARTED" => Ok(Self::Started),
            "STOPPING" => Ok(Self::Stopping),
            "UNINSTALLING" => Ok(Self::Uninstalling),
            "UNINSTALLED" => Ok(Self::Uninstalled),
            "WIPING_OUT" => Ok(Self::WipingOut),
            "UPGRADING" => Ok(Self::Upgrading),
            "MAINTENANCE" => Ok(Self::Maintenance),
            "UNKNOWN" => Ok(Self::Unknown),
            _ => Err(()),
        }
    }
}

impl Display for WorkStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Color code shown next to a service.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum HealthStatus {
    Green,
    GreenBlinking,
    Red,
    RedBlinking,
    Yellow,
}

impl HealthStatus {
    pub const ALL: [Self; 5] = [
        Self::Green,
        Self::GreenBlinking,
        Self::Red,
        Self::RedBlinking,
        Self::Yellow,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::GreenBlinking => "green-blinking",
            Self::Red => "red",
            Self::RedBlinking => "red-blinking",
            Self::Yellow => "yellow",
        }
    }

    pub fn health(self) -> ServiceHealth {
        match self {
            Self::Green => ServiceHealth::Live,
            Self::GreenBlinking => ServiceHealth::Starting,
            Self::Red => ServiceHealth::Dead,
            Self::RedBlinking => ServiceHealth::Stopping,
            Self::Yellow => ServiceHealth::Unknown,
        }
    }
}

pub fn health_status(work_status: Option<WorkStatus>) -> HealthStatus {
    match work_status {
        Some(WorkStatus::Started) => HealthStatus::Green,
        Some(WorkStatus::Starting) => HealthStatus::GreenBlinking,
        Some(WorkStatus::Installed) => HealthStatus::Red,
        Some(WorkStatus::Stopping) => HealthStatus::RedBlinking,
        _ => HealthStatus::Yellow,
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ServiceHealth {
    Live,
    Dead,
    Starting,
    Stopping,
    Unknown,
}

impl ServiceHealth {
    pub fn value(self) -> &'static str {
        match self {
            Self::Live => "LIVE",
            Self::Dead => "DEAD-RED",
            Self::Starting => "STARTING",
            Self::Stopping => "STOPPING",
            Self::Unknown => "DEAD-YELLOW",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "LIVE" => Some(Self::Live),
            "DEAD-RED" => Some(Self::Dead),
            "STARTING" => Some(Self::Starting),
            "STOPPING" => Some(Self::Stopping),
            "DEAD-YELLOW" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn key_name(value: &str) -> &'static str {
        match Self::from_value(value) {
            Some(Self::Live) => "live",
            Some(Self::Dead) => "dead",
            Some(Self::Starting) => "starting",
            Some(Self::Stopping) => "stopping",
            Some(Self::Unknown) => "unknown",
            None => "none",
        }
    }
}

pub fn service_display_name(service_name: &str) -> Option<&'static str> {
    let name = match service_name {
        "HDFS" => "HDFS",
        "GLUSTERFS" => "GLUSTERFS",
        "YARN" => "YARN",
        "MAPREDUCE" => "MapReduce",
        "MAPREDUCE2" => "MapReduce2",
        "TEZ" => "Tez",
        "HBASE" => "HBase",
        "OOZIE" => "Oozie",
        "HIVE" => "Hive",
        "HCATALOG" => "HCat",
        "ZOOKEEPER" => "ZooKeeper",
        "PIG" => "Pig",
        "SQOOP" => "Sqoop",
        "WEBHCAT" => "WebHCat",
        "GANGLIA" => "Ganglia",
        "NAGIOS" => "Nagios",
        "HUE" => "Hue",
        "FLUME" => "Flume",
        "FALCON" => "Falcon",
        "STORM" => "Storm",
        _ => return None,
    };
    Some(name)
}

/// Position of a service in the console's canonical ordering. Unknown
/// services sort after every known one.
pub fn service_sort_rank(service_name: &str) -> usize {
    SERVICES_SORT_ORDER
        .iter()
        .position(|name| *name == service_name)
        .unwrap_or(SERVICES_SORT_ORDER.len())
}

/// The sibling service whose stale components count toward `service_name`'s
/// restart requirement, if any.
pub fn restart_aggregation_source(service_name: &str) -> Option<&'static str> {
    let (owner, source) = HIVE_HCATALOG_AGGREGATION;
    (service_name == owner).then_some(source)
}

fn restart_aggregation_owner(service_name: &str) -> Option<&'static str> {
    let (owner, source) = HIVE_HCATALOG_AGGREGATION;
    (service_name == source).then_some(owner)
}

/// Same components in the same order, ignoring their stale flags.
fn same_component_layout(left: &[HostComponent], right: &[HostComponent]) -> bool {
    left.len() == right.len()
        && left.iter().zip(right).all(|(old, new)| {
            old.component_name == new.component_name
                && old.host_name == new.host_name
                && old.display_name == new.display_name
                && old.public_host_name == new.public_host_name
                && old.work_status == new.work_status
        })
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct HostComponent {
    pub component_name: String,
    pub display_name: String,
    pub host_name: String,
    pub public_host_name: Option<String>,
    pub work_status: Option<WorkStatus>,
    pub stale_configs: bool,
}

impl HostComponent {
    pub fn host_display_name(&self) -> &str {
        self.public_host_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.host_name)
    }
}

/// Stale components grouped by host display name. Hosts keep first-encounter
/// order and components keep encounter order within a host.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct RestartRequirement {
    hosts: Vec<(String, Vec<String>)>,
}

impl RestartRequirement {
    pub fn from_components<'a, I>(components: I) -> Self
    where
        I: IntoIterator<Item = &'a HostComponent>,
    {
        let mut requirement = Self::default();
        for component in components {
            requirement.push(component.host_display_name(), &component.display_name);
        }
        requirement
    }

    fn push(&mut self, host: &str, component: &str) {
        match self.hosts.iter_mut().find(|(name, _)| name == host) {
            Some((_, components)) => components.push(component.to_string()),
            None => self
                .hosts
                .push((host.to_string(), vec![component.to_string()])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn hosts(&self) -> &[(String, Vec<String>)] {
        &self.hosts
    }

    pub fn components_on(&self, host: &str) -> Option<&[String]> {
        self.hosts
            .iter()
            .find(|(name, _)| name == host)
            .map(|(_, components)| components.as_slice())
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn component_count(&self) -> usize {
        self.hosts
            .iter()
            .map(|(_, components)| components.len())
            .sum()
    }

    pub fn html_list(&self) -> String {
        let mut html = String::from("<ul>");
        for (host, components) in &self.hosts {
            html.push_str("<li>");
            html.push_str(host);
            html.push_str("</li><ul>");
            for component in components {
                html.push_str("<li>");
                html.push_str(component);
                html.push_str("</li>");
            }
            html.push_str("</ul>");
        }
        html.push_str("</ul>");
        html
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "{} components on {} hosts need restart",
            self.component_count(),
            self.host_count()
        )];
        for (host, components) in &self.hosts {
            lines.push(format!("  {host}"));
            lines.extend(components.iter().map(|component| format!("    - {component}")));
        }
        lines
    }
}

pub fn restart_required_message(requirement: &RestartRequirement, messages: &Messages) -> String {
    messages.translate(
        RESTART_TOOLTIP_KEY,
        &[
            requirement.component_count().to_string(),
            requirement.host_count().to_string(),
            requirement.html_list(),
        ],
    )
}

/// Read access to the set of known services, by name.
pub trait ServiceLookup {
    fn find_service(&self, service_name: &str) -> Option<&Service>;
}

#[derive(Debug, Clone, Default)]
pub struct Service {
    pub service_name: String,
    pub work_status: Option<WorkStatus>,
    pub passive_state: Option<String>,
    pub critical_alerts_count: u32,
    loaded: bool,
    host_components: Vec<HostComponent>,
    restart: RestartRequirement,
    restart_required: bool,
}

impl Service {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            loaded: true,
            ..Self::default()
        }
    }

    /// A record known only by reference, not yet populated by the backend.
    pub fn placeholder(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Self::default()
        }
    }

    pub fn with_work_status(mut self, work_status: Option<WorkStatus>) -> Self {
        self.work_status = work_status;
        self
    }

    pub fn with_host_components(mut self, host_components: Vec<HostComponent>) -> Self {
        self.host_components = host_components;
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn host_components(&self) -> &[HostComponent] {
        &self.host_components
    }

    pub fn push_host_component(&mut self, component: HostComponent) {
        self.host_components.push(component);
    }

    pub fn health_status(&self) -> HealthStatus {
        health_status(self.work_status)
    }

    pub fn is_started(&self) -> bool {
        self.work_status == Some(WorkStatus::Started)
    }

    pub fn is_stopped(&self) -> bool {
        self.work_status == Some(WorkStatus::Installed)
    }

    pub fn is_in_passive(&self) -> bool {
        self.passive_state.as_deref() == Some("ON")
    }

    pub fn display_name(&self) -> Option<&'static str> {
        service_display_name(&self.service_name)
    }

    pub fn display_label(&self) -> &str {
        self.display_name().unwrap_or(&self.service_name)
    }

    pub fn is_clients_only(&self) -> bool {
        CLIENTS_ONLY_SERVICES.contains(&self.service_name.as_str())
    }

    pub fn is_configurable(&self) -> bool {
        CONFIGURABLE_SERVICES.contains(&self.service_name.as_str())
    }

    pub fn service_types(&self) -> Vec<&'static str> {
        if MONITORING_SERVICES.contains(&self.service_name.as_str()) {
            vec!["MONITORING"]
        } else {
            Vec::new()
        }
    }

    pub fn stale_host_components(&self) -> impl Iterator<Item = &HostComponent> {
        self.host_components
            .iter()
            .filter(|component| component.stale_configs)
    }

    /// Result of the most recent restart evaluation.
    pub fn is_restart_required(&self) -> bool {
        self.restart_required
    }

    /// Grouping produced by the same evaluation as `is_restart_required`.
    pub fn restart_required_hosts_and_components(&self) -> &RestartRequirement {
        &self.restart
    }

    pub fn restart_required_message(&self, messages: &Messages) -> String {
        restart_required_message(&self.restart, messages)
    }

    fn store_restart(&mut self, requirement: RestartRequirement) {
        self.restart_required = !requirement.is_empty();
        self.restart = requirement;
    }
}

pub fn derive_restart_requirement(
    service: &Service,
    lookup: &dyn ServiceLookup,
) -> RestartRequirement {
    let mut stale = service.stale_host_components().collect::<Vec<_>>();

    if let Some(source) = restart_aggregation_source(&service.service_name)
        && let Some(sibling) = lookup.find_service(source)
        && sibling.is_loaded()
    {
        stale.extend(sibling.stale_host_components());
    }

    RestartRequirement::from_components(stale)
}

/// Owns every known service and serves as the lookup for derivations.
/// Mutations mark services dirty; `flush_derived` re-evaluates each dirty
/// service once.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    services: Vec<Service>,
    dirty: HashSet<String>,
}

impl ServiceLookup for ServiceRegistry {
    fn find_service(&self, service_name: &str) -> Option<&Service> {
        self.services
            .iter()
            .find(|service| service.service_name == service_name)
    }
}

impl ServiceRegistry {
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Replaces the whole service set with a polled snapshot and re-derives
    /// once for the batch.
    pub fn apply_snapshot(&mut self, mut services: Vec<Service>) {
        services.sort_by(|left, right| {
            service_sort_rank(&left.service_name)
                .cmp(&service_sort_rank(&right.service_name))
                .then_with(|| left.service_name.cmp(&right.service_name))
        });
        self.dirty = services
            .iter()
            .map(|service| service.service_name.clone())
            .collect();
        self.services = services;
        self.flush_derived();
    }

    pub fn upsert(&mut self, service: Service) {
        let name = service.service_name.clone();
        match self
            .services
            .iter_mut()
            .find(|existing| existing.service_name == name)
        {
            Some(existing) => *existing = service,
            None => self.services.push(service),
        }
        self.mark_dirty(&name);
    }

    /// Folds a polled service set into the registry. Stale flag flips go
    /// through `set_stale_configs`, services whose components changed shape
    /// are upserted, and a different service list replaces everything.
    /// Returns how many services were re-derived.
    pub fn merge_poll(&mut self, services: Vec<Service>) -> usize {
        let same_services = self.len() == services.len()
            && services
                .iter()
                .all(|service| self.find_service(&service.service_name).is_some());
        if self.is_empty() || !same_services {
            let count = services.len();
            self.apply_snapshot(services);
            return count;
        }

        for incoming in services {
            let Some(existing) = self.find_service(&incoming.service_name) else {
                continue;
            };
            if existing.is_loaded() != incoming.is_loaded()
                || !same_component_layout(&existing.host_components, &incoming.host_components)
            {
                self.upsert(incoming);
                continue;
            }

            let flips = existing
                .host_components
                .iter()
                .zip(&incoming.host_components)
                .filter(|(old, new)| old.stale_configs != new.stale_configs)
                .map(|(_, new)| {
                    (
                        new.host_name.clone(),
                        new.component_name.clone(),
                        new.stale_configs,
                    )
                })
                .collect::<Vec<_>>();
            for (host_name, component_name, stale) in flips {
                self.set_stale_configs(&incoming.service_name, &host_name, &component_name, stale);
            }
            if let Some(existing) = self
                .services
                .iter_mut()
                .find(|service| service.service_name == incoming.service_name)
            {
                existing.work_status = incoming.work_status;
                existing.passive_state = incoming.passive_state;
                existing.critical_alerts_count = incoming.critical_alerts_count;
            }
        }

        if !self.has_pending_changes() {
            debug!("poll left restart inputs unchanged");
            return 0;
        }
        let pending = self.dirty.len();
        self.flush_derived();
        pending
    }

    /// Updates one host-component's stale flag. Returns false when the
    /// component is unknown. Derived state is refreshed on the next flush.
    pub fn set_stale_configs(
        &mut self,
        service_name: &str,
        host_name: &str,
        component_name: &str,
        stale: bool,
    ) -> bool {
        let Some(service) = self
            .services
            .iter_mut()
            .find(|service| service.service_name == service_name)
        else {
            return false;
        };
        let Some(component) = service.host_components.iter_mut().find(|component| {
            component.host_name == host_name && component.component_name == component_name
        }) else {
            return false;
        };
        if component.stale_configs != stale {
            component.stale_configs = stale;
            self.mark_dirty(service_name);
        }
        true
    }

    fn mark_dirty(&mut self, service_name: &str) {
        self.dirty.insert(service_name.to_string());
        if let Some(owner) = restart_aggregation_owner(service_name) {
            self.dirty.insert(owner.to_string());
        }
    }

    pub fn flush_derived(&mut self) {
        if self.dirty.is_empty() {
            return;
        }
        let registry: &ServiceRegistry = self;
        let updates = registry
            .services
            .iter()
            .enumerate()
            .filter(|(_, service)| registry.dirty.contains(&service.service_name))
            .map(|(index, service)| (index, derive_restart_requirement(service, registry)))
            .collect::<Vec<_>>();
        debug!("re-derived restart state for {} services", updates.len());
        for (index, requirement) in updates {
            self.services[index].store_restart(requirement);
        }
        self.dirty.clear();
    }

    pub fn restart_required_services(&self) -> impl Iterator<Item = &Service> {
        self.services
            .iter()
            .filter(|service| service.is_restart_required())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        HealthStatus, HostComponent, Messages, RestartRequirement, Service, ServiceHealth,
        ServiceLookup, ServiceRegistry, WorkStatus, derive_restart_requirement, health_status,
        restart_required_message, service_display_name,
    };

    fn component(host: &str, name: &str, stale: bool) -> HostComponent {
        HostComponent {
            component_name: name.to_ascii_uppercase(),
            display_name: name.to_string(),
            host_name: host.to_string(),
            public_host_name: None,
            work_status: Some(WorkStatus::Started),
            stale_configs: stale,
        }
    }

    struct NoServices;

    impl ServiceLookup for NoServices {
        fn find_service(&self, _service_name: &str) -> Option<&Service> {
            None
        }
    }

    #[test]
    fn health_status_covers_every_work_status() {
        let all = [
            WorkStatus::Init,
            WorkStatus::Installing,
            WorkStatus::InstallFailed,
            WorkStatus::Installed,
            WorkStatus::Starting,
            WorkStatus::Started,
            WorkStatus::Stopping,
            WorkStatus::Uninstalling,
            WorkStatus::Uninstalled,
            WorkStatus::WipingOut,
            WorkStatus::Upgrading,
            WorkStatus::Maintenance,
            WorkStatus::Unknown,
        ];
        for status in all {
            assert!(HealthStatus::ALL.contains(&health_status(Some(status))));
        }
        assert_eq!(health_status(Some(WorkStatus::Started)), HealthStatus::Green);
        assert_eq!(
            health_status(Some(WorkStatus::Starting)),
            HealthStatus::GreenBlinking
        );
        assert_eq!(health_status(Some(WorkStatus::Installed)), HealthStatus::Red);
        assert_eq!(
            health_status(Some(WorkStatus::Stopping)),
            HealthStatus::RedBlinking
        );
        assert_eq!(health_status(Some(WorkStatus::Unknown)), HealthStatus::Yellow);
        assert_eq!(health_status(None), HealthStatus::Yellow);
        assert_eq!(
            health_status(WorkStatus::parse_reported(Some("BOGUS"))),
            HealthStatus::Yellow
        );
    }

    #[test]
    fn service_predicates_follow_state() {
        let mut service = Service::new("HDFS").with_work_status(Some(WorkStatus::Installed));
        assert!(service.is_stopped());
        assert!(!service.is_started());
        service.passive_state = Some("ON".to_string());
        assert!(service.is_in_passive());
        service.passive_state = Some("OFF".to_string());
        assert!(!service.is_in_passive());
    }

    #[test]
    fn lookup_tables_match_service_names() {
        assert_eq!(service_display_name("HCATALOG"), Some("HCat"));
        assert_eq!(service_display_name("MAPREDUCE2"), Some("MapReduce2"));
        assert_eq!(service_display_name("KAFKA"), None);
        assert!(Service::new("PIG").is_clients_only());
        assert!(!Service::new("HDFS").is_clients_only());
        assert!(Service::new("FLUME").is_configurable());
        assert!(!Service::new("SQOOP").is_configurable());
        assert_eq!(Service::new("NAGIOS").service_types(), vec!["MONITORING"]);
        assert!(Service::new("HIVE").service_types().is_empty());
    }

    #[test]
    fn service_health_key_names() {
        assert_eq!(ServiceHealth::key_name("LIVE"), "live");
        assert_eq!(ServiceHealth::key_name("DEAD-RED"), "dead");
        assert_eq!(ServiceHealth::key_name("DEAD-YELLOW"), "unknown");
        assert_eq!(ServiceHealth::key_name("whatever"), "none");
        assert_eq!(HealthStatus::GreenBlinking.health(), ServiceHealth::Starting);
    }

    #[test]
    fn no_stale_components_means_no_restart() {
        let service = Service::new("HDFS").with_host_components(vec![
            component("h1", "DataNode", false),
            component("h2", "NameNode", false),
        ]);
        assert!(derive_restart_requirement(&service, &NoServices).is_empty());
    }

    #[test]
    fn grouping_keeps_hosts_separate_and_in_encounter_order() {
        let service = Service::new("YARN").with_host_components(vec![
            component("h2", "NodeManager", true),
            component("h1", "NodeManager", true),
            component("h2", "ResourceManager", true),
            component("h3", "App Timeline Server", false),
        ]);
        let requirement = derive_restart_requirement(&service, &NoServices);
        assert!(!requirement.is_empty());
        let hosts = requirement
            .hosts()
            .iter()
            .map(|(host, _)| host.as_str())
            .collect::<Vec<_>>();
        assert_eq!(hosts, vec!["h2", "h1"]);
        assert_eq!(
            requirement.components_on("h2"),
            Some(&["NodeManager".to_string(), "ResourceManager".to_string()][..])
        );
        assert_eq!(
            requirement.components_on("h1"),
            Some(&["NodeManager".to_string()][..])
        );
        assert_eq!(requirement.component_count(), 3);
    }

    #[test]
    fn public_host_name_is_preferred_for_grouping() {
        let mut stale = component("internal-1", "DataNode", true);
        stale.public_host_name = Some("node1.example.com".to_string());
        let requirement = RestartRequirement::from_components([&stale]);
        assert_eq!(requirement.hosts()[0].0, "node1.example.com");
    }

    #[test]
    fn hive_aggregates_loaded_hcatalog_components() {
        let mut registry = ServiceRegistry::default();
        registry.apply_snapshot(vec![
            Service::new("HIVE").with_host_components(vec![component("h1", "HiveServer", true)]),
            Service::new("HCATALOG").with_host_components(vec![component("h2", "WebHCat", true)]),
        ]);

        let hive = registry.find_service("HIVE").expect("hive");
        assert!(hive.is_restart_required());
        let requirement = hive.restart_required_hosts_and_components();
        assert_eq!(
            requirement.components_on("h1"),
            Some(&["HiveServer".to_string()][..])
        );
        assert_eq!(
            requirement.components_on("h2"),
            Some(&["WebHCat".to_string()][..])
        );
    }

    #[test]
    fn hive_without_stale_components_still_needs_restart_for_hcatalog() {
        let mut registry = ServiceRegistry::default();
        registry.apply_snapshot(vec![
            Service::new("HIVE").with_host_components(vec![component("h1", "HiveServer", false)]),
            Service::new("HCATALOG").with_host_components(vec![component("h2", "WebHCat", true)]),
        ]);
        let hive = registry.find_service("HIVE").expect("hive");
        assert!(hive.is_restart_required());
        assert_eq!(hive.restart_required_hosts_and_components().host_count(), 1);
    }

    #[test]
    fn unloaded_or_missing_hcatalog_is_skipped() {
        let mut registry = ServiceRegistry::default();
        registry.apply_snapshot(vec![
            Service::new("HIVE").with_host_components(vec![component("h1", "HiveServer", false)]),
            Service::placeholder("HCATALOG")
                .with_host_components(vec![component("h2", "WebHCat", true)]),
        ]);
        assert!(!registry.find_service("HIVE").expect("hive").is_restart_required());

        let hive =
            Service::new("HIVE").with_host_components(vec![component("h1", "HiveServer", true)]);
        let requirement = derive_restart_requirement(&hive, &NoServices);
        assert_eq!(requirement.host_count(), 1);
    }

    #[test]
    fn other_services_ignore_hcatalog() {
        let mut registry = ServiceRegistry::default();
        registry.apply_snapshot(vec![
            Service::new("OOZIE"),
            Service::new("HCATALOG").with_host_components(vec![component("h2", "WebHCat", true)]),
        ]);
        assert!(!registry.find_service("OOZIE").expect("oozie").is_restart_required());
    }

    #[test]
    fn hcatalog_change_marks_hive_dirty_until_flush() {
        let mut registry = ServiceRegistry::default();
        registry.apply_snapshot(vec![
            Service::new("HIVE").with_host_components(vec![component("h1", "HiveServer", false)]),
            Service::new("HCATALOG").with_host_components(vec![component("h2", "WebHCat", false)]),
        ]);
        assert!(!registry.find_service("HIVE").expect("hive").is_restart_required());

        assert!(registry.set_stale_configs("HCATALOG", "h2", "WEBHCAT", true));
        assert!(registry.has_pending_changes());
        assert!(!registry.find_service("HIVE").expect("hive").is_restart_required());

        registry.flush_derived();
        assert!(!registry.has_pending_changes());
        assert!(registry.find_service("HIVE").expect("hive").is_restart_required());
        assert_eq!(registry.restart_required_services().count(), 2);
    }

    #[test]
    fn upserted_hcatalog_is_picked_up_by_hive_on_flush() {
        let mut registry = ServiceRegistry::default();
        registry.apply_snapshot(vec![
            Service::new("HIVE").with_host_components(vec![component("h1", "HiveServer", false)]),
        ]);
        assert!(!registry.find_service("HIVE").expect("hive").is_restart_required());

        registry.upsert(
            Service::new("HCATALOG").with_host_components(vec![component("h2", "WebHCat", true)]),
        );
        assert!(registry.has_pending_changes());
        registry.flush_derived();

        let hive = registry.find_service("HIVE").expect("hive");
        assert!(hive.is_restart_required());
        assert_eq!(hive.restart_required_hosts_and_components().host_count(), 1);
    }

    fn polled(hive_stale: bool, hcat_stale: bool) -> Vec<Service> {
        vec![
            Service::new("HDFS").with_host_components(vec![component("h1", "DataNode", false)]),
            Service::new("HIVE")
                .with_host_components(vec![component("h1", "HiveServer", hive_stale)]),
            Service::new("HCATALOG")
                .with_host_components(vec![component("h2", "WebHCat", hcat_stale)]),
        ]
    }

    #[test]
    fn merge_poll_rederives_only_services_touched_by_stale_flips() {
        let mut registry = ServiceRegistry::default();
        assert_eq!(registry.merge_poll(polled(false, false)), 3);
        assert!(!registry.find_service("HIVE").expect("hive").is_restart_required());

        assert_eq!(registry.merge_poll(polled(false, false)), 0);

        assert_eq!(registry.merge_poll(polled(false, true)), 2);
        assert!(!registry.has_pending_changes());
        let hive = registry.find_service("HIVE").expect("hive");
        assert!(hive.is_restart_required());
        assert_eq!(
            hive.restart_required_hosts_and_components().components_on("h2"),
            Some(&["WebHCat".to_string()][..])
        );
        assert!(!registry.find_service("HDFS").expect("hdfs").is_restart_required());
    }

    #[test]
    fn merge_poll_keeps_status_updates_and_upserts_reshaped_services() {
        let mut registry = ServiceRegistry::default();
        registry.merge_poll(polled(true, false));

        let mut next = polled(true, false);
        next[0].work_status = Some(WorkStatus::Started);
        next[1] = Service::new("HIVE").with_host_components(vec![
            component("h1", "HiveServer", true),
            component("h3", "Metastore", true),
        ]);
        assert_eq!(registry.merge_poll(next), 1);

        assert_eq!(
            registry.find_service("HDFS").expect("hdfs").work_status,
            Some(WorkStatus::Started)
        );
        let hive = registry.find_service("HIVE").expect("hive");
        assert_eq!(hive.restart_required_hosts_and_components().host_count(), 2);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn merge_poll_replaces_a_changed_service_list() {
        let mut registry = ServiceRegistry::default();
        registry.merge_poll(polled(false, false));
        let count = registry.merge_poll(vec![Service::new("ZOOKEEPER"), Service::new("HDFS")]);
        assert_eq!(count, 2);
        let names = registry
            .services()
            .iter()
            .map(|service| service.service_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["HDFS", "ZOOKEEPER"]);
    }

    #[test]
    fn unknown_component_update_is_rejected() {
        let mut registry = ServiceRegistry::default();
        registry.apply_snapshot(vec![Service::new("HDFS")]);
        assert!(!registry.set_stale_configs("HDFS", "h1", "DATANODE", true));
        assert!(!registry.set_stale_configs("YARN", "h1", "NODEMANAGER", true));
        assert!(!registry.has_pending_changes());
    }

    #[test]
    fn snapshot_follows_canonical_order() {
        let mut registry = ServiceRegistry::default();
        registry.apply_snapshot(vec![
            Service::new("ZOOKEEPER"),
            Service::new("KAFKA"),
            Service::new("HDFS"),
            Service::new("HIVE"),
        ]);
        let names = registry
            .services()
            .iter()
            .map(|service| service.service_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["HDFS", "HIVE", "ZOOKEEPER", "KAFKA"]);
    }

    #[test]
    fn restart_message_counts_hosts_and_components() {
        let requirement = RestartRequirement::from_components(&[
            component("h1", "HiveServer", true),
            component("h1", "Hive Metastore", true),
            component("h2", "WebHCat", true),
        ]);
        let messages = Messages::with_overrides([(
            crate::i18n::RESTART_TOOLTIP_KEY.to_string(),
            "{0}|{1}|{2}".to_string(),
        )]);
        let rendered = restart_required_message(&requirement, &messages);
        assert_eq!(
            rendered,
            "3|2|<ul><li>h1</li><ul><li>HiveServer</li><li>Hive Metastore</li></ul>\
             <li>h2</li><ul><li>WebHCat</li></ul></ul>"
        );
    }

    #[test]
    fn empty_restart_message_has_empty_list() {
        let service = Service::new("HDFS");
        let messages = Messages::with_overrides([(
            crate::i18n::RESTART_TOOLTIP_KEY.to_string(),
            "{0}|{1}|{2}".to_string(),
        )]);
        assert_eq!(service.restart_required_message(&messages), "0|0|<ul></ul>");
    }
}
