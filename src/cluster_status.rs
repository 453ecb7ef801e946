use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use tracing::{debug, info};

pub const CLUSTER_STATUS_PERSIST_KEY: &str = "CLUSTER_CURRENT_STATUS";

/// Deployment phase reported by the persisted cluster status. Phases the
/// console does not know are kept verbatim.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClusterState {
    ClusterNotCreated1,
    ClusterDeployPrep2,
    ClusterInstalling3,
    ServiceStarting3,
    ClusterInstalled4,
    ClusterStarted5,
    AddHostsDeployPrep2,
    AddHostsInstalling3,
    AddHostsInstalled4,
    AddHostsCompleted5,
    StackUpgrading,
    StackUpgradeFailed,
    StackUpgraded,
    Default,
    Other(String),
}

impl ClusterState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ClusterNotCreated1 => "CLUSTER_NOT_CREATED_1",
            Self::ClusterDeployPrep2 => "CLUSTER_DEPLOY_PREP_2",
            Self::ClusterInstalling3 => "CLUSTER_INSTALLING_3",
            Self::ServiceStarting3 => "SERVICE_STARTING_3",
            Self::ClusterInstalled4 => "CLUSTER_INSTALLED_4",
            Self::ClusterStarted5 => "CLUSTER_STARTED_5",
            Self::AddHostsDeployPrep2 => "ADD_HOSTS_DEPLOY_PREP_2",
            Self::AddHostsInstalling3 => "ADD_HOSTS_INSTALLING_3",
            Self::AddHostsInstalled4 => "ADD_HOSTS_INSTALLED_4",
            Self::AddHostsCompleted5 => "ADD_HOSTS_COMPLETED_5",
            Self::StackUpgrading => "STACK_UPGRADING",
            Self::StackUpgradeFailed => "STACK_UPGRADE_FAILED",
            Self::StackUpgraded => "STACK_UPGRADED",
            Self::Default => "DEFAULT",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for ClusterState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "CLUSTER_NOT_CREATED_1" => Self::ClusterNotCreated1,
            "CLUSTER_DEPLOY_PREP_2" => Self::ClusterDeployPrep2,
            "CLUSTER_INSTALLING_3" => Self::ClusterInstalling3,
            "SERVICE_STARTING_3" => Self::ServiceStarting3,
            "CLUSTER_INSTALLED_4" => Self::ClusterInstalled4,
            "CLUSTER_STARTED_5" => Self::ClusterStarted5,
            "ADD_HOSTS_DEPLOY_PREP_2" => Self::AddHostsDeployPrep2,
            "ADD_HOSTS_INSTALLING_3" => Self::AddHostsInstalling3,
            "ADD_HOSTS_INSTALLED_4" => Self::AddHostsInstalled4,
            "ADD_HOSTS_COMPLETED_5" => Self::AddHostsCompleted5,
            "STACK_UPGRADING" => Self::StackUpgrading,
            "STACK_UPGRADE_FAILED" => Self::StackUpgradeFailed,
            "STACK_UPGRADED" => Self::StackUpgraded,
            "DEFAULT" => Self::Default,
            _ => Self::Other(value),
        }
    }
}

impl From<ClusterState> for String {
    fn from(value: ClusterState) -> Self {
        value.as_str().to_string()
    }
}

impl Display for ClusterState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RunMode {
    Live,
    /// No backend writes; reads are answered from fixtures.
    Offline,
}

/// Snapshot of the holder's persisted fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatusValue {
    pub cluster_name: String,
    pub cluster_state: ClusterState,
    pub wizard_controller_name: Option<String>,
    pub localdb: Option<Value>,
}

/// Partial update as delivered by the backend or requested by the console.
/// Absent fields leave the holder untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatusPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_state: Option<ClusterState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wizard_controller_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localdb: Option<Value>,
}

impl ClusterStatusPatch {
    pub fn is_empty(&self) -> bool {
        self.cluster_name.is_none()
            && self.cluster_state.is_none()
            && self.wizard_controller_name.is_none()
            && self.localdb.is_none()
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct PersistOptions {
    pub asynchronous: bool,
}

/// A fetch the transport should perform on behalf of the holder.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RefreshRequest {
    pub asynchronous: bool,
}

#[derive(Debug, Clone)]
pub struct ClusterStatus {
    mode: RunMode,
    cluster_name: String,
    cluster_state: ClusterState,
    wizard_controller_name: Option<String>,
    localdb: Option<Value>,
    make_request_async: bool,
}

impl ClusterStatus {
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            cluster_name: String::new(),
            cluster_state: ClusterState::ClusterNotCreated1,
            wizard_controller_name: None,
            localdb: None,
            make_request_async: false,
        }
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    pub fn cluster_state(&self) -> &ClusterState {
        &self.cluster_state
    }

    pub fn wizard_controller_name(&self) -> Option<&str> {
        self.wizard_controller_name.as_deref()
    }

    pub fn localdb(&self) -> Option<&Value> {
        self.localdb.as_ref()
    }

    pub fn make_request_async(&self) -> bool {
        self.make_request_async
    }

    pub fn is_installed(&self) -> bool {
        self.cluster_state == ClusterState::Default
    }

    pub fn value(&self) -> ClusterStatusValue {
        ClusterStatusValue {
            cluster_name: self.cluster_name.clone(),
            cluster_state: self.cluster_state.clone(),
            wizard_controller_name: self.wizard_controller_name.clone(),
            localdb: self.localdb.clone(),
        }
    }

    pub fn apply_server_response(&mut self, response: ClusterStatusPatch) {
        if response.is_empty() {
            debug!("cluster status response carried no fields");
            return;
        }
        self.merge(response);
        info!(
            cluster = %self.cluster_name,
            state = %self.cluster_state,
            "cluster status updated from server"
        );
    }

    /// Records whether the fetch is asynchronous and hands the request to the
    /// caller's transport. No option means synchronous.
    pub fn update_from_server(&mut self, asynchronous: Option<bool>) -> RefreshRequest {
        self.make_request_async = asynchronous.unwrap_or(false);
        RefreshRequest {
            asynchronous: self.make_request_async,
        }
    }

    /// Merges `new_values` and returns them unchanged, or `None` in offline
    /// mode where nothing is mutated. The caller persists `value()`.
    pub fn set_cluster_status(
        &mut self,
        new_values: ClusterStatusPatch,
        opt: Option<PersistOptions>,
    ) -> Option<ClusterStatusPatch> {
        if self.mode == RunMode::Offline {
            debug!("offline mode, cluster status not changed");
            return None;
        }
        self.merge(new_values.clone());
        self.make_request_async = opt.map(|opt| opt.asynchronous).unwrap_or(false);
        Some(new_values)
    }

    fn merge(&mut self, patch: ClusterStatusPatch) {
        if let Some(cluster_name) = patch.cluster_name {
            self.cluster_name = cluster_name;
        }
        if let Some(cluster_state) = patch.cluster_state {
            self.cluster_state = cluster_state;
        }
        if let Some(wizard_controller_name) = patch.wizard_controller_name {
            self.wizard_controller_name = Some(wizard_controller_name);
        }
        if let Some(localdb) = patch.localdb {
            self.localdb = Some(localdb);
        }
    }
}
