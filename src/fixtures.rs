use serde_json::{Value, json};

use crate::cluster_status::CLUSTER_STATUS_PERSIST_KEY;

pub const DEMO_CLUSTER: &str = "demo";

/// Canned REST response for `path`, used when the console runs offline.
pub fn respond(path: &str) -> Option<Value> {
    let path = path.split('?').next().unwrap_or(path);
    if path == "/api/v1/clusters" {
        return Some(clusters());
    }
    if path.ends_with(&format!("/persist/{CLUSTER_STATUS_PERSIST_KEY}")) {
        return Some(cluster_status());
    }
    if path.ends_with("/apps") {
        return Some(slider_apps());
    }
    if path.ends_with("/services") {
        return Some(services());
    }
    if path.ends_with("/host_components") {
        return Some(host_components());
    }
    if path.ends_with("/hosts") {
        return Some(hosts());
    }
    None
}

fn clusters() -> Value {
    json!({
        "items": [
            {"Clusters": {"cluster_name": DEMO_CLUSTER, "version": "HDP-2.1"}}
        ]
    })
}

fn cluster_status() -> Value {
    json!({
        "clusterName": DEMO_CLUSTER,
        "clusterState": "DEFAULT",
        "wizardControllerName": null,
        "localdb": {}
    })
}

fn services() -> Value {
    json!({
        "items": [
            {"ServiceInfo": {"service_name": "HDFS", "state": "STARTED", "maintenance_state": "OFF"}},
            {"ServiceInfo": {"service_name": "YARN", "state": "STARTED", "maintenance_state": "OFF"},
             "alerts_summary": {"CRITICAL": 2, "WARNING": 1}},
            {"ServiceInfo": {"service_name": "HIVE", "state": "STARTED", "maintenance_state": "OFF"}},
            {"ServiceInfo": {"service_name": "HCATALOG", "state": "INSTALLED", "maintenance_state": "OFF"}},
            {"ServiceInfo": {"service_name": "ZOOKEEPER", "state": "STARTING", "maintenance_state": "OFF"}},
            {"ServiceInfo": {"service_name": "GANGLIA", "state": "UNKNOWN", "maintenance_state": "ON"}}
        ]
    })
}

fn host_component(
    service: &str,
    component: &str,
    display: &str,
    host: &str,
    state: &str,
    stale: bool,
) -> Value {
    json!({
        "HostRoles": {
            "cluster_name": DEMO_CLUSTER,
            "service_name": service,
            "component_name": component,
            "display_name": display,
            "host_name": host,
            "state": state,
            "stale_configs": stale
        }
    })
}

fn host_components() -> Value {
    let h1 = "c6401.ambari.apache.org";
    let h2 = "c6402.ambari.apache.org";
    let h3 = "c6403.ambari.apache.org";
    json!({
        "items": [
            host_component("HDFS", "NAMENODE", "NameNode", h1, "STARTED", false),
            host_component("HDFS", "DATANODE", "DataNode", h1, "STARTED", false),
            host_component("HDFS", "DATANODE", "DataNode", h2, "STARTED", false),
            host_component("YARN", "RESOURCEMANAGER", "ResourceManager", h2, "STARTED", false),
            host_component("YARN", "NODEMANAGER", "NodeManager", h1, "STARTED", true),
            host_component("YARN", "NODEMANAGER", "NodeManager", h2, "STARTED", true),
            host_component("HIVE", "HIVE_SERVER", "HiveServer2", h2, "STARTED", false),
            host_component("HIVE", "HIVE_METASTORE", "Hive Metastore", h2, "STARTED", false),
            host_component("HCATALOG", "HCAT", "HCat Client", h3, "INSTALLED", true),
            host_component("ZOOKEEPER", "ZOOKEEPER_SERVER", "ZooKeeper Server", h1, "STARTED", false),
            host_component("ZOOKEEPER", "ZOOKEEPER_SERVER", "ZooKeeper Server", h2, "STARTING", false),
            host_component("GANGLIA", "GANGLIA_SERVER", "Ganglia Server", h1, "UNKNOWN", false),
            host_component("SQOOP", "SQOOP", "Sqoop", h3, "INSTALLED", false)
        ]
    })
}

fn hosts() -> Value {
    json!({
        "items": [
            {"Hosts": {"host_name": "c6401.ambari.apache.org", "public_host_name": "node1.example.com"}},
            {"Hosts": {"host_name": "c6402.ambari.apache.org", "public_host_name": "node2.example.com"}},
            {"Hosts": {"host_name": "c6403.ambari.apache.org"}}
        ]
    })
}

fn slider_apps() -> Value {
    json!({
        "items": [
            {"id": "application_1715000000000_0001", "name": "hbase-prod", "state": "RUNNING",
             "type": "HBASE", "user": "yarn", "started": 1_715_000_000_000i64, "ended": 0},
            {"id": "application_1714000000000_0004", "name": "storm-etl", "state": "FROZEN",
             "type": "STORM", "user": "etl", "started": 1_714_000_000_000i64,
             "ended": 1_714_500_000_000i64},
            {"id": "application_1713000000000_0002", "name": "accumulo-test", "state": "DESTROYED",
             "type": "ACCUMULO", "user": "yarn", "started": 1_713_000_000_000i64,
             "ended": 1_713_100_000_000i64, "diagnostics": "destroyed by user"}
        ]
    })
}
