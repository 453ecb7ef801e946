use crate::i18n::TABLE_FILTER_INFO_KEY;
use crate::service::{HealthStatus, Service, ServiceRegistry, service_sort_rank};
use crate::table_view::{FieldValue, FilterField, SortField, TableItem, TableSpec, ValueType};

impl TableItem for Service {
    fn field(&self, name: &str) -> FieldValue {
        match name {
            "displayName" => FieldValue::Text(self.display_label().to_string()),
            "workStatus" => FieldValue::Text(
                self.work_status
                    .map(|status| status.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            "healthStatus" => FieldValue::Text(self.health_status().code().to_string()),
            "passiveState" => FieldValue::Text(
                if self.is_in_passive() { "ON" } else { "OFF" }.to_string(),
            ),
            "criticalAlertsCount" => FieldValue::Number(f64::from(self.critical_alerts_count)),
            "isRestartRequired" => FieldValue::Text(
                if self.is_restart_required() {
                    "restart"
                } else {
                    "-"
                }
                .to_string(),
            ),
            "sortRank" => FieldValue::Number(service_sort_rank(&self.service_name) as f64),
            _ => FieldValue::Empty,
        }
    }
}

pub fn services_spec() -> TableSpec {
    TableSpec {
        title: "Services",
        headers: vec!["Service", "Status", "Health", "Passive", "Alerts", "Restart"],
        col_prop_assoc: vec![
            "displayName",
            "workStatus",
            "healthStatus",
            "passiveState",
            "criticalAlertsCount",
            "isRestartRequired",
        ],
        sort_fields: vec![
            SortField::new(0, "sortRank", "Service").typed(ValueType::Number),
            SortField::new(1, "workStatus", "Status"),
            SortField::new(2, "healthStatus", "Health"),
            SortField::new(3, "passiveState", "Passive"),
            SortField::new(4, "criticalAlertsCount", "Alerts").typed(ValueType::Number),
            SortField::new(5, "isRestartRequired", "Restart"),
        ],
        filter_fields: vec![
            FilterField::text(0),
            FilterField::select(
                1,
                ["", "STARTED", "STARTING", "INSTALLED", "STOPPING", "UNKNOWN"]
                    .iter()
                    .map(|option| option.to_string())
                    .collect(),
                ValueType::String,
            ),
            FilterField::select(
                2,
                std::iter::once(String::new())
                    .chain(HealthStatus::ALL.iter().map(|health| health.code().to_string()))
                    .collect(),
                ValueType::String,
            ),
            FilterField::select(
                3,
                ["", "ON", "OFF"].iter().map(|option| option.to_string()).collect(),
                ValueType::String,
            ),
            FilterField::text(4).typed(ValueType::Number),
            FilterField::select(
                5,
                ["", "restart"].iter().map(|option| option.to_string()).collect(),
                ValueType::String,
            ),
        ],
        info_key: TABLE_FILTER_INFO_KEY,
    }
}

/// One stale host-component, flattened from a service's restart grouping.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RestartRow {
    pub service: String,
    pub host: String,
    pub component: String,
}

impl TableItem for RestartRow {
    fn field(&self, name: &str) -> FieldValue {
        match name {
            "service" => FieldValue::Text(self.service.clone()),
            "host" => FieldValue::Text(self.host.clone()),
            "component" => FieldValue::Text(self.component.clone()),
            _ => FieldValue::Empty,
        }
    }
}

pub fn restart_rows(registry: &ServiceRegistry) -> Vec<RestartRow> {
    registry
        .restart_required_services()
        .flat_map(|service| {
            service
                .restart_required_hosts_and_components()
                .hosts()
                .iter()
                .flat_map(move |(host, components)| {
                    components.iter().map(move |component| RestartRow {
                        service: service.display_label().to_string(),
                        host: host.clone(),
                        component: component.clone(),
                    })
                })
        })
        .collect()
}

pub fn restarts_spec() -> TableSpec {
    TableSpec {
        title: "Restarts",
        headers: vec!["Service", "Host", "Component"],
        col_prop_assoc: vec!["service", "host", "component"],
        sort_fields: vec![
            SortField::new(0, "service", "Service"),
            SortField::new(1, "host", "Host"),
            SortField::new(2, "component", "Component"),
        ],
        filter_fields: vec![
            FilterField::text(0),
            FilterField::text(1),
            FilterField::text(2),
        ],
        info_key: TABLE_FILTER_INFO_KEY,
    }
}

#[cfg(test)]
mod tests {
    use super::{restart_rows, services_spec};
    use crate::service::{HostComponent, Service, ServiceRegistry, WorkStatus};
    use crate::table_view::{TableView, ValueType};

    fn stale(host: &str, name: &str) -> HostComponent {
        HostComponent {
            component_name: name.to_ascii_uppercase(),
            display_name: name.to_string(),
            host_name: host.to_string(),
            stale_configs: true,
            ..HostComponent::default()
        }
    }

    fn registry() -> ServiceRegistry {
        let mut registry = ServiceRegistry::default();
        registry.apply_snapshot(vec![
            Service::new("HIVE")
                .with_work_status(Some(WorkStatus::Started))
                .with_host_components(vec![stale("h1", "HiveServer2")]),
            Service::new("HCATALOG").with_host_components(vec![stale("h2", "HCat Client")]),
            Service::new("HDFS").with_work_status(Some(WorkStatus::Installed)),
        ]);
        registry
    }

    #[test]
    fn restart_rows_flatten_groupings() {
        let rows = restart_rows(&registry());
        let hive_rows = rows
            .iter()
            .filter(|row| row.service == "Hive")
            .map(|row| (row.host.as_str(), row.component.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            hive_rows,
            vec![("h1", "HiveServer2"), ("h2", "HCat Client")]
        );
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn services_view_filters_by_health() {
        let mut view = TableView::new(services_spec());
        view.set_content(registry().services().to_vec());
        view.update_filter(2, "red", ValueType::String);
        let names = view
            .filtered_content()
            .iter()
            .map(|service| service.service_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["HDFS"]);
    }

    #[test]
    fn services_view_sorts_by_canonical_rank() {
        let mut view = TableView::new(services_spec());
        view.set_content(registry().services().to_vec());
        view.toggle_sort(0);
        view.toggle_sort(0);
        let names = view
            .filtered_content()
            .iter()
            .map(|service| service.service_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["HCATALOG", "HIVE", "HDFS"]);
    }
}
