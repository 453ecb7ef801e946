use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::fmt::{Display, Formatter};

use crate::i18n::SLIDER_FILTER_INFO_KEY;
use crate::table_view::{
    DATE_FILTER_PRESETS, FieldValue, FilterField, SortField, TableItem, TableSpec, ValueType,
};

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum SliderAppStatus {
    Accepted,
    Failed,
    Finished,
    Killed,
    New,
    NewSaving,
    Running,
    Submitted,
    Frozen,
    Destroyed,
    Other(String),
}

impl SliderAppStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Accepted => "ACCEPTED",
            Self::Failed => "FAILED",
            Self::Finished => "FINISHED",
            Self::Killed => "KILLED",
            Self::New => "NEW",
            Self::NewSaving => "NEW_SAVING",
            Self::Running => "RUNNING",
            Self::Submitted => "SUBMITTED",
            Self::Frozen => "FROZEN",
            Self::Destroyed => "DESTROYED",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for SliderAppStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "ACCEPTED" => Self::Accepted,
            "FAILED" => Self::Failed,
            "FINISHED" => Self::Finished,
            "KILLED" => Self::Killed,
            "NEW" => Self::New,
            "NEW_SAVING" => Self::NewSaving,
            "RUNNING" => Self::Running,
            "SUBMITTED" => Self::Submitted,
            "FROZEN" => Self::Frozen,
            "DESTROYED" => Self::Destroyed,
            _ => Self::Other(value),
        }
    }
}

impl Display for SliderAppStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One application deployed through the Slider view.
#[derive(Debug, Clone, PartialEq)]
pub struct SliderApp {
    pub id: String,
    pub name: String,
    pub status: SliderAppStatus,
    pub app_type: String,
    pub user: String,
    pub started: Option<DateTime<Utc>>,
    pub ended: Option<DateTime<Utc>>,
    pub diagnostics: Option<String>,
}

/// Wire shape of an app item; timestamps are epoch milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliderAppRecord {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(alias = "status")]
    pub state: String,
    #[serde(default, rename = "type")]
    pub app_type: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub started: Option<i64>,
    #[serde(default)]
    pub ended: Option<i64>,
    #[serde(default)]
    pub diagnostics: Option<String>,
}

impl From<SliderAppRecord> for SliderApp {
    fn from(record: SliderAppRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            status: SliderAppStatus::from(record.state),
            app_type: record.app_type,
            user: record.user,
            started: millis_to_datetime(record.started),
            ended: millis_to_datetime(record.ended),
            diagnostics: record.diagnostics.filter(|text| !text.trim().is_empty()),
        }
    }
}

fn millis_to_datetime(millis: Option<i64>) -> Option<DateTime<Utc>> {
    millis
        .filter(|millis| *millis > 0)
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
}

impl TableItem for SliderApp {
    fn field(&self, name: &str) -> FieldValue {
        match name {
            "name" => FieldValue::Text(self.name.clone()),
            "status" => FieldValue::Text(self.status.to_string()),
            "appType" => FieldValue::Text(self.app_type.clone()),
            "user" => FieldValue::Text(self.user.clone()),
            "started" => self.started.map_or(FieldValue::Empty, FieldValue::Date),
            "ended" => self.ended.map_or(FieldValue::Empty, FieldValue::Date),
            _ => FieldValue::Empty,
        }
    }
}

pub fn status_list() -> Vec<String> {
    vec![
        String::new(),
        SliderAppStatus::Running.to_string(),
        SliderAppStatus::Frozen.to_string(),
        SliderAppStatus::Destroyed.to_string(),
    ]
}

pub fn slider_apps_spec() -> TableSpec {
    TableSpec {
        title: "Slider Apps",
        headers: vec!["Name", "Status", "Type", "User", "Start Time", "End Time"],
        col_prop_assoc: vec!["name", "status", "appType", "user", "started", "ended"],
        sort_fields: vec![
            SortField::new(0, "name", "Name"),
            SortField::new(1, "status", "Status"),
            SortField::new(2, "appType", "Type"),
            SortField::new(3, "user", "User"),
            SortField::new(4, "started", "Start Time").typed(ValueType::Number),
            SortField::new(5, "ended", "End Time").typed(ValueType::Number),
        ],
        filter_fields: vec![
            FilterField::text(0),
            FilterField::select(1, status_list(), ValueType::String),
            FilterField::text(2),
            FilterField::text(3),
            FilterField::select(
                4,
                DATE_FILTER_PRESETS.iter().map(|preset| preset.to_string()).collect(),
                ValueType::Date,
            ),
        ],
        info_key: SLIDER_FILTER_INFO_KEY,
    }
}

#[cfg(test)]
mod tests {
    use super::{SliderApp, SliderAppRecord, SliderAppStatus, slider_apps_spec};
    use crate::i18n::Messages;
    use crate::table_view::{TableView, ValueType};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn apps() -> Vec<SliderApp> {
        let records: Vec<SliderAppRecord> = serde_json::from_value(json!([
            {"id": "1", "name": "hbase-prod", "state": "RUNNING", "type": "HBASE",
             "user": "yarn", "started": 1_715_000_000_000i64, "ended": 0},
            {"id": "2", "name": "storm-etl", "state": "FROZEN", "type": "STORM",
             "user": "etl", "started": 1_714_000_000_000i64, "ended": 1_714_500_000_000i64},
            {"id": "3", "name": "accumulo", "status": "destroyed", "type": "ACCUMULO",
             "user": "yarn"}
        ]))
        .expect("decode");
        records.into_iter().map(SliderApp::from).collect()
    }

    #[test]
    fn records_convert_into_apps() {
        let apps = apps();
        assert_eq!(apps[0].status, SliderAppStatus::Running);
        assert_eq!(apps[0].ended, None);
        assert_eq!(
            apps[1].ended,
            Utc.timestamp_millis_opt(1_714_500_000_000).single()
        );
        assert_eq!(apps[2].status, SliderAppStatus::Destroyed);
        assert_eq!(apps[2].started, None);
    }

    #[test]
    fn col_prop_assoc_matches_columns() {
        let spec = slider_apps_spec();
        assert_eq!(
            spec.col_prop_assoc,
            vec!["name", "status", "appType", "user", "started", "ended"]
        );
        assert_eq!(spec.filter_field(4).map(|f| f.value_type), Some(ValueType::Date));
    }

    #[test]
    fn status_select_filters_apps() {
        let mut view = TableView::new(slider_apps_spec());
        view.set_content(apps());
        let status_filter = view.spec().filter_field(1).cloned().expect("status filter");
        status_filter.on_change_value(&mut view, "FROZEN");
        assert_eq!(view.filtered_len(), 1);
        assert_eq!(
            view.filtered_content_info(&Messages::default()),
            "1 of 3 sliders showing"
        );
        status_filter.on_change_value(&mut view, "");
        assert_eq!(view.filtered_len(), 3);
    }

    #[test]
    fn start_time_sort_puts_missing_first() {
        let mut view = TableView::new(slider_apps_spec());
        view.set_content(apps());
        view.toggle_sort(4);
        let names = view
            .filtered_content()
            .iter()
            .map(|app| app.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["accumulo", "storm-etl", "hbase-prod"]);
    }
}
