use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::cmp::Ordering;
use tracing::debug;

use crate::i18n::Messages;

pub const DATE_FILTER_PRESETS: [&str; 8] = [
    "",
    "Past 1 hour",
    "Past 1 Day",
    "Past 2 Days",
    "Past 7 Days",
    "Past 14 Days",
    "Past 30 Days",
    "Custom",
];

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ValueType {
    String,
    Number,
    Date,
}

impl ValueType {
    pub fn label(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Date => "date",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
    Empty,
}

impl FieldValue {
    pub fn display(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(number) if number.fract() == 0.0 => format!("{number:.0}"),
            Self::Number(number) => number.to_string(),
            Self::Date(date) => date.format("%Y-%m-%d %H:%M").to_string(),
            Self::Empty => "-".to_string(),
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Date(date) => Some(date.timestamp_millis() as f64),
            Self::Text(text) => text.trim().parse().ok(),
            Self::Empty => None,
        }
    }

    fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(date) => Some(*date),
            Self::Number(millis) => Utc.timestamp_millis_opt(*millis as i64).single(),
            _ => None,
        }
    }

    fn compare(&self, other: &Self, value_type: ValueType) -> Ordering {
        match value_type {
            ValueType::String => self
                .display()
                .to_ascii_lowercase()
                .cmp(&other.display().to_ascii_lowercase()),
            ValueType::Number | ValueType::Date => {
                match (self.as_number(), other.as_number()) {
                    (Some(left), Some(right)) => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Greater,
                    (None, Some(_)) => Ordering::Less,
                    (None, None) => Ordering::Equal,
                }
            }
        }
    }
}

/// Anything a table view can list: it must expose a value per field name.
pub trait TableItem {
    fn field(&self, name: &str) -> FieldValue;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberComparison {
    Equal(f64),
    Greater(f64),
    Less(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterPredicate {
    Contains(String),
    Number(NumberComparison),
    Date(DateRange),
    /// Relative window ending at evaluation time, so newly arriving rows
    /// stay visible.
    Since(Duration),
}

impl FilterPredicate {
    fn matches(&self, value: &FieldValue, now: DateTime<Utc>) -> bool {
        match self {
            Self::Contains(needle) => value.display().to_ascii_lowercase().contains(needle),
            Self::Number(comparison) => {
                let Some(number) = value.as_number() else {
                    return false;
                };
                match comparison {
                    NumberComparison::Equal(expected) => (number - expected).abs() < f64::EPSILON,
                    NumberComparison::Greater(bound) => number > *bound,
                    NumberComparison::Less(bound) => number < *bound,
                }
            }
            Self::Date(range) => {
                let Some(date) = value.as_date() else {
                    return false;
                };
                range.from.is_none_or(|from| date >= from) && range.to.is_none_or(|to| date <= to)
            }
            Self::Since(window) => value.as_date().is_some_and(|date| date >= now - *window),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    pub column: usize,
    pub raw_value: String,
    pub value_type: ValueType,
    predicate: FilterPredicate,
}

/// Turns the raw widget value into a predicate. `None` means "no filter".
pub fn parse_filter(value: &str, value_type: ValueType) -> Option<FilterPredicate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match value_type {
        ValueType::String => Some(FilterPredicate::Contains(value.to_ascii_lowercase())),
        ValueType::Number => parse_number_filter(value).map(FilterPredicate::Number),
        ValueType::Date => parse_date_filter(value),
    }
}

fn parse_number_filter(value: &str) -> Option<NumberComparison> {
    let (operator, rest) = match value.chars().next() {
        Some(operator @ ('>' | '<' | '=')) => (operator, &value[1..]),
        _ => ('=', value),
    };
    let number = rest.trim().parse::<f64>().ok()?;
    Some(match operator {
        '>' => NumberComparison::Greater(number),
        '<' => NumberComparison::Less(number),
        _ => NumberComparison::Equal(number),
    })
}

fn parse_date_filter(value: &str) -> Option<FilterPredicate> {
    let window = match value.to_ascii_lowercase().as_str() {
        "past 1 hour" => Some(Duration::hours(1)),
        "past 1 day" => Some(Duration::days(1)),
        "past 2 days" => Some(Duration::days(2)),
        "past 7 days" => Some(Duration::days(7)),
        "past 14 days" => Some(Duration::days(14)),
        "past 30 days" => Some(Duration::days(30)),
        "custom" => return None,
        _ => None,
    };
    if let Some(window) = window {
        return Some(FilterPredicate::Since(window));
    }

    let range = value
        .strip_prefix("Custom")
        .or_else(|| value.strip_prefix("custom"))
        .map(|rest| rest.trim_start_matches(|c: char| c == ':' || c == ' '))
        .unwrap_or(value);
    let (from, to) = range.split_once("..")?;
    let from = parse_day(from, false);
    let to = parse_day(to, true);
    if from.is_none() && to.is_none() {
        debug!("ignoring unparsable date range '{value}'");
        return None;
    }
    Some(FilterPredicate::Date(DateRange { from, to }))
}

fn parse_day(raw: &str, end_of_day: bool) -> Option<DateTime<Utc>> {
    let day = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()?;
    let time = if end_of_day {
        day.and_hms_opt(23, 59, 59)?
    } else {
        day.and_hms_opt(0, 0, 0)?
    };
    Some(Utc.from_utc_datetime(&time))
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn arrow(self) -> &'static str {
        match self {
            Self::Ascending => "▲",
            Self::Descending => "▼",
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SortState {
    pub column: usize,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SortField {
    pub column: usize,
    pub name: &'static str,
    pub display_name: &'static str,
    pub value_type: ValueType,
}

impl SortField {
    pub fn new(column: usize, name: &'static str, display_name: &'static str) -> Self {
        Self {
            column,
            name,
            display_name,
            value_type: ValueType::String,
        }
    }

    pub fn typed(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FilterWidget {
    Text,
    Select(Vec<String>),
}

/// Column filter control. Changing its value forwards
/// `(column, value, type)` to the owning view.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FilterField {
    pub column: usize,
    pub value_type: ValueType,
    pub widget: FilterWidget,
}

impl FilterField {
    pub fn text(column: usize) -> Self {
        Self {
            column,
            value_type: ValueType::String,
            widget: FilterWidget::Text,
        }
    }

    pub fn select(column: usize, options: Vec<String>, value_type: ValueType) -> Self {
        Self {
            column,
            value_type,
            widget: FilterWidget::Select(options),
        }
    }

    pub fn typed(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn on_change_value<T: TableItem>(&self, view: &mut TableView<T>, value: &str) {
        view.update_filter(self.column, value, self.value_type);
    }

    /// Next option after `current` for select widgets, wrapping around.
    pub fn next_option(&self, current: &str) -> Option<&str> {
        let FilterWidget::Select(options) = &self.widget else {
            return None;
        };
        if options.is_empty() {
            return None;
        }
        let next = options
            .iter()
            .position(|option| option == current)
            .map(|index| (index + 1) % options.len())
            .unwrap_or(0);
        Some(options[next].as_str())
    }
}

/// Declarative part of a view: its columns, sort fields and filter widgets.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub title: &'static str,
    pub headers: Vec<&'static str>,
    pub col_prop_assoc: Vec<&'static str>,
    pub sort_fields: Vec<SortField>,
    pub filter_fields: Vec<FilterField>,
    pub info_key: &'static str,
}

impl TableSpec {
    pub fn column_for(&self, token: &str) -> Option<usize> {
        if let Ok(index) = token.parse::<usize>() {
            return (index < self.col_prop_assoc.len()).then_some(index);
        }
        let token = token.to_ascii_lowercase();
        self.col_prop_assoc
            .iter()
            .position(|name| name.to_ascii_lowercase() == token)
            .or_else(|| {
                self.headers
                    .iter()
                    .position(|header| header.to_ascii_lowercase() == token)
            })
    }

    pub fn filter_field(&self, column: usize) -> Option<&FilterField> {
        self.filter_fields.iter().find(|field| field.column == column)
    }

    pub fn sort_field(&self, column: usize) -> Option<&SortField> {
        self.sort_fields.iter().find(|field| field.column == column)
    }
}

#[derive(Debug, Clone)]
pub struct TableView<T> {
    spec: TableSpec,
    content: Vec<T>,
    filter_conditions: Vec<FilterCondition>,
    sort: Option<SortState>,
    filtered: Vec<usize>,
}

impl<T: TableItem> TableView<T> {
    pub fn new(spec: TableSpec) -> Self {
        Self {
            spec,
            content: Vec::new(),
            filter_conditions: Vec::new(),
            sort: None,
            filtered: Vec::new(),
        }
    }

    pub fn spec(&self) -> &TableSpec {
        &self.spec
    }

    pub fn col_prop_assoc(&self) -> &[&'static str] {
        &self.spec.col_prop_assoc
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn set_content(&mut self, content: Vec<T>) {
        self.replace_content_at(content, Utc::now());
    }

    fn replace_content_at(&mut self, content: Vec<T>, now: DateTime<Utc>) {
        self.content = content;
        self.recompute_at(now);
    }

    pub fn filter_conditions(&self) -> &[FilterCondition] {
        &self.filter_conditions
    }

    pub fn filter_value(&self, column: usize) -> Option<&str> {
        self.filter_conditions
            .iter()
            .find(|condition| condition.column == column)
            .map(|condition| condition.raw_value.as_str())
    }

    pub fn sort_state(&self) -> Option<SortState> {
        self.sort
    }

    pub fn update_filter(&mut self, column: usize, value: &str, value_type: ValueType) {
        self.update_filter_at(column, value, value_type, Utc::now());
    }

    /// Same as `update_filter`, evaluating relative date windows at `now`.
    pub fn update_filter_at(
        &mut self,
        column: usize,
        value: &str,
        value_type: ValueType,
        now: DateTime<Utc>,
    ) {
        self.filter_conditions
            .retain(|condition| condition.column != column);
        if let Some(predicate) = parse_filter(value, value_type) {
            self.filter_conditions.push(FilterCondition {
                column,
                raw_value: value.trim().to_string(),
                value_type,
                predicate,
            });
        }
        debug!(
            column,
            value,
            value_type = value_type.label(),
            active = self.filter_conditions.len(),
            "filter updated"
        );
        self.recompute_at(now);
    }

    pub fn clear_filters(&mut self) {
        self.filter_conditions.clear();
        self.recompute();
    }

    /// Sorts by `column`. Re-selecting the active column flips direction.
    pub fn toggle_sort(&mut self, column: usize) {
        let direction = match self.sort {
            Some(state) if state.column == column && state.direction == SortDirection::Ascending => {
                SortDirection::Descending
            }
            _ => SortDirection::Ascending,
        };
        self.set_sort(column, direction);
    }

    pub fn set_sort(&mut self, column: usize, direction: SortDirection) {
        if self.spec.sort_field(column).is_none() {
            return;
        }
        self.sort = Some(SortState { column, direction });
        self.recompute();
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
        self.recompute();
    }

    pub fn filtered_content(&self) -> Vec<&T> {
        self.filtered
            .iter()
            .map(|index| &self.content[*index])
            .collect()
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn filtered_item(&self, position: usize) -> Option<&T> {
        self.filtered
            .get(position)
            .and_then(|index| self.content.get(*index))
    }

    pub fn filtered_content_info(&self, messages: &Messages) -> String {
        messages.translate(
            self.spec.info_key,
            &[
                self.filtered.len().to_string(),
                self.content.len().to_string(),
            ],
        )
    }

    pub fn cells(&self, item: &T) -> Vec<String> {
        self.col_prop_assoc()
            .iter()
            .map(|name| item.field(name).display())
            .collect()
    }

    fn recompute(&mut self) {
        self.recompute_at(Utc::now());
    }

    fn recompute_at(&mut self, now: DateTime<Utc>) {
        let mut filtered = self
            .content
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                self.filter_conditions.iter().all(|condition| {
                    self.spec
                        .col_prop_assoc
                        .get(condition.column)
                        .is_none_or(|name| condition.predicate.matches(&item.field(name), now))
                })
            })
            .map(|(index, _)| index)
            .collect::<Vec<_>>();

        if let Some(state) = self.sort
            && let Some(field) = self.spec.sort_field(state.column)
        {
            filtered.sort_by(|left, right| {
                let ordering = self.content[*left]
                    .field(field.name)
                    .compare(&self.content[*right].field(field.name), field.value_type);
                match state.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        self.filtered = filtered;
    }
}

#[cfg(test)]
mod tests {
    use super::{
        FieldValue, FilterField, SortDirection, SortField, TableItem, TableSpec, TableView,
        ValueType, parse_filter,
    };
    use crate::i18n::{Messages, TABLE_FILTER_INFO_KEY};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    #[derive(Debug, Clone)]
    struct Row {
        name: &'static str,
        size: f64,
        seen: DateTime<Utc>,
    }

    impl TableItem for Row {
        fn field(&self, name: &str) -> FieldValue {
            match name {
                "name" => FieldValue::Text(self.name.to_string()),
                "size" => FieldValue::Number(self.size),
                "seen" => FieldValue::Date(self.seen),
                _ => FieldValue::Empty,
            }
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).single().expect("valid")
    }

    fn view() -> TableView<Row> {
        let mut view = TableView::new(TableSpec {
            title: "Rows",
            headers: vec!["Name", "Size", "Seen"],
            col_prop_assoc: vec!["name", "size", "seen"],
            sort_fields: vec![
                SortField::new(0, "name", "Name"),
                SortField::new(1, "size", "Size").typed(ValueType::Number),
                SortField::new(2, "seen", "Seen").typed(ValueType::Date),
            ],
            filter_fields: vec![
                FilterField::text(0),
                FilterField::text(1),
                FilterField::select(
                    2,
                    vec!["".to_string(), "Past 1 Day".to_string()],
                    ValueType::Date,
                ),
            ],
            info_key: TABLE_FILTER_INFO_KEY,
        });
        view.set_content(vec![
            Row {
                name: "alpha",
                size: 10.0,
                seen: now() - Duration::hours(2),
            },
            Row {
                name: "Beta",
                size: 3.0,
                seen: now() - Duration::days(3),
            },
            Row {
                name: "alphabet",
                size: 3.0,
                seen: now() - Duration::days(20),
            },
        ]);
        view
    }

    fn names(view: &TableView<Row>) -> Vec<&'static str> {
        view.filtered_content().iter().map(|row| row.name).collect()
    }

    #[test]
    fn col_prop_assoc_maps_columns_to_fields() {
        let view = view();
        assert_eq!(view.col_prop_assoc()[1], "size");
        assert_eq!(view.spec().column_for("seen"), Some(2));
        assert_eq!(view.spec().column_for("Size"), Some(1));
        assert_eq!(view.spec().column_for("0"), Some(0));
        assert_eq!(view.spec().column_for("9"), None);
    }

    #[test]
    fn string_filter_is_case_insensitive_substring() {
        let mut view = view();
        view.update_filter(0, "ALPHA", ValueType::String);
        assert_eq!(names(&view), vec!["alpha", "alphabet"]);

        view.update_filter(0, "", ValueType::String);
        assert_eq!(view.filtered_len(), 3);
        assert!(view.filter_conditions().is_empty());
    }

    #[test]
    fn filter_widget_forwards_to_view() {
        let mut view = view();
        let field = view.spec().filter_fields[0].clone();
        field.on_change_value(&mut view, "bet");
        assert_eq!(names(&view), vec!["Beta", "alphabet"]);
        assert_eq!(view.filter_value(0), Some("bet"));
    }

    #[test]
    fn number_filters_compare() {
        let mut view = view();
        view.update_filter(1, ">5", ValueType::Number);
        assert_eq!(names(&view), vec!["alpha"]);
        view.update_filter(1, "<5", ValueType::Number);
        assert_eq!(names(&view), vec!["Beta", "alphabet"]);
        view.update_filter(1, "3", ValueType::Number);
        assert_eq!(names(&view), vec!["Beta", "alphabet"]);
        view.update_filter(1, "abc", ValueType::Number);
        assert_eq!(view.filtered_len(), 3);
    }

    #[test]
    fn date_presets_are_relative_to_now() {
        let mut view = view();
        view.update_filter_at(2, "Past 1 Day", ValueType::Date, now());
        assert_eq!(names(&view), vec!["alpha"]);
        view.update_filter_at(2, "Past 7 Days", ValueType::Date, now());
        assert_eq!(names(&view), vec!["alpha", "Beta"]);
        view.update_filter_at(2, "Custom", ValueType::Date, now());
        assert_eq!(view.filtered_len(), 3);
    }

    #[test]
    fn relative_window_keeps_rows_that_arrive_later() {
        let mut view = view();
        view.update_filter_at(2, "Past 1 Day", ValueType::Date, now());
        assert_eq!(names(&view), vec!["alpha"]);

        let later = now() + Duration::hours(5);
        let mut rows = view.content().to_vec();
        rows.push(Row {
            name: "gamma",
            size: 1.0,
            seen: later - Duration::minutes(1),
        });
        view.replace_content_at(rows, later);
        assert_eq!(names(&view), vec!["alpha", "gamma"]);

        let rows = view.content().to_vec();
        view.replace_content_at(rows, now() + Duration::days(2));
        assert_eq!(view.filtered_len(), 0);
    }

    #[test]
    fn polled_content_is_matched_against_the_current_clock() {
        let mut view = view();
        view.update_filter(2, "Past 1 hour", ValueType::Date);
        view.set_content(vec![Row {
            name: "fresh",
            size: 1.0,
            seen: Utc::now() - Duration::seconds(5),
        }]);
        assert_eq!(names(&view), vec!["fresh"]);
    }

    #[test]
    fn custom_date_range_is_inclusive() {
        let range = parse_filter("Custom:2024-04-20..2024-05-07", ValueType::Date);
        assert!(range.is_some());

        let mut view = view();
        view.update_filter_at(2, "2024-04-20..2024-05-07", ValueType::Date, now());
        assert_eq!(names(&view), vec!["Beta", "alphabet"]);
    }

    #[test]
    fn filters_combine_across_columns() {
        let mut view = view();
        view.update_filter(0, "alpha", ValueType::String);
        view.update_filter(1, "=3", ValueType::Number);
        assert_eq!(names(&view), vec!["alphabet"]);
        view.clear_filters();
        assert_eq!(view.filtered_len(), 3);
    }

    #[test]
    fn sort_is_stable_and_toggles_direction() {
        let mut view = view();
        view.toggle_sort(1);
        assert_eq!(names(&view), vec!["Beta", "alphabet", "alpha"]);
        view.toggle_sort(1);
        assert_eq!(view.sort_state().map(|s| s.direction), Some(SortDirection::Descending));
        assert_eq!(names(&view), vec!["alpha", "Beta", "alphabet"]);
        view.toggle_sort(0);
        assert_eq!(names(&view), vec!["alpha", "alphabet", "Beta"]);
    }

    #[test]
    fn sort_survives_content_replacement() {
        let mut view = view();
        view.set_sort(2, SortDirection::Ascending);
        let mut rows = view.content().to_vec();
        rows.reverse();
        view.set_content(rows);
        assert_eq!(names(&view), vec!["alphabet", "Beta", "alpha"]);
    }

    #[test]
    fn select_widget_cycles_options() {
        let view = view();
        let field = view.spec().filter_field(2).expect("date filter");
        assert_eq!(field.next_option(""), Some("Past 1 Day"));
        assert_eq!(field.next_option("Past 1 Day"), Some(""));
        assert_eq!(view.spec().filter_field(0).and_then(|f| f.next_option("")), None);
    }

    #[test]
    fn info_line_counts_filtered_rows() {
        let mut view = view();
        view.update_filter(0, "beta", ValueType::String);
        assert_eq!(view.filtered_content_info(&Messages::default()), "1 of 3 showing");
    }
}
