use crate::cluster_status::{
    ClusterState, ClusterStatus, ClusterStatusPatch, ClusterStatusValue, PersistOptions,
};
use crate::i18n::{Messages, RESTART_REQUIRED_KEY};
use crate::input::Action;
use crate::model::ConsoleTab;
use crate::service::{Service, ServiceHealth, ServiceRegistry};
use crate::slider::{SliderApp, slider_apps_spec};
use crate::table_view::{
    FilterField, FilterWidget, SortDirection, SortState, TableItem, TableSpec, TableView,
};
use crate::views::{RestartRow, restart_rows, restarts_spec, services_spec};
use chrono::{DateTime, Local};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InputMode {
    Normal,
    Command,
    Filter,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    None,
    RefreshServices,
    RefreshSliderApps,
    RefreshClusterStatus {
        asynchronous: bool,
    },
    PersistClusterStatus {
        value: ClusterStatusValue,
        asynchronous: bool,
    },
}

/// Render-ready projection of the active tab's table.
#[derive(Debug, Clone, Default)]
pub struct TableSnapshot {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub info: String,
    pub filters: Vec<String>,
    pub focused_column: usize,
    pub selected: Option<usize>,
    pub error: Option<String>,
}

/// Type-erased access to whichever table view is active.
trait ViewControl {
    fn spec(&self) -> &TableSpec;
    fn change_filter(&mut self, field: &FilterField, value: &str);
    fn toggle_sort(&mut self, column: usize);
    fn set_sort(&mut self, column: usize, direction: SortDirection);
    fn reset(&mut self);
    fn filter_value(&self, column: usize) -> Option<&str>;
    fn sort_state(&self) -> Option<SortState>;
    fn filtered_len(&self) -> usize;
    fn rows(&self) -> Vec<Vec<String>>;
    fn info(&self, messages: &Messages) -> String;
    fn active_filters(&self) -> Vec<String>;
}

impl<T: TableItem> ViewControl for TableView<T> {
    fn spec(&self) -> &TableSpec {
        TableView::spec(self)
    }

    fn change_filter(&mut self, field: &FilterField, value: &str) {
        field.on_change_value(self, value);
    }

    fn toggle_sort(&mut self, column: usize) {
        TableView::toggle_sort(self, column);
    }

    fn set_sort(&mut self, column: usize, direction: SortDirection) {
        TableView::set_sort(self, column, direction);
    }

    fn reset(&mut self) {
        self.clear_filters();
        self.clear_sort();
    }

    fn filter_value(&self, column: usize) -> Option<&str> {
        TableView::filter_value(self, column)
    }

    fn sort_state(&self) -> Option<SortState> {
        TableView::sort_state(self)
    }

    fn filtered_len(&self) -> usize {
        TableView::filtered_len(self)
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.filtered_content()
            .into_iter()
            .map(|item| self.cells(item))
            .collect()
    }

    fn info(&self, messages: &Messages) -> String {
        self.filtered_content_info(messages)
    }

    fn active_filters(&self) -> Vec<String> {
        self.filter_conditions()
            .iter()
            .map(|condition| {
                let header = TableView::spec(self)
                    .headers
                    .get(condition.column)
                    .copied()
                    .unwrap_or("?");
                format!("{header}={}", condition.raw_value)
            })
            .collect()
    }
}

pub struct App {
    running: bool,
    mode: InputMode,
    active_tab_index: usize,
    input: String,
    status: String,
    show_help: bool,
    show_details: bool,
    pending_g: bool,
    server: String,
    cluster: String,
    user: String,
    messages: Messages,
    cluster_status: ClusterStatus,
    registry: ServiceRegistry,
    services_view: TableView<Service>,
    restarts_view: TableView<RestartRow>,
    slider_view: TableView<SliderApp>,
    selected: HashMap<ConsoleTab, usize>,
    focused_columns: HashMap<ConsoleTab, usize>,
    errors: HashMap<ConsoleTab, String>,
    last_refreshed: Option<DateTime<Local>>,
    detail_scroll: u16,
    table_page_size: usize,
}

impl App {
    pub fn new(server: String, user: String, cluster_status: ClusterStatus) -> Self {
        Self {
            running: true,
            mode: InputMode::Normal,
            active_tab_index: 0,
            input: String::new(),
            status: "Ready".to_string(),
            show_help: false,
            show_details: false,
            pending_g: false,
            server,
            cluster: String::new(),
            user,
            messages: Messages::default(),
            cluster_status,
            registry: ServiceRegistry::default(),
            services_view: TableView::new(services_spec()),
            restarts_view: TableView::new(restarts_spec()),
            slider_view: TableView::new(slider_apps_spec()),
            selected: HashMap::new(),
            focused_columns: HashMap::new(),
            errors: HashMap::new(),
            last_refreshed: None,
            detail_scroll: 0,
            table_page_size: 10,
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn active_tab(&self) -> ConsoleTab {
        ConsoleTab::ALL[self.active_tab_index]
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn show_details(&self) -> bool {
        self.show_details
    }

    pub fn detail_scroll(&self) -> u16 {
        self.detail_scroll
    }

    pub fn cluster_status(&self) -> &ClusterStatus {
        &self.cluster_status
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    pub fn last_refreshed(&self) -> Option<String> {
        self.last_refreshed
            .map(|stamp| stamp.format("%H:%M:%S").to_string())
    }

    pub fn set_cluster(&mut self, cluster: impl Into<String>) {
        self.cluster = cluster.into();
    }

    pub fn set_messages(&mut self, messages: Messages) {
        self.messages = messages;
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = normalize_status_text(status.into());
    }

    pub fn set_table_page_size(&mut self, rows: usize) {
        self.table_page_size = rows.max(1);
    }

    /// Merges the polled service set; derived restart state is flushed once
    /// for the whole batch before the views are rebuilt.
    pub fn set_services(&mut self, services: Vec<Service>) {
        self.registry.merge_poll(services);
        self.rebuild_service_views();
        self.errors.remove(&ConsoleTab::Services);
        self.errors.remove(&ConsoleTab::Restarts);
        self.last_refreshed = Some(Local::now());
    }

    pub fn set_slider_apps(&mut self, apps: Vec<SliderApp>) {
        self.slider_view.set_content(apps);
        self.errors.remove(&ConsoleTab::SliderApps);
        self.clamp_selection(ConsoleTab::SliderApps);
        self.last_refreshed = Some(Local::now());
    }

    pub fn set_tab_error(&mut self, tab: ConsoleTab, error: impl Into<String>) {
        let error = error.into();
        self.status = normalize_status_text(format!("{} refresh failed: {error}", tab.title()));
        self.errors.insert(tab, error);
    }

    pub fn apply_cluster_status(&mut self, patch: Option<ClusterStatusPatch>) {
        match patch {
            Some(patch) => {
                self.cluster_status.apply_server_response(patch);
                self.status = format!(
                    "Cluster status: {}",
                    self.cluster_status.cluster_state()
                );
            }
            None => {
                self.status = "No persisted cluster status on the server".to_string();
            }
        }
    }

    /// Starts a status refresh. `None` means synchronous.
    pub fn request_cluster_status(&mut self, asynchronous: Option<bool>) -> AppCommand {
        let request = self.cluster_status.update_from_server(asynchronous);
        AppCommand::RefreshClusterStatus {
            asynchronous: request.asynchronous,
        }
    }

    pub fn apply_action(&mut self, action: Action) -> AppCommand {
        if !matches!(action, Action::GPrefix) {
            self.pending_g = false;
        }

        if self.show_help && !matches!(action, Action::ToggleHelp) {
            self.show_help = false;
            if matches!(action, Action::ClearOverlay) {
                return AppCommand::None;
            }
        }

        match action {
            Action::Quit => {
                self.running = false;
                self.status = "Exit requested".to_string();
                AppCommand::None
            }
            Action::NextTab => self.switch_tab_by_offset(1),
            Action::PrevTab => self.switch_tab_by_offset(-1),
            Action::SwitchTab(index) => match ConsoleTab::ALL.get(index as usize) {
                Some(tab) => self.switch_to_tab(*tab),
                None => AppCommand::None,
            },
            Action::Down => {
                if self.show_details {
                    self.detail_scroll = self.detail_scroll.saturating_add(1);
                } else {
                    self.move_selection(1);
                }
                AppCommand::None
            }
            Action::Up => {
                if self.show_details {
                    self.detail_scroll = self.detail_scroll.saturating_sub(1);
                } else {
                    self.move_selection(-1);
                }
                AppCommand::None
            }
            Action::PageDown => {
                self.move_selection(self.table_page_size as isize);
                AppCommand::None
            }
            Action::PageUp => {
                self.move_selection(-(self.table_page_size as isize));
                AppCommand::None
            }
            Action::Top => {
                self.selected.insert(self.active_tab(), 0);
                AppCommand::None
            }
            Action::Bottom => {
                let last = self.view().filtered_len().saturating_sub(1);
                self.selected.insert(self.active_tab(), last);
                AppCommand::None
            }
            Action::GPrefix => {
                if self.pending_g {
                    self.pending_g = false;
                    self.selected.insert(self.active_tab(), 0);
                } else {
                    self.pending_g = true;
                }
                AppCommand::None
            }
            Action::ToggleHelp => {
                self.show_help = !self.show_help;
                AppCommand::None
            }
            Action::ToggleDetails => {
                self.show_details = !self.show_details;
                self.detail_scroll = 0;
                AppCommand::None
            }
            Action::ClearOverlay => {
                self.show_details = false;
                self.detail_scroll = 0;
                AppCommand::None
            }
            Action::Refresh => self.refresh_active(),
            Action::CycleSort => {
                self.cycle_sort();
                AppCommand::None
            }
            Action::ReverseSort => {
                self.reverse_sort();
                AppCommand::None
            }
            Action::NextFilterColumn => {
                self.shift_focused_column(1);
                AppCommand::None
            }
            Action::PrevFilterColumn => {
                self.shift_focused_column(-1);
                AppCommand::None
            }
            Action::CycleFilterOption => {
                self.cycle_filter_option();
                AppCommand::None
            }
            Action::ClearFilters => {
                self.view_mut().reset();
                self.clamp_selection(self.active_tab());
                self.status = "Filters and sort cleared".to_string();
                AppCommand::None
            }
            Action::StartCommand => {
                self.mode = InputMode::Command;
                self.input.clear();
                AppCommand::None
            }
            Action::StartFilter => {
                let column = self.focused_column();
                self.mode = InputMode::Filter;
                self.input = self.view().filter_value(column).unwrap_or_default().to_string();
                AppCommand::None
            }
            Action::SubmitInput => self.submit_input(),
            Action::CancelInput => {
                self.mode = InputMode::Normal;
                self.input.clear();
                AppCommand::None
            }
            Action::Backspace => {
                self.input.pop();
                AppCommand::None
            }
            Action::InputChar(c) => {
                self.input.push(c);
                AppCommand::None
            }
        }
    }

    pub fn table_snapshot(&self) -> TableSnapshot {
        let tab = self.active_tab();
        let view = self.view();
        let spec = view.spec();
        let sort = view.sort_state();
        let headers = spec
            .headers
            .iter()
            .enumerate()
            .map(|(column, header)| match sort {
                Some(state) if state.column == column => {
                    format!("{header} {}", state.direction.arrow())
                }
                _ => (*header).to_string(),
            })
            .collect();
        let rows = view.rows();
        let selected = (!rows.is_empty()).then(|| self.selected_index(tab).min(rows.len() - 1));
        TableSnapshot {
            title: spec.title.to_string(),
            headers,
            rows,
            info: view.info(&self.messages),
            filters: view.active_filters(),
            focused_column: self.focused_column(),
            selected,
            error: self.errors.get(&tab).cloned(),
        }
    }

    pub fn detail_title(&self) -> String {
        let name = match self.active_tab() {
            ConsoleTab::Services => self
                .selected_service()
                .map(|service| service.display_label().to_string()),
            ConsoleTab::Restarts => self
                .restarts_view
                .filtered_item(self.selected_index(ConsoleTab::Restarts))
                .map(|row| format!("{} on {}", row.component, row.host)),
            ConsoleTab::SliderApps => self
                .slider_view
                .filtered_item(self.selected_index(ConsoleTab::SliderApps))
                .map(|app| app.name.clone()),
        };
        match name {
            Some(name) => format!("Details: {name}"),
            None => "Details".to_string(),
        }
    }

    pub fn detail_lines(&self) -> Vec<String> {
        match self.active_tab() {
            ConsoleTab::Services => self
                .selected_service()
                .map(service_detail_lines)
                .unwrap_or_else(|| vec!["No service selected".to_string()]),
            ConsoleTab::Restarts => self
                .restarts_view
                .filtered_item(self.selected_index(ConsoleTab::Restarts))
                .map(|row| self.restart_row_detail_lines(row))
                .unwrap_or_else(|| vec!["No stale components".to_string()]),
            ConsoleTab::SliderApps => self
                .slider_view
                .filtered_item(self.selected_index(ConsoleTab::SliderApps))
                .map(slider_detail_lines)
                .unwrap_or_else(|| vec!["No slider app selected".to_string()]),
        }
    }

    /// Localized restart tooltip for the selected service, if it needs one.
    pub fn selected_restart_message(&self) -> Option<String> {
        self.selected_service()
            .filter(|service| service.is_restart_required())
            .map(|service| service.restart_required_message(&self.messages))
    }

    fn selected_service(&self) -> Option<&Service> {
        self.services_view
            .filtered_item(self.selected_index(ConsoleTab::Services))
    }

    fn restart_row_detail_lines(&self, row: &RestartRow) -> Vec<String> {
        let mut lines = vec![
            format!("Service:    {}", row.service),
            format!("Host:       {}", row.host),
            format!("Component:  {}", row.component),
        ];
        if let Some(service) = self
            .registry
            .services()
            .iter()
            .find(|service| service.display_label() == row.service)
        {
            lines.push(String::new());
            lines.push(self.messages.translate(RESTART_REQUIRED_KEY, &[]));
            lines.extend(service.restart_required_hosts_and_components().summary_lines());
        }
        lines
    }

    fn view(&self) -> &dyn ViewControl {
        match self.active_tab() {
            ConsoleTab::Services => &self.services_view,
            ConsoleTab::Restarts => &self.restarts_view,
            ConsoleTab::SliderApps => &self.slider_view,
        }
    }

    fn view_mut(&mut self) -> &mut dyn ViewControl {
        match self.active_tab() {
            ConsoleTab::Services => &mut self.services_view,
            ConsoleTab::Restarts => &mut self.restarts_view,
            ConsoleTab::SliderApps => &mut self.slider_view,
        }
    }

    fn rebuild_service_views(&mut self) {
        self.services_view
            .set_content(self.registry.services().to_vec());
        self.restarts_view.set_content(restart_rows(&self.registry));
        self.clamp_selection(ConsoleTab::Services);
        self.clamp_selection(ConsoleTab::Restarts);
    }

    fn selected_index(&self, tab: ConsoleTab) -> usize {
        self.selected.get(&tab).copied().unwrap_or_default()
    }

    fn focused_column(&self) -> usize {
        self.focused_columns
            .get(&self.active_tab())
            .copied()
            .unwrap_or_default()
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.view().filtered_len();
        if len == 0 {
            return;
        }
        let tab = self.active_tab();
        let current = self.selected_index(tab) as isize;
        let next = (current + delta).clamp(0, len as isize - 1) as usize;
        self.selected.insert(tab, next);
    }

    fn clamp_selection(&mut self, tab: ConsoleTab) {
        let len = match tab {
            ConsoleTab::Services => self.services_view.filtered_len(),
            ConsoleTab::Restarts => self.restarts_view.filtered_len(),
            ConsoleTab::SliderApps => self.slider_view.filtered_len(),
        };
        let current = self.selected_index(tab);
        self.selected.insert(tab, current.min(len.saturating_sub(1)));
    }

    fn switch_tab_by_offset(&mut self, delta: isize) -> AppCommand {
        let len = ConsoleTab::ALL.len() as isize;
        let next = (self.active_tab_index as isize + delta).rem_euclid(len) as usize;
        self.switch_to_tab(ConsoleTab::ALL[next])
    }

    fn switch_to_tab(&mut self, tab: ConsoleTab) -> AppCommand {
        if tab == self.active_tab() {
            return AppCommand::None;
        }
        self.active_tab_index = tab.index();
        self.show_details = false;
        self.detail_scroll = 0;
        self.status = format!("Viewing {}", tab.title());
        if tab == ConsoleTab::SliderApps && self.slider_view.content().is_empty() {
            return AppCommand::RefreshSliderApps;
        }
        AppCommand::None
    }

    fn refresh_active(&mut self) -> AppCommand {
        self.status = format!("Refreshing {}", self.active_tab().title());
        match self.active_tab() {
            ConsoleTab::Services | ConsoleTab::Restarts => AppCommand::RefreshServices,
            ConsoleTab::SliderApps => AppCommand::RefreshSliderApps,
        }
    }

    fn cycle_sort(&mut self) {
        let columns = self
            .view()
            .spec()
            .sort_fields
            .iter()
            .map(|field| field.column)
            .collect::<Vec<_>>();
        if columns.is_empty() {
            self.status = "This table has no sortable columns".to_string();
            return;
        }
        let next = match self.view().sort_state() {
            Some(state) => columns
                .iter()
                .position(|column| *column == state.column)
                .map(|index| columns[(index + 1) % columns.len()])
                .unwrap_or(columns[0]),
            None => columns[0],
        };
        self.view_mut().set_sort(next, SortDirection::Ascending);
        self.status = format!("Sorted by {}", self.sort_label());
    }

    fn reverse_sort(&mut self) {
        let Some(state) = self.view().sort_state() else {
            self.status = "No active sort; press s to sort".to_string();
            return;
        };
        self.view_mut().toggle_sort(state.column);
        self.status = format!("Sorted by {}", self.sort_label());
    }

    fn sort_label(&self) -> String {
        let view = self.view();
        match view.sort_state() {
            Some(state) => {
                let name = view
                    .spec()
                    .sort_field(state.column)
                    .map(|field| field.display_name)
                    .unwrap_or("?");
                format!("{name} {}", state.direction.arrow())
            }
            None => "none".to_string(),
        }
    }

    fn shift_focused_column(&mut self, delta: isize) {
        let columns = self.view().spec().headers.len() as isize;
        if columns == 0 {
            return;
        }
        let next = (self.focused_column() as isize + delta).rem_euclid(columns) as usize;
        self.focused_columns.insert(self.active_tab(), next);
        let spec = self.view().spec();
        let header = spec.headers[next];
        self.status = match spec.filter_field(next) {
            Some(field) => format!("Filter column: {header} ({})", field.value_type.label()),
            None => format!("Filter column: {header} (no filter)"),
        };
    }

    fn cycle_filter_option(&mut self) {
        let column = self.focused_column();
        let Some(field) = self.view().spec().filter_field(column).cloned() else {
            self.status = "Focused column has no filter".to_string();
            return;
        };
        if !matches!(field.widget, FilterWidget::Select(_)) {
            self.status = "Focused column takes typed filters; press / to edit".to_string();
            return;
        }
        let current = self.view().filter_value(column).unwrap_or_default().to_string();
        let next = field
            .next_option(&current)
            .unwrap_or_default()
            .to_string();
        self.view_mut().change_filter(&field, &next);
        self.clamp_selection(self.active_tab());
        self.status = if next.is_empty() {
            "Filter cleared".to_string()
        } else {
            format!("Filter: {next}")
        };
    }

    fn apply_filter(&mut self, column: usize, value: &str) {
        let field = self
            .view()
            .spec()
            .filter_field(column)
            .cloned()
            .unwrap_or_else(|| FilterField::text(column));
        self.view_mut().change_filter(&field, value);
        self.clamp_selection(self.active_tab());
        let info = self.view().info(&self.messages);
        self.status = if value.trim().is_empty() {
            format!("Filter cleared ({info})")
        } else {
            format!("Filter '{}' ({info})", value.trim())
        };
    }

    fn submit_input(&mut self) -> AppCommand {
        match self.mode {
            InputMode::Normal => AppCommand::None,
            InputMode::Filter => {
                let value = self.input.trim().to_string();
                self.mode = InputMode::Normal;
                self.input.clear();
                let column = self.focused_column();
                self.apply_filter(column, &value);
                AppCommand::None
            }
            InputMode::Command => {
                let command = self.input.trim().to_string();
                self.mode = InputMode::Normal;
                self.input.clear();
                self.execute_command_line(&command)
            }
        }
    }

    fn execute_command_line(&mut self, line: &str) -> AppCommand {
        let normalized = line.trim().trim_start_matches(':').trim();
        if normalized.is_empty() {
            self.status = "No command entered".to_string();
            return AppCommand::None;
        }

        let mut parts = normalized.split_whitespace();
        let command = parts.next().unwrap_or_default().to_ascii_lowercase();

        match command.as_str() {
            "q" | "quit" | "exit" => {
                self.running = false;
                self.status = "Exit requested".to_string();
                AppCommand::None
            }
            "refresh" | "reload" | "r" => self.refresh_active(),
            "filter" | "f" => {
                let Some(column_token) = parts.next() else {
                    self.status = "Usage: :filter <column> [value]".to_string();
                    return AppCommand::None;
                };
                let Some(column) = self.view().spec().column_for(column_token) else {
                    self.status = format!("Unknown column '{column_token}'");
                    return AppCommand::None;
                };
                let value = parts.collect::<Vec<_>>().join(" ");
                self.focused_columns.insert(self.active_tab(), column);
                self.apply_filter(column, &value);
                AppCommand::None
            }
            "sort" => {
                let Some(column_token) = parts.next() else {
                    self.status = "Usage: :sort <column> [asc|desc]".to_string();
                    return AppCommand::None;
                };
                let Some(column) = self.view().spec().column_for(column_token) else {
                    self.status = format!("Unknown column '{column_token}'");
                    return AppCommand::None;
                };
                if self.view().spec().sort_field(column).is_none() {
                    self.status = format!("Column '{column_token}' is not sortable");
                    return AppCommand::None;
                }
                match parts.next().map(str::to_ascii_lowercase).as_deref() {
                    Some("asc") => self.view_mut().set_sort(column, SortDirection::Ascending),
                    Some("desc") => self.view_mut().set_sort(column, SortDirection::Descending),
                    _ => self.view_mut().toggle_sort(column),
                }
                self.status = format!("Sorted by {}", self.sort_label());
                AppCommand::None
            }
            "clear" | "reset" => {
                self.view_mut().reset();
                self.clamp_selection(self.active_tab());
                self.status = "Filters and sort cleared".to_string();
                AppCommand::None
            }
            "status" | "st" => {
                let asynchronous = match parts.next() {
                    Some("async") => Some(true),
                    Some("sync") => Some(false),
                    _ => None,
                };
                self.status = "Refreshing cluster status".to_string();
                self.request_cluster_status(asynchronous)
            }
            "state" => {
                let Some(state) = parts.next() else {
                    self.status = "Usage: :state <CLUSTER_STATE> [async]".to_string();
                    return AppCommand::None;
                };
                let asynchronous = parts.next() == Some("async");
                self.set_cluster_state(ClusterState::from(state.to_ascii_uppercase()), asynchronous)
            }
            "help" | "h" => {
                self.show_help = true;
                AppCommand::None
            }
            other => match ConsoleTab::from_token(other) {
                Some(tab) => {
                    let command = self.switch_to_tab(tab);
                    self.status = format!("Viewing {}", tab.title());
                    command
                }
                None => {
                    self.status = format!("Unknown command: {other}");
                    AppCommand::None
                }
            },
        }
    }

    fn set_cluster_state(&mut self, state: ClusterState, asynchronous: bool) -> AppCommand {
        let patch = ClusterStatusPatch {
            cluster_name: (!self.cluster.is_empty()).then(|| self.cluster.clone()),
            cluster_state: Some(state.clone()),
            ..ClusterStatusPatch::default()
        };
        match self
            .cluster_status
            .set_cluster_status(patch, Some(PersistOptions { asynchronous }))
        {
            Some(_) => {
                self.status = format!("Cluster state set to {state}");
                AppCommand::PersistClusterStatus {
                    value: self.cluster_status.value(),
                    asynchronous,
                }
            }
            None => {
                self.status = "Offline mode: cluster status is read-only".to_string();
                AppCommand::None
            }
        }
    }
}

fn service_detail_lines(service: &Service) -> Vec<String> {
    let mut lines = vec![
        format!("Service:       {} ({})", service.display_label(), service.service_name),
        format!(
            "Status:        {}",
            service
                .work_status
                .map(|status| status.to_string())
                .unwrap_or_else(|| "-".to_string())
        ),
        format!(
            "Health:        {} ({})",
            service.health_status().code(),
            ServiceHealth::key_name(service.health_status().health().value())
        ),
        format!(
            "Running:       {}",
            if service.is_started() {
                "started"
            } else if service.is_stopped() {
                "stopped"
            } else {
                "in transition"
            }
        ),
        format!(
            "Passive:       {}",
            if service.is_in_passive() { "ON" } else { "OFF" }
        ),
        format!("Alerts:        {} critical", service.critical_alerts_count),
        format!("Clients only:  {}", yes_no(service.is_clients_only())),
        format!("Configurable:  {}", yes_no(service.is_configurable())),
    ];
    let types = service.service_types();
    if !types.is_empty() {
        lines.push(format!("Types:         {}", types.join(", ")));
    }
    if !service.is_loaded() {
        lines.push("Loaded:        no (referenced by components only)".to_string());
    }

    lines.push(String::new());
    lines.push(format!("Host components ({}):", service.host_components().len()));
    for component in service.host_components() {
        lines.push(format!(
            "  {:<24} {:<28} {}{}",
            component.display_name,
            component.host_display_name(),
            component
                .work_status
                .map(|status| status.to_string())
                .unwrap_or_else(|| "-".to_string()),
            if component.stale_configs { "  stale" } else { "" }
        ));
    }

    lines.push(String::new());
    if service.is_restart_required() {
        lines.extend(service.restart_required_hosts_and_components().summary_lines());
    } else {
        lines.push("No restart required".to_string());
    }
    lines
}

fn slider_detail_lines(app: &SliderApp) -> Vec<String> {
    let stamp = |value: Option<DateTime<chrono::Utc>>| {
        value
            .map(|date| date.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    let mut lines = vec![
        format!("Id:       {}", app.id),
        format!("Name:     {}", app.name),
        format!("Status:   {}", app.status),
        format!("Type:     {}", app.app_type),
        format!("User:     {}", app.user),
        format!("Started:  {}", stamp(app.started)),
        format!("Ended:    {}", stamp(app.ended)),
    ];
    if let Some(diagnostics) = &app.diagnostics {
        lines.push(String::new());
        lines.push("Diagnostics:".to_string());
        lines.extend(diagnostics.lines().map(|line| format!("  {line}")));
    }
    lines
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn normalize_status_text(status: String) -> String {
    const MAX_STATUS_LEN: usize = 180;
    if status.chars().count() <= MAX_STATUS_LEN {
        return status;
    }

    let mut shortened = status
        .chars()
        .take(MAX_STATUS_LEN.saturating_sub(1))
        .collect::<String>();
    shortened.push('…');
    shortened
}
