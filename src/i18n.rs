use std::collections::HashMap;

pub const RESTART_TOOLTIP_KEY: &str = "services.service.config.restartService.TooltipMessage";
pub const SLIDER_FILTER_INFO_KEY: &str = "sliderApps.filters.info";
pub const TABLE_FILTER_INFO_KEY: &str = "tableView.filters.info";
pub const RESTART_REQUIRED_KEY: &str = "services.service.restartRequired";
pub const CLUSTER_INSTALLED_KEY: &str = "clusterStatus.installed";
pub const CLUSTER_NOT_INSTALLED_KEY: &str = "clusterStatus.notInstalled";

const DEFAULT_MESSAGES: [(&str, &str); 6] = [
    (
        RESTART_TOOLTIP_KEY,
        "<b>Restart Required</b><br/>{0} components on {1} hosts need restart<br/>{2}",
    ),
    (SLIDER_FILTER_INFO_KEY, "{0} of {1} sliders showing"),
    (TABLE_FILTER_INFO_KEY, "{0} of {1} showing"),
    (RESTART_REQUIRED_KEY, "Restart required"),
    (CLUSTER_INSTALLED_KEY, "installed"),
    (CLUSTER_NOT_INSTALLED_KEY, "not installed"),
];

/// Localized message table. Templates use `{0}`, `{1}`, ... placeholders.
#[derive(Debug, Clone)]
pub struct Messages {
    table: HashMap<String, String>,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            table: DEFAULT_MESSAGES
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }
}

impl Messages {
    pub fn with_overrides<I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut messages = Self::default();
        messages.table.extend(overrides);
        messages
    }

    /// Looks up `key` and substitutes the positional arguments. Unknown keys
    /// render as the key itself so a missing string is visible, not empty.
    pub fn translate(&self, key: &str, args: &[String]) -> String {
        match self.table.get(key) {
            Some(template) => format_template(template, args),
            None => key.to_string(),
        }
    }
}

pub fn format_template(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        match after[..close].parse::<usize>() {
            Ok(index) if index < args.len() => out.push_str(&args[index]),
            _ => out.push_str(&rest[open..open + close + 2]),
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}
