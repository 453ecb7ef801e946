use crate::ambari::GatewaySettings;
use crate::cli::CliArgs;
use crate::cluster_status::RunMode;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const DEFAULT_SERVER: &str = "http://localhost:8080";
const DEFAULT_USER: &str = "admin";
const DEFAULT_REFRESH_MS: u64 = 3_000;
const MIN_REFRESH_MS: u64 = 500;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeConfigSnapshot {
    pub source: Option<String>,
    pub server: Option<String>,
    pub cluster: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub refresh_ms: Option<u64>,
    pub offline: bool,
    pub slider_instance: Option<String>,
    pub slider_version: Option<String>,
    pub messages: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfigWatcher {
    path: Option<PathBuf>,
    pinned: bool,
    modified: Option<SystemTime>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct CockpitConfigFile {
    #[serde(default, alias = "url")]
    server: Option<String>,
    #[serde(default)]
    cluster: Option<String>,
    #[serde(default, alias = "username")]
    user: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default, alias = "refresh", alias = "refresh_interval_ms")]
    refresh_ms: Option<u64>,
    #[serde(default)]
    offline: bool,
    #[serde(default)]
    slider: Option<SliderSpec>,
    #[serde(default)]
    messages: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct SliderSpec {
    instance: String,
    #[serde(default)]
    version: Option<String>,
}

impl RuntimeConfigWatcher {
    pub fn discover() -> Self {
        Self {
            path: discover_config_path(),
            pinned: false,
            modified: None,
        }
    }

    /// Watches one explicit file; no fallback discovery when it goes away.
    pub fn at(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            pinned: true,
            modified: None,
        }
    }

    pub fn load_current(&mut self) -> Result<RuntimeConfigSnapshot> {
        let Some(path) = self.path.clone() else {
            return Ok(RuntimeConfigSnapshot::default());
        };

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let snapshot = parse_config(&raw, &path)?;
        self.modified = fs::metadata(&path)
            .ok()
            .and_then(|meta| meta.modified().ok());
        Ok(snapshot)
    }

    pub fn reload_if_changed(&mut self) -> Result<Option<RuntimeConfigSnapshot>> {
        let Some(current_path) = self.path.clone() else {
            self.path = discover_config_path();
            if self.path.is_some() {
                return self.load_current().map(Some);
            }
            return Ok(None);
        };

        if !current_path.exists() {
            self.modified = None;
            if !self.pinned {
                self.path = discover_config_path();
                if self.path.is_some() {
                    return self.load_current().map(Some);
                }
            }
            return Ok(Some(RuntimeConfigSnapshot::default()));
        }

        let modified = fs::metadata(&current_path)
            .ok()
            .and_then(|meta| meta.modified().ok());
        if modified != self.modified {
            return self.load_current().map(Some);
        }

        Ok(None)
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<RuntimeConfigSnapshot> {
    let parsed: CockpitConfigFile = serde_yaml::from_str(raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    let (slider_instance, slider_version) = match parsed.slider {
        Some(slider) => (Some(slider.instance), slider.version),
        None => (None, None),
    };
    Ok(RuntimeConfigSnapshot {
        source: Some(path.display().to_string()),
        server: parsed.server,
        cluster: parsed.cluster,
        user: parsed.user,
        password: parsed.password,
        refresh_ms: parsed.refresh_ms,
        offline: parsed.offline,
        slider_instance,
        slider_version,
        messages: parsed.messages.into_iter().collect(),
    })
}

/// Connection settings with CLI flags taking precedence over the file.
pub fn gateway_settings(args: &CliArgs, snapshot: &RuntimeConfigSnapshot) -> GatewaySettings {
    let offline = args.offline || snapshot.offline;
    GatewaySettings {
        server: args
            .server
            .clone()
            .or_else(|| snapshot.server.clone())
            .unwrap_or_else(|| DEFAULT_SERVER.to_string()),
        cluster: args.cluster.clone().or_else(|| snapshot.cluster.clone()),
        user: args
            .user
            .clone()
            .or_else(|| snapshot.user.clone())
            .unwrap_or_else(|| DEFAULT_USER.to_string()),
        password: args
            .password
            .clone()
            .or_else(|| snapshot.password.clone())
            .unwrap_or_else(|| DEFAULT_USER.to_string()),
        slider_instance: snapshot.slider_instance.clone(),
        slider_version: snapshot
            .slider_version
            .clone()
            .unwrap_or_else(|| "1.0.0".to_string()),
        mode: if offline {
            RunMode::Offline
        } else {
            RunMode::Live
        },
    }
}

pub fn refresh_interval_ms(args: &CliArgs, snapshot: &RuntimeConfigSnapshot) -> u64 {
    args.refresh_ms
        .or(snapshot.refresh_ms)
        .unwrap_or(DEFAULT_REFRESH_MS)
        .max(MIN_REFRESH_MS)
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("AMBARI_COCKPIT_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("ambari-cockpit.yaml"),
        PathBuf::from("ambari-cockpit.yml"),
        PathBuf::from(".ambari-cockpit.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let user_candidates = [
            PathBuf::from(&home).join(".config/ambari-cockpit/config.yaml"),
            PathBuf::from(&home).join(".config/ambari-cockpit/config.yml"),
        ];
        for candidate in user_candidates {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::{RuntimeConfigSnapshot, RuntimeConfigWatcher, gateway_settings, parse_config};
    use super::refresh_interval_ms;
    use crate::cli::CliArgs;
    use crate::cluster_status::RunMode;
    use clap::Parser;
    use std::fs;
    use std::path::Path;

    const SAMPLE: &str = r#"
server: http://ambari.example.com:8080
cluster: prod
username: ops
password: secret
refresh: 10000
slider:
  instance: SLIDER_1
messages:
  tableView.filters.info: "{0}/{1}"
"#;

    #[test]
    fn config_file_parses_with_aliases() {
        let snapshot = parse_config(SAMPLE, Path::new("cockpit.yaml")).expect("parse");
        assert_eq!(snapshot.source.as_deref(), Some("cockpit.yaml"));
        assert_eq!(snapshot.server.as_deref(), Some("http://ambari.example.com:8080"));
        assert_eq!(snapshot.user.as_deref(), Some("ops"));
        assert_eq!(snapshot.refresh_ms, Some(10_000));
        assert_eq!(snapshot.slider_instance.as_deref(), Some("SLIDER_1"));
        assert_eq!(
            snapshot.messages.get("tableView.filters.info").map(String::as_str),
            Some("{0}/{1}")
        );
    }

    #[test]
    fn invalid_yaml_reports_path() {
        let error = parse_config("server: [", Path::new("broken.yaml")).expect_err("invalid");
        assert!(format!("{error:#}").contains("broken.yaml"));
    }

    #[test]
    fn cli_flags_override_file_values() {
        let snapshot = parse_config(SAMPLE, Path::new("cockpit.yaml")).expect("parse");
        let args = CliArgs::parse_from([
            "ambari-cockpit",
            "--cluster",
            "staging",
            "--refresh-ms",
            "100",
            "--offline",
        ]);
        let settings = gateway_settings(&args, &snapshot);
        assert_eq!(settings.cluster.as_deref(), Some("staging"));
        assert_eq!(settings.server, "http://ambari.example.com:8080");
        assert_eq!(settings.user, "ops");
        assert_eq!(settings.slider_version, "1.0.0");
        assert_eq!(settings.mode, RunMode::Offline);
        assert_eq!(refresh_interval_ms(&args, &snapshot), 500);
    }

    #[test]
    fn defaults_apply_without_file() {
        let args = CliArgs::parse_from(["ambari-cockpit"]);
        let snapshot = RuntimeConfigSnapshot::default();
        let settings = gateway_settings(&args, &snapshot);
        assert_eq!(settings.server, "http://localhost:8080");
        assert_eq!(settings.mode, RunMode::Live);
        assert_eq!(refresh_interval_ms(&args, &snapshot), 3_000);
    }

    #[test]
    fn pinned_watcher_reloads_on_change_and_removal() {
        let path = std::env::temp_dir().join(format!(
            "ambari-cockpit-config-{}.yaml",
            std::process::id()
        ));
        fs::write(&path, "cluster: one\n").expect("write");

        let mut watcher = RuntimeConfigWatcher::at(path.clone());
        let first = watcher.reload_if_changed().expect("reload").expect("loaded");
        assert_eq!(first.cluster.as_deref(), Some("one"));
        assert_eq!(watcher.reload_if_changed().expect("unchanged"), None);

        fs::remove_file(&path).expect("remove");
        let cleared = watcher.reload_if_changed().expect("reload").expect("cleared");
        assert_eq!(cleared, RuntimeConfigSnapshot::default());
    }
}
