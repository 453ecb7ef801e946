mod ambari;
mod app;
mod cli;
mod cluster_status;
mod config;
mod fixtures;
mod i18n;
mod input;
mod model;
mod service;
mod slider;
mod table_view;
mod ui;
mod views;

use ambari::AmbariGateway;
use anyhow::{Context, Result};
use app::{App, AppCommand};
use clap::Parser;
use cli::CliArgs;
use cluster_status::{ClusterStatus, ClusterStatusPatch, ClusterStatusValue, RunMode};
use config::{RuntimeConfigSnapshot, RuntimeConfigWatcher};
use crossterm::event::{
    Event, EventStream, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use futures::StreamExt;
use i18n::Messages;
use model::ConsoleTab;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior, interval, timeout};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;
const TABLE_REFRESH_TIMEOUT: Duration = Duration::from_secs(8);
const STATUS_REQUEST_TIMEOUT: Duration = Duration::from_secs(4);

/// Results of cluster status requests that ran off the UI loop.
#[derive(Debug)]
enum BackgroundEvent {
    StatusLoaded(std::result::Result<Option<ClusterStatusPatch>, String>),
    StatusPersisted {
        value: ClusterStatusValue,
        result: std::result::Result<(), String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter, args.log_file.as_deref())?;

    let mut watcher = match &args.config {
        Some(path) => RuntimeConfigWatcher::at(path.clone()),
        None => RuntimeConfigWatcher::discover(),
    };
    let snapshot = watcher.load_current()?;
    if let Some(source) = &snapshot.source {
        info!(source = %source, "loaded config");
    }

    let settings = config::gateway_settings(&args, &snapshot);
    let refresh_ms = config::refresh_interval_ms(&args, &snapshot);
    let mut gateway = AmbariGateway::new(&settings)?;

    let mut app = App::new(
        gateway.server().to_string(),
        settings.user.clone(),
        ClusterStatus::new(gateway.mode()),
    );
    app.set_messages(messages_from(&snapshot));

    match gateway.discover_cluster().await {
        Ok(cluster) => app.set_cluster(cluster),
        Err(error) => {
            warn!("cluster discovery failed: {error:#}");
            app.set_status(format!("Cluster discovery failed: {}", compact_error(&error)));
        }
    }

    run(&mut app, &gateway, &mut watcher, refresh_ms).await
}

fn init_tracing(level_filter: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    // The terminal belongs to the UI; logs go to a file or nowhere.
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::sink).try_init();
        }
    }

    Ok(())
}

fn messages_from(snapshot: &RuntimeConfigSnapshot) -> Messages {
    Messages::with_overrides(snapshot.messages.clone())
}

async fn run(
    app: &mut App,
    gateway: &AmbariGateway,
    watcher: &mut RuntimeConfigWatcher,
    refresh_ms: u64,
) -> Result<()> {
    let (mut terminal, keyboard_enhanced) = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, gateway, watcher, refresh_ms).await;
    let restore_result = restore_terminal(&mut terminal, keyboard_enhanced);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<(TuiTerminal, bool)> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if keyboard_enhanced {
        execute!(
            stdout,
            EnterAlternateScreen,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )
        .context("failed to enter alternate screen with keyboard enhancement")?;
    } else {
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok((terminal, keyboard_enhanced))
}

fn restore_terminal(terminal: &mut TuiTerminal, keyboard_enhanced: bool) -> Result<()> {
    if keyboard_enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("failed to pop keyboard enhancement flags")?;
    }
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(
    terminal: &mut TuiTerminal,
    app: &mut App,
    gateway: &AmbariGateway,
    watcher: &mut RuntimeConfigWatcher,
    refresh_ms: u64,
) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<BackgroundEvent>();

    if !gateway.cluster().is_empty() {
        app.set_status(format!("Loading cluster {}…", gateway.cluster()));
        terminal
            .draw(|frame| ui::render(frame, app))
            .context("failed to render terminal frame")?;
        let command = app.request_cluster_status(None);
        execute_app_command(app, gateway, command, &event_tx).await;
        refresh_services(app, gateway).await;
    }

    let mut reader = EventStream::new();
    let mut ticker = interval(Duration::from_millis(refresh_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; startup already refreshed.
    ticker.tick().await;

    loop {
        terminal
            .draw(|frame| ui::render(frame, app))
            .context("failed to render terminal frame")?;

        if !app.running() {
            break;
        }

        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = input::map_key(app.mode(), key) {
                            debug!("action={action:?}");
                            let command = app.apply_action(action);
                            if command != AppCommand::None {
                                terminal
                                    .draw(|frame| ui::render(frame, app))
                                    .context("failed to render terminal frame")?;
                            }
                            execute_app_command(app, gateway, command, &event_tx).await;
                        }
                    }
                    Some(Ok(Event::Resize(_, _))) => {}
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        app.set_status(format!("terminal event error: {error}"));
                    }
                    None => {
                        app.set_status("terminal event stream closed");
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                reload_config(app, watcher);
                if !gateway.cluster().is_empty() {
                    refresh_services(app, gateway).await;
                    if app.active_tab() == ConsoleTab::SliderApps {
                        refresh_slider_apps(app, gateway).await;
                    }
                }
            }
            maybe_event = event_rx.recv() => {
                if let Some(event) = maybe_event {
                    apply_background_event(app, event);
                }
            }
        }
    }

    Ok(())
}

async fn execute_app_command(
    app: &mut App,
    gateway: &AmbariGateway,
    command: AppCommand,
    event_tx: &mpsc::UnboundedSender<BackgroundEvent>,
) {
    match command {
        AppCommand::None => {}
        AppCommand::RefreshServices => refresh_services(app, gateway).await,
        AppCommand::RefreshSliderApps => refresh_slider_apps(app, gateway).await,
        AppCommand::RefreshClusterStatus { asynchronous } => {
            if runs_in_background(gateway.mode(), asynchronous) {
                let gateway = gateway.clone();
                let tx = event_tx.clone();
                tokio::spawn(async move {
                    let result = load_cluster_status(&gateway).await;
                    let _ = tx.send(BackgroundEvent::StatusLoaded(result));
                });
                app.set_status("Loading cluster status in the background…");
            } else {
                let result = load_cluster_status(gateway).await;
                apply_background_event(app, BackgroundEvent::StatusLoaded(result));
            }
        }
        AppCommand::PersistClusterStatus {
            value,
            asynchronous,
        } => {
            if runs_in_background(gateway.mode(), asynchronous) {
                let gateway = gateway.clone();
                let tx = event_tx.clone();
                tokio::spawn(async move {
                    let result = persist_cluster_status(&gateway, &value).await;
                    let _ = tx.send(BackgroundEvent::StatusPersisted { value, result });
                });
                app.set_status("Saving cluster status in the background…");
            } else {
                let result = persist_cluster_status(gateway, &value).await;
                apply_background_event(app, BackgroundEvent::StatusPersisted { value, result });
            }
        }
    }
}

/// Offline requests are answered from fixtures, so they stay inline.
fn runs_in_background(mode: RunMode, asynchronous: bool) -> bool {
    asynchronous && mode == RunMode::Live
}

fn apply_background_event(app: &mut App, event: BackgroundEvent) {
    match event {
        BackgroundEvent::StatusLoaded(Ok(patch)) => app.apply_cluster_status(patch),
        BackgroundEvent::StatusLoaded(Err(error)) => {
            app.set_status(format!("Cluster status refresh failed: {error}"));
        }
        BackgroundEvent::StatusPersisted {
            value,
            result: Ok(()),
        } => {
            app.set_status(format!("Cluster status saved: {}", value.cluster_state));
        }
        BackgroundEvent::StatusPersisted {
            result: Err(error), ..
        } => {
            app.set_status(format!("Cluster status save failed: {error}"));
        }
    }
}

async fn load_cluster_status(
    gateway: &AmbariGateway,
) -> std::result::Result<Option<ClusterStatusPatch>, String> {
    match timeout(STATUS_REQUEST_TIMEOUT, gateway.fetch_cluster_status()).await {
        Ok(Ok(patch)) => Ok(patch),
        Ok(Err(error)) => Err(compact_error(&error)),
        Err(_) => Err("request timed out".to_string()),
    }
}

async fn persist_cluster_status(
    gateway: &AmbariGateway,
    value: &ClusterStatusValue,
) -> std::result::Result<(), String> {
    match timeout(STATUS_REQUEST_TIMEOUT, gateway.persist_cluster_status(value)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(compact_error(&error)),
        Err(_) => Err("request timed out".to_string()),
    }
}

async fn refresh_services(app: &mut App, gateway: &AmbariGateway) {
    match timeout(TABLE_REFRESH_TIMEOUT, gateway.fetch_services()).await {
        Ok(Ok(services)) => app.set_services(services),
        Ok(Err(error)) => app.set_tab_error(ConsoleTab::Services, compact_error(&error)),
        Err(_) => {
            app.set_status("Refresh timed out for Services (showing cached data)");
        }
    }
}

async fn refresh_slider_apps(app: &mut App, gateway: &AmbariGateway) {
    match timeout(TABLE_REFRESH_TIMEOUT, gateway.fetch_slider_apps()).await {
        Ok(Ok(apps)) => app.set_slider_apps(apps),
        Ok(Err(error)) => app.set_tab_error(ConsoleTab::SliderApps, compact_error(&error)),
        Err(_) => {
            app.set_status("Refresh timed out for Slider Apps (showing cached data)");
        }
    }
}

/// Picks up edited message overrides; connection settings need a restart.
fn reload_config(app: &mut App, watcher: &mut RuntimeConfigWatcher) {
    match watcher.reload_if_changed() {
        Ok(Some(snapshot)) => {
            app.set_messages(messages_from(&snapshot));
            let source = snapshot.source.as_deref().unwrap_or("defaults");
            info!(source = %source, "config reloaded");
            app.set_status(format!("Config reloaded from {source}"));
        }
        Ok(None) => {}
        Err(error) => {
            warn!("config reload failed: {error:#}");
            app.set_status(format!("Config reload failed: {}", compact_error(&error)));
        }
    }
}

fn compact_error(error: &anyhow::Error) -> String {
    let mut out = Vec::new();
    for (index, cause) in error.chain().enumerate() {
        if index == 0 {
            out.push(cause.to_string());
        } else if index <= 2 {
            out.push(format!("caused by: {cause}"));
        } else {
            break;
        }
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{
        BackgroundEvent, apply_background_event, compact_error, execute_app_command,
        runs_in_background,
    };
    use crate::ambari::{AmbariGateway, GatewaySettings};
    use crate::app::{App, AppCommand};
    use crate::cluster_status::{ClusterState, ClusterStatus, ClusterStatusPatch, RunMode};
    use anyhow::anyhow;
    use tokio::sync::mpsc;

    fn live_app() -> App {
        App::new(
            "http://ambari:8080".to_string(),
            "admin".to_string(),
            ClusterStatus::new(RunMode::Live),
        )
    }

    #[test]
    fn compact_error_keeps_two_causes() {
        let error = anyhow!("root")
            .context("middle")
            .context("outer")
            .context("top");
        let text = compact_error(&error);
        assert_eq!(text, "top\ncaused by: outer\ncaused by: middle");
    }

    #[test]
    fn loaded_status_is_applied_to_the_holder() {
        let mut app = live_app();
        let patch = ClusterStatusPatch {
            cluster_name: Some("demo".to_string()),
            cluster_state: Some(ClusterState::Default),
            ..ClusterStatusPatch::default()
        };
        apply_background_event(&mut app, BackgroundEvent::StatusLoaded(Ok(Some(patch))));
        assert!(app.cluster_status().is_installed());
        assert_eq!(app.cluster_status().cluster_name(), "demo");
    }

    #[test]
    fn failed_persist_is_reported_in_status() {
        let mut app = live_app();
        let value = app.cluster_status().value();
        apply_background_event(
            &mut app,
            BackgroundEvent::StatusPersisted {
                value,
                result: Err("403 Forbidden".to_string()),
            },
        );
        assert!(app.status().contains("save failed"));
    }

    #[test]
    fn only_live_async_requests_leave_the_loop() {
        assert!(runs_in_background(RunMode::Live, true));
        assert!(!runs_in_background(RunMode::Live, false));
        assert!(!runs_in_background(RunMode::Offline, true));
        assert!(!runs_in_background(RunMode::Offline, false));
    }

    #[tokio::test]
    async fn offline_async_status_refresh_is_applied_inline() {
        let gateway = AmbariGateway::new(&GatewaySettings {
            server: "http://localhost:8080/".to_string(),
            cluster: None,
            user: "admin".to_string(),
            password: "admin".to_string(),
            slider_instance: None,
            slider_version: "1.0.0".to_string(),
            mode: RunMode::Offline,
        })
        .expect("gateway");
        let mut app = App::new(
            "offline".to_string(),
            "admin".to_string(),
            ClusterStatus::new(RunMode::Offline),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();

        execute_app_command(
            &mut app,
            &gateway,
            AppCommand::RefreshClusterStatus { asynchronous: true },
            &tx,
        )
        .await;

        assert!(app.cluster_status().is_installed());
        assert!(rx.try_recv().is_err());
    }
}
