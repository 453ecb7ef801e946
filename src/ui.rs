use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};

use crate::app::{App, InputMode, TableSnapshot};
use crate::cluster_status::RunMode;
use crate::i18n::{CLUSTER_INSTALLED_KEY, CLUSTER_NOT_INSTALLED_KEY};
use crate::model::ConsoleTab;

const BG: Color = Color::Rgb(9, 15, 25);
const PANEL: Color = Color::Rgb(16, 27, 44);
const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);
const WARN: Color = Color::Rgb(251, 191, 36);
const ERROR: Color = Color::Rgb(248, 113, 113);
const PL_A: Color = Color::Rgb(17, 94, 89);
const PL_B: Color = Color::Rgb(30, 64, 175);
const PL_C: Color = Color::Rgb(55, 48, 163);
const PL_D: Color = Color::Rgb(82, 24, 124);
const PL_E: Color = Color::Rgb(13, 148, 136);

pub fn render(frame: &mut Frame, app: &mut App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], app);
    render_body(frame, root[1], app);
    render_footer(frame, root[2], app);

    if app.show_help() {
        render_help_modal(frame, app);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let left_line = build_left_header_line(app);
    if area.width < 42 {
        frame.render_widget(
            Paragraph::new(left_line).style(Style::default().bg(BG).fg(Color::White)),
            area,
        );
        return;
    }

    let right_line = build_right_header_line(app);
    let right_width = spans_width(&right_line.spans) as u16;
    if right_width == 0 || right_width >= area.width {
        frame.render_widget(
            Paragraph::new(left_line).style(Style::default().bg(BG).fg(Color::White)),
            area,
        );
        return;
    }
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right_width)])
        .split(area);
    frame.render_widget(
        Paragraph::new(left_line).style(Style::default().bg(BG).fg(Color::White)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(right_line).style(Style::default().bg(BG)),
        chunks[1],
    );
}

fn build_left_header_line(app: &App) -> Line<'static> {
    let status = app.cluster_status();
    let mut spans = Vec::new();
    push_powerline_segment(&mut spans, " AMBARI ", Color::Black, ACCENT, PL_A);
    push_powerline_segment(
        &mut spans,
        format!(" 󰀄 {} ", compact_text(app.user(), 14)),
        Color::White,
        PL_A,
        PL_B,
    );
    push_powerline_segment(
        &mut spans,
        format!(" 󰒋 {} ", compact_text(&display_server_endpoint(app.server()), 26)),
        Color::White,
        PL_B,
        PL_C,
    );
    let cluster = if app.cluster().is_empty() {
        "-"
    } else {
        app.cluster()
    };
    push_powerline_segment(
        &mut spans,
        format!(" 󰠳 {} ", compact_text(cluster, 16)),
        Color::White,
        PL_C,
        PL_D,
    );

    let (state_fg, state_bg) = if status.is_installed() {
        (Color::White, PL_E)
    } else {
        (Color::Black, WARN)
    };
    push_powerline_segment(
        &mut spans,
        format!(" {} ", compact_text(status.cluster_state().as_str(), 24)),
        Color::White,
        PL_D,
        state_bg,
    );
    let installed = if status.is_installed() {
        format!(" 󰄬 {} ", app.messages().translate(CLUSTER_INSTALLED_KEY, &[]))
    } else {
        format!(" 󰅚 {} ", app.messages().translate(CLUSTER_NOT_INSTALLED_KEY, &[]))
    };
    let tail_bg = if status.mode() == RunMode::Offline {
        Color::Rgb(88, 28, 135)
    } else {
        BG
    };
    push_powerline_segment(&mut spans, installed, state_fg, state_bg, tail_bg);
    if status.mode() == RunMode::Offline {
        push_powerline_segment(&mut spans, " 󰌾 offline ", Color::White, tail_bg, BG);
    }

    Line::from(spans)
}

fn build_right_header_line(app: &App) -> Line<'static> {
    let mut spans = Vec::new();
    let mut next_bg = BG;
    for tab in ConsoleTab::ALL {
        let active = tab == app.active_tab();
        let bg = if active {
            Color::Rgb(59, 130, 246)
        } else {
            Color::Rgb(30, 41, 59)
        };
        let fg = if active { Color::Black } else { Color::White };
        push_powerline_segment_rtl(&mut spans, tab_label(tab, active), fg, bg, next_bg);
        next_bg = bg;
    }
    spans.push(Span::styled(" ", Style::default().bg(next_bg)));
    Line::from(spans)
}

fn render_body(frame: &mut Frame, area: Rect, app: &mut App) {
    app.set_table_page_size(table_rows_visible(area));

    if app.show_details() {
        render_detail(frame, area, app);
    } else {
        render_table(frame, area, app);
    }
}

fn render_table(frame: &mut Frame, area: Rect, app: &App) {
    let snapshot = app.table_snapshot();

    if let Some(error) = &snapshot.error {
        let panel = Paragraph::new(Text::from(error.clone()))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(format!("{} Error", app.active_tab().title()))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(ERROR))
                    .style(Style::default().bg(PANEL)),
            )
            .style(Style::default().fg(ERROR));
        frame.render_widget(panel, area);
        return;
    }

    let header_row = Row::new(snapshot.headers.iter().enumerate().map(|(column, header)| {
        let style = if column == snapshot.focused_column {
            Style::default()
                .fg(WARN)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        Cell::from(header.clone()).style(style)
    }))
    .height(1)
    .style(Style::default().fg(ACCENT));

    let rows = snapshot.rows.iter().map(|row| {
        Row::new(
            row.iter()
                .map(|column| Cell::from(column.clone()).style(Style::default().fg(Color::White))),
        )
    });

    let table = Table::new(rows, column_constraints(snapshot.headers.len()))
        .header(header_row)
        .block(
            Block::default()
                .title(table_title(&snapshot))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .column_spacing(1)
        .row_highlight_style(
            Style::default()
                .bg(Color::Rgb(24, 36, 58))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("󰜴 ");

    let mut state = TableState::default();
    state.select(snapshot.selected);
    frame.render_stateful_widget(table, area, &mut state);
}

fn table_title(snapshot: &TableSnapshot) -> String {
    let mut title = format!("{} ({})", snapshot.title, snapshot.info);
    if !snapshot.filters.is_empty() {
        title.push_str("  󰈲 ");
        title.push_str(&snapshot.filters.join(" "));
    }
    title
}

fn render_detail(frame: &mut Frame, area: Rect, app: &App) {
    let mut lines = app
        .detail_lines()
        .into_iter()
        .map(Line::from)
        .collect::<Vec<_>>();
    if let Some(message) = app.selected_restart_message() {
        lines.push(Line::from(""));
        for line in message.lines() {
            lines.push(Line::from(Span::styled(
                line.to_string(),
                Style::default().fg(WARN),
            )));
        }
    }

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(app.detail_title())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll(), 0));

    frame.render_widget(paragraph, area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    if matches!(app.mode(), InputMode::Normal) {
        let mut spans = Vec::new();
        let status_icon = footer_status_icon(app.status());
        push_powerline_segment(&mut spans, " 󰘳 nrm ", Color::White, PL_A, PL_B);
        push_powerline_segment(
            &mut spans,
            format!(
                " {status_icon} {} ",
                compact_text(app.status(), area.width.saturating_sub(24).clamp(24, 120) as usize)
            ),
            Color::White,
            PL_B,
            BG,
        );

        let right_spans = build_footer_glance_spans(app);
        let max_right = area.width.saturating_sub(28);
        let right_width = (spans_width(&right_spans) as u16).min(max_right);
        if right_width == 0 {
            frame.render_widget(
                Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
                area,
            );
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(right_width)])
            .split(area);
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
            chunks[0],
        );
        frame.render_widget(
            Paragraph::new(Line::from(right_spans))
                .style(Style::default().bg(BG))
                .alignment(Alignment::Right),
            chunks[1],
        );
        return;
    }

    let (label, prompt, prompt_bg) = match app.mode() {
        InputMode::Filter => (" 󰈲 flt ", format!("/{}", app.input()), WARN),
        InputMode::Command => (" 󰘳 cmd ", format!(":{}", app.input()), ACCENT),
        InputMode::Normal => return,
    };

    let mut spans = Vec::new();
    push_powerline_segment(&mut spans, label, Color::Black, prompt_bg, PL_B);
    push_powerline_segment(&mut spans, format!(" {prompt} "), Color::White, PL_B, BG);
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        area,
    );
}

fn build_footer_glance_spans(app: &App) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let restarts = app.registry().restart_required_services().count();
    if restarts > 0 {
        spans.push(Span::styled(
            format!(" 󰜉 {restarts} restart "),
            Style::default().fg(WARN).bg(BG),
        ));
    }
    let refreshed = app.last_refreshed().unwrap_or_else(|| "--:--:--".to_string());
    spans.push(Span::styled(
        format!(" 󰥔 {refreshed} "),
        Style::default().fg(MUTED).bg(BG),
    ));
    spans
}

fn footer_status_icon(status_text: &str) -> &'static str {
    let status = status_text.to_ascii_lowercase();
    let has_failure = [
        "failed",
        "error",
        "timed out",
        "timeout",
        "unreachable",
        "refused",
        "forbidden",
        "denied",
        "unknown",
    ]
    .iter()
    .any(|needle| status.contains(needle));
    if has_failure { "󰅚" } else { "󰄬" }
}

fn push_powerline_segment(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
}

fn push_powerline_segment_rtl(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
}

fn tab_label(tab: ConsoleTab, active: bool) -> String {
    let slot = tab.index() + 1;
    if active {
        format!(" ◉{slot} {} ", tab.short_token())
    } else {
        format!(" {slot} {} ", tab.short_token())
    }
}

fn spans_width(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|span| span.content.chars().count()).sum()
}

fn render_help_modal(frame: &mut Frame, app: &App) {
    let area = centered_rect(78, 72, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(format!(
            "ambari-cockpit help  mode:{}  tab:{}",
            help_mode_label(app.mode()),
            app.active_tab().title()
        )),
        Line::from(""),
    ];
    for line in help_lines() {
        lines.push(Line::from(line));
    }

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));

    frame.render_widget(modal, area);
}

fn help_lines() -> Vec<&'static str> {
    vec![
        "Tabs: 1..3 jump  Tab/Right next  BackTab/Left previous",
        "Move: j/k  gg/G  Ctrl+d/Ctrl+u  PgDn/PgUp",
        "Table: s sort focused column  S reverse  c/C or ]/[ focus column",
        "Filter: / type value for focused column  f cycle select options  x clear all",
        "Details: Enter/d toggle  Esc close",
        "Refresh: r or F5",
        "",
        "Commands (:)",
        "  svc | rs | sl                switch tab",
        "  filter <column> [value]      filter a column, empty value clears",
        "  sort <column> [asc|desc]     sort by column",
        "  clear                        drop filters and sort",
        "  status [async]               reload persisted cluster status",
        "  state <STATE> [async]        persist a new cluster state",
        "  refresh | help | quit",
    ]
}

fn help_mode_label(mode: InputMode) -> &'static str {
    match mode {
        InputMode::Normal => "normal",
        InputMode::Filter => "filter",
        InputMode::Command => "command",
    }
}

fn table_rows_visible(area: Rect) -> usize {
    area.height.saturating_sub(3).max(1) as usize
}

fn compact_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }

    if max_chars <= 1 {
        return "…".to_string();
    }

    let mut out = value
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

fn display_server_endpoint(server: &str) -> String {
    let trimmed = server.trim().trim_end_matches('/');
    trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed)
        .to_string()
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn column_constraints(columns: usize) -> Vec<Constraint> {
    if columns == 0 {
        return vec![Constraint::Percentage(100)];
    }

    let width = (100 / columns as u16).max(1);
    (0..columns)
        .map(|_| Constraint::Percentage(width))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{compact_text, display_server_endpoint, footer_status_icon, render};
    use crate::app::App;
    use crate::cluster_status::{ClusterStatus, RunMode};
    use crate::i18n::{CLUSTER_NOT_INSTALLED_KEY, Messages};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn compact_text_truncates_with_ellipsis() {
        assert_eq!(compact_text("short", 10), "short");
        assert_eq!(compact_text("c6401.ambari.apache.org", 8), "c6401.a…");
        assert_eq!(compact_text("anything", 1), "…");
    }

    #[test]
    fn server_endpoint_drops_scheme_and_trailing_slash() {
        assert_eq!(
            display_server_endpoint("http://ambari.example.com:8080/"),
            "ambari.example.com:8080"
        );
        assert_eq!(display_server_endpoint("offline"), "offline");
    }

    #[test]
    fn failure_words_switch_status_icon() {
        assert_eq!(footer_status_icon("Services refresh failed: 500"), "󰅚");
        assert_eq!(footer_status_icon("Ready"), "󰄬");
    }

    #[test]
    fn render_draws_header_and_table_title() {
        let mut app = App::new(
            "offline".to_string(),
            "admin".to_string(),
            ClusterStatus::new(RunMode::Offline),
        );
        app.set_cluster("demo");
        let mut terminal = Terminal::new(TestBackend::new(140, 20)).expect("terminal");
        terminal
            .draw(|frame| render(frame, &mut app))
            .expect("draw");

        let text = buffer_text(&terminal);
        assert!(text.contains("AMBARI"));
        assert!(text.contains("demo"));
        assert!(text.contains("Services"));
    }

    #[test]
    fn installed_badge_is_translated() {
        let mut app = App::new(
            "offline".to_string(),
            "admin".to_string(),
            ClusterStatus::new(RunMode::Offline),
        );
        app.set_cluster("demo");
        app.set_messages(Messages::with_overrides([(
            CLUSTER_NOT_INSTALLED_KEY.to_string(),
            "absent".to_string(),
        )]));
        let mut terminal = Terminal::new(TestBackend::new(200, 20)).expect("terminal");
        terminal
            .draw(|frame| render(frame, &mut app))
            .expect("draw");

        let text = buffer_text(&terminal);
        assert!(text.contains("absent"));
        assert!(!text.contains("not installed"));
    }
}
