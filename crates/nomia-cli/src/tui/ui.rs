//! TUI rendering. Every feed is drawn through the same layout.
//!
//! ┌ NOMIA V1-RG ── LIVE ── CONNECTED ─────────────────┐
//! ├───────────┬───────────┬────────────┬──────────────┤
//! │ CPU TEMP  │ UPTIME    │ MODE       │ PROXIMITY    │
//! │ 48.5°C    │ 00:01:00  │ AUTO       │ ████░░ 120mm │
//! ├───────────┴───────────┴──┬─────────┴──────────────┤
//! │ ultra distance  ⣀⡠⠔⠊⠉   │ [SYS] MODE_SWITCH: AUTO │
//! │ cpu temperature ⠉⠒⠤⣀    │ [COM] MOVE: FWD         │
//! ├──────────────────────────┴────────────────────────┤
//! │ wasd: move   1 manual  2 auto  ...   q: quit      │
//! └───────────────────────────────────────────────────┘

use std::time::Instant;

use super::app::App;
use nomia_core::history::{CHART_HEIGHT, DISTANCE_RANGE, TEMPERATURE_RANGE};
use nomia_core::{
    HistoryBuffer, LinkState, Series, Telemetry, distance_ratio, format_distance,
    format_temperature,
};
use ratatui::{prelude::*, widgets::*};

pub fn draw(f: &mut Frame, app: &App, now: Instant) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(4), // readouts
            Constraint::Min(8),    // charts / logs
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    let glitch = app.glitch(now);
    draw_header(f, rows[0], app, glitch);
    draw_readouts(f, rows[1], app.source().telemetry(), glitch);
    draw_body(f, rows[2], app);
    draw_keys(f, rows[3], app);
}

fn draw_header(f: &mut Frame, area: Rect, app: &App, glitch: bool) {
    let border = if glitch { Color::Red } else { Color::Cyan };

    let mut spans = vec![
        Span::styled(" NOMIA V1-RG ", Style::default().bold().fg(Color::Cyan)),
        Span::raw("  source: "),
        Span::styled(app.source().label(), Style::default().bold().fg(Color::Yellow)),
    ];
    if let Some(state) = app.link_state() {
        let color = match state {
            LinkState::Connected => Color::Green,
            LinkState::Connecting => Color::Yellow,
            LinkState::Disconnected => Color::Red,
        };
        spans.push(Span::raw("  link: "));
        spans.push(Span::styled(state.label(), Style::default().bold().fg(color)));
    }
    if let Some((frames, dropped)) = app.frame_counts() {
        spans.push(Span::styled(
            format!("  {frames} frames  {dropped} dropped "),
            Style::default().fg(Color::DarkGray),
        ));
    }
    let t = app.source().telemetry();
    if let Some(status) = &t.esp32_status {
        spans.push(Span::styled(
            format!("  esp32: {status} "),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Line::from(spans));
    f.render_widget(block, area);
}

fn draw_readouts(f: &mut Frame, area: Rect, t: &Telemetry, glitch: bool) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(25),
            Constraint::Percentage(35),
        ])
        .split(area);

    let value_style = if glitch {
        Style::default().fg(Color::Red).add_modifier(Modifier::REVERSED)
    } else {
        Style::default().bold().fg(Color::White)
    };

    readout(f, cols[0], " CPU TEMP ", format_temperature(&t.cpu_temp), value_style);
    readout(f, cols[1], " UPTIME ", t.uptime.clone(), value_style);
    readout(f, cols[2], " MODE ", t.mode.clone(), value_style.patch(mode_style(&t.mode)));

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" PROXIMITY "))
        .gauge_style(Style::default().fg(if t.ultra_dist < 100 {
            Color::Red
        } else {
            Color::Green
        }))
        .ratio(distance_ratio(t.ultra_dist))
        .label(format_distance(t.ultra_dist));
    f.render_widget(gauge, cols[3]);
}

fn readout(f: &mut Frame, area: Rect, title: &str, value: String, style: Style) {
    let p = Paragraph::new(Span::styled(value, style))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

fn mode_style(mode: &str) -> Style {
    let alarm = ["HALT", "ALARM", "EMERGENCY", "LINK_LOST", "OFFLINE"]
        .iter()
        .any(|word| mode.contains(word));
    if alarm {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    }
}

fn draw_body(f: &mut Frame, area: Rect, app: &App) {
    let source = app.source();
    match (source.history(), app.show_logs()) {
        (Some(history), true) => {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(area);
            draw_charts(f, cols[0], history);
            draw_logs(f, cols[1], source.telemetry());
        }
        (Some(history), false) => draw_charts(f, area, history),
        (None, true) => draw_logs(f, area, source.telemetry()),
        (None, false) => {
            let p = Paragraph::new("Log panel hidden (l to show)")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(p, area);
        }
    }
}

fn draw_charts(f: &mut Frame, area: Rect, history: &HistoryBuffer) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    draw_chart(f, rows[0], history, Series::Distance, DISTANCE_RANGE, Color::Cyan);
    draw_chart(
        f,
        rows[1],
        history,
        Series::Temperature,
        TEMPERATURE_RANGE,
        Color::Yellow,
    );
}

fn draw_chart(
    f: &mut Frame,
    area: Rect,
    history: &HistoryBuffer,
    series: Series,
    range: (f64, f64),
    color: Color,
) {
    let data = history.chart_points(series);
    let x_max = (history.capacity().max(2) - 1) as f64;

    let datasets = vec![
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(color))
            .data(&data),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ({}) ", series.label(), series.unit())),
        )
        .x_axis(Axis::default().bounds([0.0, x_max]))
        .y_axis(Axis::default().bounds([0.0, CHART_HEIGHT]).labels(vec![
            Line::from(format!("{:.0}", range.0)),
            Line::from(format!("{:.0}", range.1)),
        ]));

    f.render_widget(chart, area);
}

fn draw_logs(f: &mut Frame, area: Rect, t: &Telemetry) {
    let visible = area.height.saturating_sub(2) as usize;
    let skip = t.logs.len().saturating_sub(visible);
    let lines: Vec<Line> = t
        .logs
        .iter()
        .skip(skip)
        .map(|line| Line::from(Span::styled(line.as_str(), log_style(line))))
        .collect();

    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" System log ({}) ", t.logs.len())),
    );
    f.render_widget(p, area);
}

fn log_style(line: &str) -> Style {
    if line.starts_with("[CRT]") {
        Style::default().fg(Color::Red)
    } else if line.starts_with("[SYS]") {
        Style::default().fg(Color::Cyan)
    } else if line.starts_with("[NAV]") || line.starts_with("[COM]") {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Gray)
    }
}

fn draw_keys(f: &mut Frame, area: Rect, app: &App) {
    let text = match app.status() {
        Some(status) => format!("{}   | {status}", app.key_hint()),
        None => app.key_hint().to_string(),
    };
    let bar = Paragraph::new(text).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomia_core::MockConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use ratatui::backend::TestBackend;

    #[test]
    fn mode_colors() {
        assert_eq!(mode_style("EMERGENCY_HALT").fg, Some(Color::Red));
        assert_eq!(mode_style("LINK_LOST").fg, Some(Color::Red));
        assert_eq!(mode_style("PATROL_ACTIVE").fg, Some(Color::Green));
    }

    #[test]
    fn log_colors_follow_tag() {
        assert_eq!(log_style("[CRT] EMERGENCY_STOP").fg, Some(Color::Red));
        assert_eq!(log_style("[SYS] PATROL_ACTIVE").fg, Some(Color::Cyan));
        assert_eq!(log_style("TELEMETRY_SYNC: 1mm | 2°C").fg, Some(Color::Gray));
    }

    #[test]
    fn draws_mock_dashboard() {
        let app = App::mock(MockConfig::default(), StdRng::seed_from_u64(1));
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f, &app, Instant::now())).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("NOMIA V1-RG"));
        assert!(text.contains("MOCK"));
        assert!(text.contains("BOOTING"));
        assert!(text.contains("42°C"));
        assert!(text.contains("250mm"));
    }
}
