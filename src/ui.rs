use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::app::App;
use crate::panel::{PageId, Panel, PanelId, Tone};

const HEADER_HEIGHT: u16 = 9;
const TOAST_HEIGHT: u16 = 5;
const LIGHT_SKY_BLUE: Color = Color::Rgb(135, 206, 250);
const PURPLE: Color = Color::Rgb(160, 32, 240);
const ORANGE: Color = Color::Rgb(255, 165, 0);
const INDICATOR_BG: Color = Color::Rgb(30, 41, 59);

pub fn render(frame: &mut Frame, app: &mut App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], app);
    render_page(frame, root[1], app);
    render_indicator(frame, root[2], app);

    if app.overlay().is_some() {
        let area = Rect {
            height: root[0].height + root[1].height,
            ..root[0]
        };
        render_overlay(frame, area, app);
    }
    let screen = frame.area();
    render_toast(frame, screen, app);
}

fn render_header(frame: &mut Frame, area: Rect, app: &mut App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Fill(2),
            Constraint::Fill(1),
        ])
        .split(area);
    let digests = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Fill(1)])
        .split(columns[2]);

    render_panel(frame, columns[0], app, PanelId::Namespaces);
    render_panel(frame, columns[1], app, PanelId::Overview);
    render_panel(frame, digests[0], app, PanelId::Alerts);
    render_panel(frame, digests[1], app, PanelId::Events);
}

fn render_page(frame: &mut Frame, area: Rect, app: &mut App) {
    let panels = app.page().panels();
    let constraints = panels
        .iter()
        .map(|(id, weight)| {
            let panel = app.panel(*id);
            if panel.collapsed {
                Constraint::Length(id.spec().min_height)
            } else {
                Constraint::Fill(*weight)
            }
        })
        .collect::<Vec<_>>();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for ((id, _), row) in panels.iter().zip(rows.iter()) {
        render_panel(frame, *row, app, *id);
    }
}

fn render_panel(frame: &mut Frame, area: Rect, app: &mut App, id: PanelId) {
    app.set_panel_viewport(id, area.height.saturating_sub(2));
    let panel = app.panel(id);
    let selected_line = app
        .selection()
        .filter(|selection| selection.panel == id)
        .map(|selection| selection.line);

    let block = Block::default()
        .title(panel.title.clone())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(tone_color(panel.border)));
    let body = Paragraph::new(panel_text(panel, selected_line))
        .block(block)
        .scroll((panel.scroll, 0))
        .style(Style::default().fg(Color::White));
    frame.render_widget(body, area);
}

fn panel_text(panel: &Panel, selected_line: Option<usize>) -> Text<'_> {
    let Some(selected) = selected_line.filter(|_| panel.has_content() && !panel.collapsed) else {
        return Text::raw(panel.display_text());
    };
    panel
        .lines()
        .into_iter()
        .enumerate()
        .map(|(index, line)| {
            if index == selected {
                Line::styled(line, Style::default().fg(Color::Black).bg(Color::Yellow))
            } else {
                Line::raw(line)
            }
        })
        .collect::<Vec<_>>()
        .into()
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Plain => Color::White,
        Tone::Info => LIGHT_SKY_BLUE,
        Tone::Calm | Tone::Browse => Color::Green,
        Tone::Warn => Color::Yellow,
        Tone::Notice => Color::LightCyan,
        Tone::Resource => PURPLE,
        Tone::Focused => ORANGE,
        Tone::Muted => Color::Gray,
    }
}

fn render_indicator(frame: &mut Frame, area: Rect, app: &App) {
    frame.render_widget(
        Paragraph::new(indicator_line(app)).style(Style::default().bg(INDICATOR_BG)),
        area,
    );
}

fn indicator_line(app: &App) -> Line<'static> {
    let mut spans = Vec::new();
    for (index, page) in PageId::ORDER.iter().enumerate() {
        if index > 0 {
            spans.push(Span::raw(" | "));
        }
        let label = page_hint(*page);
        if *page == app.page() {
            spans.push(Span::styled(
                label,
                Style::default()
                    .fg(Color::Black)
                    .bg(ORANGE)
                    .add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(label, Style::default().fg(Color::Gray)));
        }
    }
    spans.push(Span::styled(
        " | [a]lerts | [e]vents | [r]efresh | [0-9] namespace | [q]uit",
        Style::default().fg(Color::Gray),
    ));
    spans.push(Span::styled(
        format!("  ns:{}", app.namespace_filter().label()),
        Style::default().fg(LIGHT_SKY_BLUE),
    ));
    if let Some(at) = app.last_refresh() {
        spans.push(Span::styled(
            format!("  {}", at.format("%H:%M:%S")),
            Style::default().fg(Color::Gray),
        ));
    }
    Line::from(spans)
}

fn page_hint(page: PageId) -> String {
    let label = page.label();
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => format!("[{first}]{}", chars.as_str()),
        None => String::new(),
    }
}

fn render_overlay(frame: &mut Frame, area: Rect, app: &mut App) {
    let width = area.width.saturating_sub(2);
    app.set_overlay_viewport(width, area.height.saturating_sub(2));
    let Some(overlay) = app.overlay() else {
        return;
    };
    frame.render_widget(Clear, area);
    let view = Paragraph::new(overlay.rows(width).join("\n"))
        .scroll((overlay.scroll, 0))
        .block(
            Block::default()
                .title(overlay.display_title())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ORANGE)),
        )
        .style(Style::default().fg(Color::White));
    frame.render_widget(view, area);
}

fn render_toast(frame: &mut Frame, area: Rect, app: &App) {
    let Some(toast) = app.toast() else {
        return;
    };
    let height = TOAST_HEIGHT.min(area.height);
    let area = Rect {
        y: area.y + area.height - height,
        height,
        ..area
    };
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(toast.message.clone())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Green)),
            )
            .style(Style::default().fg(Color::White)),
        area,
    );
}
