//! TUI rendering for Studyspot using ratatui.

mod format;
mod input;
mod theme;

pub use input::{InputPump, apply_key, handle_events};
pub use theme::{Glyphs, Palette, glyphs, palette, spinner_frame, styles};

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Padding, Paragraph, Wrap},
};

use studyspot_engine::{App, CycleState, PermissionState};

use self::format::{format_interval, format_percent, occupancy_bar, truncate_with_ellipsis};

pub const APP_TITLE: &str = "Studyspot";
const TAGLINE: &str = "Find a seat on campus";
const OCCUPANCY_BAR_WIDTH: usize = 12;
const SPINNER_FRAME_MS: u128 = 100;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let options = app.ui_options();
    let palette = palette(options);
    let glyphs = glyphs(options);
    // Clear with background color
    let bg_block = Block::default().style(Style::default().bg(palette.bg_dark));
    frame.render_widget(bg_block, frame.area());

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Banner
            Constraint::Min(3),    // Body
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
        .split(rows[1]);

    draw_banner(frame, rows[0], &palette);
    draw_libraries(frame, app, body[0], &palette, &glyphs);
    draw_capture_panel(frame, app, body[1], &palette, &glyphs);
    draw_status_bar(frame, app, rows[2], &palette, &glyphs);
}

fn draw_banner(frame: &mut Frame, area: Rect, palette: &Palette) {
    let style = styles::banner(palette);
    let banner = Paragraph::new(Line::from(vec![
        Span::styled(format!(" {APP_TITLE} "), style),
        Span::styled(
            format!(" {TAGLINE}"),
            Style::default().fg(palette.text_primary).bg(palette.brand),
        ),
    ]))
    .style(Style::default().bg(palette.brand));
    frame.render_widget(banner, area);
}

fn panel<'a>(title: &'a str, palette: &Palette) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.bg_border))
        .title(Span::styled(
            format!(" {title} "),
            Style::default()
                .fg(palette.text_secondary)
                .add_modifier(Modifier::BOLD),
        ))
        .padding(Padding::horizontal(1))
        .style(Style::default().bg(palette.bg_panel))
}

fn draw_libraries(frame: &mut Frame, app: &App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let inner_width = area.width.saturating_sub(4) as usize;
    let location = app.camera_location();
    let last_count = app.last_result().map(|r| r.people_count());

    let mut lines: Vec<Line> = Vec::new();
    for (index, library) in app.catalog().iter().enumerate() {
        let selected = index == app.selected();
        let expanded = app.is_expanded(index);
        let marker = if selected { glyphs.selected } else { " " };
        let fold = if expanded {
            glyphs.expanded
        } else {
            glyphs.collapsed
        };
        let seats = format!("{} seats", library.total_capacity());
        let name_width = inner_width.saturating_sub(seats.len() + 6);

        lines.push(Line::from(vec![
            Span::styled(format!("{marker} "), Style::default().fg(palette.accent)),
            Span::styled(format!("{fold} "), Style::default().fg(palette.text_muted)),
            Span::styled(
                truncate_with_ellipsis(&library.name, name_width),
                styles::library_name(palette, selected),
            ),
            Span::styled(format!("  {seats}"), Style::default().fg(palette.text_muted)),
        ]));

        if !expanded {
            continue;
        }
        if library.floors.is_empty() {
            lines.push(Line::from(Span::styled(
                "      No floor data",
                Style::default().fg(palette.text_muted),
            )));
        }
        for floor in &library.floors {
            let watched = location
                .is_some_and(|loc| loc.library_index == index && loc.floor.name == floor.name);
            let mut spans = vec![
                Span::styled(
                    format!("    {} ", glyphs.bullet),
                    Style::default().fg(palette.text_muted),
                ),
                Span::styled(floor.name.clone(), Style::default().fg(palette.text_primary)),
                Span::styled(
                    format!("  {} seats", floor.capacity),
                    Style::default().fg(palette.text_muted),
                ),
            ];
            if watched {
                spans.push(Span::styled(
                    format!("  {}", glyphs.camera),
                    Style::default().fg(palette.accent),
                ));
                if let Some(count) = last_count {
                    spans.push(Span::styled(format!(" {count} here"), styles::count(palette)));
                    if let Some(fraction) = floor.occupancy(count) {
                        spans.push(Span::styled(
                            format!(
                                " {} {}",
                                occupancy_bar(fraction, OCCUPANCY_BAR_WIDTH, glyphs),
                                format_percent(fraction)
                            ),
                            Style::default().fg(occupancy_color(fraction, palette)),
                        ));
                    }
                }
            }
            lines.push(Line::from(spans));
        }
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No libraries configured",
            Style::default().fg(palette.text_muted),
        )));
    }

    let list = Paragraph::new(lines).block(panel("Libraries", palette));
    frame.render_widget(list, area);
}

fn occupancy_color(fraction: f64, palette: &Palette) -> Color {
    if fraction >= 0.9 {
        palette.error
    } else if fraction >= 0.6 {
        palette.warning
    } else {
        palette.success
    }
}

fn draw_capture_panel(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let mut lines: Vec<Line> = Vec::new();
    let label = Style::default().fg(palette.text_muted);
    let value = Style::default().fg(palette.text_primary);

    lines.push(Line::from(vec![
        Span::styled("Camera  ", label),
        Span::styled(app.camera_label(), value),
    ]));
    if let Some(location) = app.camera_location() {
        lines.push(Line::from(vec![
            Span::styled("Floor   ", label),
            Span::styled(
                format!("{}, {}", location.library, location.floor.name),
                value,
            ),
        ]));
    }
    lines.push(Line::from(""));

    match app.cycle_state() {
        CycleState::Idle => {
            if app.can_capture() {
                lines.push(Line::from(vec![
                    Span::styled("Press ", label),
                    Span::styled("c", styles::key_highlight(palette)),
                    Span::styled(" to count people", label),
                ]));
            }
        }
        CycleState::InFlight { .. } => {
            let tick = (app.elapsed().as_millis() / SPINNER_FRAME_MS) as usize;
            let spinner = spinner_frame(tick, app.ui_options());
            lines.push(Line::from(vec![
                Span::styled(format!("{spinner} "), Style::default().fg(palette.accent)),
                Span::styled("Counting people...", value),
            ]));
        }
        CycleState::Succeeded(result) => {
            lines.push(Line::from(vec![
                Span::styled(format!("{} ", glyphs.ok), Style::default().fg(palette.success)),
                Span::styled(
                    format!("{} people detected", result.people_count()),
                    styles::count(palette),
                ),
            ]));
        }
        CycleState::Failed(failure) => {
            lines.push(Line::from(vec![
                Span::styled(format!("{} ", glyphs.err), Style::default().fg(palette.error)),
                Span::styled(failure.message(), Style::default().fg(palette.error)),
            ]));
        }
    }

    if let Some(result) = app.last_result()
        && !matches!(app.cycle_state(), CycleState::Succeeded(_))
    {
        lines.push(Line::from(vec![
            Span::styled("Last count  ", label),
            Span::styled(result.people_count().to_string(), styles::count(palette)),
        ]));
    }

    if let Some(fraction) = app.camera_occupancy() {
        lines.push(Line::from(vec![
            Span::styled("Occupancy   ", label),
            Span::styled(
                format!(
                    "{} {}",
                    occupancy_bar(fraction, OCCUPANCY_BAR_WIDTH, glyphs),
                    format_percent(fraction)
                ),
                Style::default().fg(occupancy_color(fraction, palette)),
            ),
        ]));
    }

    if let Some(saved) = app.last_saved() {
        lines.push(Line::from(vec![
            Span::styled("Saved       ", label),
            Span::styled(saved.image.display().to_string(), value),
        ]));
    }

    lines.push(Line::from(""));
    let refresh = if app.auto_refresh_enabled() {
        Span::styled(
            format!("on, every {}", format_interval(app.auto_refresh_interval())),
            Style::default().fg(palette.success),
        )
    } else {
        Span::styled("off", label)
    };
    lines.push(Line::from(vec![Span::styled("Auto-refresh ", label), refresh]));

    let capture = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(panel("Capture", palette));
    frame.render_widget(capture, area);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let (permission_text, permission_style) = match app.permission() {
        PermissionState::Granted => (
            format!("{} camera ready", glyphs.status_ready),
            Style::default().fg(palette.success),
        ),
        PermissionState::Denied => (
            format!("{} camera access denied", glyphs.denied),
            Style::default().fg(palette.error),
        ),
        PermissionState::Unknown => (
            format!("{} waiting for camera", glyphs.status_missing),
            Style::default().fg(palette.text_muted),
        ),
    };

    let mut spans = vec![
        Span::raw(" "),
        Span::styled(permission_text, permission_style),
        Span::styled(format!(" {} ", glyphs.separator), styles::key_hint(palette)),
    ];

    if let Some(status) = app.status() {
        spans.push(Span::styled(
            status.to_string(),
            Style::default().fg(palette.warning),
        ));
        spans.push(Span::styled(
            format!(" {} ", glyphs.separator),
            styles::key_hint(palette),
        ));
    }

    let mut hint = |key: &str, action: &str| {
        spans.push(Span::styled(key.to_string(), styles::key_highlight(palette)));
        spans.push(Span::styled(format!(" {action}  "), styles::key_hint(palette)));
    };
    let updown = if app.ui_options().ascii_only {
        "j/k"
    } else {
        "↑↓"
    };
    hint(updown, "select");
    hint("Enter", "expand");
    if app.can_capture() {
        hint("c", "capture");
    }
    hint("a", "auto-refresh");
    hint("q", "quit");

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
