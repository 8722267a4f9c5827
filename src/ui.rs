//! Layout and drawing: playfield, sidebar, pause, game over and level-cleared overlays.

use crate::app::Screen;
use crate::grid::Cell;
use crate::piece;
use crate::render;
use crate::session::GameState;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};

/// Terminal columns per field cell; matches the text renderer.
const CELL_WIDTH: u16 = 3;
const SIDEBAR_WIDTH: u16 = 24;
const SIDEBAR_HEIGHT: u16 = 16;

/// Everything the sidebar shows that the session does not know about.
#[derive(Debug, Clone, Copy)]
pub struct Hud {
    pub screen: Screen,
    pub paused: bool,
    pub next: (piece::Color, piece::Color),
    pub viruses_start: usize,
    pub capsules: u32,
    pub seed: u32,
}

/// Playfield size in terminal cells, border included.
fn playfield_size(state: &GameState) -> (u16, u16) {
    let w = (state.columns() as u16).saturating_mul(CELL_WIDTH);
    let h = state.rows() as u16;
    (w.saturating_add(2), h.saturating_add(2))
}

fn viruses_left(state: &GameState) -> usize {
    state
        .grid()
        .iter()
        .filter(|(_, cell)| matches!(cell, Cell::Virus(_)))
        .count()
}

/// Centre a `w` x `h` rect inside `area`.
fn centered(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

pub fn draw(frame: &mut Frame, state: &GameState, theme: &Theme, hud: &Hud) {
    let area = frame.area();
    let (pw, ph) = playfield_size(state);
    let total_w = pw + SIDEBAR_WIDTH;
    let total_h = ph.max(SIDEBAR_HEIGHT);
    if area.width < total_w || area.height < total_h {
        draw_too_small(frame, theme, area, total_w, total_h);
        return;
    }

    let active_area = centered(area, total_w, total_h);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(active_area);
    let playfield_area = Rect {
        height: ph,
        ..chunks[0]
    };

    draw_playfield(frame, state, theme, playfield_area);
    draw_sidebar(frame, state, theme, hud, chunks[1]);

    match hud.screen {
        Screen::Playing if hud.paused => draw_pause_overlay(frame, theme, area),
        Screen::Playing => {}
        Screen::GameOver => draw_end_overlay(frame, state, theme, hud, area, render::GAME_OVER),
        Screen::LevelCleared => {
            draw_end_overlay(frame, state, theme, hud, area, render::LEVEL_CLEARED);
        }
    }
}

fn draw_too_small(frame: &mut Frame, theme: &Theme, area: Rect, w: u16, h: u16) {
    let msg = format!("Terminal too small ({w}x{h})");
    Paragraph::new(Line::from(Span::styled(msg, Style::default().fg(theme.main_fg))))
        .alignment(Alignment::Center)
        .render(centered(area, area.width, 1), frame.buffer_mut());
}

fn draw_playfield(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Capsulefall ", Style::default().fg(theme.title)));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let labels = render::labels(state);
    let grid = state.grid();
    let matched = state.matches();
    let lines: Vec<Line> = labels
        .into_iter()
        .enumerate()
        .map(|(r, row)| {
            let spans: Vec<Span> = row
                .into_iter()
                .enumerate()
                .map(|(c, label)| {
                    let cell = grid.get(r, c).unwrap_or(Cell::Empty);
                    let mut style = Style::default().bg(theme.bg);
                    style = match cell {
                        Cell::Empty => style.fg(theme.div_line),
                        Cell::Virus(color) => style
                            .fg(theme.piece_color(color))
                            .add_modifier(Modifier::BOLD),
                        Cell::Capsule(color) => style.fg(theme.piece_color(color)),
                    };
                    if matched.contains(&(r, c)) {
                        style = style.bg(theme.matched_bg).add_modifier(Modifier::BOLD);
                    }
                    let label = if cell.is_empty() { " . ".to_string() } else { label };
                    Span::styled(label, style)
                })
                .collect();
            Line::from(spans)
        })
        .collect();
    Paragraph::new(Text::from(lines)).render(inner, frame.buffer_mut());
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, theme: &Theme, hud: &Hud, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Next
            Constraint::Length(5), // Stats
            Constraint::Length(7), // Keys
        ])
        .split(area);

    // --- Next ---
    let next_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled("Next", title_style));
    let next_inner = next_block.inner(chunks[0]);
    next_block.render(chunks[0], frame.buffer_mut());
    let (left, right) = hud.next;
    Paragraph::new(Line::from(vec![
        Span::styled(format!("[{left}-"), Style::default().fg(theme.piece_color(left))),
        Span::styled(format!("-{right}]"), Style::default().fg(theme.piece_color(right))),
    ]))
    .alignment(Alignment::Center)
    .render(next_inner, frame.buffer_mut());

    // --- Stats ---
    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let stats_inner = stats_block.inner(chunks[1]);
    stats_block.render(chunks[1], frame.buffer_mut());
    let stats_lines = vec![
        Line::from(vec![
            Span::styled("Viruses: ", title_style),
            Span::styled(
                format!("{} / {}", viruses_left(state), hud.viruses_start),
                fg_style,
            ),
        ]),
        Line::from(vec![
            Span::styled("Capsules: ", title_style),
            Span::styled(hud.capsules.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Seed: ", title_style),
            Span::styled(hud.seed.to_string(), fg_style),
        ]),
    ];
    Paragraph::new(Text::from(stats_lines)).render(stats_inner, frame.buffer_mut());

    // --- Keys ---
    let keys_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let keys_inner = keys_block.inner(chunks[2]);
    keys_block.render(chunks[2], frame.buffer_mut());
    let help = Style::default().fg(theme.inactive_fg);
    let keys = [
        "←/→ h/l  Move",
        "↑ k x    Rotate CW",
        "z u      Rotate CCW",
        "↓ j      Drop a row",
        "p Pause  q Quit",
    ];
    let lines: Vec<Line> = keys
        .iter()
        .map(|k| Line::from(Span::styled(*k, help)))
        .collect();
    Paragraph::new(Text::from(lines)).render(keys_inner, frame.buffer_mut());
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P Resume    Q Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_end_overlay(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    hud: &Hud,
    area: Rect,
    title: &str,
) {
    let popup = centered(area, 30, 8);
    let banner = if hud.screen == Screen::GameOver {
        Style::default().fg(Color::White).bg(Color::Red)
    } else {
        Style::default().fg(Color::Black).bg(Color::Green)
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!(" {title} "), banner)),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                " Viruses cleared: {} ",
                hud.viruses_start.saturating_sub(viruses_left(state))
            ),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " R Restart    Q Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}
