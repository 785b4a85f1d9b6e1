use dragrace_api::sessions::lane_letter;
use dragrace_api::{Match, Round, Slot};
use tui::buffer::Buffer;
use tui::layout::Rect;
use tui::style::{Color, Modifier, Style};
use tui::widgets::Widget;

use crate::components::ladder_grid::LadderGrid;

/// Rows per match box: border, two rows per driver, border.
pub const MATCH_HEIGHT: u16 = 6;

/// Row of the round titles, above the first match.
const TITLE_ROW: u16 = 0;

// ---------------------------------------------------------------------------
// LadderView widget
// ---------------------------------------------------------------------------

/// Renders a built ladder using the positions from a [`LadderGrid`].
///
/// Grid units are terminal cells; `scroll_x`/`scroll_y` shift the content
/// left/up and everything outside `area` is clipped.
pub struct LadderView<'a> {
    pub rounds: &'a [Round],
    pub grid: &'a LadderGrid,
    pub scroll_x: u16,
    pub scroll_y: u16,
}

impl Widget for LadderView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let canvas = Canvas { area, scroll_x: self.scroll_x, scroll_y: self.scroll_y };
        let title_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

        for r in self.grid.visible_rounds() {
            let Some(round) = self.rounds.get(r) else {
                continue;
            };
            let x = cell(self.grid.column_x(r));
            canvas.put_str(buf, x, TITLE_ROW, &self.grid.round_title(r), title_style);

            for (i, m) in round.matches.iter().enumerate() {
                let Some(y) = self.grid.vertical_position(r, i).map(cell) else {
                    continue;
                };
                if self.grid.is_winner_round(r) {
                    draw_winner_card(&canvas, buf, m, x, y, self.width());
                } else {
                    draw_match_box(&canvas, buf, m, x, y, self.width());
                }
            }

            if r + 1 < self.grid.round_count() && self.grid.is_visible(r + 1) {
                draw_connectors(&canvas, buf, self.grid, r);
            }
        }
    }
}

impl LadderView<'_> {
    fn width(&self) -> u16 {
        cell(self.grid.config().round_column_width)
    }
}

/// Rows taken by the whole ladder, for scroll limits.
pub fn content_height(grid: &LadderGrid) -> u16 {
    cell(grid.max_position()).saturating_add(MATCH_HEIGHT)
}

pub fn content_width(grid: &LadderGrid) -> u16 {
    cell(grid.container_width(0.0))
}

fn cell(units: f64) -> u16 {
    units.round().clamp(0.0, u16::MAX as f64) as u16
}

/// Content-space drawing target with scroll and clipping applied.
struct Canvas {
    area: Rect,
    scroll_x: u16,
    scroll_y: u16,
}

impl Canvas {
    fn screen(&self, x: u16, y: u16) -> Option<(u16, u16)> {
        let sx = x.checked_sub(self.scroll_x)?;
        let sy = y.checked_sub(self.scroll_y)?;
        if sx >= self.area.width || sy >= self.area.height {
            return None;
        }
        Some((self.area.x + sx, self.area.y + sy))
    }

    fn put(&self, buf: &mut Buffer, x: u16, y: u16, ch: char, style: Style) {
        if let Some(pos) = self.screen(x, y)
            && let Some(c) = buf.cell_mut(pos)
        {
            c.set_char(ch);
            c.set_style(style);
        }
    }

    fn put_str(&self, buf: &mut Buffer, x: u16, y: u16, text: &str, style: Style) {
        for (k, ch) in text.chars().enumerate() {
            let Some(col) = x.checked_add(k as u16) else {
                break;
            };
            self.put(buf, col, y, ch, style);
        }
    }

    fn hline(&self, buf: &mut Buffer, from: u16, to: u16, y: u16, style: Style) {
        for x in from..to {
            self.put(buf, x, y, '─', style);
        }
    }
}

// ---------------------------------------------------------------------------
// Match boxes
// ---------------------------------------------------------------------------

fn draw_frame(canvas: &Canvas, buf: &mut Buffer, x: u16, y: u16, width: u16, style: Style) {
    if width < 2 {
        return;
    }
    let right = x + width - 1;
    let bottom = y + MATCH_HEIGHT - 1;
    canvas.put(buf, x, y, '┌', style);
    canvas.put(buf, right, y, '┐', style);
    canvas.put(buf, x, bottom, '└', style);
    canvas.put(buf, right, bottom, '┘', style);
    canvas.hline(buf, x + 1, right, y, style);
    canvas.hline(buf, x + 1, right, bottom, style);
    for row in y + 1..bottom {
        canvas.put(buf, x, row, '│', style);
        canvas.put(buf, right, row, '│', style);
    }
}

fn draw_match_box(canvas: &Canvas, buf: &mut Buffer, m: &Match, x: u16, y: u16, width: u16) {
    draw_frame(canvas, buf, x, y, width, Style::default().fg(Color::DarkGray));
    let inner = width.saturating_sub(2) as usize;
    let leader = m.leader();

    for (offset, slot) in [(1u16, &m.player1), (3, &m.player2)] {
        let is_leader = leader.is_some_and(|l| std::ptr::eq(l, slot));
        let (name_style, detail_style) = slot_styles(slot, is_leader);
        canvas.put_str(buf, x + 1, y + offset, &fit(&name_line(slot), inner), name_style);
        canvas.put_str(buf, x + 1, y + offset + 1, &fit(&detail_line(slot), inner), detail_style);
    }
}

fn draw_winner_card(canvas: &Canvas, buf: &mut Buffer, m: &Match, x: u16, y: u16, width: u16) {
    let accent = Style::default().fg(Color::Yellow);
    draw_frame(canvas, buf, x, y, width, accent);
    let inner = width.saturating_sub(2) as usize;
    let winner = &m.player1;
    canvas.put_str(buf, x + 1, y + 1, &fit(" WINNER", inner), accent.add_modifier(Modifier::BOLD));
    canvas.put_str(buf, x + 1, y + 2, &fit(&name_line(winner), inner), Style::default().fg(Color::White).add_modifier(Modifier::BOLD));
    canvas.put_str(buf, x + 1, y + 3, &fit(&detail_line(winner), inner), Style::default().fg(Color::Gray));
}

/// Byes and the "Winner" slot carry no result and are dimmed.
fn slot_styles(slot: &Slot, is_leader: bool) -> (Style, Style) {
    if slot.is_placeholder() {
        let dim = Style::default().fg(Color::DarkGray);
        return (dim, dim);
    }
    if is_leader {
        let hi = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
        return (hi, Style::default().fg(Color::Yellow));
    }
    (Style::default().fg(Color::White), Style::default().fg(Color::Gray))
}

/// `" Name [LC]"`
fn name_line(slot: &Slot) -> String {
    if slot.has_lane_choice() {
        format!(" {} [LC]", slot.name)
    } else {
        format!(" {}", slot.name)
    }
}

/// `" #12 L  ET 8.912  RT 0.041"` with `-` for missing times.
fn detail_line(slot: &Slot) -> String {
    if slot.is_bye() {
        return String::new();
    }
    let lane = slot
        .raw
        .as_ref()
        .map(|r| lane_letter(r.position.trim()))
        .filter(|l| !l.is_empty())
        .map(|l| format!(" {l}"))
        .unwrap_or_default();
    format!(
        " #{}{lane}  ET {}  RT {}",
        slot.display_car(),
        slot.display_score(),
        slot.display_rt()
    )
}

/// Truncate or pad to exactly `width` chars.
fn fit(text: &str, width: usize) -> String {
    let truncated: String = text.chars().take(width).collect();
    format!("{truncated:<width$}")
}

// ---------------------------------------------------------------------------
// Connectors
// ---------------------------------------------------------------------------

/// Lines from round `r` into round `r + 1`.
///
/// ```text
///  match 2i    ──┐
///                │          connector_height(r, 2i)
///                ├──  next round
///                │
///  match 2i+1  ──┘
/// ```
fn draw_connectors(canvas: &Canvas, buf: &mut Buffer, grid: &LadderGrid, r: usize) {
    let style = Style::default().fg(Color::DarkGray);
    let right_edge = cell(grid.column_x(r) + grid.config().round_column_width);
    let next_x = cell(grid.column_x(r + 1));
    let joint_x = right_edge + next_x.saturating_sub(right_edge) / 2;
    let anchor = |i: usize| grid.vertical_position(r, i).map(|p| cell(p) + MATCH_HEIGHT / 2);

    for i in 0..grid.match_count(r) {
        let Some(y) = anchor(i) else {
            continue;
        };
        canvas.hline(buf, right_edge, joint_x, y, style);

        let height = cell(grid.connector_height(r, i));
        if height > 0 {
            let bottom = y + height;
            canvas.put(buf, joint_x, y, '┐', style);
            for row in y + 1..bottom {
                canvas.put(buf, joint_x, row, '│', style);
            }
            canvas.put(buf, joint_x, bottom, '┘', style);
            let mid = y + height / 2;
            canvas.put(buf, joint_x, mid, '├', style);
            canvas.hline(buf, joint_x + 1, next_x, mid, style);
        } else if i % 2 == 0 {
            // No sibling: run straight into the next round.
            canvas.hline(buf, joint_x, next_x, y, style);
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
