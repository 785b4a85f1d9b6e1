use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, Tabs};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::components::ladder::LadderView;
use crate::state::app_state::SessionsState;
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::ui::layout::LayoutAreas;
use dragrace_api::client::View;
use dragrace_api::pairings::Pairing;
use dragrace_api::sessions::{COLUMNS, SortDirection, cell, lane_letter};
use dragrace_api::wire::PairingEntry;

static TABS: &[&str; 5] = &["Ladder", "Qualifying", "Pairing", "Results", "Calendar"];

const PAIRING_HEADER: [&str; 7] = ["Pair", "Lane", "Choice", "Car", "Driver", "ET", "RT"];

/// Width of one sheet column, separator excluded.
const SHEET_COLUMN_WIDTH: u16 = 9;

const HELP_TEXT: &str = "\
Tabs       1 Ladder   2 Qualifying   3 Pairing   4 Results   5 Calendar   ? Help (Esc to close)
Category   ] / Tab next    [ / Shift-Tab previous
Date       > next day    < previous day    t today    Calendar: j/k + Enter
Ladder     h/j/k/l scroll
Sheets     n/p session    h/l column    s or Enter sort    j/k scroll
Pairing    j/k select pair
Other      r refresh now    f full screen    \" log pane    q quit";

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
            draw_status(f, layout.status, app);
        }

        match app.state.active_tab {
            MenuItem::Ladder => draw_ladder(f, layout.main, app),
            MenuItem::Qualifying => draw_sessions(f, layout.main, app, View::Qualifying),
            MenuItem::Pairing => draw_pairings(f, layout.main, app),
            MenuItem::Results => draw_sessions(f, layout.main, app, View::Results),
            MenuItem::Calendar => draw_calendar(f, layout.main, app),
            MenuItem::Help => draw_placeholder(f, layout.main, HELP_TEXT),
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs);
        }

        draw_loading_spinner(f, f.area(), app, loading);
    });
    if let Err(e) = result {
        log::error!("draw failed: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Ladder => 0,
        MenuItem::Qualifying => 1,
        MenuItem::Pairing => 2,
        MenuItem::Results => 3,
        MenuItem::Calendar => 4,
        MenuItem::Help => match app.state.previous_tab {
            MenuItem::Qualifying => 1,
            MenuItem::Pairing => 2,
            MenuItem::Results => 3,
            MenuItem::Calendar => 4,
            _ => 0,
        },
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

/// `2025-03-01 | Super Gas (2/5) | updated 10:42:07`
fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let dim = Style::default().fg(Color::DarkGray);
    let mut spans = vec![
        Span::styled(" Date ", dim),
        Span::styled(app.state.date.format("%Y-%m-%d").to_string(), Style::default().fg(Color::White)),
    ];

    if let Some(view) = app.state.active_tab.view() {
        let menu = app.state.menu(view);
        let category = match menu.selected_entry() {
            Some(entry) => format!("{} ({}/{})", entry.label, menu.selected + 1, menu.entries.len()),
            None if menu.is_current(app.state.date) => "no categories".to_string(),
            None => "loading categories...".to_string(),
        };
        spans.push(Span::styled(" | ", dim));
        spans.push(Span::styled(category, Style::default().fg(Color::Cyan)));

        let updated = match view {
            View::Ladder => app.state.ladder.last_updated.as_deref(),
            View::Qualifying => app.state.qualifying.last_updated.as_deref(),
            View::Pairing => app.state.pairing.last_updated.as_deref(),
            View::Results => app.state.results.last_updated.as_deref(),
        };
        if let Some(stamp) = updated {
            spans.push(Span::styled(format!(" | updated {stamp}"), dim));
        }
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_ladder(f: &mut Frame, area: Rect, app: &App) {
    let ladder = &app.state.ladder;
    let title = match ladder.rounds.first().map(|r| r.category.as_str()) {
        Some(category) if !category.is_empty() => format!(" Ladder: {category} "),
        _ => " Ladder ".to_string(),
    };
    let block = default_border(Color::White).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if !ladder.has_visible_rounds() {
        let msg = if let Some(err) = ladder.error.as_deref() {
            format!("Ladder load failed:\n{err}")
        } else if !ladder.loaded {
            "Loading ladder...".to_string()
        } else {
            "No ladder results for this category yet".to_string()
        };
        draw_message(f, inner, msg);
        return;
    }

    f.render_widget(
        LadderView {
            rounds: &ladder.rounds,
            grid: &ladder.grid,
            scroll_x: ladder.scroll_x,
            scroll_y: ladder.scroll_y,
        },
        inner,
    );
}

fn draw_sessions(f: &mut Frame, area: Rect, app: &App, view: View) {
    let sheet = match view {
        View::Results => &app.state.results,
        _ => &app.state.qualifying,
    };
    let block = default_border(Color::White).title(format!(" {} ", view.label()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(session) = sheet.current() else {
        let msg = if let Some(err) = sheet.error.as_deref() {
            format!("{} load failed:\n{err}", view.label())
        } else if !sheet.loaded {
            format!("Loading {}...", view.label().to_lowercase())
        } else {
            "No sessions recorded for this category".to_string()
        };
        draw_message(f, inner, msg);
        return;
    };

    let [session_bar, table_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(inner);
    draw_session_bar(f, session_bar, sheet);

    let (first, count) = visible_columns(table_area.width, sheet.cursor_column);
    let columns: Vec<usize> = (first..first + count).collect();

    let header = Row::new(columns.iter().map(|&c| {
        let mut label = COLUMNS[c].to_string();
        if sheet.sort.column == c {
            label.push(match sheet.sort.direction {
                SortDirection::Ascending => '▲',
                SortDirection::Descending => '▼',
            });
        }
        let style = if c == sheet.cursor_column {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        };
        Cell::from(label).style(style)
    }));

    let rows = session
        .rows
        .iter()
        .skip(sheet.scroll_offset as usize)
        .map(|row| Row::new(columns.iter().map(|&c| Cell::from(cell(row, c).to_string()))));

    let widths = vec![Constraint::Length(SHEET_COLUMN_WIDTH); columns.len()];
    f.render_widget(Table::new(rows, widths).header(header).column_spacing(1), table_area);
}

fn draw_session_bar(f: &mut Frame, area: Rect, sheet: &SessionsState) {
    let mut spans = vec![Span::styled("Session ", Style::default().fg(Color::DarkGray))];
    for (idx, session) in sheet.sessions.iter().enumerate() {
        let style = if idx == sheet.selected_session {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(session.key.clone(), style));
        spans.push(Span::raw(" "));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// First column index and column count that fit `width`, keeping the cursor on screen.
fn visible_columns(width: u16, cursor: usize) -> (usize, usize) {
    let fit = ((width / (SHEET_COLUMN_WIDTH + 1)) as usize).clamp(1, COLUMNS.len());
    let first = (cursor + 1).saturating_sub(fit);
    (first, fit.min(COLUMNS.len() - first))
}

fn draw_pairings(f: &mut Frame, area: Rect, app: &App) {
    let sheet = &app.state.pairing;
    let title = match sheet.pairings.first().map(|p| p.category.as_str()) {
        Some(category) if !category.is_empty() => format!(" Pairing: {category} "),
        _ => " Pairing ".to_string(),
    };
    let block = default_border(Color::White).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if sheet.pairings.is_empty() {
        let msg = if let Some(err) = sheet.error.as_deref() {
            format!("Pairing load failed:\n{err}")
        } else if !sheet.loaded {
            "Loading pairings...".to_string()
        } else {
            "No pairings for this category yet".to_string()
        };
        draw_message(f, inner, msg);
        return;
    }

    let header = Row::new(PAIRING_HEADER.map(|h| {
        Cell::from(h).style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    }));

    // Header row, then two rows per pair.
    let fit = (inner.height.saturating_sub(1) / 2).max(1) as usize;
    let first = (sheet.selected + 1).saturating_sub(fit);
    let rows = sheet.pairings.iter().enumerate().skip(first).flat_map(|(idx, pairing)| {
        let style = if idx == sheet.selected {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let [top, bottom] = pairing_rows(pairing);
        [Row::new(top).style(style), Row::new(bottom).style(style)]
    });

    let widths = [
        Constraint::Length(5),
        Constraint::Length(5),
        Constraint::Length(7),
        Constraint::Length(6),
        Constraint::Fill(1),
        Constraint::Length(8),
        Constraint::Length(7),
    ];
    f.render_widget(Table::new(rows, widths).header(header).column_spacing(1), inner);
}

/// Sheet rows for one pair; the pair number only on the first.
fn pairing_rows(pairing: &Pairing) -> [[String; 7]; 2] {
    [
        pairing_row(pairing.label(), &pairing.left),
        pairing_row(String::new(), &pairing.right),
    ]
}

fn pairing_row(pair: String, entry: &PairingEntry) -> [String; 7] {
    let or_dash = |text: &str| {
        let text = text.trim();
        if text.is_empty() { "-".to_string() } else { text.to_string() }
    };
    [
        pair,
        lane_letter(entry.position.trim()).to_string(),
        or_dash(&entry.lane_choice),
        or_dash(&entry.car_number),
        entry.driver_name.clone(),
        or_dash(&entry.et),
        or_dash(&entry.rt),
    ]
}

fn draw_calendar(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Calendar ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let calendar = &app.state.calendar;
    if calendar.events.is_empty() {
        let msg = match calendar.error.as_deref() {
            Some(err) => format!("Calendar load failed:\n{err}"),
            None => "No events listed".to_string(),
        };
        draw_message(f, inner, msg);
        return;
    }

    let visible = inner.height as usize;
    let first = (calendar.selected + 1).saturating_sub(visible);
    let lines: Vec<Line> = calendar
        .events
        .iter()
        .enumerate()
        .skip(first)
        .take(visible)
        .map(|(idx, event)| {
            let (marker, style) = if idx == calendar.selected {
                (">", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            } else {
                (" ", Style::default().fg(Color::Gray))
            };
            Line::from(Span::styled(
                format!("{marker} {:<20} {}", event.race_time, event.name),
                style,
            ))
        })
        .collect();

    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_message(f: &mut Frame, area: Rect, msg: String) {
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        area,
    );
}

fn draw_placeholder(f: &mut Frame, area: Rect, msg: &str) {
    let block = default_border(Color::DarkGray).title(" Help ");
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(Paragraph::new(msg).style(Style::default().fg(Color::Gray)), inner);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logger = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Gray))
        .style_debug(Style::default().fg(Color::DarkGray));
    f.render_widget(logger, area);
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}
