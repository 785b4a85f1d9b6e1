use crate::app::{App, MenuItem};
use crate::state::messages::NetworkRequest;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use dragrace_api::sessions::COLUMNS;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) {
    let mut guard = app.lock().await;
    let mut requests: Vec<NetworkRequest> = Vec::new();

    match (guard.state.active_tab, key_event.code, key_event.modifiers) {
        // Quit
        (_, Char('q'), _) | (_, Char('c'), KeyModifiers::CONTROL) => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        // Tab switching
        (_, Char('1'), _) => requests = guard.update_tab(MenuItem::Ladder),
        (_, Char('2'), _) => requests = guard.update_tab(MenuItem::Qualifying),
        (_, Char('3'), _) => requests = guard.update_tab(MenuItem::Pairing),
        (_, Char('4'), _) => requests = guard.update_tab(MenuItem::Results),
        (_, Char('5'), _) => requests = guard.update_tab(MenuItem::Calendar),
        (_, Char('?'), _) => {
            guard.update_tab(MenuItem::Help);
        }
        (MenuItem::Help, KeyCode::Esc, _) => guard.exit_help(),

        // Category and date
        (_, Char(']') | KeyCode::Tab, _) => requests = guard.cycle_category(true),
        (_, Char('[') | KeyCode::BackTab, _) => requests = guard.cycle_category(false),
        (_, Char('>'), _) => requests = guard.shift_date(1),
        (_, Char('<'), _) => requests = guard.shift_date(-1),
        (_, Char('t'), _) => {
            let today = dragrace_api::client::today();
            requests = guard.set_date(today);
        }
        (_, Char('r'), _) => requests = guard.refresh_tick().into_iter().collect(),

        // Global
        (_, Char('f'), _) => guard.toggle_full_screen(),
        (_, Char('"'), _) => guard.toggle_show_logs(),

        // Ladder scrolling
        (MenuItem::Ladder, Char('l') | KeyCode::Right, _) => guard.state.ladder.scroll_right(),
        (MenuItem::Ladder, Char('h') | KeyCode::Left, _) => guard.state.ladder.scroll_left(),
        (MenuItem::Ladder, Char('j') | KeyCode::Down, _) => guard.state.ladder.scroll_down(),
        (MenuItem::Ladder, Char('k') | KeyCode::Up, _) => guard.state.ladder.scroll_up(),

        // Pairing sheet
        (MenuItem::Pairing, Char('j') | KeyCode::Down, _) => guard.state.pairing.select_next(),
        (MenuItem::Pairing, Char('k') | KeyCode::Up, _) => guard.state.pairing.select_prev(),

        // Qualifying / results sheets
        (MenuItem::Qualifying | MenuItem::Results, code, _) => {
            let tab = guard.state.active_tab;
            let sheet = if tab == MenuItem::Qualifying {
                &mut guard.state.qualifying
            } else {
                &mut guard.state.results
            };
            match code {
                Char('j') | KeyCode::Down => sheet.scroll_down(),
                Char('k') | KeyCode::Up => sheet.scroll_up(),
                Char('n') => sheet.next_session(),
                Char('p') => sheet.prev_session(),
                Char('l') | KeyCode::Right => sheet.move_cursor(true, COLUMNS.len()),
                Char('h') | KeyCode::Left => sheet.move_cursor(false, COLUMNS.len()),
                Char('s') | KeyCode::Enter => sheet.toggle_sort(),
                _ => {}
            }
        }

        // Calendar
        (MenuItem::Calendar, Char('j') | KeyCode::Down, _) => guard.state.calendar.select_next(),
        (MenuItem::Calendar, Char('k') | KeyCode::Up, _) => guard.state.calendar.select_prev(),
        (MenuItem::Calendar, KeyCode::Enter, _) => requests = guard.open_calendar_event(),

        _ => {}
    }

    drop(guard);
    for request in requests {
        let _ = network_requests.send(request).await;
    }
}
