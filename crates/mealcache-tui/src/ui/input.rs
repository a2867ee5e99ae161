//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, AppState, Focus, View};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    if matches!(app.state, AppState::Searching) {
        handle_search_input(app, key);
        return Ok(false);
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char('/') | KeyCode::Char('s') => {
            app.open_search();
        }
        KeyCode::Char('1') => app.set_view(View::Today),
        KeyCode::Char('2') => app.set_view(View::Week),
        KeyCode::Char('r') => app.retry_meals(),
        KeyCode::Char('m') => app.toggle_manage_mode(),
        KeyCode::Tab | KeyCode::BackTab => {
            app.focus = match app.focus {
                Focus::Content => Focus::Favorites,
                Focus::Favorites => Focus::Content,
            };
        }
        KeyCode::Esc => {
            if app.manage_mode {
                app.toggle_manage_mode();
            }
            app.focus = Focus::Content;
        }
        _ => match app.focus {
            Focus::Content => handle_content_input(app, key),
            Focus::Favorites => handle_favorites_input(app, key),
        },
    }

    Ok(false)
}

fn handle_content_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Left | KeyCode::Right => app.set_view(app.view.toggle()),
        KeyCode::Enter => {
            // Enter on an empty meal area jumps straight to search
            if app.selected_school.is_none() {
                app.open_search();
            }
        }
        _ => {}
    }
}

fn handle_favorites_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Left | KeyCode::Up => app.move_favorite_selection(false),
        KeyCode::Right | KeyCode::Down => app.move_favorite_selection(true),
        KeyCode::Enter => app.activate_favorite(),
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(school) = app.favorites.get(app.favorite_selection).cloned() {
                app.remove_favorite(&school);
            }
        }
        _ => {}
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('f') => app.toggle_search_result_favorite(),
            KeyCode::Char('r') => app.retry_search(),
            KeyCode::Char('u') => app.clear_search(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.close_search(),
        KeyCode::Enter => app.pick_search_result(),
        KeyCode::Up => app.move_search_selection(false),
        KeyCode::Down => app.move_search_selection(true),
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Char(c) => app.push_search_char(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mealcache_core::cache::MemoryStore;
    use mealcache_core::models::School;
    use mealcache_core::{Config, MealStore};

    fn app() -> App {
        let config = Config {
            api_base: "http://127.0.0.1:9/hub".to_string(),
            api_key: None,
            data_dir: None,
        };
        App::with_services(config, MealStore::shared(MemoryStore::new())).unwrap()
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_input(app, KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    fn ctrl(app: &mut App, c: char) {
        handle_input(app, KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)).unwrap();
    }

    fn school(code: &str) -> School {
        School {
            office_code: "J10".to_string(),
            office_name: "경기도교육청".to_string(),
            school_code: code.to_string(),
            school_name: format!("School {}", code),
            kind: None,
            road_address: None,
        }
    }

    #[test]
    fn test_quit_needs_confirmation() {
        let mut app = app();
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.state, AppState::ConfirmingQuit);

        assert!(!press(&mut app, KeyCode::Char('n')));
        assert_eq!(app.state, AppState::Normal);

        press(&mut app, KeyCode::Char('q'));
        assert!(press(&mut app, KeyCode::Char('y')));
        assert_eq!(app.state, AppState::Quitting);
    }

    #[test]
    fn test_view_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.view, View::Week);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.view, View::Today);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.view, View::Week);
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.view, View::Today);
    }

    #[test]
    fn test_search_typing_and_escape() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.state, AppState::Searching);

        // 'q' is text while searching
        for c in "qa".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert_eq!(app.search_input, "qa");
        assert_eq!(app.state, AppState::Searching);

        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.search_input, "q");

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::Normal);
    }

    #[test]
    fn test_search_control_keys() {
        let mut app = app();
        app.open_search();
        app.search_input = "서울".to_string();
        app.search_results = vec![school("1"), school("2")];
        app.search_state = crate::app::SearchState::Results;

        press(&mut app, KeyCode::Down);
        ctrl(&mut app, 'f');
        assert_eq!(app.favorites, vec![school("2")]);

        ctrl(&mut app, 'u');
        assert!(app.search_input.is_empty());
        assert!(app.search_results.is_empty());
    }

    #[test]
    fn test_enter_picks_search_result() {
        let mut app = app();
        app.open_search();
        app.search_results = vec![school("1")];
        app.search_state = crate::app::SearchState::Results;
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::Normal);
        assert!(app.is_selected(&school("1")));
    }

    #[test]
    fn test_favorites_focus_navigation() {
        let mut app = app();
        app.toggle_favorite(&school("1"));
        app.toggle_favorite(&school("2"));

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Favorites);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.favorite_selection, 1);

        // Arrow keys move chips, not views, while favorites have focus
        assert_eq!(app.view, View::Today);

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.favorites, vec![school("2")]);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.focus, Focus::Content);
    }

    #[test]
    fn test_help_overlay() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.state, AppState::ShowingHelp);
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.state, AppState::ShowingHelp);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::Normal);
    }
}
