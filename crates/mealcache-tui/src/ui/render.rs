use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use mealcache_core::models::MAX_FAVORITES;
use mealcache_core::utils::truncate;

use crate::app::{App, AppState, Focus, SearchState, View};

use super::styles;
use super::tabs::{today, week};
use super::widgets::{empty_lines, error_panel_lines, skeleton_lines};

/// Longest school name shown on a favorite chip
const CHIP_NAME_WIDTH: usize = 14;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Favorites
            Constraint::Length(2), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_favorites_bar(frame, app, chunks[1]);
    render_tabs(frame, app, chunks[2]);
    render_main_content(frame, app, chunks[3]);
    render_status_bar(frame, app, chunks[4]);

    // Render overlays
    match app.state {
        AppState::Searching => render_search_overlay(frame, app),
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (school_text, school_style) = match &app.selected_school {
        Some(school) => (
            format!("  {} · {}", school.school_name, school.office_name),
            styles::highlight_style(),
        ),
        None => ("  No school selected".to_string(), styles::muted_style()),
    };

    let title = Span::styled("  mealcache", styles::title_style());
    let school = Span::styled(school_text, school_style);
    let help = Span::styled("[?] Help", styles::muted_style());
    let used = title.width() + school.width() + help.width() + 2;
    let title_line = Line::from(vec![
        title,
        school,
        Span::raw(" ".repeat((area.width as usize).saturating_sub(used))),
        help,
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_favorites_bar(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Favorites;

    let line = if app.favorites.is_empty() {
        Line::from(Span::styled(
            format!(
                " Pin up to {} schools with Ctrl+F in search.",
                MAX_FAVORITES
            ),
            styles::muted_style(),
        ))
    } else {
        let mut spans = vec![Span::raw(" ")];
        for (i, school) in app.favorites.iter().enumerate() {
            let active = app.is_selected(school);
            let cursor = focused && i == app.favorite_selection;
            let marker = if app.manage_mode { " ✕" } else { "" };
            spans.push(Span::styled(
                format!("[{}{}]", truncate(&school.school_name, CHIP_NAME_WIDTH), marker),
                styles::chip_style(active, cursor),
            ));
            spans.push(Span::raw(" "));
        }
        Line::from(spans)
    };

    let title = if app.manage_mode {
        " Favorites (managing: Enter removes, m to finish) "
    } else {
        " Favorites "
    };

    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let tabs = [
        (format!("[1] {}", View::Today.title()), app.view == View::Today),
        (format!("[2] {}", View::Week.title()), app.view == View::Week),
    ];

    let mut spans = vec![Span::raw(" ")];
    for (i, (label, selected)) in tabs.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        if *selected {
            spans.push(Span::styled(label.clone(), styles::tab_style(true)));
        } else {
            spans.push(Span::styled(label.clone(), styles::muted_style()));
        }
    }

    // Date range for the current view on the right
    let mut meta = match app.view {
        View::Today => app.today_meta(),
        View::Week => app.week_meta(),
    };
    if let Some(age) = app.meals_age() {
        meta = format!("{} · {}", meta, age);
    }
    let meta = Span::styled(meta, styles::muted_style());
    let used = Line::from(spans.clone()).width();
    let padding = (area.width as usize).saturating_sub(used + meta.width() + 1);
    spans.push(Span::raw(" ".repeat(padding)));
    spans.push(meta);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.view {
        View::Today => today::render(frame, app, area),
        View::Week => week::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[/]search | [r]efresh | [m]anage | [q]uit";

    let left = match app.visible_toast() {
        Some(msg) => Span::styled(format!(" {} ", msg), styles::highlight_style()),
        None => Span::styled(format!(" {} ", app.build_info()), styles::muted_style()),
    };
    let right = Span::styled(format!(" {} ", shortcuts), styles::muted_style());

    let padding_len = (area.width as usize)
        .saturating_sub(left.width())
        .saturating_sub(right.width());

    let status_line = Line::from(vec![left, Span::raw(" ".repeat(padding_len)), right]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn render_search_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(64, 20, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Find a school ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Input
            Constraint::Min(3),    // Results
            Constraint::Length(1), // Key hints
        ])
        .split(inner);

    let input = Line::from(vec![
        Span::styled(" Search: ", styles::muted_style()),
        Span::styled(format!("{}▌", app.search_input), styles::search_style()),
    ]);
    frame.render_widget(Paragraph::new(input), chunks[0]);

    match &app.search_state {
        SearchState::Hint => {
            let lines = empty_lines("Type a school name, e.g. 서울고");
            frame.render_widget(Paragraph::new(lines), chunks[1]);
        }
        SearchState::Loading => {
            frame.render_widget(Paragraph::new(skeleton_lines(5)), chunks[1]);
        }
        SearchState::Failed(panel) => {
            frame.render_widget(Paragraph::new(error_panel_lines(panel, "Ctrl+R")), chunks[1]);
        }
        SearchState::Results if app.search_results.is_empty() => {
            let lines = empty_lines("No matching schools. Try a different name.");
            frame.render_widget(Paragraph::new(lines), chunks[1]);
        }
        SearchState::Results => render_search_results(frame, app, chunks[1]),
    }

    let hints = Line::from(vec![
        Span::styled(" Enter", styles::help_key_style()),
        Span::styled(" select  ", styles::muted_style()),
        Span::styled("Ctrl+F", styles::help_key_style()),
        Span::styled(" favorite  ", styles::muted_style()),
        Span::styled("Ctrl+U", styles::help_key_style()),
        Span::styled(" clear  ", styles::muted_style()),
        Span::styled("Esc", styles::help_key_style()),
        Span::styled(" close", styles::muted_style()),
    ]);
    frame.render_widget(Paragraph::new(hints), chunks[2]);
}

fn render_search_results(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .search_results
        .iter()
        .enumerate()
        .map(|(i, school)| {
            let star = if app.is_favorite(school) { "★" } else { "☆" };
            let name_style = if i == app.search_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(format!(" {} ", star), styles::highlight_style()),
                    Span::styled(school.school_name.clone(), name_style),
                ]),
                Line::from(Span::styled(
                    format!("   {}", school.meta_line()),
                    styles::muted_style(),
                )),
            ])
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.search_selection));

    frame.render_stateful_widget(List::new(items), area, &mut state);
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 24, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", k), styles::help_key_style()),
            Span::styled(desc, styles::help_desc_style()),
        ])
    };

    let help_text = vec![
        Line::from(Span::styled("  mealcache", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        key("1 / 2", "Today / this week"),
        key("←/→", "Switch view (or favorite)"),
        key("Tab", "Switch focus (meals ↔ favorites)"),
        key("Enter", "Open the focused favorite"),
        key("Esc", "Go back"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        key("/ or s", "Search schools"),
        key("r", "Refresh meals"),
        key("m", "Manage favorites"),
        key("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled(" Search", styles::highlight_style())),
        key("Ctrl+F", "Add or remove favorite"),
        key("Ctrl+R", "Search again"),
        key("Ctrl+U", "Clear"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(help_text).block(block);

    frame.render_widget(paragraph, area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(40, 7, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use mealcache_core::cache::MemoryStore;
    use mealcache_core::models::School;
    use mealcache_core::{Config, MealStore};
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};
    use std::time::{Duration, Instant};

    use crate::app::Toast;

    fn app() -> App {
        let config = Config {
            api_base: "http://127.0.0.1:9/hub".to_string(),
            api_key: None,
            data_dir: None,
        };
        App::with_services(config, MealStore::shared(MemoryStore::new())).unwrap()
    }

    fn draw_buffer(app: &App) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(100, 32)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn draw(app: &App) -> String {
        let buffer = draw_buffer(app);
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_renders_api_key_panel() {
        let mut app = app();
        app.bootstrap();
        let screen = draw(&app);
        assert!(screen.contains("An API key is required"));
        assert!(screen.contains("No school selected"));
    }

    #[test]
    fn test_renders_search_overlay_hint() {
        let mut app = app();
        app.open_search();
        let screen = draw(&app);
        assert!(screen.contains("Find a school"));
        assert!(screen.contains("Type a school name"));
    }

    #[test]
    fn test_renders_favorite_chips() {
        let mut app = app();
        app.toggle_favorite(&School {
            office_code: "B10".to_string(),
            office_name: "Seoul".to_string(),
            school_code: "1".to_string(),
            school_name: "Hanbit High".to_string(),
            kind: None,
            road_address: None,
        });
        let screen = draw(&app);
        assert!(screen.contains("[Hanbit High]"));
    }

    #[test]
    fn test_wide_school_name_keeps_help_hint() {
        let mut app = app();
        app.selected_school = Some(School {
            office_code: "B10".to_string(),
            office_name: "서울특별시교육청".to_string(),
            school_code: "7010057".to_string(),
            school_name: "서울고등학교".to_string(),
            kind: None,
            road_address: None,
        });
        let screen = draw(&app);
        let title_row = screen.lines().next().unwrap();
        assert!(title_row.contains("[?] Help"), "{}", title_row);
    }

    #[test]
    fn test_expired_toast_renders_muted() {
        let mut app = app();
        let shown = Instant::now().checked_sub(Duration::from_secs(5)).unwrap();
        app.toast = Some(Toast::new("Added to favorites", shown));

        let buffer = draw_buffer(&app);
        let cell = buffer.cell((1, 30)).unwrap();
        assert_eq!(cell.fg, styles::MUTED);
        assert!(!draw(&app).contains("Added to favorites"));

        app.toast = Some(Toast::new("Added to favorites", Instant::now()));
        let buffer = draw_buffer(&app);
        assert_eq!(buffer.cell((1, 30)).unwrap().fg, styles::ACCENT);
    }
}
