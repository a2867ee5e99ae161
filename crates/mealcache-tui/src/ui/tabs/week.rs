use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use mealcache_core::utils::{day_label, format_pretty, truncate};
use mealcache_core::view::{build_week, MealsView, WeekDay};

use crate::app::{App, Focus};
use crate::ui::styles;
use crate::ui::widgets::meals_placeholder;

/// Dish names are clipped to fit a day column
const DISH_NAME_WIDTH: usize = 16;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Content;

    let MealsView::Loaded { meals } = &app.meals_view else {
        let lines = meals_placeholder(
            &app.meals_view,
            "Select a school to see this week's meals.",
            10,
        )
        .unwrap_or_default();
        let block = Block::default()
            .title(" This week ")
            .title_style(styles::title_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(focused));
        frame.render_widget(Paragraph::new(lines).block(block), area);
        return;
    };

    let days = build_week(meals, &app.week());
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, days.len().max(1) as u32); days.len()])
        .split(area);

    for (day, column) in days.iter().zip(columns.iter()) {
        render_day(frame, day, day.date == app.today, focused, *column);
    }
}

fn render_day(frame: &mut Frame, day: &WeekDay, is_today: bool, focused: bool, area: Rect) {
    let title = format!(" {} {} ", day_label(day.date), &format_pretty(day.date)[5..]);
    let block = Block::default()
        .title(title)
        .title_style(day_title_style(day, is_today))
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused && is_today));

    frame.render_widget(Paragraph::new(day_lines(day)).block(block), area);
}

fn day_title_style(day: &WeekDay, is_today: bool) -> Style {
    if is_today {
        styles::tab_style(true)
    } else if day.is_served() {
        styles::title_style()
    } else {
        styles::muted_style()
    }
}

fn day_lines(day: &WeekDay) -> Vec<Line<'static>> {
    let Some(meal) = &day.meal else {
        return vec![Line::from(Span::styled(" No meal", styles::muted_style()))];
    };

    let mut lines = vec![Line::from(Span::styled(
        format!(" {}", meal.meal_type),
        styles::highlight_style(),
    ))];
    lines.extend(meal.preview.iter().map(|name| {
        Line::from(Span::styled(
            format!(" {}", truncate(name, DISH_NAME_WIDTH)),
            styles::list_item_style(),
        ))
    }));
    if meal.more {
        lines.push(Line::from(Span::styled(" …more", styles::muted_style())));
    }
    lines
}
