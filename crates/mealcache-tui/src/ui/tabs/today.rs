use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use mealcache_core::models::DishItem;
use mealcache_core::utils::{day_label, format_pretty};
use mealcache_core::view::{build_today, MealCard, MealsView};

use crate::app::{App, Focus};
use crate::ui::styles;
use crate::ui::widgets::{empty_lines, meals_placeholder};

/// Shown under a card whose dishes carry allergy numbers
const ALLERGY_FOOTER: &str = "  Numbers after a dish are allergy codes as published by NEIS.";

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match meals_placeholder(
        &app.meals_view,
        "Select a school to see today's meal right away.",
        8,
    ) {
        Some(lines) => lines,
        None => match &app.meals_view {
            MealsView::Loaded { meals } => card_lines(&build_today(meals, app.today)),
            _ => Vec::new(),
        },
    };

    let block = Block::default()
        .title(" Today's meal ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(app.focus == Focus::Content));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn card_lines(card: &MealCard) -> Vec<Line<'static>> {
    match card {
        MealCard::NotProvided => empty_lines("No meal is served today."),
        MealCard::Empty => empty_lines("The menu for today's meal is empty."),
        MealCard::Meal {
            date,
            meal_type,
            calories,
            items,
        } => {
            let mut header = vec![
                Span::styled(format!("  {}", meal_type), styles::highlight_style()),
                Span::styled(
                    format!("  {} ({})", format_pretty(*date), day_label(*date)),
                    styles::muted_style(),
                ),
            ];
            if let Some(kcal) = calories {
                header.push(Span::styled(format!("  · {}", kcal), styles::success_style()));
            }

            let mut lines = vec![Line::from(""), Line::from(header), Line::from("")];
            lines.extend(items.iter().map(dish_line));
            if items.iter().any(|item| !item.allergy_nums.is_empty()) {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    ALLERGY_FOOTER,
                    styles::muted_style(),
                )));
            }
            lines
        }
    }
}

fn dish_line(item: &DishItem) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!("  • {}", item.name),
        styles::list_item_style(),
    )];
    if !item.allergy_nums.is_empty() {
        spans.push(Span::styled(
            format!("  {}", item.allergy_nums.join(" ")),
            styles::allergy_style(),
        ));
    }
    Line::from(spans)
}
