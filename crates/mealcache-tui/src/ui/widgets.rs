use ratatui::text::{Line, Span};

use mealcache_core::view::{ErrorPanel, MealsView};

use super::styles;

/// Bar widths for the loading skeleton, cycled
const SKELETON_WIDTHS: [usize; 4] = [28, 20, 24, 14];

/// Grey placeholder bars shown while a request is in flight.
pub fn skeleton_lines(rows: usize) -> Vec<Line<'static>> {
    (0..rows)
        .map(|i| {
            let width = SKELETON_WIDTHS[i % SKELETON_WIDTHS.len()];
            Line::from(Span::styled(
                format!("  {}", "▇".repeat(width)),
                styles::skeleton_style(),
            ))
        })
        .collect()
}

pub fn error_panel_lines(panel: &ErrorPanel, retry_key: &str) -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(Span::styled(format!("  {}", panel.title), styles::error_style())),
        Line::from(Span::styled(format!("  {}", panel.desc), styles::muted_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("  [{}] ", retry_key), styles::help_key_style()),
            Span::styled(panel.retry_label.clone(), styles::help_desc_style()),
        ]),
    ]
}

pub fn empty_lines(message: &str) -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(Span::styled(format!("  {}", message), styles::muted_style())),
    ]
}

/// Lines for every meal state except `Loaded`, which each tab draws itself.
pub fn meals_placeholder(
    view: &MealsView,
    no_school_message: &str,
    skeleton_rows: usize,
) -> Option<Vec<Line<'static>>> {
    match view {
        MealsView::NeedsApiKey => Some(error_panel_lines(&ErrorPanel::api_key_missing(), "r")),
        MealsView::NoSchool => {
            let mut lines = empty_lines(no_school_message);
            lines.push(Line::from(vec![
                Span::styled("  [/] ", styles::help_key_style()),
                Span::styled("Search schools", styles::help_desc_style()),
            ]));
            Some(lines)
        }
        MealsView::Loading => Some(skeleton_lines(skeleton_rows)),
        MealsView::Failed(panel) => Some(error_panel_lines(panel, "r")),
        MealsView::Loaded { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton_rows() {
        let lines = skeleton_lines(6);
        assert_eq!(lines.len(), 6);
        assert_ne!(lines[0].width(), lines[1].width());
    }

    #[test]
    fn test_placeholder_only_for_unloaded_states() {
        assert!(meals_placeholder(&MealsView::Loaded { meals: vec![] }, "", 3).is_none());

        let lines = meals_placeholder(&MealsView::NeedsApiKey, "", 3).unwrap();
        let text: String = lines.iter().map(|l| l.to_string()).collect();
        assert!(text.contains("An API key is required"));
        assert!(text.contains("Got it"));

        let lines = meals_placeholder(&MealsView::NoSchool, "Pick a school", 3).unwrap();
        let text: String = lines.iter().map(|l| l.to_string()).collect();
        assert!(text.contains("Pick a school"));
    }
}
