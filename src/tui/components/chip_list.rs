//! # ChipList Component
//!
//! Follow-up suggestion chips, rendered as a wrapping strip of bracketed
//! labels between the timeline and the input box. Chips are clickable:
//! the layout pass records each chip's screen rect so the parent can hit
//! test mouse clicks against them.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

use crate::tui::theme::Theme;

/// Gap between chips on one row.
const CHIP_GAP: u16 = 2;
/// Decoration around the label: "⟨ " + " ⟩".
const CHIP_DECOR: u16 = 4;

/// One laid-out chip: its label and the rect it occupies, in coordinates
/// relative to the strip's origin. A chip whose label is wider than the
/// strip spans several rows (`rect.height > 1`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChipRect {
    pub label: String,
    pub rect: Rect,
}

/// Wrap a label to the strip's inner width. Labels are never truncated;
/// text wider than one row continues on the next.
fn wrap_label(label: &str, inner_width: u16) -> Vec<String> {
    let options = textwrap::Options::new(inner_width.max(1) as usize).break_words(true);
    let lines = textwrap::wrap(label, options);
    lines.into_iter().map(|l| l.into_owned()).collect()
}

/// Flow chips left to right, wrapping to a new row when one doesn't fit.
/// An oversized chip takes rows of its own, its label wrapped across them.
pub fn layout_chips(labels: &[String], width: u16) -> Vec<ChipRect> {
    let mut chips = Vec::new();
    if width == 0 {
        return chips;
    }
    let inner_width = width.saturating_sub(CHIP_DECOR);

    let mut x: u16 = 0;
    let mut y: u16 = 0;
    for label in labels {
        let lines = wrap_label(label, inner_width);
        let label_width = lines
            .iter()
            .map(|l| l.as_str().width() as u16)
            .max()
            .unwrap_or(0);
        let chip_width = (label_width + CHIP_DECOR).min(width);
        let chip_height = lines.len().max(1) as u16;

        if chip_height > 1 {
            // A wrapped chip owns its rows outright
            if x > 0 {
                x = 0;
                y += 1;
            }
            chips.push(ChipRect {
                label: label.clone(),
                rect: Rect::new(0, y, chip_width, chip_height),
            });
            y += chip_height;
            continue;
        }

        if x > 0 && x + chip_width > width {
            x = 0;
            y += 1;
        }
        chips.push(ChipRect {
            label: label.clone(),
            rect: Rect::new(x, y, chip_width, 1),
        });
        x += chip_width + CHIP_GAP;
    }
    chips
}

/// Rows needed for the given labels at the given width.
pub fn chip_strip_height(labels: &[String], width: u16) -> u16 {
    layout_chips(labels, width)
        .iter()
        .map(|chip| chip.rect.y + chip.rect.height)
        .max()
        .unwrap_or(0)
}

/// Return the label of the chip at (x, y), in strip-relative coordinates.
pub fn hit_test(chips: &[ChipRect], x: u16, y: u16) -> Option<&str> {
    chips
        .iter()
        .find(|chip| chip.rect.contains(ratatui::layout::Position { x, y }))
        .map(|chip| chip.label.as_str())
}

/// Transient renderer for the chip strip. Returns the laid-out rects
/// translated to screen coordinates so the caller can store them for
/// click handling.
pub struct ChipList<'a> {
    pub labels: &'a [String],
    pub theme: Theme,
}

impl<'a> ChipList<'a> {
    pub fn render(&self, frame: &mut Frame, area: Rect) -> Vec<ChipRect> {
        let chips = layout_chips(self.labels, area.width);
        let inner_width = area.width.saturating_sub(CHIP_DECOR);
        let style = Style::default()
            .fg(self.theme.accent)
            .add_modifier(Modifier::BOLD);

        let rows = chip_strip_height(self.labels, area.width);
        let mut lines: Vec<Vec<Span<'static>>> = vec![Vec::new(); rows as usize];
        for chip in &chips {
            let wrapped = wrap_label(&chip.label, inner_width);
            let last = wrapped.len().saturating_sub(1);
            for (i, text) in wrapped.into_iter().enumerate() {
                let row = &mut lines[(chip.rect.y as usize) + i];
                let occupied: u16 = row.iter().map(|s| s.content.width() as u16).sum();
                if chip.rect.x > occupied {
                    row.push(Span::raw(" ".repeat((chip.rect.x - occupied) as usize)));
                }
                // Brackets open on the first row and close on the last;
                // continuation rows are indented to stay inside the chip
                let open = if i == 0 { "⟨ " } else { "  " };
                let close = if i == last { " ⟩" } else { "" };
                row.push(Span::styled(format!("{open}{text}{close}"), style));
            }
        }

        let text: Vec<Line<'static>> = lines.into_iter().map(Line::from).collect();
        frame.render_widget(Paragraph::new(text), area);

        // Translate to screen coordinates for the caller's hit testing
        chips
            .into_iter()
            .map(|mut chip| {
                chip.rect.x += area.x;
                chip.rect.y += area.y;
                chip
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn chips_flow_onto_one_row_when_they_fit() {
        let chips = layout_chips(&labels(&["aa", "bb"]), 40);
        assert_eq!(chips.len(), 2);
        assert_eq!(chips[0].rect, Rect::new(0, 0, 6, 1));
        assert_eq!(chips[1].rect, Rect::new(8, 0, 6, 1));
        assert_eq!(chip_strip_height(&labels(&["aa", "bb"]), 40), 1);
    }

    #[test]
    fn chips_wrap_to_the_next_row() {
        // Each chip is 6 wide + 2 gap; width 10 fits only one per row
        let chips = layout_chips(&labels(&["aa", "bb", "cc"]), 10);
        assert_eq!(chips[0].rect.y, 0);
        assert_eq!(chips[1].rect.y, 1);
        assert_eq!(chips[2].rect.y, 2);
        assert_eq!(chip_strip_height(&labels(&["aa", "bb", "cc"]), 10), 3);
    }

    #[test]
    fn oversized_label_wraps_instead_of_truncating() {
        let long = labels(&["compare retention across every cohort segment"]);
        let chips = layout_chips(&long, 20);
        assert_eq!(chips.len(), 1);
        assert!(
            chips[0].rect.height > 1,
            "expected a multi-row chip, got {:?}",
            chips[0].rect
        );
        assert!(chips[0].rect.width <= 20);
        assert_eq!(chip_strip_height(&long, 20), chips[0].rect.height);

        // Every word of the label survives in the rendered strip
        let backend = TestBackend::new(20, chips[0].rect.height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                let chip_list = ChipList {
                    labels: &long,
                    theme: Theme::dark(),
                };
                chip_list.render(f, f.area());
            })
            .unwrap();
        let content: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        for word in ["compare", "retention", "across", "every", "cohort", "segment"] {
            assert!(content.contains(word), "missing {word:?} in {content:?}");
        }
    }

    #[test]
    fn wrapped_chip_is_clickable_on_every_row() {
        let label = "compare retention across every cohort segment";
        let chips = layout_chips(&labels(&[label]), 20);
        let height = chips[0].rect.height;
        assert!(height >= 2);
        assert_eq!(hit_test(&chips, 1, 0), Some(label));
        assert_eq!(hit_test(&chips, 1, height - 1), Some(label));
        assert_eq!(hit_test(&chips, 1, height), None);
    }

    #[test]
    fn chips_after_a_wrapped_chip_start_on_a_fresh_row() {
        let mixed = labels(&["aa", "compare retention across every cohort segment", "bb"]);
        let chips = layout_chips(&mixed, 20);
        let wrapped = &chips[1].rect;
        assert!(wrapped.height > 1);
        // The short chip before shares no row with it, and the one after
        // begins below it
        assert!(chips[0].rect.y < wrapped.y);
        assert_eq!(chips[2].rect.y, wrapped.y + wrapped.height);
        assert_eq!(chips[2].rect.x, 0);
    }

    #[test]
    fn hit_test_finds_the_chip_under_the_cursor() {
        let chips = layout_chips(&labels(&["aa", "bb"]), 40);
        assert_eq!(hit_test(&chips, 1, 0), Some("aa"));
        assert_eq!(hit_test(&chips, 9, 0), Some("bb"));
        // The gap between chips is dead space
        assert_eq!(hit_test(&chips, 6, 0), None);
        assert_eq!(hit_test(&chips, 0, 5), None);
    }

    #[test]
    fn empty_labels_take_no_space() {
        assert!(layout_chips(&[], 40).is_empty());
        assert_eq!(chip_strip_height(&[], 40), 0);
    }
}
