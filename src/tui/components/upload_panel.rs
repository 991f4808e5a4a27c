//! # UploadPanel Component
//!
//! Progress rows for the active session's file uploads, one gauge per
//! task. Terminal rows show ✓ or ✗ until their delayed removal fires.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::LineGauge;

use crate::core::uploads::{UploadQueue, UploadState, UploadTask};
use crate::tui::component::Component;
use crate::tui::theme::Theme;

pub struct UploadPanel<'a> {
    pub uploads: &'a UploadQueue,
    pub theme: Theme,
}

impl<'a> UploadPanel<'a> {
    /// One row per task.
    pub fn height(uploads: &UploadQueue) -> u16 {
        uploads.tasks().len() as u16
    }

    fn row_label(task: &UploadTask) -> String {
        match &task.state {
            UploadState::Queued => format!("{} (queued)", task.name),
            UploadState::Active => task.name.clone(),
            UploadState::Done => format!("✓ {}", task.name),
            UploadState::Failed(reason) => format!("✗ {}: {}", task.name, reason),
        }
    }
}

impl<'a> Component for UploadPanel<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        for (i, task) in self.uploads.tasks().iter().enumerate() {
            let y = area.y + i as u16;
            if y >= area.y + area.height {
                break;
            }
            let row = Rect::new(area.x, y, area.width, 1);
            let label = Self::row_label(task);

            match &task.state {
                UploadState::Active | UploadState::Queued => {
                    let gauge = LineGauge::default()
                        .label(Span::styled(label, Style::default().fg(self.theme.text)))
                        .filled_style(Style::default().fg(self.theme.gauge))
                        .unfilled_style(Style::default().fg(self.theme.text_muted))
                        .ratio(f64::from(task.progress) / 100.0);
                    frame.render_widget(gauge, row);
                }
                UploadState::Done => {
                    frame.render_widget(
                        Span::styled(label, Style::default().fg(self.theme.success)),
                        row,
                    );
                }
                UploadState::Failed(_) => {
                    frame.render_widget(
                        Span::styled(
                            label,
                            Style::default()
                                .fg(self.theme.error)
                                .add_modifier(Modifier::BOLD),
                        ),
                        row,
                    );
                }
            }
        }
    }
}
