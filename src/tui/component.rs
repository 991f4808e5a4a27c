use ratatui::Frame;
use ratatui::layout::Rect;

/// A reusable piece of the screen.
///
/// Components receive their data as struct fields and draw into a `Rect`
/// on the frame. `render` takes `&mut self` so a component can refresh
/// internal caches (layout measurements, scroll offsets) during the
/// render pass, matching ratatui's `StatefulWidget` shape.
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// A component that consumes terminal events.
///
/// Returns the component's own high-level event when the low-level input
/// meant something to it, `None` when the input should fall through to
/// the next handler.
pub trait EventHandler {
    type Event;

    fn handle_event(&mut self, event: &super::event::TuiEvent) -> Option<Self::Event>;
}
