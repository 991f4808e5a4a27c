//! # TUI Components
//!
//! All UI pieces of the terminal interface. Two patterns are in play:
//!
//! - **Stateless components** receive everything as props and just draw:
//!   `TitleBar`, `Bubble`, `UploadPanel`, `ChipList`.
//! - **Stateful components** keep persistent state in `TuiState` and are
//!   wrapped by a transient struct each frame: `MessageList` over
//!   `MessageListState`, `ChatList` over `ChatListState`, and `InputBox`
//!   (which edits the session draft it is handed).
//!
//! Each component file co-locates its state types, event types, rendering,
//! and tests.

pub mod bubble;
pub mod chat_list;
pub mod chip_list;
pub mod input_box;
pub mod message_list;
mod title_bar;
pub mod upload_panel;

pub use bubble::Bubble;
pub use chat_list::{ChatList, ChatListEvent, ChatListState};
pub use chip_list::{ChipList, ChipRect};
pub use input_box::{InputBox, InputEvent};
pub use message_list::{MessageList, MessageListState};
pub use title_bar::TitleBar;
pub use upload_panel::UploadPanel;
