pub mod action;
pub mod config;
pub mod engine;
pub mod host;
pub mod terminal;

pub use action::{Action, Keymap};
pub use config::{load_config, CursorSettings, Settings};
pub use engine::{DispatchError, Engine, Mode, SelectionState, NORMAL_CONTEXT_FLAG};
pub use host::{CursorStyle, Host, Position, Span};
