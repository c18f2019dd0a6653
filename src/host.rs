//! The capability interface through which the dispatch engine drives a host
//! editor. The engine never touches text itself; it only invokes named host
//! operations and reads/writes the host's selection state.

use anyhow::Result;

/// Zero-based position in a text document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// A selection range. `anchor` is the end that stays put, `active` is the
/// end the cursor sits on. A zero-width span (`anchor == active`) is a plain
/// caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub anchor: Position,
    pub active: Position,
}

impl Span {
    /// A zero-width span with both ends at `at`.
    pub fn caret(at: Position) -> Self {
        Self { anchor: at, active: at }
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.active
    }

    /// The span with anchor and active exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            anchor: self.active,
            active: self.anchor,
        }
    }

    /// Collapse to a caret at the active end.
    pub fn collapsed(&self) -> Self {
        Self::caret(self.active)
    }

    /// Endpoints in document order, regardless of selection direction.
    pub fn ordered(&self) -> (Position, Position) {
        if self.anchor <= self.active {
            (self.anchor, self.active)
        } else {
            (self.active, self.anchor)
        }
    }
}

/// Visual cursor shape, applied per mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Block,
    Line,
    Underline,
}

impl CursorStyle {
    /// Parse a configured style name. Unknown names return `None` so the
    /// caller can fall back to its per-mode default.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "block" => Some(CursorStyle::Block),
            "line" | "bar" => Some(CursorStyle::Line),
            "underline" => Some(CursorStyle::Underline),
            _ => None,
        }
    }
}

/// Operations the host editor provides to the engine.
///
/// Command names are opaque identifiers owned by the host; the engine never
/// enumerates them. All methods are synchronous: when a call returns, the
/// operation has completed, which is what keeps sequences strictly ordered.
pub trait Host {
    /// Invoke a named editor operation, optionally with a structured
    /// argument payload. Fails if the name is unknown or the operation is
    /// inapplicable in the current state.
    fn execute_command(&mut self, name: &str, args: Option<&toml::Table>) -> Result<()>;

    /// Route raw keystrokes to the engine (`true`) or back to plain text
    /// insertion (`false`).
    fn set_keystroke_capture(&mut self, enabled: bool);

    /// Whether an editable surface currently has focus.
    fn has_active_editor(&self) -> bool;

    /// Current selection spans, in document order of creation.
    fn selections(&self) -> Vec<Span>;

    fn set_selections(&mut self, spans: Vec<Span>);

    /// Publish a flag the host's own keybinding table can condition on.
    fn set_context_flag(&mut self, name: &str, value: bool);

    fn set_cursor_style(&mut self, style: CursorStyle);
}
