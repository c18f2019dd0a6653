//! Selecting-state tracking.
//!
//! "Selecting" is true when the host reports a non-empty selection range, or
//! when the emulated zero-width mode is on. The zero-width mode lets a user
//! start a selection at a point before the cursor has moved, so
//! selection-qualified bindings fire even though the host shows no range.

use crate::host::{Host, Span};

#[derive(Debug, Default)]
pub struct SelectionState {
    zero_width: bool,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the host itself has any non-empty selection.
    pub fn host_selecting(host: &dyn Host) -> bool {
        host.selections().iter().any(|span| !span.is_empty())
    }

    pub fn is_selecting(&self, host: &dyn Host) -> bool {
        Self::host_selecting(host) || self.zero_width
    }

    pub fn zero_width(&self) -> bool {
        self.zero_width
    }

    /// Re-derive state at the start of a keystroke: a real selection
    /// supersedes the emulated one.
    pub fn observe(&mut self, host: &dyn Host) {
        if Self::host_selecting(host) {
            self.zero_width = false;
        }
    }

    /// Collapse every selection to a caret at its active end and leave the
    /// emulated mode. Does not move the cursor.
    pub fn cancel(&mut self, host: &mut dyn Host) {
        if host.has_active_editor() {
            let collapsed = host
                .selections()
                .iter()
                .map(Span::collapsed)
                .collect::<Vec<_>>();
            host.set_selections(collapsed);
        }
        self.zero_width = false;
    }

    /// Cancel, then flip the zero-width flag relative to its value before
    /// the cancel.
    pub fn toggle_zero_width(&mut self, host: &mut dyn Host) {
        let was_zero_width = self.zero_width;
        self.cancel(host);
        self.zero_width = !was_zero_width;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::MockHost;
    use crate::host::Position;

    #[test]
    fn zero_width_toggle_round_trips() {
        let mut host = MockHost::new();
        let mut state = SelectionState::new();
        assert!(!state.is_selecting(&host));

        state.toggle_zero_width(&mut host);
        assert!(state.is_selecting(&host));
        assert!(state.zero_width());

        state.toggle_zero_width(&mut host);
        assert!(!state.is_selecting(&host));
    }

    #[test]
    fn real_selection_clears_emulated_flag() {
        let mut host = MockHost::new();
        let mut state = SelectionState::new();
        state.toggle_zero_width(&mut host);

        host.select((0, 0), (0, 4));
        state.observe(&host);
        assert!(!state.zero_width());
        // Still selecting, via the real range.
        assert!(state.is_selecting(&host));
    }

    #[test]
    fn cancel_collapses_to_active_end() {
        let mut host = MockHost::new();
        let mut state = SelectionState::new();
        host.select((0, 1), (2, 3));
        state.toggle_zero_width(&mut host);

        // toggle_zero_width cancels first, so the host range is collapsed
        // at the active position and the emulated flag is the negation of
        // its pre-cancel value.
        assert_eq!(host.selections, vec![Span::caret(Position::new(2, 3))]);
        assert!(state.zero_width());

        state.cancel(&mut host);
        assert!(!state.zero_width());
        assert!(!state.is_selecting(&host));
    }

    #[test]
    fn cancel_without_editor_only_clears_flag() {
        let mut host = MockHost::new();
        host.active_editor = false;
        host.select((0, 0), (0, 2));

        let mut state = SelectionState::new();
        state.toggle_zero_width(&mut host);
        // The host range was left alone, but the emulated flag still flipped.
        assert!(!host.selections[0].is_empty());
        assert!(state.zero_width());
    }
}
