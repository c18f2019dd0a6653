//! Keystroke dispatch: chord resolution, action evaluation, and the modal
//! state machine driving it.

mod mode;
mod selection;

pub use mode::Mode;
pub use selection::SelectionState;

use std::sync::Arc;

use log::debug;
use thiserror::Error;

use crate::action::{Action, Keymap};
use crate::config::Settings;
use crate::host::Host;

/// Context flag published to the host so its own static keybindings can be
/// gated on mode (e.g. binding Escape to `enterNormal` only while editing).
pub const NORMAL_CONTEXT_FLAG: &str = "keymode.normal";

/// Host operation that selects the word occurrence under the cursor.
const ADD_SELECTION_TO_NEXT_MATCH: &str = "addSelectionToNextFindMatch";
/// Host operation that copies the current selection to the clipboard.
const CLIPBOARD_COPY: &str = "clipboardCopyAction";

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("host command `{name}` failed")]
    Command {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Commands the engine resolves itself before delegating to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    EnterNormal,
    EnterInsert,
    ToggleMode,
    ToggleSelection,
    CancelSelection,
    SwapActiveAndAnchor,
    CopyWord,
}

impl Builtin {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "enterNormal" => Some(Builtin::EnterNormal),
            "enterInsert" => Some(Builtin::EnterInsert),
            "toggleMode" => Some(Builtin::ToggleMode),
            "toggleSelection" => Some(Builtin::ToggleSelection),
            "cancelSelection" => Some(Builtin::CancelSelection),
            "swapActiveAndAnchor" => Some(Builtin::SwapActiveAndAnchor),
            "copyWord" => Some(Builtin::CopyWord),
            _ => None,
        }
    }
}

/// The dispatch engine: owns the keymap tree, the chord pointer, and the
/// mode/selection state for one editing session.
pub struct Engine {
    settings: Settings,
    root: Arc<Keymap>,
    current: Arc<Keymap>,
    mode: Mode,
    selection: SelectionState,
}

impl Engine {
    pub fn new(settings: Settings) -> Self {
        let root = Arc::new(Keymap::from_table(&settings.keybindings));
        let current = Arc::clone(&root);
        Self {
            settings,
            root,
            current,
            mode: Mode::Normal,
            selection: SelectionState::new(),
        }
    }

    /// Start a session: capture keystrokes and enter normal mode.
    pub fn activate(&mut self, host: &mut dyn Host) {
        self.enter_normal(host);
    }

    /// End a session: release the keystroke capture so typing inserts text.
    pub fn deactivate(&mut self, host: &mut dyn Host) {
        self.enter_insert(host);
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_selecting(&self, host: &dyn Host) -> bool {
        self.selection.is_selecting(host)
    }

    /// Whether a chord prefix is pending, i.e. the next keystroke resolves
    /// in a nested keymap rather than the root.
    pub fn mid_chord(&self) -> bool {
        !Arc::ptr_eq(&self.current, &self.root)
    }

    /// Swap in a new configuration snapshot, rebuilding the keymap tree and
    /// abandoning any pending chord.
    pub fn reload(&mut self, settings: Settings) {
        self.root = Arc::new(Keymap::from_table(&settings.keybindings));
        self.current = Arc::clone(&self.root);
        self.settings = settings;
        debug!("reloaded keybindings: {} top-level entries", self.root.len());
    }

    /// Handle one captured keystroke.
    ///
    /// The keystroke is looked up in the active keymap; when that lookup
    /// misses mid-chord, the chord is abandoned and the keystroke is
    /// reinterpreted at the root, so an unrecognized second key of a chord
    /// behaves like a fresh top-level keystroke instead of being swallowed.
    pub fn on_key(&mut self, host: &mut dyn Host, text: &str) -> Result<(), DispatchError> {
        self.selection.observe(host);

        let mut action = self.current.get(text).cloned();
        if action.is_none() && self.mid_chord() {
            debug!("chord miss on {text:?}, retrying at root");
            self.current = Arc::clone(&self.root);
            action = self.root.get(text).cloned();
        }
        match action {
            Some(action) => self.evaluate(host, &action),
            None => Ok(()),
        }
    }

    /// Recursively interpret one action.
    ///
    /// Every call starts by resetting the chord pointer to the root: a
    /// chord is consumed exactly once, and an interior keymap node never
    /// persists past the action that produced it.
    pub fn evaluate(&mut self, host: &mut dyn Host, action: &Action) -> Result<(), DispatchError> {
        self.current = Arc::clone(&self.root);
        match action {
            Action::Command(name) => self.run_command(host, name, None),
            Action::Invoke { command, args } => self.run_command(host, command, args.as_ref()),
            Action::Sequence(steps) => {
                for step in steps {
                    self.evaluate(host, step)?;
                }
                Ok(())
            }
            Action::Branch { selecting, default } => {
                if self.selection.is_selecting(host) {
                    match selecting {
                        Some(selecting) => self.evaluate(host, selecting),
                        None => Ok(()),
                    }
                } else {
                    self.evaluate(host, default)
                }
            }
            Action::Keymap(map) => {
                self.current = Arc::clone(map);
                Ok(())
            }
        }
    }

    fn run_command(
        &mut self,
        host: &mut dyn Host,
        name: &str,
        args: Option<&toml::Table>,
    ) -> Result<(), DispatchError> {
        match Builtin::from_name(name) {
            Some(builtin) => self.run_builtin(host, builtin),
            None => invoke_host(host, name, args),
        }
    }

    fn run_builtin(&mut self, host: &mut dyn Host, builtin: Builtin) -> Result<(), DispatchError> {
        match builtin {
            Builtin::EnterNormal => self.enter_normal(host),
            Builtin::EnterInsert => self.enter_insert(host),
            Builtin::ToggleMode => self.toggle_mode(host),
            Builtin::ToggleSelection => self.toggle_selection(host),
            Builtin::CancelSelection => self.cancel_selection(host),
            Builtin::SwapActiveAndAnchor => self.swap_active_and_anchor(host),
            Builtin::CopyWord => return self.copy_word(host),
        }
        Ok(())
    }

    pub fn enter_normal(&mut self, host: &mut dyn Host) {
        host.set_keystroke_capture(true);
        self.set_mode(host, Mode::Normal);
    }

    pub fn enter_insert(&mut self, host: &mut dyn Host) {
        host.set_keystroke_capture(false);
        self.set_mode(host, Mode::Insert);
    }

    pub fn toggle_mode(&mut self, host: &mut dyn Host) {
        match self.mode {
            Mode::Normal => self.enter_insert(host),
            Mode::Insert => self.enter_normal(host),
        }
    }

    fn set_mode(&mut self, host: &mut dyn Host, mode: Mode) {
        self.mode = mode;
        host.set_context_flag(NORMAL_CONTEXT_FLAG, mode.is_normal());
        if host.has_active_editor() {
            let style = match mode {
                Mode::Normal => self.settings.cursor.normal_style(),
                Mode::Insert => self.settings.cursor.insert_style(),
            };
            host.set_cursor_style(style);
        }
        self.selection.cancel(host);
    }

    pub fn toggle_selection(&mut self, host: &mut dyn Host) {
        self.selection.toggle_zero_width(host);
    }

    pub fn cancel_selection(&mut self, host: &mut dyn Host) {
        self.selection.cancel(host);
    }

    /// Reverse every selection span, moving the cursor to the other end.
    pub fn swap_active_and_anchor(&mut self, host: &mut dyn Host) {
        if !host.has_active_editor() {
            return;
        }
        let swapped = host
            .selections()
            .iter()
            .map(|span| span.swapped())
            .collect::<Vec<_>>();
        host.set_selections(swapped);
    }

    /// Copy the word occurrence under the cursor without disturbing the
    /// current selections.
    pub fn copy_word(&mut self, host: &mut dyn Host) -> Result<(), DispatchError> {
        if !host.has_active_editor() {
            return Ok(());
        }
        let saved = host.selections();
        invoke_host(host, ADD_SELECTION_TO_NEXT_MATCH, None)?;
        invoke_host(host, CLIPBOARD_COPY, None)?;
        host.set_selections(saved);
        Ok(())
    }
}

fn invoke_host(
    host: &mut dyn Host,
    name: &str,
    args: Option<&toml::Table>,
) -> Result<(), DispatchError> {
    host.execute_command(name, args)
        .map_err(|source| DispatchError::Command {
            name: name.to_string(),
            source,
        })
}
