//! The binding action language: what a configured keystroke does.
//!
//! Bindings are loaded as plain TOML data and classified structurally into a
//! closed set of action shapes. Anything that fails classification is
//! treated as absent rather than an error.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use toml::Value;

/// One configured action, classified from configuration data.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Invoke a host command by name, no arguments.
    Command(String),
    /// Invoke a host command with a structured argument payload.
    Invoke {
        command: String,
        args: Option<toml::Table>,
    },
    /// Run each element in order, completing each before the next starts.
    Sequence(Vec<Action>),
    /// Choose by current selecting state. `default` runs when not selecting;
    /// `selecting` is opt-in, and a selecting-state keystroke with no
    /// `selecting` arm does nothing at all.
    Branch {
        selecting: Option<Box<Action>>,
        default: Box<Action>,
    },
    /// A nested dispatch table: the next keystroke is looked up here
    /// instead of the root keymap.
    Keymap(Arc<Keymap>),
}

/// A dispatch table from keystroke text to action.
#[derive(Debug, Default, PartialEq)]
pub struct Keymap {
    bindings: HashMap<String, Action>,
}

impl Keymap {
    /// Build a keymap from a raw configuration table, silently dropping
    /// entries that do not classify as actions. The surviving entries are
    /// the loaded configuration.
    pub fn from_table(table: &toml::Table) -> Self {
        let mut bindings = HashMap::with_capacity(table.len());
        for (key, value) in table {
            match Action::from_value(value) {
                Some(action) => {
                    bindings.insert(key.clone(), action);
                }
                None => debug!("dropping invalid binding for key {key:?}"),
            }
        }
        debug!(
            "keymap loaded: {} of {} bindings valid",
            bindings.len(),
            table.len()
        );
        Self { bindings }
    }

    pub fn get(&self, key: &str) -> Option<&Action> {
        self.bindings.get(key)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Action {
    /// Classify a configuration value into exactly one action shape.
    ///
    /// Checks run in a fixed order and later ones assume the earlier failed:
    /// string, branch (`default` key), command (`command` key), sequence,
    /// then generic keymap. The order is what lets a table with a key
    /// literally named `default` be a branch rather than a keymap.
    pub fn from_value(value: &Value) -> Option<Self> {
        if let Value::String(name) = value {
            return Some(Action::Command(name.clone()));
        }
        if let Value::Table(table) = value {
            if let Some(branch) = branch_from_table(table) {
                return Some(branch);
            }
            if let Some(command) = command_from_table(table) {
                return Some(command);
            }
        }
        if let Value::Array(items) = value {
            let mut actions = Vec::with_capacity(items.len());
            for item in items {
                actions.push(Action::from_value(item)?);
            }
            return Some(Action::Sequence(actions));
        }
        if let Value::Table(table) = value {
            let mut bindings = HashMap::with_capacity(table.len());
            for (key, item) in table {
                bindings.insert(key.clone(), Action::from_value(item)?);
            }
            return Some(Action::Keymap(Arc::new(Keymap { bindings })));
        }
        None
    }
}

/// A table with a `default` key whose arms classify. Extra keys are ignored.
fn branch_from_table(table: &toml::Table) -> Option<Action> {
    let default = Action::from_value(table.get("default")?)?;
    let selecting = match table.get("selecting") {
        Some(value) => Some(Box::new(Action::from_value(value)?)),
        None => None,
    };
    Some(Action::Branch {
        selecting,
        default: Box::new(default),
    })
}

/// A table with a string `command` key and an optional `args` table.
fn command_from_table(table: &toml::Table) -> Option<Action> {
    let command = table.get("command")?.as_str()?;
    let args = match table.get("args") {
        Some(Value::Table(args)) => Some(args.clone()),
        Some(_) => return None,
        None => None,
    };
    Some(Action::Invoke {
        command: command.to_string(),
        args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(doc: &str) -> Value {
        let table: toml::Table = doc.parse().unwrap();
        table.get("v").cloned().unwrap()
    }

    #[test]
    fn string_is_command() {
        assert_eq!(
            Action::from_value(&value(r#"v = "cursorDown""#)),
            Some(Action::Command("cursorDown".to_string()))
        );
    }

    #[test]
    fn table_with_default_is_branch() {
        let action = Action::from_value(&value(
            r#"v = { selecting = "cursorDownSelect", default = "cursorDown" }"#,
        ))
        .unwrap();
        match action {
            Action::Branch { selecting, default } => {
                assert_eq!(*default, Action::Command("cursorDown".to_string()));
                assert_eq!(
                    selecting.as_deref(),
                    Some(&Action::Command("cursorDownSelect".to_string()))
                );
            }
            other => panic!("expected branch, got {other:?}"),
        }
    }

    #[test]
    fn default_key_beats_keymap_interpretation() {
        // A key literally named `default` makes the table a branch, never a
        // keymap binding for the character sequence "default".
        let action =
            Action::from_value(&value(r#"v = { default = "x", other = "y" }"#)).unwrap();
        assert!(matches!(action, Action::Branch { .. }));
    }

    #[test]
    fn command_key_is_invoke() {
        let action = Action::from_value(&value(
            r#"v = { command = "editor.find", args = { query = "todo" } }"#,
        ))
        .unwrap();
        match action {
            Action::Invoke { command, args } => {
                assert_eq!(command, "editor.find");
                let args = args.unwrap();
                assert_eq!(args.get("query").and_then(Value::as_str), Some("todo"));
            }
            other => panic!("expected invoke, got {other:?}"),
        }
    }

    #[test]
    fn invoke_without_args() {
        let action = Action::from_value(&value(r#"v = { command = "undo" }"#)).unwrap();
        assert_eq!(
            action,
            Action::Invoke {
                command: "undo".to_string(),
                args: None,
            }
        );
    }

    #[test]
    fn non_string_command_falls_through_to_keymap() {
        // `command` bound to a valid action is just another keymap entry.
        let action =
            Action::from_value(&value(r#"v = { command = { default = "x" } }"#)).unwrap();
        match action {
            Action::Keymap(map) => assert!(matches!(
                map.get("command"),
                Some(Action::Branch { .. })
            )),
            other => panic!("expected keymap, got {other:?}"),
        }
    }

    #[test]
    fn non_table_args_rejects_whole_entry() {
        // Not an invoke (args must be a table), and not a keymap either
        // because the `args` value is no action.
        assert_eq!(
            Action::from_value(&value(r#"v = { command = "undo", args = 3 }"#)),
            None
        );
    }

    #[test]
    fn array_is_sequence() {
        let action = Action::from_value(&value(
            r#"v = ["cursorLineStart", "cursorEndSelect", "copyAction"]"#,
        ))
        .unwrap();
        match action {
            Action::Sequence(steps) => assert_eq!(steps.len(), 3),
            other => panic!("expected sequence, got {other:?}"),
        }
    }

    #[test]
    fn array_with_invalid_element_is_invalid() {
        assert_eq!(Action::from_value(&value(r#"v = ["copyAction", 7]"#)), None);
    }

    #[test]
    fn table_of_actions_is_keymap() {
        let action = Action::from_value(&value(
            r#"v = { r = "reloadWindow", g = { default = "cursorTop" } }"#,
        ))
        .unwrap();
        match action {
            Action::Keymap(map) => {
                assert_eq!(map.len(), 2);
                assert_eq!(
                    map.get("r"),
                    Some(&Action::Command("reloadWindow".to_string()))
                );
            }
            other => panic!("expected keymap, got {other:?}"),
        }
    }

    #[test]
    fn table_with_invalid_value_is_invalid() {
        assert_eq!(Action::from_value(&value("v = { a = 1 }")), None);
        assert_eq!(Action::from_value(&value("v = 12")), None);
        assert_eq!(Action::from_value(&value("v = true")), None);
    }

    #[test]
    fn empty_shapes_are_valid() {
        assert_eq!(
            Action::from_value(&value("v = []")),
            Some(Action::Sequence(Vec::new()))
        );
        match Action::from_value(&value("v = {}")).unwrap() {
            Action::Keymap(map) => assert!(map.is_empty()),
            other => panic!("expected keymap, got {other:?}"),
        }
    }

    #[test]
    fn invalid_entries_dropped_from_keymap_root() {
        let table: toml::Table = r#"
            j = "cursorDown"
            k = 17
            l = { command = "cursorLeft" }
        "#
        .parse()
        .unwrap();
        let keymap = Keymap::from_table(&table);
        assert_eq!(keymap.len(), 2);
        assert!(keymap.get("j").is_some());
        assert!(keymap.get("k").is_none());
    }

    #[test]
    fn classification_is_idempotent() {
        let doc: toml::Table = r#"
            j = { selecting = "cursorDownSelect", default = "cursorDown" }
            a = ["cursorLineStart", "cursorEndSelect", "copyAction"]
            g = { g = "cursorTop", e = "cursorBottom" }
        "#
        .parse()
        .unwrap();
        assert_eq!(Keymap::from_table(&doc), Keymap::from_table(&doc));
    }
}
