//! The closed table of commands the operator can pick from.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::validator::ValueKind;
use crate::mqtt::topics::Role;

/// One menu entry: which key selects it, where its value goes and how that
/// value is read.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandDefinition {
    pub key: i64,
    pub label: &'static str,
    pub role: Role,
    pub kind: ValueKind,
}

impl CommandDefinition {
    pub fn new(key: i64, label: &'static str, role: Role, kind: ValueKind) -> Self {
        CommandDefinition {
            key,
            label,
            role,
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandTableError {
    #[error("Menu key {0} is used by more than one command")]
    DuplicateKey(i64),

    #[error("Menu key {0} must be positive")]
    InvalidKey(i64),

    #[error("Command table is empty")]
    Empty,
}

/// Command definitions keyed and ordered by menu key.
#[derive(Debug, Clone)]
pub struct CommandTable {
    commands: BTreeMap<i64, CommandDefinition>,
}

impl CommandTable {
    pub fn new(
        definitions: impl IntoIterator<Item = CommandDefinition>,
    ) -> Result<Self, CommandTableError> {
        let mut commands = BTreeMap::new();
        for definition in definitions {
            if definition.key <= 0 {
                return Err(CommandTableError::InvalidKey(definition.key));
            }
            let key = definition.key;
            if commands.insert(key, definition).is_some() {
                return Err(CommandTableError::DuplicateKey(key));
            }
        }

        if commands.is_empty() {
            return Err(CommandTableError::Empty);
        }

        Ok(CommandTable { commands })
    }

    /// Incline, resistance, fan and workout selector on keys 1 to 4.
    pub fn smartbike() -> Result<Self, CommandTableError> {
        Self::new([
            CommandDefinition::new(1, "Incline", Role::InclineControl, ValueKind::Float),
            CommandDefinition::new(2, "Resistance", Role::ResistanceControl, ValueKind::Float),
            CommandDefinition::new(3, "Fan", Role::FanControl, ValueKind::Float),
            CommandDefinition::new(4, "Workout Selector", Role::WorkoutSelector, ValueKind::Text),
        ])
    }

    pub fn lookup(&self, key: i64) -> Option<&CommandDefinition> {
        self.commands.get(&key)
    }

    pub fn keys(&self) -> BTreeSet<i64> {
        self.commands.keys().copied().collect()
    }

    /// The kind used to validate a menu selection against this table.
    pub fn key_kind(&self) -> ValueKind {
        ValueKind::IntegerFromSet(self.keys())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.commands.values()
    }

    /// Menu text, ending in the selection prompt.
    pub fn menu(&self) -> String {
        let mut menu = String::from("=====Select Topic=====\n");
        for command in self.iter() {
            menu.push_str(&format!("\t{}. {}\n", command.key, command.label));
        }
        menu.push_str("INPUT = ");
        menu
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smartbike_menu() {
        let table = CommandTable::smartbike().unwrap();
        assert_eq!(
            table.menu(),
            "=====Select Topic=====\n\t1. Incline\n\t2. Resistance\n\t3. Fan\n\t4. Workout Selector\nINPUT = "
        );
    }

    #[test]
    fn test_lookup_selects_matching_key_only() {
        let table = CommandTable::smartbike().unwrap();
        for key in table.keys() {
            let command = table.lookup(key).unwrap();
            assert_eq!(command.key, key);
            assert_eq!(table.iter().filter(|c| c.key == key).count(), 1);
        }
        assert!(table.lookup(9).is_none());
        assert!(table.lookup(0).is_none());
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let result = CommandTable::new([
            CommandDefinition::new(1, "Incline", Role::InclineControl, ValueKind::Float),
            CommandDefinition::new(1, "Fan", Role::FanControl, ValueKind::Float),
        ]);
        assert_eq!(result.unwrap_err(), CommandTableError::DuplicateKey(1));
    }

    #[test]
    fn test_invalid_and_empty_tables_rejected() {
        assert_eq!(
            CommandTable::new([CommandDefinition::new(
                0,
                "Fan",
                Role::FanControl,
                ValueKind::Float
            )])
            .unwrap_err(),
            CommandTableError::InvalidKey(0)
        );
        assert_eq!(
            CommandTable::new(Vec::<CommandDefinition>::new()).unwrap_err(),
            CommandTableError::Empty
        );
    }

    #[test]
    fn test_menu_is_sorted_by_key() {
        let table = CommandTable::new([
            CommandDefinition::new(7, "Workout", Role::WorkoutSelector, ValueKind::Text),
            CommandDefinition::new(2, "Fan", Role::FanControl, ValueKind::Float),
        ])
        .unwrap();

        let menu = table.menu();
        assert!(menu.find("2. Fan").unwrap() < menu.find("7. Workout").unwrap());
        assert_eq!(table.key_kind(), ValueKind::IntegerFromSet([2, 7].into()));
    }
}
