//! Name registry
//!
//! Maps unique object names to handles and hands out sequential numeric ids.
//! Ids start at 0 and are never reused.

use std::collections::BTreeMap;

use crate::ecs::GameObjectId;

/// Registry errors
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Name does not match `[A-Za-z_][A-Za-z0-9_]*`
    #[error("invalid object name `{0}`: expected [A-Za-z_][A-Za-z0-9_]*")]
    InvalidName(String),

    /// Another object already holds the name
    #[error("an object named `{0}` is already registered")]
    DuplicateName(String),

    /// Object already holds an id
    #[error("object `{0}` is already registered")]
    AlreadyRegistered(String),

    /// Object holds no id
    #[error("object `{0}` is not registered")]
    NotRegistered(String),

    /// Handle does not refer to a live object
    #[error("unknown object handle")]
    UnknownObject,

    /// Registry is at its configured capacity
    #[error("registry is full ({0} objects)")]
    CapacityExceeded(usize),
}

/// Whether `name` is a valid object name: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Name to handle map with sequential ids
#[derive(Debug, Clone, Default)]
pub struct Registry {
    names: BTreeMap<String, GameObjectId>,
    next_id: i32,
    capacity: Option<usize>,
}

impl Registry {
    /// Unbounded registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry refusing more than `capacity` entries
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Handle registered under `name`
    pub fn lookup(&self, name: &str) -> Option<GameObjectId> {
        self.names.get(name).copied()
    }

    /// Whether `name` is taken
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Number of registered objects
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    /// Id the next successful registration receives
    pub const fn next_id(&self) -> i32 {
        self.next_id
    }

    /// Reserve `name` for `handle` and return the new id.
    pub(crate) fn insert(&mut self, name: &str, handle: GameObjectId) -> Result<i32, RegistryError> {
        if !is_valid_name(name) {
            return Err(RegistryError::InvalidName(name.to_string()));
        }
        if self.names.contains_key(name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        if let Some(capacity) = self.capacity {
            if self.names.len() >= capacity {
                return Err(RegistryError::CapacityExceeded(capacity));
            }
        }

        self.names.insert(name.to_string(), handle);
        let id = self.next_id;
        self.next_id += 1;
        Ok(id)
    }

    /// Release `name` if it maps to `handle`.
    pub(crate) fn remove(&mut self, name: &str, handle: GameObjectId) -> bool {
        if self.names.get(name) == Some(&handle) {
            self.names.remove(name);
            true
        } else {
            false
        }
    }

    /// Move `handle` from `old` to `new`.
    pub(crate) fn rename(&mut self, old: &str, new: &str, handle: GameObjectId) -> Result<(), RegistryError> {
        if !is_valid_name(new) {
            return Err(RegistryError::InvalidName(new.to_string()));
        }
        if old == new {
            return Ok(());
        }
        if self.names.contains_key(new) {
            return Err(RegistryError::DuplicateName(new.to_string()));
        }
        if !self.remove(old, handle) {
            return Err(RegistryError::NotRegistered(old.to_string()));
        }
        self.names.insert(new.to_string(), handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn handles(n: usize) -> Vec<GameObjectId> {
        let mut map = SlotMap::<GameObjectId, ()>::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn name_grammar() {
        for valid in ["_", "a", "cubo_main", "_x9", "Z_1_2"] {
            assert!(is_valid_name(valid), "{valid} should be valid");
        }
        for invalid in ["", "9abc", "has space", "dash-ed", "ñandú", "a.b"] {
            assert!(!is_valid_name(invalid), "{invalid} should be invalid");
        }
    }

    #[test]
    fn ids_are_sequential_and_never_reused() {
        let h = handles(3);
        let mut registry = Registry::new();

        assert_eq!(registry.insert("a", h[0]), Ok(0));
        assert_eq!(registry.insert("b", h[1]), Ok(1));
        assert!(registry.remove("a", h[0]));
        assert_eq!(registry.insert("a", h[2]), Ok(2));
        assert_eq!(registry.next_id(), 3);
    }

    #[test]
    fn duplicates_and_bad_names_are_rejected() {
        let h = handles(2);
        let mut registry = Registry::new();
        registry.insert("cubo", h[0]).unwrap();

        assert_eq!(registry.insert("cubo", h[1]), Err(RegistryError::DuplicateName("cubo".into())));
        assert_eq!(registry.insert("1cubo", h[1]), Err(RegistryError::InvalidName("1cubo".into())));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.next_id(), 1);
    }

    #[test]
    fn rename_moves_the_entry() {
        let h = handles(2);
        let mut registry = Registry::new();
        registry.insert("old", h[0]).unwrap();
        registry.insert("taken", h[1]).unwrap();

        assert_eq!(registry.rename("old", "taken", h[0]), Err(RegistryError::DuplicateName("taken".into())));
        assert_eq!(registry.rename("old", "bad name", h[0]), Err(RegistryError::InvalidName("bad name".into())));
        assert_eq!(registry.rename("old", "new", h[0]), Ok(()));
        assert_eq!(registry.lookup("new"), Some(h[0]));
        assert_eq!(registry.lookup("old"), None);
    }

    #[test]
    fn remove_ignores_foreign_handles() {
        let h = handles(2);
        let mut registry = Registry::new();
        registry.insert("a", h[0]).unwrap();
        assert!(!registry.remove("a", h[1]));
        assert!(registry.contains("a"));
    }

    #[test]
    fn capacity_limit_is_enforced() {
        let h = handles(3);
        let mut registry = Registry::with_capacity_limit(2);
        registry.insert("a", h[0]).unwrap();
        registry.insert("b", h[1]).unwrap();
        assert_eq!(registry.insert("c", h[2]), Err(RegistryError::CapacityExceeded(2)));
    }
}
