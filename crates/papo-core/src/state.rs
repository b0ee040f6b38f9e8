//! UI-agnostic transcript types
//!
//! The transcript is the ordered view of everything exchanged with the chat
//! endpoint. It holds message entries and the option sets offered by the
//! server, interleaved in display order. Front ends only read it; all
//! mutation goes through [`crate::ChatClient`].

use serde::{Deserialize, Serialize};

/// Text shown in an assistant entry while its reply is outstanding.
pub const PLACEHOLDER_TEXT: &str = "...";

/// Who wrote a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OptionSetId(pub u64);

/// A single message in the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub role: Role,
    pub text: String,
    /// True while this entry is a placeholder waiting on a reply.
    pub pending: bool,
}

/// Quick replies offered by the server, rendered as disposable choices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSet {
    pub id: OptionSetId,
    pub choices: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Item {
    Message(Entry),
    Options(OptionSet),
}

/// Ordered, append-only sequence of entries plus live option sets.
///
/// Entries are never removed. Option sets are removed as a whole once one
/// of their choices is taken.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    items: Vec<Item>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn push(&mut self, role: Role, text: impl Into<String>) -> EntryId {
        let id = EntryId(self.next_id());
        self.items.push(Item::Message(Entry {
            id,
            role,
            text: text.into(),
            pending: false,
        }));
        id
    }

    pub fn push_placeholder(&mut self) -> EntryId {
        let id = EntryId(self.next_id());
        self.items.push(Item::Message(Entry {
            id,
            role: Role::Assistant,
            text: PLACEHOLDER_TEXT.to_string(),
            pending: true,
        }));
        id
    }

    /// Replace the text of a pending placeholder. Returns false when `id` is
    /// not a pending entry, leaving the transcript untouched.
    pub fn resolve(&mut self, id: EntryId, text: impl Into<String>) -> bool {
        match self.entry_mut(id) {
            Some(entry) if entry.pending => {
                entry.text = text.into();
                entry.pending = false;
                true
            }
            _ => false,
        }
    }

    pub fn push_options(&mut self, choices: Vec<String>) -> OptionSetId {
        let id = OptionSetId(self.next_id());
        self.items.push(Item::Options(OptionSet { id, choices }));
        id
    }

    pub fn remove_options(&mut self, id: OptionSetId) -> Option<OptionSet> {
        let pos = self
            .items
            .iter()
            .position(|item| matches!(item, Item::Options(set) if set.id == id))?;
        match self.items.remove(pos) {
            Item::Options(set) => Some(set),
            Item::Message(_) => None,
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.items.iter().filter_map(|item| match item {
            Item::Message(entry) => Some(entry),
            Item::Options(_) => None,
        })
    }

    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.entries().find(|entry| entry.id == id)
    }

    fn entry_mut(&mut self, id: EntryId) -> Option<&mut Entry> {
        self.items.iter_mut().find_map(|item| match item {
            Item::Message(entry) if entry.id == id => Some(entry),
            _ => None,
        })
    }

    pub fn option_set(&self, id: OptionSetId) -> Option<&OptionSet> {
        self.items.iter().find_map(|item| match item {
            Item::Options(set) if set.id == id => Some(set),
            _ => None,
        })
    }

    /// The most recently offered option set still on screen
    pub fn latest_options(&self) -> Option<&OptionSet> {
        self.items.iter().rev().find_map(|item| match item {
            Item::Options(set) => Some(set),
            Item::Message(_) => None,
        })
    }

    pub fn pending_count(&self) -> usize {
        self.entries().filter(|entry| entry.pending).count()
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_across_kinds() {
        let mut t = Transcript::new();
        let a = t.push(Role::User, "oi");
        let b = t.push_placeholder();
        let set = t.push_options(vec!["A".into()]);
        assert_ne!(a, b);
        assert_ne!(b.0, set.0);
        assert_eq!(t.len(), 2);
        assert_eq!(t.items().len(), 3);
    }

    #[test]
    fn test_resolve_only_touches_pending() {
        let mut t = Transcript::new();
        let user = t.push(Role::User, "oi");
        let ph = t.push_placeholder();

        assert!(!t.resolve(user, "changed"));
        assert_eq!(t.entry(user).map(|e| e.text.as_str()), Some("oi"));

        assert!(t.resolve(ph, "olá"));
        assert!(!t.resolve(ph, "again"));
        let entry = t.entry(ph).unwrap();
        assert_eq!(entry.text, "olá");
        assert!(!entry.pending);
        assert_eq!(t.pending_count(), 0);
    }

    #[test]
    fn test_remove_options_by_id() {
        let mut t = Transcript::new();
        let first = t.push_options(vec!["A".into()]);
        let second = t.push_options(vec!["B".into(), "C".into()]);
        assert_eq!(t.latest_options().map(|s| s.id), Some(second));

        let removed = t.remove_options(second).unwrap();
        assert_eq!(removed.choices, vec!["B".to_string(), "C".to_string()]);
        assert_eq!(t.latest_options().map(|s| s.id), Some(first));
        assert!(t.remove_options(second).is_none());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }
}
