//! Stable per-profile user identifier

use uuid::Uuid;

use crate::storage::{KeyValueStore, StorageError};

/// Storage key under which the identifier is persisted
pub const USER_ID_KEY: &str = "chat_user_id";

/// Return the stored user identifier, generating and persisting a new one
/// on first use.
pub fn user_id(store: &mut dyn KeyValueStore) -> Result<String, StorageError> {
    if let Some(existing) = store.get(USER_ID_KEY)?.filter(|id| !id.is_empty()) {
        return Ok(existing);
    }

    let fresh = generate();
    store.set(USER_ID_KEY, &fresh)?;
    tracing::info!(user_id = %fresh, "generated new user id");
    Ok(fresh)
}

pub fn generate() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};
    use tempfile::tempdir;

    #[test]
    fn test_first_load_generates_uuid() {
        let mut store = MemoryStore::new();
        let id = user_id(&mut store).unwrap();
        assert!(!id.is_empty());
        assert!(Uuid::parse_str(&id).is_ok());
        assert_eq!(store.get(USER_ID_KEY).unwrap(), Some(id));
    }

    #[test]
    fn test_identical_across_simulated_page_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let first = user_id(&mut FileStore::new(&path)).unwrap();
        let second = user_id(&mut FileStore::new(&path)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_stored_value_is_replaced() {
        let mut store = MemoryStore::new();
        store.set(USER_ID_KEY, "").unwrap();
        let id = user_id(&mut store).unwrap();
        assert!(!id.is_empty());
    }
}
