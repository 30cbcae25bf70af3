//! In-memory user store.
//!
//! Stands in for the opaque persistence engine behind identity records; a
//! database would attach at this seam without touching the handlers.

use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

#[derive(Clone, Default)]
pub struct UserStore {
    // Keyed by lowercased email.
    users: Arc<DashMap<String, UserRecord>>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new user; fails if the email is already registered.
    pub fn insert(&self, record: UserRecord) -> Result<(), StoreError> {
        use dashmap::mapref::entry::Entry;

        match self.users.entry(record.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateEmail),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    pub fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        self.users.get(email).map(|r| r.clone())
    }
}
