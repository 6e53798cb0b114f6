//! Reconciles a verified launch against the user store.

use pulse_core::{UserIdentity, UserView, VerifiedFields};
use pulse_storage::{StorageError, UserStore};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("missing user field")]
    MissingUser,
    #[error("invalid user JSON: {0}")]
    InvalidUserData(String),
    #[error(transparent)]
    Store(#[from] StorageError),
}

/// Decodes the embedded identity and upserts it, returning the
/// authoritative view. The upsert is one atomic store operation, so
/// concurrent syncs for the same new id cannot both take the creation path.
pub fn sync_user(fields: &VerifiedFields, store: &UserStore) -> Result<UserView, SyncError> {
    let user_json = fields.user_json().ok_or(SyncError::MissingUser)?;
    let identity: UserIdentity = serde_json::from_str(user_json)
        .map_err(|err| SyncError::InvalidUserData(err.to_string()))?;

    let record = store.upsert_user(&identity)?;
    info!(event = "user_synced", user_id = record.user_id, bpm = record.bpm);

    Ok(UserView {
        user_id: record.user_id,
        first_name: record.first_name,
        username: record.username,
        photo_url: record.photo_url,
        bpm: record.bpm,
    })
}
