//! Deterministic namespace keys.
//!
//! Namespace names are derived, never random, so the same logical
//! collection is reattached after a restart.

/// Builders for the two namespace families the backend uses.
pub struct NamespaceKey;

impl NamespaceKey {
    /// Primary namespace holding all of a user's memories.
    pub fn for_user(user_id: &str) -> String {
        format!("user_{}_memories", user_id)
    }

    /// Derived namespace holding the subset of memories relevant to one
    /// replica; rebuilt wholesale on each training run.
    pub fn for_replica(user_id: &str, replica_id: &str) -> String {
        format!("user_{}_replica_{}", user_id, replica_id)
    }
}
