//! ============================================================================
//! Database Types - Serializable records for redb storage
//! ============================================================================

use serde::{Deserialize, Serialize};

/// The one durable session record: which user to restore on next start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub user_id: i64,
    /// Unix seconds when the session was saved
    pub saved_at: i64,
}

/// Local client settings remembered between runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredSettings {
    /// Backend the session belongs to
    pub api_base_url: Option<String>,
}
