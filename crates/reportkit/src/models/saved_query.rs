use serde::{Deserialize, Serialize};

use super::query::Query;

/// A named, optionally shared query as stored by the persistence service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuery {
    /// Assigned by the store on first save; `None` means never persisted.
    pub id: Option<String>,
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub is_shared: bool,

    #[serde(default)]
    pub user_is_owner: bool,

    pub query: Query,
}

impl SavedQuery {
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    #[must_use]
    pub fn can_delete(&self) -> bool {
        self.user_is_owner
    }
}
