//! Permission kinds and their cache parameters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Action a permission check is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionKind {
    Delete,
    Download,
    Update,
    ChangeOption,
}

impl PermissionKind {
    pub const ALL: [PermissionKind; 4] = [
        PermissionKind::Delete,
        PermissionKind::Download,
        PermissionKind::Update,
        PermissionKind::ChangeOption,
    ];

    /// Cache key prefix.
    pub fn prefix(&self) -> &'static str {
        match self {
            PermissionKind::Delete => "dlt",
            PermissionKind::Download => "dwnld",
            PermissionKind::Update => "upd",
            PermissionKind::ChangeOption => "chg",
        }
    }

    /// Cache lifetime in seconds.
    pub fn ttl_seconds(&self) -> u64 {
        match self {
            PermissionKind::Delete => 600,
            PermissionKind::Download => 3600,
            PermissionKind::Update => 3600,
            PermissionKind::ChangeOption => 1200,
        }
    }

    /// Row id in the `permissions` table.
    pub fn permission_id(&self) -> i32 {
        match self {
            PermissionKind::Delete => 1,
            PermissionKind::Download => 2,
            PermissionKind::Update => 3,
            PermissionKind::ChangeOption => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionKind::Delete => "delete",
            PermissionKind::Download => "download",
            PermissionKind::Update => "update",
            PermissionKind::ChangeOption => "change_option",
        }
    }

    /// `<prefix>permission:<user_id>:<app_id>`
    pub fn cache_key(&self, user_id: i64, app_id: i64) -> String {
        format!("{}permission:{}:{}", self.prefix(), user_id, app_id)
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cached permission decision, serialized as `{"perm":bool}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub perm: bool,
}
