//! File view permission checking
//!
//! The permission checker answers yes/no capability queries for an acting
//! user against a file. Save-time validation consults it; render-time reads
//! do not re-check.

use crate::files::FileRecord;

/// The acting user for a request. Anonymous when no identity was supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Option<i64>,
}

impl Actor {
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    pub fn is_identified(&self) -> bool {
        self.user_id.is_some()
    }
}

/// Capability query seam for file visibility
pub trait PermissionChecker: Send + Sync {
    /// Can `actor` view `file` in the file manager?
    fn can_view(&self, actor: &Actor, file: &FileRecord) -> bool;
}

/// Default policy: unprotected files are visible to anyone, protected files
/// only to identified actors.
#[derive(Debug, Default, Clone)]
pub struct ProtectedFilePolicy;

impl PermissionChecker for ProtectedFilePolicy {
    fn can_view(&self, actor: &Actor, file: &FileRecord) -> bool {
        !file.protected || actor.is_identified()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(protected: bool) -> FileRecord {
        FileRecord {
            file_id: 1,
            title: "t".into(),
            description: String::new(),
            mime_type: "image/png".into(),
            size_bytes: 10,
            protected,
        }
    }

    #[test]
    fn unprotected_files_visible_to_anonymous() {
        let policy = ProtectedFilePolicy;
        assert!(policy.can_view(&Actor::anonymous(), &file(false)));
    }

    #[test]
    fn protected_files_require_identity() {
        let policy = ProtectedFilePolicy;
        assert!(!policy.can_view(&Actor::anonymous(), &file(true)));
        assert!(policy.can_view(&Actor::user(3), &file(true)));
    }
}
