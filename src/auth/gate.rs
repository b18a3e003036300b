// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Permission step of the file request pipeline.
//!
//! Every file request passes three checks in order: the bearer token (the
//! [`Auth`](super::Auth) extractor), the permission for the action at the
//! target path (this module), and finally the storage layer's own path and
//! quota checks.

use super::AuthError;
use crate::policy::rules::{FILES_DELETE, FILES_UPLOAD, FILES_VIEW};
use crate::policy::PolicySnapshot;

/// A file operation subject to authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Upload,
    Delete,
    View,
}

impl FileAction {
    /// Permission key consulted for this action.
    pub fn permission_key(self) -> &'static str {
        match self {
            FileAction::Upload => FILES_UPLOAD,
            FileAction::Delete => FILES_DELETE,
            FileAction::View => FILES_VIEW,
        }
    }

    fn denial_message(self) -> &'static str {
        match self {
            FileAction::Upload => "You do not have permission to upload files to this directory.",
            FileAction::Delete => "You do not have permission to delete files in this directory.",
            FileAction::View => "You do not have permission to view this directory.",
        }
    }
}

/// Check that `role` may perform `action` on `path`.
pub fn authorize(
    policy: &PolicySnapshot,
    role: &str,
    action: FileAction,
    path: &str,
) -> Result<(), AuthError> {
    if policy.is_allowed(role, action.permission_key(), Some(path)) {
        Ok(())
    } else {
        tracing::warn!(role, ?action, path, "Permission denied");
        Err(AuthError::PermissionDenied(action.denial_message()))
    }
}
