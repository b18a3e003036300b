// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer tokens and role-based authorization for the container API.
//!
//! ## Auth Flow
//!
//! 1. A client exchanges `{role, adminKey}` for an opaque token at
//!    `POST /api/auth/request-token`
//! 2. The client sends `Authorization: Bearer <token>` on every file request
//! 3. The server:
//!    - Resolves the token to its role (`Auth` extractor)
//!    - Checks the role's permission for the action at the target path
//!      against a freshly loaded policy (`gate::authorize`)
//!    - Hands the request to the quota-enforcing store
//!
//! ## Security
//!
//! - Token issuance always requires the shared admin key
//! - Admin key comparison is constant-time
//! - Tokens are held in memory only and do not survive a restart

pub mod error;
pub mod extractor;
pub mod gate;
pub mod permissions;
pub mod tokens;

pub use error::AuthError;
pub use extractor::{AdminOnly, Auth, AuthenticatedRole};
pub use gate::{authorize, FileAction};
pub use permissions::PermissionResolver;
pub use tokens::{TokenAuthority, TokenEntry, DEFAULT_ADMIN_KEY};
