//! Advance Access Core Business Logic
//!
//! This crate provides the permission catalog aggregator, the role manager
//! and the user account manager. All durable state goes through the
//! `advance-db` store; no in-process mutable state is shared between calls.

pub mod accounts;
pub mod catalog;
pub mod error;
pub mod input;
pub mod roles;

pub use accounts::{AccountManager, LoginOutcome, Registration, UserPatch};
pub use catalog::{fold_catalog, ModulePermissions, PermissionCatalog, PermissionEntry};
pub use error::CoreError;
pub use input::{normalize_flag, parse_flag, parse_optional_id};
pub use roles::{CreateRole, RoleManager};
