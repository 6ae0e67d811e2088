//! Permission and role name constants for the ContactHub API.
//!
//! Permissions have the form `resource:action`. [`WILDCARD`] grants everything.
//!
//! # Example
//!
//! ```ignore
//! use contacthub_core::permissions;
//!
//! if policy.has_permission(&identity.role, permissions::CONTACTS_ASSIGN) {
//!     // Reassign the contact
//! }
//! ```

/// Grants every permission.
pub const WILDCARD: &str = "*";

// =============================================================================
// Roles
// =============================================================================

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_HR_MANAGER: &str = "hr_manager";
pub const ROLE_EDITOR: &str = "editor";
pub const ROLE_CONTENT_WRITER: &str = "content_writer";

/// Roles known to the built-in policy.
pub const BUILTIN_ROLES: [&str; 4] = [ROLE_ADMIN, ROLE_HR_MANAGER, ROLE_EDITOR, ROLE_CONTENT_WRITER];

// =============================================================================
// Contacts permissions
// =============================================================================

/// Permission to read contacts
pub const CONTACTS_READ: &str = "contacts:read";
/// Permission to create contacts
pub const CONTACTS_WRITE: &str = "contacts:write";
/// Permission to update contacts
pub const CONTACTS_UPDATE: &str = "contacts:update";
/// Permission to assign contacts to a team member
pub const CONTACTS_ASSIGN: &str = "contacts:assign";

// =============================================================================
// Activities permissions
// =============================================================================

pub const ACTIVITIES_READ: &str = "activities:read";
pub const ACTIVITIES_WRITE: &str = "activities:write";

// =============================================================================
// Search, analytics and bulk permissions
// =============================================================================

pub const SEARCH_READ: &str = "search:read";
pub const SEARCH_WRITE: &str = "search:write";
pub const ANALYTICS_READ: &str = "analytics:read";
pub const BULK_READ: &str = "bulk:read";
pub const BULK_WRITE: &str = "bulk:write";

// =============================================================================
// Blog permissions
// =============================================================================

pub const BLOGS_READ: &str = "blogs:read";
pub const BLOGS_WRITE: &str = "blogs:write";

/// Permissions of the `hr_manager` role.
pub const HR_MANAGER_PERMISSIONS: &[&str] = &[
    CONTACTS_READ,
    CONTACTS_WRITE,
    CONTACTS_UPDATE,
    CONTACTS_ASSIGN,
    ACTIVITIES_READ,
    ACTIVITIES_WRITE,
    ANALYTICS_READ,
    SEARCH_READ,
    SEARCH_WRITE,
    BULK_READ,
    BULK_WRITE,
];

/// Permissions of the `editor` role.
pub const EDITOR_PERMISSIONS: &[&str] = &[
    CONTACTS_READ,
    CONTACTS_WRITE,
    CONTACTS_UPDATE,
    ACTIVITIES_READ,
    ACTIVITIES_WRITE,
    SEARCH_READ,
    SEARCH_WRITE,
    BLOGS_READ,
    BLOGS_WRITE,
];

/// Permissions of the `content_writer` role.
pub const CONTENT_WRITER_PERMISSIONS: &[&str] = &[
    CONTACTS_READ,
    ACTIVITIES_READ,
    SEARCH_READ,
    BLOGS_READ,
    BLOGS_WRITE,
];

/// Whether `name` is a well-formed permission: `*` or `resource:action`, lowercase segments.
pub fn is_valid_permission(name: &str) -> bool {
    if name == WILDCARD {
        return true;
    }
    match name.split_once(':') {
        Some((resource, action)) => is_valid_segment(resource) && is_valid_segment(action),
        None => false,
    }
}

/// Whether `name` is a well-formed role name (`[a-z_]+`).
pub fn is_valid_role_name(name: &str) -> bool {
    is_valid_segment(name)
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c.is_ascii_lowercase() || c == '_')
}
