//! # Security Module
//!
//! Permission checks run by a view before any argument is extracted.
//!
//! How a permission decides is up to the application; the view only asks
//! [`Permission::has_permission`] and answers `403` on the first refusal.
//! Permissions are declared on the view with
//! [`ViewBuilder::permission`](crate::dispatcher::ViewBuilder::permission) and
//! apply to every method of it, including handlers stacked with
//! [`ApiView::add`](crate::ApiView::add).
//!
//! ```rust
//! use speccify::security::Permission;
//! use speccify::ApiRequest;
//!
//! struct StaffOnly;
//!
//! impl Permission for StaffOnly {
//!     fn name(&self) -> &str {
//!         "StaffOnly"
//!     }
//!
//!     fn has_permission(&self, req: &ApiRequest) -> bool {
//!         req.get_header("x-role") == Some("staff")
//!     }
//! }
//! ```

mod api_key;

pub use api_key::ApiKeyPermission;

use crate::server::ApiRequest;

/// Predicate deciding whether a request may reach a view.
pub trait Permission: Send + Sync {
    /// Name listed under `x-permissions` in the generated schema.
    fn name(&self) -> &str;

    fn has_permission(&self, req: &ApiRequest) -> bool;
}

/// Lets every request through.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAny;

impl Permission for AllowAny {
    fn name(&self) -> &str {
        "AllowAny"
    }

    fn has_permission(&self, _req: &ApiRequest) -> bool {
        true
    }
}

/// Refuses every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl Permission for DenyAll {
    fn name(&self) -> &str {
        "DenyAll"
    }

    fn has_permission(&self, _req: &ApiRequest) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_permissions() {
        let req = ApiRequest::get("/");
        assert!(AllowAny.has_permission(&req));
        assert!(!DenyAll.has_permission(&req));
        assert_eq!(DenyAll.name(), "DenyAll");
    }
}
