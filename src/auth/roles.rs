/// Role-based access control
///
/// Authorization is a single check against a role name. The gate is
/// written against the `HasRole` trait rather than a concrete user type,
/// so it works the same whether roles come from a foreign-keyed role
/// table or a plain boolean flag on the principal.

use crate::error::AuthError;
use crate::repository::users::User;

/// A principal that can answer whether it holds a named role.
pub trait HasRole {
    fn has_role(&self, role: &str) -> bool;
}

/// The authenticated principal attached to a request by the JWT
/// middleware: the resolved user record plus its role name.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub role_type: String,
}

impl HasRole for CurrentUser {
    fn has_role(&self, role: &str) -> bool {
        // Exact comparison; no role implies another
        self.role_type == role
    }
}

/// Pass the principal through if it holds `role`, otherwise reject.
pub fn require_role<P: HasRole>(principal: P, role: &str) -> Result<P, AuthError> {
    if principal.has_role(role) {
        Ok(principal)
    } else {
        Err(AuthError::Forbidden)
    }
}
