/// Authentication module
///
/// JWT issuance and validation, password hashing, the token lifecycle
/// manager and role-based access control.

pub mod claims;
pub mod jwt;
pub mod password;
pub mod roles;
pub mod session;

pub use claims::Claims;
pub use jwt::decode_token;
pub use jwt::generate_access_token;
pub use jwt::generate_refresh_token;
pub use password::hash_password;
pub use password::verify_password;
pub use roles::require_role;
pub use roles::CurrentUser;
pub use roles::HasRole;
pub use session::AccessToken;
pub use session::RevocationStore;
pub use session::RoleLookup;
pub use session::SessionManager;
pub use session::TokenPair;
pub use session::UserLookup;
