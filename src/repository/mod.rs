/// Persistence layer
///
/// One store per table, each a thin wrapper around the shared `PgPool`.
/// The stores also implement the lookup traits the session manager
/// depends on.

pub mod books;
pub mod roles;
pub mod users;

pub use books::{Book, BookStore};
pub use roles::{Role, RoleStore};
pub use users::{NewUser, User, UserStore};
