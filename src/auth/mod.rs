mod crypto;
mod db;
mod extractor;
mod middleware;

pub use crypto::{hash_password, verify_password};
pub use db::{create_session, get_user_from_token};
pub use extractor::{AuthUser, MaybeAuthUser};
pub use middleware::require_auth;
