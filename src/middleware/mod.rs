mod auth;
mod error_handler;
mod rate_limit;
mod session;

pub use auth::require_login;
pub use error_handler::log_errors;
pub use rate_limit::{RateLimiter, client_ip, rate_limit};
pub use session::{SESSION_COOKIE, SessionHandle, session_layer};
