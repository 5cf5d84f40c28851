pub mod cookie;
pub mod session_manager;

pub use cookie::{CookieSigner, SessionCookie};
pub use session_manager::{SessionManager, DEFAULT_CLEANUP_INTERVAL, DEFAULT_SESSION_TTL};
