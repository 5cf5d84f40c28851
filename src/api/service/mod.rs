pub mod authenticator;

pub use authenticator::{hash_password, Authenticator, PasswordAuthenticator};
