pub mod auth;
pub mod graphql;
pub mod health;
pub mod media;

pub use auth::{login, logout, signup};
pub use health::check;
