//! socialgraph - a social-networking backend
//!
//! Users, symmetric friendships and cookie sessions, served over GraphQL
//! with a small REST surface for signup, login and avatar uploads.

pub mod api;
pub mod config;
pub mod core;
pub mod storage;
pub mod utils;
