// handlers/public/mod.rs - Handlers reachable without a token

pub mod auth;
pub mod health;
pub mod users;
