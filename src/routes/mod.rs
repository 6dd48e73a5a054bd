//! Routes for [axum::Router].

pub mod dispatch;
pub mod fallback;
pub mod health;
pub mod ping;
pub mod verify;
