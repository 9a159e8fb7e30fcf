//! API handlers.

pub mod health;
pub mod payments;
pub mod points;
pub mod readings;
pub mod users;
pub mod webhooks;
