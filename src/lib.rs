//! Client for the AutoMerge AI service.
//!
//! The remote API owns all state; this crate resolves who the user is, talks
//! to the API through the [`gateway::Gateway`] trait and keeps the small amount
//! of view state a dashboard needs (the filtered issue list and the fixes of
//! the issue on screen).

pub mod config;
pub mod dashboard;
pub mod errors;
pub mod filter;
pub mod fixes;
pub mod gateway;
pub mod models;
pub mod session;
pub mod ui;

pub use errors::{FixError, GatewayError, SessionError};
