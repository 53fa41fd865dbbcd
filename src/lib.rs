//! Paeshift client: shift-marketplace core.
//!
//! Role/status gating, form validation, and an action dispatcher that keeps
//! a local session in step with the remote marketplace API.

pub mod accounts;
pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod jobs;
pub mod session;
pub mod validation;
