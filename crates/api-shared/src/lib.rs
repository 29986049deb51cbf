//! # API Shared
//!
//! Shared utilities for CRS API boundaries.
//!
//! Contains:
//! - Request-context extraction (header-equivalent fields → authority candidate)
//! - Shared services like `HealthService`
//!
//! Any transport (today: REST) uses this crate so the contract of "what must
//! be present in a request" lives in exactly one place.

pub mod context;
pub mod health;

pub use health::{HealthRes, HealthService};
