//! Azure Resource Manager access.
//!
//! This module handles all Azure-related operations:
//! - [`auth`] - Service principal token acquisition
//! - [`arm`] - REST client implementing [`crate::cloud::CloudApi`]
//! - [`lro`] - Long-running operation polling decisions
//! - [`wire`] - ARM JSON request and response shapes

mod arm;
mod auth;
pub mod lro;
mod wire;

// Re-export public types and functions
pub use arm::ArmClient;
pub use auth::ServicePrincipal;
