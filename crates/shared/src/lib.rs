//! Shared types for the meetscan client and its remote services.

pub mod error;
pub mod models;
pub mod scan;

pub use error::*;
pub use models::*;
pub use scan::*;
