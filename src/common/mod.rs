//! Common types, traits, and error definitions for nh_planning
//!
//! This module provides the foundational building blocks shared by the
//! planners and the map collaborators.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
