//! zipdelta Core Library
//!
//! This crate provides the types and error handling shared by the
//! archive reader, the comparison engine and the command-line front end.

pub mod error;
pub mod types;

pub use error::{Error, Result, ResultExt};
pub use types::*;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::error::{Error, Result, ResultExt};
    pub use crate::types::*;
}
