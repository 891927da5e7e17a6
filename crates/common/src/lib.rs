//! Common utilities and types shared across hostcheck components.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
