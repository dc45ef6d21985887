//! Built-in functionality for tessera.
//!
//! The layout algorithms that monitors can select between.
pub mod layout;
