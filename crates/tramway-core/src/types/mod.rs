//! Type system utilities and aliases.
//!
//! ## Modules
//!
//! - [`aliases`]: Shared cable and hub handles, `Arc<Mutex<T>>`

pub mod aliases;

pub use aliases::*;
