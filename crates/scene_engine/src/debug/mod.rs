//! Debug tooling
//!
//! A line-oriented console for inspecting objects and editing component
//! attributes by name while a scene runs.

pub mod console;

pub use console::{Console, ConsoleError};
