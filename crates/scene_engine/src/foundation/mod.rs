//! Foundation utilities shared by every other module

pub mod logging;
pub mod math;
pub mod time;
