//! Scene-level integration tests

mod component_integration;
mod hierarchy_integration;
