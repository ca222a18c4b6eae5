//! Wiring shared between the `relay` binary and its tests.

#![deny(unsafe_code)]

pub mod cli;
pub mod executor_factory;
