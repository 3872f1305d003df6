//! Domain types and shared utilities for meter consumption reporting.
//!
//! Devices, readings, reporting periods and the report shape live in
//! [`models`]; everything else here is supporting code used by both the
//! data layer and the command-line front end.

pub mod calculations;
pub mod error;
pub mod formatting;
pub mod models;
pub mod period;
pub mod settings;
pub mod time_utils;

pub use error::{MeterError, Result};
