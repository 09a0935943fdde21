//! API exposures
//!
//! Each exposure consumes a `ProcessHost` and produces a Router for its
//! protocol.

pub mod rest;

pub use rest::RestExposure;
