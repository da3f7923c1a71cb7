//! Outer surfaces: the HTTP API and CSV reports.

pub mod csv;
pub mod http;
