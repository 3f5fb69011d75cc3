//! Shared serde types for the Lumen journal backend: persistent models and
//! the REST request/response shapes. The wire format is camelCase JSON.

pub mod api;
pub mod models;
