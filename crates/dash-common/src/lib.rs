//! Shared types and utilities for the code checker and trading dashboard.
//!
//! This crate contains:
//! - Generic `{success, msg, data}` response helpers and the API error body
//! - ClickHouse client wrapper used to persist engine bars
//! - Schema definitions

pub mod clickhouse;
pub mod response;
pub mod types;

pub use clickhouse::{ClickHouseClient, ClickHouseConfig, ClickHouseError};
pub use response::{ApiError, ApiResponse};
pub use types::*;
