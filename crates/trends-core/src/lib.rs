//! Core types for the trends seasonality workspace.
//!
//! Holds the time-series and aggregate data model, the error taxonomy,
//! CLI settings, and the date and number helpers shared by the ingestion
//! and aggregation layers.

pub mod dates;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;

pub use error::{Result, SeasonalityError};
