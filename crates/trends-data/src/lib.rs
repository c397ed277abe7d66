//! Data layer for trends seasonality analysis.
//!
//! Validates and tokenizes uploaded Google Trends CSV exports, discovers
//! their schema, aggregates the resulting series into seasonal buckets,
//! synthesises template insights and writes JSON exports.

pub mod aggregator;
pub mod analysis;
pub mod export;
pub mod insights;
pub mod parser;
pub mod reader;

pub use trends_core as core;
