//! Runtime layer for trends seasonality analysis.
//!
//! Owns the analysis session state and the optional, failure-tolerant
//! insight enhancement step.

pub mod enhancer;
pub mod session;

pub use trends_core as core;
pub use trends_data as data;
