//! chartgraph: derived chart series resolution engine
//!
//! Resolves an opaque chart id and a requested window to a time-ordered
//! numeric series by walking a DAG of chart definitions: leaves fetch from
//! upstream market/macro providers, derived nodes combine or transform
//! other chart series. One engine serves both the live rendering path and
//! the batch validation sweep.

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod providers;
pub mod resolver;
pub mod transforms;
pub mod window;

pub use catalog::ChartCatalog;
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use models::{ChartDefinition, Series, SeriesPoint, Timeframe};
pub use resolver::Resolver;
