pub mod aggregate;
pub mod config;
pub mod country_series;
pub mod demographics;
pub mod distribute;
pub mod error;
pub mod filter;
pub mod geo;
pub mod global_series;
pub mod insight;
pub mod metric;
pub mod retention;
pub mod rng;
pub mod types;
pub mod world;

pub use aggregate::{Aggregator, DashboardView};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use filter::{Filter, FilterTokens};
pub use insight::{Insight, InsightEngine};
pub use world::GeneratedWorld;
