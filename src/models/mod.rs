mod chart;
mod point;
mod timeframe;

pub use chart::{AssetMetric, ChartDefinition, Operator, SeriesSource, SpecialTransform};
pub use point::{normalize, Series, SeriesPoint};
pub use timeframe::Timeframe;
