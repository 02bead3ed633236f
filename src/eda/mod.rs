//! Analysis orchestration over the researcher service
//!
//! Coordinates the request lifecycle for exploratory-data-analysis
//! calls: gating on an active research session, tracking
//! loading/error/result state, and dispatching each request kind to the
//! matching API operation.

pub mod orchestrator;
pub mod types;

pub use orchestrator::{AnalysisPhase, AnalysisSnapshot, EdaController};
pub use types::{
    AnalysisKind, AnalysisOutput, AnalysisRequest, BoxPlot, Correlation, CorrelationPair, GroupBy,
    GroupStat, Histogram, HistogramBin, MissingAnalysis, Outliers, Percentiles, Report, Scatter,
    ScatterPoint, SegmentRule, Segmentation, SummaryStats, TimeSeriesPoint, TimeTrend, TimeUnit,
    UniqueValue, UniqueValues,
};
