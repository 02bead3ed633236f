//! Analysis request and result shapes
//!
//! Each analysis kind has its own parameter payload and output shape.
//! [`AnalysisRequest`] and [`AnalysisOutput`] are closed sum types over
//! the kinds, so dispatch is an exhaustive match rather than a runtime
//! switch on strings, and a result always knows which kind produced it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Default bin count for histogram requests
pub const DEFAULT_HISTOGRAM_BINS: u32 = 10;

/// Default percentile cut points
pub const DEFAULT_PERCENTILES: [f64; 4] = [25.0, 50.0, 75.0, 90.0];

/// Tag identifying an analysis kind; doubles as the view type of a
/// held result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Summary,
    Unique,
    Missing,
    Histogram,
    Boxplot,
    Percentiles,
    Correlation,
    Scatter,
    Groupby,
    Segment,
    Trend,
    Outliers,
    Report,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Summary => "summary",
            AnalysisKind::Unique => "unique",
            AnalysisKind::Missing => "missing",
            AnalysisKind::Histogram => "histogram",
            AnalysisKind::Boxplot => "boxplot",
            AnalysisKind::Percentiles => "percentiles",
            AnalysisKind::Correlation => "correlation",
            AnalysisKind::Scatter => "scatter",
            AnalysisKind::Groupby => "groupby",
            AnalysisKind::Segment => "segment",
            AnalysisKind::Trend => "trend",
            AnalysisKind::Outliers => "outliers",
            AnalysisKind::Report => "report",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregation granularity for time-trend analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl TimeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Day => "day",
            TimeUnit::Week => "week",
            TimeUnit::Month => "month",
            TimeUnit::Year => "year",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TimeUnit {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(TimeUnit::Day),
            "week" => Ok(TimeUnit::Week),
            "month" => Ok(TimeUnit::Month),
            "year" => Ok(TimeUnit::Year),
            other => Err(crate::error::Error::Validation(format!(
                "Unknown time unit '{other}'"
            ))),
        }
    }
}

/// One rule of a cohort segmentation, e.g. `age >= 65`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRule {
    pub column: String,
    pub operator: String,
    pub value: serde_json::Value,
}

/// A fully-parameterized analysis request against one dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisRequest {
    Summary {
        dataset_id: String,
        columns: Vec<String>,
    },
    Unique {
        dataset_id: String,
        column: String,
    },
    Missing {
        dataset_id: String,
        columns: Vec<String>,
    },
    Histogram {
        dataset_id: String,
        column: String,
        bins: u32,
    },
    Boxplot {
        dataset_id: String,
        column: String,
    },
    Percentiles {
        dataset_id: String,
        column: String,
        percentiles: Vec<f64>,
    },
    Correlation {
        dataset_id: String,
        columns: Vec<String>,
    },
    Scatter {
        dataset_id: String,
        x: String,
        y: String,
    },
    GroupBy {
        dataset_id: String,
        group_column: String,
        metric_column: String,
    },
    Segment {
        dataset_id: String,
        rules: Vec<SegmentRule>,
    },
    Trend {
        dataset_id: String,
        column: String,
        time_unit: TimeUnit,
    },
    Outliers {
        dataset_id: String,
        column: String,
    },
    Report {
        dataset_id: String,
        sections: Vec<String>,
    },
}

impl AnalysisRequest {
    /// Which kind of analysis this request performs
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisRequest::Summary { .. } => AnalysisKind::Summary,
            AnalysisRequest::Unique { .. } => AnalysisKind::Unique,
            AnalysisRequest::Missing { .. } => AnalysisKind::Missing,
            AnalysisRequest::Histogram { .. } => AnalysisKind::Histogram,
            AnalysisRequest::Boxplot { .. } => AnalysisKind::Boxplot,
            AnalysisRequest::Percentiles { .. } => AnalysisKind::Percentiles,
            AnalysisRequest::Correlation { .. } => AnalysisKind::Correlation,
            AnalysisRequest::Scatter { .. } => AnalysisKind::Scatter,
            AnalysisRequest::GroupBy { .. } => AnalysisKind::Groupby,
            AnalysisRequest::Segment { .. } => AnalysisKind::Segment,
            AnalysisRequest::Trend { .. } => AnalysisKind::Trend,
            AnalysisRequest::Outliers { .. } => AnalysisKind::Outliers,
            AnalysisRequest::Report { .. } => AnalysisKind::Report,
        }
    }

    /// Histogram request with the default bin count
    pub fn histogram(dataset_id: impl Into<String>, column: impl Into<String>) -> Self {
        AnalysisRequest::Histogram {
            dataset_id: dataset_id.into(),
            column: column.into(),
            bins: DEFAULT_HISTOGRAM_BINS,
        }
    }

    /// Percentiles request with the default cut points
    pub fn percentiles(dataset_id: impl Into<String>, column: impl Into<String>) -> Self {
        AnalysisRequest::Percentiles {
            dataset_id: dataset_id.into(),
            column: column.into(),
            percentiles: DEFAULT_PERCENTILES.to_vec(),
        }
    }

    /// Time-trend request with the default monthly granularity
    pub fn trend(dataset_id: impl Into<String>, column: impl Into<String>) -> Self {
        AnalysisRequest::Trend {
            dataset_id: dataset_id.into(),
            column: column.into(),
            time_unit: TimeUnit::default(),
        }
    }
}

// --- Output shapes ---

/// Per-column descriptive statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub column: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std_dev: Option<f64>,
    pub valid_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniqueValue {
    /// Cell values may be strings or numbers
    pub value: serde_json::Value,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniqueValues {
    pub unique_count: u64,
    pub top_values: Vec<UniqueValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingAnalysis {
    pub column: String,
    pub missing_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub range: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxPlot {
    pub median: f64,
    /// Lower and upper quartile bounds
    pub iqr: Vec<f64>,
    pub outlier_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub percentiles: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub x: String,
    pub y: String,
    pub strength: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub matrix: Vec<CorrelationPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x_bin: String,
    pub y_avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scatter {
    pub points: Vec<ScatterPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStat {
    /// Group labels may be strings or numbers
    pub group: serde_json::Value,
    pub mean: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBy {
    pub groups: Vec<GroupStat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segmentation {
    pub segment_size: u64,
    pub summary: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub time_period: String,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeTrend {
    pub series: Vec<TimeSeriesPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_changes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outliers {
    pub outlier_count: u64,
    /// Lower and upper bounds of the non-outlier range
    pub range: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub report_url: String,
}

/// The result of a settled analysis, tagged with its kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutput {
    Summary(Vec<SummaryStats>),
    Unique(UniqueValues),
    Missing(Vec<MissingAnalysis>),
    Histogram(Histogram),
    Boxplot(BoxPlot),
    Percentiles(Percentiles),
    Correlation(Correlation),
    Scatter(Scatter),
    GroupBy(GroupBy),
    Segment(Segmentation),
    Trend(TimeTrend),
    Outliers(Outliers),
    Report(Report),
}

impl AnalysisOutput {
    /// Which kind of analysis produced this output
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisOutput::Summary(_) => AnalysisKind::Summary,
            AnalysisOutput::Unique(_) => AnalysisKind::Unique,
            AnalysisOutput::Missing(_) => AnalysisKind::Missing,
            AnalysisOutput::Histogram(_) => AnalysisKind::Histogram,
            AnalysisOutput::Boxplot(_) => AnalysisKind::Boxplot,
            AnalysisOutput::Percentiles(_) => AnalysisKind::Percentiles,
            AnalysisOutput::Correlation(_) => AnalysisKind::Correlation,
            AnalysisOutput::Scatter(_) => AnalysisKind::Scatter,
            AnalysisOutput::GroupBy(_) => AnalysisKind::Groupby,
            AnalysisOutput::Segment(_) => AnalysisKind::Segment,
            AnalysisOutput::Trend(_) => AnalysisKind::Trend,
            AnalysisOutput::Outliers(_) => AnalysisKind::Outliers,
            AnalysisOutput::Report(_) => AnalysisKind::Report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_kind_tags() {
        let request = AnalysisRequest::histogram("ds1", "glucose_level");
        assert_eq!(request.kind(), AnalysisKind::Histogram);
        assert_eq!(request.kind().as_str(), "histogram");

        let request = AnalysisRequest::Scatter {
            dataset_id: "ds1".to_string(),
            x: "age".to_string(),
            y: "bp".to_string(),
        };
        assert_eq!(request.kind(), AnalysisKind::Scatter);
    }

    #[test]
    fn test_default_parameters() {
        match AnalysisRequest::histogram("ds1", "age") {
            AnalysisRequest::Histogram { bins, .. } => assert_eq!(bins, 10),
            _ => unreachable!("Expected histogram request"),
        }

        match AnalysisRequest::percentiles("ds1", "age") {
            AnalysisRequest::Percentiles { percentiles, .. } => {
                assert_eq!(percentiles, vec![25.0, 50.0, 75.0, 90.0]);
            }
            _ => unreachable!("Expected percentiles request"),
        }

        match AnalysisRequest::trend("ds1", "visit_date") {
            AnalysisRequest::Trend { time_unit, .. } => assert_eq!(time_unit, TimeUnit::Month),
            _ => unreachable!("Expected trend request"),
        }
    }

    #[test]
    fn test_output_kind_matches_payload() {
        let output = AnalysisOutput::Histogram(Histogram {
            bins: vec![HistogramBin {
                range: "0-10".to_string(),
                count: 3,
            }],
            narrative: Some("skewed".to_string()),
        });
        assert_eq!(output.kind(), AnalysisKind::Histogram);
    }

    #[test]
    fn test_histogram_output_parses_wire_shape() {
        let json = r#"{"bins":[{"range":"0-10","count":3}],"narrative":"skewed"}"#;
        let histogram: Histogram = serde_json::from_str(json).unwrap();
        assert_eq!(histogram.bins.len(), 1);
        assert_eq!(histogram.bins[0].range, "0-10");
        assert_eq!(histogram.bins[0].count, 3);
        assert_eq!(histogram.narrative.as_deref(), Some("skewed"));
    }

    #[test]
    fn test_summary_stats_allow_null_moments() {
        let json = r#"[{"column":"notes","min":null,"max":null,"mean":null,"median":null,"std_dev":null,"valid_count":0}]"#;
        let stats: Vec<SummaryStats> = serde_json::from_str(json).unwrap();
        assert_eq!(stats[0].column, "notes");
        assert!(stats[0].mean.is_none());
        assert_eq!(stats[0].valid_count, 0);
    }

    #[test]
    fn test_group_labels_may_be_numeric() {
        let json = r#"{"groups":[{"group":1,"mean":2.5,"count":4},{"group":"control","mean":1.0,"count":2}]}"#;
        let grouped: GroupBy = serde_json::from_str(json).unwrap();
        assert_eq!(grouped.groups.len(), 2);
        assert_eq!(grouped.groups[0].group, serde_json::json!(1));
        assert_eq!(grouped.groups[1].group, serde_json::json!("control"));
    }
}
