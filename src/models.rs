use chrono::NaiveDate;
use serde::Serialize;

/// One pre-aggregated row per (network owner, activity type) pair, as
/// returned by the reporting queries. The owner label is kept as the raw
/// string the query produced; routing to a known owner happens in the
/// summarizer so that an unexpected third value degrades to a dropped row
/// instead of a failed report.
#[derive(Debug, Clone)]
pub struct RawActivityCount {
    pub network_owner: String,
    pub activity_type: String,
    pub total_recurrences: i64,
    pub total_completed: i64,
}

/// The two fixed infrastructure ownership groups every activity is tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkOwner {
    Entel,
    Onnet,
}

impl NetworkOwner {
    /// Matches the externally supplied owner label. Anything else is `None`
    /// and the caller is expected to skip the row.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "ENTEL" => Some(NetworkOwner::Entel),
            "ONNET" => Some(NetworkOwner::Onnet),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BreakdownEntry {
    pub activity_type: String,
    pub case_count: i64,
    /// Share of the group's recurrence cases, 0..=100, full precision.
    pub share_of_group: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkGroupSummary {
    pub total_activities: i64,
    pub breakdown: Vec<BreakdownEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkDistribution {
    pub entel: NetworkGroupSummary,
    pub onnet: NetworkGroupSummary,
}

/// Whether a higher percentage is good or bad for the entity being scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricDirection {
    HigherIsBetter,
    HigherIsWorse,
}

/// Raw workload counter carried through to the output unweighted. Volume
/// columns sit next to the score in the ranking tables but never feed it.
#[derive(Debug, Clone, Serialize)]
pub struct VolumeMetric {
    pub name: String,
    pub count: i64,
}

/// A percentage-based quality rate. `value` is `None` when the entity has no
/// denominator for this metric (e.g. zero repairs, so no certification rate).
#[derive(Debug, Clone, Serialize)]
pub struct QualityMetric {
    pub name: String,
    pub direction: MetricDirection,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityMetricSet {
    pub entity_id: String,
    pub volume_metrics: Vec<VolumeMetric>,
    pub quality_metrics: Vec<QualityMetric>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredEntity {
    pub entity_id: String,
    pub final_score: f64,
    /// 1-based position after the descending sort. Dense, no shared ranks.
    pub rank_position: usize,
    pub volume_metrics: Vec<VolumeMetric>,
    pub quality_metrics: Vec<QualityMetric>,
}

#[derive(Debug, Clone)]
pub struct WeeklyActivity {
    pub week_start: NaiveDate,
    pub completed: i64,
    pub recurrences: i64,
    pub technician_count: i64,
}
