use std::fmt::Write;

use chrono::NaiveDate;

use crate::distribution;
use crate::models::{
    EntityMetricSet, NetworkDistribution, NetworkGroupSummary, QualityMetric, RawActivityCount,
    ScoredEntity, WeeklyActivity,
};
use crate::scoring::{self, ScoreWeights};

const RANKING_ROWS: usize = 10;

/// Assembles the markdown operations report. All one-decimal rounding of
/// percentages and scores happens here, never in the core functions.
pub fn build_report(
    since_days: i64,
    cutoff: NaiveDate,
    recurrence_counts: &[RawActivityCount],
    early_failure_counts: &[RawActivityCount],
    company_metrics: &[EntityMetricSet],
    technician_metrics: &[EntityMetricSet],
    trends: &[WeeklyActivity],
    weights: &ScoreWeights,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Field Operations KPI Report");
    let _ = writeln!(
        output,
        "Window: last {} days (activities since {})",
        since_days, cutoff
    );

    write_distribution_section(
        &mut output,
        "Recurrence Distribution",
        &distribution::summarize(recurrence_counts),
    );
    write_distribution_section(
        &mut output,
        "Early Failure Distribution",
        &distribution::summarize(early_failure_counts),
    );

    write_ranking_section(
        &mut output,
        "Company Ranking",
        &scoring::rank(company_metrics, weights),
    );
    write_ranking_section(
        &mut output,
        "Technician Ranking",
        &scoring::rank(technician_metrics, weights),
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weekly Trend");
    if trends.is_empty() {
        let _ = writeln!(output, "No completed activities in this window.");
    } else {
        for week in trends {
            let _ = writeln!(
                output,
                "- Week of {}: {} completed, {} recurrences, {} technicians active",
                week.week_start, week.completed, week.recurrences, week.technician_count
            );
        }
    }

    output
}

fn write_distribution_section(output: &mut String, title: &str, dist: &NetworkDistribution) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## {title}");
    write_group(output, "ENTEL", &dist.entel);
    write_group(output, "ONNET", &dist.onnet);
}

fn write_group(output: &mut String, owner: &str, group: &NetworkGroupSummary) {
    let _ = writeln!(
        output,
        "### {} ({} activities)",
        owner, group.total_activities
    );

    if group.breakdown.is_empty() {
        let _ = writeln!(output, "No cases in this window.");
        return;
    }

    for entry in &group.breakdown {
        let _ = writeln!(
            output,
            "- {}: {} cases ({:.1}%)",
            entry.activity_type, entry.case_count, entry.share_of_group
        );
    }
}

fn write_ranking_section(output: &mut String, title: &str, ranked: &[ScoredEntity]) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## {title}");

    if ranked.is_empty() {
        let _ = writeln!(output, "No entities with activity in this window.");
        return;
    }

    for entity in ranked.iter().take(RANKING_ROWS) {
        let volumes = entity
            .volume_metrics
            .iter()
            .map(|v| format!("{} {}", v.name, v.count))
            .collect::<Vec<_>>()
            .join(", ");
        let rates = entity
            .quality_metrics
            .iter()
            .map(format_quality)
            .collect::<Vec<_>>()
            .join(", ");

        let _ = writeln!(
            output,
            "{}. {} — score {:.1} ({volumes}; {rates})",
            entity.rank_position, entity.entity_id, entity.final_score
        );
    }
}

fn format_quality(metric: &QualityMetric) -> String {
    match metric.value {
        Some(value) => format!("{} {:.1}%", metric.name, value),
        None => format!("{} s/d", metric.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MetricDirection, VolumeMetric};

    fn count(owner: &str, activity_type: &str, recurrences: i64, completed: i64) -> RawActivityCount {
        RawActivityCount {
            network_owner: owner.to_string(),
            activity_type: activity_type.to_string(),
            total_recurrences: recurrences,
            total_completed: completed,
        }
    }

    fn company(id: &str, certification: Option<f64>) -> EntityMetricSet {
        EntityMetricSet {
            entity_id: id.to_string(),
            volume_metrics: vec![VolumeMetric {
                name: "instalaciones".to_string(),
                count: 40,
            }],
            quality_metrics: vec![QualityMetric {
                name: "certificacion".to_string(),
                direction: MetricDirection::HigherIsBetter,
                value: certification,
            }],
        }
    }

    #[test]
    fn report_rounds_shares_and_scores_to_one_decimal() {
        let recurrences = vec![
            count("ENTEL", "Reparación", 2, 50),
            count("ENTEL", "Instalación", 1, 20),
        ];
        let companies = vec![company("Norte Instalaciones SpA", Some(66.666_666))];

        let report = build_report(
            30,
            NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            &recurrences,
            &[],
            &companies,
            &[],
            &[],
            &ScoreWeights::new(),
        );

        assert!(report.contains("- Reparación: 2 cases (66.7%)"));
        assert!(report.contains("- Instalación: 1 cases (33.3%)"));
        assert!(report.contains("1. Norte Instalaciones SpA — score 66.7"));
    }

    #[test]
    fn missing_rates_render_as_no_data() {
        let companies = vec![company("Conecta Austral", None)];

        let report = build_report(
            30,
            NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            &[],
            &[],
            &companies,
            &[],
            &[],
            &ScoreWeights::new(),
        );

        assert!(report.contains("certificacion s/d"));
        assert!(report.contains("score 0.0"));
    }

    #[test]
    fn empty_window_uses_fallback_lines() {
        let report = build_report(
            30,
            NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            &[],
            &[],
            &[],
            &[],
            &[],
            &ScoreWeights::new(),
        );

        assert!(report.contains("No cases in this window."));
        assert!(report.contains("No entities with activity in this window."));
        assert!(report.contains("No completed activities in this window."));
    }

    #[test]
    fn weekly_trend_lists_each_week() {
        let trends = vec![WeeklyActivity {
            week_start: NaiveDate::from_ymd_opt(2026, 8, 17).unwrap(),
            completed: 14,
            recurrences: 2,
            technician_count: 5,
        }];

        let report = build_report(
            14,
            NaiveDate::from_ymd_opt(2026, 8, 16).unwrap(),
            &[],
            &[],
            &[],
            &[],
            &trends,
            &ScoreWeights::new(),
        );

        assert!(report
            .contains("- Week of 2026-08-17: 14 completed, 2 recurrences, 5 technicians active"));
    }
}
