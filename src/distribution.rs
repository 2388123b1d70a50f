use crate::models::{
    BreakdownEntry, NetworkDistribution, NetworkGroupSummary, NetworkOwner, RawActivityCount,
};

/// Splits pre-aggregated activity counts into the two network-owner groups
/// and computes each group's percentage breakdown of recurrence cases.
///
/// This is a reporting summarizer: it never fails. Rows with an owner label
/// that is neither ENTEL nor ONNET are dropped, a group with zero recurrence
/// cases gets 0.0 shares instead of NaN, and an empty input produces two
/// empty summaries. Both group keys are always present in the output.
pub fn summarize(rows: &[RawActivityCount]) -> NetworkDistribution {
    let mut entel = GroupAccumulator::default();
    let mut onnet = GroupAccumulator::default();

    for row in rows {
        let group = match NetworkOwner::from_label(&row.network_owner) {
            Some(NetworkOwner::Entel) => &mut entel,
            Some(NetworkOwner::Onnet) => &mut onnet,
            None => continue,
        };

        group.total_activities += row.total_completed;

        if row.total_recurrences > 0 {
            group.total_recurrences += row.total_recurrences;
            group.entries.push(BreakdownEntry {
                activity_type: row.activity_type.clone(),
                case_count: row.total_recurrences,
                share_of_group: 0.0,
            });
        }
    }

    NetworkDistribution {
        entel: entel.into_summary(),
        onnet: onnet.into_summary(),
    }
}

#[derive(Default)]
struct GroupAccumulator {
    total_activities: i64,
    total_recurrences: i64,
    entries: Vec<BreakdownEntry>,
}

impl GroupAccumulator {
    fn into_summary(mut self) -> NetworkGroupSummary {
        for entry in self.entries.iter_mut() {
            entry.share_of_group = if self.total_recurrences > 0 {
                entry.case_count as f64 * 100.0 / self.total_recurrences as f64
            } else {
                0.0
            };
        }

        NetworkGroupSummary {
            total_activities: self.total_activities,
            breakdown: self.entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(owner: &str, activity_type: &str, recurrences: i64, completed: i64) -> RawActivityCount {
        RawActivityCount {
            network_owner: owner.to_string(),
            activity_type: activity_type.to_string(),
            total_recurrences: recurrences,
            total_completed: completed,
        }
    }

    #[test]
    fn splits_groups_and_computes_shares() {
        let rows = vec![
            row("ENTEL", "Reparación", 3, 50),
            row("ENTEL", "Instalación", 1, 20),
            row("ONNET", "Reparación", 0, 10),
        ];

        let dist = summarize(&rows);

        assert_eq!(dist.entel.total_activities, 70);
        assert_eq!(dist.entel.breakdown.len(), 2);
        assert_eq!(dist.entel.breakdown[0].activity_type, "Reparación");
        assert_eq!(dist.entel.breakdown[0].case_count, 3);
        assert!((dist.entel.breakdown[0].share_of_group - 75.0).abs() < 1e-9);
        assert!((dist.entel.breakdown[1].share_of_group - 25.0).abs() < 1e-9);

        assert_eq!(dist.onnet.total_activities, 10);
        assert!(dist.onnet.breakdown.is_empty());
    }

    #[test]
    fn shares_sum_to_one_hundred() {
        let rows = vec![
            row("ONNET", "Reparación", 7, 40),
            row("ONNET", "Instalación", 2, 15),
            row("ONNET", "Certificación", 5, 30),
        ];

        let dist = summarize(&rows);
        let total: f64 = dist.onnet.breakdown.iter().map(|e| e.share_of_group).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn zero_recurrence_group_keeps_totals_and_empty_breakdown() {
        let rows = vec![row("ENTEL", "Instalación", 0, 12), row("ENTEL", "Reparación", 0, 8)];

        let dist = summarize(&rows);
        assert_eq!(dist.entel.total_activities, 20);
        assert!(dist.entel.breakdown.is_empty());
        assert!(dist.entel.breakdown.iter().all(|e| e.share_of_group == 0.0));
    }

    #[test]
    fn unknown_owner_rows_are_dropped() {
        let rows = vec![
            row("ENTEL", "Reparación", 2, 10),
            row("MOVISTAR", "Reparación", 9, 99),
        ];

        let dist = summarize(&rows);
        assert_eq!(dist.entel.total_activities, 10);
        assert_eq!(dist.entel.breakdown.len(), 1);
        assert!((dist.entel.breakdown[0].share_of_group - 100.0).abs() < 1e-9);
        assert_eq!(dist.onnet.total_activities, 0);
    }

    #[test]
    fn owner_labels_match_case_insensitively() {
        let rows = vec![row("entel", "Reparación", 1, 5), row(" Onnet ", "Reparación", 2, 6)];

        let dist = summarize(&rows);
        assert_eq!(dist.entel.total_activities, 5);
        assert_eq!(dist.onnet.total_activities, 6);
    }

    #[test]
    fn empty_input_yields_both_groups_zeroed() {
        let dist = summarize(&[]);
        assert_eq!(dist.entel.total_activities, 0);
        assert!(dist.entel.breakdown.is_empty());
        assert_eq!(dist.onnet.total_activities, 0);
        assert!(dist.onnet.breakdown.is_empty());
    }

    #[test]
    fn total_activities_counts_rows_without_recurrences() {
        let rows = vec![
            row("ENTEL", "Instalación", 0, 30),
            row("ENTEL", "Reparación", 4, 25),
        ];

        let dist = summarize(&rows);
        assert_eq!(dist.entel.total_activities, 55);
        assert_eq!(dist.entel.breakdown.len(), 1);
    }

    #[test]
    fn duplicate_activity_types_stay_separate_entries() {
        // Upstream queries are expected to pre-aggregate, but when they do
        // not, each row keeps its own breakdown entry.
        let rows = vec![
            row("ENTEL", "Reparación", 2, 10),
            row("ENTEL", "Reparación", 2, 10),
        ];

        let dist = summarize(&rows);
        assert_eq!(dist.entel.breakdown.len(), 2);
        assert!((dist.entel.breakdown[0].share_of_group - 50.0).abs() < 1e-9);
        assert!((dist.entel.breakdown[1].share_of_group - 50.0).abs() < 1e-9);
    }

    #[test]
    fn tolerates_recurrences_above_completed() {
        let rows = vec![row("ONNET", "Reparación", 12, 4)];

        let dist = summarize(&rows);
        assert_eq!(dist.onnet.total_activities, 4);
        assert_eq!(dist.onnet.breakdown[0].case_count, 12);
        assert!((dist.onnet.breakdown[0].share_of_group - 100.0).abs() < 1e-9);
    }
}
