use std::collections::HashMap;

use crate::models::{EntityMetricSet, MetricDirection, ScoredEntity};

/// Per-metric weight configuration for the composite score. Metrics without
/// an explicit weight count at 1.0, so out of the box every available
/// quality rate weighs the same for companies and technicians alike.
#[derive(Debug, Clone, Default)]
pub struct ScoreWeights {
    by_metric: HashMap<String, f64>,
}

impl ScoreWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, metric: &str, weight: f64) {
        self.by_metric.insert(metric.to_string(), weight);
    }

    pub fn weight_for(&self, metric: &str) -> f64 {
        self.by_metric.get(metric).copied().unwrap_or(1.0)
    }

    /// Parses a repeatable `name=value` CLI argument.
    pub fn parse_override(raw: &str) -> anyhow::Result<(String, f64)> {
        let (name, value) = raw
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("expected name=value, got {raw:?}"))?;
        let weight: f64 = value
            .parse()
            .map_err(|_| anyhow::anyhow!("weight for {name:?} is not a number: {value:?}"))?;
        Ok((name.to_string(), weight))
    }
}

/// Combines each entity's quality rates into one comparable number and
/// returns the entities sorted descending by that score.
///
/// Good rates (certification) add `value * weight`, bad rates (recurrence,
/// early failure) subtract it. A rate with no denominator (`None`) adds
/// nothing at all, so data-sparse entities rank neutrally instead of being
/// punished or flattered; an entity with no usable rates scores 0.0 and is
/// still ranked. Volume counters ride along untouched for display.
///
/// The sort is stable, so equal scores keep the caller's input order, and
/// `rank_position` is a dense 1-based sequence over the sorted output.
pub fn rank(entities: &[EntityMetricSet], weights: &ScoreWeights) -> Vec<ScoredEntity> {
    let mut scored: Vec<ScoredEntity> = entities
        .iter()
        .map(|entity| ScoredEntity {
            entity_id: entity.entity_id.clone(),
            final_score: composite_score(entity, weights),
            rank_position: 0,
            volume_metrics: entity.volume_metrics.clone(),
            quality_metrics: entity.quality_metrics.clone(),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for (index, entity) in scored.iter_mut().enumerate() {
        entity.rank_position = index + 1;
    }

    scored
}

fn composite_score(entity: &EntityMetricSet, weights: &ScoreWeights) -> f64 {
    entity
        .quality_metrics
        .iter()
        .filter_map(|metric| {
            let value = metric.value?;
            let weighted = value * weights.weight_for(&metric.name);
            Some(match metric.direction {
                MetricDirection::HigherIsBetter => weighted,
                MetricDirection::HigherIsWorse => -weighted,
            })
        })
        .sum()
}
