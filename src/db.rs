use anyhow::Context;
use chrono::{Duration, NaiveDate, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    EntityMetricSet, MetricDirection, QualityMetric, RawActivityCount, VolumeMetric,
    WeeklyActivity,
};

/// Which failure counter a distribution query aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionMetric {
    Recurrence,
    EarlyFailure,
}

/// Which entity column a ranking query groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingLevel {
    Company,
    Technician,
}

pub fn cutoff_date(since_days: i64) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(since_days.max(1))
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let activities = vec![
        ("seed-001", "Norte Instalaciones SpA", "Marcela Fuentes", "ENTEL", "Instalación", false, false, None, (2026, 8, 3)),
        ("seed-002", "Norte Instalaciones SpA", "Marcela Fuentes", "ENTEL", "Instalación", true, true, None, (2026, 8, 5)),
        ("seed-003", "Norte Instalaciones SpA", "Diego Salas", "ENTEL", "Reparación", false, false, Some(true), (2026, 8, 6)),
        ("seed-004", "Norte Instalaciones SpA", "Diego Salas", "ONNET", "Reparación", true, false, Some(false), (2026, 8, 10)),
        ("seed-005", "Redes del Sur Ltda", "Camila Rojas", "ONNET", "Instalación", false, false, None, (2026, 8, 4)),
        ("seed-006", "Redes del Sur Ltda", "Camila Rojas", "ONNET", "Instalación", false, false, None, (2026, 8, 11)),
        ("seed-007", "Redes del Sur Ltda", "Pablo Vidal", "ENTEL", "Reparación", false, false, Some(true), (2026, 8, 12)),
        ("seed-008", "Redes del Sur Ltda", "Pablo Vidal", "ENTEL", "Reparación", true, false, Some(true), (2026, 8, 18)),
        ("seed-009", "Conecta Austral", "Valentina Soto", "ENTEL", "Instalación", false, false, None, (2026, 8, 13)),
        ("seed-010", "Conecta Austral", "Valentina Soto", "ONNET", "Reparación", false, false, Some(true), (2026, 8, 19)),
        ("seed-011", "Conecta Austral", "Ignacio Paredes", "ONNET", "Certificación", false, false, None, (2026, 8, 20)),
        ("seed-012", "Conecta Austral", "Ignacio Paredes", "ENTEL", "Instalación", true, false, None, (2026, 8, 24)),
    ];

    for (source_key, company, technician, owner, activity_type, recurrence, early_failure, certified, (y, m, d)) in activities {
        let completed_at = NaiveDate::from_ymd_opt(y, m, d).context("invalid date")?;

        sqlx::query(
            r#"
            INSERT INTO fieldops.activities
            (id, company, technician, network_owner, activity_type,
             completed_at, recurrence, early_failure, certified, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(company)
        .bind(technician)
        .bind(owner)
        .bind(activity_type)
        .bind(completed_at)
        .bind(recurrence)
        .bind(early_failure)
        .bind(certified)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        company: String,
        technician: String,
        network_owner: String,
        activity_type: String,
        completed_at: NaiveDate,
        recurrence: bool,
        early_failure: bool,
        certified: Option<bool>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO fieldops.activities
            (id, company, technician, network_owner, activity_type,
             completed_at, recurrence, early_failure, certified, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.company)
        .bind(&row.technician)
        .bind(&row.network_owner)
        .bind(&row.activity_type)
        .bind(row.completed_at)
        .bind(row.recurrence)
        .bind(row.early_failure)
        .bind(row.certified)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

/// Pre-aggregated failure counts per (network owner, activity type), the
/// input shape the distribution summarizer expects.
pub async fn fetch_activity_counts(
    pool: &PgPool,
    metric: DistributionMetric,
    since_date: NaiveDate,
    owner: Option<&str>,
) -> anyhow::Result<Vec<RawActivityCount>> {
    let failure_column = match metric {
        DistributionMetric::Recurrence => "recurrence",
        DistributionMetric::EarlyFailure => "early_failure",
    };

    let mut query = format!(
        "SELECT network_owner, activity_type, \
         COUNT(*) FILTER (WHERE {failure_column}) AS total_recurrences, \
         COUNT(*) AS total_completed \
         FROM fieldops.activities \
         WHERE completed_at >= $1",
    );

    if owner.is_some() {
        query.push_str(" AND network_owner = $2");
    }
    query.push_str(" GROUP BY network_owner, activity_type ORDER BY network_owner, activity_type");

    let mut rows = sqlx::query(&query).bind(since_date);
    if let Some(value) = owner {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut counts = Vec::new();

    for row in records {
        counts.push(RawActivityCount {
            network_owner: row.get("network_owner"),
            activity_type: row.get("activity_type"),
            total_recurrences: row.get("total_recurrences"),
            total_completed: row.get("total_completed"),
        });
    }

    Ok(counts)
}

/// Per-entity metric sets for the ranking views. Rows come back ordered by
/// entity name so the scorer's stable tie-break has a fixed order to keep.
pub async fn fetch_entity_metrics(
    pool: &PgPool,
    level: RankingLevel,
    since_date: NaiveDate,
) -> anyhow::Result<Vec<EntityMetricSet>> {
    let entity_column = match level {
        RankingLevel::Company => "company",
        RankingLevel::Technician => "technician",
    };

    let query = format!(
        "SELECT {entity_column} AS entity_id, \
         COUNT(*) FILTER (WHERE activity_type = 'Instalación') AS installations, \
         COUNT(*) FILTER (WHERE activity_type = 'Reparación') AS repairs, \
         COUNT(*) AS completed, \
         COUNT(*) FILTER (WHERE recurrence) AS recurrence_cases, \
         COUNT(*) FILTER (WHERE early_failure AND activity_type = 'Instalación') AS early_failures, \
         COUNT(*) FILTER (WHERE certified AND activity_type = 'Reparación') AS certified_repairs, \
         COUNT(*) FILTER (WHERE certified IS NOT NULL AND activity_type = 'Reparación') AS certifiable_repairs \
         FROM fieldops.activities \
         WHERE completed_at >= $1 \
         GROUP BY {entity_column} \
         ORDER BY {entity_column}",
    );

    let records = sqlx::query(&query).bind(since_date).fetch_all(pool).await?;
    let mut entities = Vec::new();

    for row in records {
        let installations: i64 = row.get("installations");
        let repairs: i64 = row.get("repairs");
        let completed: i64 = row.get("completed");
        let recurrence_cases: i64 = row.get("recurrence_cases");
        let early_failures: i64 = row.get("early_failures");
        let certified_repairs: i64 = row.get("certified_repairs");
        let certifiable_repairs: i64 = row.get("certifiable_repairs");

        entities.push(EntityMetricSet {
            entity_id: row.get("entity_id"),
            volume_metrics: vec![
                VolumeMetric {
                    name: "instalaciones".to_string(),
                    count: installations,
                },
                VolumeMetric {
                    name: "reparaciones".to_string(),
                    count: repairs,
                },
            ],
            quality_metrics: vec![
                QualityMetric {
                    name: "recurrencia".to_string(),
                    direction: MetricDirection::HigherIsWorse,
                    value: percentage(recurrence_cases, completed),
                },
                QualityMetric {
                    name: "falla_temprana".to_string(),
                    direction: MetricDirection::HigherIsWorse,
                    value: percentage(early_failures, installations),
                },
                QualityMetric {
                    name: "certificacion".to_string(),
                    direction: MetricDirection::HigherIsBetter,
                    value: percentage(certified_repairs, certifiable_repairs),
                },
            ],
        });
    }

    Ok(entities)
}

pub async fn fetch_weekly_activity(
    pool: &PgPool,
    since_date: NaiveDate,
) -> anyhow::Result<Vec<WeeklyActivity>> {
    let records = sqlx::query(
        "SELECT date_trunc('week', completed_at)::date AS week_start, \
         COUNT(*) AS completed, \
         COUNT(*) FILTER (WHERE recurrence) AS recurrences, \
         COUNT(DISTINCT technician) AS technician_count \
         FROM fieldops.activities \
         WHERE completed_at >= $1 \
         GROUP BY week_start \
         ORDER BY week_start",
    )
    .bind(since_date)
    .fetch_all(pool)
    .await?;

    let mut weeks = Vec::new();
    for row in records {
        weeks.push(WeeklyActivity {
            week_start: row.get("week_start"),
            completed: row.get("completed"),
            recurrences: row.get("recurrences"),
            technician_count: row.get("technician_count"),
        });
    }

    Ok(weeks)
}

/// `None` when there is no denominator, so a missing rate stays missing
/// instead of masquerading as 0%.
fn percentage(numerator: i64, denominator: i64) -> Option<f64> {
    if denominator > 0 {
        Some(numerator as f64 * 100.0 / denominator as f64)
    } else {
        None
    }
}
