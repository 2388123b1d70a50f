use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;

mod db;
mod distribution;
mod models;
mod report;
mod scoring;

use db::{DistributionMetric, RankingLevel};
use models::NetworkGroupSummary;
use scoring::ScoreWeights;

#[derive(Parser)]
#[command(name = "fieldops-kpi")]
#[command(about = "Operations KPI engine for field service companies and technicians", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    Recurrence,
    EarlyFailure,
}

#[derive(Clone, Copy, ValueEnum)]
enum LevelArg {
    Company,
    Technician,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import activities from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Failure-share breakdown per network owner
    Distribution {
        #[arg(long, value_enum, default_value_t = MetricArg::Recurrence)]
        metric: MetricArg,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long, default_value_t = 30)]
        since_days: i64,
        #[arg(long)]
        json: bool,
    },
    /// Composite-score ranking of companies or technicians
    Rank {
        #[arg(long, value_enum, default_value_t = LevelArg::Company)]
        level: LevelArg,
        #[arg(long, default_value_t = 30)]
        since_days: i64,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Per-metric weight override, e.g. --weight recurrencia=2.0
        #[arg(long = "weight")]
        weights: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value_t = 30)]
        since_days: i64,
        #[arg(long = "weight")]
        weights: Vec<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn build_weights(raw: &[String]) -> anyhow::Result<ScoreWeights> {
    let mut weights = ScoreWeights::new();
    for entry in raw {
        let (name, value) = ScoreWeights::parse_override(entry)?;
        weights.set(&name, value);
    }
    Ok(weights)
}

fn print_group(owner: &str, group: &NetworkGroupSummary) {
    println!("{owner}: {} activities", group.total_activities);
    if group.breakdown.is_empty() {
        println!("  no cases in this window");
        return;
    }
    for entry in &group.breakdown {
        println!(
            "  - {}: {} cases ({:.1}%)",
            entry.activity_type, entry.case_count, entry.share_of_group
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} activities from {}.", csv.display());
        }
        Commands::Distribution {
            metric,
            owner,
            since_days,
            json,
        } => {
            let metric = match metric {
                MetricArg::Recurrence => DistributionMetric::Recurrence,
                MetricArg::EarlyFailure => DistributionMetric::EarlyFailure,
            };
            let since_date = db::cutoff_date(since_days);
            let counts =
                db::fetch_activity_counts(&pool, metric, since_date, owner.as_deref()).await?;
            let dist = distribution::summarize(&counts);

            if json {
                println!("{}", serde_json::to_string_pretty(&dist)?);
            } else {
                print_group("ENTEL", &dist.entel);
                print_group("ONNET", &dist.onnet);
            }
        }
        Commands::Rank {
            level,
            since_days,
            limit,
            weights,
            json,
        } => {
            let level = match level {
                LevelArg::Company => RankingLevel::Company,
                LevelArg::Technician => RankingLevel::Technician,
            };
            let weights = build_weights(&weights)?;
            let since_date = db::cutoff_date(since_days);
            let metrics = db::fetch_entity_metrics(&pool, level, since_date).await?;
            let ranked = scoring::rank(&metrics, &weights);

            if ranked.is_empty() {
                println!("No entities with activity in this window.");
                return Ok(());
            }

            if json {
                let top: Vec<_> = ranked.iter().take(limit).collect();
                println!("{}", serde_json::to_string_pretty(&top)?);
            } else {
                for entity in ranked.iter().take(limit) {
                    println!(
                        "{}. {} — score {:.1}",
                        entity.rank_position, entity.entity_id, entity.final_score
                    );
                }
            }
        }
        Commands::Report {
            since_days,
            weights,
            out,
        } => {
            let weights = build_weights(&weights)?;
            let since_date = db::cutoff_date(since_days);

            let recurrence_counts = db::fetch_activity_counts(
                &pool,
                DistributionMetric::Recurrence,
                since_date,
                None,
            )
            .await?;
            let early_failure_counts = db::fetch_activity_counts(
                &pool,
                DistributionMetric::EarlyFailure,
                since_date,
                None,
            )
            .await?;
            let company_metrics =
                db::fetch_entity_metrics(&pool, RankingLevel::Company, since_date).await?;
            let technician_metrics =
                db::fetch_entity_metrics(&pool, RankingLevel::Technician, since_date).await?;
            let trends = db::fetch_weekly_activity(&pool, since_date).await?;

            let report = report::build_report(
                since_days,
                since_date,
                &recurrence_counts,
                &early_failure_counts,
                &company_metrics,
                &technician_metrics,
                &trends,
                &weights,
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
