use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

mod classifier;
mod config;
mod error;
mod intake;
mod models;
mod recommend;
mod report;

use classifier::ModelHandle;
use models::{StudentSnapshot, STRUGGLE_LABEL, SUCCEED_LABEL};

#[derive(Parser)]
#[command(name = "learning-path-advisor")]
#[command(about = "Personalized learning path recommendations from quiz and engagement data", long_about = None)]
struct Cli {
    /// Path to the JSON model artifact
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend a next step for a single student
    Recommend {
        /// Quiz 1 score (%)
        #[arg(long = "quiz-1", default_value_t = 70.0, allow_negative_numbers = true)]
        quiz_1: f64,
        /// Quiz 2 score (%)
        #[arg(long = "quiz-2", default_value_t = 80.0, allow_negative_numbers = true)]
        quiz_2: f64,
        /// Platform engagement (days)
        #[arg(long, default_value_t = 15.0, allow_negative_numbers = true)]
        engagement: f64,
        /// Core concepts mastered (%)
        #[arg(long, default_value_t = 55.0, allow_negative_numbers = true)]
        concepts: f64,
        /// Average time per question (seconds)
        #[arg(long, default_value_t = 45.0, allow_negative_numbers = true)]
        avg_time: f64,
        /// Print the recommendation as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rank students in a CSV file by struggle risk
    Score {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown report for a CSV file of students
    Report {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        label: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Show whether the model artifact loads
    InspectModel,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let settings = config::Settings::resolve(cli.model);
    let model = ModelHandle::load(&settings.model_path);

    if let ModelHandle::Unavailable { reason } = &model {
        eprintln!("Warning: model not loaded ({reason}). Recommendations will be unavailable.");
    }

    match cli.command {
        Commands::Recommend {
            quiz_1,
            quiz_2,
            engagement,
            concepts,
            avg_time,
            json,
        } => {
            let snapshot = StudentSnapshot {
                quiz_1_score: quiz_1,
                quiz_2_score: quiz_2,
                platform_engagement_days: engagement,
                concepts_mastered: concepts,
                avg_time_per_question_seconds: avg_time,
            };

            let out_of_range = snapshot.out_of_range_fields();
            if !out_of_range.is_empty() {
                tracing::warn!(fields = ?out_of_range, "values outside form ranges");
            }

            let recommendation = recommend::personalize(&model, &snapshot);

            if json {
                let rendered = serde_json::to_string_pretty(&recommendation)
                    .context("failed to serialize recommendation")?;
                println!("{rendered}");
                return Ok(());
            }

            println!("{}", recommendation.message);
            if !recommendation.confidence.is_empty() {
                println!();
                println!("Prediction confidence:");
                for label in [STRUGGLE_LABEL, SUCCEED_LABEL] {
                    if let Some(value) = recommendation.confidence.get(label) {
                        println!("- {label}: {:.1}%", value * 100.0);
                    }
                }
            }
        }
        Commands::Score { csv, limit } => {
            let rows = intake::read_snapshots(&csv)?;
            let scored = report::score_batch(&model, &rows);

            if scored.is_empty() {
                println!("No students found in {}.", csv.display());
                return Ok(());
            }

            println!("Top students by struggle risk:");
            for student in scored.iter().take(limit) {
                match student.recommendation.struggle_probability() {
                    Some(p) => println!(
                        "- {} ({}) struggle {:.1}% -> {}",
                        student.name,
                        student.student_id,
                        p * 100.0,
                        student.recommendation.kind.label()
                    ),
                    None => println!(
                        "- {} ({}) {}",
                        student.name,
                        student.student_id,
                        recommend::MODEL_NOT_LOADED
                    ),
                }
            }
        }
        Commands::Report { csv, label, out } => {
            let rows = intake::read_snapshots(&csv)?;
            let scored = report::score_batch(&model, &rows);
            let report = report::build_report(
                label.as_deref(),
                chrono::Local::now().date_naive(),
                &scored,
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::InspectModel => match model.model() {
            Some(artifact) => {
                println!("Model loaded from {}.", settings.model_path.display());
                println!("- name: {}", artifact.name.as_deref().unwrap_or("unnamed"));
                println!("- classes: {}", artifact.classes.join(", "));
                println!("- intercept: {:.4}", artifact.intercept);
                for (feature, weight) in artifact
                    .feature_names
                    .iter()
                    .zip(artifact.coefficients.iter())
                {
                    println!("- {feature}: {weight:.4}");
                }
                println!(
                    "- scaler: {}",
                    if artifact.scaler.is_some() { "yes" } else { "no" }
                );
            }
            None => {
                println!("Model not loaded from {}.", settings.model_path.display());
            }
        },
    }

    Ok(())
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { "warn" };

    let filter = tracing_subscriber::EnvFilter::try_from_env(config::LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
