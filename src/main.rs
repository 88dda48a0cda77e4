use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use grading_anomaly::models::{AnomalyReport, ReportStatus};
use grading_anomaly::{db, ingest, report, AnalysisConfig};

#[derive(Parser)]
#[command(name = "grading-anomaly")]
#[command(about = "Flags inconsistent grading and ranks submissions for regrade", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Markdown,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Import grades for an assignment from a CSV file
    Import {
        #[arg(long)]
        assignment: Uuid,
        #[arg(long)]
        csv: PathBuf,
    },
    /// Analyse one assignment's grades
    #[command(group(
        ArgGroup::new("source")
            .args(["csv", "assignment"])
            .multiple(true)
            .required(true)
    ))]
    Analyze {
        /// Read grades from a CSV file instead of the database
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long)]
        assignment: Option<Uuid>,
        /// TOML file overriding thresholds and risk weights
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = Format::Markdown)]
        format: Format,
        #[arg(long)]
        out: Option<PathBuf>,
        /// Persist the report as pending review
        #[arg(long, requires = "assignment")]
        save: bool,
    },
    /// Print the latest stored report for an assignment
    Show {
        #[arg(long)]
        assignment: Uuid,
        #[arg(long, value_enum, default_value_t = Format::Markdown)]
        format: Format,
    },
    /// Move the latest stored report through the review workflow
    Status {
        #[arg(long)]
        assignment: Uuid,
        #[arg(long)]
        set: ReportStatus,
    },
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AnalysisConfig> {
    let Some(path) = path else {
        return Ok(AnalysisConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    AnalysisConfig::from_toml_str(&raw).with_context(|| format!("in {}", path.display()))
}

fn render(report: &AnomalyReport, format: Format) -> anyhow::Result<String> {
    match format {
        Format::Markdown => Ok(report::render_markdown(report)),
        Format::Json => serde_json::to_string_pretty(report).context("failed to encode report"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Import { assignment, csv } => {
            let pool = connect().await?;
            let inserted = db::import_grades(&pool, assignment, &csv).await?;
            println!("Imported {inserted} grades from {}.", csv.display());
        }
        Commands::Analyze {
            csv,
            assignment,
            config,
            format,
            out,
            save,
        } => {
            let config = load_config(config.as_deref())?;
            let pool = if csv.is_none() || save {
                Some(connect().await?)
            } else {
                None
            };

            let grades = match (&csv, &pool, assignment) {
                (Some(path), _, _) => ingest::read_grades_csv(path)?,
                (None, Some(pool), Some(assignment)) => db::fetch_grades(pool, assignment).await?,
                _ => anyhow::bail!("either --csv or --assignment is required"),
            };
            report::ensure_min_sample(&grades, config.min_grades)?;

            let assignment_id = assignment.unwrap_or_else(Uuid::nil);
            let report = report::analyze(assignment_id, &grades, &config)?;

            if let (true, Some(pool)) = (save, &pool) {
                let id = db::save_report(pool, &report).await?;
                eprintln!("Stored report {id} as {}.", ReportStatus::Pending);
            }

            let rendered = render(&report, format)?;
            match out {
                Some(out) => {
                    std::fs::write(&out, rendered)?;
                    println!("Report written to {}.", out.display());
                }
                None => print!("{rendered}"),
            }
        }
        Commands::Show { assignment, format } => {
            let pool = connect().await?;
            match db::latest_report(&pool, assignment).await? {
                Some((status, report)) => {
                    eprintln!("Status: {status}");
                    print!("{}", render(&report, format)?);
                }
                None => println!("No report stored for assignment {assignment}."),
            }
        }
        Commands::Status { assignment, set } => {
            let pool = connect().await?;
            if db::set_status(&pool, assignment, set).await? {
                println!("Report for {assignment} marked {set}.");
            } else {
                println!("No report stored for assignment {assignment}.");
            }
        }
    }

    Ok(())
}
