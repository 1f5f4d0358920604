//! rateable: inspect rating schemas and compute review aggregates.

mod report;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rateable_core::{
    memory_aggregator, HostRef, RatingSchema, ReviewInput, Reviewable, DEFAULT_DEPARTMENT,
};

use report::{HostSummary, SummaryOptions};

#[derive(Parser, Debug)]
#[command(
    name = "rateable",
    about = "Inspect rating schemas and compute review aggregates",
    version
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate or print a rating schema file
    Schema {
        #[command(subcommand)]
        command: SchemaCommand,
    },
    /// Load review submissions for one host and print their aggregates
    Stats(StatsArgs),
    /// Seed a sample host and print its summary
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum SchemaCommand {
    /// Validate a schema file and list its departments
    Check {
        /// Path to a YAML or JSON schema file
        file: PathBuf,
    },
    /// Print the effective schema as YAML (defaults when no file is given)
    Show {
        file: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct StatsArgs {
    /// JSON array of review submissions
    #[arg(long)]
    reviews: PathBuf,

    #[arg(long)]
    host_type: String,

    #[arg(long)]
    host_id: String,

    /// Rating schema file (five-point defaults when omitted)
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Department used for the histogram
    #[arg(long, default_value = DEFAULT_DEPARTMENT, conflicts_with = "all_departments")]
    department: String,

    /// Build the histogram across every department
    #[arg(long)]
    all_departments: bool,

    /// Aggregate unapproved reviews instead of approved ones
    #[arg(long)]
    pending: bool,

    /// Round averages to this many decimal places
    #[arg(long)]
    precision: Option<u32>,
}

#[derive(Args, Debug)]
struct DemoArgs {
    /// Rating schema file (five-point defaults when omitted)
    #[arg(long)]
    schema: Option<PathBuf>,

    #[arg(long, default_value_t = 2)]
    precision: u32,
}

/// One entry of the `--reviews` file.
#[derive(Debug, Deserialize)]
struct Submission {
    #[serde(default)]
    author_id: Option<String>,

    #[serde(flatten)]
    input: ReviewInput,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Command::Schema {
            command: SchemaCommand::Check { file },
        } => check_schema(&file),
        Command::Schema {
            command: SchemaCommand::Show { file },
        } => show_schema(file.as_deref()),
        Command::Stats(args) => run_stats(args),
        Command::Demo(args) => run_demo(args),
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level/filter '{}'", log_level))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

fn check_schema(path: &Path) -> Result<()> {
    let schema = RatingSchema::from_file(path)
        .with_context(|| format!("invalid rating schema {}", path.display()))?;

    println!(
        "{}: ok (values {}..={}, new reviews {})",
        path.display(),
        schema.min_rating_value,
        schema.max_rating_value,
        if schema.approved_review {
            "approved"
        } else {
            "pending"
        }
    );
    for (name, department) in &schema.departments {
        let keys: Vec<&str> = department.keys().collect();
        println!("  {}: {}", name, keys.join(", "));
    }
    Ok(())
}

fn show_schema(path: Option<&Path>) -> Result<()> {
    let schema = match path {
        Some(path) => RatingSchema::from_file(path)
            .with_context(|| format!("invalid rating schema {}", path.display()))?,
        None => RatingSchema::default(),
    };
    print!("{}", serde_yaml::to_string(&schema)?);
    Ok(())
}

fn run_stats(args: StatsArgs) -> Result<()> {
    let aggregator = memory_aggregator(args.schema.as_deref())?;

    let raw = fs::read_to_string(&args.reviews)
        .with_context(|| format!("failed to read {}", args.reviews.display()))?;
    let submissions: Vec<Submission> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", args.reviews.display()))?;

    let host = HostRef::new(args.host_type, args.host_id).rateable(&aggregator);
    for submission in submissions {
        host.add_review(submission.input, submission.author_id.as_deref())?;
    }
    info!(host = %host.host(), "loaded review submissions");

    let options = SummaryOptions {
        department: (!args.all_departments).then_some(args.department),
        approved: !args.pending,
        precision: args.precision,
    };
    let summary = HostSummary::build(&host, &options)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run_demo(args: DemoArgs) -> Result<()> {
    let aggregator = memory_aggregator(args.schema.as_deref())?;
    let host = HostRef::new("business", 1).rateable(&aggregator);

    let samples = [
        ("101", "Friendly staff and fair prices", DEFAULT_DEPARTMENT, [5, 5, 4, 4]),
        ("102", "Good, a bit slow", DEFAULT_DEPARTMENT, [4, 3, 4, 3]),
        ("103", "Quick follow-up after the sale", "sales", [5, 4, 5, 4]),
    ];
    for (author, text, department, values) in samples {
        let keys = aggregator
            .schema()
            .department(department)
            .map(|d| d.keys().map(str::to_string).collect::<Vec<_>>())
            .unwrap_or_default();

        let input = keys.into_iter().zip(values).fold(
            ReviewInput::new()
                .text(text)
                .department(department)
                .recommend(true)
                .approved(true),
            |input, (key, value)| input.rating(key, value),
        );
        host.add_review(input, Some(author))?;
    }

    // One pending review that approved aggregates must ignore.
    host.add_review(
        ReviewInput::new()
            .text("Awaiting moderation")
            .approved(false)
            .rating("overall", 1),
        Some("104"),
    )?;

    let options = SummaryOptions {
        department: None,
        approved: true,
        precision: Some(args.precision),
    };
    let summary = HostSummary::build(&host, &options)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
