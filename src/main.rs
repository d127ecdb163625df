use anyhow::Result;
use clap::{Parser, Subcommand};
use muni_stats::{pipeline, report, PipelineConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Join municipal attendance records with census, GDP and risk tables"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the per-municipality table from the configured sources
    Join {
        /// YAML pipeline config; built-in defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Overrides the output path from the config
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Descriptive statistics over a joined table, written as JSON
    Report {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, default_value = "report.json")]
        output: PathBuf,

        /// How many municipalities to list at each end of the rankings
        #[arg(long, default_value_t = report::DEFAULT_TOP_N)]
        top: usize,
    },
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Join { config, output } => {
            // ─── 2) resolve config ───────────────────────────────────
            let mut cfg = match &config {
                Some(path) => {
                    info!(path = %path.display(), "loading config");
                    PipelineConfig::load(path)?
                }
                None => PipelineConfig::default(),
            };
            if let Some(output) = output {
                cfg.output = output;
            }

            // ─── 3) run the join ─────────────────────────────────────
            let summary = pipeline::run(&cfg)?;
            info!(
                municipalities = summary.rows.len(),
                "wrote {}",
                cfg.output.display()
            );
        }
        Command::Report { input, output, top } => {
            report::summarize_file(&input, &output, top)?;
        }
    }

    info!("all done");
    Ok(())
}
