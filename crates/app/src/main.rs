use anyhow::Result;
use clap::{Parser, Subcommand};
use gstrecon_core::{Category, Money};
use gstrecon_report::{CategoryFilter, ExportFormat, ExportPreset};
use std::path::PathBuf;

mod commands;
mod config;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "gstrecon", version, about = "GST vs AP/AR reconciliation results")]
struct Cli {
    /// Config file; defaults to the platform config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Matching engine base URL.
    #[arg(long, global = true)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Counts, confidence distribution and insights.
    Summary {
        /// Reconciliation result JSON.
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        gst_total: Option<Money>,
        #[arg(long)]
        apar_total: Option<Money>,
    },

    /// One page of the results table.
    List {
        #[arg(long)]
        input: PathBuf,
        /// `all` or a category key such as `missing_gst`.
        #[arg(long, default_value = "all")]
        category: CategoryFilter,
        #[arg(long, default_value = "1")]
        page: usize,
    },

    /// Write a CSV or HTML report.
    Export {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        format: Option<ExportFormat>,
        /// `all` or `issues`.
        #[arg(long)]
        preset: Option<ExportPreset>,
        /// Category keys to leave out.
        #[arg(long)]
        exclude: Vec<Category>,
        #[arg(long)]
        no_confidence: bool,
        #[arg(long)]
        no_reasons: bool,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Drill into one invoice.
    Detail {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        invoice: String,
        /// Also write `<invoice>_details.csv` here.
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Upload both datasets, reconcile and export.
    Run {
        #[arg(long)]
        gst: PathBuf,
        #[arg(long)]
        apar: PathBuf,
        #[arg(long)]
        format: Option<ExportFormat>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.backend_url {
        config.backend_url = url;
    }

    match cli.command {
        Commands::Summary {
            input,
            gst_total,
            apar_total,
        } => commands::summary(&input, gst_total, apar_total)?,
        Commands::List {
            input,
            category,
            page,
        } => commands::list(&input, category, page)?,
        Commands::Export {
            input,
            format,
            preset,
            exclude,
            no_confidence,
            no_reasons,
            out_dir,
        } => {
            let options =
                commands::resolve_options(config.options, preset, &exclude, no_confidence, no_reasons);
            let out_dir = out_dir.unwrap_or_else(|| config.output_dir());
            commands::export(
                &input,
                format.unwrap_or(config.default_format),
                options,
                &out_dir,
            )?;
        }
        Commands::Detail {
            input,
            invoice,
            out_dir,
        } => commands::detail(&input, &invoice, out_dir.as_deref())?,
        Commands::Run {
            gst,
            apar,
            format,
            out_dir,
        } => {
            let out_dir = out_dir.unwrap_or_else(|| config.output_dir());
            let format = format.unwrap_or(config.default_format);
            commands::run(&config, &gst, &apar, format, &out_dir).await?;
        }
    }
    Ok(())
}
