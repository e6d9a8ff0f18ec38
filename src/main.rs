use anyhow::{Context, Result};
use clap::Parser;
use queuestat::{
    analysis,
    cli::{Cli, OutputFormat},
    config::AnalysisConfig,
    csv_output::CsvOutput,
    filter::TaskFilter,
    json_output::JsonReport,
    loader,
    text_output::TextReport,
};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
///
/// Installed with `--debug` (everything at TRACE) or when `RUST_LOG` is set.
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    } else if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Defaults, then the config file, then command-line flags
fn resolve_config(args: &Cli) -> Result<AnalysisConfig> {
    let base = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("Invalid config file {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    Ok(args.apply_to(base))
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = resolve_config(&args)?;
    let filter = TaskFilter::from_exprs(&config.filters)?;

    let corpus = loader::load_paths(&args.paths)?;
    if corpus.tasks.is_empty() {
        tracing::warn!("no tasks found in {} page files", corpus.pages);
    }

    let report = analysis::analyze(&corpus, &filter, &config).context("Analysis failed")?;

    let pending = report.exclusions.pending + report.exclusions.in_progress;
    if pending > 0 {
        eprintln!(
            "queuestat: {} tasks not yet finished were excluded ({} pending, {} in progress)",
            pending, report.exclusions.pending, report.exclusions.in_progress
        );
    }

    match args.format {
        OutputFormat::Text => print!("{}", TextReport::new(&report, config.top)),
        OutputFormat::Json => {
            println!(
                "{}",
                JsonReport::from_report(&report, config.include_timeline).to_json()?
            )
        }
        OutputFormat::Csv => print!("{}", CsvOutput::new(args.csv_table).render(&report.concurrency)),
    }

    Ok(())
}
