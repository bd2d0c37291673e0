//! CLI entrypoint for docquorum
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use docquorum_application::{
    ChunkingService, ConsensusEngine, DecisionLogger, EvaluateDocumentUseCase, EvaluateInput,
    EvaluationProgress, NoProgress,
};
use docquorum_domain::{
    AnswerType, ChunkingEngine, ChunkingError, OutputFormat,
    config::{Severity, has_errors},
};
use docquorum_infrastructure::{ConfigLoader, FileConfig, JsonlDecisionLogger, ProviderRegistry};
use docquorum_presentation::{
    Cli, ConsoleFormatter, OutputFormatter, ProgressReporter, SimpleProgress,
    output::console::set_color_enabled,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(cli.verbose, cli.log_dir.as_deref());

    if cli.show_config {
        println!("Configuration sources (in priority order):");
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("  {}", line);
        }
        return Ok(());
    }

    let (Some(document_path), Some(question)) = (cli.document.as_deref(), cli.question.clone())
    else {
        bail!("A document and a question are required.");
    };

    let config =
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            Severity::Error => eprintln!("{}", issue),
            Severity::Warning => warn!("{}", issue.message),
        }
    }
    if has_errors(&issues) {
        let errors = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count();
        bail!("Configuration has {} error(s)", errors);
    }

    set_color_enabled(config.output.color && !cli.no_color);
    let format = cli
        .output
        .map(OutputFormat::from)
        .or(config.output.format)
        .unwrap_or_default();

    let document = read_document(document_path).await?;
    let answer_type = AnswerType::from(cli.answer_type);

    // === Dependency Injection ===
    let registry = ProviderRegistry::from_config(&config);
    let use_case = build_use_case(&config, &registry);
    let input = EvaluateInput::new(document, question, answer_type);

    info!(
        "Evaluating {} with {} provider(s)",
        document_path.display(),
        registry.slots().len()
    );

    let show_progress = !cli.quiet && config.output.show_progress && format != OutputFormat::Json;
    let progress: Box<dyn EvaluationProgress> = if show_progress {
        Box::new(ProgressReporter::new())
    } else if cli.quiet {
        Box::new(NoProgress)
    } else {
        Box::new(SimpleProgress)
    };

    let outcome = tokio::select! {
        biased;
        _ = tokio::signal::ctrl_c() => {
            registry.shutdown();
            bail!("Interrupted");
        }
        result = use_case.execute_with_progress(input, progress.as_ref()) => result,
    };
    registry.shutdown();

    let decision = outcome.context("Evaluation failed")?;
    println!("{}", ConsoleFormatter.render(&decision, format));

    Ok(())
}

/// Console logs go to stderr; `--log-dir` adds a daily-rotated file.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Initialize logging based on verbosity level
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let console = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "docquorum.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();

    guard
}

async fn read_document(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    String::from_utf8(bytes)
        .map_err(|e| ChunkingError::InvalidEncoding {
            offset: e.utf8_error().valid_up_to(),
        })
        .with_context(|| format!("Failed to read {}", path.display()))
}

fn build_use_case(config: &FileConfig, registry: &ProviderRegistry) -> EvaluateDocumentUseCase {
    // Issues were reported by `validate`; invalid values fall back to defaults
    let (options, _) = config.chunking.to_options();
    let chunking = Arc::new(ChunkingService::new(
        ChunkingEngine::new(options),
        config.chunking.cache_capacity,
    ));

    let mut consensus = ConsensusEngine::new(config.consensus);
    if let Some(arbitrator) = registry.arbitrator() {
        consensus = consensus.with_arbitrator(arbitrator);
    }

    let mut use_case =
        EvaluateDocumentUseCase::new(registry.slots().to_vec(), chunking, Arc::new(consensus))
            .with_params(config.execution.clone());

    if let Some(path) = config.logging.decision_log_path() {
        match JsonlDecisionLogger::new(&path) {
            Some(logger) => {
                info!("Logging decisions to {}", logger.path().display());
                let logger: Arc<dyn DecisionLogger> = Arc::new(logger);
                use_case = use_case.with_decision_logger(logger);
            }
            None => warn!("Decision log disabled: cannot open {}", path.display()),
        }
    }

    use_case
}
