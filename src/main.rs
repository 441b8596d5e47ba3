//! symb-solve - command line front end
//!
//! Prints one JSON document per invocation on stdout; logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use symb_solve::classify::{LinearTextModel, UnifiedClassifier};
use symb_solve::config::{ClassifierConfig, EngineConfig};
use symb_solve::router::{inspect, route_query};

/// Classify, route and symbolically solve math queries
#[derive(Parser)]
#[command(name = "symb-solve")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Confidence threshold of the statistical classifier
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Solver steps before a computation is abandoned
    #[arg(long, global = true)]
    max_steps: Option<usize>,

    /// Statistical model artifact (JSON); the bundled one when omitted
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send an expression to the analyzer for a query type
    Route {
        /// equation, convexity, expression, system, derivative or integral
        query_type: String,
        /// Expression string
        expr: String,
    },

    /// Classify an expression, then route it by the resulting label
    Classify {
        /// Expression string
        expr: String,

        /// Also run the analyzer the label maps to
        #[arg(long)]
        solve: bool,
    },

    /// Simplified form, renderings and polynomial structure of an expression
    Inspect {
        /// Expression string
        expr: String,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::{fmt, prelude::*};

    let filter = if verbose {
        EnvFilter::new("symb_solve=debug,info")
    } else {
        EnvFilter::new("symb_solve=info,warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn engine_config(cli: &Cli) -> EngineConfig {
    let mut config = EngineConfig::from_env();
    if let Some(t) = cli.threshold {
        config.classifier = config.classifier.with_threshold(t);
    }
    if let Some(n) = cli.max_steps {
        config.limits = config.limits.with_max_steps(n);
    }
    if let Some(path) = &cli.model {
        config.model_path = Some(path.clone());
    }
    config
}

fn load_classifier(config: &EngineConfig) -> Result<UnifiedClassifier> {
    let model = match &config.model_path {
        Some(path) => LinearTextModel::load(path)
            .with_context(|| format!("loading model from {}", path.display()))?,
        None => LinearTextModel::bundled().context("loading bundled model")?,
    };
    let classifier: ClassifierConfig = config.classifier;
    Ok(UnifiedClassifier::new(Arc::new(model), classifier))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = engine_config(&cli);

    let output = match &cli.command {
        Commands::Route { query_type, expr } => {
            serde_json::to_value(route_query(query_type, expr, &config.limits))?
        }
        Commands::Classify { expr, solve } => {
            let classifier = load_classifier(&config)?;
            let result = classifier.classify(expr);
            match result.label.query_type() {
                Some(query_type) if *solve => json!({
                    "classification": result,
                    "analysis": route_query(query_type.as_str(), expr, &config.limits),
                }),
                _ => serde_json::to_value(result)?,
            }
        }
        Commands::Inspect { expr } => serde_json::to_value(inspect(expr, &config.limits))?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
