//! flow-cli: runs a flow definition straight through the in-memory engine,
//! bypassing the HTTP server entirely. Meant for local iteration and smoke
//! testing a flow document before publishing it.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use flow_cache::TtlDefinitionCache;
use flow_core::store::{DurableStore, InMemoryStore};
use flow_core::{FlowExecutionEngine, LogSink};
use flow_core::constants::LOG_SINK_CAPACITY;
use flow_dispatch::ApiCallDispatcher;
use flow_domain::Flow;

#[derive(Parser)]
#[command(name = "flow-cli", version, about = "Run a flow definition locally against the in-memory engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a flow document against its inputs
    Run {
        /// Path to a flow definition JSON file
        flow: PathBuf,
        /// Path to a JSON file of flow inputs; defaults to `{}`
        #[arg(long)]
        inputs: Option<PathBuf>,
        /// Run in test mode: short-circuits every block dispatch
        #[arg(long)]
        test: bool,
    },
    /// Validate a flow document's shape without running it
    Check {
        /// Path to a flow definition JSON file
        flow: PathBuf,
    },
}

fn load_flow(path: &PathBuf) -> anyhow::Result<Flow> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn load_inputs(path: Option<&PathBuf>) -> anyhow::Result<HashMap<String, serde_json::Value>> {
    match path {
        Some(p) => {
            let raw = fs::read_to_string(p)?;
            Ok(serde_json::from_str(&raw)?)
        }
        None => Ok(HashMap::new()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Check { flow } => {
            let flow = load_flow(&flow)?;
            match flow.validate_shape() {
                Ok(()) => println!("ok: flow '{}' (v{}) is well-formed", flow.slug, flow.version),
                Err(err) => {
                    eprintln!("invalid: {err}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Run { flow, inputs, test } => {
            let flow = load_flow(&flow)?;
            let inputs = load_inputs(inputs.as_ref())?;

            let store = Arc::new(InMemoryStore::new());
            store.put_flow(flow.clone());
            let cache = Arc::new(TtlDefinitionCache::new(store.clone()));
            let dispatcher = Arc::new(ApiCallDispatcher::new());
            let log_sink = LogSink::new(LOG_SINK_CAPACITY);
            log_sink.clone().spawn_writer(store.clone() as Arc<dyn DurableStore>);
            let engine = FlowExecutionEngine::new(cache, dispatcher, log_sink);

            let outcome = if test { engine.execute_test(&flow.slug, inputs).await } else { engine.execute(&flow.slug, inputs).await };

            match outcome {
                Ok(outcome) => {
                    println!("{}", serde_json::to_string_pretty(&outcome.output)?);
                }
                Err(err) => {
                    eprintln!("execution failed [{}]: {err}", err.code());
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
