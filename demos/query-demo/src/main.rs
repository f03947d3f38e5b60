//! Command-line demo driving the registry and executor against the live
//! services.
//!
//! ```text
//! query-demo modules
//! query-demo operations simbad
//! query-demo describe simbad query_region
//! query-demo run simbad query_object --arg object_name="M 31"
//! query-demo run simbad query_region --arg coordinates="10.68 41.27" --arg radius="5 arcmin"
//! ```

use std::sync::Arc;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::debug;

use sky_executor::Executor;
use sky_primitives::ExecutionRequest;
use sky_registry::{EnvCredentials, builtin_registry};

#[derive(Parser)]
#[command(name = "query-demo", about = "Query astronomical services by module and operation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the registered modules.
    Modules,
    /// List the operations a module exposes.
    Operations {
        /// Module id, e.g. `simbad`.
        module: String,
    },
    /// Show the full descriptor of one operation.
    Describe {
        /// Module id, e.g. `simbad`.
        module: String,
        /// Operation name, e.g. `query_region`.
        operation: String,
    },
    /// Execute an operation.
    Run {
        /// Module id, e.g. `simbad`.
        module: String,
        /// Operation name, e.g. `query_object`.
        operation: String,
        /// Arguments as `name=value`; values parse as JSON, falling back
        /// to plain strings.
        #[arg(long = "arg", value_name = "NAME=VALUE")]
        args: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let registry = builtin_registry(Arc::new(EnvCredentials))?;

    match cli.command {
        Command::Modules => {
            for descriptor in registry.list_modules() {
                println!("{}  ({})", descriptor.id(), descriptor.target_path());
            }
        }
        Command::Operations { module } => {
            for operation in registry.list_operations(&module).await? {
                println!("{}  {}", operation.name(), operation.summary());
            }
        }
        Command::Describe { module, operation } => {
            let descriptor = registry.describe_operation(&module, &operation).await?;
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
        }
        Command::Run {
            module,
            operation,
            args,
        } => {
            let arguments = parse_arguments(&args)?;
            debug!(module = %module, operation = %operation, "submitting request");

            let executor = Executor::new(Arc::new(registry));
            let request = ExecutionRequest::new(module, operation, arguments);
            let result = executor.submit(&request).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

fn parse_arguments(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut arguments = Map::new();
    for pair in pairs {
        let Some((name, raw)) = pair.split_once('=') else {
            bail!("argument `{pair}` is not of the form NAME=VALUE");
        };
        let value = serde_json::from_str(raw)
            .unwrap_or_else(|_| Value::String(raw.to_owned()));
        arguments.insert(name.trim().to_owned(), value);
    }
    Ok(arguments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_parse_as_json_with_string_fallback() {
        let arguments =
            parse_arguments(&["rows=10".to_owned(), "object_name=M 31".to_owned()]).unwrap();
        assert_eq!(arguments["rows"], Value::from(10));
        assert_eq!(arguments["object_name"], Value::from("M 31"));
    }

    #[test]
    fn malformed_pair_is_rejected() {
        assert!(parse_arguments(&["radius".to_owned()]).is_err());
    }
}
