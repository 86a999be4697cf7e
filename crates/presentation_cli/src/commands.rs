//! Subcommand execution
//!
//! Every command renders its result as a JSON value; printing is left to
//! the binary.

use std::path::Path;

use anyhow::{Context, bail};
use application::{CallArgs, CallError, ERROR_MODE_ENV, ErrorReportBuilder, Harness};
use domain::Frame;
use infrastructure::{AppConfig, FaultConfig, build_harness};
use serde_json::{Value, json};
use tracing::debug;

use crate::cli::Commands;

/// Run `command` against a harness built from `config`
pub fn run(command: &Commands, config: &AppConfig) -> anyhow::Result<Value> {
    match command {
        Commands::Mode => Ok(mode(config)),
        Commands::Rules { service } => rules(config, service),
        Commands::Services => services(&build_harness(config)?),
        Commands::Operations { service, mutation } => {
            let harness = build_harness(config)?;
            if let Some(mutation) = mutation {
                harness.activate(service, mutation)?;
            }
            let operations: Vec<String> = harness
                .list_operations(service)?
                .iter()
                .map(ToString::to_string)
                .collect();
            Ok(json!({
                "service": service,
                "mutation": harness.current_mutation_name(service),
                "operations": operations,
            }))
        },
        Commands::Call {
            service,
            operation,
            args,
            mutation,
            state,
            repeat,
            stats,
        } => {
            let harness = build_harness(config)?;
            if let Some(path) = state {
                harness.load_state(service, path)?;
            }
            if let Some(mutation) = mutation {
                harness.activate(service, mutation)?;
            }
            let args = parse_args(args)?;
            let mut results = (0..*repeat)
                .map(|_| call(&harness, service, operation, &args))
                .collect::<anyhow::Result<Vec<_>>>()?;

            let rendered = if results.len() == 1 {
                results.remove(0)
            } else {
                Value::Array(results)
            };
            if *stats {
                let stats = harness.fault_stats(service)?;
                return Ok(json!({ "result": rendered, "faults": stats }));
            }
            Ok(rendered)
        },
    }
}

fn parse_args(raw: &str) -> anyhow::Result<CallArgs> {
    match serde_json::from_str::<Value>(raw).context("--args is not valid JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!("--args must be a JSON object, got {other}"),
    }
}

/// One call; a raised error is rendered as a report rather than aborting
fn call(harness: &Harness, service: &str, operation: &str, args: &CallArgs) -> anyhow::Result<Value> {
    match harness.call(service, operation, args) {
        Ok(outcome) => Ok(outcome.to_value()),
        Err(CallError::Raised(err)) => {
            debug!(service, operation, error = %err, "Operation raised");
            let origin = Frame::new(service, operation);
            let report = ErrorReportBuilder::new().build(&err, Some(&origin));
            Ok(json!({ "raised": report.to_value() }))
        },
        Err(CallError::Resolution(err)) => Err(err.into()),
    }
}

fn services(harness: &Harness) -> anyhow::Result<Value> {
    let active = harness.active_mutations();
    let rows = harness
        .services()
        .into_iter()
        .map(|service| -> anyhow::Result<Value> {
            let operations = harness.list_operations(service.as_str())?.len();
            Ok(json!({
                "service": service,
                "operations": operations,
                "mutations": harness.mutation_names(service.as_str()),
                "active": active.get(&service).cloned().unwrap_or_default(),
            }))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Value::Array(rows))
}

fn mode(config: &AppConfig) -> Value {
    let source = if config.error_reporting.mode.is_some() {
        "config"
    } else if std::env::var_os(ERROR_MODE_ENV).is_some() {
        "environment"
    } else {
        "default"
    };
    json!({ "mode": config.error_mode(), "source": source })
}

fn rules(config: &AppConfig, service: &str) -> anyhow::Result<Value> {
    let settings = &config.fault_injection;
    let dir = settings.dir_for(service);
    let enabled = settings.enabled_for(service);

    let Some(fault_config) = FaultConfig::load(&dir)
        .with_context(|| format!("loading fault configuration of '{service}'"))?
    else {
        return Ok(json!({
            "service": service,
            "dir": display(&dir),
            "enabled": false,
            "rules": [],
        }));
    };

    let injector = settings.injector_config_for(service);
    let rules: Vec<Value> = fault_config
        .policy
        .rules()
        .iter()
        .map(|compiled| {
            json!({
                "rule": compiled.rule,
                "exception": compiled.exception,
            })
        })
        .collect();
    Ok(json!({
        "service": service,
        "dir": display(&dir),
        "enabled": enabled,
        "seed": injector.seed,
        "max_errors_per_run": injector.max_errors_per_run,
        "rules": rules,
        "kinds": fault_config.policy.kinds(),
    }))
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
