use std::process;

use aerocache::{
    application::{error::AppError, scenario},
    cache::PolicyRegistry,
    config::{self, Command, ScenarioArgs, Settings},
    infra::{error::InfraError, telemetry, wiring},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli().map_err(InfraError::from)?;

    telemetry::init(&settings.logging)?;

    match cli_args.command.unwrap_or(Command::Policies) {
        Command::Policies => run_policies(&settings),
        Command::Scenario(args) => run_scenario(&settings, args).await,
    }
}

fn run_policies(settings: &Settings) -> Result<(), AppError> {
    let coordinator = wiring::build_coordinator(&settings.cache)?;
    print_policies(coordinator.policies());
    Ok(())
}

fn print_policies(registry: &PolicyRegistry) {
    println!("{:<36} {:<8} {:>8}  default tags", "operation", "scope", "ttl");
    for (operation, policy) in registry.policies() {
        let tags: Vec<&str> = policy.default_tags.iter().map(|tag| tag.as_str()).collect();
        println!(
            "{:<36} {:<8} {:>7}s  {}",
            operation.to_string(),
            policy.scope.as_str(),
            policy.ttl.as_secs(),
            if tags.is_empty() {
                "-".to_string()
            } else {
                tags.join(",")
            }
        );
    }
    let fallback = registry.fallback();
    println!(
        "{:<36} {:<8} {:>7}s  -",
        "(unregistered)",
        fallback.scope.as_str(),
        fallback.ttl.as_secs()
    );
}

async fn run_scenario(settings: &Settings, args: ScenarioArgs) -> Result<(), AppError> {
    let coordinator = wiring::build_coordinator(&settings.cache)?;
    let report = scenario::run_supplier_scenario(coordinator).await?;

    if args.json {
        let rendered = serde_json::to_string_pretty(&report).map_err(InfraError::from)?;
        println!("{rendered}");
    } else {
        for step in &report.steps {
            println!("{:<10} {}", step.name, step.detail);
        }
    }

    info!(
        steps = report.steps.len(),
        store_reads = report.store_reads,
        "Scenario completed"
    );
    Ok(())
}
