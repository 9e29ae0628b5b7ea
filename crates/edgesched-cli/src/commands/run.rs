use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use edgesched_model::Snapshot;
use edgesched_scheduler::{Simulation, SimulationConfig, SimulationReport, StrategyRegistry};
use tracing::info;

pub struct RunArgs {
    pub input: PathBuf,
    pub algorithm: Option<String>,
    pub config: Option<PathBuf>,
    pub max_steps: Option<u64>,
    pub output: Option<PathBuf>,
    pub format: String,
}

pub fn run(args: &RunArgs) -> anyhow::Result<()> {
    let report = execute(args)?;
    let rendered = render(&report, &args.format)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{rendered}"),
    }

    if !report.completed {
        eprintln!(
            "warning: step limit reached after {} steps with services still pending",
            report.steps
        );
    }
    Ok(())
}

/// Resolve the configuration, load the snapshot and run the simulation.
fn execute(args: &RunArgs) -> anyhow::Result<SimulationReport> {
    let config = resolve_config(args)?;
    let snapshot = Snapshot::from_file(&args.input)
        .with_context(|| format!("failed to load snapshot {}", args.input.display()))?;

    let registry = StrategyRegistry::with_defaults();
    let (report, _) = Simulation::run_snapshot(snapshot, &registry, &config)
        .with_context(|| format!("simulation of {} failed", args.input.display()))?;
    Ok(report)
}

/// File values first, then command-line overrides.
fn resolve_config(args: &RunArgs) -> anyhow::Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(algorithm) = &args.algorithm {
        config.algorithm = algorithm.clone();
    }
    if let Some(max_steps) = args.max_steps {
        config.max_steps = max_steps;
    }
    config.validate()?;
    Ok(config)
}

fn load_config(path: &Path) -> anyhow::Result<SimulationConfig> {
    SimulationConfig::from_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))
}

fn render(report: &SimulationReport, format: &str) -> anyhow::Result<String> {
    match format {
        "json" => Ok(serde_json::to_string_pretty(report)?),
        "text" => Ok(format_text(report)),
        other => bail!("unknown output format '{other}' (expected json or text)"),
    }
}

fn format_text(report: &SimulationReport) -> String {
    let status = if report.completed { "✓" } else { "✗" };
    let mut out = format!(
        "{status} {} finished after {} step(s)\n",
        report.algorithm, report.steps
    );
    out.push_str(&format!("  run: {}\n", report.run_id));

    for tick in &report.ticks {
        out.push_str(&format!(
            "  step {:>3}: {} commit(s), {} unplaced\n",
            tick.step,
            tick.commits.len(),
            tick.unplaced.len()
        ));
    }

    out.push_str("  final placement:\n");
    for service in report.metrics.final_services() {
        let host = service
            .server
            .map_or_else(|| "-".to_string(), |server| server.to_string());
        out.push_str(&format!("    service {:>4} → {host}\n", service.instance_id));
    }
    out
}
