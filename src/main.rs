//! ISO/PCS market simulator entry point: CLI wiring and episode runs.

use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;

use iso_pcs_sim::cli::{self, Command, Side};
use iso_pcs_sim::config::ScenarioConfig;
use iso_pcs_sim::io::export::export_csv;
use iso_pcs_sim::runner::{run_iso_episodes, run_pcs_episodes};
use iso_pcs_sim::sim::types::StepInfo;

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let opts = match cli::parse_args() {
        Ok(Command::Run(opts)) => opts,
        Ok(Command::Help) => {
            cli::print_usage();
            return;
        }
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(1);
        }
    };

    init_logging(opts.verbose);

    // Load config: --scenario takes priority, then --preset, then baseline default
    let scenario = if let Some(ref path) = opts.scenario {
        ScenarioConfig::from_toml_file(path)
    } else if let Some(ref name) = opts.preset {
        ScenarioConfig::from_preset(name)
    } else {
        Ok(ScenarioConfig::baseline())
    };
    let mut scenario = match scenario {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    if let Some(seed) = opts.seed {
        scenario.simulation.seed = seed;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let outcomes = match opts.side {
        Side::Iso => run_iso_episodes(&scenario, opts.episodes, opts.seed),
        Side::Pcs => run_pcs_episodes(&scenario, opts.episodes, opts.seed),
    };
    let outcomes = match outcomes {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    for outcome in &outcomes {
        println!("=== Episode {} ===", outcome.episode);
        for r in &outcome.records {
            println!("{r}");
        }
        println!("\n{}\n", outcome.kpi);
    }

    if let Some(ref path) = opts.telemetry_out {
        let records: Vec<StepInfo> = outcomes
            .iter()
            .flat_map(|o| o.records.iter().cloned())
            .collect();
        if let Err(e) = export_csv(&records, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {}", path.display());
    }
}
