//! Command-line option parsing for the runner binary.

use std::path::PathBuf;
use std::str::FromStr;

/// Which controller the runner drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Iso,
    Pcs,
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "iso" => Ok(Side::Iso),
            "pcs" => Ok(Side::Pcs),
            other => Err(format!("invalid --side \"{other}\" (expected iso or pcs)")),
        }
    }
}

/// Parsed runner options.
#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    pub scenario: Option<PathBuf>,
    pub preset: Option<String>,
    pub side: Side,
    pub seed: Option<u64>,
    pub episodes: usize,
    pub telemetry_out: Option<PathBuf>,
    pub verbose: bool,
}

/// Outcome of argument parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(CliOptions),
    Help,
}

pub fn parse_args() -> Result<Command, String> {
    parse_args_from(std::env::args().skip(1).collect())
}

pub fn parse_args_from(args: Vec<String>) -> Result<Command, String> {
    let mut i = 0usize;
    let mut opts = CliOptions {
        scenario: None,
        preset: None,
        side: Side::Iso,
        seed: None,
        episodes: 1,
        telemetry_out: None,
        verbose: false,
    };

    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --scenario (expected a TOML path)")?;
                if opts.scenario.replace(PathBuf::from(path)).is_some() {
                    return Err("--scenario provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name =
                    args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                if opts.preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--side" => {
                i += 1;
                opts.side = args
                    .next_or_err(i, "missing value for --side (expected iso or pcs)")?
                    .parse()?;
            }
            "--seed" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --seed (expected a u64)")?;
                opts.seed = Some(
                    raw.parse()
                        .map_err(|_| format!("--seed value \"{raw}\" is not a valid u64"))?,
                );
            }
            "--episodes" => {
                i += 1;
                let raw =
                    args.next_or_err(i, "missing value for --episodes (expected a count)")?;
                opts.episodes = match raw.parse::<usize>() {
                    Ok(n) if n > 0 => n,
                    _ => {
                        return Err(format!(
                            "--episodes value \"{raw}\" must be a positive integer"
                        ));
                    }
                };
            }
            "--telemetry-out" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --telemetry-out (expected a file path)",
                )?;
                if opts.telemetry_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--telemetry-out provided more than once".to_string());
                }
            }
            "--verbose" | "-v" => opts.verbose = true,
            "--help" | "-h" => return Ok(Command::Help),
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.scenario.is_some() && opts.preset.is_some() {
        return Err(
            "arguments `--scenario` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    Ok(Command::Run(opts))
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("iso-pcs-sim: ISO/PCS electricity market simulator");
    eprintln!();
    eprintln!("Usage:");
    eprintln!(
        "  iso-pcs-sim [--scenario <path> | --preset <name>] [--side iso|pcs] [--seed <u64>]"
    );
    eprintln!("              [--episodes <n>] [--telemetry-out <path>] [--verbose]");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
}
