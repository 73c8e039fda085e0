use std::process::Command;

#[derive(Debug)]
struct Kpis {
    total_reward: f64,
    reserve_cost: f64,
}

#[test]
fn scenario_files_run_via_cli_and_produce_distinct_dynamics() {
    let baseline = run_and_parse_kpis(&["--scenario", "scenarios/baseline.toml"]);
    let online = run_and_parse_kpis(&["--scenario", "scenarios/online_fleet.toml"]);
    let scarce = run_and_parse_kpis(&["--scenario", "scenarios/scarce_reserve.toml"]);

    assert!(
        (baseline.total_reward - online.total_reward).abs() > 1.0,
        "expected baseline and online rewards to differ: baseline={:.3}, online={:.3}",
        baseline.total_reward,
        online.total_reward
    );
    assert!(
        (baseline.reserve_cost - scarce.reserve_cost).abs() > 1.0,
        "reserve costs should differ: baseline={:.3}, scarce={:.3}",
        baseline.reserve_cost,
        scarce.reserve_cost
    );
}

#[test]
fn pcs_side_preset_runs() {
    let kpis = run_and_parse_kpis(&["--preset", "constant", "--side", "pcs", "--seed", "3"]);
    assert!(kpis.total_reward.is_finite());
}

#[test]
fn unknown_preset_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_iso-pcs-sim"))
        .args(["--preset", "nope"])
        .output()
        .expect("iso-pcs-sim process should run");
    assert!(!output.status.success());
}

fn run_and_parse_kpis(args: &[&str]) -> Kpis {
    let output = Command::new(env!("CARGO_BIN_EXE_iso-pcs-sim"))
        .args(args)
        .output()
        .expect("iso-pcs-sim process should run");

    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={} ",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    Kpis {
        total_reward: parse_metric(&stdout, "Reward:", "total"),
        reserve_cost: parse_metric(&stdout, "Reserve cost:", ""),
    }
}

fn parse_metric(stdout: &str, label: &str, first_word_suffix: &str) -> f64 {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing KPI line `{label}` in output: {stdout}"));

    let raw = line
        .split_once(':')
        .map(|(_, right)| right.trim())
        .unwrap_or_else(|| panic!("invalid KPI format for line `{line}`"));

    let numeric = raw.split_whitespace().next().unwrap_or(raw);
    let numeric = numeric.strip_suffix(first_word_suffix).unwrap_or(numeric).trim();
    numeric
        .parse::<f64>()
        .unwrap_or_else(|_| panic!("failed parsing `{numeric}` from KPI line `{line}`"))
}
