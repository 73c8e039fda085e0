//! CSV export for simulation step records.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::StepInfo;

/// Column header for CSV telemetry export.
const HEADER: &str = "step,time,predicted_demand,realized_demand,pcs_demand,\
                       net_demand,dispatch,shortfall,dispatch_cost,reserve_cost,\
                       pcs_costs,buy_price,sell_price,production,consumption,\
                       battery_levels,battery_actions,energy_changes,reward,total_reward";

/// Separator for per-agent values inside one CSV cell.
const AGENT_SEPARATOR: &str = ";";

fn join_agents(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{v:.4}"))
        .collect::<Vec<_>>()
        .join(AGENT_SEPARATOR)
}

/// Exports step records to a CSV file at the given path.
///
/// Writes a header row followed by one data row per step. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(records: &[StepInfo], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(records, buf)
}

/// Writes step records as CSV to any writer.
///
/// Per-agent columns hold `;`-separated values in agent order.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(records: &[StepInfo], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in records {
        let g = &r.grid;
        wtr.write_record(&[
            r.step.to_string(),
            format!("{:.4}", r.time),
            format!("{:.4}", g.predicted_demand),
            format!("{:.4}", g.realized_demand),
            format!("{:.4}", g.pcs_demand),
            format!("{:.4}", g.net_demand),
            format!("{:.4}", g.dispatch),
            format!("{:.4}", g.shortfall),
            format!("{:.4}", g.dispatch_cost),
            format!("{:.4}", g.reserve_cost),
            format!("{:.4}", g.pcs_costs),
            format!("{:.4}", g.buy_price),
            format!("{:.4}", g.sell_price),
            format!("{:.4}", r.production),
            format!("{:.4}", r.consumption),
            join_agents(&r.battery_levels),
            join_agents(&r.battery_actions),
            join_agents(&r.energy_changes),
            format!("{:.4}", r.reward),
            format!("{:.4}", r.total_reward),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::cost::GridStepRecord;

    fn make_step(t: usize) -> StepInfo {
        StepInfo {
            step: t,
            time: t as f64 / 48.0,
            grid: GridStepRecord {
                predicted_demand: 150.0,
                realized_demand: 152.5,
                pcs_demand: -1.0,
                net_demand: 151.5,
                dispatch: 150.0,
                shortfall: 1.5,
                dispatch_cost: 750.0,
                reserve_cost: 22.5,
                pcs_costs: -3.0,
                buy_price: 3.0,
                sell_price: 5.0,
            },
            production: 2.0,
            consumption: 1.0,
            battery_levels: vec![50.0, 48.0],
            battery_actions: vec![0.0, -2.0],
            energy_changes: vec![0.0, -2.0],
            reward: -769.5,
            total_reward: -769.5 * t as f64,
        }
    }

    #[test]
    fn header_lists_columns() {
        let mut buf = Vec::new();
        write_csv(&[make_step(1)], &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let first_line = output.lines().next().unwrap();
        assert!(first_line.starts_with("step,time,predicted_demand"));
        assert!(first_line.ends_with("reward,total_reward"));
    }

    #[test]
    fn row_count_matches_step_count() {
        let records: Vec<StepInfo> = (1..=24).map(make_step).collect();
        let mut buf = Vec::new();
        write_csv(&records, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        // 1 header + 24 data rows
        assert_eq!(lines.len(), 25);
    }

    #[test]
    fn deterministic_output() {
        let records: Vec<StepInfo> = (1..=5).map(make_step).collect();
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_csv(&records, &mut buf1).unwrap();
        write_csv(&records, &mut buf2).unwrap();
        assert_eq!(buf1, buf2);
    }

    #[test]
    fn agent_columns_are_joined() {
        let mut buf = Vec::new();
        write_csv(&[make_step(1)], &mut buf).unwrap();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(headers.len(), 20);

        let rec = rdr.records().next().expect("one data row").unwrap();
        assert_eq!(&rec[15], "50.0000;48.0000");
        let shortfall: f64 = rec[7].parse().unwrap();
        assert_eq!(shortfall, 1.5);
    }
}
