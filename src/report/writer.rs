//! Plain-text and JSON report output

use crate::report::diagnostics::RouterDiagnostics;
use crate::report::error::ReportResult;
use crate::report::occupancy::OccupancySampler;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

const SEPARATOR: &str = "========================================================";

/// Congestion value per time: one `value\ttime` line per teardown, per host
pub fn congestion_report(routers: &[RouterDiagnostics]) -> String {
    let mut out = String::new();
    for d in routers {
        let _ = write!(out, "\n{}\n{}\n", SEPARATOR, d.host);
        for sample in &d.congestion_samples {
            let _ = write!(out, "\n{}\t{}", sample.value, sample.time);
        }
    }
    out
}

/// Drop/replication ratios per host
pub fn drop_ratio_report(routers: &[RouterDiagnostics]) -> String {
    let mut out = String::new();
    for d in routers {
        let _ = write!(out, "\n{}\n{}\n", SEPARATOR, d.host);
        for ratio in &d.drop_ratios {
            let _ = write!(out, "\n{}", ratio);
        }
    }
    out
}

/// Occupancy series per host, the per-host averages, then every sample as a
/// `host\ttime\tpercent` line
pub fn occupancy_report(sampler: &OccupancySampler) -> String {
    let mut out = String::new();
    for (host, samples) in sampler.series() {
        let _ = write!(out, "{}", host);
        for s in samples {
            let _ = write!(out, " {:.3}", s.percent);
        }
        out.push('\n');
    }
    out.push_str("\navgBuffer:\n");
    for (host, avg) in sampler.averages() {
        let _ = writeln!(out, "{}\t{}", host, avg);
    }
    out.push_str("\nbufferPerTime:\n");
    for (host, samples) in sampler.series() {
        for s in samples {
            let _ = writeln!(out, "{}\t{}\t{:.3}", host, s.time, s.percent);
        }
    }
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    sim_time: f64,
    routers: &'a [RouterDiagnostics],
}

pub fn to_json(routers: &[RouterDiagnostics], sim_time: f64) -> ReportResult<String> {
    let report = JsonReport {
        generated_at: Utc::now(),
        sim_time,
        routers,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Write all reports into `dir`
pub fn write_reports(
    dir: impl AsRef<Path>,
    routers: &[RouterDiagnostics],
    sampler: &OccupancySampler,
    sim_time: f64,
) -> ReportResult<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join("congestion_value_per_time.txt"), congestion_report(routers))?;
    std::fs::write(dir.join("drop_reps.txt"), drop_ratio_report(routers))?;
    std::fs::write(dir.join("buffer_occupancy.txt"), occupancy_report(sampler))?;
    std::fs::write(dir.join("diagnostics.json"), to_json(routers, sim_time)?)?;
    tracing::info!("Wrote reports for {} hosts to {}", routers.len(), dir.display());
    Ok(())
}
