use crate::types::{SimulationResult, SpacingSweepPoint, TrackerConfig};
use std::fmt::Write;

/// Plain-text engineering summary of one simulation run.
pub fn summary(config: &TrackerConfig, result: &SimulationResult) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "Single-axis tracker shading summary");
    let _ = writeln!(
        out,
        "  Location:            {:.2}, {:.2}",
        config.latitude, config.longitude
    );
    let _ = writeln!(out, "  Panel chord:         {} m", config.panel_chord);
    let _ = writeln!(out, "  Row spacing (pitch): {} m", config.row_spacing);
    let _ = writeln!(
        out,
        "  GCR:                 {:.2}",
        config.ground_coverage_ratio()
    );
    let _ = writeln!(out, "  Rows:                {}", config.number_of_rows);
    let _ = writeln!(out, "  Backtracking:        {}", config.backtracking);
    let _ = writeln!(
        out,
        "  Shading loss:        {:.2}%",
        result.shading_loss_percent
    );
    let _ = writeln!(out, "  Shade-weighted sum:  {:.0}", result.total_aswa);
    let _ = writeln!(out, "  Daylight samples:    {}", result.hourly_heatmap.len());

    let _ = writeln!(out);
    let _ = writeln!(out, "  Month  Avg shading  Irradiance");
    for stat in &result.monthly_data {
        let _ = writeln!(
            out,
            "  {:<5}  {:>10.2}%  {:>10.0}",
            stat.month,
            stat.avg_shading * 100.0,
            stat.total_irradiance
        );
    }

    out
}

pub fn sweep_table(points: &[SpacingSweepPoint]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  Pitch [m]   GCR    Loss [%]");
    for point in points {
        let _ = writeln!(
            out,
            "  {:>9.2}  {:>5.2}  {:>9.3}",
            point.row_spacing, point.ground_coverage_ratio, point.shading_loss_percent
        );
    }
    out
}
