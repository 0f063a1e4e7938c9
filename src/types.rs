use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackerConfig {
    pub latitude: f64,
    pub longitude: f64, // Informational only, the model is longitude-free
    pub panel_chord: f64,
    pub tracker_length: f64,
    pub row_spacing: f64,
    pub hub_height: f64,
    pub backtracking: bool,
    pub max_rotation: f64,
    pub number_of_rows: usize,
    pub start_time: i32,
    pub end_time: i32,
}

impl Default for TrackerConfig {
    // Portland, ME reference array
    fn default() -> Self {
        Self {
            latitude: 43.66,
            longitude: -70.25,
            panel_chord: 2.0,
            tracker_length: 20.0,
            row_spacing: 5.0,
            hub_height: 1.5,
            backtracking: false,
            max_rotation: 60.0,
            number_of_rows: 5,
            start_time: 10,
            end_time: 15,
        }
    }
}

impl TrackerConfig {
    /// Reads a JSON config. Missing fields fall back to [`TrackerConfig::default`].
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let config = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(config)
    }

    pub fn ground_coverage_ratio(&self) -> f64 {
        if self.row_spacing > 0.0 {
            self.panel_chord / self.row_spacing
        } else {
            0.0
        }
    }

    /// Cross-axis extent of the array from the outer edge of row 0 to the
    /// outer edge of the last row, at zero tilt.
    pub fn array_width(&self) -> f64 {
        self.number_of_rows.saturating_sub(1) as f64 * self.row_spacing + self.panel_chord
    }

    /// Checks the ranges accepted by the input layer. The simulation itself
    /// never calls this and stays total over any numeric input.
    pub fn validate(&self) -> Result<()> {
        check_range("latitude", self.latitude, -90.0, 90.0)?;
        check_range("longitude", self.longitude, -180.0, 180.0)?;
        check_positive("panelChord", self.panel_chord)?;
        check_positive("trackerLength", self.tracker_length)?;
        check_positive("rowSpacing", self.row_spacing)?;
        if !(self.hub_height.is_finite() && self.hub_height >= 0.0) {
            return Err(invalid("hubHeight", self.hub_height, "must be at or above ground"));
        }

        if !(0.0..90.0).contains(&self.max_rotation) {
            return Err(invalid(
                "maxRotation",
                self.max_rotation,
                "must be in [0, 90) degrees",
            ));
        }
        if self.number_of_rows == 0 {
            return Err(invalid("numberOfRows", 0, "at least one row is required"));
        }
        if !(0..=23).contains(&self.start_time) {
            return Err(invalid("startTime", self.start_time, "must be in [0, 23]"));
        }
        if !(1..=24).contains(&self.end_time) {
            return Err(invalid("endTime", self.end_time, "must be in [1, 24]"));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, value: impl ToString, reason: &str) -> SimulationError {
    SimulationError::InvalidParameter {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn check_range(name: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(invalid(name, value, &format!("must be in [{}, {}]", min, max)))
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, value, "must be a positive length in meters"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunPosition {
    pub elevation: f64,
    pub azimuth: f64,
}

impl SunPosition {
    pub fn is_above_horizon(&self) -> bool {
        self.elevation > 0.0
    }

    /// Unit vector pointing at the sun: x east, y north, z up.
    pub fn direction(&self) -> SunVector {
        let az_rad = self.azimuth.to_radians();
        let el_rad = self.elevation.to_radians();

        SunVector {
            x: az_rad.sin() * el_rad.cos(),
            y: az_rad.cos() * el_rad.cos(),
            z: el_rad.sin(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerState {
    pub angle: f64,
    pub shaded_fraction: f64,
}

impl TrackerState {
    pub const STOWED: TrackerState = TrackerState {
        angle: 0.0,
        shaded_fraction: 0.0,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStat {
    pub month: String,
    pub avg_shading: f64,
    pub total_irradiance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPoint {
    pub day: u32,
    pub hour: u32,
    pub shading: f64,
    pub irradiance: f64,
}

/// Normalized ground shadow density: fraction of sampled daylight hours each
/// cell was shadowed. Row `j` of `grid` is `y_min + j * resolution`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundHeatmap {
    pub grid: Array2<f32>,
    pub width: usize,
    pub height: usize,
    pub resolution: f64,
    pub x_min: f64,
    pub y_min: f64,
}

impl GroundHeatmap {
    /// World coordinates of the centre of cell (`col`, `row`).
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.x_min + (col as f64 + 0.5) * self.resolution,
            self.y_min + (row as f64 + 0.5) * self.resolution,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    #[serde(rename = "totalASWA")]
    pub total_aswa: f64,
    pub shading_loss_percent: f64,
    pub monthly_data: Vec<MonthlyStat>,
    pub hourly_heatmap: Vec<HeatmapPoint>,
    #[serde(rename = "groundHeatmap2D")]
    pub ground_heatmap_2d: GroundHeatmap,
}

/// Single-moment snapshot for interactive views.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantaneousState {
    pub tracker_angle: f64,
    pub sun_elevation: f64,
    pub sun_azimuth: f64,
    pub profile_angle_rad: f64,
    pub is_valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacingSweepPoint {
    pub row_spacing: f64,
    pub ground_coverage_ratio: f64,
    pub shading_loss_percent: f64,
    #[serde(rename = "totalASWA")]
    pub total_aswa: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, SimulationError>;
