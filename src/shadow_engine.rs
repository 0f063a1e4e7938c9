use crate::constants::MIN_SUN_Z;
use crate::types::{GroundHeatmap, SunVector, TrackerConfig};
use geo::BoundingRect;
use geo_types::{Coord, LineString, Polygon};
use ndarray::Array2;
use tracing::debug;

/// Ground cell size in meters.
pub const GRID_RESOLUTION: f64 = 0.1;
/// Padding around the array footprint, east/west and north/south.
pub const GRID_MARGIN_X: f64 = 10.0;
pub const GRID_MARGIN_Y: f64 = 10.0;

/// Shadow hit counts on a ground raster centred on the array.
///
/// A cell is counted at most once per sample, however many row shadows
/// overlap it, so normalized values stay within [0, 1]. The geometry is fixed
/// at construction and the grid is only handed out through
/// [`GroundGrid::normalize`], which consumes it.
#[derive(Debug, Clone)]
pub struct GroundGrid {
    hits: Array2<f32>,
    last_sample: Array2<u32>,
    sample: u32,
    x_min: f64,
    y_min: f64,
    resolution: f64,
}

impl GroundGrid {
    pub fn for_array(config: &TrackerConfig) -> Self {
        let array_width = config.array_width();
        let array_length = config.tracker_length;

        let x_min = -array_width / 2.0 - GRID_MARGIN_X;
        let x_max = array_width / 2.0 + GRID_MARGIN_X;
        let y_min = -array_length / 2.0 - GRID_MARGIN_Y;
        let y_max = array_length / 2.0 + GRID_MARGIN_Y;

        let width = ((x_max - x_min) / GRID_RESOLUTION).ceil().max(0.0) as usize;
        let height = ((y_max - y_min) / GRID_RESOLUTION).ceil().max(0.0) as usize;

        debug!(
            "Ground grid {}x{} cells at {} m, origin ({:.2}, {:.2})",
            width, height, GRID_RESOLUTION, x_min, y_min
        );

        Self {
            hits: Array2::zeros((height, width)),
            last_sample: Array2::zeros((height, width)),
            sample: 1,
            x_min,
            y_min,
            resolution: GRID_RESOLUTION,
        }
    }

    pub fn width(&self) -> usize {
        self.hits.ncols()
    }

    pub fn height(&self) -> usize {
        self.hits.nrows()
    }

    pub fn hits(&self) -> &Array2<f32> {
        &self.hits
    }

    pub fn total_hits(&self) -> f64 {
        self.hits.iter().map(|&h| h as f64).sum()
    }

    fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.x_min + (col as f64 + 0.5) * self.resolution,
            self.y_min + (row as f64 + 0.5) * self.resolution,
        )
    }

    /// Closes the current sample; later polygons may hit the same cells again.
    pub fn next_sample(&mut self) {
        self.sample += 1;
    }

    /// Adds one hit to every cell whose centre lies inside `polygon` and that
    /// has not been hit yet in the current sample. Only the polygon's
    /// bounding box, clamped to the grid, is scanned.
    pub fn rasterize_polygon(&mut self, polygon: &Polygon<f64>) {
        let rect = match polygon.bounding_rect() {
            Some(rect) => rect,
            None => return,
        };

        let (width, height) = (self.width() as i64, self.height() as i64);
        let col_min = (((rect.min().x - self.x_min) / self.resolution).floor() as i64).max(0);
        let col_max = (((rect.max().x - self.x_min) / self.resolution).floor() as i64).min(width - 1);
        let row_min = (((rect.min().y - self.y_min) / self.resolution).floor() as i64).max(0);
        let row_max = (((rect.max().y - self.y_min) / self.resolution).floor() as i64).min(height - 1);

        if col_max < col_min || row_max < row_min {
            return;
        }

        for row in row_min as usize..=row_max as usize {
            for col in col_min as usize..=col_max as usize {
                let (x, y) = self.cell_center(col, row);
                if self.last_sample[[row, col]] != self.sample
                    && contains_even_odd(polygon.exterior(), x, y)
                {
                    self.hits[[row, col]] += 1.0;
                    self.last_sample[[row, col]] = self.sample;
                }
            }
        }
    }

    /// Converts hit counts into the fraction of `daylight_hours` each cell
    /// was shadowed.
    pub fn normalize(self, daylight_hours: usize) -> GroundHeatmap {
        let (height, width) = self.hits.dim();
        let mut grid = self.hits;

        if daylight_hours > 0 {
            let samples = daylight_hours as f32;
            grid.par_mapv_inplace(|hits| hits / samples);
        } else {
            grid.fill(0.0);
        }

        GroundHeatmap {
            grid,
            width,
            height,
            resolution: self.resolution,
            x_min: self.x_min,
            y_min: self.y_min,
        }
    }
}

/// Cross-axis position of a row's rotation axis. Row 0 is the westernmost.
pub fn row_hub_x(row: usize, number_of_rows: usize, row_spacing: f64) -> f64 {
    (row as f64 - (number_of_rows as f64 - 1.0) / 2.0) * row_spacing
}

/// Corners of one tilted panel in world coordinates (x east, y north, z up).
pub fn panel_corners(config: &TrackerConfig, tilt_deg: f64, row: usize) -> [(f64, f64, f64); 4] {
    let theta = tilt_deg.to_radians();
    let half_w = config.panel_chord / 2.0;
    let half_l = config.tracker_length / 2.0;

    let hub_x = row_hub_x(row, config.number_of_rows, config.row_spacing);
    let hub_z = config.hub_height;

    let dx = half_w * theta.cos();
    let dz = half_w * theta.sin();

    [
        (hub_x + dx, half_l, hub_z + dz),
        (hub_x + dx, -half_l, hub_z + dz),
        (hub_x - dx, -half_l, hub_z - dz),
        (hub_x - dx, half_l, hub_z - dz),
    ]
}

/// Parallel projection of `point` onto z = 0 along the sun direction.
pub fn project_to_ground(point: (f64, f64, f64), sun: &SunVector) -> Coord<f64> {
    let (px, py, pz) = point;
    let t = pz / sun.z;
    Coord {
        x: px - t * sun.x,
        y: py - t * sun.y,
    }
}

/// Shadow of one row's panel on the ground, or `None` when the sun does not
/// rise above the ground plane.
pub fn row_shadow(
    config: &TrackerConfig,
    tilt_deg: f64,
    row: usize,
    sun: &SunVector,
) -> Option<Polygon<f64>> {
    if sun.z <= MIN_SUN_Z {
        return None;
    }

    let ring: Vec<Coord<f64>> = panel_corners(config, tilt_deg, row)
        .iter()
        .map(|&corner| project_to_ground(corner, sun))
        .collect();

    Some(Polygon::new(LineString::from(ring), vec![]))
}

/// Rasterizes the shadow of every row for one sun position as one sample.
pub fn accumulate_shadows(
    grid: &mut GroundGrid,
    config: &TrackerConfig,
    tilt_deg: f64,
    sun: &SunVector,
) {
    for row in 0..config.number_of_rows {
        if let Some(shadow) = row_shadow(config, tilt_deg, row, sun) {
            grid.rasterize_polygon(&shadow);
        }
    }
    grid.next_sample();
}

// Even-odd crossing test against the ring's edges
fn contains_even_odd(ring: &LineString<f64>, x: f64, y: f64) -> bool {
    let mut inside = false;
    for edge in ring.lines() {
        let (xi, yi) = (edge.start.x, edge.start.y);
        let (xj, yj) = (edge.end.x, edge.end.y);

        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SunPosition;

    fn single_row() -> TrackerConfig {
        TrackerConfig {
            number_of_rows: 1,
            ..TrackerConfig::default()
        }
    }

    #[test]
    fn grid_geometry_follows_array_footprint() {
        let config = TrackerConfig::default();
        let grid = GroundGrid::for_array(&config);

        assert_eq!(grid.width(), ((22.0 + 20.0) / 0.1_f64).ceil() as usize);
        assert_eq!(grid.height(), ((20.0 + 20.0) / 0.1_f64).ceil() as usize);
        assert_eq!(grid.total_hits(), 0.0);

        let heatmap = grid.normalize(0);
        assert!((heatmap.x_min + 21.0).abs() < 1e-12);
        assert!((heatmap.y_min + 20.0).abs() < 1e-12);
    }

    #[test]
    fn rows_are_symmetric_about_origin() {
        assert_eq!(row_hub_x(0, 5, 5.0), -10.0);
        assert_eq!(row_hub_x(2, 5, 5.0), 0.0);
        assert_eq!(row_hub_x(4, 5, 5.0), 10.0);
        assert_eq!(row_hub_x(0, 1, 5.0), 0.0);
    }

    #[test]
    fn projection_lands_on_ground_opposite_the_sun() {
        let sun = SunPosition {
            elevation: 45.0,
            azimuth: 90.0,
        }
        .direction();
        let p = project_to_ground((0.0, 0.0, 2.0), &sun);
        // Sun in the east throws the shadow west by height / tan(elevation)
        assert!((p.x + 2.0).abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
    }

    #[test]
    fn even_odd_handles_points_inside_and_outside() {
        let ring = LineString::from(vec![(0.0, 0.0), (2.0, 0.0), (2.0, 1.0), (0.0, 1.0)]);
        let square = Polygon::new(ring, vec![]);
        assert!(contains_even_odd(square.exterior(), 1.0, 0.5));
        assert!(!contains_even_odd(square.exterior(), 2.5, 0.5));
        assert!(!contains_even_odd(square.exterior(), 1.0, -0.1));
    }

    #[test]
    fn overhead_sun_shadows_the_panel_footprint() {
        let config = single_row();
        let mut grid = GroundGrid::for_array(&config);
        let sun = SunPosition {
            elevation: 90.0,
            azimuth: 180.0,
        }
        .direction();

        accumulate_shadows(&mut grid, &config, 0.0, &sun);

        let footprint_cells = (config.panel_chord * config.tracker_length)
            / (GRID_RESOLUTION * GRID_RESOLUTION);
        let hits = grid.total_hits();
        assert!((hits - footprint_cells).abs() / footprint_cells < 0.02, "hits {}", hits);
        assert!(grid.hits().iter().all(|&h| h == 0.0 || h == 1.0));
    }

    #[test]
    fn horizon_sun_leaves_grid_untouched() {
        let config = single_row();
        let mut grid = GroundGrid::for_array(&config);
        let sun = SunPosition {
            elevation: 0.0,
            azimuth: 90.0,
        }
        .direction();

        accumulate_shadows(&mut grid, &config, 0.0, &sun);
        assert_eq!(grid.total_hits(), 0.0);
    }

    #[test]
    fn shadow_outside_grid_is_clipped() {
        let config = single_row();
        let mut grid = GroundGrid::for_array(&config);
        // Very low sun pushes the shadow far beyond the 10 m margin
        let sun = SunPosition {
            elevation: 1.0,
            azimuth: 90.0,
        }
        .direction();

        accumulate_shadows(&mut grid, &config, 0.0, &sun);
        assert_eq!(grid.total_hits(), 0.0);
    }

    #[test]
    fn overlapping_shadows_count_once_per_sample() {
        let config = TrackerConfig::default();
        let mut grid = GroundGrid::for_array(&config);
        let square = |x0: f64| {
            Polygon::new(
                LineString::from(vec![(x0, 0.0), (x0 + 1.0, 0.0), (x0 + 1.0, 1.0), (x0, 1.0)]),
                vec![],
            )
        };

        grid.rasterize_polygon(&square(0.0));
        grid.rasterize_polygon(&square(0.5));
        assert!(grid.hits().iter().all(|&h| h <= 1.0));
        let single_sample = grid.total_hits();
        assert!((single_sample - 150.0).abs() <= 10.0, "hits {}", single_sample);

        grid.next_sample();
        grid.rasterize_polygon(&square(0.0));
        assert_eq!(grid.hits().iter().cloned().fold(0.0_f32, f32::max), 2.0);
    }

    #[test]
    fn low_sun_shadows_of_all_rows_stay_normalized() {
        let config = TrackerConfig::default();
        let mut grid = GroundGrid::for_array(&config);
        let sun = SunPosition {
            elevation: 8.0,
            azimuth: 100.0,
        }
        .direction();

        accumulate_shadows(&mut grid, &config, -60.0, &sun);
        let heatmap = grid.normalize(1);
        assert!(heatmap.grid.iter().any(|&v| v == 1.0));
        assert!(heatmap.grid.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn normalize_divides_by_daylight_hours() {
        let config = single_row();
        let mut grid = GroundGrid::for_array(&config);
        let sun = SunPosition {
            elevation: 60.0,
            azimuth: 120.0,
        }
        .direction();

        for _ in 0..3 {
            accumulate_shadows(&mut grid, &config, -20.0, &sun);
        }
        let heatmap = grid.normalize(4);

        let max = heatmap.grid.iter().cloned().fold(0.0_f32, f32::max);
        assert!((max - 0.75).abs() < 1e-6);
        assert!(heatmap.grid.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }
}
