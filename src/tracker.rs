use crate::constants::PROFILE_SLOPE_SENTINEL;
use crate::types::{TrackerConfig, TrackerState};

/// Rotation and inter-row shading of a north-south single-axis tracker.
///
/// Shading is a 1D cross-axis model: rows are identical and infinitely long,
/// so end effects along the tracker length are ignored. With backtracking
/// enabled the rows are assumed never to shade each other, and a single row
/// has no neighbour to shade.
pub fn calculate_tracker_state(
    sun_elevation: f64,
    sun_azimuth: f64,
    config: &TrackerConfig,
) -> TrackerState {
    if sun_elevation <= 0.0 {
        return TrackerState::STOWED;
    }

    let angle = ideal_rotation(sun_elevation, sun_azimuth, config.max_rotation);

    if config.backtracking || config.number_of_rows < 2 {
        return TrackerState {
            angle,
            shaded_fraction: 0.0,
        };
    }

    let profile_angle = profile_slope(sun_elevation, sun_azimuth).atan();
    let shaded_fraction = shaded_fraction(
        angle.to_radians().abs(),
        profile_angle,
        config.panel_chord,
        config.row_spacing,
    );

    TrackerState {
        angle,
        shaded_fraction,
    }
}

/// True-tracking angle in degrees, clamped to `±max_rotation`.
pub fn ideal_rotation(sun_elevation: f64, sun_azimuth: f64, max_rotation: f64) -> f64 {
    let zenith = 90.0 - sun_elevation;
    let azimuth_south = sun_azimuth - 180.0;

    let theta = (zenith.to_radians().tan() * azimuth_south.to_radians().sin())
        .atan()
        .to_degrees();

    // f64::clamp would panic on a negative limit
    theta.max(-max_rotation).min(max_rotation)
}

/// Tangent of the sun's profile angle in the plane across the tracker axis.
pub fn profile_slope(sun_elevation: f64, sun_azimuth: f64) -> f64 {
    let tan_profile =
        sun_elevation.to_radians().tan() / sun_azimuth.to_radians().sin().abs();

    if tan_profile.is_finite() {
        tan_profile
    } else {
        PROFILE_SLOPE_SENTINEL
    }
}

/// Fraction of the chord of the next row covered by this row's shadow.
fn shaded_fraction(theta_abs: f64, profile_angle: f64, chord: f64, pitch: f64) -> f64 {
    let half_width = chord / 2.0;

    let shadow_tip = half_width * theta_abs.cos()
        + half_width * theta_abs.sin() / profile_angle.tan();
    let victim_edge = pitch - half_width * theta_abs.cos();
    let overlap = shadow_tip - victim_edge;

    if overlap > 0.0 {
        (overlap / (chord * theta_abs.cos())).min(1.0).max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sun_position::SunCalculator;

    fn config(backtracking: bool) -> TrackerConfig {
        TrackerConfig {
            backtracking,
            ..TrackerConfig::default()
        }
    }

    #[test]
    fn night_parks_flat() {
        let state = calculate_tracker_state(-5.0, 90.0, &config(false));
        assert_eq!(state, TrackerState::STOWED);
        let state = calculate_tracker_state(0.0, 270.0, &config(false));
        assert_eq!(state, TrackerState::STOWED);
    }

    #[test]
    fn rotation_follows_sun_east_to_west() {
        let cfg = config(false);
        let morning = calculate_tracker_state(20.0, 100.0, &cfg);
        let afternoon = calculate_tracker_state(20.0, 260.0, &cfg);
        assert!(morning.angle < 0.0);
        assert!(afternoon.angle > 0.0);
        assert!((morning.angle + afternoon.angle).abs() < 1e-9);
    }

    #[test]
    fn low_sun_hits_rotation_limit_and_shades() {
        let cfg = config(false);
        let state = calculate_tracker_state(5.0, 95.0, &cfg);
        assert_eq!(state.angle, -cfg.max_rotation);
        assert!(state.shaded_fraction > 0.0);
        assert!(state.shaded_fraction <= 1.0);
    }

    #[test]
    fn backtracking_clamps_but_never_shades() {
        let cfg = config(true);
        let state = calculate_tracker_state(5.0, 95.0, &cfg);
        assert_eq!(state.angle, -cfg.max_rotation);
        assert_eq!(state.shaded_fraction, 0.0);
    }

    #[test]
    fn lone_row_is_never_shaded() {
        let cfg = TrackerConfig {
            number_of_rows: 1,
            ..config(false)
        };
        let state = calculate_tracker_state(5.0, 95.0, &cfg);
        assert_eq!(state.angle, -cfg.max_rotation);
        assert_eq!(state.shaded_fraction, 0.0);
    }

    #[test]
    fn high_sun_casts_no_inter_row_shade() {
        let state = calculate_tracker_state(65.0, 180.0, &config(false));
        assert_eq!(state.shaded_fraction, 0.0);
        assert!(state.angle.abs() < 1e-9);
    }

    #[test]
    fn sun_in_axis_plane_uses_sentinel_slope() {
        assert_eq!(profile_slope(30.0, 0.0), PROFILE_SLOPE_SENTINEL);
        assert!(profile_slope(30.0, 90.0).is_finite());
    }

    #[test]
    fn angle_and_fraction_stay_in_bounds_over_the_sky() {
        for max_rotation in [0.0, 30.0, 45.0, 60.0, 85.0] {
            let cfg = TrackerConfig {
                max_rotation,
                row_spacing: 3.0,
                ..TrackerConfig::default()
            };
            for el in (-10..=90).step_by(5) {
                for az in (0..360).step_by(7) {
                    let state = calculate_tracker_state(el as f64, az as f64, &cfg);
                    assert!(state.angle.abs() <= max_rotation + 1e-12);
                    assert!((0.0..=1.0).contains(&state.shaded_fraction));
                }
            }
        }
    }

    #[test]
    fn state_from_computed_sun_position() {
        let sun = SunCalculator::new(43.66).get_position(355, 8.0);
        let state = calculate_tracker_state(sun.elevation, sun.azimuth, &config(false));
        assert!(sun.elevation > 0.0);
        assert!(state.angle < 0.0);
        assert!(state.shaded_fraction > 0.0);
    }
}
