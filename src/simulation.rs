use crate::constants::*;
use crate::shadow_engine::{accumulate_shadows, GroundGrid};
use crate::sun_position::SunCalculator;
use crate::tracker::calculate_tracker_state;
use crate::types::*;
use chrono::Month;
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::ops::Range;
use tracing::{debug, info};

pub const MONTHS_PER_YEAR: usize = 12;
/// Synthetic month length; the model has no calendar.
pub const DAYS_PER_MONTH: u32 = 30;
/// Every 5th day of each month is sampled.
pub const DAY_STEP: usize = 5;

/// Annual sampled simulation of one tracker array.
///
/// Owns nothing but a reference to the config and an optional progress bar,
/// so several runs can proceed side by side on different threads.
pub struct AnnualSimulation<'a> {
    config: &'a TrackerConfig,
    sun_calculator: SunCalculator,
    progress: ProgressBar,
}

impl<'a> AnnualSimulation<'a> {
    pub fn new(config: &'a TrackerConfig) -> Self {
        Self {
            config,
            sun_calculator: SunCalculator::new(config.latitude),
            progress: ProgressBar::hidden(),
        }
    }

    /// Reports one tick per sampled day.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        progress.set_length(sampled_day_count() as u64);
        self.progress = progress;
        self
    }

    pub fn run(&self) -> SimulationResult {
        let config = self.config;
        let hours = sample_hours(config);

        let mut grid = GroundGrid::for_array(config);
        let mut monthly_data = Vec::with_capacity(MONTHS_PER_YEAR);
        let mut hourly_heatmap = Vec::new();

        let mut daylight_hours = 0usize;
        let mut total_weighted_shade = 0.0;
        let mut total_irradiance = 0.0;

        debug!(
            "Sampling hours {:?} on every {}th day, {} rows",
            hours, DAY_STEP, config.number_of_rows
        );

        let mut month = Month::January;
        for m in 0..MONTHS_PER_YEAR as u32 {
            self.progress.set_message(month.name());

            let mut month_shade = 0.0;
            let mut month_irradiance = 0.0;

            for d in (0..DAYS_PER_MONTH).step_by(DAY_STEP) {
                let day = m * DAYS_PER_MONTH + d;

                for hour in hours.clone() {
                    let sun = self.sun_calculator.get_position(day as i32, hour as f64);
                    if !sun.is_above_horizon() {
                        continue;
                    }
                    daylight_hours += 1;

                    // Panel shading, irradiance weighted
                    let irradiance = clear_sky_irradiance(sun.elevation);
                    let state = calculate_tracker_state(sun.elevation, sun.azimuth, config);

                    let shade = state.shaded_fraction * irradiance;
                    month_shade += shade;
                    month_irradiance += irradiance;
                    total_weighted_shade += shade;
                    total_irradiance += irradiance;

                    hourly_heatmap.push(HeatmapPoint {
                        day,
                        hour: hour as u32,
                        shading: state.shaded_fraction,
                        irradiance,
                    });

                    // Ground shadow, frequency weighted
                    accumulate_shadows(&mut grid, config, state.angle, &sun.direction());
                }

                self.progress.inc(1);
            }

            monthly_data.push(MonthlyStat {
                month: month_label(month),
                avg_shading: ratio(month_shade, month_irradiance),
                total_irradiance: month_irradiance,
            });
            month = month.succ();
        }

        let ground_heatmap_2d = grid.normalize(daylight_hours);
        let shading_loss_percent = ratio(total_weighted_shade, total_irradiance) * 100.0;

        self.progress.finish_with_message("Simulation complete");
        info!(
            "Simulated {} daylight hours: shading loss {:.2}%, ASWA {:.0}",
            daylight_hours, shading_loss_percent, total_weighted_shade
        );

        SimulationResult {
            total_aswa: total_weighted_shade,
            shading_loss_percent,
            monthly_data,
            hourly_heatmap,
            ground_heatmap_2d,
        }
    }
}

/// Runs the annual simulation with no progress reporting.
pub fn simulate_year(config: &TrackerConfig) -> SimulationResult {
    AnnualSimulation::new(config).run()
}

/// Sun and tracker state at one moment, without the annual loop.
pub fn instantaneous_state(day_of_year: i32, hour: f64, config: &TrackerConfig) -> InstantaneousState {
    let sun = SunCalculator::new(config.latitude).get_position(day_of_year, hour);
    let state = calculate_tracker_state(sun.elevation, sun.azimuth, config);

    let az_rad = sun.azimuth.to_radians();
    let el_rad = sun.elevation.to_radians();

    // Sun vector in the east-west display plane
    let vis_x = -el_rad.cos() * az_rad.sin();
    let vis_y = el_rad.sin();

    InstantaneousState {
        tracker_angle: state.angle,
        sun_elevation: sun.elevation,
        sun_azimuth: sun.azimuth,
        profile_angle_rad: vis_y.atan2(vis_x),
        is_valid: sun.is_above_horizon(),
    }
}

/// Simulates the same array at each pitch in `spacings`, in parallel.
/// Results come back in input order.
pub fn sweep_row_spacing(config: &TrackerConfig, spacings: &[f64]) -> Vec<SpacingSweepPoint> {
    spacings
        .par_iter()
        .map(|&row_spacing| {
            let candidate = TrackerConfig {
                row_spacing,
                ..config.clone()
            };
            let result = simulate_year(&candidate);
            debug!(
                "Pitch {:.2} m: loss {:.3}%",
                row_spacing, result.shading_loss_percent
            );

            SpacingSweepPoint {
                row_spacing,
                ground_coverage_ratio: candidate.ground_coverage_ratio(),
                shading_loss_percent: result.shading_loss_percent,
                total_aswa: result.total_aswa,
            }
        })
        .collect()
}

/// Sampled clock hours. At least one hour is always sampled, even when
/// `start_time >= end_time`.
pub fn sample_hours(config: &TrackerConfig) -> Range<i32> {
    let start = config.start_time.clamp(0, 23);
    let end = config.end_time.min(24).max(start + 1);
    start..end
}

/// Kasten–Young relative air mass for a zenith angle in degrees.
pub fn air_mass(zenith: f64) -> f64 {
    1.0 / (zenith.to_radians().cos()
        + KASTEN_YOUNG_A * (KASTEN_YOUNG_B - zenith).powf(KASTEN_YOUNG_C))
}

/// Simplified clear-sky beam irradiance in W/m².
pub fn clear_sky_irradiance(sun_elevation: f64) -> f64 {
    let am = air_mass(90.0 - sun_elevation);
    SOLAR_CONSTANT * ATMOSPHERIC_TRANSMITTANCE.powf(am.powf(AIR_MASS_EXPONENT))
}

fn sampled_day_count() -> usize {
    MONTHS_PER_YEAR * (DAYS_PER_MONTH as usize).div_ceil(DAY_STEP)
}

fn month_label(month: Month) -> String {
    month.name().chars().take(3).collect()
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_time_window_still_samples_one_hour() {
        let config = TrackerConfig {
            start_time: 14,
            end_time: 9,
            ..TrackerConfig::default()
        };
        assert_eq!(sample_hours(&config), 14..15);

        let config = TrackerConfig {
            start_time: 30,
            end_time: 40,
            ..TrackerConfig::default()
        };
        assert_eq!(sample_hours(&config), 23..24);

        let config = TrackerConfig {
            start_time: -3,
            end_time: 2,
            ..TrackerConfig::default()
        };
        assert_eq!(sample_hours(&config), 0..2);
    }

    #[test]
    fn air_mass_is_one_at_zenith_and_grows_toward_horizon() {
        assert!((air_mass(0.0) - 1.0).abs() < 1e-3);
        assert!(air_mass(60.0) > 1.9 && air_mass(60.0) < 2.1);
        assert!(air_mass(89.0) > air_mass(80.0));
    }

    #[test]
    fn clear_sky_irradiance_is_bounded_by_solar_constant() {
        let overhead = clear_sky_irradiance(90.0);
        assert!(overhead > 900.0 && overhead < SOLAR_CONSTANT);
        assert!(clear_sky_irradiance(10.0) < overhead);
    }

    #[test]
    fn month_labels_are_three_letters() {
        assert_eq!(month_label(Month::January), "Jan");
        assert_eq!(month_label(Month::September), "Sep");
        assert_eq!(sampled_day_count(), 72);
    }

    #[test]
    fn ratio_falls_back_to_zero() {
        assert_eq!(ratio(5.0, 0.0), 0.0);
        assert_eq!(ratio(1.0, 4.0), 0.25);
    }

    #[test]
    fn instantaneous_state_marks_night_invalid() {
        let config = TrackerConfig::default();
        let night = instantaneous_state(172, 0.0, &config);
        assert!(!night.is_valid);
        assert_eq!(night.tracker_angle, 0.0);

        let morning = instantaneous_state(172, 9.0, &config);
        assert!(morning.is_valid);
        assert!(morning.tracker_angle < 0.0);
        // Morning sun sits on the east (negative x display) side
        assert!(morning.profile_angle_rad > std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn progress_counts_sampled_days() {
        let config = TrackerConfig {
            number_of_rows: 1,
            start_time: 12,
            end_time: 13,
            ..TrackerConfig::default()
        };
        let progress = ProgressBar::hidden();
        AnnualSimulation::new(&config)
            .with_progress(progress.clone())
            .run();
        assert_eq!(progress.position(), 72);
    }
}
