use crate::constants::*;
use crate::types::SunPosition;
use std::f64::consts::TAU;

/// Simplified solar geometry for a fixed latitude. Day of year and hour are
/// taken as-is, with no calendar or time-zone handling.
#[derive(Debug, Clone, Copy)]
pub struct SunCalculator {
    latitude: f64,
}

impl SunCalculator {
    pub fn new(latitude: f64) -> Self {
        Self { latitude }
    }

    pub fn get_position(&self, day_of_year: i32, hour: f64) -> SunPosition {
        let declination = solar_declination(day_of_year);
        let hour_angle = hour_angle(day_of_year, hour);

        let lat_rad = self.latitude.to_radians();
        let dec_rad = declination.to_radians();
        let hour_rad = hour_angle.to_radians();

        // Solar elevation
        let sin_elevation =
            lat_rad.sin() * dec_rad.sin() + lat_rad.cos() * dec_rad.cos() * hour_rad.cos();
        let elevation = sin_elevation.clamp(-1.0, 1.0).asin();

        // Solar azimuth from north
        let cos_azimuth = (dec_rad.sin() - lat_rad.sin() * elevation.sin())
            / (lat_rad.cos() * elevation.cos());
        let azimuth = clamp_unit(cos_azimuth).acos().to_degrees();

        let azimuth_deg = if hour_angle > 0.0 {
            360.0 - azimuth
        } else {
            azimuth
        };

        SunPosition {
            elevation: elevation.to_degrees(),
            azimuth: azimuth_deg,
        }
    }

    /// Clock hour at which the hour angle is zero.
    pub fn calculate_solar_noon(&self, day_of_year: i32) -> f64 {
        SOLAR_NOON_HOUR - equation_of_time(day_of_year) / MINUTES_PER_HOUR
    }
}

/// Convenience wrapper around [`SunCalculator::get_position`].
pub fn solar_position(day_of_year: i32, hour: f64, latitude: f64) -> SunPosition {
    SunCalculator::new(latitude).get_position(day_of_year, hour)
}

/// Solar declination in degrees.
pub fn solar_declination(day_of_year: i32) -> f64 {
    let days = day_of_year as f64 - EQUINOX_DAY_OFFSET;
    DECLINATION_AMPLITUDE * (TAU / DECLINATION_PERIOD_DAYS * days).sin()
}

/// Equation of time in minutes.
pub fn equation_of_time(day_of_year: i32) -> f64 {
    let b = TAU / EOT_PERIOD_DAYS * (day_of_year as f64 - EQUINOX_DAY_OFFSET);
    EOT_SIN_2B * (2.0 * b).sin() - EOT_COS_B * b.cos() - EOT_SIN_B * b.sin()
}

/// Hour angle in degrees, negative before solar noon.
pub fn hour_angle(day_of_year: i32, hour: f64) -> f64 {
    let solar_time = hour + equation_of_time(day_of_year) / MINUTES_PER_HOUR;
    (solar_time - SOLAR_NOON_HOUR) * DEGREES_PER_HOUR
}

// NaN (poles, zenith) also ends up at a valid acos argument
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        1.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}
