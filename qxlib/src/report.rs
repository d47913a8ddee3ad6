//! Position error reporting, against a known reference position.
use std::{fmt, io::Write};

use hifitime::{Epoch, TimeScale};
use map_3d::{ecef2enu, ecef2geodetic, Ellipsoid};
use nalgebra::Vector3;

use crate::{engine::Solution, Error};

/// Solution error, with respect to the reference position
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PositionError {
    /// GPST seconds of week of the solution
    pub tow: f64,
    /// Horizontal (east, north) error (m)
    pub horizontal_m: f64,
    /// 3D error (m)
    pub total_m: f64,
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.3}; {:.4}; {:.4}", self.tow, self.horizontal_m, self.total_m)
    }
}

#[derive(Debug, Clone)]
pub struct ErrorReporter {
    /// ECEF reference (m)
    reference: Vector3<f64>,
    /// Geodetic reference (rad, rad, m)
    geodetic: (f64, f64, f64),
}

impl ErrorReporter {
    pub fn new(reference_ecef_m: Vector3<f64>) -> Self {
        let geodetic = ecef2geodetic(
            reference_ecef_m[0],
            reference_ecef_m[1],
            reference_ecef_m[2],
            Ellipsoid::WGS84,
        );
        Self {
            reference: reference_ecef_m,
            geodetic,
        }
    }

    /// Computes the error of `solution`.
    pub fn error(&self, solution: &Solution) -> PositionError {
        let position = solution.position_ecef_m;
        let total_m = (position - self.reference).norm();

        let (lat, lon, alt) = self.geodetic;
        let (east, north, _) = ecef2enu(
            position[0],
            position[1],
            position[2],
            lat,
            lon,
            alt,
            Ellipsoid::WGS84,
        );

        PositionError {
            tow: seconds_of_week(solution.epoch),
            horizontal_m: (east * east + north * north).sqrt(),
            total_m,
        }
    }

    /// Computes the error of `solution` and writes it as a new report line.
    pub fn report<W: Write>(&self, solution: &Solution, w: &mut W) -> Result<PositionError, Error> {
        let error = self.error(solution);
        writeln!(w, "{}", error)?;
        Ok(error)
    }
}

fn seconds_of_week(epoch: Epoch) -> f64 {
    let (_, nanos) = epoch.to_time_scale(TimeScale::GPST).to_time_of_week();
    nanos as f64 * 1.0E-9
}
