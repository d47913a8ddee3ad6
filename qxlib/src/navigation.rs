use std::{fs::File, path::Path};

use hifitime::TimeScale;
use log::{debug, info};
use rinex::prelude::Rinex;

use crate::Error;

/// Navigation data provider. The core only needs the GPS week,
/// to convert receiver time of week into absolute time.
pub trait NavigationStore {
    /// GPS week of the navigation data set
    fn week(&self) -> Option<u32>;
}

/// Fixed, externally known GPS week
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StaticNavigation {
    pub week: u32,
}

impl NavigationStore for StaticNavigation {
    fn week(&self) -> Option<u32> {
        Some(self.week)
    }
}

/// Broadcast navigation data, parsed from a NAV RINEX file.
#[derive(Debug, Clone)]
pub struct RinexNavigation {
    rinex: Rinex,
    week: u32,
}

impl RinexNavigation {
    /// Parses a single NAV RINEX file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let rinex = Self::parse(path.as_ref())?;
        Self::from_rinex(rinex)
    }

    fn parse(path: &Path) -> Result<Rinex, Error> {
        debug!("parsing {}", path.display());

        // the parser does not report I/O errors
        File::open(path)
            .map_err(|e| Error::NavigationFile(format!("{}: {}", path.display(), e)))?;

        let rinex = Rinex::from_file(path)
            .map_err(|e| Error::NavigationFile(format!("{}: {}", path.display(), e)))?;

        if !rinex.is_navigation_rinex() {
            return Err(Error::NavigationFile(format!(
                "{}: not a navigation rinex",
                path.display()
            )));
        }
        Ok(rinex)
    }

    fn from_rinex(rinex: Rinex) -> Result<Self, Error> {
        let first = rinex.epoch_iter().next().ok_or(Error::NoNavigationData)?;
        let (week, _) = first.to_time_scale(TimeScale::GPST).to_time_of_week();
        info!("navigation data: first epoch {} (week {})", first, week);
        Ok(Self { rinex, week })
    }

    pub fn rinex(&self) -> &Rinex {
        &self.rinex
    }
}

impl NavigationStore for RinexNavigation {
    fn week(&self) -> Option<u32> {
        Some(self.week)
    }
}
