use nalgebra::Vector3;
use rinex::prelude::Constellation;

use crate::{
    assembler::{DEFAULT_TOW_EPSILON, MAX_CHANNELS},
    builder::DEFAULT_CN0_DBHZ,
    Error,
};

/// Processing [Config]uration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Receiver channel count. Channels beyond this count are still
    /// processed, but reported.
    pub channels: usize,
    /// Epoch boundary detection tolerance (s)
    pub tow_epsilon_s: f64,
    /// Observed constellation
    pub constellation: Constellation,
    /// C/N0 estimate (dB.Hz) reported for every signal
    pub cn0_estimate_dbhz: f64,
    /// Releases the last (possibly incomplete) epoch at the end of the stream,
    /// instead of dropping it.
    pub flush_on_eof: bool,
    /// Reference ECEF position (m), for error reporting
    pub reference_ecef_m: Option<Vector3<f64>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            channels: 8,
            tow_epsilon_s: DEFAULT_TOW_EPSILON,
            constellation: Constellation::GPS,
            cn0_estimate_dbhz: DEFAULT_CN0_DBHZ,
            flush_on_eof: false,
            reference_ecef_m: None,
        }
    }
}

impl Config {
    /// Builds a [Config] for `channels` receiver channels.
    pub fn with_channels(channels: usize) -> Result<Self, Error> {
        if channels > MAX_CHANNELS {
            return Err(Error::InvalidChannelCount(channels));
        }
        Ok(Self {
            channels,
            ..Default::default()
        })
    }

    pub fn with_reference(&self, reference_ecef_m: Vector3<f64>) -> Self {
        let mut s = self.clone();
        s.reference_ecef_m = Some(reference_ecef_m);
        s
    }

    pub fn with_constellation(&self, constellation: Constellation) -> Self {
        let mut s = self.clone();
        s.constellation = constellation;
        s
    }

    pub fn with_tow_epsilon(&self, epsilon_s: f64) -> Self {
        let mut s = self.clone();
        s.tow_epsilon_s = epsilon_s;
        s
    }

    pub fn with_cn0_estimate(&self, cn0_dbhz: f64) -> Self {
        let mut s = self.clone();
        s.cn0_estimate_dbhz = cn0_dbhz;
        s
    }

    pub fn with_flush_on_eof(&self, flush: bool) -> Self {
        let mut s = self.clone();
        s.flush_on_eof = flush;
        s
    }
}
