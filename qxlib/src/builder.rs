//! Epoch to positioning engine observation records.
use std::fmt;

use hifitime::Epoch;
use rinex::prelude::{Constellation, SV};

use crate::assembler::EpochBatch;

const SECONDS_PER_WEEK: u64 = 86400 * 7;

/// Frequency bands per record
pub const BANDS: usize = 3;

// satellite numbering follows the engine's multi constellation indexing,
// where Galileo vehicles come after GPS (32) and Glonass (27) vehicles
const NSAT_GPS: u16 = 32;
const NSAT_GLO: u16 = 27;

const SNR_MAX_DBHZ: f64 = 63.75;
const SNR_UNIT_DBHZ: f64 = 0.25;

/// Default C/N0 estimate (dB.Hz). The front-end does not report it yet.
pub const DEFAULT_CN0_DBHZ: f64 = 55.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SignalCode {
    L1C,
    L2S,
    L5X,
}

impl SignalCode {
    /// Tracked signal per band index
    pub fn from_band(band: usize) -> Option<Self> {
        match band {
            0 => Some(Self::L1C),
            1 => Some(Self::L2S),
            2 => Some(Self::L5X),
            _ => None,
        }
    }
}

impl fmt::Display for SignalCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::L1C => write!(f, "1C"),
            Self::L2S => write!(f, "2S"),
            Self::L5X => write!(f, "5X"),
        }
    }
}

/// Multi band observation of one satellite, at one epoch.
/// Only band 0 is populated at the moment.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRecord {
    /// Engine satellite number (constellation offset applied)
    pub satellite_id: u16,
    pub sv: SV,
    pub time: Epoch,
    pub pseudorange_m: [f64; BANDS],
    pub carrier_phase_cycles: [f64; BANDS],
    pub doppler_hz: [f64; BANDS],
    /// SNR in 0.25 dB.Hz units
    pub snr: [u16; BANDS],
    /// Loss of lock indicator
    pub lli: [u8; BANDS],
    pub code: [Option<SignalCode>; BANDS],
}

/// Converts GPS week and time of week (s) to [Epoch]
pub fn gpst_epoch(week: u32, tow: f64) -> Epoch {
    let mut tow = tow;
    if !(-1.0E9..=1.0E9).contains(&tow) {
        tow = 0.0;
    }
    Epoch::from_gpst_seconds((week as u64 * SECONDS_PER_WEEK) as f64 + tow)
}

/// Quantizes a C/N0 estimate (dB.Hz) to the 0..63.75 dB.Hz, 0.25 dB.Hz scale
pub fn quantize_snr(cn0_dbhz: f64) -> u16 {
    let cn0 = cn0_dbhz.clamp(0.0, SNR_MAX_DBHZ);
    (0.5 + cn0 / SNR_UNIT_DBHZ) as u16
}

#[derive(Debug, Clone)]
pub struct ObservationBuilder {
    constellation: Constellation,
    cn0_dbhz: f64,
}

impl Default for ObservationBuilder {
    fn default() -> Self {
        Self::new(Constellation::GPS, DEFAULT_CN0_DBHZ)
    }
}

impl ObservationBuilder {
    pub fn new(constellation: Constellation, cn0_dbhz: f64) -> Self {
        Self {
            constellation,
            cn0_dbhz,
        }
    }

    fn satellite_offset(&self) -> u16 {
        match self.constellation {
            Constellation::Galileo => NSAT_GPS + NSAT_GLO,
            _ => 0,
        }
    }

    /// Builds one record per primary frequency channel of `batch`, in channel order.
    /// Secondary frequency channels are dropped, so the result may be empty.
    pub fn build(&self, batch: &EpochBatch, week: u32) -> Vec<ObservationRecord> {
        let band = 0;
        let offset = self.satellite_offset();
        let snr = quantize_snr(self.cn0_dbhz);

        batch
            .observations
            .iter()
            .map(|(_, obs)| obs)
            .filter(|obs| obs.valid && !obs.is_secondary())
            .map(|obs| {
                let prn = obs.prn();

                let mut record = ObservationRecord {
                    satellite_id: prn as u16 + offset,
                    sv: SV {
                        constellation: self.constellation,
                        prn,
                    },
                    time: gpst_epoch(week, obs.receiver_tow),
                    pseudorange_m: [0.0; BANDS],
                    carrier_phase_cycles: [0.0; BANDS],
                    doppler_hz: [0.0; BANDS],
                    snr: [0; BANDS],
                    lli: [0; BANDS],
                    code: [None; BANDS],
                };

                record.pseudorange_m[band] = obs.pseudorange_m;
                record.carrier_phase_cycles[band] = obs.carrier_phase_cycles;
                record.doppler_hz[band] = obs.carrier_doppler_hz;
                record.code[band] = SignalCode::from_band(band);
                record.snr[band] = snr;

                // TODO: derive LLI from front-end lock counters once they are streamed
                if self.cn0_dbhz <= -0.001 {
                    record.lli[band] = 1;
                }

                record
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assembler::FlushCause,
        frame::{RawChannelObservation, SECONDARY_FLAG},
    };

    fn obs(satellite_id: u16, receiver_tow: f64) -> RawChannelObservation {
        RawChannelObservation {
            satellite_id,
            receiver_tow,
            carrier_phase_cycles: 1234.5,
            pseudorange_m: 2.1E7,
            carrier_doppler_hz: 0.0,
            valid: true,
        }
    }

    fn batch(observations: Vec<(u8, RawChannelObservation)>) -> EpochBatch {
        EpochBatch {
            tow: observations[0].1.receiver_tow,
            cause: FlushCause::TimeChange,
            observations,
        }
    }

    #[test]
    fn snr_quantization() {
        assert_eq!(quantize_snr(55.0), 220);
        assert_eq!(quantize_snr(63.75), 255);
        assert_eq!(quantize_snr(80.0), 255);
        assert_eq!(quantize_snr(-3.0), 0);
        assert_eq!(quantize_snr(0.124), 0);
        assert_eq!(quantize_snr(0.125), 1);
        assert_eq!(quantize_snr(42.3), 169);
    }

    #[test]
    fn gpst_conversion() {
        let t = gpst_epoch(2162, 345_600.0);
        let (week, nanos) = t.to_time_of_week();
        assert_eq!(week, 2162);
        assert_eq!(nanos, 345_600 * 1_000_000_000);
    }

    #[test]
    fn gps_records() {
        let builder = ObservationBuilder::default();
        let records = builder.build(&batch(vec![(0, obs(5, 200.0)), (1, obs(12, 200.0))]), 2162);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].satellite_id, 5);
        assert_eq!(records[1].satellite_id, 12);
        assert_eq!(records[1].sv.constellation, Constellation::GPS);
        assert_eq!(records[1].sv.prn, 12);

        let record = &records[0];
        assert_eq!(record.time, gpst_epoch(2162, 200.0));
        assert_eq!(record.pseudorange_m, [2.1E7, 0.0, 0.0]);
        assert_eq!(record.carrier_phase_cycles, [1234.5, 0.0, 0.0]);
        assert_eq!(record.doppler_hz, [0.0; BANDS]);
        assert_eq!(record.snr, [220, 0, 0]);
        assert_eq!(record.lli, [0; BANDS]);
        assert_eq!(record.code, [Some(SignalCode::L1C), None, None]);
    }

    #[test]
    fn channel_order_is_preserved() {
        let builder = ObservationBuilder::default();
        let records = builder.build(
            &batch(vec![(0, obs(30, 1.0)), (1, obs(2, 1.0)), (2, obs(17, 1.0))]),
            0,
        );
        let ids = records.iter().map(|r| r.satellite_id).collect::<Vec<_>>();
        assert_eq!(ids, vec![30, 2, 17]);
    }

    #[test]
    fn secondary_frequencies_are_dropped() {
        let builder = ObservationBuilder::default();
        let records = builder.build(
            &batch(vec![
                (0, obs(5 + SECONDARY_FLAG, 1.0)),
                (1, obs(12, 1.0)),
                (2, obs(127 + SECONDARY_FLAG, 1.0)),
            ]),
            0,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].satellite_id, 12);

        let records = builder.build(&batch(vec![(0, obs(5 + SECONDARY_FLAG, 1.0))]), 0);
        assert!(records.is_empty());
    }

    #[test]
    fn galileo_offset() {
        let builder = ObservationBuilder::new(Constellation::Galileo, DEFAULT_CN0_DBHZ);
        let records = builder.build(&batch(vec![(0, obs(11, 1.0))]), 0);
        assert_eq!(records[0].satellite_id, 70);
        assert_eq!(records[0].sv.constellation, Constellation::Galileo);
        assert_eq!(records[0].sv.prn, 11);
    }

    #[test]
    fn negative_cn0_sets_lli() {
        let builder = ObservationBuilder::new(Constellation::GPS, -1.0);
        let records = builder.build(&batch(vec![(0, obs(3, 1.0))]), 0);
        assert_eq!(records[0].lli, [1, 0, 0]);
        assert_eq!(records[0].snr, [0, 0, 0]);
    }

    #[test]
    fn signal_codes() {
        assert_eq!(SignalCode::from_band(1), Some(SignalCode::L2S));
        assert_eq!(SignalCode::from_band(3), None);
        assert_eq!(SignalCode::L5X.to_string(), "5X");
    }
}
