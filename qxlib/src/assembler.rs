//! Epoch assembly: groups per channel observations sharing one sampling instant.
use log::{trace, warn};

use crate::frame::RawChannelObservation;

/// Number of wire addressable channels
pub const MAX_CHANNELS: usize = 256;

/// Default time of week tolerance (s)
pub const DEFAULT_TOW_EPSILON: f64 = 1.0E-12;

/// Reason why an epoch was closed
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FlushCause {
    /// Time of week moved on
    TimeChange,
    /// A channel was observed twice without time change
    ChannelReuse,
}

/// Completed epoch, handed over to the record builder.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochBatch {
    /// Receiver time of week of every observation in this batch
    pub tow: f64,
    pub cause: FlushCause,
    /// Buffered observations, in channel order
    pub observations: Vec<(u8, RawChannelObservation)>,
}

impl EpochBatch {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// [EpochAssembler] holds one pending observation per channel and closes
/// the current epoch whenever the time of week changes, or a channel gets
/// reused before any time change.
#[derive(Debug, Clone)]
pub struct EpochAssembler {
    /// Advisory channel count
    channels: usize,
    /// Epoch boundary tolerance (s)
    epsilon: f64,
    /// None until first observation
    last_tow: Option<f64>,
    slots: Vec<Option<RawChannelObservation>>,
}

impl EpochAssembler {
    pub fn new(channels: usize, epsilon: f64) -> Self {
        Self {
            channels,
            epsilon,
            last_tow: None,
            slots: vec![None; MAX_CHANNELS],
        }
    }

    /// Time of week of the last accepted observation
    pub fn last_tow(&self) -> Option<f64> {
        self.last_tow
    }

    /// Number of observations buffered in the current epoch
    pub fn pending(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Buffers a new observation for `channel`. Returns the previous epoch,
    /// when this observation closes it.
    pub fn push(&mut self, channel: u8, observation: RawChannelObservation) -> Option<EpochBatch> {
        let ch = channel as usize;
        if ch >= self.channels {
            warn!(
                "ch={} is beyond configured channel count {}",
                ch, self.channels
            );
        }

        let batch = match self.last_tow {
            Some(last_tow) => {
                let time_changed = (observation.receiver_tow - last_tow).abs() > self.epsilon;
                if time_changed {
                    Some(self.flush(last_tow, FlushCause::TimeChange))
                } else if self.slots[ch].is_some() {
                    warn!(
                        "no time change & new observation on ch={} (prn={}, tow={:.20})",
                        ch,
                        observation.satellite_id,
                        observation.receiver_tow
                    );
                    Some(self.flush(last_tow, FlushCause::ChannelReuse))
                } else {
                    None
                }
            },
            None => None,
        };

        self.slots[ch] = Some(observation);
        self.last_tow = Some(observation.receiver_tow);
        batch
    }

    /// Closes the current epoch, if any observation is pending.
    /// This is only used at the end of a stream.
    pub fn finish(&mut self) -> Option<EpochBatch> {
        let last_tow = self.last_tow?;
        if self.pending() == 0 {
            return None;
        }
        Some(self.flush(last_tow, FlushCause::TimeChange))
    }

    fn flush(&mut self, tow: f64, cause: FlushCause) -> EpochBatch {
        trace!("{:06} | {}", tow as u64, self.layout());

        let observations = self
            .slots
            .iter_mut()
            .enumerate()
            .filter_map(|(ch, slot)| slot.take().map(|obs| (ch as u8, obs)))
            .collect();

        EpochBatch {
            tow,
            cause,
            observations,
        }
    }

    /// Channel occupancy over the configured channel count:
    /// PRN per channel, `*` for secondary frequencies, `--` when empty.
    fn layout(&self) -> String {
        self.slots
            .iter()
            .take(self.channels)
            .map(|slot| match slot {
                Some(obs) if obs.is_secondary() => format!("{:02}*", obs.prn()),
                Some(obs) => format!("{:02} ", obs.prn()),
                None => "-- ".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::SECONDARY_FLAG;

    fn obs(satellite_id: u16, receiver_tow: f64) -> RawChannelObservation {
        RawChannelObservation {
            satellite_id,
            receiver_tow,
            carrier_phase_cycles: 1.0,
            pseudorange_m: 2.0E7,
            carrier_doppler_hz: 0.0,
            valid: true,
        }
    }

    #[test]
    fn first_observation_never_flushes() {
        let mut assembler = EpochAssembler::new(8, DEFAULT_TOW_EPSILON);
        assert!(assembler.last_tow().is_none());
        assert!(assembler.push(0, obs(1, 0.0)).is_none());
        assert_eq!(assembler.last_tow(), Some(0.0));
        assert_eq!(assembler.pending(), 1);
    }

    #[test]
    fn tow_zero_is_a_valid_epoch() {
        let mut assembler = EpochAssembler::new(8, DEFAULT_TOW_EPSILON);
        assert!(assembler.push(0, obs(1, 0.0)).is_none());
        assert!(assembler.push(1, obs(2, 0.0)).is_none());
        let batch = assembler.push(0, obs(1, 1.0)).unwrap();
        assert_eq!(batch.tow, 0.0);
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn one_flush_per_tow() {
        let mut assembler = EpochAssembler::new(4, DEFAULT_TOW_EPSILON);
        let tows = [10.0, 10.0, 10.0, 11.0, 11.0, 12.0, 12.0, 12.0, 12.0, 13.0];
        let mut batches = Vec::new();
        for (i, tow) in tows.iter().enumerate() {
            let ch = match i {
                0..=2 => i,
                3..=4 => i - 3,
                5..=8 => i - 5,
                _ => 0,
            };
            if let Some(batch) = assembler.push(ch as u8, obs(ch as u16 + 1, *tow)) {
                batches.push(batch);
            }
        }

        assert_eq!(batches.len(), 3);
        for (batch, (tow, len)) in batches.iter().zip([(10.0, 3), (11.0, 2), (12.0, 4)]) {
            assert_eq!(batch.tow, tow);
            assert_eq!(batch.len(), len);
            assert_eq!(batch.cause, FlushCause::TimeChange);
            for (_, o) in batch.observations.iter() {
                assert_eq!(o.receiver_tow, tow);
            }
        }

        // last epoch remains open
        assert_eq!(assembler.pending(), 1);
    }

    #[test]
    fn flush_clears_every_slot() {
        let mut assembler = EpochAssembler::new(3, DEFAULT_TOW_EPSILON);
        assembler.push(0, obs(1, 5.0));
        assembler.push(1, obs(2, 5.0));
        assembler.push(2, obs(3, 5.0));

        let batch = assembler.push(1, obs(2, 6.0)).unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(assembler.pending(), 1);

        let batch = assembler.push(0, obs(1, 7.0)).unwrap();
        assert_eq!(batch.tow, 6.0);
        assert_eq!(batch.observations, vec![(1, obs(2, 6.0))]);
    }

    #[test]
    fn same_time_channel_reuse() {
        let mut assembler = EpochAssembler::new(8, DEFAULT_TOW_EPSILON);
        let first = RawChannelObservation {
            carrier_phase_cycles: 10.0,
            ..obs(9, 100.0)
        };
        let second = RawChannelObservation {
            carrier_phase_cycles: 20.0,
            ..obs(9, 100.0)
        };

        assert!(assembler.push(3, first).is_none());

        let batch = assembler.push(3, second).unwrap();
        assert_eq!(batch.cause, FlushCause::ChannelReuse);
        assert_eq!(batch.tow, 100.0);
        assert_eq!(batch.observations, vec![(3, first)]);

        // fresh epoch only holds the second observation
        let batch = assembler.push(3, obs(9, 101.0)).unwrap();
        assert_eq!(batch.observations, vec![(3, second)]);
    }

    #[test]
    fn epsilon_tolerance() {
        let mut assembler = EpochAssembler::new(2, 1.0E-6);
        assembler.push(0, obs(1, 200.0));
        assert!(assembler.push(1, obs(2, 200.0 + 1.0E-9)).is_none());
        assert_eq!(assembler.pending(), 2);

        let mut assembler = EpochAssembler::new(2, DEFAULT_TOW_EPSILON);
        assembler.push(0, obs(1, 200.0));
        assert!(assembler.push(1, obs(2, 200.0 + 1.0E-9)).is_some());
    }

    #[test]
    fn channels_beyond_bound_are_kept() {
        let mut assembler = EpochAssembler::new(2, DEFAULT_TOW_EPSILON);
        assembler.push(1, obs(1, 1.0));
        assembler.push(255, obs(2, 1.0));
        let batch = assembler.push(0, obs(1, 2.0)).unwrap();
        assert_eq!(batch.observations, vec![(1, obs(1, 1.0)), (255, obs(2, 1.0))]);
    }

    #[test]
    fn finish_returns_open_epoch() {
        let mut assembler = EpochAssembler::new(2, DEFAULT_TOW_EPSILON);
        assert!(assembler.finish().is_none());

        assembler.push(0, obs(4 + SECONDARY_FLAG, 3.0));
        let batch = assembler.finish().unwrap();
        assert_eq!(batch.tow, 3.0);
        assert_eq!(batch.len(), 1);
        assert!(assembler.finish().is_none());
    }

    #[test]
    fn layout() {
        let mut assembler = EpochAssembler::new(3, DEFAULT_TOW_EPSILON);
        assembler.push(0, obs(5, 1.0));
        assembler.push(2, obs(12 + SECONDARY_FLAG, 1.0));
        assert_eq!(assembler.layout(), "05  --  12*");
    }
}
