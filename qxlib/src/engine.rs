use hifitime::Epoch;
use log::info;
use nalgebra::Vector3;

use crate::{builder::ObservationRecord, navigation::NavigationStore};

/// Position solution
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Solution {
    pub epoch: Epoch,
    /// ECEF position (m)
    pub position_ecef_m: Vector3<f64>,
}

/// Positioning engine, fed one epoch worth of [ObservationRecord]s
/// at a time. Implementations keep their own filter state across calls.
pub trait PositioningEngine {
    /// Returns a new [Solution], if this epoch allowed one.
    fn solve(
        &mut self,
        records: &[ObservationRecord],
        nav: &dyn NavigationStore,
    ) -> Option<Solution>;
}

/// [PositioningEngine] that only traces the epochs it is fed with.
#[derive(Debug, Default, Clone)]
pub struct EpochLogger {
    epochs: usize,
}

impl EpochLogger {
    pub fn epochs(&self) -> usize {
        self.epochs
    }
}

impl PositioningEngine for EpochLogger {
    fn solve(
        &mut self,
        records: &[ObservationRecord],
        _: &dyn NavigationStore,
    ) -> Option<Solution> {
        self.epochs += 1;
        if let Some(first) = records.first() {
            let svs = records
                .iter()
                .map(|rec| rec.sv.to_string())
                .collect::<Vec<_>>()
                .join(",");
            info!("{}: {} observations [{}]", first.time, records.len(), svs);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assembler::{EpochBatch, FlushCause},
        builder::ObservationBuilder,
        frame::RawChannelObservation,
        navigation::StaticNavigation,
    };

    #[test]
    fn epoch_logger_never_solves() {
        let obs = RawChannelObservation {
            satellite_id: 7,
            receiver_tow: 10.0,
            carrier_phase_cycles: 0.0,
            pseudorange_m: 2.0E7,
            carrier_doppler_hz: 0.0,
            valid: true,
        };
        let batch = EpochBatch {
            tow: 10.0,
            cause: FlushCause::TimeChange,
            observations: vec![(0, obs)],
        };
        let records = ObservationBuilder::default().build(&batch, 2162);

        let mut engine = EpochLogger::default();
        let nav = StaticNavigation { week: 2162 };
        assert!(engine.solve(&records, &nav).is_none());
        assert!(engine.solve(&records, &nav).is_none());
        assert_eq!(engine.epochs(), 2);
    }
}
