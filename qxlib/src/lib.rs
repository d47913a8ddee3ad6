//! Raw GNSS front-end observables: stream decoding, epoch assembly
//! and conversion to positioning engine records.
mod assembler;
mod builder;
mod config;
mod decoder;
mod engine;
mod error;
mod frame;
mod navigation;
mod pipeline;
mod report;

pub mod fixed_point;

pub use error::Error;

pub mod prelude {
    pub use crate::assembler::{
        EpochAssembler, EpochBatch, FlushCause, DEFAULT_TOW_EPSILON, MAX_CHANNELS,
    };
    pub use crate::builder::{
        gpst_epoch, quantize_snr, ObservationBuilder, ObservationRecord, SignalCode, BANDS,
    };
    pub use crate::config::Config;
    pub use crate::decoder::{DecodedObservation, Decoder};
    pub use crate::engine::{EpochLogger, PositioningEngine, Solution};
    pub use crate::frame::{FrameKind, RawChannelObservation, RawFrame, FRAME_LEN, SECONDARY_FLAG};
    pub use crate::navigation::{NavigationStore, RinexNavigation, StaticNavigation};
    pub use crate::pipeline::{Pipeline, Summary, Termination};
    pub use crate::report::{ErrorReporter, PositionError};
    pub use crate::Error;
    // re-export
    pub use hifitime::Epoch;
    pub use nalgebra::Vector3;
    pub use rinex::prelude::{Constellation, SV};
}
