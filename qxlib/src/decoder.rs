use std::io::{ErrorKind, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, warn};

use crate::{
    fixed_point::{self, PHASE_SCALE_BITS, PSEUDORANGE_SCALE_BITS, TOW_SCALE_BITS},
    frame::{FrameKind, RawChannelObservation, SECONDARY_FLAG},
    Error,
};

/// Reads one field; end of stream interrupts the frame.
macro_rules! field {
    ($read:expr) => {
        match $read {
            Ok(value) => value,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        }
    };
}

/// Single frame decoding result.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DecodedObservation {
    /// Receiver channel, as assigned on the wire
    pub channel: u8,
    pub observation: RawChannelObservation,
    /// Carrier phase re-encoding error, non zero when the
    /// decoded phase lost precision.
    pub phase_quantization_error: i64,
}

impl DecodedObservation {
    pub fn has_quantization_error(&self) -> bool {
        self.phase_quantization_error != 0
    }
}

/// Observable stream [Decoder]: decodes one [DecodedObservation] per frame
/// from any readable interface.
/// ```
/// use qxlib::prelude::{Decoder, FrameKind, RawFrame};
///
/// let frame = RawFrame::from_physical(FrameKind::Single, 0, 200.0, 1.5, 2.0E7, 5);
/// let stream = frame.encode();
///
/// let mut decoder = Decoder::new(&stream[..]);
///
/// let decoded = decoder.next().unwrap().unwrap();
/// assert_eq!(decoded.observation.satellite_id, 5);
///
/// // end of stream
/// assert!(decoder.next().is_none());
/// ```
/// Unsupported frame kinds or PRNs are returned as errors, after which the
/// [Decoder] yields nothing: no resynchronization is attempted.
pub struct Decoder<R: Read> {
    reader: R,
    terminated: bool,
}

impl<R: Read> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            terminated: false,
        }
    }

    fn decode_frame(&mut self) -> Result<Option<DecodedObservation>, Error> {
        let tag = field!(self.reader.read_u8());
        let kind = FrameKind::from_tag(tag).ok_or(Error::UnsupportedFrameKind(tag))?;

        let decoded = self.decode_body(kind)?;
        if decoded.is_none() {
            debug!("end of stream within frame (kind={:?})", kind);
        }
        Ok(decoded)
    }

    fn decode_body(&mut self, kind: FrameKind) -> Result<Option<DecodedObservation>, Error> {
        let channel = field!(self.reader.read_u8());

        let tow_raw = field!(self.reader.read_i64::<LittleEndian>());
        let receiver_tow = fixed_point::decode(tow_raw, TOW_SCALE_BITS);

        let phase_raw = field!(self.reader.read_i64::<LittleEndian>());
        let (carrier_phase_cycles, phase_quantization_error) =
            fixed_point::decode_checked(phase_raw, PHASE_SCALE_BITS);

        if phase_quantization_error != 0 {
            warn!(
                "ch={} tow={}: phase quantization error {}",
                channel, receiver_tow, phase_quantization_error
            );
        }

        let pseudorange_raw = field!(self.reader.read_i64::<LittleEndian>());
        let pseudorange_m = fixed_point::decode(pseudorange_raw, PSEUDORANGE_SCALE_BITS);

        let prn = field!(self.reader.read_i8());
        if prn < 0 {
            return Err(Error::UnsupportedPrn(prn));
        }

        let satellite_id = match kind {
            FrameKind::Single => prn as u16,
            FrameKind::DualSecondary => prn as u16 + SECONDARY_FLAG,
        };

        Ok(Some(DecodedObservation {
            channel,
            phase_quantization_error,
            observation: RawChannelObservation {
                satellite_id,
                receiver_tow,
                carrier_phase_cycles,
                pseudorange_m,
                carrier_doppler_hz: 0.0,
                valid: true,
            },
        }))
    }
}

impl<R: Read> Iterator for Decoder<R> {
    type Item = Result<DecodedObservation, Error>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.terminated {
            return None;
        }
        match self.decode_frame() {
            Ok(Some(decoded)) => Some(Ok(decoded)),
            Ok(None) => {
                self.terminated = true;
                None
            },
            Err(e) => {
                self.terminated = e.is_malformed();
                Some(Err(e))
            },
        }
    }
}
