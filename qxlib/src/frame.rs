//! Observable frame layout and channel observation.
use byteorder::{ByteOrder, LittleEndian};

use crate::fixed_point::{self, PHASE_SCALE_BITS, PSEUDORANGE_SCALE_BITS, TOW_SCALE_BITS};

/// Encoded frame size in bytes: kind, channel, tow, phase, pseudo range, prn
pub const FRAME_LEN: usize = 27;

/// Satellite identifier bit signaling a secondary frequency channel
pub const SECONDARY_FLAG: u16 = 0x80;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameKind {
    /// Single frequency channel
    Single,
    /// Secondary frequency channel
    DualSecondary,
}

impl FrameKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x10 => Some(Self::Single),
            0x11 => Some(Self::DualSecondary),
            _ => None,
        }
    }

    pub fn tag(&self) -> u8 {
        match self {
            Self::Single => 0x10,
            Self::DualSecondary => 0x11,
        }
    }
}

/// One channel observation, as decoded from a single frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RawChannelObservation {
    /// Wire PRN, plus [SECONDARY_FLAG] for secondary frequency channels
    pub satellite_id: u16,
    /// Receiver time of week (s)
    pub receiver_tow: f64,
    /// Carrier phase (cycles)
    pub carrier_phase_cycles: f64,
    /// Pseudo range (m)
    pub pseudorange_m: f64,
    /// Not transported by this revision of the stream: always zero.
    pub carrier_doppler_hz: f64,
    pub valid: bool,
}

impl RawChannelObservation {
    /// PRN without the secondary frequency flag
    pub fn prn(&self) -> u8 {
        (self.satellite_id & !SECONDARY_FLAG) as u8
    }

    pub fn is_secondary(&self) -> bool {
        self.satellite_id & SECONDARY_FLAG != 0
    }
}

/// Raw (still quantized) frame content.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub kind: FrameKind,
    pub channel: u8,
    pub tow_raw: i64,
    pub phase_raw: i64,
    pub pseudorange_raw: i64,
    pub prn: i8,
}

impl RawFrame {
    /// Quantizes physical values into a new [RawFrame].
    pub fn from_physical(
        kind: FrameKind,
        channel: u8,
        receiver_tow: f64,
        carrier_phase_cycles: f64,
        pseudorange_m: f64,
        prn: i8,
    ) -> Self {
        Self {
            kind,
            channel,
            prn,
            tow_raw: fixed_point::encode(receiver_tow, TOW_SCALE_BITS),
            phase_raw: fixed_point::encode(carrier_phase_cycles, PHASE_SCALE_BITS),
            pseudorange_raw: fixed_point::encode(pseudorange_m, PSEUDORANGE_SCALE_BITS),
        }
    }

    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut buf = [0u8; FRAME_LEN];
        buf[0] = self.kind.tag();
        buf[1] = self.channel;
        LittleEndian::write_i64(&mut buf[2..10], self.tow_raw);
        LittleEndian::write_i64(&mut buf[10..18], self.phase_raw);
        LittleEndian::write_i64(&mut buf[18..26], self.pseudorange_raw);
        buf[26] = self.prn as u8;
        buf
    }
}
