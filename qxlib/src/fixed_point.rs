//! Fixed point wire fields.
//!
//! Every physical quantity of the observable stream is transported as a
//! signed 64 bit integer, to be divided by a power of two.

/// Receiver time of week scaling: 2^32
pub const TOW_SCALE_BITS: u32 = 32;

/// Carrier phase scaling: 2^10
pub const PHASE_SCALE_BITS: u32 = 10;

/// Pseudo range scaling: 2^10
pub const PSEUDORANGE_SCALE_BITS: u32 = 10;

fn scale(bits: u32) -> f64 {
    (1u64 << bits) as f64
}

/// Converts raw wire value to physical value: `raw / 2^bits`.
pub fn decode(raw: i64, bits: u32) -> f64 {
    raw as f64 / scale(bits)
}

/// Converts physical value to raw wire value.
/// The fractional part is truncated toward zero.
pub fn encode(value: f64, bits: u32) -> i64 {
    (value * scale(bits)) as i64
}

/// Decodes `raw` and re-encodes the result with the same scaling.
/// Returns the decoded value and the re-encoding error, which is zero
/// unless precision was lost when converting to double.
pub fn decode_checked(raw: i64, bits: u32) -> (f64, i64) {
    let value = decode(raw, bits);
    let error = encode(value, bits).wrapping_sub(raw);
    (value, error)
}
