use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Any I/O failure other than reaching the end of the stream.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame kind tag is neither single (0x10) nor dual-secondary (0x11).
    /// The stream is not resynchronized past this point.
    #[error("not implemented frame kind 0x{0:02x}")]
    UnsupportedFrameKind(u8),

    /// Wire PRN must be positive or null.
    #[error("not implemented prn {0}")]
    UnsupportedPrn(i8),

    #[error("no navigation data")]
    NoNavigationData,

    #[error("navigation file: {0}")]
    NavigationFile(String),

    #[error("channel count {0} out of range")]
    InvalidChannelCount(usize),
}

impl Error {
    /// True for errors caused by malformed stream content. These terminate
    /// stream processing without being propagated as failures.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::UnsupportedFrameKind(_) | Self::UnsupportedPrn(_))
    }
}
