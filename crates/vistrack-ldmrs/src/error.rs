use std::net::SocketAddr;

/// Errors returned by the LD-MRS client.
///
/// A failed [`crate::ScannerDecoder::measure`] leaves the connection open.
/// After a protocol error the byte stream is no longer aligned on a frame
/// boundary, so the caller should reconnect.
#[derive(thiserror::Error, Debug)]
pub enum ScannerError {
    #[error("invalid scanner address {ip:?}")]
    InvalidAddress { ip: String },
    #[error("failed to connect to {addr}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("scanner is not connected")]
    NotConnected,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("short header: got {got} of 24 bytes")]
    ShortHeader { got: usize },
    #[error("wrong magic number {found:#010x}")]
    BadMagic { found: u32 },
    #[error("body of {len} bytes exceeds the {max} byte receive buffer")]
    BodyTooLarge { len: u32, max: usize },
    #[error("wrong message length: {got} of {expected} bytes")]
    ShortBody { expected: usize, got: usize },
    #[error("malformed measured data: {0}")]
    InvalidBody(&'static str),
}

impl ScannerError {
    /// The stream delivered bytes that do not form a valid frame.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            ScannerError::Io(_)
                | ScannerError::ShortHeader { .. }
                | ScannerError::BadMagic { .. }
                | ScannerError::BodyTooLarge { .. }
                | ScannerError::ShortBody { .. }
                | ScannerError::InvalidBody(_)
        )
    }

    /// The connection could not be established.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ScannerError::InvalidAddress { .. }
                | ScannerError::Connect { .. }
                | ScannerError::NotConnected
        )
    }
}
