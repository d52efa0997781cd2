//! SICK LD-MRS laser scanner client.
//!
//! The scanner streams framed messages over TCP. Each frame is a 24-byte
//! big-endian header followed by a body of up to 104000 bytes. Only the
//! "measured data" message is decoded: it carries one scanner revolution as
//! a list of points spread over 4 vertical layers.
//!
//! - [`ScannerDecoder`] owns the connection and decodes one frame per
//!   [`ScannerDecoder::measure`] call into four [`LaserScan`]s.
//! - [`protocol`] holds the pure wire-format parsing and encoding.
//! - [`ScanPoint`] converts polar returns to Cartesian coordinates.

mod config;
mod decoder;
mod error;
pub mod protocol;
mod scan;

pub use config::ScannerConfig;
pub use decoder::{MeasureOutcome, ScannerDecoder};
pub use error::ScannerError;
pub use protocol::{BodyByteOrder, LdmrsHeader, NUM_LAYERS};
pub use scan::{LaserScan, ScanPoint};
