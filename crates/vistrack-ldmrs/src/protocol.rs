//! LD-MRS wire format.
//!
//! Every message starts with a 24-byte header in network byte order:
//!
//! | bytes   | field                          |
//! |---------|--------------------------------|
//! | 0..4    | magic word `0xAFFEC0C2`        |
//! | 4..8    | size of the previous message   |
//! | 8..12   | body length                    |
//! | 12      | reserved                       |
//! | 13      | device id                      |
//! | 14..16  | message type                   |
//! | 16..24  | NTP time of transmission       |
//!
//! The measured-data body (`0x2202`) is in network byte order by default,
//! see [`BodyByteOrder`]:
//!
//! | bytes   | field                                   |
//! |---------|-----------------------------------------|
//! | 0..2    | scan number                             |
//! | 6..14   | scan start time (fraction, seconds)     |
//! | 14..22  | scan end time (fraction, seconds)       |
//! | 22..24  | angle ticks per rotation                |
//! | 24..26  | start angle, ticks (signed)             |
//! | 26..28  | end angle, ticks (signed)               |
//! | 28..30  | number of point records                 |
//! | 44..    | point records, 10 bytes each            |
//!
//! A point record holds layer (low nibble) and echo (high nibble) in byte 0,
//! the horizontal angle in ticks at 2..4 and the radial distance in
//! centimeters at 4..6.

use crate::ScannerError;
use serde::{Deserialize, Serialize};

pub const HEADER_LEN: usize = 24;
pub const MAX_BODY_LEN: usize = 104_000;
pub const MAGIC_WORD: u32 = 0xAFFE_C0C2;
pub const MSG_MEASURED_DATA: u16 = 0x2202;
pub const NUM_LAYERS: usize = 4;
pub const POINTS_OFFSET: usize = 44;
pub const POINT_RECORD_LEN: usize = 10;

/// Byte order of the measured-data body.
///
/// Network order like the header unless the scanner streams its host order,
/// in which case configure `LittleEndian`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyByteOrder {
    #[default]
    BigEndian,
    LittleEndian,
}

impl BodyByteOrder {
    fn u16(self, b: &[u8], at: usize) -> u16 {
        let raw = [b[at], b[at + 1]];
        match self {
            BodyByteOrder::LittleEndian => u16::from_le_bytes(raw),
            BodyByteOrder::BigEndian => u16::from_be_bytes(raw),
        }
    }

    fn i16(self, b: &[u8], at: usize) -> i16 {
        self.u16(b, at) as i16
    }

    fn u32(self, b: &[u8], at: usize) -> u32 {
        let raw = [b[at], b[at + 1], b[at + 2], b[at + 3]];
        match self {
            BodyByteOrder::LittleEndian => u32::from_le_bytes(raw),
            BodyByteOrder::BigEndian => u32::from_be_bytes(raw),
        }
    }

    fn put_u16(self, b: &mut [u8], at: usize, v: u16) {
        let raw = match self {
            BodyByteOrder::LittleEndian => v.to_le_bytes(),
            BodyByteOrder::BigEndian => v.to_be_bytes(),
        };
        b[at..at + 2].copy_from_slice(&raw);
    }

    fn put_u32(self, b: &mut [u8], at: usize, v: u32) {
        let raw = match self {
            BodyByteOrder::LittleEndian => v.to_le_bytes(),
            BodyByteOrder::BigEndian => v.to_be_bytes(),
        };
        b[at..at + 4].copy_from_slice(&raw);
    }
}

/// Validated message header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LdmrsHeader {
    pub body_len: u32,
    pub device_id: u8,
    pub msg_type: u16,
}

impl LdmrsHeader {
    /// Parse a header, rejecting a wrong magic word.
    pub fn parse(bytes: &[u8; HEADER_LEN]) -> Result<Self, ScannerError> {
        let magic = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != MAGIC_WORD {
            return Err(ScannerError::BadMagic { found: magic });
        }
        Ok(Self {
            body_len: u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            device_id: bytes[13],
            msg_type: u16::from_be_bytes([bytes[14], bytes[15]]),
        })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(&MAGIC_WORD.to_be_bytes());
        out[8..12].copy_from_slice(&self.body_len.to_be_bytes());
        out[13] = self.device_id;
        out[14..16].copy_from_slice(&self.msg_type.to_be_bytes());
        out
    }
}

/// Device time: seconds plus a 32-bit binary fraction of a second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NtpTime {
    pub seconds: u32,
    pub fraction: u32,
}

impl NtpTime {
    pub fn as_secs_f64(&self) -> f64 {
        self.seconds as f64 + self.fraction as f64 / 4_294_967_296.0
    }

    fn read(order: BodyByteOrder, b: &[u8], at: usize) -> Self {
        Self {
            fraction: order.u32(b, at),
            seconds: order.u32(b, at + 4),
        }
    }

    fn write(&self, order: BodyByteOrder, b: &mut [u8], at: usize) {
        order.put_u32(b, at, self.fraction);
        order.put_u32(b, at + 4, self.seconds);
    }
}

/// Fixed part of a measured-data body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanHeader {
    pub measurement_id: u16,
    pub start_time: NtpTime,
    pub end_time: NtpTime,
    pub num_steps: u16,
    pub start_angle: i16,
    pub stop_angle: i16,
    pub num_points: u16,
}

/// One raw point record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointRecord {
    pub layer: u8,
    pub echo: u8,
    /// Horizontal angle in ticks.
    pub h_angle: i16,
    /// Radial distance in centimeters.
    pub distance_cm: u16,
}

impl PointRecord {
    fn read(order: BodyByteOrder, b: &[u8]) -> Self {
        Self {
            layer: b[0] & 0x0F,
            echo: b[0] >> 4,
            h_angle: order.i16(b, 2),
            distance_cm: order.u16(b, 4),
        }
    }
}

/// Iterator over the point records of a decoded body.
#[derive(Clone, Debug)]
pub struct PointRecords<'a> {
    records: std::slice::ChunksExact<'a, u8>,
    order: BodyByteOrder,
}

impl Iterator for PointRecords<'_> {
    type Item = PointRecord;

    fn next(&mut self) -> Option<PointRecord> {
        self.records
            .next()
            .map(|rec| PointRecord::read(self.order, rec))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

impl ExactSizeIterator for PointRecords<'_> {}

/// Decode a measured-data body into its scan header and point records.
pub fn decode_measured_data(
    body: &[u8],
    order: BodyByteOrder,
) -> Result<(ScanHeader, PointRecords<'_>), ScannerError> {
    if body.len() < POINTS_OFFSET {
        return Err(ScannerError::InvalidBody("body shorter than scan header"));
    }
    let scan = ScanHeader {
        measurement_id: order.u16(body, 0),
        start_time: NtpTime::read(order, body, 6),
        end_time: NtpTime::read(order, body, 14),
        num_steps: order.u16(body, 22),
        start_angle: order.i16(body, 24),
        stop_angle: order.i16(body, 26),
        num_points: order.u16(body, 28),
    };
    if scan.num_steps == 0 {
        return Err(ScannerError::InvalidBody("zero angle ticks per rotation"));
    }
    let end = POINTS_OFFSET + POINT_RECORD_LEN * scan.num_points as usize;
    if end > body.len() {
        return Err(ScannerError::InvalidBody("point records exceed body length"));
    }
    let records = PointRecords {
        records: body[POINTS_OFFSET..end].chunks_exact(POINT_RECORD_LEN),
        order,
    };
    Ok((scan, records))
}

/// Measured-data message builder, for replay tools and fake devices.
///
/// `scan.num_points` is ignored; the record count comes from `points`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeasuredDataFrame {
    pub scan: ScanHeader,
    pub points: Vec<PointRecord>,
}

impl MeasuredDataFrame {
    pub fn encode_body(&self, order: BodyByteOrder) -> Vec<u8> {
        let mut body = vec![0u8; POINTS_OFFSET + POINT_RECORD_LEN * self.points.len()];
        order.put_u16(&mut body, 0, self.scan.measurement_id);
        self.scan.start_time.write(order, &mut body, 6);
        self.scan.end_time.write(order, &mut body, 14);
        order.put_u16(&mut body, 22, self.scan.num_steps);
        order.put_u16(&mut body, 24, self.scan.start_angle as u16);
        order.put_u16(&mut body, 26, self.scan.stop_angle as u16);
        order.put_u16(&mut body, 28, self.points.len() as u16);
        for (i, p) in self.points.iter().enumerate() {
            let at = POINTS_OFFSET + POINT_RECORD_LEN * i;
            body[at] = (p.echo << 4) | (p.layer & 0x0F);
            order.put_u16(&mut body, at + 2, p.h_angle as u16);
            order.put_u16(&mut body, at + 4, p.distance_cm);
        }
        body
    }

    /// Header and body, ready to be written to a socket.
    pub fn encode_message(&self, order: BodyByteOrder) -> Vec<u8> {
        let body = self.encode_body(order);
        let header = LdmrsHeader {
            body_len: body.len() as u32,
            device_id: 0,
            msg_type: MSG_MEASURED_DATA,
        };
        let mut out = header.to_bytes().to_vec();
        out.extend_from_slice(&body);
        out
    }
}
