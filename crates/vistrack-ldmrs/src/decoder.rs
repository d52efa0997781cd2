use crate::protocol::{
    decode_measured_data, LdmrsHeader, HEADER_LEN, MAX_BODY_LEN, MSG_MEASURED_DATA, NUM_LAYERS,
};
use crate::{LaserScan, ScanPoint, ScannerConfig, ScannerError};
use log::{debug, info, warn};
use std::f64::consts::TAU;
use std::io::{ErrorKind, Read};
use std::net::TcpStream;
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Result of one successful [`ScannerDecoder::measure`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeasureOutcome {
    /// A measured-data message was decoded into the layers.
    Measured { measurement_id: u16, points: usize },
    /// Some other message was received and discarded.
    Skipped { msg_type: u16 },
}

/// LD-MRS client: reads one framed message per [`ScannerDecoder::measure`].
///
/// Timestamps reported in [`LaserScan`] are local-clock seconds. The offset
/// between device and local clock is fixed on the first measured-data
/// message and never changes afterwards.
#[derive(Debug)]
pub struct ScannerDecoder<S = TcpStream> {
    config: ScannerConfig,
    stream: Option<S>,
    body: Box<[u8]>,
    layer_elevation: [f64; NUM_LAYERS],
    time_offset: Option<f64>,
    first_clock: Option<f64>,
}

impl Default for ScannerDecoder<TcpStream> {
    fn default() -> Self {
        Self::with_config(ScannerConfig::default())
    }
}

impl ScannerDecoder<TcpStream> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect to the configured endpoint.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self), fields(ip = %self.config.ip, port = self.config.port)))]
    pub fn setup(&mut self) -> Result<(), ScannerError> {
        self.stream = None;
        let addr = self.config.socket_addr()?;
        let stream = TcpStream::connect_timeout(&addr, self.config.connect_timeout())
            .map_err(|source| ScannerError::Connect { addr, source })?;
        info!("connected to LD-MRS at {addr}");
        self.stream = Some(stream);
        Ok(())
    }

    pub fn setup_with(&mut self, ip: &str, port: u16) -> Result<(), ScannerError> {
        self.set_ip_address(ip);
        self.set_port(port);
        self.setup()
    }
}

impl<S: Read> ScannerDecoder<S> {
    /// Decoder with no connection yet.
    pub fn with_config(config: ScannerConfig) -> Self {
        Self {
            layer_elevation: config.layer_elevation_rad(),
            config,
            stream: None,
            body: vec![0u8; MAX_BODY_LEN].into_boxed_slice(),
            time_offset: None,
            first_clock: None,
        }
    }

    /// Decoder reading from an already open byte source.
    pub fn from_stream(config: ScannerConfig, stream: S) -> Self {
        let mut decoder = Self::with_config(config);
        decoder.stream = Some(stream);
        decoder
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn set_ip_address(&mut self, ip: &str) {
        self.config.ip = ip.to_string();
    }

    pub fn set_port(&mut self, port: u16) {
        self.config.port = port;
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Close the connection and return the byte source.
    pub fn disconnect(&mut self) -> Option<S> {
        self.stream.take()
    }

    /// Local minus device clock, seconds; `None` before the first scan.
    pub fn time_offset(&self) -> Option<f64> {
        self.time_offset
    }

    /// Layer elevations, radians.
    pub fn layer_elevation(&self) -> &[f64; NUM_LAYERS] {
        &self.layer_elevation
    }

    /// Read one message and decode it into `layers`.
    ///
    /// Blocks until a full message is received. Messages other than measured
    /// data leave `layers` untouched.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, layers)))]
    pub fn measure(
        &mut self,
        layers: &mut [LaserScan; NUM_LAYERS],
    ) -> Result<MeasureOutcome, ScannerError> {
        let stream = self.stream.as_mut().ok_or(ScannerError::NotConnected)?;
        if self.time_offset.is_none() && self.first_clock.is_none() {
            self.first_clock = Some(local_clock_seconds());
        }

        let mut header = [0u8; HEADER_LEN];
        let got = read_full(stream, &mut header)?;
        if got < HEADER_LEN {
            return Err(ScannerError::ShortHeader { got });
        }
        let header = LdmrsHeader::parse(&header).inspect_err(|e| warn!("{e}"))?;

        let len = header.body_len as usize;
        if len > MAX_BODY_LEN {
            return Err(ScannerError::BodyTooLarge {
                len: header.body_len,
                max: MAX_BODY_LEN,
            });
        }
        let got = read_full(stream, &mut self.body[..len])?;
        if got < len {
            return Err(ScannerError::ShortBody { expected: len, got });
        }

        if header.msg_type != MSG_MEASURED_DATA {
            debug!(
                "skipping message type {:#06x} ({len} bytes)",
                header.msg_type
            );
            return Ok(MeasureOutcome::Skipped {
                msg_type: header.msg_type,
            });
        }

        let (scan, records) =
            decode_measured_data(&self.body[..len], self.config.body_byte_order)?;
        let device_start = scan.start_time.as_secs_f64();
        let offset = *self.time_offset.get_or_insert_with(|| {
            let local = self.first_clock.unwrap_or_else(local_clock_seconds);
            local - device_start
        });

        for layer in layers.iter_mut() {
            layer.clear();
            layer.measurement_id = scan.measurement_id;
            layer.start_timestamp = device_start + offset;
            layer.end_timestamp = scan.end_time.as_secs_f64() + offset;
            layer.num_steps = scan.num_steps;
            layer.start_angle = scan.start_angle;
            layer.stop_angle = scan.stop_angle;
            layer.num_points = scan.num_points;
        }

        let step = TAU / scan.num_steps as f64;
        let mut points = 0;
        for rec in records {
            if rec.echo != 0 {
                continue;
            }
            let Some(layer) = layers.get_mut(rec.layer as usize) else {
                warn!("skipping point on unknown layer {}", rec.layer);
                continue;
            };
            layer.add_point(ScanPoint::from_polar(
                0.01 * rec.distance_cm as f64,
                step * rec.h_angle as f64,
                self.layer_elevation[rec.layer as usize],
            ));
            points += 1;
        }

        debug!(
            "scan {}: {points} of {} points kept",
            scan.measurement_id, scan.num_points
        );
        Ok(MeasureOutcome::Measured {
            measurement_id: scan.measurement_id,
            points,
        })
    }
}

/// Read until `buf` is full or the stream ends; returns the byte count.
fn read_full<S: Read>(stream: &mut S, buf: &mut [u8]) -> Result<usize, ScannerError> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

fn local_clock_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{
        BodyByteOrder, LdmrsHeader, MeasuredDataFrame, NtpTime, PointRecord, ScanHeader,
    };
    use approx::assert_relative_eq;
    use std::io::Cursor;

    fn scan_frame(id: u16, seconds: u32, points: Vec<PointRecord>) -> MeasuredDataFrame {
        MeasuredDataFrame {
            scan: ScanHeader {
                measurement_id: id,
                start_time: NtpTime {
                    seconds,
                    fraction: 0,
                },
                end_time: NtpTime {
                    seconds,
                    fraction: 1 << 31,
                },
                num_steps: 11520,
                start_angle: 1600,
                stop_angle: -1920,
                num_points: 0,
            },
            points,
        }
    }

    fn point(layer: u8, echo: u8, h_angle: i16, distance_cm: u16) -> PointRecord {
        PointRecord {
            layer,
            echo,
            h_angle,
            distance_cm,
        }
    }

    fn decoder(bytes: Vec<u8>) -> ScannerDecoder<Cursor<Vec<u8>>> {
        ScannerDecoder::from_stream(ScannerConfig::default(), Cursor::new(bytes))
    }

    fn layers() -> [LaserScan; NUM_LAYERS] {
        Default::default()
    }

    #[test]
    fn echo_zero_points_land_in_their_layers() {
        let frame = scan_frame(
            42,
            1000,
            vec![
                point(0, 0, 0, 500),
                point(2, 0, 2880, 1234),
                point(1, 1, 10, 700),
            ],
        );
        let mut dec = decoder(frame.encode_message(BodyByteOrder::BigEndian));
        let mut out = layers();
        let outcome = dec.measure(&mut out).expect("measure");
        assert_eq!(
            outcome,
            MeasureOutcome::Measured {
                measurement_id: 42,
                points: 2
            }
        );

        assert_eq!(out[0].points.len(), 1);
        assert_eq!(out[1].points.len(), 0);
        assert_eq!(out[2].points.len(), 1);
        assert_eq!(out[3].points.len(), 0);

        let p0 = out[0].points[0];
        assert_relative_eq!(p0.radial_dist, 5.0, epsilon = 1e-12);
        assert_relative_eq!(p0.h_angle, 0.0);
        assert_relative_eq!(p0.v_angle, -1.2f64.to_radians());

        let p2 = out[2].points[0];
        assert_relative_eq!(p2.radial_dist, 12.34, epsilon = 1e-12);
        assert_relative_eq!(p2.h_angle, std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(p2.v_angle, 0.4f64.to_radians());

        for layer in &out {
            assert_eq!(layer.measurement_id, 42);
            assert_eq!(layer.num_points, 3);
            assert_eq!(layer.num_steps, 11520);
            assert_eq!(layer.start_angle, 1600);
            assert_eq!(layer.stop_angle, -1920);
            assert_relative_eq!(
                layer.end_timestamp - layer.start_timestamp,
                0.5,
                epsilon = 1e-6
            );
        }
    }

    #[test]
    fn wrong_magic_leaves_body_unread() {
        let mut bytes = scan_frame(1, 10, vec![point(0, 0, 0, 100)])
            .encode_message(BodyByteOrder::BigEndian);
        bytes[0] = 0x00;
        let mut dec = decoder(bytes);
        let mut out = layers();
        let err = dec.measure(&mut out).expect_err("bad magic");
        assert!(matches!(err, ScannerError::BadMagic { .. }));
        assert!(err.is_protocol_error());
        let cursor = dec.disconnect().expect("stream");
        assert_eq!(cursor.position(), HEADER_LEN as u64);
        assert!(out.iter().all(|l| l.points.is_empty()));
    }

    #[test]
    fn other_message_types_are_skipped() {
        let header = LdmrsHeader {
            body_len: 8,
            device_id: 0,
            msg_type: 0x2020,
        };
        let mut bytes = header.to_bytes().to_vec();
        bytes.extend_from_slice(&[0xFF; 8]);
        let mut dec = decoder(bytes);

        let mut out = layers();
        out[1].measurement_id = 9;
        out[1].add_point(ScanPoint::from_polar(1.0, 0.0, 0.0));
        let before = out.clone();

        let outcome = dec.measure(&mut out).expect("skip");
        assert_eq!(outcome, MeasureOutcome::Skipped { msg_type: 0x2020 });
        assert_eq!(out, before);
        assert!(dec.time_offset().is_none());
    }

    #[test]
    fn time_offset_is_frozen_after_first_scan() {
        let mut bytes = scan_frame(1, 5000, vec![]).encode_message(BodyByteOrder::BigEndian);
        bytes.extend(scan_frame(2, 5002, vec![]).encode_message(BodyByteOrder::BigEndian));
        let mut dec = decoder(bytes);
        let mut out = layers();

        dec.measure(&mut out).expect("first");
        let offset = dec.time_offset().expect("offset set");
        let t1 = out[0].start_timestamp;
        assert_relative_eq!(t1, 5000.0 + offset);

        dec.measure(&mut out).expect("second");
        assert_eq!(dec.time_offset(), Some(offset));
        let t2 = out[0].start_timestamp;
        assert!(t1 < t2);
        assert_relative_eq!(t2 - t1, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn truncated_body_is_reported() {
        let mut bytes = scan_frame(1, 10, vec![point(0, 0, 0, 100)])
            .encode_message(BodyByteOrder::BigEndian);
        bytes.truncate(HEADER_LEN + 20);
        let mut dec = decoder(bytes);
        match dec.measure(&mut layers()) {
            Err(ScannerError::ShortBody { expected, got }) => {
                assert_eq!(expected, 54);
                assert_eq!(got, 20);
            }
            other => panic!("expected ShortBody, got {other:?}"),
        }
    }

    #[test]
    fn short_header_and_oversized_body() {
        let mut dec = decoder(vec![0xAF, 0xFE]);
        assert!(matches!(
            dec.measure(&mut layers()),
            Err(ScannerError::ShortHeader { got: 2 })
        ));

        let header = LdmrsHeader {
            body_len: MAX_BODY_LEN as u32 + 1,
            device_id: 0,
            msg_type: MSG_MEASURED_DATA,
        };
        let mut dec = decoder(header.to_bytes().to_vec());
        assert!(matches!(
            dec.measure(&mut layers()),
            Err(ScannerError::BodyTooLarge { .. })
        ));
    }

    #[test]
    fn unknown_layer_is_skipped() {
        let frame = scan_frame(3, 10, vec![point(5, 0, 0, 100), point(3, 0, 0, 100)]);
        let mut dec = decoder(frame.encode_message(BodyByteOrder::BigEndian));
        let mut out = layers();
        let outcome = dec.measure(&mut out).expect("measure");
        assert_eq!(
            outcome,
            MeasureOutcome::Measured {
                measurement_id: 3,
                points: 1
            }
        );
        assert_eq!(out[3].points.len(), 1);
    }

    #[test]
    fn zero_steps_is_invalid() {
        let mut frame = scan_frame(3, 10, vec![point(0, 0, 0, 100)]);
        frame.scan.num_steps = 0;
        let mut dec = decoder(frame.encode_message(BodyByteOrder::BigEndian));
        assert!(matches!(
            dec.measure(&mut layers()),
            Err(ScannerError::InvalidBody(_))
        ));
    }

    #[test]
    fn little_endian_bodies_when_configured() {
        let cfg = ScannerConfig {
            body_byte_order: BodyByteOrder::LittleEndian,
            ..ScannerConfig::default()
        };
        let frame = scan_frame(0x0102, 10, vec![point(1, 0, -2880, 250)]);
        let mut dec = ScannerDecoder::from_stream(
            cfg,
            Cursor::new(frame.encode_message(BodyByteOrder::LittleEndian)),
        );
        let mut out = layers();
        dec.measure(&mut out).expect("measure");
        assert_eq!(out[1].measurement_id, 0x0102);
        assert_relative_eq!(
            out[1].points[0].h_angle,
            -std::f64::consts::FRAC_PI_2,
            epsilon = 1e-12
        );
        assert_relative_eq!(out[1].points[0].radial_dist, 2.5, epsilon = 1e-12);
    }

    #[test]
    fn default_config_reads_network_order_message() {
        #[rustfmt::skip]
        let header: [u8; HEADER_LEN] = [
            0xAF, 0xFE, 0xC0, 0xC2, // magic
            0x00, 0x00, 0x00, 0x00, // previous size
            0x00, 0x00, 0x00, 0x40, // body length 64
            0x00, 0x00,             // reserved, device id
            0x22, 0x02,             // measured data
            0, 0, 0, 0, 0, 0, 0, 0, // ntp time
        ];
        let mut body = [0u8; 64];
        body[0..2].copy_from_slice(&[0x00, 0x07]);
        body[6..14].copy_from_slice(&[0x80, 0, 0, 0, 0, 0, 0, 100]);
        body[14..22].copy_from_slice(&[0, 0, 0, 0, 0, 0, 0, 101]);
        body[22..24].copy_from_slice(&[0x2D, 0x00]); // 11520 ticks
        body[24..26].copy_from_slice(&[0x06, 0x40]); // 1600
        body[26..28].copy_from_slice(&[0xF8, 0x80]); // -1920
        body[28..30].copy_from_slice(&[0x00, 0x02]);
        body[44..50].copy_from_slice(&[0x01, 0x00, 0x05, 0xA0, 0x03, 0xE8]);
        body[54..60].copy_from_slice(&[0x02, 0x00, 0xFA, 0x60, 0x00, 0xFA]);
        let mut bytes = header.to_vec();
        bytes.extend_from_slice(&body);

        let mut dec = decoder(bytes);
        let mut out = layers();
        let outcome = dec.measure(&mut out).expect("measure");
        assert_eq!(
            outcome,
            MeasureOutcome::Measured {
                measurement_id: 7,
                points: 2
            }
        );
        assert!(out[0].points.is_empty() && out[3].points.is_empty());
        assert_eq!(out[1].points.len(), 1);
        assert_eq!(out[2].points.len(), 1);
        assert_eq!(out[1].start_angle, 1600);
        assert_eq!(out[1].stop_angle, -1920);

        let p1 = out[1].points[0];
        assert_relative_eq!(p1.radial_dist, 10.0, epsilon = 1e-12);
        assert_relative_eq!(p1.h_angle, std::f64::consts::FRAC_PI_4, epsilon = 1e-12);
        assert_relative_eq!(p1.v_angle, (-0.4f64).to_radians(), epsilon = 1e-12);

        let p2 = out[2].points[0];
        assert_relative_eq!(p2.radial_dist, 2.5, epsilon = 1e-12);
        assert_relative_eq!(p2.h_angle, -std::f64::consts::FRAC_PI_4, epsilon = 1e-12);
        assert_relative_eq!(p2.v_angle, 0.4f64.to_radians(), epsilon = 1e-12);

        let offset = dec.time_offset().expect("offset");
        assert_relative_eq!(out[1].start_timestamp, 100.5 + offset);
        assert_relative_eq!(
            out[1].end_timestamp - out[1].start_timestamp,
            0.5,
            epsilon = 1e-6
        );
    }

    #[test]
    fn measure_without_connection() {
        let mut dec: ScannerDecoder<Cursor<Vec<u8>>> =
            ScannerDecoder::with_config(ScannerConfig::default());
        assert!(!dec.is_connected());
        let err = dec.measure(&mut layers()).expect_err("not connected");
        assert!(err.is_connection_error());
    }
}
