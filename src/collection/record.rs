//! Packed little-endian record layouts, one per point variant.
//!
//! Strides are fixed per variant and multiples of four bytes; trailing
//! padding keeps 4-byte alignment available for bulk scans. Optional
//! fields use the codec sentinels from [`crate::types::codec`].

use crate::types::codec;
use crate::types::{GpsMeasurement, GpsPoint, GpsPointWithAccuracy, GpsStay, GpsTime, PointLike};

/// A point variant with a fixed-stride binary record layout.
pub trait PackedPoint: PointLike + Clone {
    /// Record size in bytes.
    const STRIDE: usize;

    /// Quantise and encode into exactly [`PackedPoint::STRIDE`] bytes.
    fn encode_into(&self, buf: &mut [u8]);

    /// Decode one record; inverse of [`PackedPoint::encode_into`] up to
    /// quantisation error.
    fn decode_from(buf: &[u8]) -> Self;

    /// Quantised latitude/longitude of one record without decoding
    /// anything else. Both values are offset-binary E7 as produced by
    /// the coordinate codecs.
    fn lat_long_e7(buf: &[u8]) -> (u32, u32);
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
}

fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(buf[offset..offset + 2].try_into().unwrap())
}

fn read_i16(buf: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes(buf[offset..offset + 2].try_into().unwrap())
}

// Shared leading 12 bytes: time_u32 | lat_u32 | long_u32.
fn encode_head(time: GpsTime, latitude: f64, longitude: f64, buf: &mut [u8]) {
    buf[0..4].copy_from_slice(&time.as_secs().to_le_bytes());
    buf[4..8].copy_from_slice(&codec::encode_latitude(latitude).to_le_bytes());
    buf[8..12].copy_from_slice(&codec::encode_longitude(longitude).to_le_bytes());
}

fn decode_head(buf: &[u8]) -> (GpsTime, f64, f64) {
    (
        GpsTime::clamped(read_u32(buf, 0) as i64),
        codec::decode_latitude(read_u32(buf, 4)),
        codec::decode_longitude(read_u32(buf, 8)),
    )
}

impl PackedPoint for GpsPoint {
    // time_u32 | lat_u32 | long_u32 | alt_i16 | pad_u16
    const STRIDE: usize = 16;

    fn encode_into(&self, buf: &mut [u8]) {
        encode_head(self.time, self.latitude, self.longitude, buf);
        buf[12..14].copy_from_slice(&codec::encode_altitude(self.altitude).to_le_bytes());
        buf[14..16].copy_from_slice(&0u16.to_le_bytes());
    }

    fn decode_from(buf: &[u8]) -> Self {
        let (time, latitude, longitude) = decode_head(buf);
        Self {
            time,
            latitude,
            longitude,
            altitude: codec::decode_altitude(read_i16(buf, 12)),
        }
    }

    fn lat_long_e7(buf: &[u8]) -> (u32, u32) {
        (read_u32(buf, 4), read_u32(buf, 8))
    }
}

impl PackedPoint for GpsPointWithAccuracy {
    // time_u32 | lat_u32 | long_u32 | alt_i16 | accuracy_u16
    const STRIDE: usize = 16;

    fn encode_into(&self, buf: &mut [u8]) {
        encode_head(self.time, self.latitude, self.longitude, buf);
        buf[12..14].copy_from_slice(&codec::encode_altitude(self.altitude).to_le_bytes());
        buf[14..16].copy_from_slice(&codec::encode_deci(self.accuracy).to_le_bytes());
    }

    fn decode_from(buf: &[u8]) -> Self {
        let (time, latitude, longitude) = decode_head(buf);
        Self {
            time,
            latitude,
            longitude,
            altitude: codec::decode_altitude(read_i16(buf, 12)),
            accuracy: codec::decode_deci(read_u16(buf, 14)),
        }
    }

    fn lat_long_e7(buf: &[u8]) -> (u32, u32) {
        (read_u32(buf, 4), read_u32(buf, 8))
    }
}

impl PackedPoint for GpsStay {
    // PointWithAccuracy-16B | endTime_u32 | pad_u32
    const STRIDE: usize = 24;

    fn encode_into(&self, buf: &mut [u8]) {
        encode_head(self.time, self.latitude, self.longitude, buf);
        buf[12..14].copy_from_slice(&codec::encode_altitude(self.altitude).to_le_bytes());
        buf[14..16].copy_from_slice(&codec::encode_deci(self.accuracy).to_le_bytes());
        buf[16..20].copy_from_slice(&self.end_time.as_secs().to_le_bytes());
        buf[20..24].copy_from_slice(&0u32.to_le_bytes());
    }

    fn decode_from(buf: &[u8]) -> Self {
        let (time, latitude, longitude) = decode_head(buf);
        Self {
            time,
            latitude,
            longitude,
            altitude: codec::decode_altitude(read_i16(buf, 12)),
            accuracy: codec::decode_deci(read_u16(buf, 14)),
            end_time: GpsTime::clamped(read_u32(buf, 16) as i64),
        }
    }

    fn lat_long_e7(buf: &[u8]) -> (u32, u32) {
        (read_u32(buf, 4), read_u32(buf, 8))
    }
}

impl PackedPoint for GpsMeasurement {
    // PointWithAccuracy-16B | heading_u16 | speed_u16 | speedAccuracy_u16 | pad_u16
    const STRIDE: usize = 24;

    fn encode_into(&self, buf: &mut [u8]) {
        encode_head(self.time, self.latitude, self.longitude, buf);
        buf[12..14].copy_from_slice(&codec::encode_altitude(self.altitude).to_le_bytes());
        buf[14..16].copy_from_slice(&codec::encode_deci(self.accuracy).to_le_bytes());
        buf[16..18].copy_from_slice(&codec::encode_heading(self.heading).to_le_bytes());
        buf[18..20].copy_from_slice(&codec::encode_deci(self.speed).to_le_bytes());
        buf[20..22].copy_from_slice(&codec::encode_deci(self.speed_accuracy).to_le_bytes());
        buf[22..24].copy_from_slice(&0u16.to_le_bytes());
    }

    fn decode_from(buf: &[u8]) -> Self {
        let (time, latitude, longitude) = decode_head(buf);
        Self {
            time,
            latitude,
            longitude,
            altitude: codec::decode_altitude(read_i16(buf, 12)),
            accuracy: codec::decode_deci(read_u16(buf, 14)),
            heading: codec::decode_heading(read_u16(buf, 16)),
            speed: codec::decode_deci(read_u16(buf, 18)),
            speed_accuracy: codec::decode_deci(read_u16(buf, 20)),
        }
    }

    fn lat_long_e7(buf: &[u8]) -> (u32, u32) {
        (read_u32(buf, 4), read_u32(buf, 8))
    }
}
