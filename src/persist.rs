//! Binary persistence of columnar collections.
//!
//! Stream layout, little-endian: a 20-byte printable-ASCII signature,
//! a u16 format version, one flags byte (bit 0: records are
//! time-sorted), a u64 record count, then the raw column bytes exactly
//! as held in memory. Loading validates the signature byte for byte.

use std::io::{Read, Seek, Write};

use binrw::{binrw, BinRead, BinWrite};
use tracing::debug;

use crate::collection::{ColumnarCollection, PackedPoint};
use crate::constants::SIGNATURE_LENGTH;
use crate::GpsHistoryError;

/// Current stream format version.
pub const STREAM_VERSION: u16 = 1;

const FLAG_SORTED: u8 = 0b0000_0001;

/// A validated stream signature: exactly [`SIGNATURE_LENGTH`] bytes of
/// printable ASCII.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    pub fn new(text: &str) -> Result<Self, GpsHistoryError> {
        let bytes = text.as_bytes();
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(GpsHistoryError::InvalidSignature(format!(
                "expected {SIGNATURE_LENGTH} bytes, got {}",
                bytes.len()
            )));
        }
        let mut signature = [0u8; SIGNATURE_LENGTH];
        for (i, &byte) in bytes.iter().enumerate() {
            if !(32..=126).contains(&byte) {
                return Err(GpsHistoryError::InvalidSignature(format!(
                    "non-printable byte at position {i}"
                )));
            }
            signature[i] = byte;
        }
        Ok(Self(signature))
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }
}

#[binrw]
#[brw(little)]
struct StreamHeader {
    signature: [u8; SIGNATURE_LENGTH],
    version: u16,
    flags: u8,
    record_count: u64,
}

/// Write a collection as a signed binary stream.
pub fn write_stream<R, W>(
    writer: &mut W,
    signature: &Signature,
    collection: &ColumnarCollection<R>,
) -> Result<(), GpsHistoryError>
where
    R: PackedPoint,
    W: Write + Seek,
{
    let header = StreamHeader {
        signature: signature.0,
        version: STREAM_VERSION,
        flags: if collection.sorted_by_time() {
            FLAG_SORTED
        } else {
            0
        },
        record_count: collection.len() as u64,
    };
    header.write(writer)?;
    writer.write_all(collection.raw_bytes())?;
    debug!(records = collection.len(), "wrote stream");
    Ok(())
}

/// Load a collection from a signed binary stream, rejecting any
/// signature or version mismatch.
pub fn read_stream<R, Rd>(
    reader: &mut Rd,
    expected: &Signature,
) -> Result<ColumnarCollection<R>, GpsHistoryError>
where
    R: PackedPoint,
    Rd: Read + Seek,
{
    let header = StreamHeader::read(reader)?;
    for (i, (found, wanted)) in header
        .signature
        .iter()
        .zip(expected.0.iter())
        .enumerate()
    {
        if found != wanted {
            return Err(GpsHistoryError::InvalidSignature(format!(
                "mismatch at byte position {i}"
            )));
        }
    }
    if header.version > STREAM_VERSION {
        return Err(GpsHistoryError::UnsupportedVersion {
            version: header.version,
            supported: STREAM_VERSION,
        });
    }
    let record_count = usize::try_from(header.record_count)
        .ok()
        .filter(|count| count.checked_mul(R::STRIDE).is_some())
        .ok_or(GpsHistoryError::Range {
            what: "stream record count",
            value: header.record_count as f64,
        })?;
    let mut bytes = vec![0u8; record_count * R::STRIDE];
    reader.read_exact(&mut bytes)?;
    debug!(records = record_count, "read stream");
    ColumnarCollection::from_raw_bytes(bytes, record_count, header.flags & FLAG_SORTED != 0)
}
