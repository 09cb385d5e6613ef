//! Record codec
//!
//! Encoding and decoding of records against a list of field lengths.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, SeqFileError};
use crate::pointer::{decode_pointer, encode_pointer, POINTER_WIDTH};

use super::Record;

/// Size of the null bitmap in bytes
pub const NULL_BITMAP_SIZE: usize = 1;

/// Bitmap with bit i set for every null value
pub fn null_bitmap(values: &[Option<String>]) -> u8 {
    values
        .iter()
        .take(8 * NULL_BITMAP_SIZE)
        .enumerate()
        .filter(|(_, v)| v.is_none())
        .fold(0u8, |bitmap, (i, _)| bitmap | (1 << i))
}

pub fn is_null(bitmap: u8, index: usize) -> bool {
    index < 8 * NULL_BITMAP_SIZE && bitmap & (1u8 << index) != 0
}

/// On-disk size of a record, from its bitmap and the field lengths only
pub fn encoded_len(bitmap: u8, field_lengths: &[usize]) -> usize {
    let fields: usize = field_lengths
        .iter()
        .enumerate()
        .filter(|(i, _)| !is_null(bitmap, *i))
        .map(|(_, len)| *len)
        .sum();
    NULL_BITMAP_SIZE + fields + POINTER_WIDTH
}

/// Encode a record
///
/// Format: bitmap (1) + present fields (declared lengths) + next (4).
/// Values longer than their field are truncated, shorter ones zero padded.
pub fn encode(record: &Record, field_lengths: &[usize]) -> Result<Bytes> {
    let values = record.values();
    if values.len() > 8 * NULL_BITMAP_SIZE {
        return Err(SeqFileError::SchemaMismatch(format!(
            "{} values do not fit a {}-byte null bitmap",
            values.len(),
            NULL_BITMAP_SIZE
        )));
    }
    if values.len() != field_lengths.len() {
        return Err(SeqFileError::SchemaMismatch(format!(
            "record has {} values, schema has {} fields",
            values.len(),
            field_lengths.len()
        )));
    }

    let bitmap = null_bitmap(values);
    let mut buf = BytesMut::with_capacity(encoded_len(bitmap, field_lengths));
    buf.put_u8(bitmap);

    for (value, &len) in values.iter().zip(field_lengths) {
        if let Some(value) = value {
            let bytes = value.as_bytes();
            let copied = bytes.len().min(len);
            buf.put_slice(&bytes[..copied]);
            buf.put_bytes(0, len - copied);
        }
    }

    buf.put_slice(&encode_pointer(record.next())?);
    Ok(buf.freeze())
}

/// Decode a record from a buffer at least as long as the record
///
/// Fails with `TruncatedRecord` if the buffer is shorter than its own
/// bitmap implies, `SchemaMismatch` if the bitmap names fields the schema
/// does not have.
pub fn decode(bytes: &[u8], field_lengths: &[usize]) -> Result<Record> {
    if bytes.len() < NULL_BITMAP_SIZE {
        return Err(SeqFileError::TruncatedRecord {
            needed: NULL_BITMAP_SIZE + POINTER_WIDTH,
            available: bytes.len(),
        });
    }

    let bitmap = bytes[0];
    let extra_bits = if field_lengths.len() >= 8 {
        0
    } else {
        bitmap >> field_lengths.len()
    };
    if extra_bits != 0 {
        return Err(SeqFileError::SchemaMismatch(format!(
            "null bitmap {:#010b} marks fields beyond the {} in the schema",
            bitmap,
            field_lengths.len()
        )));
    }

    let needed = encoded_len(bitmap, field_lengths);
    if bytes.len() < needed {
        return Err(SeqFileError::TruncatedRecord {
            needed,
            available: bytes.len(),
        });
    }

    let mut buf = &bytes[NULL_BITMAP_SIZE..needed];
    let mut values = Vec::with_capacity(field_lengths.len());
    for (i, &len) in field_lengths.iter().enumerate() {
        if is_null(bitmap, i) {
            values.push(None);
            continue;
        }
        let raw = &buf[..len];
        let end = raw.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
        values.push(Some(String::from_utf8_lossy(&raw[..end]).into_owned()));
        buf.advance(len);
    }

    let mut pointer = [0u8; POINTER_WIDTH];
    buf.copy_to_slice(&mut pointer);
    let next = decode_pointer(pointer)?;

    Ok(Record::new(values, next))
}
