//! Persisted form of one context's relationships.
//!
//! Layout, all integers big-endian:
//!
//! ```text
//! i32 version
//! i32 record count
//! record*  = string element, string relationship id, i32 location count, location*
//! location = string element, i32 offset, i32 length, u8 has_prefix, [string prefix]
//! string   = u32 byte length, UTF-8 bytes
//! ```

use std::io::{self, Read, Write};

use serde::Serialize;

use super::Relationship;
use crate::error::IndexError;

/// Bump when the layout changes; older streams are rejected.
pub const INDEX_FORMAT_VERSION: i32 = 1;

/// Streams larger than this per string are rejected as malformed.
const MAX_STRING_LEN: u32 = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LocationData {
    pub element: String,
    pub offset: usize,
    pub length: usize,
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordData {
    pub element: String,
    pub relationship: Relationship,
    pub locations: Vec<LocationData>,
}

/// Counts read from a persisted index without resolving any element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexSummary {
    pub version: i32,
    pub keys: usize,
    pub locations: usize,
}

pub(crate) fn encode(
    records: &[RecordData],
    out: &mut dyn Write,
) -> Result<(), IndexError> {
    write_i32(out, INDEX_FORMAT_VERSION)?;
    write_count(out, records.len())?;
    for record in records {
        write_string(out, &record.element)?;
        write_string(out, record.relationship.id())?;
        write_count(out, record.locations.len())?;
        for location in &record.locations {
            write_string(out, &location.element)?;
            write_count(out, location.offset)?;
            write_count(out, location.length)?;
            match &location.prefix {
                Some(prefix) => {
                    out.write_all(&[1])?;
                    write_string(out, prefix)?;
                },
                None => out.write_all(&[0])?,
            }
        }
    }
    out.flush()?;
    Ok(())
}

pub(crate) fn decode(input: &mut dyn Read) -> Result<Vec<RecordData>, IndexError> {
    read_version(input)?;
    let count = read_count(input)?;
    let mut records = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        let element = read_string(input)?;
        let id = read_string(input)?;
        let relationship =
            Relationship::from_id(&id).ok_or_else(|| IndexError::Malformed(format!("unknown relationship `{id}`")))?;
        let location_count = read_count(input)?;
        let mut locations = Vec::with_capacity(location_count.min(4096));
        for _ in 0..location_count {
            let element = read_string(input)?;
            let offset = read_count(input)?;
            let length = read_count(input)?;
            let prefix = match read_u8(input)? {
                0 => None,
                1 => Some(read_string(input)?),
                flag => return Err(IndexError::Malformed(format!("invalid prefix flag {flag}"))),
            };
            locations.push(LocationData {
                element,
                offset,
                length,
                prefix,
            });
        }
        records.push(RecordData {
            element,
            relationship,
            locations,
        });
    }
    Ok(records)
}

/// Reads and validates a whole stream, reporting only its counts.
pub fn read_summary(input: &mut dyn Read) -> Result<IndexSummary, IndexError> {
    let records = decode(input)?;
    Ok(IndexSummary {
        version: INDEX_FORMAT_VERSION,
        keys: records.len(),
        locations: records.iter().map(|record| record.locations.len()).sum(),
    })
}

// ── primitives ──────────────────────────────────────────────────────────

fn read_version(input: &mut dyn Read) -> Result<(), IndexError> {
    let found = read_i32(input)?;
    if found != INDEX_FORMAT_VERSION {
        return Err(IndexError::IncompatibleFormat {
            found,
            expected: INDEX_FORMAT_VERSION,
        });
    }
    Ok(())
}

fn read_exact(
    input: &mut dyn Read,
    buf: &mut [u8],
) -> Result<(), IndexError> {
    input.read_exact(buf).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => IndexError::Truncated,
        _ => IndexError::Io(err),
    })
}

fn read_u8(input: &mut dyn Read) -> Result<u8, IndexError> {
    let mut buf = [0; 1];
    read_exact(input, &mut buf)?;
    Ok(buf[0])
}

fn read_i32(input: &mut dyn Read) -> Result<i32, IndexError> {
    let mut buf = [0; 4];
    read_exact(input, &mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

fn read_count(input: &mut dyn Read) -> Result<usize, IndexError> {
    let value = read_i32(input)?;
    usize::try_from(value).map_err(|_| IndexError::Malformed(format!("negative count {value}")))
}

fn read_string(input: &mut dyn Read) -> Result<String, IndexError> {
    let mut len = [0; 4];
    read_exact(input, &mut len)?;
    let len = u32::from_be_bytes(len);
    if len > MAX_STRING_LEN {
        return Err(IndexError::Malformed(format!("string of {len} bytes")));
    }
    let mut bytes = vec![0; len as usize];
    read_exact(input, &mut bytes)?;
    String::from_utf8(bytes).map_err(|err| IndexError::Malformed(err.to_string()))
}

fn write_i32(
    out: &mut dyn Write,
    value: i32,
) -> Result<(), IndexError> {
    out.write_all(&value.to_be_bytes())?;
    Ok(())
}

fn write_count(
    out: &mut dyn Write,
    value: usize,
) -> Result<(), IndexError> {
    let value = i32::try_from(value).map_err(|_| IndexError::Malformed(format!("count {value} overflows i32")))?;
    write_i32(out, value)
}

fn write_string(
    out: &mut dyn Write,
    value: &str,
) -> Result<(), IndexError> {
    let len = u32::try_from(value.len())
        .ok()
        .filter(|len| *len <= MAX_STRING_LEN)
        .ok_or_else(|| IndexError::Malformed(format!("string of {} bytes", value.len())))?;
    out.write_all(&len.to_be_bytes())?;
    out.write_all(value.as_bytes())?;
    Ok(())
}
