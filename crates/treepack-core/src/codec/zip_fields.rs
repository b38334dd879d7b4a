//! Zip extra fields and DOS timestamps carrying POSIX metadata.
//!
//! - `0x5455` extended timestamp: flags byte, then mtime as `i32` LE.
//! - `0x7875` Info-ZIP Unix: version 1, uid size, uid, gid size, gid.
//!
//! DOS date/time is interpreted as UTC and only used when the extended
//! timestamp is missing.

use chrono::DateTime;
use chrono::Datelike;
use chrono::NaiveDate;
use chrono::Timelike;
use chrono::Utc;

pub(crate) const EXTENDED_TIMESTAMP_ID: u16 = 0x5455;
pub(crate) const UNIX_OWNER_ID: u16 = 0x7875;

const MTIME_FLAG: u8 = 0x01;

/// Builds the payload of an extended timestamp field holding `mtime`.
pub(crate) fn extended_timestamp(mtime: i64) -> Box<[u8]> {
    let clamped = i32::try_from(mtime).unwrap_or(if mtime < 0 { i32::MIN } else { i32::MAX });
    let mut data = Vec::with_capacity(5);
    data.push(MTIME_FLAG);
    data.extend_from_slice(&clamped.to_le_bytes());
    data.into_boxed_slice()
}

/// Builds the payload of an Info-ZIP Unix field holding `uid` and `gid`.
pub(crate) fn unix_owner(uid: u32, gid: u32) -> Box<[u8]> {
    let mut data = Vec::with_capacity(11);
    data.push(1);
    data.push(4);
    data.extend_from_slice(&uid.to_le_bytes());
    data.push(4);
    data.extend_from_slice(&gid.to_le_bytes());
    data.into_boxed_slice()
}

/// Metadata recovered from an entry's extra field block.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ExtraFields {
    pub mtime: Option<i64>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
}

impl ExtraFields {
    /// Walks the `(id, size, payload)` records of an extra field block.
    /// Unknown or truncated records are ignored.
    pub(crate) fn parse(mut block: &[u8]) -> Self {
        let mut fields = Self::default();
        while block.len() >= 4 {
            let id = u16::from_le_bytes([block[0], block[1]]);
            let size = usize::from(u16::from_le_bytes([block[2], block[3]]));
            let Some(payload) = block.get(4..4 + size) else {
                break;
            };
            match id {
                EXTENDED_TIMESTAMP_ID => fields.mtime = parse_timestamp(payload),
                UNIX_OWNER_ID => {
                    if let Some((uid, gid)) = parse_owner(payload) {
                        fields.uid = Some(uid);
                        fields.gid = Some(gid);
                    }
                }
                _ => {}
            }
            block = &block[4 + size..];
        }
        fields
    }
}

fn parse_timestamp(payload: &[u8]) -> Option<i64> {
    let (&flags, rest) = payload.split_first()?;
    if flags & MTIME_FLAG == 0 {
        return None;
    }
    let bytes: [u8; 4] = rest.get(..4)?.try_into().ok()?;
    Some(i64::from(i32::from_le_bytes(bytes)))
}

fn parse_owner(payload: &[u8]) -> Option<(u32, u32)> {
    let (&version, rest) = payload.split_first()?;
    if version != 1 {
        return None;
    }
    let (uid, rest) = read_sized_id(rest)?;
    let (gid, _) = read_sized_id(rest)?;
    Some((uid, gid))
}

/// Reads a little-endian id prefixed by its byte width (1 to 8 bytes).
fn read_sized_id(data: &[u8]) -> Option<(u32, &[u8])> {
    let (&size, rest) = data.split_first()?;
    let size = usize::from(size);
    if size == 0 || size > 8 {
        return None;
    }
    let bytes = rest.get(..size)?;
    let mut value = [0u8; 8];
    value[..size].copy_from_slice(bytes);
    let id = u32::try_from(u64::from_le_bytes(value)).ok()?;
    Some((id, &rest[size..]))
}

/// Converts Unix seconds to a DOS timestamp, clamped to 1980..=2107.
pub(crate) fn dos_datetime(mtime: i64) -> zip::DateTime {
    let Some(utc) = DateTime::<Utc>::from_timestamp(mtime, 0) else {
        return zip::DateTime::default();
    };
    let clamped_year = utc.year().clamp(1980, 2107);
    if clamped_year != utc.year() {
        return if utc.year() < 1980 {
            zip::DateTime::default()
        } else {
            zip::DateTime::from_date_and_time(2107, 12, 31, 23, 59, 58).unwrap_or_default()
        };
    }

    zip::DateTime::from_date_and_time(
        u16::try_from(utc.year()).unwrap_or(1980),
        u8::try_from(utc.month()).unwrap_or(1),
        u8::try_from(utc.day()).unwrap_or(1),
        u8::try_from(utc.hour()).unwrap_or(0),
        u8::try_from(utc.minute()).unwrap_or(0),
        u8::try_from(utc.second()).unwrap_or(0),
    )
    .unwrap_or_default()
}

/// Converts a DOS timestamp back to Unix seconds.
pub(crate) fn unix_seconds(dos: zip::DateTime) -> Option<i64> {
    let date = NaiveDate::from_ymd_opt(
        i32::from(dos.year()),
        u32::from(dos.month()),
        u32::from(dos.day()),
    )?;
    let time = date.and_hms_opt(
        u32::from(dos.hour()),
        u32::from(dos.minute()),
        u32::from(dos.second()),
    )?;
    Some(time.and_utc().timestamp())
}
