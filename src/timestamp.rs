//! Calendar timestamps decoded from the two date encodings found in NuFX and
//! Binary II archives.
//!
//! # IIgs TimeRec (8 bytes)
//!
//! | Byte | Field |
//! |------|-------|
//! | 0 | second |
//! | 1 | minute |
//! | 2 | hour |
//! | 3 | year - 1900 |
//! | 4 | day - 1 |
//! | 5 | month - 1 |
//! | 6 | filler |
//! | 7 | weekday (1 = Sunday) |
//!
//! # ProDOS date/time (two LE words)
//!
//! ```text
//! date: yyyyyyym mmmddddd
//! time: 000hhhhh 00mmmmmm
//! ```
//!
//! In both encodings a stored year below 40 means 2000-2039 (NuFX addendum).
//! Decoding is purely mechanical: out-of-range fields are passed through and
//! only [`Timestamp::to_naive_datetime`] checks calendar legality.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use chrono::{NaiveDate, NaiveDateTime};

/// Byte length of a TimeRec and of the slot a ProDOS date occupies.
pub const TIME_REC_LEN: usize = 8;

const CENTURY_PIVOT: u16 = 40;

/// A decoded date and time.  No time zone; archives store local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp {
    pub year:    u16,
    /// 1-based.
    pub month:   u8,
    /// 1-based.
    pub day:     u8,
    pub hour:    u8,
    pub minute:  u8,
    pub second:  u8,
    /// IIgs weekday, 1 = Sunday.  Always 0 for ProDOS dates.
    pub weekday: u8,
    null:        bool,
}

impl Timestamp {
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self { year, month, day, hour, minute, second, weekday: 0, null: false }
    }

    /// Decode an 8-byte IIgs TimeRec.
    pub fn from_time_rec(bytes: &[u8; TIME_REC_LEN]) -> Self {
        Self {
            year:    expand_year(bytes[3] as u16),
            month:   bytes[5].wrapping_add(1),
            day:     bytes[4].wrapping_add(1),
            hour:    bytes[2],
            minute:  bytes[1],
            second:  bytes[0],
            weekday: bytes[7],
            null:    bytes.iter().all(|&b| b == 0),
        }
    }

    /// Decode a ProDOS packed date word and time word.
    pub fn from_prodos(date: u16, time: u16) -> Self {
        Self {
            year:    expand_year(date >> 9),
            month:   ((date >> 5) & 0x0f) as u8,
            day:     (date & 0x1f) as u8,
            hour:    ((time >> 8) & 0x1f) as u8,
            minute:  (time & 0x3f) as u8,
            second:  0,
            weekday: 0,
            null:    date == 0 && time == 0,
        }
    }

    /// Decode an 8-byte slot holding a ProDOS date word then a time word.
    /// The trailing four bytes are ignored.
    pub fn from_prodos_bytes(bytes: &[u8; TIME_REC_LEN]) -> Self {
        Self::from_prodos(
            LittleEndian::read_u16(&bytes[0..2]),
            LittleEndian::read_u16(&bytes[2..4]),
        )
    }

    /// True when the encoding was all zeros, the format's "no date".
    pub fn is_null(&self) -> bool {
        self.null
    }

    /// Convert to a chrono value.  `None` for a null date or one that is not
    /// a real calendar moment (month 13, February 30th, hour 25, ...).
    pub fn to_naive_datetime(&self) -> Option<NaiveDateTime> {
        if self.null {
            return None;
        }
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)?
            .and_hms_opt(self.hour as u32, self.minute as u32, self.second as u32)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.null {
            return f.write_str("(null)");
        }
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second,
        )
    }
}

fn expand_year(stored: u16) -> u16 {
    if stored < CENTURY_PIVOT { 2000 + stored } else { 1900 + stored }
}
