//! Cursor-based little-endian reader over an in-memory byte buffer.
//!
//! [`ByteSource`] borrows the bytes it reads and owns only its cursor, so a
//! decode needs `&mut` access for its whole duration while any number of
//! independent sources may share the same underlying slice.

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;
use tracing::trace;

use crate::crc16::crc16;
use crate::timestamp::{Timestamp, TIME_REC_LEN};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ByteSourceError {
    #[error("Out of bounds: {requested} byte(s) requested at offset {offset}, {available} available")]
    OutOfBounds { offset: usize, requested: usize, available: usize },
}

#[derive(Debug, Clone)]
pub struct ByteSource<'a> {
    data:     &'a [u8],
    position: usize,
}

/// Equal when the underlying bytes are equal; cursors are not compared.
impl PartialEq for ByteSource<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for ByteSource<'_> {}

impl<'a> ByteSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// The whole underlying buffer, independent of the cursor.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Consume `n` bytes and return them as a view into the buffer.
    /// The cursor is left untouched on failure.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ByteSourceError> {
        let slice = self.peek(self.position, n)?;
        self.position += n;
        Ok(slice)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), ByteSourceError> {
        self.read_bytes(n).map(|_| ())
    }

    pub fn read_byte(&mut self) -> Result<u8, ByteSourceError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_word(&mut self) -> Result<u16, ByteSourceError> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    /// Three bytes little-endian; the high byte of the result is zero.
    pub fn read_triplet(&mut self) -> Result<u32, ByteSourceError> {
        Ok(LittleEndian::read_u24(self.read_bytes(3)?))
    }

    pub fn read_long(&mut self) -> Result<u32, ByteSourceError> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    /// Read an 8-byte IIgs TimeRec.
    pub fn read_date(&mut self) -> Result<Timestamp, ByteSourceError> {
        Ok(Timestamp::from_time_rec(&self.read_date_slot()?))
    }

    /// Read an 8-byte slot holding a ProDOS packed date and time.
    pub fn read_prodos_date(&mut self) -> Result<Timestamp, ByteSourceError> {
        Ok(Timestamp::from_prodos_bytes(&self.read_date_slot()?))
    }

    /// CRC-16/XMODEM over `data[start..start + len]`.  Does not move the cursor.
    pub fn compute_crc16(&self, start: usize, len: usize) -> Result<u16, ByteSourceError> {
        let crc = crc16(self.peek(start, len)?);
        trace!(start, len, crc, "crc16");
        Ok(crc)
    }

    fn read_date_slot(&mut self) -> Result<[u8; TIME_REC_LEN], ByteSourceError> {
        let mut slot = [0u8; TIME_REC_LEN];
        slot.copy_from_slice(self.read_bytes(TIME_REC_LEN)?);
        Ok(slot)
    }

    fn peek(&self, offset: usize, n: usize) -> Result<&'a [u8], ByteSourceError> {
        let out_of_bounds = || ByteSourceError::OutOfBounds {
            offset,
            requested: n,
            available: self.data.len().saturating_sub(offset),
        };
        let end = offset.checked_add(n).ok_or_else(out_of_bounds)?;
        self.data.get(offset..end).ok_or_else(out_of_bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_little_endian() {
        let mut bs = ByteSource::new(&[0x34, 0x12, 0x56, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xff]);
        assert_eq!(bs.read_word().unwrap(), 0x1234);
        assert_eq!(bs.read_triplet().unwrap(), 0x0012_3456);
        assert_eq!(bs.read_long().unwrap(), 0x1234_5678);
        assert_eq!(bs.read_byte().unwrap(), 0xff);
        assert_eq!(bs.position(), 10);
        assert_eq!(bs.remaining(), 0);
    }

    #[test]
    fn read_past_end_fails_without_moving() {
        let mut bs = ByteSource::new(&[0x01, 0x02, 0x03]);
        assert_eq!(bs.read_byte().unwrap(), 0x01);
        assert_eq!(
            bs.read_long(),
            Err(ByteSourceError::OutOfBounds { offset: 1, requested: 4, available: 2 })
        );
        assert_eq!(bs.position(), 1);
        assert_eq!(bs.read_word().unwrap(), 0x0302);
        assert!(bs.read_byte().is_err());
    }

    #[test]
    fn empty_source() {
        let mut bs = ByteSource::new(&[]);
        assert!(bs.is_empty());
        assert_eq!(
            bs.read_byte(),
            Err(ByteSourceError::OutOfBounds { offset: 0, requested: 1, available: 0 })
        );
        assert_eq!(bs.read_bytes(0).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn read_bytes_borrows_buffer() {
        let data = [1u8, 2, 3, 4, 5];
        let mut bs = ByteSource::new(&data);
        bs.skip(1).unwrap();
        let view = bs.read_bytes(3).unwrap();
        assert_eq!(view, &data[1..4]);
        assert_eq!(view.as_ptr(), data[1..].as_ptr());
    }

    #[test]
    fn dates_in_place_match_isolated() {
        let rec: [u8; 8] = [0x38, 0x0c, 0x14, 0x5f, 0x08, 0x07, 0x30, 0x04];
        let mut framed: Vec<u8> = vec![0xaa, 0xbb, 0xcc];
        framed.extend_from_slice(&rec);
        framed.push(0xdd);

        let mut outer = ByteSource::new(&framed);
        outer.skip(3).unwrap();
        let embedded = outer.read_date().unwrap();
        let isolated = ByteSource::new(&rec).read_date().unwrap();
        assert_eq!(embedded, isolated);
        assert_eq!(outer.position(), 11);
    }

    #[test]
    fn prodos_date_slot() {
        // 1988-06-15 09:30, little-endian words then four ignored bytes
        let date: u16 = (88 << 9) | (6 << 5) | 15;
        let time: u16 = (9 << 8) | 30;
        let mut slot = Vec::new();
        slot.extend_from_slice(&date.to_le_bytes());
        slot.extend_from_slice(&time.to_le_bytes());
        slot.extend_from_slice(&[1, 2, 3, 4]);
        let ts = ByteSource::new(&slot).read_prodos_date().unwrap();
        assert_eq!(ts, Timestamp::new(1988, 6, 15, 9, 30, 0));
    }

    #[test]
    fn crc_over_range_leaves_cursor() {
        let bs = ByteSource::new(b"xxx123456789xxx");
        assert_eq!(bs.compute_crc16(3, 9).unwrap(), 0x31c3);
        assert_eq!(bs.position(), 0);
        assert!(bs.compute_crc16(10, 6).is_err());
        assert!(bs.compute_crc16(usize::MAX, 2).is_err());
    }

    #[test]
    fn readers_are_duplicated_explicitly() {
        fn consume_word(bs: &mut ByteSource<'_>) -> u16 {
            bs.read_word().unwrap()
        }

        let data = [0x34u8, 0x12, 0x78, 0x56];
        let mut bs = ByteSource::new(&data);
        assert_eq!(consume_word(&mut bs), 0x1234);
        assert_eq!(bs.position(), 2);

        let mut fork = bs.clone();
        assert_eq!(fork.read_word().unwrap(), 0x5678);
        assert_eq!(fork.position(), 4);
        assert_eq!(bs.position(), 2);

        let mut fresh = ByteSource::new(bs.as_bytes());
        assert_eq!(fresh.read_word().unwrap(), 0x1234);
        assert_eq!(bs.read_word().unwrap(), 0x5678);
    }

    #[test]
    fn equality_ignores_cursor() {
        let data = [9u8, 8, 7, 6];
        let a = ByteSource::new(&data);
        let mut b = ByteSource::new(&data[..]);
        b.skip(2).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, ByteSource::new(&data[..3]));
        assert_eq!(ByteSource::new(&vec![9u8, 8, 7, 6]), a);
    }
}
