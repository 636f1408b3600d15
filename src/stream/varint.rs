//! Varint: 7 data bits per byte, little-endian groups.
//!
//! Байты <= 0x7f — продолжение (7 бит данных), первый байт > 0x7f — терминатор.
//! Терминатор несёт `byte - marker`: для unsigned marker = 0x80, для signed — 0xc0,
//! так что последняя группа может быть отрицательной (знак применяется один раз).

use super::SnapshotStream;
use crate::consts::{
    DATA_BITS_PER_BYTE, END_BYTE_MARKER, END_UNSIGNED_BYTE_MARKER, MAX_UNSIGNED_DATA_PER_BYTE,
};
use crate::error::{Result, SnapshotError};

impl<'a> SnapshotStream<'a> {
    /// Unsigned varint of unbounded width.
    pub fn read_unsigned(&mut self) -> Result<u64> {
        let offset = self.tell();
        let (low, shift, last) = self.read_groups()?;
        let tail = u64::from(last - END_UNSIGNED_BYTE_MARKER);
        Ok(low | shift_in(tail, shift, offset)?)
    }

    /// Unsigned read with an explicit bit width: width 8 is a raw byte without
    /// a marker, every other width uses the varint encoding.
    pub fn read_unsigned_bits(&mut self, bits: u32) -> Result<u64> {
        if bits == 8 {
            return self.read_u8().map(u64::from);
        }
        self.read_unsigned()
    }

    /// Signed varint; width 8 is a raw two's-complement byte.
    pub fn read_int(&mut self, bits: u32) -> Result<i64> {
        if bits == 8 {
            return self.read_u8().map(|b| i64::from(b as i8));
        }
        let offset = self.tell();
        let (low, shift, last) = self.read_groups()?;
        let tail = i64::from(last) - i64::from(END_BYTE_MARKER);
        if shift >= 64 {
            // Все 64 бита уже набраны группами данных; допустим только нулевой хвост.
            return match tail {
                0 => Ok(low as i64),
                _ => Err(SnapshotError::VarintOverflow { offset }),
            };
        }
        let high = tail.wrapping_shl(shift);
        if high >> shift != tail {
            return Err(SnapshotError::VarintOverflow { offset });
        }
        Ok((low as i64) | high)
    }

    /// Reads continuation groups; returns (accumulated low bits, shift, terminator byte).
    fn read_groups(&mut self) -> Result<(u64, u32, u8)> {
        let offset = self.tell();
        let mut acc = 0u64;
        let mut shift = 0u32;
        let mut b = self.read_u8()?;
        while b <= MAX_UNSIGNED_DATA_PER_BYTE {
            acc |= shift_in(u64::from(b), shift, offset)?;
            shift += DATA_BITS_PER_BYTE;
            b = self.read_u8()?;
        }
        Ok((acc, shift, b))
    }
}

#[inline]
fn shift_in(v: u64, shift: u32, offset: usize) -> Result<u64> {
    if v == 0 {
        return Ok(0);
    }
    if shift >= 64 || (v << shift) >> shift != v {
        return Err(SnapshotError::VarintOverflow { offset });
    }
    Ok(v << shift)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enc_unsigned(mut v: u64) -> Vec<u8> {
        let mut out = Vec::new();
        while v > u64::from(MAX_UNSIGNED_DATA_PER_BYTE) {
            out.push((v & 0x7f) as u8);
            v >>= 7;
        }
        out.push(v as u8 + END_UNSIGNED_BYTE_MARKER);
        out
    }

    fn enc_signed(mut v: i64) -> Vec<u8> {
        let mut out = Vec::new();
        while !(-64..=63).contains(&v) {
            out.push((v & 0x7f) as u8);
            v >>= 7;
        }
        out.push((v + i64::from(END_BYTE_MARKER)) as u8);
        out
    }

    #[test]
    fn single_terminating_byte() {
        let mut s = SnapshotStream::new(&[0x81, 0x82, 0x80]);
        assert_eq!(s.read_unsigned().unwrap(), 1);
        assert_eq!(s.read_unsigned().unwrap(), 2);
        assert_eq!(s.read_unsigned().unwrap(), 0);
        assert_eq!(s.tell(), 3);
    }

    #[test]
    fn raw_byte_for_width_8() {
        let mut s = SnapshotStream::new(&[0x01, 0x02, 0xff]);
        assert_eq!(s.read_unsigned_bits(8).unwrap(), 1);
        assert_eq!(s.read_unsigned_bits(8).unwrap(), 2);
        assert_eq!(s.read_int(8).unwrap(), -1);
    }

    #[test]
    fn lone_continuation_byte_is_truncated() {
        let mut s = SnapshotStream::new(&[0x01]);
        assert!(matches!(
            s.read_unsigned(),
            Err(SnapshotError::TruncatedStream { offset: 1, needed: 1 })
        ));
    }

    #[test]
    fn multi_byte_unsigned() {
        // 300 = 0b10_0101100 -> [0x2c, 0x02 + 0x80]
        let mut s = SnapshotStream::new(&[0x2c, 0x82]);
        assert_eq!(s.read_unsigned().unwrap(), 300);
    }

    #[test]
    fn signed_small_values() {
        // -1 -> 0xbf, 0 -> 0xc0, 63 -> 0xff, -64 -> 0x80
        let mut s = SnapshotStream::new(&[0xbf, 0xc0, 0xff, 0x80]);
        assert_eq!(s.read_int(32).unwrap(), -1);
        assert_eq!(s.read_int(32).unwrap(), 0);
        assert_eq!(s.read_int(32).unwrap(), 63);
        assert_eq!(s.read_int(32).unwrap(), -64);
    }

    #[test]
    fn unsigned_roundtrip_edges() {
        for v in [0u64, 1, 127, 128, 16_383, 16_384, (1 << 35) - 1, u64::MAX] {
            let bytes = enc_unsigned(v);
            let mut s = SnapshotStream::new(&bytes);
            assert_eq!(s.read_unsigned().unwrap(), v, "value {v}");
            assert_eq!(s.remaining(), 0);
        }
    }

    #[test]
    fn signed_roundtrip_edges() {
        for v in [0i64, -1, 64, -65, 1 << 40, -(1 << 40), i64::MAX, i64::MIN] {
            let bytes = enc_signed(v);
            let mut s = SnapshotStream::new(&bytes);
            assert_eq!(s.read_int(64).unwrap(), v, "value {v}");
        }
    }

    #[test]
    fn overlong_unsigned_overflows() {
        let mut bytes = vec![0x7f; 10];
        bytes.push(0x81);
        let mut s = SnapshotStream::new(&bytes);
        assert!(matches!(
            s.read_unsigned(),
            Err(SnapshotError::VarintOverflow { offset: 0 })
        ));
    }

    #[test]
    fn cid_out_of_i32_range() {
        let bytes = enc_signed(i64::from(i32::MAX) + 1);
        let mut s = SnapshotStream::new(&bytes);
        assert!(matches!(s.read_cid(), Err(SnapshotError::VarintOverflow { .. })));
    }
}
