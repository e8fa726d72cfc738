//! Byte-aligned PER primitives
//!
//! A reduced, octet-aligned rendition of the ALIGNED PER rules used by
//! E2AP (X.691). Every primitive starts on an octet boundary:
//!
//! - length determinants use the APER short (`0xxxxxxx`) and long
//!   (`10xxxxxx xxxxxxxx`) forms; fragmented lengths are rejected
//! - constrained whole numbers use 1 or 2 octets when the range fits,
//!   otherwise a one-octet byte count followed by the minimal big-endian value
//! - choice indices and presence flags take one octet each
//!
//! [`PerEncoder`] never panics on bad input; values outside their
//! constraint are reported as [`E2apCodecError::ValueOutOfRange`].

use bytes::{Buf, BufMut, Bytes, BytesMut};
use nextgsim_common::Plmn;

use crate::codec::{E2apCodecError, Result};

/// Largest length that fits the non-fragmented APER length determinant.
pub const MAX_LENGTH: usize = 16383;

/// Writer for byte-aligned PER primitives.
#[derive(Debug, Default)]
pub struct PerEncoder {
    buf: BytesMut,
}

impl PerEncoder {
    /// Creates an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty encoder with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Number of octets written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns the encoded octets.
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.buf.put_u16(value);
    }

    /// Writes a length determinant.
    pub fn put_length(&mut self, len: usize) -> Result<()> {
        if len < 0x80 {
            self.buf.put_u8(len as u8);
        } else if len <= MAX_LENGTH {
            self.buf.put_u16(0x8000 | len as u16);
        } else {
            return Err(E2apCodecError::LengthTooLarge(len));
        }
        Ok(())
    }

    /// Writes a whole number constrained to `lower..=upper`.
    pub fn put_constrained(&mut self, value: u64, lower: u64, upper: u64) -> Result<()> {
        if value < lower || value > upper {
            return Err(E2apCodecError::ValueOutOfRange { value, lower, upper });
        }
        let offset = value - lower;
        let span = upper - lower;
        if span <= 0xFF {
            self.buf.put_u8(offset as u8);
        } else if span <= 0xFFFF {
            self.buf.put_u16(offset as u16);
        } else {
            let octets = (((64 - offset.leading_zeros()) + 7) / 8).max(1) as usize;
            self.buf.put_u8(octets as u8);
            self.buf.put_uint(offset, octets);
        }
        Ok(())
    }

    /// Writes the index of an ENUMERATED value with `count` root values.
    pub fn put_enumerated(&mut self, index: u8, count: u8) -> Result<()> {
        self.put_constrained(u64::from(index), 0, u64::from(count.saturating_sub(1)))
    }

    /// Writes the index of a CHOICE alternative.
    pub fn put_choice_index(&mut self, index: usize, count: usize) -> Result<()> {
        if index >= count || index > 0xFF {
            return Err(E2apCodecError::ValueOutOfRange {
                value: index as u64,
                lower: 0,
                upper: count.saturating_sub(1) as u64,
            });
        }
        self.buf.put_u8(index as u8);
        Ok(())
    }

    /// Writes a BOOLEAN, also used as the presence flag of OPTIONAL fields.
    pub fn put_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    pub fn put_octet_string(&mut self, data: &[u8]) -> Result<()> {
        self.put_length(data.len())?;
        self.buf.extend_from_slice(data);
        Ok(())
    }

    pub fn put_printable_string(&mut self, value: &str) -> Result<()> {
        if !value.bytes().all(is_printable) {
            return Err(E2apCodecError::Encode(format!(
                "'{value}' is not a PrintableString"
            )));
        }
        self.put_octet_string(value.as_bytes())
    }

    /// Writes a BIT STRING of `bits` significant bits (1..=64).
    pub fn put_bit_string(&mut self, value: u64, bits: u8) -> Result<()> {
        if bits == 0 || bits > 64 {
            return Err(E2apCodecError::Encode(format!("unsupported bit string size {bits}")));
        }
        if bits < 64 && value >> bits != 0 {
            return Err(E2apCodecError::ValueOutOfRange {
                value,
                lower: 0,
                upper: (1u64 << bits) - 1,
            });
        }
        self.buf.put_u8(bits);
        self.buf.put_uint(value, usize::from(bits).div_ceil(8));
        Ok(())
    }

    /// Writes an open type, i.e. a length-prefixed nested encoding.
    pub fn put_open_type(&mut self, inner: &[u8]) -> Result<()> {
        self.put_octet_string(inner)
    }

    pub fn put_plmn(&mut self, plmn: &Plmn) {
        self.buf.extend_from_slice(&plmn.encode());
    }
}

fn is_printable(c: u8) -> bool {
    c.is_ascii_alphanumeric() || b" '()+,-./:=?".contains(&c)
}

/// Reader for byte-aligned PER primitives.
#[derive(Debug, Clone)]
pub struct PerDecoder {
    buf: Bytes,
}

impl PerDecoder {
    pub fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    /// Number of octets not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    /// Fails if any octets are left unconsumed.
    pub fn finish(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(E2apCodecError::TrailingBytes(n)),
        }
    }

    fn need(&self, needed: usize) -> Result<()> {
        let available = self.buf.remaining();
        if available < needed {
            return Err(E2apCodecError::BufferTooShort { needed, available });
        }
        Ok(())
    }

    pub fn get_u8(&mut self) -> Result<u8> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn get_u16(&mut self) -> Result<u16> {
        self.need(2)?;
        Ok(self.buf.get_u16())
    }

    pub fn get_length(&mut self) -> Result<usize> {
        let first = self.get_u8()?;
        match first & 0xC0 {
            0x00 | 0x40 => Ok(usize::from(first)),
            0x80 => {
                let second = self.get_u8()?;
                Ok((usize::from(first & 0x3F) << 8) | usize::from(second))
            }
            _ => Err(E2apCodecError::InvalidValue(
                "fragmented length determinant".into(),
            )),
        }
    }

    pub fn get_constrained(&mut self, lower: u64, upper: u64) -> Result<u64> {
        let span = upper - lower;
        let offset = if span <= 0xFF {
            u64::from(self.get_u8()?)
        } else if span <= 0xFFFF {
            u64::from(self.get_u16()?)
        } else {
            let octets = usize::from(self.get_u8()?);
            if octets == 0 || octets > 8 {
                return Err(E2apCodecError::InvalidValue(format!(
                    "integer encoded in {octets} octets"
                )));
            }
            self.need(octets)?;
            self.buf.get_uint(octets)
        };
        let value = lower.saturating_add(offset);
        if offset > span {
            return Err(E2apCodecError::ValueOutOfRange { value, lower, upper });
        }
        Ok(value)
    }

    pub fn get_enumerated(&mut self, count: u8) -> Result<u8> {
        let value = self.get_constrained(0, u64::from(count.saturating_sub(1)))?;
        Ok(value as u8)
    }

    pub fn get_choice_index(&mut self, choice: &'static str, count: usize) -> Result<usize> {
        let index = self.get_u8()?;
        if usize::from(index) >= count {
            return Err(E2apCodecError::UnknownChoiceIndex { choice, index });
        }
        Ok(usize::from(index))
    }

    pub fn get_bool(&mut self) -> Result<bool> {
        match self.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(E2apCodecError::InvalidValue(format!(
                "boolean octet 0x{other:02x}"
            ))),
        }
    }

    pub fn get_octet_string(&mut self) -> Result<Bytes> {
        let len = self.get_length()?;
        self.need(len)?;
        Ok(self.buf.split_to(len))
    }

    pub fn get_printable_string(&mut self) -> Result<String> {
        let raw = self.get_octet_string()?;
        if !raw.iter().copied().all(is_printable) {
            return Err(E2apCodecError::InvalidValue(
                "non-printable character in PrintableString".into(),
            ));
        }
        Ok(raw.iter().map(|&c| char::from(c)).collect())
    }

    /// Reads a BIT STRING, returning the value and its size in bits.
    pub fn get_bit_string(&mut self) -> Result<(u64, u8)> {
        let bits = self.get_u8()?;
        if bits == 0 || bits > 64 {
            return Err(E2apCodecError::InvalidValue(format!("bit string size {bits}")));
        }
        let octets = usize::from(bits).div_ceil(8);
        self.need(octets)?;
        let value = self.buf.get_uint(octets);
        if bits < 64 && value >> bits != 0 {
            return Err(E2apCodecError::InvalidValue(format!(
                "bit string value exceeds {bits} bits"
            )));
        }
        Ok((value, bits))
    }

    /// Reads an open type and returns a decoder over its contents.
    pub fn get_open_type(&mut self) -> Result<PerDecoder> {
        Ok(PerDecoder::new(self.get_octet_string()?))
    }

    pub fn get_plmn(&mut self) -> Result<Plmn> {
        self.need(3)?;
        let mut octets = [0u8; 3];
        self.buf.copy_to_slice(&mut octets);
        Ok(Plmn::decode(octets))
    }
}
