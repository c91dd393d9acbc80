//! The compact binary format: big-endian fixed-width primitives, length
//! prefixed strings and collections, a leading presence byte for optional
//! values, and no field names on the wire. Decode traverses the schema in
//! the order used during encode.

use crate::cfg::Wire;
use crate::err::{Error, Result};
use crate::fmt::{Format, ValueReader, ValueWriter};

/// Marker for the binary wire format.
pub struct Bytes;

impl Format for Bytes {
	type Output = Vec<u8>;
	type Input = [u8];
	type Writer = Writer;
	type Reader<'a> = Reader<'a>;

	fn writer(_wire: &Wire) -> Self::Writer {
		Writer {
			buf: Vec::new(),
		}
	}

	fn finish(writer: Self::Writer) -> Result<Self::Output> {
		Ok(writer.buf)
	}

	fn reader<'a>(_wire: &Wire, input: &'a Self::Input) -> Result<Self::Reader<'a>> {
		Ok(Reader {
			input,
			pos: 0,
			map_remaining: Vec::new(),
		})
	}
}

pub struct Writer {
	buf: Vec<u8>,
}

impl Writer {
	fn write_len(&mut self, len: usize) -> Result<()> {
		let len = u32::try_from(len)
			.map_err(|_| Error::wire(format!("length {len} exceeds the u32 wire limit")))?;
		self.buf.extend_from_slice(&len.to_be_bytes());
		Ok(())
	}
}

impl ValueWriter for Writer {
	fn write_null(&mut self) -> Result<()> {
		self.buf.push(0);
		Ok(())
	}

	fn mark_present(&mut self) -> Result<()> {
		self.buf.push(1);
		Ok(())
	}

	fn write_bool(&mut self, v: bool) -> Result<()> {
		self.buf.push(u8::from(v));
		Ok(())
	}

	fn write_i8(&mut self, v: i8) -> Result<()> {
		self.buf.extend_from_slice(&v.to_be_bytes());
		Ok(())
	}

	fn write_i16(&mut self, v: i16) -> Result<()> {
		self.buf.extend_from_slice(&v.to_be_bytes());
		Ok(())
	}

	fn write_i32(&mut self, v: i32) -> Result<()> {
		self.buf.extend_from_slice(&v.to_be_bytes());
		Ok(())
	}

	fn write_i64(&mut self, v: i64) -> Result<()> {
		self.buf.extend_from_slice(&v.to_be_bytes());
		Ok(())
	}

	fn write_u8(&mut self, v: u8) -> Result<()> {
		self.buf.push(v);
		Ok(())
	}

	fn write_u16(&mut self, v: u16) -> Result<()> {
		self.buf.extend_from_slice(&v.to_be_bytes());
		Ok(())
	}

	fn write_u32(&mut self, v: u32) -> Result<()> {
		self.buf.extend_from_slice(&v.to_be_bytes());
		Ok(())
	}

	fn write_u64(&mut self, v: u64) -> Result<()> {
		self.buf.extend_from_slice(&v.to_be_bytes());
		Ok(())
	}

	fn write_f32(&mut self, v: f32) -> Result<()> {
		self.buf.extend_from_slice(&v.to_be_bytes());
		Ok(())
	}

	fn write_f64(&mut self, v: f64) -> Result<()> {
		self.buf.extend_from_slice(&v.to_be_bytes());
		Ok(())
	}

	fn write_char(&mut self, v: char) -> Result<()> {
		self.buf.extend_from_slice(&(v as u32).to_be_bytes());
		Ok(())
	}

	fn write_str(&mut self, v: &str) -> Result<()> {
		let len = u16::try_from(v.len())
			.map_err(|_| Error::wire(format!("string of {} bytes exceeds the u16 wire limit", v.len())))?;
		self.buf.extend_from_slice(&len.to_be_bytes());
		self.buf.extend_from_slice(v.as_bytes());
		Ok(())
	}

	fn tag_begin(&mut self, name: &str) -> Result<()> {
		self.write_str(name)
	}

	fn tag_end(&mut self) -> Result<()> {
		Ok(())
	}

	fn record_begin(&mut self, _fields: usize) -> Result<()> {
		Ok(())
	}

	fn record_field(&mut self, _name: &str) -> Result<()> {
		Ok(())
	}

	fn record_end(&mut self) -> Result<()> {
		Ok(())
	}

	fn seq_begin(&mut self, len: usize) -> Result<()> {
		self.write_len(len)
	}

	fn seq_elem(&mut self) -> Result<()> {
		Ok(())
	}

	fn seq_end(&mut self) -> Result<()> {
		Ok(())
	}

	fn map_begin(&mut self, len: usize) -> Result<()> {
		self.write_len(len)
	}

	fn map_key(&mut self, key: &str) -> Result<()> {
		self.write_str(key)
	}

	fn map_end(&mut self) -> Result<()> {
		Ok(())
	}

	fn entries_begin(&mut self, len: usize) -> Result<()> {
		self.write_len(len)
	}

	fn entry_begin(&mut self) -> Result<()> {
		Ok(())
	}

	fn entry_key(&mut self) -> Result<()> {
		Ok(())
	}

	fn entry_value(&mut self) -> Result<()> {
		Ok(())
	}

	fn entry_end(&mut self) -> Result<()> {
		Ok(())
	}

	fn entries_end(&mut self) -> Result<()> {
		Ok(())
	}
}

pub struct Reader<'a> {
	input: &'a [u8],
	pos: usize,
	/// Remaining entry counts for in-flight string-keyed maps.
	map_remaining: Vec<usize>,
}

impl<'a> Reader<'a> {
	fn take(&mut self, n: usize) -> Result<&'a [u8]> {
		let end = self
			.pos
			.checked_add(n)
			.filter(|end| *end <= self.input.len())
			.ok_or_else(|| Error::wire("unexpected end of input"))?;
		let bytes = &self.input[self.pos..end];
		self.pos = end;
		Ok(bytes)
	}

	fn read_len(&mut self) -> Result<usize> {
		Ok(self.read_u32()? as usize)
	}
}

macro_rules! read_be {
	($self:ident, $ty:ty) => {{
		let bytes = $self.take(std::mem::size_of::<$ty>())?;
		let mut raw = [0u8; std::mem::size_of::<$ty>()];
		raw.copy_from_slice(bytes);
		Ok(<$ty>::from_be_bytes(raw))
	}};
}

impl ValueReader for Reader<'_> {
	fn read_null(&mut self) -> Result<bool> {
		match self.take(1)?[0] {
			0 => Ok(true),
			1 => Ok(false),
			other => Err(Error::wire(format!("invalid presence marker {other:#04x}"))),
		}
	}

	fn read_bool(&mut self) -> Result<bool> {
		match self.take(1)?[0] {
			0 => Ok(false),
			1 => Ok(true),
			other => Err(Error::wire(format!("invalid boolean byte {other:#04x}"))),
		}
	}

	fn read_i8(&mut self) -> Result<i8> {
		read_be!(self, i8)
	}

	fn read_i16(&mut self) -> Result<i16> {
		read_be!(self, i16)
	}

	fn read_i32(&mut self) -> Result<i32> {
		read_be!(self, i32)
	}

	fn read_i64(&mut self) -> Result<i64> {
		read_be!(self, i64)
	}

	fn read_u8(&mut self) -> Result<u8> {
		Ok(self.take(1)?[0])
	}

	fn read_u16(&mut self) -> Result<u16> {
		read_be!(self, u16)
	}

	fn read_u32(&mut self) -> Result<u32> {
		read_be!(self, u32)
	}

	fn read_u64(&mut self) -> Result<u64> {
		read_be!(self, u64)
	}

	fn read_f32(&mut self) -> Result<f32> {
		read_be!(self, f32)
	}

	fn read_f64(&mut self) -> Result<f64> {
		read_be!(self, f64)
	}

	fn read_char(&mut self) -> Result<char> {
		let raw = self.read_u32()?;
		char::from_u32(raw).ok_or_else(|| Error::wire(format!("invalid character {raw:#010x}")))
	}

	fn read_str(&mut self) -> Result<String> {
		let len = self.read_u16()? as usize;
		let bytes = self.take(len)?;
		String::from_utf8(bytes.to_vec()).map_err(|e| Error::wire(format!("invalid utf-8; {e}")))
	}

	fn tag_read(&mut self) -> Result<String> {
		self.read_str()
	}

	fn tag_end(&mut self) -> Result<()> {
		Ok(())
	}

	fn record_begin(&mut self) -> Result<Option<usize>> {
		Ok(None)
	}

	fn record_select(&mut self, _name: &str) -> Result<bool> {
		Ok(true)
	}

	fn record_end(&mut self) -> Result<()> {
		Ok(())
	}

	fn seq_begin(&mut self) -> Result<usize> {
		self.read_len()
	}

	fn seq_elem(&mut self) -> Result<()> {
		Ok(())
	}

	fn seq_end(&mut self) -> Result<()> {
		Ok(())
	}

	fn map_begin(&mut self) -> Result<usize> {
		let len = self.read_len()?;
		self.map_remaining.push(len);
		Ok(len)
	}

	fn map_next_key(&mut self) -> Result<Option<String>> {
		let remaining = self
			.map_remaining
			.last_mut()
			.ok_or_else(|| Error::wire("map key read outside a map"))?;
		if *remaining == 0 {
			return Ok(None);
		}
		*remaining -= 1;
		Ok(Some(self.read_str()?))
	}

	fn map_end(&mut self) -> Result<()> {
		self.map_remaining.pop();
		Ok(())
	}

	fn entries_begin(&mut self) -> Result<usize> {
		self.read_len()
	}

	fn entry_begin(&mut self) -> Result<()> {
		Ok(())
	}

	fn entry_key(&mut self) -> Result<()> {
		Ok(())
	}

	fn entry_value(&mut self) -> Result<()> {
		Ok(())
	}

	fn entry_end(&mut self) -> Result<()> {
		Ok(())
	}

	fn entries_end(&mut self) -> Result<()> {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn writer() -> Writer {
		Bytes::writer(&Wire::default())
	}

	#[test]
	fn primitives_round_trip() {
		let mut w = writer();
		w.write_bool(true).unwrap();
		w.write_i32(-42).unwrap();
		w.write_u64(7).unwrap();
		w.write_f64(1.5).unwrap();
		w.write_char('é').unwrap();
		w.write_str("hello").unwrap();
		let buf = Bytes::finish(w).unwrap();

		let mut r = Bytes::reader(&Wire::default(), &buf).unwrap();
		assert!(r.read_bool().unwrap());
		assert_eq!(r.read_i32().unwrap(), -42);
		assert_eq!(r.read_u64().unwrap(), 7);
		assert_eq!(r.read_f64().unwrap(), 1.5);
		assert_eq!(r.read_char().unwrap(), 'é');
		assert_eq!(r.read_str().unwrap(), "hello");
	}

	#[test]
	fn strings_are_u16_length_prefixed() {
		let mut w = writer();
		w.write_str("ab").unwrap();
		assert_eq!(Bytes::finish(w).unwrap(), vec![0x00, 0x02, b'a', b'b']);
	}

	#[test]
	fn truncated_input_is_a_wire_error() {
		let mut r = Bytes::reader(&Wire::default(), &[0x00, 0x00][..]).unwrap();
		assert!(matches!(r.read_i32(), Err(Error::WireFormat(_))));
	}

	#[test]
	fn presence_markers() {
		let mut w = writer();
		w.write_null().unwrap();
		w.mark_present().unwrap();
		let buf = Bytes::finish(w).unwrap();
		let mut r = Bytes::reader(&Wire::default(), buf.as_slice()).unwrap();
		assert!(r.read_null().unwrap());
		assert!(!r.read_null().unwrap());
	}
}
