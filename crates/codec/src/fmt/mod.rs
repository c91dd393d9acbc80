//! The per-format primitive layer: each wire format supplies a writer and
//! a reader for atoms, structural markers, and type tags, and the
//! format-generic codec walkers drive them.

use crate::cfg::Wire;
use crate::err::Result;

mod bytes;
mod json;
mod xml;

pub use bytes::Bytes;
pub use json::Json;
pub use xml::Xml;

/// A wire format. The codec core is generic over this capability; JSON,
/// XML, and the binary form implement it independently.
pub trait Format: Send + Sync + 'static {
	/// Buffered output of one encode call.
	type Output;
	/// Borrowed input of one decode call.
	type Input: ?Sized;
	type Writer: ValueWriter;
	type Reader<'a>: ValueReader;

	fn writer(wire: &Wire) -> Self::Writer;
	fn finish(writer: Self::Writer) -> Result<Self::Output>;
	fn reader<'a>(wire: &Wire, input: &'a Self::Input) -> Result<Self::Reader<'a>>;
}

/// Write-side adapter atoms.
///
/// Structural calls arrive strictly nested. Every value write is preceded
/// by the call that names its slot: `record_field`, `seq_elem`, `map_key`,
/// or one of the entry markers.
pub trait ValueWriter {
	fn write_null(&mut self) -> Result<()>;
	/// Marks a present optional value. A leading presence byte in the
	/// binary form; a no-op in the self-describing forms.
	fn mark_present(&mut self) -> Result<()>;

	fn write_bool(&mut self, v: bool) -> Result<()>;
	fn write_i8(&mut self, v: i8) -> Result<()>;
	fn write_i16(&mut self, v: i16) -> Result<()>;
	fn write_i32(&mut self, v: i32) -> Result<()>;
	fn write_i64(&mut self, v: i64) -> Result<()>;
	fn write_u8(&mut self, v: u8) -> Result<()>;
	fn write_u16(&mut self, v: u16) -> Result<()>;
	fn write_u32(&mut self, v: u32) -> Result<()>;
	fn write_u64(&mut self, v: u64) -> Result<()>;
	fn write_f32(&mut self, v: f32) -> Result<()>;
	fn write_f64(&mut self, v: f64) -> Result<()>;
	fn write_char(&mut self, v: char) -> Result<()>;
	fn write_str(&mut self, v: &str) -> Result<()>;

	/// Open a polymorphic value carrying the given type identifier.
	fn tag_begin(&mut self, name: &str) -> Result<()>;
	fn tag_end(&mut self) -> Result<()>;

	fn record_begin(&mut self, fields: usize) -> Result<()>;
	fn record_field(&mut self, name: &str) -> Result<()>;
	fn record_end(&mut self) -> Result<()>;

	fn seq_begin(&mut self, len: usize) -> Result<()>;
	fn seq_elem(&mut self) -> Result<()>;
	fn seq_end(&mut self) -> Result<()>;

	/// String-keyed map fast path: entries become fields keyed by name.
	fn map_begin(&mut self, len: usize) -> Result<()>;
	fn map_key(&mut self, key: &str) -> Result<()>;
	fn map_end(&mut self) -> Result<()>;

	/// General maps: a sequence of two-field key/value entries.
	fn entries_begin(&mut self, len: usize) -> Result<()>;
	fn entry_begin(&mut self) -> Result<()>;
	fn entry_key(&mut self) -> Result<()>;
	fn entry_value(&mut self) -> Result<()>;
	fn entry_end(&mut self) -> Result<()>;
	fn entries_end(&mut self) -> Result<()>;
}

/// Read-side adapter atoms, mirroring [`ValueWriter`].
pub trait ValueReader {
	/// Detect and consume the null marker, if present.
	fn read_null(&mut self) -> Result<bool>;

	fn read_bool(&mut self) -> Result<bool>;
	fn read_i8(&mut self) -> Result<i8>;
	fn read_i16(&mut self) -> Result<i16>;
	fn read_i32(&mut self) -> Result<i32>;
	fn read_i64(&mut self) -> Result<i64>;
	fn read_u8(&mut self) -> Result<u8>;
	fn read_u16(&mut self) -> Result<u16>;
	fn read_u32(&mut self) -> Result<u32>;
	fn read_u64(&mut self) -> Result<u64>;
	fn read_f32(&mut self) -> Result<f32>;
	fn read_f64(&mut self) -> Result<f64>;
	fn read_char(&mut self) -> Result<char>;
	fn read_str(&mut self) -> Result<String>;

	/// Read the type identifier of a polymorphic value and position the
	/// reader at its payload.
	fn tag_read(&mut self) -> Result<String>;
	fn tag_end(&mut self) -> Result<()>;

	/// Returns the observed field count for formats that decode by name,
	/// or `None` for the positional binary form.
	fn record_begin(&mut self) -> Result<Option<usize>>;
	/// Position the reader at the named field. Always succeeds in the
	/// positional form; returns false when the field is absent.
	fn record_select(&mut self, name: &str) -> Result<bool>;
	fn record_end(&mut self) -> Result<()>;

	fn seq_begin(&mut self) -> Result<usize>;
	fn seq_elem(&mut self) -> Result<()>;
	fn seq_end(&mut self) -> Result<()>;

	fn map_begin(&mut self) -> Result<usize>;
	/// The next key of a string-keyed map, positioning the reader at its
	/// value, or `None` when the map is exhausted.
	fn map_next_key(&mut self) -> Result<Option<String>>;
	fn map_end(&mut self) -> Result<()>;

	fn entries_begin(&mut self) -> Result<usize>;
	fn entry_begin(&mut self) -> Result<()>;
	fn entry_key(&mut self) -> Result<()>;
	fn entry_value(&mut self) -> Result<()>;
	fn entry_end(&mut self) -> Result<()>;
	fn entries_end(&mut self) -> Result<()>;
}
