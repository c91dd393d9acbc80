//! The self-describing JSON format, layered over a `serde_json` value
//! tree. Encoding builds the tree bottom-up; decoding consumes it, so
//! fields are looked up by name and removed as they are read.
//!
//! Polymorphic values wrap as `{"@type": id, "@value": payload}` and maps
//! with non-string keys become arrays of `{"@key": k, "@value": v}`
//! objects. Both member names follow the configuration.

use serde_json::map::Map;
use serde_json::{Number, Value};

use crate::cfg::Wire;
use crate::err::{Error, Result};
use crate::fmt::{Format, ValueReader, ValueWriter};

/// Marker for the JSON wire format.
pub struct Json;

impl Format for Json {
	type Output = String;
	type Input = str;
	type Writer = Writer;
	type Reader<'a> = Reader;

	fn writer(wire: &Wire) -> Self::Writer {
		Writer {
			type_key: wire.type_key.clone(),
			value_key: wire.value_key.clone(),
			key_key: wire.key_key.clone(),
			stack: Vec::new(),
			root: None,
		}
	}

	fn finish(writer: Self::Writer) -> Result<Self::Output> {
		let root = writer.root.ok_or_else(|| Error::wire("no value was produced"))?;
		serde_json::to_string(&root).map_err(|e| Error::wire(e.to_string()))
	}

	fn reader<'a>(wire: &Wire, input: &'a Self::Input) -> Result<Self::Reader<'a>> {
		let doc: Value = serde_json::from_str(input).map_err(|e| Error::wire(e.to_string()))?;
		Ok(Reader {
			type_key: wire.type_key.clone(),
			value_key: wire.value_key.clone(),
			key_key: wire.key_key.clone(),
			slot: Some(doc),
			stack: Vec::new(),
		})
	}
}

fn kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}

enum WFrame {
	Obj {
		map: Map<String, Value>,
		pending: Option<String>,
	},
	Arr(Vec<Value>),
}

pub struct Writer {
	type_key: String,
	value_key: String,
	key_key: String,
	stack: Vec<WFrame>,
	root: Option<Value>,
}

impl Writer {
	fn push_value(&mut self, value: Value) -> Result<()> {
		match self.stack.last_mut() {
			None => {
				if self.root.is_some() {
					return Err(Error::wire("more than one root value"));
				}
				self.root = Some(value);
				Ok(())
			}
			Some(WFrame::Obj {
				map,
				pending,
			}) => {
				let key = pending
					.take()
					.ok_or_else(|| Error::wire("value written without a field name"))?;
				map.insert(key, value);
				Ok(())
			}
			Some(WFrame::Arr(items)) => {
				items.push(value);
				Ok(())
			}
		}
	}

	fn open_object(&mut self) {
		self.stack.push(WFrame::Obj {
			map: Map::new(),
			pending: None,
		});
	}

	fn set_pending(&mut self, key: String) -> Result<()> {
		match self.stack.last_mut() {
			Some(WFrame::Obj {
				pending,
				..
			}) => {
				*pending = Some(key);
				Ok(())
			}
			_ => Err(Error::wire("field name written outside an object")),
		}
	}

	fn close_object(&mut self) -> Result<()> {
		match self.stack.pop() {
			Some(WFrame::Obj {
				map,
				..
			}) => self.push_value(Value::Object(map)),
			_ => Err(Error::wire("unbalanced object writer state")),
		}
	}

	fn close_array(&mut self) -> Result<()> {
		match self.stack.pop() {
			Some(WFrame::Arr(items)) => self.push_value(Value::Array(items)),
			_ => Err(Error::wire("unbalanced array writer state")),
		}
	}

	fn push_f64(&mut self, v: f64) -> Result<()> {
		let number =
			Number::from_f64(v).ok_or_else(|| Error::wire("non-finite numbers have no JSON form"))?;
		self.push_value(Value::Number(number))
	}
}

impl ValueWriter for Writer {
	fn write_null(&mut self) -> Result<()> {
		self.push_value(Value::Null)
	}

	fn mark_present(&mut self) -> Result<()> {
		Ok(())
	}

	fn write_bool(&mut self, v: bool) -> Result<()> {
		self.push_value(Value::Bool(v))
	}

	fn write_i8(&mut self, v: i8) -> Result<()> {
		self.push_value(Value::from(v))
	}

	fn write_i16(&mut self, v: i16) -> Result<()> {
		self.push_value(Value::from(v))
	}

	fn write_i32(&mut self, v: i32) -> Result<()> {
		self.push_value(Value::from(v))
	}

	fn write_i64(&mut self, v: i64) -> Result<()> {
		self.push_value(Value::from(v))
	}

	fn write_u8(&mut self, v: u8) -> Result<()> {
		self.push_value(Value::from(v))
	}

	fn write_u16(&mut self, v: u16) -> Result<()> {
		self.push_value(Value::from(v))
	}

	fn write_u32(&mut self, v: u32) -> Result<()> {
		self.push_value(Value::from(v))
	}

	fn write_u64(&mut self, v: u64) -> Result<()> {
		self.push_value(Value::from(v))
	}

	fn write_f32(&mut self, v: f32) -> Result<()> {
		self.push_f64(f64::from(v))
	}

	fn write_f64(&mut self, v: f64) -> Result<()> {
		self.push_f64(v)
	}

	fn write_char(&mut self, v: char) -> Result<()> {
		self.push_value(Value::String(v.to_string()))
	}

	fn write_str(&mut self, v: &str) -> Result<()> {
		self.push_value(Value::String(v.to_string()))
	}

	fn tag_begin(&mut self, name: &str) -> Result<()> {
		self.open_object();
		let type_key = self.type_key.clone();
		if let Some(WFrame::Obj {
			map,
			..
		}) = self.stack.last_mut()
		{
			map.insert(type_key, Value::String(name.to_string()));
		}
		let value_key = self.value_key.clone();
		self.set_pending(value_key)
	}

	fn tag_end(&mut self) -> Result<()> {
		self.close_object()
	}

	fn record_begin(&mut self, _fields: usize) -> Result<()> {
		self.open_object();
		Ok(())
	}

	fn record_field(&mut self, name: &str) -> Result<()> {
		self.set_pending(name.to_string())
	}

	fn record_end(&mut self) -> Result<()> {
		self.close_object()
	}

	fn seq_begin(&mut self, len: usize) -> Result<()> {
		self.stack.push(WFrame::Arr(Vec::with_capacity(len)));
		Ok(())
	}

	fn seq_elem(&mut self) -> Result<()> {
		Ok(())
	}

	fn seq_end(&mut self) -> Result<()> {
		self.close_array()
	}

	fn map_begin(&mut self, _len: usize) -> Result<()> {
		self.open_object();
		Ok(())
	}

	fn map_key(&mut self, key: &str) -> Result<()> {
		self.set_pending(key.to_string())
	}

	fn map_end(&mut self) -> Result<()> {
		self.close_object()
	}

	fn entries_begin(&mut self, len: usize) -> Result<()> {
		self.stack.push(WFrame::Arr(Vec::with_capacity(len)));
		Ok(())
	}

	fn entry_begin(&mut self) -> Result<()> {
		self.open_object();
		Ok(())
	}

	fn entry_key(&mut self) -> Result<()> {
		let key = self.key_key.clone();
		self.set_pending(key)
	}

	fn entry_value(&mut self) -> Result<()> {
		let key = self.value_key.clone();
		self.set_pending(key)
	}

	fn entry_end(&mut self) -> Result<()> {
		self.close_object()
	}

	fn entries_end(&mut self) -> Result<()> {
		self.close_array()
	}
}

enum RFrame {
	Rec(Map<String, Value>),
	Seq(std::vec::IntoIter<Value>),
	MapKeys(serde_json::map::IntoIter),
	Entries(std::vec::IntoIter<Value>),
	Entry(Map<String, Value>),
}

pub struct Reader {
	type_key: String,
	value_key: String,
	key_key: String,
	slot: Option<Value>,
	stack: Vec<RFrame>,
}

impl Reader {
	fn take_slot(&mut self) -> Result<Value> {
		self.slot.take().ok_or_else(|| Error::wire("no value at the reader position"))
	}

	fn take_object(&mut self) -> Result<Map<String, Value>> {
		match self.take_slot()? {
			Value::Object(map) => Ok(map),
			other => Err(Error::wire(format!("expected an object, found {}", kind(&other)))),
		}
	}

	fn take_array(&mut self) -> Result<Vec<Value>> {
		match self.take_slot()? {
			Value::Array(items) => Ok(items),
			other => Err(Error::wire(format!("expected an array, found {}", kind(&other)))),
		}
	}

	fn take_i64(&mut self) -> Result<i64> {
		let value = self.take_slot()?;
		value
			.as_i64()
			.ok_or_else(|| Error::wire(format!("expected an integer, found {}", kind(&value))))
	}

	fn take_u64(&mut self) -> Result<u64> {
		let value = self.take_slot()?;
		value
			.as_u64()
			.ok_or_else(|| Error::wire(format!("expected an unsigned integer, found {}", kind(&value))))
	}
}

impl ValueReader for Reader {
	fn read_null(&mut self) -> Result<bool> {
		match &self.slot {
			Some(Value::Null) => {
				self.slot = None;
				Ok(true)
			}
			Some(_) => Ok(false),
			None => Err(Error::wire("no value at the reader position")),
		}
	}

	fn read_bool(&mut self) -> Result<bool> {
		let value = self.take_slot()?;
		value
			.as_bool()
			.ok_or_else(|| Error::wire(format!("expected a boolean, found {}", kind(&value))))
	}

	fn read_i8(&mut self) -> Result<i8> {
		let v = self.take_i64()?;
		i8::try_from(v).map_err(|_| Error::wire(format!("{v} is out of range for i8")))
	}

	fn read_i16(&mut self) -> Result<i16> {
		let v = self.take_i64()?;
		i16::try_from(v).map_err(|_| Error::wire(format!("{v} is out of range for i16")))
	}

	fn read_i32(&mut self) -> Result<i32> {
		let v = self.take_i64()?;
		i32::try_from(v).map_err(|_| Error::wire(format!("{v} is out of range for i32")))
	}

	fn read_i64(&mut self) -> Result<i64> {
		self.take_i64()
	}

	fn read_u8(&mut self) -> Result<u8> {
		let v = self.take_u64()?;
		u8::try_from(v).map_err(|_| Error::wire(format!("{v} is out of range for u8")))
	}

	fn read_u16(&mut self) -> Result<u16> {
		let v = self.take_u64()?;
		u16::try_from(v).map_err(|_| Error::wire(format!("{v} is out of range for u16")))
	}

	fn read_u32(&mut self) -> Result<u32> {
		let v = self.take_u64()?;
		u32::try_from(v).map_err(|_| Error::wire(format!("{v} is out of range for u32")))
	}

	fn read_u64(&mut self) -> Result<u64> {
		self.take_u64()
	}

	fn read_f32(&mut self) -> Result<f32> {
		Ok(self.read_f64()? as f32)
	}

	fn read_f64(&mut self) -> Result<f64> {
		let value = self.take_slot()?;
		value
			.as_f64()
			.ok_or_else(|| Error::wire(format!("expected a number, found {}", kind(&value))))
	}

	fn read_char(&mut self) -> Result<char> {
		let text = self.read_str()?;
		let mut chars = text.chars();
		match (chars.next(), chars.next()) {
			(Some(c), None) => Ok(c),
			_ => Err(Error::wire(format!("expected a single character, found {text:?}"))),
		}
	}

	fn read_str(&mut self) -> Result<String> {
		match self.take_slot()? {
			Value::String(s) => Ok(s),
			other => Err(Error::wire(format!("expected a string, found {}", kind(&other)))),
		}
	}

	fn tag_read(&mut self) -> Result<String> {
		let mut map = self.take_object()?;
		let tag = match map.remove(&self.type_key) {
			Some(Value::String(tag)) => tag,
			Some(other) => {
				return Err(Error::wire(format!("expected a type tag, found {}", kind(&other))));
			}
			None => return Err(Error::wire(format!("missing `{}` member", self.type_key))),
		};
		let payload = map
			.remove(&self.value_key)
			.ok_or_else(|| Error::wire(format!("missing `{}` member", self.value_key)))?;
		self.slot = Some(payload);
		Ok(tag)
	}

	fn tag_end(&mut self) -> Result<()> {
		Ok(())
	}

	fn record_begin(&mut self) -> Result<Option<usize>> {
		let map = self.take_object()?;
		let len = map.len();
		self.stack.push(RFrame::Rec(map));
		Ok(Some(len))
	}

	fn record_select(&mut self, name: &str) -> Result<bool> {
		match self.stack.last_mut() {
			Some(RFrame::Rec(map)) => match map.remove(name) {
				Some(value) => {
					self.slot = Some(value);
					Ok(true)
				}
				None => Ok(false),
			},
			_ => Err(Error::wire("field read outside an object")),
		}
	}

	fn record_end(&mut self) -> Result<()> {
		match self.stack.pop() {
			Some(RFrame::Rec(_)) => Ok(()),
			_ => Err(Error::wire("unbalanced object reader state")),
		}
	}

	fn seq_begin(&mut self) -> Result<usize> {
		let items = self.take_array()?;
		let len = items.len();
		self.stack.push(RFrame::Seq(items.into_iter()));
		Ok(len)
	}

	fn seq_elem(&mut self) -> Result<()> {
		match self.stack.last_mut() {
			Some(RFrame::Seq(iter)) => {
				self.slot = Some(iter.next().ok_or_else(|| Error::wire("array exhausted"))?);
				Ok(())
			}
			_ => Err(Error::wire("element read outside an array")),
		}
	}

	fn seq_end(&mut self) -> Result<()> {
		match self.stack.pop() {
			Some(RFrame::Seq(_)) => Ok(()),
			_ => Err(Error::wire("unbalanced array reader state")),
		}
	}

	fn map_begin(&mut self) -> Result<usize> {
		let map = self.take_object()?;
		let len = map.len();
		self.stack.push(RFrame::MapKeys(map.into_iter()));
		Ok(len)
	}

	fn map_next_key(&mut self) -> Result<Option<String>> {
		match self.stack.last_mut() {
			Some(RFrame::MapKeys(iter)) => match iter.next() {
				Some((key, value)) => {
					self.slot = Some(value);
					Ok(Some(key))
				}
				None => Ok(None),
			},
			_ => Err(Error::wire("map key read outside a map")),
		}
	}

	fn map_end(&mut self) -> Result<()> {
		match self.stack.pop() {
			Some(RFrame::MapKeys(_)) => Ok(()),
			_ => Err(Error::wire("unbalanced map reader state")),
		}
	}

	fn entries_begin(&mut self) -> Result<usize> {
		let items = self.take_array()?;
		let len = items.len();
		self.stack.push(RFrame::Entries(items.into_iter()));
		Ok(len)
	}

	fn entry_begin(&mut self) -> Result<()> {
		let entry = match self.stack.last_mut() {
			Some(RFrame::Entries(iter)) => {
				iter.next().ok_or_else(|| Error::wire("entry list exhausted"))?
			}
			_ => return Err(Error::wire("entry read outside an entry list")),
		};
		match entry {
			Value::Object(map) => {
				self.stack.push(RFrame::Entry(map));
				Ok(())
			}
			other => Err(Error::wire(format!("expected an entry object, found {}", kind(&other)))),
		}
	}

	fn entry_key(&mut self) -> Result<()> {
		match self.stack.last_mut() {
			Some(RFrame::Entry(map)) => {
				self.slot = Some(
					map.remove(&self.key_key)
						.ok_or_else(|| Error::wire(format!("missing `{}` member", self.key_key)))?,
				);
				Ok(())
			}
			_ => Err(Error::wire("entry key read outside an entry")),
		}
	}

	fn entry_value(&mut self) -> Result<()> {
		match self.stack.last_mut() {
			Some(RFrame::Entry(map)) => {
				self.slot = Some(
					map.remove(&self.value_key)
						.ok_or_else(|| Error::wire(format!("missing `{}` member", self.value_key)))?,
				);
				Ok(())
			}
			_ => Err(Error::wire("entry value read outside an entry")),
		}
	}

	fn entry_end(&mut self) -> Result<()> {
		match self.stack.pop() {
			Some(RFrame::Entry(_)) => Ok(()),
			_ => Err(Error::wire("unbalanced entry reader state")),
		}
	}

	fn entries_end(&mut self) -> Result<()> {
		match self.stack.pop() {
			Some(RFrame::Entries(_)) => Ok(()),
			_ => Err(Error::wire("unbalanced entry list reader state")),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn objects_keep_member_order() {
		let wire = Wire::default();
		let mut w = Json::writer(&wire);
		w.record_begin(2).unwrap();
		w.record_field("zebra").unwrap();
		w.write_i32(1).unwrap();
		w.record_field("apple").unwrap();
		w.write_i32(2).unwrap();
		w.record_end().unwrap();
		assert_eq!(Json::finish(w).unwrap(), r#"{"zebra":1,"apple":2}"#);
	}

	#[test]
	fn tagged_values_wrap_with_configured_members() {
		let wire = Wire::default();
		let mut w = Json::writer(&wire);
		w.tag_begin("String").unwrap();
		w.write_str("hello").unwrap();
		w.tag_end().unwrap();
		assert_eq!(Json::finish(w).unwrap(), r#"{"@type":"String","@value":"hello"}"#);

		let mut r = Json::reader(&wire, r#"{"@type":"String","@value":"hello"}"#).unwrap();
		assert_eq!(r.tag_read().unwrap(), "String");
		assert_eq!(r.read_str().unwrap(), "hello");
	}

	#[test]
	fn malformed_input_is_a_wire_error() {
		assert!(matches!(Json::reader(&Wire::default(), "{"), Err(Error::WireFormat(_))));
	}

	#[test]
	fn out_of_range_numbers_are_rejected() {
		let mut r = Json::reader(&Wire::default(), "300").unwrap();
		assert!(matches!(r.read_i8(), Err(Error::WireFormat(_))));
	}
}
