use std::mem;

use super::element::Element;
use crate::cfg::Wire;
use crate::err::{Error, Result};
use crate::fmt::ValueWriter;

/// Builds the element tree for one encode call. Each value lands in an
/// element named by the preceding structural call; the root element name
/// comes from the configuration.
pub struct Writer {
	wire: Wire,
	stack: Vec<Frame>,
	pending_name: String,
	pending_attrs: Vec<(String, String)>,
	root: Option<Element>,
}

struct Frame {
	elem: Element,
	next_index: usize,
}

impl Writer {
	pub(crate) fn new(wire: Wire) -> Self {
		let pending_name = wire.root_elem.clone();
		Self {
			wire,
			stack: Vec::new(),
			pending_name,
			pending_attrs: Vec::new(),
			root: None,
		}
	}

	pub(crate) fn finish(self) -> Result<String> {
		let root = self.root.ok_or_else(|| Error::wire("no value was produced"))?;
		let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
		root.write_into(&mut out);
		Ok(out)
	}

	fn open(&mut self) -> Element {
		let mut elem = Element::new(mem::take(&mut self.pending_name));
		elem.attrs = mem::take(&mut self.pending_attrs);
		elem
	}

	fn attach(&mut self, elem: Element) -> Result<()> {
		match self.stack.last_mut() {
			Some(frame) => {
				frame.elem.children.push(elem);
				Ok(())
			}
			None if self.root.is_none() => {
				self.root = Some(elem);
				Ok(())
			}
			None => Err(Error::wire("more than one root element")),
		}
	}

	fn leaf(&mut self, text: String) -> Result<()> {
		let mut elem = self.open();
		elem.text = text;
		self.attach(elem)
	}

	fn push_frame(&mut self) {
		let elem = self.open();
		self.stack.push(Frame {
			elem,
			next_index: 0,
		});
	}

	fn pop_frame(&mut self) -> Result<()> {
		match self.stack.pop() {
			Some(frame) => self.attach(frame.elem),
			None => Err(Error::wire("unbalanced element writer state")),
		}
	}
}

impl ValueWriter for Writer {
	fn write_null(&mut self) -> Result<()> {
		let attr = (self.wire.null_attr.clone(), self.wire.null_value.clone());
		self.pending_attrs.push(attr);
		self.leaf(String::new())
	}

	fn mark_present(&mut self) -> Result<()> {
		Ok(())
	}

	fn write_bool(&mut self, v: bool) -> Result<()> {
		self.leaf(v.to_string())
	}

	fn write_i8(&mut self, v: i8) -> Result<()> {
		self.leaf(v.to_string())
	}

	fn write_i16(&mut self, v: i16) -> Result<()> {
		self.leaf(v.to_string())
	}

	fn write_i32(&mut self, v: i32) -> Result<()> {
		self.leaf(v.to_string())
	}

	fn write_i64(&mut self, v: i64) -> Result<()> {
		self.leaf(v.to_string())
	}

	fn write_u8(&mut self, v: u8) -> Result<()> {
		self.leaf(v.to_string())
	}

	fn write_u16(&mut self, v: u16) -> Result<()> {
		self.leaf(v.to_string())
	}

	fn write_u32(&mut self, v: u32) -> Result<()> {
		self.leaf(v.to_string())
	}

	fn write_u64(&mut self, v: u64) -> Result<()> {
		self.leaf(v.to_string())
	}

	fn write_f32(&mut self, v: f32) -> Result<()> {
		self.leaf(v.to_string())
	}

	fn write_f64(&mut self, v: f64) -> Result<()> {
		self.leaf(v.to_string())
	}

	fn write_char(&mut self, v: char) -> Result<()> {
		self.leaf(v.to_string())
	}

	fn write_str(&mut self, v: &str) -> Result<()> {
		self.leaf(v.to_string())
	}

	fn tag_begin(&mut self, name: &str) -> Result<()> {
		self.pending_attrs.push((self.wire.type_attr.clone(), name.to_string()));
		Ok(())
	}

	fn tag_end(&mut self) -> Result<()> {
		Ok(())
	}

	fn record_begin(&mut self, _fields: usize) -> Result<()> {
		self.push_frame();
		Ok(())
	}

	fn record_field(&mut self, name: &str) -> Result<()> {
		self.pending_name = name.to_string();
		Ok(())
	}

	fn record_end(&mut self) -> Result<()> {
		self.pop_frame()
	}

	fn seq_begin(&mut self, _len: usize) -> Result<()> {
		self.push_frame();
		Ok(())
	}

	fn seq_elem(&mut self) -> Result<()> {
		match self.stack.last_mut() {
			Some(frame) => {
				self.pending_name = format!("_{}", frame.next_index);
				frame.next_index += 1;
				Ok(())
			}
			None => Err(Error::wire("element written outside a sequence")),
		}
	}

	fn seq_end(&mut self) -> Result<()> {
		self.pop_frame()
	}

	fn map_begin(&mut self, _len: usize) -> Result<()> {
		self.push_frame();
		Ok(())
	}

	fn map_key(&mut self, key: &str) -> Result<()> {
		self.pending_name = key.to_string();
		Ok(())
	}

	fn map_end(&mut self) -> Result<()> {
		self.pop_frame()
	}

	fn entries_begin(&mut self, _len: usize) -> Result<()> {
		self.push_frame();
		Ok(())
	}

	fn entry_begin(&mut self) -> Result<()> {
		self.pending_name = self.wire.entry_elem.clone();
		self.push_frame();
		Ok(())
	}

	fn entry_key(&mut self) -> Result<()> {
		self.pending_name = self.wire.key_elem.clone();
		Ok(())
	}

	fn entry_value(&mut self) -> Result<()> {
		self.pending_name = self.wire.value_elem.clone();
		Ok(())
	}

	fn entry_end(&mut self) -> Result<()> {
		self.pop_frame()
	}

	fn entries_end(&mut self) -> Result<()> {
		self.pop_frame()
	}
}
