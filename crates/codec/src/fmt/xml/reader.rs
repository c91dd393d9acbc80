use super::element::Element;
use crate::cfg::Wire;
use crate::err::{Error, Result};
use crate::fmt::ValueReader;

/// Walks a parsed element tree, consuming elements as they are read.
/// Fields are looked up by child-element name; sequences iterate children
/// in document order.
pub struct Reader {
	wire: Wire,
	slot: Option<Element>,
	stack: Vec<Frame>,
}

enum Frame {
	Rec(Vec<Element>),
	Seq(std::vec::IntoIter<Element>),
	MapKeys(std::vec::IntoIter<Element>),
	Entries(std::vec::IntoIter<Element>),
	Entry(Vec<Element>),
}

impl Reader {
	pub(crate) fn new(wire: Wire, root: Element) -> Self {
		Self {
			wire,
			slot: Some(root),
			stack: Vec::new(),
		}
	}

	fn take_slot(&mut self) -> Result<Element> {
		self.slot.take().ok_or_else(|| Error::wire("no element at the reader position"))
	}

	fn take_leaf(&mut self) -> Result<Element> {
		let elem = self.take_slot()?;
		if !elem.children.is_empty() {
			return Err(Error::wire(format!("element `{}` is not a leaf", elem.name)));
		}
		Ok(elem)
	}

	fn parse_text<T: std::str::FromStr>(&mut self, what: &str) -> Result<T> {
		let elem = self.take_leaf()?;
		elem.text.parse().map_err(|_| {
			Error::wire(format!("element `{}` does not hold {what}: {:?}", elem.name, elem.text))
		})
	}

	fn take_children(&mut self) -> Result<Vec<Element>> {
		Ok(self.take_slot()?.children)
	}

	fn select(children: &mut Vec<Element>, name: &str) -> Option<Element> {
		let idx = children.iter().position(|c| c.name == name)?;
		Some(children.remove(idx))
	}
}

impl ValueReader for Reader {
	fn read_null(&mut self) -> Result<bool> {
		let elem =
			self.slot.as_mut().ok_or_else(|| Error::wire("no element at the reader position"))?;
		if elem.attr(&self.wire.null_attr) == Some(self.wire.null_value.as_str()) {
			self.slot = None;
			Ok(true)
		} else {
			Ok(false)
		}
	}

	fn read_bool(&mut self) -> Result<bool> {
		self.parse_text("a boolean")
	}

	fn read_i8(&mut self) -> Result<i8> {
		self.parse_text("an i8")
	}

	fn read_i16(&mut self) -> Result<i16> {
		self.parse_text("an i16")
	}

	fn read_i32(&mut self) -> Result<i32> {
		self.parse_text("an i32")
	}

	fn read_i64(&mut self) -> Result<i64> {
		self.parse_text("an i64")
	}

	fn read_u8(&mut self) -> Result<u8> {
		self.parse_text("a u8")
	}

	fn read_u16(&mut self) -> Result<u16> {
		self.parse_text("a u16")
	}

	fn read_u32(&mut self) -> Result<u32> {
		self.parse_text("a u32")
	}

	fn read_u64(&mut self) -> Result<u64> {
		self.parse_text("a u64")
	}

	fn read_f32(&mut self) -> Result<f32> {
		self.parse_text("an f32")
	}

	fn read_f64(&mut self) -> Result<f64> {
		self.parse_text("an f64")
	}

	fn read_char(&mut self) -> Result<char> {
		self.parse_text("a character")
	}

	fn read_str(&mut self) -> Result<String> {
		Ok(self.take_leaf()?.text)
	}

	fn tag_read(&mut self) -> Result<String> {
		let elem =
			self.slot.as_mut().ok_or_else(|| Error::wire("no element at the reader position"))?;
		elem.take_attr(&self.wire.type_attr).ok_or_else(|| {
			Error::wire(format!("missing `{}` attribute on `{}`", self.wire.type_attr, elem.name))
		})
	}

	fn tag_end(&mut self) -> Result<()> {
		Ok(())
	}

	fn record_begin(&mut self) -> Result<Option<usize>> {
		let children = self.take_children()?;
		let len = children.len();
		self.stack.push(Frame::Rec(children));
		Ok(Some(len))
	}

	fn record_select(&mut self, name: &str) -> Result<bool> {
		match self.stack.last_mut() {
			Some(Frame::Rec(children)) => match Self::select(children, name) {
				Some(child) => {
					self.slot = Some(child);
					Ok(true)
				}
				None => Ok(false),
			},
			_ => Err(Error::wire("field read outside a record element")),
		}
	}

	fn record_end(&mut self) -> Result<()> {
		match self.stack.pop() {
			Some(Frame::Rec(_)) => Ok(()),
			_ => Err(Error::wire("unbalanced record reader state")),
		}
	}

	fn seq_begin(&mut self) -> Result<usize> {
		let children = self.take_children()?;
		let len = children.len();
		self.stack.push(Frame::Seq(children.into_iter()));
		Ok(len)
	}

	fn seq_elem(&mut self) -> Result<()> {
		match self.stack.last_mut() {
			Some(Frame::Seq(iter)) => {
				self.slot = Some(iter.next().ok_or_else(|| Error::wire("sequence exhausted"))?);
				Ok(())
			}
			_ => Err(Error::wire("element read outside a sequence")),
		}
	}

	fn seq_end(&mut self) -> Result<()> {
		match self.stack.pop() {
			Some(Frame::Seq(_)) => Ok(()),
			_ => Err(Error::wire("unbalanced sequence reader state")),
		}
	}

	fn map_begin(&mut self) -> Result<usize> {
		let children = self.take_children()?;
		let len = children.len();
		self.stack.push(Frame::MapKeys(children.into_iter()));
		Ok(len)
	}

	fn map_next_key(&mut self) -> Result<Option<String>> {
		match self.stack.last_mut() {
			Some(Frame::MapKeys(iter)) => match iter.next() {
				Some(child) => {
					let key = child.name.clone();
					self.slot = Some(child);
					Ok(Some(key))
				}
				None => Ok(None),
			},
			_ => Err(Error::wire("map key read outside a map")),
		}
	}

	fn map_end(&mut self) -> Result<()> {
		match self.stack.pop() {
			Some(Frame::MapKeys(_)) => Ok(()),
			_ => Err(Error::wire("unbalanced map reader state")),
		}
	}

	fn entries_begin(&mut self) -> Result<usize> {
		let children = self.take_children()?;
		let len = children.len();
		self.stack.push(Frame::Entries(children.into_iter()));
		Ok(len)
	}

	fn entry_begin(&mut self) -> Result<()> {
		let entry = match self.stack.last_mut() {
			Some(Frame::Entries(iter)) => {
				iter.next().ok_or_else(|| Error::wire("entry list exhausted"))?
			}
			_ => return Err(Error::wire("entry read outside an entry list")),
		};
		self.stack.push(Frame::Entry(entry.children));
		Ok(())
	}

	fn entry_key(&mut self) -> Result<()> {
		let key_elem = self.wire.key_elem.clone();
		match self.stack.last_mut() {
			Some(Frame::Entry(children)) => {
				self.slot = Some(Self::select(children, &key_elem).ok_or_else(|| {
					Error::wire(format!("missing `{key_elem}` element in a map entry"))
				})?);
				Ok(())
			}
			_ => Err(Error::wire("entry key read outside an entry")),
		}
	}

	fn entry_value(&mut self) -> Result<()> {
		let value_elem = self.wire.value_elem.clone();
		match self.stack.last_mut() {
			Some(Frame::Entry(children)) => {
				self.slot = Some(Self::select(children, &value_elem).ok_or_else(|| {
					Error::wire(format!("missing `{value_elem}` element in a map entry"))
				})?);
				Ok(())
			}
			_ => Err(Error::wire("entry value read outside an entry")),
		}
	}

	fn entry_end(&mut self) -> Result<()> {
		match self.stack.pop() {
			Some(Frame::Entry(_)) => Ok(()),
			_ => Err(Error::wire("unbalanced entry reader state")),
		}
	}

	fn entries_end(&mut self) -> Result<()> {
		match self.stack.pop() {
			Some(Frame::Entries(_)) => Ok(()),
			_ => Err(Error::wire("unbalanced entry list reader state")),
		}
	}
}
