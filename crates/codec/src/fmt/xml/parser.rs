//! A small pull parser for the subset of XML this wire format produces:
//! one declaration line, elements, attributes, character data, comments,
//! and the five predefined entities plus numeric references.

use super::element::Element;
use crate::err::{Error, Result};

pub(crate) fn parse(input: &str) -> Result<Element> {
	let mut parser = Parser {
		input,
		pos: 0,
	};
	parser.skip_whitespace();
	parser.skip_declaration()?;
	parser.skip_misc()?;
	let root = parser.element()?;
	parser.skip_misc()?;
	if parser.pos < parser.input.len() {
		return Err(parser.fail("content after the document element"));
	}
	Ok(root)
}

struct Parser<'a> {
	input: &'a str,
	pos: usize,
}

impl<'a> Parser<'a> {
	fn fail(&self, detail: &str) -> Error {
		Error::wire(format!("{detail} at byte {}", self.pos))
	}

	fn peek(&self) -> Option<u8> {
		self.input.as_bytes().get(self.pos).copied()
	}

	fn bump(&mut self) -> Option<u8> {
		let byte = self.peek()?;
		self.pos += 1;
		Some(byte)
	}

	fn eat(&mut self, prefix: &str) -> bool {
		if self.input[self.pos..].starts_with(prefix) {
			self.pos += prefix.len();
			true
		} else {
			false
		}
	}

	fn expect(&mut self, prefix: &str) -> Result<()> {
		if self.eat(prefix) {
			Ok(())
		} else {
			Err(self.fail(&format!("expected `{prefix}`")))
		}
	}

	fn skip_whitespace(&mut self) {
		while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
			self.pos += 1;
		}
	}

	fn skip_declaration(&mut self) -> Result<()> {
		if self.eat("<?") {
			match self.input[self.pos..].find("?>") {
				Some(idx) => self.pos += idx + 2,
				None => return Err(self.fail("unterminated declaration")),
			}
		}
		Ok(())
	}

	fn skip_misc(&mut self) -> Result<()> {
		loop {
			self.skip_whitespace();
			if self.eat("<!--") {
				match self.input[self.pos..].find("-->") {
					Some(idx) => self.pos += idx + 3,
					None => return Err(self.fail("unterminated comment")),
				}
			} else {
				return Ok(());
			}
		}
	}

	fn name(&mut self) -> Result<String> {
		let start = self.pos;
		while let Some(byte) = self.peek() {
			match byte {
				b' ' | b'\t' | b'\r' | b'\n' | b'>' | b'/' | b'=' => break,
				b'<' => return Err(self.fail("`<` inside a name")),
				_ => self.pos += 1,
			}
		}
		if self.pos == start {
			return Err(self.fail("empty name"));
		}
		Ok(self.input[start..self.pos].to_string())
	}

	fn attribute_value(&mut self) -> Result<String> {
		let quote = match self.bump() {
			Some(q @ (b'"' | b'\'')) => q,
			_ => return Err(self.fail("expected a quoted attribute value")),
		};
		let start = self.pos;
		loop {
			match self.peek() {
				Some(b) if b == quote => {
					let end = self.pos;
					self.pos += 1;
					let raw = &self.input[start..end];
					return decode_entities(raw).map_err(|detail| self.fail(&detail));
				}
				Some(_) => self.pos += 1,
				None => return Err(self.fail("unterminated attribute value")),
			}
		}
	}

	fn element(&mut self) -> Result<Element> {
		self.expect("<")?;
		let mut elem = Element::new(self.name()?);
		loop {
			self.skip_whitespace();
			match self.peek() {
				Some(b'/') => {
					self.pos += 1;
					self.expect(">")?;
					return Ok(elem);
				}
				Some(b'>') => {
					self.pos += 1;
					break;
				}
				Some(_) => {
					let key = self.name()?;
					self.skip_whitespace();
					self.expect("=")?;
					self.skip_whitespace();
					let value = self.attribute_value()?;
					elem.attrs.push((key, value));
				}
				None => return Err(self.fail("unterminated start tag")),
			}
		}
		self.content(&mut elem)?;
		Ok(elem)
	}

	fn content(&mut self, elem: &mut Element) -> Result<()> {
		let mut text = String::new();
		loop {
			if self.eat("</") {
				let name = self.name()?;
				if name != elem.name {
					return Err(self.fail(&format!(
						"mismatched end tag `{name}` for element `{}`",
						elem.name
					)));
				}
				self.skip_whitespace();
				self.expect(">")?;
				break;
			}
			if self.eat("<!--") {
				match self.input[self.pos..].find("-->") {
					Some(idx) => self.pos += idx + 3,
					None => return Err(self.fail("unterminated comment")),
				}
				continue;
			}
			match self.peek() {
				Some(b'<') => elem.children.push(self.element()?),
				Some(_) => {
					let start = self.pos;
					while !matches!(self.peek(), Some(b'<') | None) {
						self.pos += 1;
					}
					let raw = &self.input[start..self.pos];
					text.push_str(&decode_entities(raw).map_err(|detail| self.fail(&detail))?);
				}
				None => return Err(self.fail(&format!("unterminated element `{}`", elem.name))),
			}
		}
		if elem.children.is_empty() {
			elem.text = text;
		} else if !text.trim().is_empty() {
			return Err(self.fail(&format!("mixed content in element `{}`", elem.name)));
		}
		Ok(())
	}
}

fn decode_entities(raw: &str) -> std::result::Result<String, String> {
	if !raw.contains('&') {
		return Ok(raw.to_string());
	}
	let mut out = String::with_capacity(raw.len());
	let mut rest = raw;
	while let Some(idx) = rest.find('&') {
		out.push_str(&rest[..idx]);
		rest = &rest[idx..];
		let end = rest.find(';').ok_or_else(|| "unterminated entity".to_string())?;
		let entity = &rest[1..end];
		match entity {
			"amp" => out.push('&'),
			"lt" => out.push('<'),
			"gt" => out.push('>'),
			"quot" => out.push('"'),
			"apos" => out.push('\''),
			_ => {
				let code = entity
					.strip_prefix("#x")
					.map(|hex| u32::from_str_radix(hex, 16))
					.or_else(|| entity.strip_prefix('#').map(|dec| dec.parse::<u32>()))
					.ok_or_else(|| format!("unknown entity `&{entity};`"))?
					.map_err(|_| format!("invalid character reference `&{entity};`"))?;
				out.push(
					char::from_u32(code)
						.ok_or_else(|| format!("invalid character reference `&{entity};`"))?,
				);
			}
		}
		rest = &rest[end + 1..];
	}
	out.push_str(rest);
	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_nested_elements_and_attributes() {
		let doc = r#"<?xml version="1.0"?><value type="demo.Widget"><name>rivet</name><size>3</size></value>"#;
		let root = parse(doc).unwrap();
		assert_eq!(root.name, "value");
		assert_eq!(root.attr("type"), Some("demo.Widget"));
		assert_eq!(root.children.len(), 2);
		assert_eq!(root.children[0].name, "name");
		assert_eq!(root.children[0].text, "rivet");
	}

	#[test]
	fn decodes_entities() {
		let root = parse("<v>a &amp; b &lt;c&gt; &#x41;</v>").unwrap();
		assert_eq!(root.text, "a & b <c> A");
	}

	#[test]
	fn self_closing_elements_are_empty() {
		let root = parse(r#"<v null="true"/>"#).unwrap();
		assert_eq!(root.attr("null"), Some("true"));
		assert_eq!(root.text, "");
		assert!(root.children.is_empty());
	}

	#[test]
	fn whitespace_between_children_is_ignored() {
		let root = parse("<v>\n\t<a>1</a>\n\t<b>2</b>\n</v>").unwrap();
		assert_eq!(root.children.len(), 2);
	}

	#[test]
	fn mixed_content_is_rejected() {
		assert!(parse("<v>text<a>1</a></v>").is_err());
	}

	#[test]
	fn mismatched_tags_are_rejected() {
		assert!(parse("<a><b></a></b>").is_err());
	}

	#[test]
	fn escapes_round_trip_through_serialization() {
		let mut elem = Element::new("v");
		elem.text = "a & b <c>".to_string();
		let mut out = String::new();
		elem.write_into(&mut out);
		assert_eq!(out, "<v>a &amp; b &lt;c&gt;</v>");
		assert_eq!(parse(&out).unwrap(), elem);
	}
}
