/// One XML element: a name, its attributes, and either text content or
/// child elements. Mixed content has no meaning on this wire and is
/// rejected by the parser.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Element {
	pub name: String,
	pub attrs: Vec<(String, String)>,
	pub children: Vec<Element>,
	pub text: String,
}

impl Element {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Self::default()
		}
	}

	/// Remove and return the named attribute.
	pub fn take_attr(&mut self, name: &str) -> Option<String> {
		let idx = self.attrs.iter().position(|(k, _)| k == name)?;
		Some(self.attrs.remove(idx).1)
	}

	pub fn attr(&self, name: &str) -> Option<&str> {
		self.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
	}

	/// Serialize this element and its subtree.
	pub fn write_into(&self, out: &mut String) {
		out.push('<');
		out.push_str(&self.name);
		for (key, value) in &self.attrs {
			out.push(' ');
			out.push_str(key);
			out.push_str("=\"");
			escape_attr(value, out);
			out.push('"');
		}
		if self.children.is_empty() && self.text.is_empty() {
			out.push_str("/>");
			return;
		}
		out.push('>');
		if self.children.is_empty() {
			escape_text(&self.text, out);
		} else {
			for child in &self.children {
				child.write_into(out);
			}
		}
		out.push_str("</");
		out.push_str(&self.name);
		out.push('>');
	}
}

pub(crate) fn escape_text(value: &str, out: &mut String) {
	for ch in value.chars() {
		match ch {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			_ => out.push(ch),
		}
	}
}

pub(crate) fn escape_attr(value: &str, out: &mut String) {
	for ch in value.chars() {
		match ch {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			_ => out.push(ch),
		}
	}
}
