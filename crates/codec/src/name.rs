use std::fmt::{self, Display, Formatter};

use crate::err::{Error, Result};

/// Canonical textual identifier for an encodable type.
///
/// Plain types use a dotted package-qualified spelling (`demo.Widget`,
/// `chrono.NaiveDate`); primitives and `String` use their bare names.
/// Generic families compose structurally, as in `Vec<i32>` or
/// `Map<String,demo.Widget>`, and parse back into a family plus an
/// argument list.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(String);

impl TypeName {
	pub fn new(name: impl Into<String>) -> Self {
		Self(name.into())
	}

	/// Compose a generic name from a family and its argument names.
	pub fn compose(family: &str, args: &[TypeName]) -> Self {
		if args.is_empty() {
			return Self(family.to_string());
		}
		let mut out = String::with_capacity(family.len() + 2 + args.len() * 8);
		out.push_str(family);
		out.push('<');
		for (i, arg) in args.iter().enumerate() {
			if i > 0 {
				out.push(',');
			}
			out.push_str(arg.as_str());
		}
		out.push('>');
		Self(out)
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// The family part of the name, up to the first `<`.
	pub fn family(&self) -> &str {
		match self.0.find('<') {
			Some(idx) => &self.0[..idx],
			None => &self.0,
		}
	}

	/// The dotted package prefix of the family, if any.
	pub fn package(&self) -> Option<&str> {
		let family = self.family();
		family.rfind('.').map(|idx| &family[..idx])
	}

	/// True when the name is a bare number, as in the length argument of
	/// `Array<i32,3>`.
	pub fn is_numeric(&self) -> bool {
		!self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit())
	}

	/// Split the generic argument names out of a composed name.
	///
	/// Returns an empty list for plain names. Fails on unbalanced angle
	/// brackets, which can only come from a malformed wire identifier.
	pub fn args(&self) -> Result<Vec<TypeName>> {
		let open = match self.0.find('<') {
			Some(idx) => idx,
			None => return Ok(Vec::new()),
		};
		if !self.0.ends_with('>') {
			return Err(Error::wire(format!("unbalanced type identifier `{}`", self.0)));
		}
		let inner = &self.0[open + 1..self.0.len() - 1];
		let mut args = Vec::new();
		let mut depth = 0usize;
		let mut start = 0usize;
		for (idx, ch) in inner.char_indices() {
			match ch {
				'<' => depth += 1,
				'>' => {
					depth = depth
						.checked_sub(1)
						.ok_or_else(|| Error::wire(format!("unbalanced type identifier `{}`", self.0)))?;
				}
				',' if depth == 0 => {
					args.push(TypeName::new(inner[start..idx].trim()));
					start = idx + 1;
				}
				_ => {}
			}
		}
		if depth != 0 {
			return Err(Error::wire(format!("unbalanced type identifier `{}`", self.0)));
		}
		args.push(TypeName::new(inner[start..].trim()));
		Ok(args)
	}

	/// Rebuild this name with a different family, keeping the arguments.
	pub fn with_family(&self, family: &str) -> Self {
		match self.0.find('<') {
			Some(idx) => Self(format!("{}{}", family, &self.0[idx..])),
			None => Self(family.to_string()),
		}
	}
}

impl Display for TypeName {
	fn fmt(&self, f: &mut Formatter) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for TypeName {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl From<&str> for TypeName {
	fn from(v: &str) -> Self {
		Self(v.to_string())
	}
}

impl From<String> for TypeName {
	fn from(v: String) -> Self {
		Self(v)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn compose_and_split() {
		let name = TypeName::compose(
			"Map",
			&[TypeName::new("String"), TypeName::new("Vec<i32>")],
		);
		assert_eq!(name.as_str(), "Map<String,Vec<i32>>");
		assert_eq!(name.family(), "Map");
		let args = name.args().unwrap();
		assert_eq!(args, vec![TypeName::new("String"), TypeName::new("Vec<i32>")]);
	}

	#[test]
	fn nested_args_split_at_top_level_only() {
		let name = TypeName::new("Map<Vec<String>,Map<i32,i64>>");
		let args = name.args().unwrap();
		assert_eq!(args.len(), 2);
		assert_eq!(args[0].as_str(), "Vec<String>");
		assert_eq!(args[1].as_str(), "Map<i32,i64>");
	}

	#[test]
	fn package_prefix() {
		assert_eq!(TypeName::new("demo.Widget").package(), Some("demo"));
		assert_eq!(TypeName::new("std.time.Duration").package(), Some("std.time"));
		assert_eq!(TypeName::new("i32").package(), None);
		assert_eq!(TypeName::new("Vec<demo.Widget>").package(), None);
	}

	#[test]
	fn unbalanced_names_are_rejected() {
		assert!(TypeName::new("Vec<i32").args().is_err());
		assert!(TypeName::new("Vec<i32>>").args().is_err());
	}

	#[test]
	fn numeric_argument() {
		let name = TypeName::new("Array<f64,3>");
		let args = name.args().unwrap();
		assert!(args[1].is_numeric());
		assert!(!args[0].is_numeric());
	}
}
