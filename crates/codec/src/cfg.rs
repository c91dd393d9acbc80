use std::collections::{HashMap, HashSet};

use crate::err::Result;
use crate::name::TypeName;

/// Wire-level member and element names, shared by the format adapters.
///
/// The JSON members control polymorphic wrapping and non-string map keys.
/// The XML names control the root element, map entries, and the attributes
/// carrying type tags and null markers. The root element name and the map
/// entry element name are configured independently.
#[derive(Clone, Debug)]
pub struct Wire {
	pub type_key: String,
	pub value_key: String,
	pub key_key: String,
	pub root_elem: String,
	pub entry_elem: String,
	pub key_elem: String,
	pub value_elem: String,
	pub type_attr: String,
	pub null_attr: String,
	pub null_value: String,
}

impl Default for Wire {
	fn default() -> Self {
		Self {
			type_key: "@type".to_string(),
			value_key: "@value".to_string(),
			key_key: "@key".to_string(),
			root_elem: "value".to_string(),
			entry_elem: "_".to_string(),
			key_elem: "key".to_string(),
			value_elem: "value".to_string(),
			type_attr: "type".to_string(),
			null_attr: "null".to_string(),
			null_value: "true".to_string(),
		}
	}
}

/// Configuration queried, never mutated, during encode and decode.
///
/// Holds the type-alias table, the decode allow-list, the default concrete
/// types for the abstract collection families, the type-proxy map, and the
/// field-name rename policy. Treated as read-only once the first encode or
/// decode has run.
#[derive(Debug, Default)]
pub struct CodecConfig {
	/// Accepted alias spelling to canonical name.
	aliases: HashMap<String, String>,
	/// Canonical name to the spelling preferred on the wire.
	encode_aliases: HashMap<String, String>,
	allowed_packages: HashSet<String>,
	allowed_classes: HashSet<String>,
	/// Abstract family to the concrete family used when decoding.
	default_concrete: HashMap<String, String>,
	/// Concrete name or family to the surrogate written on the wire.
	proxies: HashMap<String, String>,
	wire: Wire,
}

impl CodecConfig {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register an invertible alias: encoding prefers `alias`, decoding
	/// accepts either spelling.
	pub fn register_type_alias(&mut self, canonical: impl Into<String>, alias: impl Into<String>) {
		let canonical = canonical.into();
		let alias = alias.into();
		self.aliases.insert(alias.clone(), canonical.clone());
		self.encode_aliases.insert(canonical, alias);
	}

	/// Register a decode-only alias spelling for an existing canonical name.
	pub fn accept_type_alias(&mut self, canonical: impl Into<String>, alias: impl Into<String>) {
		self.aliases.insert(alias.into(), canonical.into());
	}

	/// Allow every type whose dotted package prefix matches `package` as a
	/// decode target.
	pub fn register_allowed_package(&mut self, package: impl Into<String>) {
		self.allowed_packages.insert(package.into());
	}

	/// Allow a single type as a decode target.
	pub fn register_allowed_class(&mut self, name: impl Into<String>) {
		self.allowed_classes.insert(name.into());
	}

	/// Map an abstract collection family to the concrete family constructed
	/// when a wire identifier names the abstract one.
	pub fn register_default_concrete(
		&mut self,
		abstract_family: impl Into<String>,
		concrete_family: impl Into<String>,
	) {
		self.default_concrete.insert(abstract_family.into(), concrete_family.into());
	}

	/// Redirect a concrete name or family to a surrogate identifier on the
	/// wire, keeping the encoding stable across implementation choices.
	pub fn register_type_proxy(&mut self, from: impl Into<String>, to: impl Into<String>) {
		self.proxies.insert(from.into(), to.into());
	}

	/// Wire-level member and element names.
	pub fn wire(&self) -> &Wire {
		&self.wire
	}

	pub fn wire_mut(&mut self) -> &mut Wire {
		&mut self.wire
	}

	/// Assign a field its final unique name: the declared name, prefixed
	/// with underscores until it no longer collides with an earlier field.
	pub fn field_name(&self, declared: &str, taken: &[String]) -> String {
		let mut name = declared.to_string();
		while taken.iter().any(|t| t == &name) {
			name.insert(0, '_');
		}
		name
	}

	/// Rewrite an incoming identifier into canonical form, resolving alias
	/// spellings at every nesting level.
	pub(crate) fn canonicalize(&self, name: &TypeName) -> Result<TypeName> {
		if let Some(canonical) = self.aliases.get(name.as_str()) {
			return Ok(TypeName::new(canonical.clone()));
		}
		let args = name.args()?;
		if args.is_empty() {
			return Ok(name.clone());
		}
		let mut resolved = Vec::with_capacity(args.len());
		for arg in &args {
			if arg.is_numeric() {
				resolved.push(arg.clone());
			} else {
				resolved.push(self.canonicalize(arg)?);
			}
		}
		Ok(TypeName::compose(name.family(), &resolved))
	}

	/// Rewrite a canonical identifier into the spelling written on the
	/// wire, applying proxies and preferred aliases at every level.
	pub(crate) fn wire_name(&self, name: &TypeName) -> Result<TypeName> {
		if let Some(target) = self.proxies.get(name.as_str()) {
			return Ok(TypeName::new(target.clone()));
		}
		let args = name.args()?;
		let family = self.proxies.get(name.family()).map(String::as_str).unwrap_or(name.family());
		let composed = if args.is_empty() {
			name.with_family(family)
		} else {
			let mut out = Vec::with_capacity(args.len());
			for arg in &args {
				if arg.is_numeric() {
					out.push(arg.clone());
				} else {
					out.push(self.wire_name(arg)?);
				}
			}
			TypeName::compose(family, &out)
		};
		match self.encode_aliases.get(composed.as_str()) {
			Some(alias) => Ok(TypeName::new(alias.clone())),
			None => Ok(composed),
		}
	}

	/// Rewrite a canonical identifier by substituting configured concrete
	/// families for abstract ones, recursively.
	pub(crate) fn concrete(&self, name: &TypeName) -> Result<TypeName> {
		let args = name.args()?;
		let family =
			self.default_concrete.get(name.family()).map(String::as_str).unwrap_or(name.family());
		if args.is_empty() {
			return Ok(name.with_family(family));
		}
		let mut out = Vec::with_capacity(args.len());
		for arg in &args {
			if arg.is_numeric() {
				out.push(arg.clone());
			} else {
				out.push(self.concrete(arg)?);
			}
		}
		Ok(TypeName::compose(family, &out))
	}

	/// True when the identifier and all of its arguments are permitted
	/// decode targets.
	pub fn is_allowed(&self, name: &TypeName) -> bool {
		if name.is_numeric() {
			return true;
		}
		let family = name.family();
		let family_ok = self.allowed_classes.contains(family)
			|| self.allowed_classes.contains(name.as_str())
			|| self.package_allowed(family);
		if !family_ok {
			return false;
		}
		match name.args() {
			Ok(args) => args.iter().all(|arg| self.is_allowed(arg)),
			Err(_) => false,
		}
	}

	fn package_allowed(&self, family: &str) -> bool {
		let mut idx = 0;
		while let Some(dot) = family[idx..].find('.') {
			if self.allowed_packages.contains(&family[..idx + dot]) {
				return true;
			}
			idx += dot + 1;
		}
		false
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn field_rename_policy_is_deterministic() {
		let cfg = CodecConfig::new();
		let taken = vec!["name".to_string(), "_name".to_string()];
		assert_eq!(cfg.field_name("name", &[]), "name");
		assert_eq!(cfg.field_name("name", &taken[..1]), "_name");
		assert_eq!(cfg.field_name("name", &taken), "__name");
	}

	#[test]
	fn aliases_resolve_at_every_level() {
		let mut cfg = CodecConfig::new();
		cfg.accept_type_alias("i32", "Integer");
		let name = cfg.canonicalize(&TypeName::new("Vec<Integer>")).unwrap();
		assert_eq!(name.as_str(), "Vec<i32>");
	}

	#[test]
	fn proxies_and_defaults_invert() {
		let mut cfg = CodecConfig::new();
		cfg.register_type_proxy("Vec", "List");
		cfg.register_default_concrete("List", "Vec");
		let canonical = TypeName::new("Vec<Vec<i32>>");
		let wire = cfg.wire_name(&canonical).unwrap();
		assert_eq!(wire.as_str(), "List<List<i32>>");
		assert_eq!(cfg.concrete(&wire).unwrap(), canonical);
	}

	#[test]
	fn allow_list_checks_packages_and_arguments() {
		let mut cfg = CodecConfig::new();
		cfg.register_allowed_package("demo");
		cfg.register_allowed_class("Vec");
		cfg.register_allowed_class("i32");
		assert!(cfg.is_allowed(&TypeName::new("demo.Widget")));
		assert!(cfg.is_allowed(&TypeName::new("Vec<demo.Widget>")));
		assert!(!cfg.is_allowed(&TypeName::new("java.lang.Runtime")));
		assert!(!cfg.is_allowed(&TypeName::new("Vec<java.lang.Runtime>")));
	}
}
