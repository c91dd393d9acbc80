//! A reflective, multi-format value-serialization engine.
//!
//! Given a statically-declared root type and a live value, the engine
//! emits a byte or text encoding; given an encoding and a declared root
//! type, it reconstructs an equivalent value. Three wire formats share one
//! registry-driven core: self-describing JSON, hierarchical XML, and a
//! compact binary form.
//!
//! ```
//! use polyform_codec::{json_codec, Encodable, TypeName, TypeRegistry};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Point {
//! 	x: f64,
//! 	y: f64,
//! }
//!
//! impl Encodable for Point {
//! 	fn register(registry: &TypeRegistry) -> polyform_codec::Result<TypeName> {
//! 		if let Some(name) = registry.cached::<Self>() {
//! 			return Ok(name);
//! 		}
//! 		registry
//! 			.product::<Point>("demo.Point")
//! 			.field("x", |p| &p.x, |p, v| p.x = v)
//! 			.field("y", |p| &p.y, |p, v| p.y = v)
//! 			.build()
//! 	}
//! }
//!
//! # fn main() -> polyform_codec::Result<()> {
//! let codec = json_codec()?;
//! let text = codec.encode(&Point { x: 1.0, y: 2.0 })?;
//! assert_eq!(text, r#"{"x":1.0,"y":2.0}"#);
//! let back: Point = codec.decode(&text)?;
//! assert_eq!(back, Point { x: 1.0, y: 2.0 });
//! # Ok(())
//! # }
//! ```

use std::any::Any;
use std::marker::PhantomData;
use std::sync::{RwLockReadGuard, RwLockWriteGuard};

mod bootstrap;
mod codec;

pub mod cfg;
pub mod err;
pub mod fmt;
pub mod name;
pub mod reflect;
pub mod reg;

pub use cfg::{CodecConfig, Wire};
pub use err::{Error, Result};
pub use fmt::{Bytes, Format, Json, Xml};
pub use name::TypeName;
pub use reflect::Encodable;
pub use reg::{AnyValue, ArgArrayBuilder, ArgBundle, EnumBuilder, ProductBuilder, TypeRegistry};

/// One encode/decode engine bound to a wire format.
///
/// The registry and configuration are owned by the core and shared by all
/// calls on it. Construction pre-registers the built-in codec surface;
/// user types register lazily on first use or explicitly through the
/// builders.
pub struct CodecCore<F: Format> {
	registry: TypeRegistry,
	_format: PhantomData<F>,
}

/// A core producing and consuming the JSON text form.
pub fn json_codec() -> Result<CodecCore<Json>> {
	CodecCore::new()
}

/// A core producing and consuming the XML text form.
pub fn xml_codec() -> Result<CodecCore<Xml>> {
	CodecCore::new()
}

/// A core producing and consuming the compact binary form.
pub fn byte_codec() -> Result<CodecCore<Bytes>> {
	CodecCore::new()
}

impl<F: Format> CodecCore<F> {
	/// A core with the built-in registrations installed.
	pub fn new() -> Result<Self> {
		let registry = TypeRegistry::new();
		bootstrap::register_all(&registry)?;
		Ok(Self {
			registry,
			_format: PhantomData,
		})
	}

	/// The shared type registry.
	pub fn registry(&self) -> &TypeRegistry {
		&self.registry
	}

	/// Read access to the configuration.
	pub fn config(&self) -> RwLockReadGuard<'_, CodecConfig> {
		self.registry.config()
	}

	/// Mutable access to the configuration. Only meaningful before the
	/// first encode or decode.
	pub fn config_mut(&self) -> RwLockWriteGuard<'_, CodecConfig> {
		self.registry.config_mut()
	}

	/// Encode a value of the declared type `T`.
	pub fn encode<T: Encodable>(&self, value: &T) -> Result<F::Output> {
		let name = self.registry.ensure::<T>()?;
		let registration = self
			.registry
			.lookup(&name)
			.ok_or_else(|| Error::unknown(name.as_str(), "encoding"))?;
		let wire = self.registry.config().wire().clone();
		let mut writer = F::writer(&wire);
		codec::encode_value::<F>(&self.registry, &registration, value, &mut writer)?;
		F::finish(writer)
	}

	/// Decode a value of the declared type `T`.
	pub fn decode<T: Encodable>(&self, input: &F::Input) -> Result<T> {
		let name = self.registry.ensure::<T>()?;
		let registration = self
			.registry
			.lookup(&name)
			.ok_or_else(|| Error::unknown(name.as_str(), "decoding"))?;
		let wire = self.registry.config().wire().clone();
		let mut reader = F::reader(&wire, input)?;
		let value = codec::decode_value::<F>(&self.registry, &registration, &mut reader)?;
		value.downcast::<T>().map(|v| *v).map_err(|_| Error::cast::<T>())
	}

	/// Encode an erased value under its registered runtime type.
	pub fn encode_dyn(&self, value: &dyn Any) -> Result<F::Output> {
		let name = self.registry.name_of_id(value.type_id(), "encoding a dynamic value")?;
		let registration = self
			.registry
			.lookup(&name)
			.ok_or_else(|| Error::unknown(name.as_str(), "encoding a dynamic value"))?;
		let wire = self.registry.config().wire().clone();
		let mut writer = F::writer(&wire);
		codec::encode_value::<F>(&self.registry, &registration, value, &mut writer)?;
		F::finish(writer)
	}

	/// Decode a value under an explicitly named declared type.
	pub fn decode_dyn(&self, declared: &str, input: &F::Input) -> Result<AnyValue> {
		let (_, registration) = self.registry.resolve_declared(declared, "decoding")?;
		let wire = self.registry.config().wire().clone();
		let mut reader = F::reader(&wire, input)?;
		codec::decode_value::<F>(&self.registry, &registration, &mut reader)
	}

	/// Register `T` through a round-tripping string projection.
	pub fn register_string_proxy<T: Any>(
		&self,
		name: impl Into<TypeName>,
		to: impl Fn(&T) -> String + Send + Sync + 'static,
		from: impl Fn(&str) -> Result<T> + Send + Sync + 'static,
	) -> TypeName {
		self.registry.string_proxy(name, to, from)
	}

	/// Start a product schema for `T`; decode goes through `T::default()`
	/// and the field setters.
	pub fn register_product<T: Any>(&self, name: impl Into<TypeName>) -> ProductBuilder<'_, T> {
		self.registry.product(name)
	}

	/// Start an argument-array schema for `T`; decode collects the fields
	/// positionally and hands them to the constructor.
	pub fn register_arg_array<T: Any>(&self, name: impl Into<TypeName>) -> ArgArrayBuilder<'_, T> {
		self.registry.arg_array(name)
	}

	/// Start an enumeration schema for `T`.
	pub fn register_enum<T: Any + Clone + PartialEq + Send + Sync>(
		&self,
		name: impl Into<TypeName>,
	) -> EnumBuilder<'_, T> {
		self.registry.enumeration(name)
	}
}
