//! The codec registry: a keyed cache of registrations with at-most-one
//! materialization per type identifier, plus the schema builders.

use std::any::{Any, TypeId};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{trace, warn};

use crate::cfg::CodecConfig;
use crate::err::{Error, Result};
use crate::name::TypeName;
use crate::reflect::Encodable;

pub(crate) mod registration;

mod builder;

pub use builder::{ArgArrayBuilder, EnumBuilder, ProductBuilder};
pub use registration::{AnyValue, ArgBundle};

use registration::{ProxySchema, Registration};

/// Shared mapping from type identifiers to codecs.
///
/// Lookups for a cached key return the shared registration. Uncached keys
/// are constructed under a double-checked insert: concurrent callers may
/// both build a candidate, but only one is kept and the losers adopt it.
/// Explicit registration replaces an existing entry, which is only
/// expected during bootstrap; steady-state entries are never replaced.
pub struct TypeRegistry {
	config: RwLock<CodecConfig>,
	by_name: DashMap<TypeName, Registration>,
	by_id: DashMap<TypeId, TypeName>,
}

impl TypeRegistry {
	pub fn new() -> Self {
		Self {
			config: RwLock::new(CodecConfig::new()),
			by_name: DashMap::new(),
			by_id: DashMap::new(),
		}
	}

	/// Read access to the configuration.
	pub fn config(&self) -> RwLockReadGuard<'_, CodecConfig> {
		self.config.read().unwrap_or_else(|e| e.into_inner())
	}

	/// Mutable access to the configuration. Only meaningful before the
	/// first encode or decode.
	pub fn config_mut(&self) -> RwLockWriteGuard<'_, CodecConfig> {
		self.config.write().unwrap_or_else(|e| e.into_inner())
	}

	/// The canonical name of `T`, if it has already been registered.
	pub fn cached<T: Any>(&self) -> Option<TypeName> {
		self.by_id.get(&TypeId::of::<T>()).map(|entry| entry.value().clone())
	}

	/// Ensure `T` is registered and return its canonical name.
	pub fn ensure<T: Encodable>(&self) -> Result<TypeName> {
		match self.cached::<T>() {
			Some(name) => Ok(name),
			None => T::register(self),
		}
	}

	/// Construct-if-absent entry point used by `Encodable` impls.
	///
	/// If a registration for `name` already exists, it is kept and the
	/// candidate is never built. Losers of a concurrent race discard their
	/// candidate and adopt the winner.
	pub(crate) fn materialize(
		&self,
		id: TypeId,
		name: TypeName,
		make: impl FnOnce() -> Result<Registration>,
	) -> Result<TypeName> {
		if !self.by_name.contains_key(&name) {
			let candidate = make()?;
			match self.by_name.entry(name.clone()) {
				Entry::Occupied(_) => {
					trace!(name = %name, "discarding codec built by a losing racer");
				}
				Entry::Vacant(slot) => {
					trace!(name = %name, "materialized codec");
					slot.insert(candidate);
				}
			}
		}
		self.by_id.insert(id, name.clone());
		Ok(name)
	}

	/// Explicit registration entry point used by the builders. The last
	/// registration for a name wins.
	pub(crate) fn install(
		&self,
		id: Option<TypeId>,
		name: TypeName,
		registration: Registration,
	) -> TypeName {
		if self.by_name.insert(name.clone(), registration).is_some() {
			warn!(name = %name, "replacing an existing codec registration");
		}
		if let Some(id) = id {
			self.by_id.insert(id, name.clone());
		}
		name
	}

	pub(crate) fn lookup(&self, name: &TypeName) -> Option<Registration> {
		self.by_name.get(name).map(|entry| entry.value().clone())
	}

	/// The canonical name registered for a runtime type id.
	pub(crate) fn name_of_id(&self, id: TypeId, op: &'static str) -> Result<TypeName> {
		self.by_id
			.get(&id)
			.map(|entry| entry.value().clone())
			.ok_or_else(|| Error::unknown(format!("{id:?}"), op))
	}

	/// The identifier written on the wire for a canonical name, with
	/// proxies and preferred aliases applied.
	pub(crate) fn tag_for(&self, name: &TypeName) -> Result<TypeName> {
		self.config().wire_name(name)
	}

	/// Resolve an incoming polymorphic type tag: canonicalize aliases,
	/// enforce the allow-list, substitute default concrete families, and
	/// look the result up. The allow-list gate runs before any lookup or
	/// construction.
	pub(crate) fn resolve_wire(
		&self,
		tag: &str,
		op: &'static str,
	) -> Result<(TypeName, Registration)> {
		let (canonical, concrete) = {
			let config = self.config();
			let canonical = config.canonicalize(&TypeName::new(tag))?;
			if !config.is_allowed(&canonical) {
				return Err(Error::disallowed(canonical.as_str()));
			}
			let concrete = config.concrete(&canonical)?;
			(canonical, concrete)
		};
		match self.lookup(&concrete) {
			Some(registration) => Ok((concrete, registration)),
			None => Err(Error::unknown(canonical.as_str(), op)),
		}
	}

	/// Resolve a caller-supplied declared type name, without the
	/// allow-list gate.
	pub(crate) fn resolve_declared(
		&self,
		declared: &str,
		op: &'static str,
	) -> Result<(TypeName, Registration)> {
		let concrete = {
			let config = self.config();
			let canonical = config.canonicalize(&TypeName::new(declared))?;
			config.concrete(&canonical)?
		};
		match self.lookup(&concrete) {
			Some(registration) => Ok((concrete, registration)),
			None => Err(Error::unknown(declared, op)),
		}
	}

	/// Start a product schema for `T` under the given canonical name.
	pub fn product<T: Any>(&self, name: impl Into<TypeName>) -> ProductBuilder<'_, T> {
		ProductBuilder::new(self, name.into())
	}

	/// Start an argument-array schema for `T` under the given canonical
	/// name.
	pub fn arg_array<T: Any>(&self, name: impl Into<TypeName>) -> ArgArrayBuilder<'_, T> {
		ArgArrayBuilder::new(self, name.into())
	}

	/// Start an enumeration schema for `T` under the given canonical name.
	pub fn enumeration<T: Any + Clone + PartialEq + Send + Sync>(
		&self,
		name: impl Into<TypeName>,
	) -> EnumBuilder<'_, T> {
		EnumBuilder::new(self, name.into())
	}

	/// Register `T` through a round-tripping string projection, delegating
	/// to each format's string codec.
	pub fn string_proxy<T: Any>(
		&self,
		name: impl Into<TypeName>,
		to: impl Fn(&T) -> String + Send + Sync + 'static,
		from: impl Fn(&str) -> Result<T> + Send + Sync + 'static,
	) -> TypeName {
		let name = name.into();
		let schema = ProxySchema {
			name: name.clone(),
			to_string: Box::new(move |value| Ok(to(registration::view::<T>(value)?))),
			from_string: Box::new(move |text| {
				let value: Box<dyn Any> = Box::new(from(text)?);
				Ok(value)
			}),
		};
		self.install(
			Some(TypeId::of::<T>()),
			name,
			Registration::StringProxy(Arc::new(schema)),
		)
	}
}

impl Default for TypeRegistry {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::registration::Primitive;
	use super::*;

	#[test]
	fn materialize_keeps_the_first_registration() {
		let registry = TypeRegistry::new();
		let name = TypeName::new("i32");
		registry
			.materialize(TypeId::of::<i32>(), name.clone(), || {
				Ok(Registration::Primitive(Primitive::I32))
			})
			.unwrap();
		registry
			.materialize(TypeId::of::<i32>(), name.clone(), || {
				Ok(Registration::Primitive(Primitive::I64))
			})
			.unwrap();
		match registry.lookup(&name) {
			Some(Registration::Primitive(p)) => assert_eq!(p, Primitive::I32),
			_ => panic!("expected a primitive registration"),
		}
	}

	#[test]
	fn install_lets_the_last_registration_win() {
		let registry = TypeRegistry::new();
		let name = TypeName::new("i32");
		registry.install(None, name.clone(), Registration::Primitive(Primitive::I32));
		registry.install(None, name.clone(), Registration::Primitive(Primitive::I64));
		match registry.lookup(&name) {
			Some(Registration::Primitive(p)) => assert_eq!(p, Primitive::I64),
			_ => panic!("expected a primitive registration"),
		}
	}

	#[test]
	fn ensure_is_idempotent() {
		let registry = TypeRegistry::new();
		let first = registry.ensure::<i32>().unwrap();
		let second = registry.ensure::<i32>().unwrap();
		assert_eq!(first, second);
		assert_eq!(registry.cached::<i32>(), Some(first));
	}
}
