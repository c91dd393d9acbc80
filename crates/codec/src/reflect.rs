//! The `Encodable` trait and its implementations for primitives, strings,
//! options, collections, arrays, tuples, and dynamic values. These stand in
//! for runtime field enumeration: each implementation registers the type's
//! structure once and hands back its canonical name.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::sync::Arc;

use crate::err::{Error, Result};
use crate::name::TypeName;
use crate::reg::registration::{
	borrow_fn, peek_fn, unbox, view, Access, AnyValue, ArraySchema, Construct, DeclaredType,
	FieldSchema, MapConstruct, MapProxy, MapSchema, OptionalSchema, Primitive, ProductSchema,
	ProxySchema, Registration, SeqConstruct, SeqSchema,
};
use crate::reg::TypeRegistry;

/// A type the engine can encode and decode.
///
/// `register` is idempotent: it ensures the type's codec is present in the
/// registry and returns the canonical name. Implementations for user
/// product types delegate to the schema builders; see
/// [`TypeRegistry::product`] and [`TypeRegistry::arg_array`].
pub trait Encodable: Sized + 'static {
	fn register(registry: &TypeRegistry) -> Result<TypeName>;
}

macro_rules! primitive_encodable {
	($($ty:ty => $variant:ident, $name:literal;)+) => {$(
		impl Encodable for $ty {
			fn register(registry: &TypeRegistry) -> Result<TypeName> {
				registry.materialize(
					TypeId::of::<$ty>(),
					TypeName::new($name),
					|| Ok(Registration::Primitive(Primitive::$variant)),
				)
			}
		}
	)+};
}

primitive_encodable! {
	bool => Bool, "bool";
	i8 => I8, "i8";
	i16 => I16, "i16";
	i32 => I32, "i32";
	i64 => I64, "i64";
	u8 => U8, "u8";
	u16 => U16, "u16";
	u32 => U32, "u32";
	u64 => U64, "u64";
	f32 => F32, "f32";
	f64 => F64, "f64";
	char => Char, "char";
	String => Str, "String";
}

impl Encodable for Box<dyn Any> {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		registry.materialize(TypeId::of::<Box<dyn Any>>(), TypeName::new("Any"), || {
			Ok(Registration::Dynamic)
		})
	}
}

impl<T: Encodable> Encodable for Option<T> {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		let elem = T::register(registry)?;
		let name = TypeName::compose("Option", &[elem]);
		let schema_name = name.clone();
		registry.materialize(TypeId::of::<Self>(), name, move || {
			Ok(Registration::Optional(Arc::new(OptionalSchema {
				name: schema_name,
				inner: DeclaredType::of::<T>(),
				peek: peek_fn(|obj: &dyn Any| {
					Ok(view::<Option<T>>(obj)?.as_ref().map(|v| v as &dyn Any))
				}),
				wrap: Box::new(|inner| {
					let value: AnyValue = match inner {
						Some(v) => Box::new(Some(unbox::<T>(v)?)),
						None => Box::new(None::<T>),
					};
					Ok(value)
				}),
			})))
		})
	}
}

impl<T: Encodable> Encodable for Vec<T> {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		let elem = T::register(registry)?;
		let name = TypeName::compose("Vec", &[elem]);
		let schema_name = name.clone();
		registry.materialize(TypeId::of::<Self>(), name, move || {
			Ok(Registration::Sequence(Arc::new(SeqSchema {
				name: schema_name,
				elem: DeclaredType::of::<T>(),
				len: Box::new(|obj| Ok(view::<Vec<T>>(obj)?.len())),
				iter: Box::new(|obj, emit| {
					for item in view::<Vec<T>>(obj)? {
						emit(item)?;
					}
					Ok(())
				}),
				construct: SeqConstruct::Push {
					new: Box::new(|capacity| {
						let value: AnyValue = Box::new(Vec::<T>::with_capacity(capacity));
						value
					}),
					push: Box::new(|obj, item| {
						obj.downcast_mut::<Vec<T>>()
							.ok_or_else(Error::cast::<Vec<T>>)?
							.push(unbox::<T>(item)?);
						Ok(())
					}),
				},
			})))
		})
	}
}

impl<T: Encodable> Encodable for VecDeque<T> {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		let elem = T::register(registry)?;
		let name = TypeName::compose("VecDeque", &[elem]);
		let schema_name = name.clone();
		registry.materialize(TypeId::of::<Self>(), name, move || {
			Ok(Registration::Sequence(Arc::new(SeqSchema {
				name: schema_name,
				elem: DeclaredType::of::<T>(),
				len: Box::new(|obj| Ok(view::<VecDeque<T>>(obj)?.len())),
				iter: Box::new(|obj, emit| {
					for item in view::<VecDeque<T>>(obj)? {
						emit(item)?;
					}
					Ok(())
				}),
				construct: SeqConstruct::Push {
					new: Box::new(|capacity| {
						let value: AnyValue = Box::new(VecDeque::<T>::with_capacity(capacity));
						value
					}),
					push: Box::new(|obj, item| {
						obj.downcast_mut::<VecDeque<T>>()
							.ok_or_else(Error::cast::<VecDeque<T>>)?
							.push_back(unbox::<T>(item)?);
						Ok(())
					}),
				},
			})))
		})
	}
}

impl<T: Encodable + Eq + Hash> Encodable for HashSet<T> {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		let elem = T::register(registry)?;
		let name = TypeName::compose("HashSet", &[elem]);
		let schema_name = name.clone();
		registry.materialize(TypeId::of::<Self>(), name, move || {
			Ok(Registration::Sequence(Arc::new(SeqSchema {
				name: schema_name,
				elem: DeclaredType::of::<T>(),
				len: Box::new(|obj| Ok(view::<HashSet<T>>(obj)?.len())),
				iter: Box::new(|obj, emit| {
					for item in view::<HashSet<T>>(obj)? {
						emit(item)?;
					}
					Ok(())
				}),
				construct: SeqConstruct::Push {
					new: Box::new(|capacity| {
						let value: AnyValue = Box::new(HashSet::<T>::with_capacity(capacity));
						value
					}),
					push: Box::new(|obj, item| {
						obj.downcast_mut::<HashSet<T>>()
							.ok_or_else(Error::cast::<HashSet<T>>)?
							.insert(unbox::<T>(item)?);
						Ok(())
					}),
				},
			})))
		})
	}
}

impl<T: Encodable + Ord> Encodable for BTreeSet<T> {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		let elem = T::register(registry)?;
		let name = TypeName::compose("BTreeSet", &[elem]);
		let schema_name = name.clone();
		registry.materialize(TypeId::of::<Self>(), name, move || {
			Ok(Registration::Sequence(Arc::new(SeqSchema {
				name: schema_name,
				elem: DeclaredType::of::<T>(),
				len: Box::new(|obj| Ok(view::<BTreeSet<T>>(obj)?.len())),
				iter: Box::new(|obj, emit| {
					for item in view::<BTreeSet<T>>(obj)? {
						emit(item)?;
					}
					Ok(())
				}),
				construct: SeqConstruct::Push {
					new: Box::new(|_| {
						let value: AnyValue = Box::new(BTreeSet::<T>::new());
						value
					}),
					push: Box::new(|obj, item| {
						obj.downcast_mut::<BTreeSet<T>>()
							.ok_or_else(Error::cast::<BTreeSet<T>>)?
							.insert(unbox::<T>(item)?);
						Ok(())
					}),
				},
			})))
		})
	}
}

impl<T: Encodable> Encodable for Box<[T]> {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		let elem = T::register(registry)?;
		let name = TypeName::compose("Slice", &[elem]);
		let schema_name = name.clone();
		registry.materialize(TypeId::of::<Self>(), name, move || {
			Ok(Registration::Sequence(Arc::new(SeqSchema {
				name: schema_name,
				elem: DeclaredType::of::<T>(),
				len: Box::new(|obj| Ok(view::<Box<[T]>>(obj)?.len())),
				iter: Box::new(|obj, emit| {
					for item in view::<Box<[T]>>(obj)?.iter() {
						emit(item)?;
					}
					Ok(())
				}),
				construct: SeqConstruct::Args(Box::new(|args| {
					let mut items = Vec::with_capacity(args.len());
					for arg in args {
						items.push(unbox::<T>(arg)?);
					}
					let value: AnyValue = Box::new(items.into_boxed_slice());
					Ok(value)
				})),
			})))
		})
	}
}

impl<T: Encodable> Encodable for Arc<[T]> {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		let elem = T::register(registry)?;
		let name = TypeName::compose("ArcSlice", &[elem]);
		let schema_name = name.clone();
		registry.materialize(TypeId::of::<Self>(), name, move || {
			Ok(Registration::Sequence(Arc::new(SeqSchema {
				name: schema_name,
				elem: DeclaredType::of::<T>(),
				len: Box::new(|obj| Ok(view::<Arc<[T]>>(obj)?.len())),
				iter: Box::new(|obj, emit| {
					for item in view::<Arc<[T]>>(obj)?.iter() {
						emit(item)?;
					}
					Ok(())
				}),
				construct: SeqConstruct::Args(Box::new(|args| {
					let mut items = Vec::with_capacity(args.len());
					for arg in args {
						items.push(unbox::<T>(arg)?);
					}
					let value: AnyValue = Box::new(Arc::<[T]>::from(items));
					Ok(value)
				})),
			})))
		})
	}
}

impl<T: Encodable, const N: usize> Encodable for [T; N] {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		let elem = T::register(registry)?;
		let name = TypeName::compose("Array", &[elem, TypeName::new(N.to_string())]);
		let schema_name = name.clone();
		registry.materialize(TypeId::of::<Self>(), name, move || {
			let args_name = schema_name.clone();
			Ok(Registration::Array(Arc::new(ArraySchema {
				name: schema_name.clone(),
				elem: DeclaredType::of::<T>(),
				len: N,
				iter: Box::new(|obj, emit| {
					for item in view::<[T; N]>(obj)? {
						emit(item)?;
					}
					Ok(())
				}),
				from_args: Box::new(move |args| {
					let mut items = Vec::with_capacity(args.len());
					for arg in args {
						items.push(unbox::<T>(arg)?);
					}
					let array: [T; N] = items.try_into().map_err(|_| {
						Error::mismatch(args_name.as_str(), format!("expected {N} elements"))
					})?;
					let value: AnyValue = Box::new(array);
					Ok(value)
				}),
			})))
		})
	}
}

struct HashMapProxy<K, V>(HashMap<K, V>);

impl<K: Any + Eq + Hash, V: Any> MapProxy for HashMapProxy<K, V> {
	fn put(&mut self, key: AnyValue, value: AnyValue) -> Result<()> {
		self.0.insert(unbox::<K>(key)?, unbox::<V>(value)?);
		Ok(())
	}

	fn construct(self: Box<Self>) -> AnyValue {
		Box::new(self.0)
	}
}

struct BTreeMapProxy<K, V>(BTreeMap<K, V>);

impl<K: Any + Ord, V: Any> MapProxy for BTreeMapProxy<K, V> {
	fn put(&mut self, key: AnyValue, value: AnyValue) -> Result<()> {
		self.0.insert(unbox::<K>(key)?, unbox::<V>(value)?);
		Ok(())
	}

	fn construct(self: Box<Self>) -> AnyValue {
		Box::new(self.0)
	}
}

impl<K: Encodable + Eq + Hash, V: Encodable> Encodable for HashMap<K, V> {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		let key = K::register(registry)?;
		let value = V::register(registry)?;
		let name = TypeName::compose("HashMap", &[key, value]);
		let schema_name = name.clone();
		registry.materialize(TypeId::of::<Self>(), name, move || {
			Ok(Registration::Map(Arc::new(MapSchema {
				name: schema_name,
				key: DeclaredType::of::<K>(),
				value: DeclaredType::of::<V>(),
				len: Box::new(|obj| Ok(view::<HashMap<K, V>>(obj)?.len())),
				iter: Box::new(|obj, emit| {
					for (k, v) in view::<HashMap<K, V>>(obj)? {
						emit(k, v)?;
					}
					Ok(())
				}),
				construct: MapConstruct::Proxy(Box::new(|| {
					let proxy: Box<dyn MapProxy> = Box::new(HashMapProxy::<K, V>(HashMap::new()));
					proxy
				})),
			})))
		})
	}
}

impl<K: Encodable + Ord, V: Encodable> Encodable for BTreeMap<K, V> {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		let key = K::register(registry)?;
		let value = V::register(registry)?;
		let name = TypeName::compose("BTreeMap", &[key, value]);
		let schema_name = name.clone();
		registry.materialize(TypeId::of::<Self>(), name, move || {
			Ok(Registration::Map(Arc::new(MapSchema {
				name: schema_name,
				key: DeclaredType::of::<K>(),
				value: DeclaredType::of::<V>(),
				len: Box::new(|obj| Ok(view::<BTreeMap<K, V>>(obj)?.len())),
				iter: Box::new(|obj, emit| {
					for (k, v) in view::<BTreeMap<K, V>>(obj)? {
						emit(k, v)?;
					}
					Ok(())
				}),
				construct: MapConstruct::Proxy(Box::new(|| {
					let proxy: Box<dyn MapProxy> = Box::new(BTreeMapProxy::<K, V>(BTreeMap::new()));
					proxy
				})),
			})))
		})
	}
}

impl<K: Encodable + Eq + Hash, V: Encodable> Encodable for Arc<HashMap<K, V>> {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		let key = K::register(registry)?;
		let value = V::register(registry)?;
		let name = TypeName::compose("ArcHashMap", &[key, value]);
		let schema_name = name.clone();
		registry.materialize(TypeId::of::<Self>(), name, move || {
			let args_name = schema_name.clone();
			Ok(Registration::Map(Arc::new(MapSchema {
				name: schema_name.clone(),
				key: DeclaredType::of::<K>(),
				value: DeclaredType::of::<V>(),
				len: Box::new(|obj| Ok(view::<Arc<HashMap<K, V>>>(obj)?.len())),
				iter: Box::new(|obj, emit| {
					for (k, v) in view::<Arc<HashMap<K, V>>>(obj)?.iter() {
						emit(k, v)?;
					}
					Ok(())
				}),
				construct: MapConstruct::Args(Box::new(move |args| {
					let mut map = HashMap::with_capacity(args.len() / 2);
					for (k, v) in entry_args(&args_name, args)? {
						map.insert(unbox::<K>(k)?, unbox::<V>(v)?);
					}
					let value: AnyValue = Box::new(Arc::new(map));
					Ok(value)
				})),
			})))
		})
	}
}

impl<K: Encodable + Ord, V: Encodable> Encodable for Arc<BTreeMap<K, V>> {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		let key = K::register(registry)?;
		let value = V::register(registry)?;
		let name = TypeName::compose("ArcBTreeMap", &[key, value]);
		let schema_name = name.clone();
		registry.materialize(TypeId::of::<Self>(), name, move || {
			let args_name = schema_name.clone();
			Ok(Registration::Map(Arc::new(MapSchema {
				name: schema_name.clone(),
				key: DeclaredType::of::<K>(),
				value: DeclaredType::of::<V>(),
				len: Box::new(|obj| Ok(view::<Arc<BTreeMap<K, V>>>(obj)?.len())),
				iter: Box::new(|obj, emit| {
					for (k, v) in view::<Arc<BTreeMap<K, V>>>(obj)?.iter() {
						emit(k, v)?;
					}
					Ok(())
				}),
				construct: MapConstruct::Args(Box::new(move |args| {
					let mut map = BTreeMap::new();
					for (k, v) in entry_args(&args_name, args)? {
						map.insert(unbox::<K>(k)?, unbox::<V>(v)?);
					}
					let value: AnyValue = Box::new(Arc::new(map));
					Ok(value)
				})),
			})))
		})
	}
}

/// Pair up a flattened `[k0, v0, k1, v1, ...]` argument list, rejecting an
/// odd argument count.
fn entry_args(name: &TypeName, args: Vec<AnyValue>) -> Result<Vec<(AnyValue, AnyValue)>> {
	if args.len() % 2 != 0 {
		return Err(Error::mismatch(
			name.as_str(),
			format!("argument list of length {} is not a multiple of 2", args.len()),
		));
	}
	let mut pairs = Vec::with_capacity(args.len() / 2);
	let mut iter = args.into_iter();
	while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
		pairs.push((k, v));
	}
	Ok(pairs)
}

impl Encodable for Box<str> {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		registry.materialize(TypeId::of::<Box<str>>(), TypeName::new("BoxStr"), || {
			Ok(Registration::StringProxy(Arc::new(ProxySchema {
				name: TypeName::new("BoxStr"),
				to_string: Box::new(|value| Ok(view::<Box<str>>(value)?.to_string())),
				from_string: Box::new(|text| {
					let value: AnyValue = Box::new(text.to_string().into_boxed_str());
					Ok(value)
				}),
			})))
		})
	}
}

impl Encodable for Arc<str> {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		registry.materialize(TypeId::of::<Arc<str>>(), TypeName::new("ArcStr"), || {
			Ok(Registration::StringProxy(Arc::new(ProxySchema {
				name: TypeName::new("ArcStr"),
				to_string: Box::new(|value| Ok(view::<Arc<str>>(value)?.to_string())),
				from_string: Box::new(|text| {
					let value: AnyValue = Box::new(Arc::<str>::from(text));
					Ok(value)
				}),
			})))
		})
	}
}

macro_rules! tuple_encodable {
	($($ty:ident . $idx:tt -> $fname:literal),+) => {
		impl<$($ty: Encodable),+> Encodable for ($($ty,)+) {
			fn register(registry: &TypeRegistry) -> Result<TypeName> {
				if let Some(name) = registry.cached::<Self>() {
					return Ok(name);
				}
				let args = vec![$($ty::register(registry)?),+];
				let name = TypeName::compose("Tuple", &args);
				let schema_name = name.clone();
				registry.materialize(TypeId::of::<Self>(), name, move || {
					let fields = vec![$(FieldSchema {
						name: $fname.to_string(),
						declared: DeclaredType::of::<$ty>(),
						access: Access::Borrow(borrow_fn(|obj: &dyn Any| {
							let value: &dyn Any = &view::<Self>(obj)?.$idx;
							Ok(value)
						})),
						set: None,
					}),+];
					Ok(Registration::Product(Arc::new(ProductSchema {
						name: schema_name,
						fields,
						construct: Construct::Args(Box::new(|args| {
							let value: AnyValue = Box::new(($(args.take::<$ty>($idx)?,)+));
							Ok(value)
						})),
					})))
				})
			}
		}
	};
}

tuple_encodable!(A.0 -> "_0", B.1 -> "_1");
tuple_encodable!(A.0 -> "_0", B.1 -> "_1", C.2 -> "_2");
tuple_encodable!(A.0 -> "_0", B.1 -> "_1", C.2 -> "_2", D.3 -> "_3");

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn odd_entry_argument_counts_are_rejected() {
		let name = TypeName::new("ArcHashMap<String,i32>");
		let args: Vec<AnyValue> =
			vec![Box::new("a".to_string()), Box::new(1i32), Box::new("b".to_string())];
		match entry_args(&name, args) {
			Err(Error::SchemaMismatch {
				name,
				detail,
			}) => {
				assert_eq!(name, "ArcHashMap<String,i32>");
				assert!(detail.contains("length 3"));
			}
			Err(other) => panic!("unexpected error {other:?}"),
			Ok(_) => panic!("odd argument count was accepted"),
		}
	}

	#[test]
	fn even_entry_argument_counts_pair_up() {
		let name = TypeName::new("ArcHashMap<String,i32>");
		let args: Vec<AnyValue> = vec![Box::new("a".to_string()), Box::new(1i32)];
		let pairs = entry_args(&name, args).unwrap();
		assert_eq!(pairs.len(), 1);
	}
}
