use std::any::Any;
use std::sync::{Arc, OnceLock};

use crate::err::{Error, Result};
use crate::name::TypeName;
use crate::reflect::Encodable;
use crate::reg::TypeRegistry;

/// An erased value moving through decode.
pub type AnyValue = Box<dyn Any>;

pub(crate) type GetFn = Box<dyn Fn(&dyn Any) -> Result<&dyn Any> + Send + Sync>;
pub(crate) type PeekFn = Box<dyn Fn(&dyn Any) -> Result<Option<&dyn Any>> + Send + Sync>;
pub(crate) type ProjectFn = Box<dyn Fn(&dyn Any) -> Result<AnyValue> + Send + Sync>;
pub(crate) type SetFn = Box<dyn Fn(&mut dyn Any, AnyValue) -> Result<()> + Send + Sync>;
pub(crate) type NewFn = Box<dyn Fn() -> AnyValue + Send + Sync>;
pub(crate) type CtorFn = Box<dyn Fn(&mut ArgBundle) -> Result<AnyValue> + Send + Sync>;
pub(crate) type FromArgsFn = Box<dyn Fn(Vec<AnyValue>) -> Result<AnyValue> + Send + Sync>;
pub(crate) type LenFn = Box<dyn Fn(&dyn Any) -> Result<usize> + Send + Sync>;
pub(crate) type IterFn =
	Box<dyn Fn(&dyn Any, &mut dyn FnMut(&dyn Any) -> Result<()>) -> Result<()> + Send + Sync>;
pub(crate) type IterPairFn = Box<
	dyn Fn(&dyn Any, &mut dyn FnMut(&dyn Any, &dyn Any) -> Result<()>) -> Result<()> + Send + Sync,
>;
pub(crate) type WrapFn = Box<dyn Fn(Option<AnyValue>) -> Result<AnyValue> + Send + Sync>;
pub(crate) type ToStringFn = Box<dyn Fn(&dyn Any) -> Result<String> + Send + Sync>;
pub(crate) type FromStringFn = Box<dyn Fn(&str) -> Result<AnyValue> + Send + Sync>;
pub(crate) type IndexFn = Box<dyn Fn(&dyn Any) -> Result<usize> + Send + Sync>;
pub(crate) type MakeFn = Box<dyn Fn(usize) -> AnyValue + Send + Sync>;
pub(crate) type ProxyFn = Box<dyn Fn() -> Box<dyn MapProxy> + Send + Sync>;

/// Constrain a borrowing accessor closure to the higher-ranked signature
/// the erased layer stores.
pub(crate) fn borrow_fn<F>(f: F) -> GetFn
where
	F: for<'a> Fn(&'a dyn Any) -> Result<&'a dyn Any> + Send + Sync + 'static,
{
	Box::new(f)
}

pub(crate) fn peek_fn<F>(f: F) -> PeekFn
where
	F: for<'a> Fn(&'a dyn Any) -> Result<Option<&'a dyn Any>> + Send + Sync + 'static,
{
	Box::new(f)
}

/// View an erased value as `T`, failing with a reflection error.
pub(crate) fn view<T: Any>(value: &dyn Any) -> Result<&T> {
	value.downcast_ref::<T>().ok_or_else(Error::cast::<T>)
}

pub(crate) fn view_mut<T: Any>(value: &mut dyn Any) -> Result<&mut T> {
	value.downcast_mut::<T>().ok_or_else(Error::cast::<T>)
}

pub(crate) fn unbox<T: Any>(value: AnyValue) -> Result<T> {
	value.downcast::<T>().map(|v| *v).map_err(|_| Error::cast::<T>())
}

/// The codec for one registered type: a tagged variant the format-generic
/// encode and decode walkers pattern-match.
#[derive(Clone)]
pub(crate) enum Registration {
	Primitive(Primitive),
	Product(Arc<ProductSchema>),
	Sequence(Arc<SeqSchema>),
	Array(Arc<ArraySchema>),
	Map(Arc<MapSchema>),
	StringProxy(Arc<ProxySchema>),
	Enum(Arc<EnumSchema>),
	Optional(Arc<OptionalSchema>),
	Dynamic,
}

/// Fixed-width atoms handled directly by the format adapters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Primitive {
	Bool,
	I8,
	I16,
	I32,
	I64,
	U8,
	U16,
	U32,
	U64,
	F32,
	F64,
	Char,
	Str,
}

/// The declared type of a field or element, resolved lazily so that
/// self-referential schemas can be registered in one pass.
pub(crate) struct DeclaredType {
	resolve: Box<dyn Fn(&TypeRegistry) -> Result<TypeName> + Send + Sync>,
	cached: OnceLock<TypeName>,
}

impl DeclaredType {
	pub fn of<T: Encodable>() -> Self {
		Self {
			resolve: Box::new(|registry| T::register(registry)),
			cached: OnceLock::new(),
		}
	}

	pub fn name(&self, registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = self.cached.get() {
			return Ok(name.clone());
		}
		let name = (self.resolve)(registry)?;
		let _ = self.cached.set(name.clone());
		Ok(name)
	}

	pub fn registration(&self, registry: &TypeRegistry) -> Result<Registration> {
		let name = self.name(registry)?;
		registry
			.lookup(&name)
			.ok_or_else(|| Error::unknown(name.as_str(), "resolving a declared type"))
	}
}

/// How a product field is read from its parent during encode.
pub(crate) enum Access {
	/// Borrow a stored field.
	Borrow(GetFn),
	/// Compute an owned projection, for externally-constructed types.
	Project(ProjectFn),
}

pub(crate) struct FieldSchema {
	pub name: String,
	pub declared: DeclaredType,
	pub access: Access,
	pub set: Option<SetFn>,
}

/// How a product value is rebuilt during decode.
pub(crate) enum Construct {
	/// Start from the type's default value and assign each field.
	Default(NewFn),
	/// Collect the decoded fields into a positional argument bundle and
	/// hand it to an n-ary constructor.
	Args(CtorFn),
}

pub(crate) struct ProductSchema {
	pub name: TypeName,
	pub fields: Vec<FieldSchema>,
	pub construct: Construct,
}

pub(crate) enum SeqConstruct {
	/// Grow an empty collection one element at a time.
	Push {
		new: Box<dyn Fn(usize) -> AnyValue + Send + Sync>,
		push: SetFn,
	},
	/// Collect all elements, then construct in one step.
	Args(FromArgsFn),
}

pub(crate) struct SeqSchema {
	pub name: TypeName,
	pub elem: DeclaredType,
	pub len: LenFn,
	pub iter: IterFn,
	pub construct: SeqConstruct,
}

pub(crate) struct ArraySchema {
	pub name: TypeName,
	pub elem: DeclaredType,
	pub len: usize,
	pub iter: IterFn,
	pub from_args: FromArgsFn,
}

pub(crate) enum MapConstruct {
	/// Accumulate entries through a proxy, then materialize the map.
	Proxy(ProxyFn),
	/// Collect entries flattened as `[k0, v0, k1, v1, ...]`, then construct.
	Args(FromArgsFn),
}

pub(crate) struct MapSchema {
	pub name: TypeName,
	pub key: DeclaredType,
	pub value: DeclaredType,
	pub len: LenFn,
	pub iter: IterPairFn,
	pub construct: MapConstruct,
}

pub(crate) struct ProxySchema {
	pub name: TypeName,
	pub to_string: ToStringFn,
	pub from_string: FromStringFn,
}

pub(crate) struct EnumSchema {
	pub name: TypeName,
	pub variants: Vec<String>,
	pub index_of: IndexFn,
	pub make: MakeFn,
}

pub(crate) struct OptionalSchema {
	pub name: TypeName,
	pub inner: DeclaredType,
	pub peek: PeekFn,
	pub wrap: WrapFn,
}

/// A temporary accumulator collecting decoded map entries before the final
/// concrete map is materialized, so ordered variants are built on ordered
/// inserts.
pub(crate) trait MapProxy {
	fn put(&mut self, key: AnyValue, value: AnyValue) -> Result<()>;
	fn construct(self: Box<Self>) -> AnyValue;
}

/// Positional bundle of decoded field values handed to an n-ary
/// constructor.
pub struct ArgBundle {
	name: TypeName,
	values: Vec<Option<AnyValue>>,
}

impl ArgBundle {
	pub(crate) fn new(name: TypeName) -> Self {
		Self {
			name,
			values: Vec::new(),
		}
	}

	pub(crate) fn push(&mut self, value: AnyValue) {
		self.values.push(Some(value));
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// Take the argument at `index` as a `T`.
	pub fn take<T: Any>(&mut self, index: usize) -> Result<T> {
		let slot = self
			.values
			.get_mut(index)
			.and_then(Option::take)
			.ok_or_else(|| Error::mismatch(self.name.as_str(), format!("missing argument {index}")))?;
		unbox(slot)
	}
}
