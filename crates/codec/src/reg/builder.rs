use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::err::Result;
use crate::name::TypeName;
use crate::reflect::Encodable;
use crate::reg::registration::{
	borrow_fn, unbox, view, view_mut, Access, ArgBundle, Construct, EnumSchema, FieldSchema,
	ProductSchema, Registration,
};
use crate::reg::TypeRegistry;

/// Schema builder for a product type with stored fields.
///
/// Fields are declared in encode order. Decoding starts from the type's
/// default value and assigns each field through its setter. Names that
/// collide with an earlier field are renamed by the configured policy.
///
/// ```
/// use polyform_codec::{Encodable, TypeName, TypeRegistry};
///
/// #[derive(Default, PartialEq, Debug)]
/// struct Point {
/// 	x: f64,
/// 	y: f64,
/// }
///
/// impl Encodable for Point {
/// 	fn register(registry: &TypeRegistry) -> polyform_codec::Result<TypeName> {
/// 		if let Some(name) = registry.cached::<Self>() {
/// 			return Ok(name);
/// 		}
/// 		registry
/// 			.product::<Point>("demo.Point")
/// 			.field("x", |p| &p.x, |p, v| p.x = v)
/// 			.field("y", |p| &p.y, |p, v| p.y = v)
/// 			.build()
/// 	}
/// }
/// ```
pub struct ProductBuilder<'r, T> {
	registry: &'r TypeRegistry,
	name: TypeName,
	fields: Vec<FieldSchema>,
	_target: PhantomData<fn() -> T>,
}

impl<'r, T: Any> ProductBuilder<'r, T> {
	pub(crate) fn new(registry: &'r TypeRegistry, name: TypeName) -> Self {
		Self {
			registry,
			name,
			fields: Vec::new(),
			_target: PhantomData,
		}
	}

	/// Declare the next field with its accessor and setter.
	pub fn field<V: Encodable>(
		mut self,
		name: &str,
		get: impl Fn(&T) -> &V + Send + Sync + 'static,
		set: impl Fn(&mut T, V) + Send + Sync + 'static,
	) -> Self {
		let unique = self.unique_name(name);
		self.fields.push(FieldSchema {
			name: unique,
			declared: crate::reg::registration::DeclaredType::of::<V>(),
			access: Access::Borrow(borrow_fn(move |obj: &dyn Any| {
				let value: &dyn Any = get(view::<T>(obj)?);
				Ok(value)
			})),
			set: Some(Box::new(move |obj: &mut dyn Any, value| {
				set(view_mut::<T>(obj)?, unbox::<V>(value)?);
				Ok(())
			})),
		});
		self
	}

	/// Register the schema, constructing decoded values from `T::default()`.
	pub fn build(self) -> Result<TypeName>
	where
		T: Default,
	{
		let schema = ProductSchema {
			name: self.name.clone(),
			fields: self.fields,
			construct: Construct::Default(Box::new(|| {
				let value: Box<dyn Any> = Box::new(T::default());
				value
			})),
		};
		Ok(self.registry.install(
			Some(TypeId::of::<T>()),
			self.name,
			Registration::Product(Arc::new(schema)),
		))
	}

	fn unique_name(&self, declared: &str) -> String {
		let taken: Vec<String> = self.fields.iter().map(|f| f.name.clone()).collect();
		self.registry.config().field_name(declared, &taken)
	}
}

/// Schema builder for types reconstructed from a positional argument
/// bundle: records without default values, immutable values, and the
/// date/time surface.
///
/// Each field is an owned projection of the value; the constructor receives
/// the decoded values in declaration order.
pub struct ArgArrayBuilder<'r, T> {
	registry: &'r TypeRegistry,
	name: TypeName,
	fields: Vec<FieldSchema>,
	_target: PhantomData<fn() -> T>,
}

impl<'r, T: Any> ArgArrayBuilder<'r, T> {
	pub(crate) fn new(registry: &'r TypeRegistry, name: TypeName) -> Self {
		Self {
			registry,
			name,
			fields: Vec::new(),
			_target: PhantomData,
		}
	}

	/// Declare the next field as an owned projection of the value.
	pub fn field<V: Encodable>(
		mut self,
		name: &str,
		project: impl Fn(&T) -> V + Send + Sync + 'static,
	) -> Self {
		let unique = self.unique_name(name);
		self.fields.push(FieldSchema {
			name: unique,
			declared: crate::reg::registration::DeclaredType::of::<V>(),
			access: Access::Project(Box::new(move |obj| {
				let value: Box<dyn Any> = Box::new(project(view::<T>(obj)?));
				Ok(value)
			})),
			set: None,
		});
		self
	}

	/// Register the schema with its n-ary constructor.
	pub fn construct(
		self,
		ctor: impl Fn(&mut ArgBundle) -> Result<T> + Send + Sync + 'static,
	) -> Result<TypeName> {
		let schema = ProductSchema {
			name: self.name.clone(),
			fields: self.fields,
			construct: Construct::Args(Box::new(move |args| {
				let value: Box<dyn Any> = Box::new(ctor(args)?);
				Ok(value)
			})),
		};
		Ok(self.registry.install(
			Some(TypeId::of::<T>()),
			self.name,
			Registration::Product(Arc::new(schema)),
		))
	}

	fn unique_name(&self, declared: &str) -> String {
		let taken: Vec<String> = self.fields.iter().map(|f| f.name.clone()).collect();
		self.registry.config().field_name(declared, &taken)
	}
}

/// Schema builder for an enumeration of named values.
///
/// Values encode as their variant name through the format's string codec.
pub struct EnumBuilder<'r, T> {
	registry: &'r TypeRegistry,
	name: TypeName,
	variants: Vec<(String, T)>,
}

impl<'r, T: Any + Clone + PartialEq + Send + Sync> EnumBuilder<'r, T> {
	pub(crate) fn new(registry: &'r TypeRegistry, name: TypeName) -> Self {
		Self {
			registry,
			name,
			variants: Vec::new(),
		}
	}

	pub fn variant(mut self, name: &str, value: T) -> Self {
		self.variants.push((name.to_string(), value));
		self
	}

	pub fn build(self) -> Result<TypeName> {
		let names: Vec<String> = self.variants.iter().map(|(n, _)| n.clone()).collect();
		let values = Arc::new(self.variants);
		let lookup = Arc::clone(&values);
		let schema_name = self.name.clone();
		let error_name = self.name.clone();
		let schema = EnumSchema {
			name: schema_name,
			variants: names,
			index_of: Box::new(move |obj| {
				let value = view::<T>(obj)?;
				lookup.iter().position(|(_, v)| v == value).ok_or_else(|| {
					crate::err::Error::Reflection(format!(
						"value is not a registered variant of `{error_name}`"
					))
				})
			}),
			make: Box::new(move |index| {
				let value: Box<dyn Any> = Box::new(values[index].1.clone());
				value
			}),
		};
		Ok(self.registry.install(
			Some(TypeId::of::<T>()),
			self.name,
			Registration::Enum(Arc::new(schema)),
		))
	}
}
