//! Product codec: fields encode in declaration order; decode is by name in
//! the self-describing formats and by schema order in the binary form.
//! Construction goes through the type's default value and setters, or
//! through the positional argument bundle for externally-constructed types.

use std::any::Any;

use crate::codec::{decode_value, encode_value};
use crate::err::{Error, Result};
use crate::fmt::{Format, ValueReader, ValueWriter};
use crate::reg::registration::{Access, AnyValue, ArgBundle, Construct, ProductSchema};
use crate::reg::TypeRegistry;

pub(crate) fn encode<F: Format>(
	registry: &TypeRegistry,
	schema: &ProductSchema,
	value: &dyn Any,
	writer: &mut F::Writer,
) -> Result<()> {
	writer.record_begin(schema.fields.len())?;
	for field in &schema.fields {
		writer.record_field(&field.name)?;
		let registration = field.declared.registration(registry)?;
		match &field.access {
			Access::Borrow(get) => {
				encode_value::<F>(registry, &registration, get(value)?, writer)?;
			}
			Access::Project(project) => {
				let owned = project(value)?;
				encode_value::<F>(registry, &registration, owned.as_ref(), writer)?;
			}
		}
	}
	writer.record_end()
}

pub(crate) fn decode<F: Format>(
	registry: &TypeRegistry,
	schema: &ProductSchema,
	reader: &mut F::Reader<'_>,
) -> Result<AnyValue> {
	let observed = reader.record_begin()?;
	if let Some(count) = observed {
		if count != schema.fields.len() {
			return Err(Error::mismatch(
				schema.name.as_str(),
				format!("expected {} fields, found {count}", schema.fields.len()),
			));
		}
	}
	let value = match &schema.construct {
		Construct::Default(new) => {
			let mut value = new();
			for field in &schema.fields {
				let decoded = decode_field::<F>(registry, schema, field, reader)?;
				let set = field.set.as_ref().ok_or_else(|| {
					Error::Reflection(format!(
						"field `{}` of `{}` has no setter",
						field.name, schema.name
					))
				})?;
				set(value.as_mut(), decoded)?;
			}
			value
		}
		Construct::Args(ctor) => {
			let mut args = ArgBundle::new(schema.name.clone());
			for field in &schema.fields {
				let decoded = decode_field::<F>(registry, schema, field, reader)?;
				args.push(decoded);
			}
			ctor(&mut args)?
		}
	};
	reader.record_end()?;
	Ok(value)
}

fn decode_field<F: Format>(
	registry: &TypeRegistry,
	schema: &ProductSchema,
	field: &crate::reg::registration::FieldSchema,
	reader: &mut F::Reader<'_>,
) -> Result<AnyValue> {
	if !reader.record_select(&field.name)? {
		return Err(Error::mismatch(
			schema.name.as_str(),
			format!("missing field `{}`", field.name),
		));
	}
	let registration = field.declared.registration(registry)?;
	decode_value::<F>(registry, &registration, reader)
}
