//! Format-generic encode and decode: one walker per registration variant,
//! driven through the format adapter atoms. Dynamic dispatch, null
//! handling, and the allow-list gate live here.

use std::any::Any;

use crate::err::{Error, Result};
use crate::fmt::{Format, ValueReader, ValueWriter};
use crate::reg::registration::{AnyValue, OptionalSchema, Primitive, Registration};
use crate::reg::TypeRegistry;

mod map;
mod product;
mod seq;

/// Encode one value under its registration.
pub(crate) fn encode_value<F: Format>(
	registry: &TypeRegistry,
	registration: &Registration,
	value: &dyn Any,
	writer: &mut F::Writer,
) -> Result<()> {
	match registration {
		Registration::Primitive(p) => encode_primitive(*p, value, writer),
		Registration::Product(schema) => product::encode::<F>(registry, schema, value, writer),
		Registration::Sequence(schema) => seq::encode_seq::<F>(registry, schema, value, writer),
		Registration::Array(schema) => seq::encode_array::<F>(registry, schema, value, writer),
		Registration::Map(schema) => map::encode::<F>(registry, schema, value, writer),
		Registration::StringProxy(schema) => writer.write_str(&(schema.to_string)(value)?),
		Registration::Enum(schema) => {
			let index = (schema.index_of)(value)?;
			writer.write_str(&schema.variants[index])
		}
		Registration::Optional(schema) => encode_optional::<F>(registry, schema, value, writer),
		Registration::Dynamic => encode_dynamic::<F>(registry, value, writer),
	}
}

/// Decode one value under its registration, yielding it erased.
pub(crate) fn decode_value<F: Format>(
	registry: &TypeRegistry,
	registration: &Registration,
	reader: &mut F::Reader<'_>,
) -> Result<AnyValue> {
	match registration {
		Registration::Primitive(p) => decode_primitive(*p, reader),
		Registration::Product(schema) => product::decode::<F>(registry, schema, reader),
		Registration::Sequence(schema) => seq::decode_seq::<F>(registry, schema, reader),
		Registration::Array(schema) => seq::decode_array::<F>(registry, schema, reader),
		Registration::Map(schema) => map::decode::<F>(registry, schema, reader),
		Registration::StringProxy(schema) => (schema.from_string)(&reader.read_str()?),
		Registration::Enum(schema) => {
			let text = reader.read_str()?;
			let index = schema
				.variants
				.iter()
				.position(|v| *v == text)
				.ok_or_else(|| Error::mismatch(schema.name.as_str(), format!("unknown variant `{text}`")))?;
			Ok((schema.make)(index))
		}
		Registration::Optional(schema) => decode_optional::<F>(registry, schema, reader),
		Registration::Dynamic => decode_dynamic::<F>(registry, reader),
	}
}

fn view<'a, T: Any>(value: &'a dyn Any) -> Result<&'a T> {
	value.downcast_ref::<T>().ok_or_else(Error::cast::<T>)
}

fn encode_primitive<W: ValueWriter>(p: Primitive, value: &dyn Any, writer: &mut W) -> Result<()> {
	match p {
		Primitive::Bool => writer.write_bool(*view(value)?),
		Primitive::I8 => writer.write_i8(*view(value)?),
		Primitive::I16 => writer.write_i16(*view(value)?),
		Primitive::I32 => writer.write_i32(*view(value)?),
		Primitive::I64 => writer.write_i64(*view(value)?),
		Primitive::U8 => writer.write_u8(*view(value)?),
		Primitive::U16 => writer.write_u16(*view(value)?),
		Primitive::U32 => writer.write_u32(*view(value)?),
		Primitive::U64 => writer.write_u64(*view(value)?),
		Primitive::F32 => writer.write_f32(*view(value)?),
		Primitive::F64 => writer.write_f64(*view(value)?),
		Primitive::Char => writer.write_char(*view(value)?),
		Primitive::Str => writer.write_str(view::<String>(value)?),
	}
}

fn decode_primitive<R: ValueReader>(p: Primitive, reader: &mut R) -> Result<AnyValue> {
	Ok(match p {
		Primitive::Bool => Box::new(reader.read_bool()?),
		Primitive::I8 => Box::new(reader.read_i8()?),
		Primitive::I16 => Box::new(reader.read_i16()?),
		Primitive::I32 => Box::new(reader.read_i32()?),
		Primitive::I64 => Box::new(reader.read_i64()?),
		Primitive::U8 => Box::new(reader.read_u8()?),
		Primitive::U16 => Box::new(reader.read_u16()?),
		Primitive::U32 => Box::new(reader.read_u32()?),
		Primitive::U64 => Box::new(reader.read_u64()?),
		Primitive::F32 => Box::new(reader.read_f32()?),
		Primitive::F64 => Box::new(reader.read_f64()?),
		Primitive::Char => Box::new(reader.read_char()?),
		Primitive::Str => Box::new(reader.read_str()?),
	})
}

fn encode_optional<F: Format>(
	registry: &TypeRegistry,
	schema: &OptionalSchema,
	value: &dyn Any,
	writer: &mut F::Writer,
) -> Result<()> {
	match (schema.peek)(value)? {
		None => writer.write_null(),
		Some(inner) => {
			writer.mark_present()?;
			let registration = schema.inner.registration(registry)?;
			encode_value::<F>(registry, &registration, inner, writer)
		}
	}
}

fn decode_optional<F: Format>(
	registry: &TypeRegistry,
	schema: &OptionalSchema,
	reader: &mut F::Reader<'_>,
) -> Result<AnyValue> {
	if reader.read_null()? {
		return (schema.wrap)(None);
	}
	let registration = schema.inner.registration(registry)?;
	let inner = decode_value::<F>(registry, &registration, reader)?;
	(schema.wrap)(Some(inner))
}

/// Encode a value whose static type is dynamic: resolve the runtime type,
/// write its identifier as a type tag, then the payload.
fn encode_dynamic<F: Format>(
	registry: &TypeRegistry,
	value: &dyn Any,
	writer: &mut F::Writer,
) -> Result<()> {
	let boxed = view::<Box<dyn Any>>(value)?;
	let inner: &dyn Any = boxed.as_ref();
	let name = registry.name_of_id(inner.type_id(), "encoding a dynamic value")?;
	let registration = registry
		.lookup(&name)
		.ok_or_else(|| Error::unknown(name.as_str(), "encoding a dynamic value"))?;
	let tag = registry.tag_for(&name)?;
	writer.tag_begin(tag.as_str())?;
	encode_value::<F>(registry, &registration, inner, writer)?;
	writer.tag_end()
}

/// Decode a value whose static type is dynamic: read the type tag, resolve
/// it through aliases, the allow-list, and the default-concrete map, then
/// decode the payload with the resolved codec.
fn decode_dynamic<F: Format>(
	registry: &TypeRegistry,
	reader: &mut F::Reader<'_>,
) -> Result<AnyValue> {
	let tag = reader.tag_read()?;
	let (_, registration) = registry.resolve_wire(&tag, "decoding a dynamic value")?;
	let inner = decode_value::<F>(registry, &registration, reader)?;
	reader.tag_end()?;
	let value: AnyValue = Box::new(inner);
	Ok(value)
}
