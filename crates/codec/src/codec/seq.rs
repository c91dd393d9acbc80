//! Sequence and fixed-array codecs, parameterized over the format adapter.
//! Sequences either grow element by element or collect into an argument
//! list for immutable variants; arrays check the element count.

use std::any::Any;

use crate::codec::{decode_value, encode_value};
use crate::err::{Error, Result};
use crate::fmt::{Format, ValueReader, ValueWriter};
use crate::reg::registration::{AnyValue, ArraySchema, SeqConstruct, SeqSchema};
use crate::reg::TypeRegistry;

pub(crate) fn encode_seq<F: Format>(
	registry: &TypeRegistry,
	schema: &SeqSchema,
	value: &dyn Any,
	writer: &mut F::Writer,
) -> Result<()> {
	let registration = schema.elem.registration(registry)?;
	writer.seq_begin((schema.len)(value)?)?;
	(schema.iter)(value, &mut |item| {
		writer.seq_elem()?;
		encode_value::<F>(registry, &registration, item, writer)
	})?;
	writer.seq_end()
}

pub(crate) fn decode_seq<F: Format>(
	registry: &TypeRegistry,
	schema: &SeqSchema,
	reader: &mut F::Reader<'_>,
) -> Result<AnyValue> {
	let len = reader.seq_begin()?;
	let registration = schema.elem.registration(registry)?;
	let value = match &schema.construct {
		SeqConstruct::Push {
			new,
			push,
		} => {
			let mut value = new(len);
			for _ in 0..len {
				reader.seq_elem()?;
				let item = decode_value::<F>(registry, &registration, reader)?;
				push(value.as_mut(), item)?;
			}
			value
		}
		SeqConstruct::Args(from_args) => {
			let mut items = Vec::with_capacity(len);
			for _ in 0..len {
				reader.seq_elem()?;
				items.push(decode_value::<F>(registry, &registration, reader)?);
			}
			from_args(items)?
		}
	};
	reader.seq_end()?;
	Ok(value)
}

pub(crate) fn encode_array<F: Format>(
	registry: &TypeRegistry,
	schema: &ArraySchema,
	value: &dyn Any,
	writer: &mut F::Writer,
) -> Result<()> {
	let registration = schema.elem.registration(registry)?;
	writer.seq_begin(schema.len)?;
	(schema.iter)(value, &mut |item| {
		writer.seq_elem()?;
		encode_value::<F>(registry, &registration, item, writer)
	})?;
	writer.seq_end()
}

pub(crate) fn decode_array<F: Format>(
	registry: &TypeRegistry,
	schema: &ArraySchema,
	reader: &mut F::Reader<'_>,
) -> Result<AnyValue> {
	let len = reader.seq_begin()?;
	if len != schema.len {
		return Err(Error::mismatch(
			schema.name.as_str(),
			format!("expected {} elements, found {len}", schema.len),
		));
	}
	let registration = schema.elem.registration(registry)?;
	let mut items = Vec::with_capacity(len);
	for _ in 0..len {
		reader.seq_elem()?;
		items.push(decode_value::<F>(registry, &registration, reader)?);
	}
	let value = (schema.from_args)(items)?;
	reader.seq_end()?;
	Ok(value)
}
