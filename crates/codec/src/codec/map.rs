//! Map codecs: a string-keyed fast path that encodes entries as fields
//! keyed by name, and a general path that encodes each entry as a
//! two-field key/value record. Decode accumulates through a map proxy or
//! a flattened argument list, so the final concrete map is only
//! materialized once all entries are in.

use std::any::Any;

use crate::codec::{decode_value, encode_value};
use crate::err::Result;
use crate::fmt::{Format, ValueReader, ValueWriter};
use crate::reg::registration::{AnyValue, MapConstruct, MapSchema};
use crate::reg::TypeRegistry;

fn string_keyed(registry: &TypeRegistry, schema: &MapSchema) -> Result<bool> {
	Ok(schema.key.name(registry)?.as_str() == "String")
}

pub(crate) fn encode<F: Format>(
	registry: &TypeRegistry,
	schema: &MapSchema,
	value: &dyn Any,
	writer: &mut F::Writer,
) -> Result<()> {
	let len = (schema.len)(value)?;
	let value_reg = schema.value.registration(registry)?;
	if string_keyed(registry, schema)? {
		writer.map_begin(len)?;
		(schema.iter)(value, &mut |key, entry| {
			writer.map_key(crate::reg::registration::view::<String>(key)?)?;
			encode_value::<F>(registry, &value_reg, entry, writer)
		})?;
		writer.map_end()
	} else {
		let key_reg = schema.key.registration(registry)?;
		writer.entries_begin(len)?;
		(schema.iter)(value, &mut |key, entry| {
			writer.entry_begin()?;
			writer.entry_key()?;
			encode_value::<F>(registry, &key_reg, key, writer)?;
			writer.entry_value()?;
			encode_value::<F>(registry, &value_reg, entry, writer)?;
			writer.entry_end()
		})?;
		writer.entries_end()
	}
}

pub(crate) fn decode<F: Format>(
	registry: &TypeRegistry,
	schema: &MapSchema,
	reader: &mut F::Reader<'_>,
) -> Result<AnyValue> {
	let value_reg = schema.value.registration(registry)?;
	if string_keyed(registry, schema)? {
		reader.map_begin()?;
		let value = match &schema.construct {
			MapConstruct::Proxy(proxy) => {
				let mut proxy = proxy();
				while let Some(key) = reader.map_next_key()? {
					let entry = decode_value::<F>(registry, &value_reg, reader)?;
					proxy.put(Box::new(key), entry)?;
				}
				proxy.construct()
			}
			MapConstruct::Args(from_args) => {
				let mut args = Vec::new();
				while let Some(key) = reader.map_next_key()? {
					let boxed_key: AnyValue = Box::new(key);
					args.push(boxed_key);
					args.push(decode_value::<F>(registry, &value_reg, reader)?);
				}
				from_args(args)?
			}
		};
		reader.map_end()?;
		Ok(value)
	} else {
		let key_reg = schema.key.registration(registry)?;
		let len = reader.entries_begin()?;
		let value = match &schema.construct {
			MapConstruct::Proxy(proxy) => {
				let mut proxy = proxy();
				for _ in 0..len {
					reader.entry_begin()?;
					reader.entry_key()?;
					let key = decode_value::<F>(registry, &key_reg, reader)?;
					reader.entry_value()?;
					let entry = decode_value::<F>(registry, &value_reg, reader)?;
					reader.entry_end()?;
					proxy.put(key, entry)?;
				}
				proxy.construct()
			}
			MapConstruct::Args(from_args) => {
				let mut args = Vec::with_capacity(len * 2);
				for _ in 0..len {
					reader.entry_begin()?;
					reader.entry_key()?;
					args.push(decode_value::<F>(registry, &key_reg, reader)?);
					reader.entry_value()?;
					args.push(decode_value::<F>(registry, &value_reg, reader)?);
					reader.entry_end()?;
				}
				from_args(args)?
			}
		};
		reader.entries_end()?;
		Ok(value)
	}
}
