#![allow(clippy::unwrap_used)]

mod helpers;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use helpers::*;
use polyform_codec::{byte_codec, json_codec, xml_codec, Error};

#[test]
fn missing_fields_are_schema_mismatches() -> Result<()> {
	let json = json_codec()?;
	json.registry().ensure::<Widget>()?;
	match json.decode::<Widget>(r#"{"name":"x","size":1}"#) {
		Err(Error::SchemaMismatch {
			name,
			..
		}) => assert_eq!(name, "demo.Widget"),
		other => panic!("expected a schema mismatch, got {other:?}"),
	}
	Ok(())
}

#[test]
fn unexpected_fields_are_schema_mismatches() -> Result<()> {
	let json = json_codec()?;
	match json.decode::<Widget>(r#"{"name":"x","size":1,"tags":[],"extra":0}"#) {
		Err(Error::SchemaMismatch {
			detail,
			..
		}) => assert!(detail.contains("expected 3 fields")),
		other => panic!("expected a schema mismatch, got {other:?}"),
	}
	Ok(())
}

#[test]
fn wrong_array_lengths_are_schema_mismatches() -> Result<()> {
	let json = json_codec()?;
	match json.decode::<[i32; 3]>("[1,2]") {
		Err(Error::SchemaMismatch {
			detail,
			..
		}) => assert!(detail.contains("expected 3 elements")),
		other => panic!("expected a schema mismatch, got {other:?}"),
	}
	Ok(())
}

#[test]
fn shared_maps_resolve_through_the_argument_protocol_dynamically() -> Result<()> {
	let json = json_codec()?;
	json.registry().ensure::<Arc<HashMap<String, i32>>>()?;
	let payload = r#"{"@type":"ArcHashMap<String,i32>","@value":{"a":1}}"#;
	let ok: Box<dyn std::any::Any> = json.decode(payload)?;
	assert!(ok.downcast_ref::<Arc<HashMap<String, i32>>>().is_some());
	Ok(())
}

#[test]
fn unknown_enum_variants_are_schema_mismatches() -> Result<()> {
	let json = json_codec()?;
	json.registry().ensure::<Color>()?;
	match json.decode::<Color>(r#""Purple""#) {
		Err(Error::SchemaMismatch {
			detail,
			..
		}) => assert!(detail.contains("Purple")),
		other => panic!("expected a schema mismatch, got {other:?}"),
	}
	Ok(())
}

#[test]
fn malformed_json_is_a_wire_error() -> Result<()> {
	let json = json_codec()?;
	assert!(matches!(json.decode::<i32>("{"), Err(Error::WireFormat(_))));
	assert!(matches!(json.decode::<i32>(r#""text""#), Err(Error::WireFormat(_))));
	Ok(())
}

#[test]
fn malformed_xml_is_a_wire_error() -> Result<()> {
	let xml = xml_codec()?;
	assert!(matches!(xml.decode::<i32>("<value>1"), Err(Error::WireFormat(_))));
	assert!(matches!(xml.decode::<i32>("<value>abc</value>"), Err(Error::WireFormat(_))));
	Ok(())
}

#[test]
fn truncated_binary_input_is_a_wire_error() -> Result<()> {
	let bytes = byte_codec()?;
	let encoded = bytes.encode(&"hello".to_string())?;
	assert!(matches!(bytes.decode::<String>(&encoded[..3]), Err(Error::WireFormat(_))));
	Ok(())
}

#[test]
fn invalid_constructed_values_surface_as_reflection_errors() -> Result<()> {
	let json = json_codec()?;
	match json.decode::<chrono::NaiveDate>(r#"{"year":2024,"month":13,"day":1}"#) {
		Err(Error::Reflection(detail)) => assert!(detail.contains("2024-13-01")),
		other => panic!("expected a reflection error, got {other:?}"),
	}
	Ok(())
}

#[test]
fn unregistered_dynamic_values_fail_with_unknown_type() -> Result<()> {
	let json = json_codec()?;
	let value: Box<dyn std::any::Any> = Box::new(sample_widget());
	// Widget was never registered on this core.
	match json.encode(&value) {
		Err(Error::UnknownType {
			..
		}) => {}
		other => panic!("expected an unknown-type error, got {other:?}"),
	}
	Ok(())
}
