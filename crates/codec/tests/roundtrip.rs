#![allow(clippy::unwrap_used)]

mod helpers;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use helpers::*;
use num_bigint::BigInt;
use polyform_codec::{byte_codec, json_codec, xml_codec};
use rust_decimal::Decimal;
use uuid::Uuid;

#[test]
fn primitives_round_trip_in_every_format() -> Result<()> {
	let json = json_codec()?;
	let xml = xml_codec()?;
	let bytes = byte_codec()?;

	assert_eq!(json.decode::<i32>(&json.encode(&-42)?)?, -42);
	assert_eq!(xml.decode::<i32>(&xml.encode(&-42)?)?, -42);
	assert_eq!(bytes.decode::<i32>(&bytes.encode(&-42)?)?, -42);

	assert_eq!(json.decode::<u64>(&json.encode(&u64::MAX)?)?, u64::MAX);
	assert_eq!(bytes.decode::<u64>(&bytes.encode(&u64::MAX)?)?, u64::MAX);

	assert_eq!(json.decode::<f64>(&json.encode(&1.25)?)?, 1.25);
	assert_eq!(xml.decode::<f64>(&xml.encode(&1.25)?)?, 1.25);
	assert_eq!(bytes.decode::<f64>(&bytes.encode(&1.25)?)?, 1.25);

	assert_eq!(json.decode::<bool>(&json.encode(&true)?)?, true);
	assert_eq!(xml.decode::<char>(&xml.encode(&'é')?)?, 'é');
	assert_eq!(bytes.decode::<char>(&bytes.encode(&'é')?)?, 'é');

	let text = "hello & <world>".to_string();
	assert_eq!(json.decode::<String>(&json.encode(&text)?)?, text);
	assert_eq!(xml.decode::<String>(&xml.encode(&text)?)?, text);
	assert_eq!(bytes.decode::<String>(&bytes.encode(&text)?)?, text);
	Ok(())
}

#[test]
fn options_round_trip() -> Result<()> {
	let json = json_codec()?;
	let xml = xml_codec()?;
	let bytes = byte_codec()?;

	assert_eq!(json.decode::<Option<i32>>(&json.encode(&Some(7))?)?, Some(7));
	assert_eq!(json.decode::<Option<i32>>(&json.encode(&None::<i32>)?)?, None);
	assert_eq!(json.encode(&None::<i32>)?, "null");

	assert_eq!(xml.decode::<Option<i32>>(&xml.encode(&Some(7))?)?, Some(7));
	assert_eq!(xml.decode::<Option<i32>>(&xml.encode(&None::<i32>)?)?, None);

	assert_eq!(bytes.decode::<Option<i32>>(&bytes.encode(&Some(7))?)?, Some(7));
	assert_eq!(bytes.decode::<Option<i32>>(&bytes.encode(&None::<i32>)?)?, None);
	assert_eq!(bytes.encode(&None::<i32>)?, vec![0x00]);
	assert_eq!(bytes.encode(&Some(7i32))?, vec![0x01, 0x00, 0x00, 0x00, 0x07]);
	Ok(())
}

#[test]
fn sequences_preserve_order() -> Result<()> {
	let values = vec![3i64, 1, 2];
	let json = json_codec()?;
	let xml = xml_codec()?;
	let bytes = byte_codec()?;
	assert_eq!(json.decode::<Vec<i64>>(&json.encode(&values)?)?, values);
	assert_eq!(xml.decode::<Vec<i64>>(&xml.encode(&values)?)?, values);
	assert_eq!(bytes.decode::<Vec<i64>>(&bytes.encode(&values)?)?, values);

	let deque: VecDeque<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
	assert_eq!(json.decode::<VecDeque<String>>(&json.encode(&deque)?)?, deque);
	Ok(())
}

#[test]
fn list_of_i32_bytes_form_is_length_prefixed_big_endian() -> Result<()> {
	let bytes = byte_codec()?;
	let encoded = bytes.encode(&vec![1i32, 2, 3])?;
	assert_eq!(
		encoded,
		vec![
			0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00,
			0x00, 0x03,
		]
	);
	Ok(())
}

#[test]
fn sets_and_fixed_arrays_round_trip() -> Result<()> {
	let json = json_codec()?;
	let bytes = byte_codec()?;

	let set: HashSet<i32> = [4, 5, 6].into_iter().collect();
	assert_eq!(json.decode::<HashSet<i32>>(&json.encode(&set)?)?, set);

	let sorted: BTreeSet<String> = ["b", "a"].iter().map(|s| s.to_string()).collect();
	assert_eq!(json.decode::<BTreeSet<String>>(&json.encode(&sorted)?)?, sorted);

	let array = [1.5f64, 2.5, 3.5];
	assert_eq!(json.decode::<[f64; 3]>(&json.encode(&array)?)?, array);
	assert_eq!(bytes.decode::<[f64; 3]>(&bytes.encode(&array)?)?, array);
	Ok(())
}

#[test]
fn immutable_sequences_use_the_collect_then_construct_path() -> Result<()> {
	let json = json_codec()?;
	let boxed: Box<[i32]> = vec![9, 8, 7].into_boxed_slice();
	assert_eq!(json.decode::<Box<[i32]>>(&json.encode(&boxed)?)?, boxed);

	let shared: Arc<[String]> = vec!["x".to_string(), "y".to_string()].into();
	assert_eq!(json.decode::<Arc<[String]>>(&json.encode(&shared)?)?, shared);
	Ok(())
}

#[test]
fn string_keyed_maps_round_trip_in_every_format() -> Result<()> {
	let mut map = HashMap::new();
	map.insert("a".to_string(), 1i32);
	map.insert("b".to_string(), 2i32);

	let json = json_codec()?;
	let xml = xml_codec()?;
	let bytes = byte_codec()?;
	assert_eq!(json.decode::<HashMap<String, i32>>(&json.encode(&map)?)?, map);
	assert_eq!(xml.decode::<HashMap<String, i32>>(&xml.encode(&map)?)?, map);
	assert_eq!(bytes.decode::<HashMap<String, i32>>(&bytes.encode(&map)?)?, map);
	Ok(())
}

#[test]
fn string_keyed_maps_encode_entries_as_fields() -> Result<()> {
	let mut map = BTreeMap::new();
	map.insert("a".to_string(), 1i32);
	map.insert("b".to_string(), 2i32);

	let json = json_codec()?;
	assert_eq!(json.encode(&map)?, r#"{"a":1,"b":2}"#);

	let xml = xml_codec()?;
	assert_eq!(
		xml.encode(&map)?,
		"<?xml version=\"1.0\" encoding=\"UTF-8\"?><value><a>1</a><b>2</b></value>"
	);
	Ok(())
}

#[test]
fn general_maps_encode_key_value_entries() -> Result<()> {
	let mut map = BTreeMap::new();
	map.insert(10i32, "ten".to_string());
	map.insert(20i32, "twenty".to_string());

	let json = json_codec()?;
	let encoded = json.encode(&map)?;
	assert_eq!(encoded, r#"[{"@key":10,"@value":"ten"},{"@key":20,"@value":"twenty"}]"#);
	assert_eq!(json.decode::<BTreeMap<i32, String>>(&encoded)?, map);

	let xml = xml_codec()?;
	assert_eq!(xml.decode::<BTreeMap<i32, String>>(&xml.encode(&map)?)?, map);

	let bytes = byte_codec()?;
	assert_eq!(bytes.decode::<BTreeMap<i32, String>>(&bytes.encode(&map)?)?, map);
	Ok(())
}

#[test]
fn shared_maps_round_trip_through_the_argument_protocol() -> Result<()> {
	let json = json_codec()?;
	let mut inner = HashMap::new();
	inner.insert("k".to_string(), 5i64);
	let map = Arc::new(inner);
	assert_eq!(json.decode::<Arc<HashMap<String, i64>>>(&json.encode(&map)?)?, map);

	let mut sorted = BTreeMap::new();
	sorted.insert(2i32, "b".to_string());
	sorted.insert(1i32, "a".to_string());
	let sorted = Arc::new(sorted);
	assert_eq!(json.decode::<Arc<BTreeMap<i32, String>>>(&json.encode(&sorted)?)?, sorted);
	Ok(())
}

#[test]
fn products_round_trip_in_every_format() -> Result<()> {
	let widget = sample_widget();

	let json = json_codec()?;
	let xml = xml_codec()?;
	let bytes = byte_codec()?;
	assert_eq!(json.decode::<Widget>(&json.encode(&widget)?)?, widget);
	assert_eq!(xml.decode::<Widget>(&xml.encode(&widget)?)?, widget);
	assert_eq!(bytes.decode::<Widget>(&bytes.encode(&widget)?)?, widget);
	Ok(())
}

#[test]
fn product_fields_encode_in_declaration_order() -> Result<()> {
	let json = json_codec()?;
	let encoded = json.encode(&sample_widget())?;
	assert_eq!(encoded, r#"{"name":"rivet","size":3,"tags":["steel","small"]}"#);
	Ok(())
}

#[test]
fn nested_products_with_optional_fields_round_trip() -> Result<()> {
	let json = json_codec()?;
	let gadget = Gadget {
		id: 77,
		widget: sample_widget(),
		remark: Some("fragile".to_string()),
		payload: None,
	};
	let back: Gadget = json.decode(&json.encode(&gadget)?)?;
	assert_eq!(back.id, 77);
	assert_eq!(back.widget, sample_widget());
	assert_eq!(back.remark.as_deref(), Some("fragile"));
	assert!(back.payload.is_none());
	Ok(())
}

#[test]
fn arg_array_products_round_trip() -> Result<()> {
	let badge = Badge::new(4011, "visitor");
	let json = json_codec()?;
	let xml = xml_codec()?;
	let bytes = byte_codec()?;
	assert_eq!(json.decode::<Badge>(&json.encode(&badge)?)?, badge);
	assert_eq!(xml.decode::<Badge>(&xml.encode(&badge)?)?, badge);
	assert_eq!(bytes.decode::<Badge>(&bytes.encode(&badge)?)?, badge);
	Ok(())
}

#[test]
fn tuples_round_trip_positionally() -> Result<()> {
	let value = (7i32, "seven".to_string());
	let json = json_codec()?;
	assert_eq!(json.encode(&value)?, r#"{"_0":7,"_1":"seven"}"#);
	assert_eq!(json.decode::<(i32, String)>(&json.encode(&value)?)?, value);

	let triple = (1u8, 2i64, "three".to_string());
	let bytes = byte_codec()?;
	assert_eq!(bytes.decode::<(u8, i64, String)>(&bytes.encode(&triple)?)?, triple);
	Ok(())
}

#[test]
fn enums_encode_as_variant_names() -> Result<()> {
	let json = json_codec()?;
	assert_eq!(json.encode(&Color::Green)?, r#""Green""#);
	assert_eq!(json.decode::<Color>(r#""Blue""#)?, Color::Blue);

	let bytes = byte_codec()?;
	assert_eq!(bytes.decode::<Color>(&bytes.encode(&Color::Red)?)?, Color::Red);
	Ok(())
}

#[test]
fn big_numbers_and_identifiers_use_string_proxies() -> Result<()> {
	let json = json_codec()?;

	let big: BigInt = "123456789012345678901234567890".parse()?;
	assert_eq!(json.encode(&big)?, r#""123456789012345678901234567890""#);
	assert_eq!(json.decode::<BigInt>(&json.encode(&big)?)?, big);

	let dec: Decimal = "1234.5678".parse()?;
	assert_eq!(json.decode::<Decimal>(&json.encode(&dec)?)?, dec);

	let id = Uuid::new_v4();
	assert_eq!(json.decode::<Uuid>(&json.encode(&id)?)?, id);

	let bytes = byte_codec()?;
	assert_eq!(bytes.decode::<BigInt>(&bytes.encode(&big)?)?, big);
	Ok(())
}

#[test]
fn date_encodes_as_calendar_fields() -> Result<()> {
	let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
	let json = json_codec()?;
	assert_eq!(json.encode(&date)?, r#"{"year":2024,"month":3,"day":15}"#);
	assert_eq!(json.decode::<NaiveDate>(&json.encode(&date)?)?, date);
	Ok(())
}

#[test]
fn date_time_surface_round_trips() -> Result<()> {
	let json = json_codec()?;
	let xml = xml_codec()?;
	let bytes = byte_codec()?;

	let time = NaiveTime::from_hms_nano_opt(23, 59, 4, 12_345_678).unwrap();
	assert_eq!(json.decode::<NaiveTime>(&json.encode(&time)?)?, time);

	let datetime = NaiveDateTime::new(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap(), time);
	assert_eq!(json.decode::<NaiveDateTime>(&json.encode(&datetime)?)?, datetime);
	assert_eq!(xml.decode::<NaiveDateTime>(&xml.encode(&datetime)?)?, datetime);
	assert_eq!(bytes.decode::<NaiveDateTime>(&bytes.encode(&datetime)?)?, datetime);

	let offset = FixedOffset::east_opt(2 * 3600).unwrap();
	assert_eq!(json.decode::<FixedOffset>(&json.encode(&offset)?)?, offset);

	let zoned = offset.from_local_datetime(&datetime).unwrap();
	assert_eq!(json.decode::<chrono::DateTime<FixedOffset>>(&json.encode(&zoned)?)?, zoned);

	let utc = Utc.with_ymd_and_hms(2020, 6, 1, 12, 30, 0).unwrap();
	assert_eq!(json.decode::<chrono::DateTime<Utc>>(&json.encode(&utc)?)?, utc);

	let span = Duration::new(90, 500);
	assert_eq!(json.decode::<Duration>(&json.encode(&span)?)?, span);
	assert_eq!(bytes.decode::<Duration>(&bytes.encode(&span)?)?, span);
	Ok(())
}

#[test]
fn boxed_strings_round_trip_as_strings() -> Result<()> {
	let json = json_codec()?;
	let boxed: Box<str> = "abc".into();
	assert_eq!(json.encode(&boxed)?, r#""abc""#);
	assert_eq!(json.decode::<Box<str>>(&json.encode(&boxed)?)?, boxed);

	let shared: Arc<str> = "xyz".into();
	assert_eq!(json.decode::<Arc<str>>(&json.encode(&shared)?)?, shared);
	Ok(())
}
