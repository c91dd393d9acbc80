//! Registrations installed at core construction: primitive aliases and
//! the boxed spellings accepted for them, the decode allow-list for the
//! standard namespaces, default concrete collection families and their
//! abstract wire proxies, string proxies for big numbers and identifiers,
//! and argument-array codecs for the date and time surface.

use std::any::Any;
use std::time::Duration;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use num_bigint::BigInt;
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::err::{Error, Result};
use crate::name::TypeName;
use crate::reflect::Encodable;
use crate::reg::TypeRegistry;

/// The abstract wire family for each concrete collection, and back.
const COLLECTION_FAMILIES: [(&str, &str); 6] = [
	("Vec", "List"),
	("VecDeque", "Deque"),
	("HashSet", "Set"),
	("BTreeSet", "SortedSet"),
	("HashMap", "Map"),
	("BTreeMap", "SortedMap"),
];

const ALLOWED_CLASSES: [&str; 30] = [
	"bool", "i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "f32", "f64", "char", "String",
	"Any", "TypeName", "BoxStr", "ArcStr", "Option", "Vec", "VecDeque", "HashSet", "BTreeSet",
	"HashMap", "BTreeMap", "ArcHashMap", "ArcBTreeMap", "Slice", "ArcSlice", "Array", "Tuple",
];

/// Boxed-name spellings accepted as decode-side aliases.
const ACCEPTED_ALIASES: [(&str, &str); 12] = [
	("bool", "Boolean"),
	("bool", "boolean"),
	("i8", "Byte"),
	("i16", "Short"),
	("i32", "Integer"),
	("i32", "int"),
	("i64", "Long"),
	("i64", "long"),
	("f32", "Float"),
	("f64", "Double"),
	("char", "Character"),
	("Any", "Object"),
];

pub(crate) fn register_all(registry: &TypeRegistry) -> Result<()> {
	{
		let mut config = registry.config_mut();
		for (canonical, alias) in ACCEPTED_ALIASES {
			config.accept_type_alias(canonical, alias);
		}
		for package in ["std", "chrono", "num", "decimal", "uuid"] {
			config.register_allowed_package(package);
		}
		for class in ALLOWED_CLASSES {
			config.register_allowed_class(class);
		}
		for (concrete, wire) in COLLECTION_FAMILIES {
			config.register_allowed_class(wire);
			config.register_default_concrete(wire, concrete);
			config.register_type_proxy(concrete, wire);
		}
	}

	// Scalar codecs are registered up front so that wire identifiers
	// resolve in a process that never mentioned the type statically.
	bool::register(registry)?;
	i8::register(registry)?;
	i16::register(registry)?;
	i32::register(registry)?;
	i64::register(registry)?;
	u8::register(registry)?;
	u16::register(registry)?;
	u32::register(registry)?;
	u64::register(registry)?;
	f32::register(registry)?;
	f64::register(registry)?;
	char::register(registry)?;
	String::register(registry)?;
	<Box<dyn Any>>::register(registry)?;
	TypeName::register(registry)?;
	BigInt::register(registry)?;
	Decimal::register(registry)?;
	Uuid::register(registry)?;
	NaiveDate::register(registry)?;
	NaiveTime::register(registry)?;
	NaiveDateTime::register(registry)?;
	FixedOffset::register(registry)?;
	<DateTime<FixedOffset>>::register(registry)?;
	<DateTime<Utc>>::register(registry)?;
	Duration::register(registry)?;

	debug!("registered built-in codecs and allow-list defaults");
	Ok(())
}

impl Encodable for TypeName {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		Ok(registry.string_proxy::<TypeName>(
			"TypeName",
			|name| name.as_str().to_string(),
			|text| Ok(TypeName::new(text)),
		))
	}
}

impl Encodable for BigInt {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		Ok(registry.string_proxy::<BigInt>(
			"num.BigInt",
			|v| v.to_string(),
			|text| text.parse().map_err(|_| Error::wire(format!("invalid big integer {text:?}"))),
		))
	}
}

impl Encodable for Decimal {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		Ok(registry.string_proxy::<Decimal>(
			"decimal.Decimal",
			|v| v.to_string(),
			|text| text.parse().map_err(|_| Error::wire(format!("invalid decimal {text:?}"))),
		))
	}
}

impl Encodable for Uuid {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		Ok(registry.string_proxy::<Uuid>(
			"uuid.Uuid",
			|v| v.to_string(),
			|text| text.parse().map_err(|_| Error::wire(format!("invalid uuid {text:?}"))),
		))
	}
}

impl Encodable for NaiveDate {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		registry
			.arg_array::<NaiveDate>("chrono.NaiveDate")
			.field("year", |d| d.year())
			.field("month", |d| d.month() as i32)
			.field("day", |d| d.day() as i32)
			.construct(|args| {
				let year = args.take::<i32>(0)?;
				let month = args.take::<i32>(1)?;
				let day = args.take::<i32>(2)?;
				NaiveDate::from_ymd_opt(year, month as u32, day as u32).ok_or_else(|| {
					Error::Reflection(format!("no such date {year:04}-{month:02}-{day:02}"))
				})
			})
	}
}

impl Encodable for NaiveTime {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		registry
			.arg_array::<NaiveTime>("chrono.NaiveTime")
			.field("hours", |t| t.hour() as i32)
			.field("mins", |t| t.minute() as i32)
			.field("secs", |t| t.second() as i32)
			.field("nanos", |t| t.nanosecond() as i32)
			.construct(|args| {
				let hours = args.take::<i32>(0)?;
				let mins = args.take::<i32>(1)?;
				let secs = args.take::<i32>(2)?;
				let nanos = args.take::<i32>(3)?;
				NaiveTime::from_hms_nano_opt(hours as u32, mins as u32, secs as u32, nanos as u32)
					.ok_or_else(|| {
						Error::Reflection(format!("no such time {hours:02}:{mins:02}:{secs:02}"))
					})
			})
	}
}

impl Encodable for NaiveDateTime {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		registry
			.arg_array::<NaiveDateTime>("chrono.NaiveDateTime")
			.field("date", |dt| dt.date())
			.field("time", |dt| dt.time())
			.construct(|args| {
				let date = args.take::<NaiveDate>(0)?;
				let time = args.take::<NaiveTime>(1)?;
				Ok(NaiveDateTime::new(date, time))
			})
	}
}

impl Encodable for FixedOffset {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		registry
			.arg_array::<FixedOffset>("chrono.FixedOffset")
			.field("id", |offset| offset.to_string())
			.construct(|args| {
				let id = args.take::<String>(0)?;
				id.parse().map_err(|_| Error::Reflection(format!("invalid zone offset {id:?}")))
			})
	}
}

impl Encodable for DateTime<FixedOffset> {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		let name = TypeName::compose("chrono.DateTime", &[TypeName::new("chrono.FixedOffset")]);
		registry
			.arg_array::<DateTime<FixedOffset>>(name)
			.field("datetime", |dt| dt.naive_local())
			.field("offset", |dt| *dt.offset())
			.construct(|args| {
				let datetime = args.take::<NaiveDateTime>(0)?;
				let offset = args.take::<FixedOffset>(1)?;
				offset.from_local_datetime(&datetime).single().ok_or_else(|| {
					Error::Reflection(format!("ambiguous local datetime {datetime}"))
				})
			})
	}
}

impl Encodable for DateTime<Utc> {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		let name = TypeName::compose("chrono.DateTime", &[TypeName::new("chrono.Utc")]);
		registry
			.arg_array::<DateTime<Utc>>(name)
			.field("datetime", |dt| dt.naive_utc())
			.construct(|args| {
				let datetime = args.take::<NaiveDateTime>(0)?;
				Ok(Utc.from_utc_datetime(&datetime))
			})
	}
}

impl Encodable for Duration {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		registry
			.arg_array::<Duration>("std.time.Duration")
			.field("secs", |d| d.as_secs())
			.field("nanos", |d| d.subsec_nanos())
			.construct(|args| {
				let secs = args.take::<u64>(0)?;
				let nanos = args.take::<u32>(1)?;
				Ok(Duration::new(secs, nanos))
			})
	}
}
