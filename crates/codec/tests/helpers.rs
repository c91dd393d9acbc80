#![allow(dead_code)]

use polyform_codec::{CodecCore, Encodable, Format, Result, TypeName, TypeRegistry};

/// A plain product type with stored fields.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Widget {
	pub name: String,
	pub size: i32,
	pub tags: Vec<String>,
}

impl Encodable for Widget {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		registry
			.product::<Widget>("demo.Widget")
			.field("name", |w| &w.name, |w, v| w.name = v)
			.field("size", |w| &w.size, |w, v| w.size = v)
			.field("tags", |w| &w.tags, |w, v| w.tags = v)
			.build()
	}
}

/// A product nesting another product, an optional field, and a dynamic
/// field.
#[derive(Default)]
pub struct Gadget {
	pub id: i64,
	pub widget: Widget,
	pub remark: Option<String>,
	pub payload: Option<Box<dyn std::any::Any>>,
}

impl Encodable for Gadget {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		registry
			.product::<Gadget>("demo.Gadget")
			.field("id", |g| &g.id, |g, v| g.id = v)
			.field("widget", |g| &g.widget, |g, v| g.widget = v)
			.field("remark", |g| &g.remark, |g, v| g.remark = v)
			.field("payload", |g| &g.payload, |g, v| g.payload = v)
			.build()
	}
}

/// An externally-constructed type without a default value, registered
/// through the argument-array path.
#[derive(Clone, Debug, PartialEq)]
pub struct Badge {
	code: u32,
	label: String,
}

impl Badge {
	pub fn new(code: u32, label: impl Into<String>) -> Self {
		Self {
			code,
			label: label.into(),
		}
	}
}

impl Encodable for Badge {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		registry
			.arg_array::<Badge>("demo.Badge")
			.field("code", |b| b.code)
			.field("label", |b| b.label.clone())
			.construct(|args| {
				Ok(Badge {
					code: args.take(0)?,
					label: args.take(1)?,
				})
			})
	}
}

/// A plain enumeration of named values.
#[derive(Clone, Debug, PartialEq)]
pub enum Color {
	Red,
	Green,
	Blue,
}

impl Encodable for Color {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		registry
			.enumeration::<Color>("demo.Color")
			.variant("Red", Color::Red)
			.variant("Green", Color::Green)
			.variant("Blue", Color::Blue)
			.build()
	}
}

/// Two fields declared under the same name; the rename policy gives the
/// second one a leading underscore.
#[derive(Default, Debug, PartialEq)]
pub struct Shadowed {
	pub base: String,
	pub own: String,
}

impl Encodable for Shadowed {
	fn register(registry: &TypeRegistry) -> Result<TypeName> {
		if let Some(name) = registry.cached::<Self>() {
			return Ok(name);
		}
		registry
			.product::<Shadowed>("demo.Shadowed")
			.field("name", |s| &s.base, |s, v| s.base = v)
			.field("name", |s| &s.own, |s, v| s.own = v)
			.build()
	}
}

/// Allow the demo package as a decode target on this core.
pub fn allow_demo<F: Format>(core: &CodecCore<F>) {
	core.config_mut().register_allowed_package("demo");
}

pub fn sample_widget() -> Widget {
	Widget {
		name: "rivet".to_string(),
		size: 3,
		tags: vec!["steel".to_string(), "small".to_string()],
	}
}
