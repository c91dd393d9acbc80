//! The hierarchical XML format. Every value occupies a dedicated element
//! named by its parent context; type tags and null markers are attributes;
//! string-keyed maps use the key as the element name and general maps use
//! the configured entry, key, and value element names.

use crate::cfg::Wire;
use crate::err::Result;
use crate::fmt::Format;

mod element;
mod parser;
mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

/// Marker for the XML wire format.
pub struct Xml;

impl Format for Xml {
	type Output = String;
	type Input = str;
	type Writer = Writer;
	type Reader<'a> = Reader;

	fn writer(wire: &Wire) -> Self::Writer {
		Writer::new(wire.clone())
	}

	fn finish(writer: Self::Writer) -> Result<Self::Output> {
		writer.finish()
	}

	fn reader<'a>(wire: &Wire, input: &'a Self::Input) -> Result<Self::Reader<'a>> {
		let root = parser::parse(input)?;
		Ok(Reader::new(wire.clone(), root))
	}
}
