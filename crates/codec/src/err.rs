use std::any::type_name;
use std::io;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds surfaced by encode and decode calls.
///
/// Every error names the offending type identifier and the operation that
/// was in flight. Nothing is recovered internally; partial output written
/// before an encode failure is not unwound.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
	/// The type identifier is neither registered nor constructible.
	#[error("unknown type identifier `{name}` while {op}")]
	UnknownType {
		name: String,
		op: &'static str,
	},
	/// The identifier resolved to a type outside the decode allow-list.
	#[error("type `{name}` is not an allowed decode target")]
	DisallowedType {
		name: String,
	},
	/// A field, element, or argument did not line up with the registered schema.
	#[error("schema mismatch for `{name}`; {detail}")]
	SchemaMismatch {
		name: String,
		detail: String,
	},
	/// Malformed JSON, XML, or binary input, surfaced from a format adapter.
	#[error("malformed wire data; {0}")]
	WireFormat(String),
	/// A value could not be viewed, mutated, or constructed as its registered type.
	#[error("reflection failure; {0}")]
	Reflection(String),
	/// An underlying stream error, passed through unchanged.
	#[error("io error; {0}")]
	Io(#[from] io::Error),
}

impl Error {
	pub(crate) fn unknown(name: impl Into<String>, op: &'static str) -> Self {
		Self::UnknownType {
			name: name.into(),
			op,
		}
	}

	pub(crate) fn disallowed(name: impl Into<String>) -> Self {
		Self::DisallowedType {
			name: name.into(),
		}
	}

	pub(crate) fn mismatch(name: impl Into<String>, detail: impl Into<String>) -> Self {
		Self::SchemaMismatch {
			name: name.into(),
			detail: detail.into(),
		}
	}

	pub(crate) fn wire(detail: impl Into<String>) -> Self {
		Self::WireFormat(detail.into())
	}

	/// A failed downcast while viewing an erased value as `T`.
	pub(crate) fn cast<T>() -> Self {
		Self::Reflection(format!("value is not a `{}`", type_name::<T>()))
	}
}
