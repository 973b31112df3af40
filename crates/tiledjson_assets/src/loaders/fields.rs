//! Typed access to fields of a parsed document, with errors that say where
//! the field was expected.

use std::fmt::{self, Write as _};
use std::path::Path;

use serde_json::Value;

use crate::error::{DecodeError, DecodeResult};

/// Location inside a document: where the document came from plus a
/// breadcrumb such as `layers[2].objects[0]`.
#[derive(Debug, Clone)]
pub(crate) struct Scope<'a> {
    origin: Origin<'a>,
    trail: String,
}

#[derive(Debug, Clone, Copy)]
enum Origin<'a> {
    /// Read from this file.
    File(&'a Path),
    /// Handed over already parsed; relative paths resolve in this directory.
    Document(&'a Path),
}

impl<'a> Scope<'a> {
    pub(crate) fn file(file: &'a Path) -> Self {
        Self {
            origin: Origin::File(file),
            trail: String::new(),
        }
    }

    pub(crate) fn document(base_dir: &'a Path) -> Self {
        Self {
            origin: Origin::Document(base_dir),
            trail: String::new(),
        }
    }

    /// Scope of element `index` of array field `field`.
    pub(crate) fn index(&self, field: &str, index: usize) -> Scope<'a> {
        let mut trail = self.trail.clone();
        if !trail.is_empty() {
            trail.push('.');
        }
        let _ = write!(trail, "{field}[{index}]");
        Scope {
            origin: self.origin,
            trail,
        }
    }

    pub(crate) fn describe(&self) -> String {
        self.to_string()
    }

    pub(crate) fn missing(&self, field: &'static str) -> DecodeError {
        DecodeError::MissingField {
            field,
            scope: self.describe(),
        }
    }

    pub(crate) fn invalid(&self, field: &'static str, reason: impl Into<String>) -> DecodeError {
        DecodeError::InvalidField {
            field,
            scope: self.describe(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Origin<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::File(file) => write!(f, "{}", file.display()),
            Origin::Document(dir) if dir.as_os_str().is_empty() => f.write_str("<document>"),
            Origin::Document(dir) => write!(f, "<document in {}>", dir.display()),
        }
    }
}

impl fmt::Display for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.trail.is_empty() {
            write!(f, "{}", self.origin)
        } else {
            write!(f, "{}: {}", self.origin, self.trail)
        }
    }
}

/// A field counts as absent when the key is missing or its value is `null`.
pub(crate) fn field<'v>(doc: &'v Value, name: &str) -> Option<&'v Value> {
    doc.get(name).filter(|v| !v.is_null())
}

pub(crate) fn require<'v>(
    doc: &'v Value,
    name: &'static str,
    scope: &Scope<'_>,
) -> DecodeResult<&'v Value> {
    field(doc, name).ok_or_else(|| scope.missing(name))
}

/// Integer value of a number field. Fractional numbers truncate toward zero.
pub(crate) fn to_i32(value: &Value, name: &'static str, scope: &Scope<'_>) -> DecodeResult<i32> {
    if let Some(i) = value.as_i64() {
        return i32::try_from(i).map_err(|_| scope.invalid(name, format!("{i} is out of range")));
    }
    match value.as_f64() {
        Some(f) if f.is_finite() && f >= i32::MIN as f64 && f <= i32::MAX as f64 => {
            Ok(f.trunc() as i32)
        }
        Some(f) => Err(scope.invalid(name, format!("{f} is out of range"))),
        None => Err(scope.invalid(name, format!("expected a number, found {value}"))),
    }
}

pub(crate) fn require_i32(doc: &Value, name: &'static str, scope: &Scope<'_>) -> DecodeResult<i32> {
    to_i32(require(doc, name, scope)?, name, scope)
}

fn to_non_negative_i32(value: &Value, name: &'static str, scope: &Scope<'_>) -> DecodeResult<i32> {
    let i = to_i32(value, name, scope)?;
    if i < 0 {
        return Err(scope.invalid(name, format!("{i} must not be negative")));
    }
    Ok(i)
}

/// Sizes and offsets: any number that truncates to zero or more.
pub(crate) fn require_non_negative_i32(
    doc: &Value,
    name: &'static str,
    scope: &Scope<'_>,
) -> DecodeResult<i32> {
    to_non_negative_i32(require(doc, name, scope)?, name, scope)
}

pub(crate) fn optional_non_negative_i32(
    doc: &Value,
    name: &'static str,
    scope: &Scope<'_>,
) -> DecodeResult<Option<i32>> {
    field(doc, name)
        .map(|v| to_non_negative_i32(v, name, scope))
        .transpose()
}

fn to_u32(value: &Value, name: &'static str, scope: &Scope<'_>) -> DecodeResult<u32> {
    let i = to_i32(value, name, scope)?;
    u32::try_from(i).map_err(|_| scope.invalid(name, format!("{i} must not be negative")))
}

pub(crate) fn require_u32(doc: &Value, name: &'static str, scope: &Scope<'_>) -> DecodeResult<u32> {
    to_u32(require(doc, name, scope)?, name, scope)
}

pub(crate) fn optional_u32(
    doc: &Value,
    name: &'static str,
    scope: &Scope<'_>,
) -> DecodeResult<Option<u32>> {
    field(doc, name).map(|v| to_u32(v, name, scope)).transpose()
}

pub(crate) fn require_str<'v>(
    doc: &'v Value,
    name: &'static str,
    scope: &Scope<'_>,
) -> DecodeResult<&'v str> {
    let value = require(doc, name, scope)?;
    value
        .as_str()
        .ok_or_else(|| scope.invalid(name, format!("expected a string, found {value}")))
}

pub(crate) fn optional_str<'v>(
    doc: &'v Value,
    name: &'static str,
    scope: &Scope<'_>,
) -> DecodeResult<Option<&'v str>> {
    field(doc, name)
        .map(|value| {
            value
                .as_str()
                .ok_or_else(|| scope.invalid(name, format!("expected a string, found {value}")))
        })
        .transpose()
}

pub(crate) fn optional_bool(
    doc: &Value,
    name: &'static str,
    scope: &Scope<'_>,
) -> DecodeResult<Option<bool>> {
    field(doc, name)
        .map(|value| {
            value
                .as_bool()
                .ok_or_else(|| scope.invalid(name, format!("expected a boolean, found {value}")))
        })
        .transpose()
}

pub(crate) fn require_array<'v>(
    doc: &'v Value,
    name: &'static str,
    scope: &Scope<'_>,
) -> DecodeResult<&'v [Value]> {
    let value = require(doc, name, scope)?;
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| scope.invalid(name, "expected an array"))
}

pub(crate) fn optional_array<'v>(
    doc: &'v Value,
    name: &'static str,
    scope: &Scope<'_>,
) -> DecodeResult<&'v [Value]> {
    match field(doc, name) {
        None => Ok(&[]),
        Some(value) => value
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| scope.invalid(name, "expected an array")),
    }
}
