//! Wire representation — composable (type, marshal, unmarshal) triples
//! layered over the raw value codec in [`crate::types`].
//!
//! A [`WireRepresentation<T>`] converts between an in-memory `T` and the
//! wire [`Dynamic`] tree. [`schema::Attribute::resolve_representation`]
//! resolves each attribute to one of these at schema-build time, in the
//! three-tier priority order described there; this module supplies the
//! wrappers (`Optional`, `MaybeUnknown`, `Set`) and the built-in lookup that
//! tier falls back to, plus the plug-in point for user conversions such as
//! dates encoded as strings.

use crate::error::{Result, TfplugError};
use crate::schema::AttributeType;
use crate::types::{canonical_set, Dynamic, Unknown};

/// Converts between an in-memory `T` and the wire [`Dynamic`] tree.
pub trait WireRepresentation<T>: Send + Sync {
    fn marshal(&self, value: &T) -> Result<Dynamic>;
    fn unmarshal(&self, wire: &Dynamic) -> Result<T>;
}

/// `string` wire type, mapped to `String`.
pub struct StringRepr;

impl WireRepresentation<String> for StringRepr {
    fn marshal(&self, value: &String) -> Result<Dynamic> {
        Ok(Dynamic::String(value.clone()))
    }

    fn unmarshal(&self, wire: &Dynamic) -> Result<String> {
        match wire {
            Dynamic::String(s) => Ok(s.clone()),
            other => Err(TfplugError::TypeMismatch {
                expected: "string".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }
}

/// `number` wire type, mapped to `f64` — the built-in default (§9 "number
/// type subdivisions"); integer/decimal-string representations are
/// user-supplied, not built in.
pub struct NumberRepr;

impl WireRepresentation<f64> for NumberRepr {
    fn marshal(&self, value: &f64) -> Result<Dynamic> {
        Ok(Dynamic::Number(*value))
    }

    fn unmarshal(&self, wire: &Dynamic) -> Result<f64> {
        match wire {
            Dynamic::Number(n) => Ok(*n),
            other => Err(TfplugError::TypeMismatch {
                expected: "number".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }
}

/// `bool` wire type, mapped to `bool`.
pub struct BoolRepr;

impl WireRepresentation<bool> for BoolRepr {
    fn marshal(&self, value: &bool) -> Result<Dynamic> {
        Ok(Dynamic::Bool(*value))
    }

    fn unmarshal(&self, wire: &Dynamic) -> Result<bool> {
        match wire {
            Dynamic::Bool(b) => Ok(*b),
            other => Err(TfplugError::TypeMismatch {
                expected: "bool".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }
}

/// Wraps an inner representation so a null wire value maps to `None` and a
/// `None` value marshals to null (§8 "Optional null fidelity").
pub struct OptionalRepr<R> {
    inner: R,
}

impl<R> OptionalRepr<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<T, R: WireRepresentation<T>> WireRepresentation<Option<T>> for OptionalRepr<R> {
    fn marshal(&self, value: &Option<T>) -> Result<Dynamic> {
        match value {
            Some(v) => self.inner.marshal(v),
            None => Ok(Dynamic::Null),
        }
    }

    fn unmarshal(&self, wire: &Dynamic) -> Result<Option<T>> {
        match wire {
            Dynamic::Null => Ok(None),
            other => self.inner.unmarshal(other).map(Some),
        }
    }
}

/// A value that may not yet be known during planning — the typed
/// counterpart of [`MaybeUnknownRepr`]'s wrapped `Dynamic::Unknown`.
#[derive(Debug, Clone, PartialEq)]
pub enum MaybeUnknown<T> {
    Known(T),
    Unknown(Unknown),
}

/// Wraps an inner representation so an `Unknown` wire value passes through
/// untouched instead of failing the inner unmarshal.
pub struct MaybeUnknownRepr<R> {
    inner: R,
}

impl<R> MaybeUnknownRepr<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<T, R: WireRepresentation<T>> WireRepresentation<MaybeUnknown<T>> for MaybeUnknownRepr<R> {
    fn marshal(&self, value: &MaybeUnknown<T>) -> Result<Dynamic> {
        match value {
            MaybeUnknown::Known(v) => self.inner.marshal(v),
            MaybeUnknown::Unknown(u) => Ok(Dynamic::Unknown(u.clone())),
        }
    }

    fn unmarshal(&self, wire: &Dynamic) -> Result<MaybeUnknown<T>> {
        match wire {
            Dynamic::Unknown(u) => Ok(MaybeUnknown::Unknown(u.clone())),
            other => self.inner.unmarshal(other).map(MaybeUnknown::Known),
        }
    }
}

/// Lifts an element representation to a `Set` (§4.B): on marshal and
/// unmarshal alike, elements are run through [`canonical_set`] so duplicates
/// are dropped and ordering is deterministic rather than wire order.
pub struct SetRepr<R> {
    element: R,
}

impl<R> SetRepr<R> {
    pub fn new(element: R) -> Self {
        Self { element }
    }
}

impl<T, R: WireRepresentation<T>> WireRepresentation<Vec<T>> for SetRepr<R> {
    fn marshal(&self, value: &Vec<T>) -> Result<Dynamic> {
        let wire_elements = value
            .iter()
            .map(|v| self.element.marshal(v))
            .collect::<Result<Vec<_>>>()?;
        Ok(Dynamic::List(canonical_set(wire_elements)))
    }

    fn unmarshal(&self, wire: &Dynamic) -> Result<Vec<T>> {
        match wire {
            Dynamic::List(items) => canonical_set(items.clone())
                .iter()
                .map(|w| self.element.unmarshal(w))
                .collect(),
            other => Err(TfplugError::TypeMismatch {
                expected: "set".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }
}

/// Validates a `Dynamic` against a declared [`AttributeType`] and passes it
/// through unchanged (canonicalizing `Set` values along the way). This is
/// what the built-in lookup (tier 3 of schema binding) resolves primitive
/// and collection types to, since this framework's handler-facing records
/// are `DynamicValue`-shaped rather than separate Rust structs — there is no
/// further conversion to perform, only shape validation.
struct PassthroughRepr {
    expected: AttributeType,
}

impl PassthroughRepr {
    fn validate(&self, value: &Dynamic) -> Result<()> {
        if matches!(value, Dynamic::Unknown(_) | Dynamic::Null) {
            return Ok(());
        }
        let shape_matches = matches!(
            (&self.expected, value),
            (AttributeType::String, Dynamic::String(_))
                | (AttributeType::Number, Dynamic::Number(_))
                | (AttributeType::Bool, Dynamic::Bool(_))
                | (AttributeType::List(_), Dynamic::List(_))
                | (AttributeType::Set(_), Dynamic::List(_))
                | (AttributeType::Map(_), Dynamic::Map(_))
        );
        if shape_matches {
            Ok(())
        } else {
            Err(TfplugError::TypeMismatch {
                expected: format!("{:?}", self.expected),
                actual: value.type_name().to_string(),
            })
        }
    }

    fn canonicalize(&self, value: &Dynamic) -> Dynamic {
        match (&self.expected, value) {
            (AttributeType::Set(_), Dynamic::List(items)) => Dynamic::List(canonical_set(items.clone())),
            _ => value.clone(),
        }
    }
}

impl WireRepresentation<Dynamic> for PassthroughRepr {
    fn marshal(&self, value: &Dynamic) -> Result<Dynamic> {
        self.validate(value)?;
        Ok(self.canonicalize(value))
    }

    fn unmarshal(&self, wire: &Dynamic) -> Result<Dynamic> {
        self.validate(wire)?;
        Ok(self.canonicalize(wire))
    }
}

/// Tier 3 of schema binding's representation-resolution priority (§4.D): a
/// built-in lookup keyed on the attribute's static wire type. Returns `None`
/// for a bare `Object` type, since objects in this framework are described
/// through `nested_type`, not a flat representation triple — an `Object`
/// attribute with no `nested_type` and no explicit representation has
/// nothing to bind to.
pub fn builtin_representation(attribute_type: &AttributeType) -> Option<Box<dyn WireRepresentation<Dynamic>>> {
    match attribute_type {
        AttributeType::String | AttributeType::Number | AttributeType::Bool => {
            Some(Box::new(PassthroughRepr { expected: attribute_type.clone() }))
        }
        AttributeType::List(inner) | AttributeType::Set(inner) | AttributeType::Map(inner) => {
            builtin_representation(inner)?;
            Some(Box::new(PassthroughRepr { expected: attribute_type.clone() }))
        }
        AttributeType::Object(_) => None,
    }
}

/// Example user-defined representation (§4.C "date as ISO string"): an
/// RFC3339 date string marshaled to and from `time::OffsetDateTime`. The
/// wire type is plain `string`; the date conversion runs after the inner
/// string unmarshal succeeds, the way §4.C describes user conversions
/// plugging in.
pub struct Rfc3339DateRepr;

impl WireRepresentation<time::OffsetDateTime> for Rfc3339DateRepr {
    fn marshal(&self, value: &time::OffsetDateTime) -> Result<Dynamic> {
        let formatted = value
            .format(&time::format_description::well_known::Rfc3339)
            .map_err(|e| TfplugError::EncodingError(format!("date formatting failed: {e}")))?;
        Ok(Dynamic::String(formatted))
    }

    fn unmarshal(&self, wire: &Dynamic) -> Result<time::OffsetDateTime> {
        let raw = StringRepr.unmarshal(wire)?;
        time::OffsetDateTime::parse(&raw, &time::format_description::well_known::Rfc3339).map_err(|e| {
            TfplugError::TypeMismatch {
                expected: "rfc3339 date string".to_string(),
                actual: format!("invalid date string {raw:?}: {e}"),
            }
        })
    }
}
