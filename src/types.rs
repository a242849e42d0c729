//! Core type system for tfplugin6
//!
//! Dynamic values, the DynamicValue wire envelope, attribute paths, and
//! diagnostics — the vocabulary every RPC in [`crate::grpc`] is built from.

use crate::error::{Result, TfplugError};
use std::collections::HashMap;

/// A Terraform value of any type.
///
/// Always prefer the type-safe accessors on [`DynamicValue`] over matching
/// directly — they carry path information into error messages.
#[derive(Debug, Clone, PartialEq)]
pub enum Dynamic {
    Null,
    Bool(bool),
    /// All numbers are f64; integer and decimal-string representations are
    /// layered on top by user-supplied wire representations, not here.
    Number(f64),
    String(String),
    List(Vec<Dynamic>),
    /// Objects and maps both wire as msgpack maps; Terraform does not
    /// distinguish them below the schema layer.
    Map(HashMap<String, Dynamic>),
    Unknown(Unknown),
}

/// A value not yet known during planning.
#[derive(Debug, Clone, PartialEq)]
pub enum Unknown {
    /// ext code 0: no refinements attached.
    Unrefined,
    /// ext code 12: refinements present. The payload is opaque — preserved
    /// byte-for-byte, never interpreted.
    Refined(Vec<u8>),
    /// Any other ext code. Not produced by this server, but a host may send
    /// one; preserved verbatim, original code included, so it round-trips
    /// rather than silently becoming a code-12 `Refined`.
    Opaque { code: i8, payload: Vec<u8> },
}

const EXT_UNKNOWN_UNREFINED: i8 = 0;
const EXT_UNKNOWN_REFINED: i8 = 12;

impl Dynamic {
    pub fn unrefined_unknown() -> Self {
        Dynamic::Unknown(Unknown::Unrefined)
    }

    pub fn refined_unknown(payload: Vec<u8>) -> Self {
        Dynamic::Unknown(Unknown::Refined(payload))
    }

    pub fn opaque_unknown(code: i8, payload: Vec<u8>) -> Self {
        Dynamic::Unknown(Unknown::Opaque { code, payload })
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Number(_) => "number",
            Dynamic::String(_) => "string",
            Dynamic::List(_) => "list",
            Dynamic::Map(_) => "map",
            Dynamic::Unknown(_) => "unknown",
        }
    }

    /// Convert to an [`rmpv::Value`] honoring the Unknown ext-type encoding.
    /// This is the sole place that knows about ext codes 0 and 12.
    fn to_msgpack_value(&self) -> rmpv::Value {
        match self {
            Dynamic::Null => rmpv::Value::Nil,
            Dynamic::Bool(b) => rmpv::Value::Boolean(*b),
            Dynamic::Number(n) => rmpv::Value::F64(*n),
            Dynamic::String(s) => rmpv::Value::String(s.clone().into()),
            Dynamic::List(items) => {
                rmpv::Value::Array(items.iter().map(Dynamic::to_msgpack_value).collect())
            }
            Dynamic::Map(map) => {
                let mut entries: Vec<(String, &Dynamic)> =
                    map.iter().map(|(k, v)| (k.clone(), v)).collect();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                rmpv::Value::Map(
                    entries
                        .into_iter()
                        .map(|(k, v)| (rmpv::Value::String(k.into()), v.to_msgpack_value()))
                        .collect(),
                )
            }
            Dynamic::Unknown(Unknown::Unrefined) => {
                rmpv::Value::Ext(EXT_UNKNOWN_UNREFINED, vec![])
            }
            Dynamic::Unknown(Unknown::Refined(payload)) => {
                rmpv::Value::Ext(EXT_UNKNOWN_REFINED, payload.clone())
            }
            Dynamic::Unknown(Unknown::Opaque { code, payload }) => {
                rmpv::Value::Ext(*code, payload.clone())
            }
        }
    }

    fn from_msgpack_value(value: &rmpv::Value) -> Result<Self> {
        match value {
            rmpv::Value::Nil => Ok(Dynamic::Null),
            rmpv::Value::Boolean(b) => Ok(Dynamic::Bool(*b)),
            rmpv::Value::Integer(n) => n
                .as_f64()
                .map(Dynamic::Number)
                .ok_or_else(|| TfplugError::TypeMismatch {
                    expected: "number".to_string(),
                    actual: "integer out of f64 range".to_string(),
                }),
            rmpv::Value::F32(n) => Ok(Dynamic::Number(*n as f64)),
            rmpv::Value::F64(n) => Ok(Dynamic::Number(*n)),
            rmpv::Value::String(s) => {
                let s = s.as_str().ok_or_else(|| TfplugError::TypeMismatch {
                    expected: "utf-8 string".to_string(),
                    actual: "non-utf-8 msgpack string".to_string(),
                })?;
                Ok(Dynamic::String(s.to_string()))
            }
            rmpv::Value::Array(items) => {
                let items = items
                    .iter()
                    .map(Dynamic::from_msgpack_value)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Dynamic::List(items))
            }
            rmpv::Value::Map(entries) => {
                let mut map = HashMap::with_capacity(entries.len());
                for (k, v) in entries {
                    let key = k.as_str().ok_or_else(|| TfplugError::TypeMismatch {
                        expected: "string key".to_string(),
                        actual: "non-string msgpack map key".to_string(),
                    })?;
                    map.insert(key.to_string(), Dynamic::from_msgpack_value(v)?);
                }
                Ok(Dynamic::Map(map))
            }
            rmpv::Value::Ext(EXT_UNKNOWN_UNREFINED, _) => Ok(Dynamic::unrefined_unknown()),
            rmpv::Value::Ext(EXT_UNKNOWN_REFINED, payload) => {
                Ok(Dynamic::refined_unknown(payload.clone()))
            }
            rmpv::Value::Ext(code, payload) => {
                tracing::debug!("decoding opaque msgpack ext code {code}, {} bytes", payload.len());
                Ok(Dynamic::opaque_unknown(*code, payload.clone()))
            }
            rmpv::Value::Binary(_) => Err(TfplugError::TypeMismatch {
                expected: "terraform value".to_string(),
                actual: "msgpack binary".to_string(),
            }),
        }
    }

    /// JSON never represents Unknown — the protocol disallows it on this path.
    fn to_json_value(&self) -> Result<serde_json::Value> {
        match self {
            Dynamic::Null => Ok(serde_json::Value::Null),
            Dynamic::Bool(b) => Ok(serde_json::Value::Bool(*b)),
            Dynamic::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .ok_or_else(|| TfplugError::EncodingError(format!("non-finite number {n}"))),
            Dynamic::String(s) => Ok(serde_json::Value::String(s.clone())),
            Dynamic::List(items) => Ok(serde_json::Value::Array(
                items
                    .iter()
                    .map(Dynamic::to_json_value)
                    .collect::<Result<Vec<_>>>()?,
            )),
            Dynamic::Map(map) => {
                let mut obj = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    obj.insert(k.clone(), v.to_json_value()?);
                }
                Ok(serde_json::Value::Object(obj))
            }
            Dynamic::Unknown(_) => Err(TfplugError::EncodingError(
                "cannot encode an unknown value as json".to_string(),
            )),
        }
    }

    fn from_json_value(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Dynamic::Null,
            serde_json::Value::Bool(b) => Dynamic::Bool(*b),
            serde_json::Value::Number(n) => Dynamic::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Dynamic::String(s.clone()),
            serde_json::Value::Array(items) => {
                Dynamic::List(items.iter().map(Dynamic::from_json_value).collect())
            }
            serde_json::Value::Object(obj) => Dynamic::Map(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Dynamic::from_json_value(v)))
                    .collect(),
            ),
        }
    }
}

/// The wire envelope exchanged with the host: either a msgpack or a JSON
/// encoding of one [`Dynamic`] value. Decoding prefers msgpack; encoding
/// always produces msgpack.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicValue {
    pub value: Dynamic,
}

impl DynamicValue {
    pub fn new(value: Dynamic) -> Self {
        Self { value }
    }

    pub fn null() -> Self {
        Self { value: Dynamic::Null }
    }

    pub fn unknown() -> Self {
        Self {
            value: Dynamic::unrefined_unknown(),
        }
    }

    pub fn encode_msgpack(&self) -> Result<Vec<u8>> {
        if matches!(self.value, Dynamic::Null) {
            return Ok(vec![]);
        }
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &self.value.to_msgpack_value())
            .map_err(|e| TfplugError::EncodingError(format!("msgpack encoding failed: {e}")))?;
        Ok(buf)
    }

    pub fn decode_msgpack(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Ok(Self::null());
        }
        let mut cursor = data;
        let value = rmpv::decode::read_value(&mut cursor)
            .map_err(|e| TfplugError::DecodingError(format!("msgpack decoding failed: {e}")))?;
        Ok(Self {
            value: Dynamic::from_msgpack_value(&value)?,
        })
    }

    pub fn encode_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.value.to_json_value()?)
            .map_err(|e| TfplugError::EncodingError(format!("json encoding failed: {e}")))
    }

    pub fn decode_json(data: &[u8]) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| TfplugError::DecodingError(format!("json decoding failed: {e}")))?;
        Ok(Self {
            value: Dynamic::from_json_value(&raw),
        })
    }

    /// Decode preferring msgpack, falling back to json — the rule every RPC
    /// handler applies to an incoming [`crate::proto::DynamicValue`].
    pub fn decode_preferring_msgpack(msgpack: &[u8], json: &[u8]) -> Result<Self> {
        if !msgpack.is_empty() {
            Self::decode_msgpack(msgpack)
        } else if !json.is_empty() {
            Self::decode_json(json)
        } else {
            Ok(Self::null())
        }
    }

    pub fn get_string(&self, path: &AttributePath) -> Result<String> {
        match self.navigate_path(path)? {
            Dynamic::String(s) => Ok(s.clone()),
            other => Err(TfplugError::TypeMismatch {
                expected: "string".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }

    pub fn get_number(&self, path: &AttributePath) -> Result<f64> {
        match self.navigate_path(path)? {
            Dynamic::Number(n) => Ok(*n),
            other => Err(TfplugError::TypeMismatch {
                expected: "number".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }

    pub fn get_bool(&self, path: &AttributePath) -> Result<bool> {
        match self.navigate_path(path)? {
            Dynamic::Bool(b) => Ok(*b),
            other => Err(TfplugError::TypeMismatch {
                expected: "bool".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }

    pub fn get_list(&self, path: &AttributePath) -> Result<Vec<Dynamic>> {
        match self.navigate_path(path)? {
            Dynamic::List(l) => Ok(l.clone()),
            other => Err(TfplugError::TypeMismatch {
                expected: "list".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }

    /// Reads a Set-typed attribute. Sets wire identically to lists (a msgpack
    /// array) but carry Set semantics: duplicates are dropped and the result
    /// is sorted into a deterministic canonical order, never the wire order.
    pub fn get_set(&self, path: &AttributePath) -> Result<Vec<Dynamic>> {
        match self.navigate_path(path)? {
            Dynamic::List(l) => Ok(canonical_set(l.clone())),
            other => Err(TfplugError::TypeMismatch {
                expected: "set".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }

    pub fn get_map(&self, path: &AttributePath) -> Result<HashMap<String, Dynamic>> {
        match self.navigate_path(path)? {
            Dynamic::Map(m) => Ok(m.clone()),
            other => Err(TfplugError::TypeMismatch {
                expected: "map".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }

    pub fn set_string(&mut self, path: &AttributePath, value: String) -> Result<()> {
        self.set_value(path, Dynamic::String(value))
    }

    pub fn set_number(&mut self, path: &AttributePath, value: f64) -> Result<()> {
        self.set_value(path, Dynamic::Number(value))
    }

    pub fn set_bool(&mut self, path: &AttributePath, value: bool) -> Result<()> {
        self.set_value(path, Dynamic::Bool(value))
    }

    pub fn set_list(&mut self, path: &AttributePath, value: Vec<Dynamic>) -> Result<()> {
        self.set_value(path, Dynamic::List(value))
    }

    pub fn set_map(&mut self, path: &AttributePath, value: HashMap<String, Dynamic>) -> Result<()> {
        self.set_value(path, Dynamic::Map(value))
    }

    /// Writes a Set-typed attribute, deduplicating and canonically ordering
    /// `value` first (see [`canonical_set`]).
    pub fn set_set(&mut self, path: &AttributePath, value: Vec<Dynamic>) -> Result<()> {
        self.set_value(path, Dynamic::List(canonical_set(value)))
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, Dynamic::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.value, Dynamic::Unknown(_))
    }

    pub fn mark_unknown(&mut self, path: &AttributePath) -> Result<()> {
        self.set_value(path, Dynamic::unrefined_unknown())
    }

    fn navigate_path<'a>(&'a self, path: &AttributePath) -> Result<&'a Dynamic> {
        let mut current = &self.value;
        for step in &path.steps {
            current = match (current, step) {
                (Dynamic::Map(m), AttributePathStep::AttributeName(name)) => {
                    m.get(name).ok_or_else(|| {
                        TfplugError::Custom(format!("attribute '{name}' not found"))
                    })?
                }
                (Dynamic::Map(m), AttributePathStep::ElementKeyString(key)) => {
                    m.get(key)
                        .ok_or_else(|| TfplugError::Custom(format!("key '{key}' not found")))?
                }
                (Dynamic::List(l), AttributePathStep::ElementKeyInt(idx)) => {
                    let idx = *idx as usize;
                    l.get(idx)
                        .ok_or_else(|| TfplugError::Custom(format!("list index {idx} out of bounds")))?
                }
                _ => return Err(TfplugError::Custom("invalid path navigation".to_string())),
            };
        }
        Ok(current)
    }

    fn set_value(&mut self, path: &AttributePath, new_value: Dynamic) -> Result<()> {
        if path.steps.is_empty() {
            self.value = new_value;
            return Ok(());
        }

        if !matches!(self.value, Dynamic::Map(_)) {
            self.value = Dynamic::Map(HashMap::new());
        }

        let mut current = &mut self.value;
        let last_idx = path.steps.len() - 1;

        for (idx, step) in path.steps.iter().enumerate() {
            if idx == last_idx {
                return match (current, step) {
                    (Dynamic::Map(m), AttributePathStep::AttributeName(name)) => {
                        m.insert(name.clone(), new_value);
                        Ok(())
                    }
                    (Dynamic::Map(m), AttributePathStep::ElementKeyString(key)) => {
                        m.insert(key.clone(), new_value);
                        Ok(())
                    }
                    (Dynamic::List(l), AttributePathStep::ElementKeyInt(idx)) => {
                        let idx = *idx as usize;
                        if idx < l.len() {
                            l[idx] = new_value;
                            Ok(())
                        } else {
                            Err(TfplugError::Custom(format!("list index {idx} out of bounds")))
                        }
                    }
                    _ => Err(TfplugError::Custom("invalid path navigation".to_string())),
                };
            }

            current = match (current, step) {
                (Dynamic::Map(m), AttributePathStep::AttributeName(name)) => {
                    m.entry(name.clone()).or_insert_with(|| default_container(path.steps.get(idx + 1)))
                }
                (Dynamic::Map(m), AttributePathStep::ElementKeyString(key)) => {
                    m.entry(key.clone()).or_insert_with(|| default_container(path.steps.get(idx + 1)))
                }
                (Dynamic::List(l), AttributePathStep::ElementKeyInt(idx)) => {
                    let idx = *idx as usize;
                    if idx >= l.len() {
                        return Err(TfplugError::Custom(format!("list index {idx} out of bounds")));
                    }
                    &mut l[idx]
                }
                _ => return Err(TfplugError::Custom("invalid path navigation".to_string())),
            };
        }

        Err(TfplugError::Custom("failed to set value".to_string()))
    }
}

/// Canonicalizes a sequence of values under Set semantics (§4.B): sorted by
/// each element's msgpack encoding, adjacent duplicates dropped. Used by both
/// [`DynamicValue::get_set`]/[`DynamicValue::set_set`] and
/// [`crate::representation::SetRepr`], which lift this to the representation
/// layer so a schema-bound `Set<T>` field gets the same canonicalization.
pub fn canonical_set(elements: Vec<Dynamic>) -> Vec<Dynamic> {
    let mut keyed: Vec<(Vec<u8>, Dynamic)> = elements
        .into_iter()
        .map(|e| {
            let mut buf = Vec::new();
            let _ = rmpv::encode::write_value(&mut buf, &e.to_msgpack_value());
            (buf, e)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.dedup_by(|a, b| a.0 == b.0);
    keyed.into_iter().map(|(_, e)| e).collect()
}

fn default_container(next_step: Option<&AttributePathStep>) -> Dynamic {
    match next_step {
        Some(AttributePathStep::ElementKeyInt(_)) => Dynamic::List(Vec::new()),
        Some(_) => Dynamic::Map(HashMap::new()),
        None => Dynamic::Null,
    }
}

/// An immutable pointer into a nested [`DynamicValue`], used to target
/// diagnostics and to report which field a codec error came from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributePath {
    pub steps: Vec<AttributePathStep>,
}

impl AttributePath {
    pub fn new(name: &str) -> Self {
        Self {
            steps: vec![AttributePathStep::AttributeName(name.to_string())],
        }
    }

    pub fn root() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn attribute(mut self, name: &str) -> Self {
        self.steps.push(AttributePathStep::AttributeName(name.to_string()));
        self
    }

    pub fn index(mut self, idx: i64) -> Self {
        self.steps.push(AttributePathStep::ElementKeyInt(idx));
        self
    }

    pub fn key(mut self, key: &str) -> Self {
        self.steps.push(AttributePathStep::ElementKeyString(key.to_string()));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributePathStep {
    AttributeName(String),
    ElementKeyString(String),
    ElementKeyInt(i64),
}

/// Provider-specific bytes opaque to the host, round-tripped through plan
/// and apply. Encoded with msgpack for the same reason `DynamicValue` is.
#[derive(Debug, Clone, Default)]
pub struct PrivateStateData {
    data: HashMap<String, Vec<u8>>,
}

impl PrivateStateData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_key(&self, key: &str) -> Option<&[u8]> {
        self.data.get(key).map(|v| v.as_slice())
    }

    pub fn set_key(&mut self, key: &str, value: Vec<u8>) {
        self.data.insert(key.to_string(), value);
    }

    pub fn remove_key(&mut self, key: &str) {
        self.data.remove(key);
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        rmp_serde::encode::to_vec(&self.data)
            .map_err(|e| TfplugError::EncodingError(format!("private state encoding failed: {e}")))
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Ok(Self::new());
        }
        let data = rmp_serde::decode::from_slice(data)
            .map_err(|e| TfplugError::DecodingError(format!("private state decoding failed: {e}")))?;
        Ok(Self { data })
    }
}

/// The host's stored state for a resource pending `UpgradeResourceState`.
/// Only the JSON form is handled — flatmap is rejected, see DESIGN.md.
#[derive(Debug, Clone)]
pub struct RawState {
    pub json: Option<Vec<u8>>,
    pub flatmap: Option<HashMap<String, String>>,
}

impl RawState {
    pub fn decode(&self) -> Result<DynamicValue> {
        match &self.json {
            Some(json) => DynamicValue::decode_json(json),
            None => Err(TfplugError::TypeMismatch {
                expected: "json-encoded raw state".to_string(),
                actual: "flatmap raw state".to_string(),
            }),
        }
    }
}

/// An error or warning targeting an optional attribute path.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub summary: String,
    pub detail: String,
    pub attribute: Option<AttributePath>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn with_attribute(mut self, path: AttributePath) -> Self {
        self.attribute = Some(path);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiagnosticSeverity {
    Invalid,
    Error,
    Warning,
}

/// An append-only diagnostics collector, threaded through a single RPC call.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn add_error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.add(Diagnostic::error(summary, detail));
    }

    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.add(Diagnostic::warning(summary, detail));
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }

    pub fn extend(&mut self, other: Vec<Diagnostic>) {
        self.entries.extend(other);
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServerCapabilities {
    pub plan_destroy: bool,
    pub get_provider_schema_optional: bool,
    pub move_resource_state: bool,
}

pub type Config = DynamicValue;
pub type State = DynamicValue;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_value_string_access() {
        let mut dv = DynamicValue::new(Dynamic::Map(HashMap::new()));
        dv.set_string(&AttributePath::new("name"), "test".to_string()).unwrap();
        assert_eq!(dv.get_string(&AttributePath::new("name")).unwrap(), "test");
    }

    #[test]
    fn dynamic_value_nested_access() {
        let mut dv = DynamicValue::new(Dynamic::Map(HashMap::new()));
        let path = AttributePath::new("config").attribute("endpoint");
        dv.set_string(&path, "https://example.com".to_string()).unwrap();
        assert_eq!(dv.get_string(&path).unwrap(), "https://example.com");
    }

    #[test]
    fn private_state_encoding_round_trips() {
        let mut ps = PrivateStateData::new();
        ps.set_key("etag", b"12345".to_vec());
        let encoded = ps.encode().unwrap();
        let decoded = PrivateStateData::decode(&encoded).unwrap();
        assert_eq!(decoded.get_key("etag"), Some(&b"12345"[..]));
    }

    #[test]
    fn string_round_trips_through_msgpack() {
        let dv = DynamicValue::new(Dynamic::String("hi".to_string()));
        let encoded = dv.encode_msgpack().unwrap();
        assert_eq!(encoded, vec![0xa2, 0x68, 0x69]);
        let decoded = DynamicValue::decode_msgpack(&encoded).unwrap();
        assert_eq!(decoded, dv);
    }

    #[test]
    fn unrefined_unknown_round_trips() {
        let dv = DynamicValue::new(Dynamic::unrefined_unknown());
        let encoded = dv.encode_msgpack().unwrap();
        let decoded = DynamicValue::decode_msgpack(&encoded).unwrap();
        assert_eq!(decoded, dv);
        assert!(decoded.is_unknown());
    }

    #[test]
    fn refined_unknown_preserves_payload() {
        let dv = DynamicValue::new(Dynamic::refined_unknown(vec![1, 2, 3]));
        let encoded = dv.encode_msgpack().unwrap();
        let decoded = DynamicValue::decode_msgpack(&encoded).unwrap();
        assert_eq!(decoded, dv);
    }

    #[test]
    fn opaque_unknown_ext_code_round_trips() {
        let dv = DynamicValue::new(Dynamic::opaque_unknown(7, vec![9, 9]));
        let encoded = dv.encode_msgpack().unwrap();
        let decoded = DynamicValue::decode_msgpack(&encoded).unwrap();
        assert_eq!(decoded, dv);
        match decoded.value {
            Dynamic::Unknown(Unknown::Opaque { code, payload }) => {
                assert_eq!(code, 7);
                assert_eq!(payload, vec![9, 9]);
            }
            other => panic!("expected opaque unknown, got {other:?}"),
        }
    }

    #[test]
    fn canonical_set_dedups_and_sorts() {
        let elements = vec![
            Dynamic::String("b".to_string()),
            Dynamic::String("a".to_string()),
            Dynamic::String("b".to_string()),
        ];
        let set = canonical_set(elements);
        assert_eq!(
            set,
            vec![Dynamic::String("a".to_string()), Dynamic::String("b".to_string())]
        );
    }

    #[test]
    fn get_set_dedups_list_backed_wire_value() {
        let mut dv = DynamicValue::new(Dynamic::Map(HashMap::new()));
        let path = AttributePath::new("tags");
        dv.set_set(
            &path,
            vec![
                Dynamic::String("x".to_string()),
                Dynamic::String("x".to_string()),
                Dynamic::String("y".to_string()),
            ],
        )
        .unwrap();
        let tags = dv.get_set(&path).unwrap();
        assert_eq!(
            tags,
            vec![Dynamic::String("x".to_string()), Dynamic::String("y".to_string())]
        );
    }

    #[test]
    fn null_encodes_to_empty_bytes() {
        let dv = DynamicValue::null();
        assert_eq!(dv.encode_msgpack().unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn json_round_trip_rejects_unknown() {
        let dv = DynamicValue::new(Dynamic::unrefined_unknown());
        assert!(dv.encode_json().is_err());
    }

    #[test]
    fn json_round_trip_object() {
        let mut map = HashMap::new();
        map.insert("foo".to_string(), Dynamic::String("bar".to_string()));
        let dv = DynamicValue::new(Dynamic::Map(map));
        let encoded = dv.encode_json().unwrap();
        let decoded = DynamicValue::decode_json(&encoded).unwrap();
        assert_eq!(decoded, dv);
    }

    #[test]
    fn decode_preferring_msgpack_falls_back_to_json() {
        let dv = DynamicValue::new(Dynamic::String("hi".to_string()));
        let json = dv.encode_json().unwrap();
        let decoded = DynamicValue::decode_preferring_msgpack(&[], &json).unwrap();
        assert_eq!(decoded, dv);
    }

    #[test]
    fn raw_state_rejects_flatmap() {
        let raw = RawState {
            json: None,
            flatmap: Some(HashMap::new()),
        };
        assert!(raw.decode().is_err());
    }

    #[test]
    fn diagnostics_filters_by_severity() {
        let mut diags = Diagnostics::new();
        diags.add_error("bad config", "field x is required");
        diags.add_warning("deprecated", "field y will be removed");
        assert_eq!(diags.errors().count(), 1);
        assert_eq!(diags.warnings().count(), 1);
        assert!(diags.has_errors());
    }
}
