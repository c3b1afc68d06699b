//! Attribute-record tokens for attribute-based enforcement.
//!
//! Encoding v1: `ABAC::` followed by a compact JSON object whose keys are
//! sorted ascending by byte order and whose values are JSON scalars. The same
//! record always produces the same token, independent of insertion order or of
//! the client language, so a server matcher can decode it into the identical
//! field map.
//!
//! Any change to this layout must bump [`ABAC_ENCODING_VERSION`] and the test
//! vectors under `tests/vectors/`.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::{CasbinRpcError, Result};

/// Token prefix understood by the server.
pub const ABAC_PREFIX: &str = "ABAC::";

/// Version of the token layout produced by [`AttributeRecord::encode`].
pub const ABAC_ENCODING_VERSION: u32 = 1;

/// Field-named record passed as a single enforcement parameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeRecord {
    fields: BTreeMap<String, Value>,
}

impl AttributeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insert. A later value for the same name wins.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Build a record from any value that serializes to a flat JSON object,
    /// typically a plain struct of attributes.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let v = serde_json::to_value(value)
            .map_err(|e| {
                CasbinRpcError::Request(format!("attribute record not serializable: {e}"))
            })?;
        let Value::Object(map) = v else {
            return Err(CasbinRpcError::Request(
                "attribute record must serialize to an object".into(),
            ));
        };
        let record = Self {
            fields: map.into_iter().collect(),
        };
        record.validate()?;
        Ok(record)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in &self.fields {
            if name.is_empty() {
                return Err(CasbinRpcError::Request("attribute name must not be empty".into()));
            }
            if value.is_array() || value.is_object() {
                return Err(CasbinRpcError::Request(format!(
                    "attribute `{name}` must be a scalar value"
                )));
            }
        }
        Ok(())
    }

    /// Encode into the canonical wire token.
    pub fn encode(&self) -> Result<String> {
        self.validate()?;
        let json = serde_json::to_string(&self.fields)
            .map_err(|e| CasbinRpcError::Internal(format!("attribute encode failed: {e}")))?;
        Ok(format!("{ABAC_PREFIX}{json}"))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for AttributeRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// True when `token` looks like an attribute token.
pub fn is_attribute_token(token: &str) -> bool {
    token.starts_with(ABAC_PREFIX)
}

/// Reference decoder matching the server-side parse of an attribute token.
pub fn decode_attributes(token: &str) -> Result<AttributeRecord> {
    let body = token
        .strip_prefix(ABAC_PREFIX)
        .ok_or_else(|| CasbinRpcError::Request(format!("missing {ABAC_PREFIX} prefix")))?;
    let fields: BTreeMap<String, Value> = serde_json::from_str(body)
        .map_err(|e| CasbinRpcError::Request(format!("invalid attribute token: {e}")))?;
    let record = AttributeRecord { fields };
    record.validate()?;
    Ok(record)
}
