//! Call-site parameters and their flattening into wire fields.
//!
//! Three call shapes are supported:
//! - individual strings: `["alice", "data1", "read"]`
//! - one batch sequence: `[vec!["alice", "data1", "read"]]`
//! - attribute records mixed with strings: `params![user_attrs, "data1", "read"]`

use crate::error::{CasbinRpcError, Result};
use crate::protocol::abac::AttributeRecord;

/// One call-site parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Str(String),
    Attrs(AttributeRecord),
    Seq(Vec<String>),
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Param::Str(s.to_string())
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self {
        Param::Str(s)
    }
}

impl From<&String> for Param {
    fn from(s: &String) -> Self {
        Param::Str(s.clone())
    }
}

impl From<AttributeRecord> for Param {
    fn from(r: AttributeRecord) -> Self {
        Param::Attrs(r)
    }
}

impl From<Vec<String>> for Param {
    fn from(v: Vec<String>) -> Self {
        Param::Seq(v)
    }
}

impl From<Vec<&str>> for Param {
    fn from(v: Vec<&str>) -> Self {
        Param::Seq(v.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Param {
    fn from(v: &[&str]) -> Self {
        Param::Seq(v.iter().map(|s| s.to_string()).collect())
    }
}

/// Build a `Vec<Param>` from heterogeneous values.
///
/// ```
/// use casbin_rpc_core::{params, protocol::{AttributeRecord, Param}};
///
/// let who = AttributeRecord::new().field("name", "alice");
/// let p: Vec<Param> = params![who, "data1", "read"];
/// assert_eq!(p.len(), 3);
/// ```
#[macro_export]
macro_rules! params {
    () => { ::std::vec::Vec::<$crate::protocol::Param>::new() };
    ($($p:expr),+ $(,)?) => {
        ::std::vec![$($crate::protocol::Param::from($p)),+]
    };
}

/// Flatten call-site parameters into the ordered wire field list.
///
/// A single `Seq` is used verbatim as the field list. Otherwise each parameter
/// contributes one field: strings as-is, attribute records as their canonical
/// token. A `Seq` among other parameters, or an empty field list, is a request
/// error.
pub fn flatten_params(mut params: Vec<Param>) -> Result<Vec<String>> {
    if let [Param::Seq(fields)] = params.as_mut_slice() {
        params = std::mem::take(fields).into_iter().map(Param::Str).collect();
    }
    if params.is_empty() {
        return Err(CasbinRpcError::Request("at least one parameter is required".into()));
    }

    let mut out = Vec::with_capacity(params.len());
    for (i, param) in params.into_iter().enumerate() {
        match param {
            Param::Str(s) => out.push(s),
            Param::Attrs(rec) => out.push(rec.encode()?),
            Param::Seq(_) => {
                return Err(CasbinRpcError::Request(format!(
                    "parameter {i} is a sequence; a sequence must be the only parameter"
                )))
            }
        }
    }
    Ok(out)
}
