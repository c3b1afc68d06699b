//! Rule tables and the field-filter predicate.

use crate::error::{CasbinRpcError, Result};
use crate::protocol::wire::{Array1D, Array2DReply};

/// An ordered tuple of rule fields (e.g. subject, object, action).
pub type Rule = Vec<String>;

/// Decode a rule-table reply, preserving server iteration order.
///
/// An empty or absent table decodes to an empty vector, never to an error, so
/// "no rules" stays distinguishable from a failed call.
pub fn reply_to_table(reply: Array2DReply) -> Vec<Rule> {
    reply.d2.into_iter().map(|row| row.d1).collect()
}

/// Inverse of [`reply_to_table`], for servers reusing this crate.
pub fn table_to_reply<I>(rules: I) -> Array2DReply
where
    I: IntoIterator<Item = Rule>,
{
    Array2DReply {
        d2: rules.into_iter().map(|d1| Array1D { d1 }).collect(),
    }
}

/// Selects rules whose fields, starting at `field_index`, equal `field_values`
/// position by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field_index: usize,
    pub field_values: Vec<String>,
}

impl FieldFilter {
    pub fn new<I, S>(field_index: usize, field_values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field_index,
            field_values: field_values.into_iter().map(Into::into).collect(),
        }
    }

    /// `rule[i] == field_values[i - field_index]` for every
    /// `i` in `field_index..field_index + field_values.len()`.
    ///
    /// A rule too short to hold every compared field does not match.
    pub fn matches(&self, rule: &[String]) -> bool {
        self.field_values.iter().enumerate().all(|(offset, value)| {
            rule.get(self.field_index + offset)
                .map(|field| field == value)
                .unwrap_or(false)
        })
    }

    /// Wire form of the field index.
    pub fn wire_index(&self) -> Result<i32> {
        i32::try_from(self.field_index).map_err(|_| {
            CasbinRpcError::Request(format!("field index {} out of range", self.field_index))
        })
    }
}
