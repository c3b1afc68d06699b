//! Protocol modules: wire schema, framing, and the parameter/attribute/table codecs.
//!
//! - `wire`: request/reply bodies and the operation name table.
//! - `frame`: request/reply envelopes that carry a body plus a correlation id.
//! - `param`: call-site parameters and their flattening into wire fields.
//! - `abac`: canonical attribute-record tokens.
//! - `table`: rule-table decoding and the field-filter predicate.
//!
//! All decoders are panic-free: malformed input is reported as
//! `CasbinRpcError` instead of panicking or indexing raw buffers.

pub mod abac;
pub mod frame;
pub mod param;
pub mod table;
pub mod wire;

pub use abac::{decode_attributes, AttributeRecord, ABAC_ENCODING_VERSION, ABAC_PREFIX};
pub use frame::{RemoteStatus, ReplyFrame, RequestFrame};
pub use param::{flatten_params, Param};
pub use table::{reply_to_table, FieldFilter, Rule};
pub use wire::Method;
