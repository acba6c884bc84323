//! Runtime value types

pub mod value;

pub use value::{payload_from_json, payload_to_json, Payload, Value};
