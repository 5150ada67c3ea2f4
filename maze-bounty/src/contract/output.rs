//! Decoded results of read-only calls.

use alloy::dyn_abi::DynSolValue;
use alloy::json_abi::Param;
use alloy::primitives::hex;
use serde_json::{Map, Value};

/// The decoded return values of a read-only call.
///
/// Holds the raw values together with the output parameters the descriptor
/// declares, so results can be rendered with their declared field names.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutput {
    outputs: Vec<Param>,
    values: Vec<DynSolValue>,
}

impl CallOutput {
    /// Pair decoded `values` with their declared `outputs`.
    #[must_use]
    pub const fn new(outputs: Vec<Param>, values: Vec<DynSolValue>) -> Self {
        Self { outputs, values }
    }

    /// The raw decoded values.
    #[must_use]
    pub fn values(&self) -> &[DynSolValue] {
        &self.values
    }

    /// Consume the output, returning the raw values.
    #[must_use]
    pub fn into_values(self) -> Vec<DynSolValue> {
        self.values
    }

    /// The declared output parameters.
    #[must_use]
    pub fn outputs(&self) -> &[Param] {
        &self.outputs
    }

    /// Render as JSON.
    ///
    /// A single return value is rendered on its own; several are rendered as
    /// an object when every output is named, otherwise as an array. Structs
    /// become objects keyed by field name, integers become decimal strings,
    /// and addresses and bytes become 0x-prefixed hex.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match (self.outputs.as_slice(), self.values.as_slice()) {
            ([param], [value]) => render(&param.components, value),
            _ => named(&self.outputs, &self.values),
        }
    }
}

fn render(components: &[Param], value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Tuple(items) => named(components, items),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            Value::Array(items.iter().map(|item| render(components, item)).collect())
        }
        scalar => render_scalar(scalar),
    }
}

fn named(params: &[Param], items: &[DynSolValue]) -> Value {
    let all_named = params.len() == items.len() && params.iter().all(|p| !p.name.is_empty());
    if all_named {
        Value::Object(
            params
                .iter()
                .zip(items)
                .map(|(param, item)| (param.name.clone(), render(&param.components, item)))
                .collect::<Map<_, _>>(),
        )
    } else {
        Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let components = params.get(i).map_or(&[][..], |p| p.components.as_slice());
                    render(components, item)
                })
                .collect(),
        )
    }
}

fn render_scalar(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Int(i, _) => Value::String(i.to_string()),
        DynSolValue::Uint(u, _) => Value::String(u.to_string()),
        DynSolValue::Address(a) => Value::String(a.to_checksum(None)),
        DynSolValue::FixedBytes(word, size) => Value::String(hex::encode_prefixed(&word[..*size])),
        DynSolValue::Bytes(bytes) => Value::String(hex::encode_prefixed(bytes)),
        DynSolValue::String(s) => Value::String(s.clone()),
        other => Value::String(format!("{other:?}")),
    }
}
