use alloy::{
    dyn_abi::{DynSolType, DynSolValue, Specifier},
    hex,
    json_abi::Function,
};
use serde_json::{Map, Value};

use super::InvokeError;

/// JSON rendering of a decoded ABI value. Integers are decimal strings so
/// 256-bit values survive, addresses are checksummed, bytes are 0x-hex.
pub fn to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Int(i, _) => Value::String(i.to_string()),
        DynSolValue::Uint(u, _) => Value::String(u.to_string()),
        DynSolValue::FixedBytes(word, size) => Value::String(hex::encode_prefixed(&word[..*size])),
        DynSolValue::Address(address) => Value::String(address.to_checksum(None)),
        DynSolValue::Function(function) => Value::String(function.to_string()),
        DynSolValue::Bytes(bytes) => Value::String(hex::encode_prefixed(bytes)),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Array(values)
        | DynSolValue::FixedArray(values)
        | DynSolValue::Tuple(values) => Value::Array(values.iter().map(to_json).collect()),
        #[allow(unreachable_patterns)]
        other => Value::String(format!("{:?}", other)),
    }
}

/// JSON array of call arguments, as used in read cache keys.
pub fn args_json(args: &[DynSolValue]) -> Value {
    Value::Array(args.iter().map(to_json).collect())
}

/// Renders decoded return values of `function`. A single output is shown
/// bare; several outputs that are all named become an object.
pub fn render_outputs(function: &Function, values: &[DynSolValue]) -> Value {
    if values.len() == 1 {
        return to_json(&values[0]);
    }
    let all_named = function.outputs.len() == values.len()
        && function.outputs.iter().all(|p| !p.name.is_empty());
    if all_named {
        let fields = function
            .outputs
            .iter()
            .zip(values)
            .map(|(param, value)| (param.name.clone(), to_json(value)))
            .collect::<Map<_, _>>();
        Value::Object(fields)
    } else {
        args_json(values)
    }
}

/// Coerces textual arguments into values of `function`'s input types.
pub fn coerce_args(function: &Function, raw: &[String]) -> Result<Vec<DynSolValue>, InvokeError> {
    if raw.len() != function.inputs.len() {
        return Err(InvokeError::invalid_arguments(
            &function.name,
            format!(
                "expected {} arguments, got {}",
                function.inputs.len(),
                raw.len()
            ),
        ));
    }
    function
        .inputs
        .iter()
        .zip(raw)
        .map(|(param, arg)| {
            let ty: DynSolType = param
                .resolve()
                .map_err(|e| InvokeError::invalid_arguments(&function.name, e))?;
            ty.coerce_str(arg).map_err(|e| {
                InvokeError::invalid_arguments(
                    &function.name,
                    format!("{} ({}): {}", param.name, ty, e),
                )
            })
        })
        .collect()
}
