use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BenchError, Result};

/// Operation arguments, keyed by parameter name
pub type Params = BTreeMap<String, Value>;

/// Width of a fixed-size encoded word in bytes
pub const WORD_BYTES: usize = 32;

/// Encode a short string as a right-zero-padded bytes32 hex word.
///
/// The last byte is reserved for the terminating zero, so at most 31 bytes
/// of UTF-8 fit.
pub fn encode_bytes32_string(text: &str) -> Result<String> {
    let bytes = text.as_bytes();
    if bytes.len() >= WORD_BYTES {
        return Err(BenchError::config(format!(
            "bytes32 string must be less than {} bytes, got {} ('{}')",
            WORD_BYTES,
            bytes.len(),
            text
        )));
    }
    let mut word = [0u8; WORD_BYTES];
    word[..bytes.len()].copy_from_slice(bytes);
    Ok(format!("0x{}", hex::encode(word)))
}

/// Replace `{ bytes32 = "..." }` directives with their encoded form.
///
/// Directives may appear at any depth inside arrays and tables.
pub fn expand_param_directives(value: Value) -> Result<Value> {
    match value {
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(Value::String(text)) = map.get("bytes32") {
                    return Ok(Value::String(encode_bytes32_string(text)?));
                }
            }
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, inner) in map {
                out.insert(key, expand_param_directives(inner)?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .into_iter()
            .map(expand_param_directives)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other),
    }
}

/// Overlay per-variant overrides on top of step defaults
pub fn merge_params(defaults: &Params, overrides: Option<&Params>) -> Params {
    let mut merged = defaults.clone();
    if let Some(overrides) = overrides {
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Encoding an operation parameter is expected to arrive in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamEncoding {
    /// Arbitrary UTF-8 string
    Text,
    /// 0x-prefixed 32-byte hex word
    Bytes32,
    /// 0x-prefixed 20-byte hex address
    Address,
    /// Non-negative integer, as a number or decimal string
    Uint,
}

impl ParamEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamEncoding::Text => "text",
            ParamEncoding::Bytes32 => "bytes32",
            ParamEncoding::Address => "address",
            ParamEncoding::Uint => "uint",
        }
    }

    /// Check whether a value is in this encoding
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamEncoding::Text => value.is_string(),
            ParamEncoding::Bytes32 => value.as_str().map(|s| is_hex_word(s, 32)).unwrap_or(false),
            ParamEncoding::Address => value.as_str().map(|s| is_hex_word(s, 20)).unwrap_or(false),
            ParamEncoding::Uint => match value {
                Value::Number(n) => n.is_u64(),
                Value::String(s) => !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()),
                _ => false,
            },
        }
    }
}

fn is_hex_word(text: &str, width: usize) -> bool {
    match text.strip_prefix("0x") {
        Some(digits) => digits.len() == width * 2 && hex::decode(digits).is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bytes32_pads_on_the_right() {
        let encoded = encode_bytes32_string("Alice").unwrap();
        assert_eq!(
            encoded,
            "0x416c696365000000000000000000000000000000000000000000000000000000"
        );
        assert!(ParamEncoding::Bytes32.accepts(&Value::String(encoded)));
    }

    #[test]
    fn bytes32_rejects_32_byte_strings() {
        let long = "a".repeat(32);
        assert!(encode_bytes32_string(&long).is_err());
        assert!(encode_bytes32_string(&long[..31]).is_ok());
    }

    #[test]
    fn directives_expand_inside_nested_values() {
        let value = json!({ "names": [{ "bytes32": "Bob" }, "plain"], "n": 3 });
        let expanded = expand_param_directives(value).unwrap();
        assert_eq!(
            expanded["names"][0],
            json!("0x426f620000000000000000000000000000000000000000000000000000000000")
        );
        assert_eq!(expanded["names"][1], json!("plain"));
        assert_eq!(expanded["n"], json!(3));
    }

    #[test]
    fn table_with_extra_keys_is_not_a_directive() {
        let value = json!({ "bytes32": "Bob", "other": 1 });
        assert_eq!(expand_param_directives(value.clone()).unwrap(), value);
    }

    #[test]
    fn overrides_replace_defaults_per_key() {
        let mut defaults = Params::new();
        defaults.insert("user".into(), json!("0x01"));
        defaults.insert("name".into(), json!("Alice"));
        let mut overrides = Params::new();
        overrides.insert("name".into(), json!("0xabc"));

        let merged = merge_params(&defaults, Some(&overrides));
        assert_eq!(merged["user"], json!("0x01"));
        assert_eq!(merged["name"], json!("0xabc"));
        assert_eq!(merge_params(&defaults, None), defaults);
    }

    #[test]
    fn encodings_distinguish_text_from_words() {
        let address = json!("0x70997970c51812dc3a010c7d01b50e0d17dc79c8");
        assert!(ParamEncoding::Address.accepts(&address));
        assert!(!ParamEncoding::Bytes32.accepts(&address));
        assert!(ParamEncoding::Text.accepts(&address));
        assert!(ParamEncoding::Uint.accepts(&json!(7)));
        assert!(ParamEncoding::Uint.accepts(&json!("42")));
        assert!(!ParamEncoding::Uint.accepts(&json!(-1)));
    }
}
