//! Content-addressable task identity.
//!
//! A task's identity is the MD5 digest of its canonicalized descriptor:
//! `{"task_name": ..., "task_params": ...}` serialized with recursively
//! sorted object keys and stable number/string formatting. Two descriptors
//! with the same name and parameter set — regardless of key order — always
//! hash to the same id; the digest doubles as the cache key and dedup key,
//! so only correctness of deduplication (not adversarial collision
//! resistance) is required of it.
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use taskhub::identity::task_id;
//!
//! let a = task_id("t", &json!({"x": 1, "y": 2}));
//! let b = task_id("t", &json!({"y": 2, "x": 1}));
//! assert_eq!(a, b);
//! assert_eq!(a.as_str().len(), 32);
//! ```

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A 32-character lowercase hex content-address of a task descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps an already-derived id. Returns `None` unless the input is
    /// exactly 32 lowercase hex characters.
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = raw.len() == 32
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(raw.to_string()))
    }

    /// The hex digest as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives the stable identity of a task descriptor.
///
/// Pure and side-effect-free: the same descriptor submitted years apart or
/// from different processes produces the same id.
pub fn task_id(task_name: &str, task_params: &Value) -> TaskId {
    let mut canonical = String::new();
    canonical.push_str("{\"task_name\":");
    write_canonical(&Value::String(task_name.to_string()), &mut canonical);
    canonical.push_str(",\"task_params\":");
    write_canonical(task_params, &mut canonical);
    canonical.push('}');

    let mut hasher = Md5::new();
    hasher.update(canonical.as_bytes());
    TaskId(format!("{:x}", hasher.finalize()))
}

/// Serializes a JSON value with recursively sorted object keys.
///
/// serde_json's own formatting is reused for scalars, so number and string
/// rendering stays stable across releases of this crate; only object key
/// order is imposed here.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // String keys serialize infallibly.
                out.push_str(&serde_json::to_string(key).expect("string key"));
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar).expect("scalar")),
    }
}
