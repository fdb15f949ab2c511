//! Cache key derivation.
//!
//! Two key shapes exist:
//!
//! - `entity:<type>:<id>` for entity-scoped lookups,
//! - `query:<service>:<method>:<sha256>` for query-scoped results, where the
//!   digest covers the canonical JSON form of the call arguments.
//!
//! Name segments are restricted to `[a-z0-9_-]` so the `:` delimiter can never
//! appear inside one; ids are the final segment and may contain anything.

use std::fmt::Write as _;

use serde::Serialize;
use serde_json::{Number, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;

const ENTITY_PREFIX: &str = "entity";
const QUERY_PREFIX: &str = "query";

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("cache key segment `{segment}` must be non-empty and match [a-z0-9_-]")]
    InvalidSegment { segment: String },
    #[error("entity id for `{entity_type}` must not be empty")]
    EmptyId { entity_type: String },
    #[error("entity-scoped operation `{operation}` requires a scalar id argument")]
    EntityIdNotScalar { operation: String },
    #[error("failed to serialize cache key arguments: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Key for a single entity snapshot.
pub fn entity_key(entity_type: &str, id: &str) -> Result<String, KeyError> {
    validate_segment(entity_type)?;
    if id.is_empty() {
        return Err(KeyError::EmptyId {
            entity_type: entity_type.to_string(),
        });
    }
    Ok(format!("{ENTITY_PREFIX}:{entity_type}:{id}"))
}

/// Key for a derived query result.
///
/// Logically identical argument values produce the same key regardless of
/// object-key insertion order or `2` vs `2.0` spelling.
pub fn query_key<A>(service: &str, method: &str, args: &A) -> Result<String, KeyError>
where
    A: Serialize + ?Sized,
{
    validate_segment(service)?;
    validate_segment(method)?;
    let canonical = canonical_args(args)?;

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hex::encode(hasher.finalize());

    Ok(format!("{QUERY_PREFIX}:{service}:{method}:{digest}"))
}

/// Canonical JSON text of `args`: sorted object keys, integral floats as
/// integers, no insignificant whitespace.
pub fn canonical_args<A>(args: &A) -> Result<String, KeyError>
where
    A: Serialize + ?Sized,
{
    let value = serde_json::to_value(args)?;
    let mut out = String::new();
    write_canonical(&value, &mut out);
    Ok(out)
}

/// Extract an entity id from the arguments of an entity-scoped call.
pub fn entity_id_from_args<A>(operation: &str, args: &A) -> Result<String, KeyError>
where
    A: Serialize + ?Sized,
{
    let id = match serde_json::to_value(args)? {
        Value::String(id) => id,
        Value::Number(number) => normalize_number(&number).to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => {
            return Err(KeyError::EntityIdNotScalar {
                operation: operation.to_string(),
            });
        }
    };
    Ok(id)
}

pub(crate) fn validate_segment(segment: &str) -> Result<(), KeyError> {
    let valid = !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(KeyError::InvalidSegment {
            segment: segment.to_string(),
        })
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => {
            let _ = write!(out, "{value}");
        }
        Value::Number(number) => {
            let _ = write!(out, "{}", normalize_number(number));
        }
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));

            out.push('{');
            for (index, (key, item)) in entries.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                let _ = write!(out, "{}", Value::String(key.clone()));
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
    }
}

fn normalize_number(number: &Number) -> Number {
    if number.is_f64()
        && let Some(float) = number.as_f64()
        && float.fract() == 0.0
        && float >= i64::MIN as f64
        && float < i64::MAX as f64
    {
        return Number::from(float as i64);
    }
    number.clone()
}
