//! Cache Key Module
//!
//! Canonical, storage-safe identifiers for filter sets.

use sha2::{Digest, Sha256};

use crate::cache::{FieldKind, FilterSet, FilterValue};
use crate::error::{CacheError, Result};

/// Namespace prefix for every persisted entry.
pub const KEY_PREFIX: &str = "explorer_cache_";

// == Canonicalize ==
/// Derives the canonical key of a filter set.
///
/// The set is serialized in field order and hashed, so the key is independent
/// of insertion order, fixed length, and limited to `[0-9a-f]`. Sets that
/// compare equal always share a key.
///
/// # Errors
/// `CacheError::Encoding` when a number is not finite or a range field holds
/// text.
pub fn canonicalize(filters: &FilterSet) -> Result<String> {
    let mut normalized = FilterSet::new();

    for (field, value) in filters.iter() {
        match value {
            FilterValue::Number(n) if !n.is_finite() => {
                return Err(CacheError::Encoding(format!(
                    "field '{}' holds a non-finite number",
                    field
                )));
            }
            FilterValue::Text(_) if field.kind() != FieldKind::Exact => {
                return Err(CacheError::Encoding(format!(
                    "range field '{}' must be numeric",
                    field
                )));
            }
            // -0.0 equals 0.0 and must share its key
            FilterValue::Number(n) if *n == 0.0 => normalized.insert(field, 0.0),
            _ => normalized.insert(field, value.clone()),
        }
    }

    let serialized =
        serde_json::to_string(&normalized).map_err(|e| CacheError::Encoding(e.to_string()))?;

    Ok(hex::encode(Sha256::digest(serialized.as_bytes())))
}

/// Storage key for a canonical key.
pub fn storage_key(canonical: &str) -> String {
    format!("{}{}", KEY_PREFIX, canonical)
}
