//! Products and encoded group decoding.
//!
//! The backend stores products in fixed-size, content-addressed groups. Each
//! decoded product is stamped with a synthetic composite key
//! `"<groupHash>_<indexWithinGroup>"` that serves as its stable identity for
//! rendering and as the address handed to cart operations.

use serde::{Deserialize, Serialize};

/// One product as displayed by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Composite key `"<groupHash>_<indexWithinGroup>"`.
    pub hash: String,
    /// Opaque backend payload.
    pub payload: serde_json::Value,
}

impl Product {
    /// Stamp a payload with its composite key.
    #[must_use]
    pub fn new(group_hash: &str, index: usize, payload: serde_json::Value) -> Self {
        Self {
            hash: format!("{group_hash}_{index}"),
            payload,
        }
    }

    /// Content hash of the group this product came from.
    #[must_use]
    pub fn group_hash(&self) -> Option<&str> {
        self.hash.rsplit_once('_').map(|(group, _)| group)
    }

    /// Position of this product within its group.
    #[must_use]
    pub fn index_in_group(&self) -> Option<usize> {
        self.hash
            .rsplit_once('_')
            .and_then(|(_, idx)| idx.parse().ok())
    }
}

/// One backend group record as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedGroup {
    /// Content-addressed hash of the group.
    pub action_hash: String,
    /// Serialized product payloads, in group order.
    pub products: Vec<serde_json::Value>,
}

/// Why one group failed to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupDecodeError {
    /// Group arrived without a content hash.
    MissingHash,
    /// A product payload was not a JSON object.
    MalformedPayload {
        /// Index of the offending payload within the group.
        index: usize,
    },
}

impl std::fmt::Display for GroupDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHash => write!(f, "group has no content hash"),
            Self::MalformedPayload { index } => {
                write!(f, "product payload at index {index} is not an object")
            }
        }
    }
}

impl std::error::Error for GroupDecodeError {}

/// Result of decoding a batch of groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeOutcome {
    /// All successfully decoded products, in fetch order.
    pub products: Vec<Product>,
    /// Number of groups skipped because they failed to decode.
    pub skipped_groups: usize,
}

/// Decode one group, stamping every product with its composite key.
pub fn decode_group(group: &EncodedGroup) -> Result<Vec<Product>, GroupDecodeError> {
    if group.action_hash.is_empty() {
        return Err(GroupDecodeError::MissingHash);
    }
    for (index, payload) in group.products.iter().enumerate() {
        if !payload.is_object() {
            return Err(GroupDecodeError::MalformedPayload { index });
        }
    }
    Ok(group
        .products
        .iter()
        .enumerate()
        .map(|(index, payload)| Product::new(&group.action_hash, index, payload.clone()))
        .collect())
}

/// Decode a batch of groups with a best-effort policy: a malformed group
/// contributes zero items and is counted, the rest of the batch is still
/// processed.
#[must_use]
pub fn decode_groups(groups: &[EncodedGroup]) -> DecodeOutcome {
    let mut outcome = DecodeOutcome::default();
    for group in groups {
        match decode_group(group) {
            Ok(products) => outcome.products.extend(products),
            Err(_) => outcome.skipped_groups += 1,
        }
    }
    outcome
}
