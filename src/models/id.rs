/// ID generation utilities
///
/// This module provides functions for generating identifiers:
/// - UUIDs for nodes and segments (stable client-side identity)
/// - u64 IDs for the backend-facing numeric identifier of a record
use uuid::Uuid;

/// Generate a new random UUID for a node or segment
#[must_use]
pub fn generate_feature_id() -> Uuid {
    Uuid::new_v4()
}

/// Generate a new random backend-facing numeric ID
///
/// Backends store this as a signed 64-bit integer, so the top bit is cleared.
#[must_use]
pub fn generate_backend_id() -> u64 {
    let (high, _) = Uuid::new_v4().as_u64_pair();
    high & (u64::MAX >> 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_feature_id_produces_different_values() {
        let id1 = generate_feature_id();
        let id2 = generate_feature_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_generate_many_unique_backend_ids() {
        let mut ids = HashSet::new();
        let count = 10_000;

        for _ in 0..count {
            let id = generate_backend_id();
            assert!(i64::try_from(id).is_ok());
            ids.insert(id);
        }

        // All IDs should be unique
        assert_eq!(ids.len(), count);
    }
}
