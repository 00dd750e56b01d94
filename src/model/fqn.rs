//! Fully-qualified names: dot-joined paths from the owning service down to
//! an entity, e.g. `pg1.sales.public.orders`.

use itertools::Itertools;
use sha2::{Digest, Sha256};

use crate::error::{CatalogError, CatalogResult};

pub const SEPARATOR: char = '.';

/// Append a local name to a parent FQN.
pub fn build(parent: &str, name: &str) -> String {
    format!("{}{}{}", parent, SEPARATOR, name)
}

pub fn split(fqn: &str) -> Vec<&str> {
    fqn.split(SEPARATOR).collect()
}

/// Every proper prefix of `fqn`, shortest first: `a.b.c` -> `["a", "a.b"]`.
pub fn ancestor_prefixes(fqn: &str) -> Vec<String> {
    let segments = split(fqn);
    (1..segments.len())
        .map(|len| segments[..len].iter().join("."))
        .collect()
}

/// Hex SHA-256 of the FQN, stored in the indexed `fqn_hash` column.
pub fn hash(fqn: &str) -> String {
    hex::encode(Sha256::digest(fqn.as_bytes()))
}

/// A local name must be non-blank and must not contain the separator.
pub fn validate_name(name: &str) -> CatalogResult<()> {
    if name.trim().is_empty() {
        return Err(CatalogError::InvalidPayload(
            "name must not be blank".to_string(),
        ));
    }
    if name.contains(SEPARATOR) {
        return Err(CatalogError::InvalidPayload(format!(
            "name '{}' must not contain '{}'",
            name, SEPARATOR
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_and_prefixes() {
        let fqn = build("pg1.sales.public", "orders");
        assert_eq!(fqn, "pg1.sales.public.orders");
        assert_eq!(
            ancestor_prefixes(&fqn),
            vec!["pg1", "pg1.sales", "pg1.sales.public"]
        );
        assert!(ancestor_prefixes("pg1").is_empty());
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash("pg1"), hash("pg1"));
        assert_ne!(hash("pg1"), hash("pg2"));
        assert_eq!(hash("pg1").len(), 64);
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("orders").is_ok());
        assert!(validate_name("  ").is_err());
        assert!(matches!(
            validate_name("sales.orders"),
            Err(CatalogError::InvalidPayload(_))
        ));
    }
}
