//! Object id validation

use super::ValidationError;

/// Shortest oid that still yields two full shard prefixes
pub const MIN_OID_LEN: usize = 4;

/// Validate an oid before it is turned into a storage path
///
/// Only ASCII hex digits are accepted, so an oid can never contain a path
/// separator or a `..` component.
pub fn validate_oid(oid: &str) -> Result<(), ValidationError> {
	if oid.len() < MIN_OID_LEN {
		return Err(ValidationError::OidError(format!(
			"'{}' is shorter than {} characters",
			oid, MIN_OID_LEN
		)));
	}
	if !oid.bytes().all(|b| b.is_ascii_hexdigit()) {
		return Err(ValidationError::OidError(format!("'{}' is not a hex string", oid)));
	}
	Ok(())
}


// vim: ts=4
