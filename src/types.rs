use serde::Serialize;
use std::fmt;

use crate::validation::{self, ValidationError};

/// A validated object id (hex content hash)
///
/// Holding an `Oid` guarantees the value is safe to slice into shard
/// prefixes and to use as a file name.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(transparent)]
pub struct Oid(String);

impl Oid {
	pub fn parse(oid: &str) -> Result<Oid, ValidationError> {
		validation::validate_oid(oid)?;
		Ok(Oid(oid.to_string()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// First and second level shard directory names
	pub fn shards(&self) -> (&str, &str) {
		(&self.0[0..2], &self.0[2..4])
	}
}

impl fmt::Display for Oid {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_oid_shards() {
		let oid = Oid::parse("a1b2c3d4").unwrap();
		assert_eq!(oid.shards(), ("a1", "b2"));
		assert_eq!(oid.to_string(), "a1b2c3d4");
	}

	#[test]
	fn test_oid_serializes_as_plain_string() {
		let oid = Oid::parse("deadbeef").unwrap();
		assert_eq!(serde_json::to_string(&oid).unwrap(), "\"deadbeef\"");
	}

	#[test]
	fn test_oid_parse_rejects_invalid() {
		assert!(Oid::parse("zz").is_err());
	}
}

// vim: ts=4
