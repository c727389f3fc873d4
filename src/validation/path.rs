//! Repository path validation

use std::path::{Component, Path, PathBuf};

use super::ValidationError;

/// Check if a path is safe (no parent directory references)
pub fn is_path_safe(path: &Path) -> bool {
	!path.components().any(|c| matches!(c, Component::ParentDir))
}

/// Validate a path is safe
pub fn validate_path_safe(path: &Path) -> Result<(), ValidationError> {
	if !is_path_safe(path) {
		return Err(ValidationError::PathError(format!(
			"{} contains a parent directory reference (..)",
			path.display()
		)));
	}
	Ok(())
}

/// Turn the repository path argument into a scope relative to the storage root
///
/// `.` components are dropped. Absolute paths are rejected unless
/// `allow_absolute` is set, in which case the root is stripped so the scope
/// still lands beneath the storage root. `..` is never accepted.
///
/// # Returns
/// The cleaned relative path (empty for `.`), or `Err(ValidationError)`
pub fn clean_repo_path(arg: &str, allow_absolute: bool) -> Result<PathBuf, ValidationError> {
	if arg.is_empty() {
		return Err(ValidationError::PathError("repository path is empty".to_string()));
	}
	let path = Path::new(arg);
	validate_path_safe(path)?;

	if path.is_absolute() && !allow_absolute {
		return Err(ValidationError::PathError(format!(
			"{} is absolute; absolute paths are not allowed by this server",
			arg
		)));
	}

	let mut cleaned = PathBuf::new();
	for component in path.components() {
		if let Component::Normal(part) = component {
			cleaned.push(part);
		}
	}
	Ok(cleaned)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_is_path_safe_normal() {
		assert!(is_path_safe(Path::new("repo")));
		assert!(is_path_safe(Path::new("team/repo.git")));
	}

	#[test]
	fn test_is_path_safe_with_parent() {
		assert!(!is_path_safe(Path::new("../repo")));
		assert!(!is_path_safe(Path::new("team/../../repo")));
	}

	#[test]
	fn test_clean_repo_path_relative() {
		assert_eq!(clean_repo_path("test/repo", false).unwrap(), PathBuf::from("test/repo"));
		assert_eq!(clean_repo_path("./test//repo/", false).unwrap(), PathBuf::from("test/repo"));
		assert_eq!(clean_repo_path(".", false).unwrap(), PathBuf::new());
	}

	#[test]
	fn test_clean_repo_path_absolute_rejected() {
		let result = clean_repo_path("/srv/git/repo", false);
		assert!(result.unwrap_err().to_string().contains("absolute paths are not allowed"));
	}

	#[test]
	fn test_clean_repo_path_absolute_allowed() {
		assert_eq!(
			clean_repo_path("/srv/git/repo", true).unwrap(),
			PathBuf::from("srv/git/repo")
		);
	}

	#[test]
	fn test_clean_repo_path_parent_rejected() {
		assert!(clean_repo_path("../other", false).is_err());
		assert!(clean_repo_path("/a/../../b", true).is_err());
		assert!(clean_repo_path("", false).is_err());
	}
}

// vim: ts=4
