//! Serving mode: startup checks and the stdio session

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{ServeError, StartupError};
use crate::logging::*;
use crate::protocol::{LfsServer, Session};
use crate::store::{self, ContentStore};
use crate::validation;

/// Validate the configuration and repository argument and build the session
///
/// Also creates a configured delta cache directory that does not exist yet,
/// with the same mode as the storage root.
pub async fn prepare_session(
	config: &Config,
	repo_arg: Option<&str>,
) -> Result<Session, StartupError> {
	let base_path = config.check_base_path()?;

	if let Some(delta) = &config.delta_cache_path {
		let delta = resolve_under(base_path, delta);
		if !delta.is_dir() {
			store::create_dir_like(&delta, base_path)
				.await
				.map_err(|e| StartupError::DeltaCache { path: delta.clone(), source: e })?;
			info!("Created delta cache {}", delta.display());
		}
	}

	let repo_arg = repo_arg.ok_or_else(|| StartupError::InvalidRepoPath {
		message: "Path argument missing, cannot continue".to_string(),
	})?;
	let repo_scope = validation::clean_repo_path(repo_arg, config.allow_absolute_paths).map_err(
		|e| StartupError::InvalidRepoPath {
			message: format!("Path argument {} invalid: {}", repo_arg, e),
		},
	)?;

	let store = ContentStore::new(base_path, repo_scope);
	Ok(Session::new(store).verify_content(config.verify_content))
}

/// Serve one client on this process's stdin and stdout
pub async fn serve_stdio(session: Session) -> Result<(), ServeError> {
	let reader = tokio::io::BufReader::new(tokio::io::stdin());
	LfsServer::new(reader, tokio::io::stdout(), session).run().await
}

/// Relative paths are taken relative to the storage root
fn resolve_under(base: &Path, path: &Path) -> PathBuf {
	if path.is_absolute() {
		path.to_path_buf()
	} else {
		base.join(path)
	}
}


// vim: ts=4
