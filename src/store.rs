//! Content-addressable object store
//!
//! Objects live at `base/repo/oid[0:2]/oid[2:4]/oid`. An object becomes
//! visible only through a rename from a private temp file in the same shard
//! directory, so a reader sees either nothing or a complete object. Equal oids
//! imply equal content, which makes concurrent publishers safe without locks:
//! the last rename wins and replaces identical bytes.

use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs as afs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

use crate::types::Oid;

/// Mode for new directories when no ancestor can be stat'ed
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Suffix marking unpublished upload data
pub const TEMP_SUFFIX: &str = ".lfs-tmp";

const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Object storage scoped to one repository beneath the storage root
#[derive(Debug, Clone)]
pub struct ContentStore {
	base_path: PathBuf,
	repo_scope: PathBuf,
}

impl ContentStore {
	pub fn new(base_path: impl Into<PathBuf>, repo_scope: impl Into<PathBuf>) -> Self {
		Self { base_path: base_path.into(), repo_scope: repo_scope.into() }
	}

	pub fn base_path(&self) -> &Path {
		&self.base_path
	}

	pub fn repo_scope(&self) -> &Path {
		&self.repo_scope
	}

	/// Directory holding the object (`base/repo/xx/yy`)
	pub fn shard_dir(&self, oid: &Oid) -> PathBuf {
		let (first, second) = oid.shards();
		self.base_path.join(&self.repo_scope).join(first).join(second)
	}

	/// Final location of the object; pure, touches nothing on disk
	pub fn object_path(&self, oid: &Oid) -> PathBuf {
		self.shard_dir(oid).join(oid.as_str())
	}

	/// Size of the stored object, or `None` if it is absent
	pub async fn stat(&self, oid: &Oid) -> io::Result<Option<u64>> {
		let path = self.object_path(oid);
		match afs::metadata(&path).await {
			Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
			Ok(_) => Err(io::Error::new(
				io::ErrorKind::Other,
				format!("{} exists but is not a regular file", path.display()),
			)),
			Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e),
		}
	}

	pub async fn contains(&self, oid: &Oid) -> io::Result<bool> {
		Ok(self.stat(oid).await?.is_some())
	}

	/// Open a stored object for reading
	pub async fn open(&self, oid: &Oid) -> io::Result<afs::File> {
		afs::File::open(self.object_path(oid)).await
	}

	/// Start receiving an object into a private temp file
	///
	/// The temp file name is unique per call, so concurrent uploads of the same
	/// oid never share one.
	pub async fn begin_upload(&self, oid: &Oid) -> io::Result<PendingObject> {
		let dir = self.shard_dir(oid);
		create_dir_inheriting(&dir).await.map_err(|e| {
			io::Error::new(
				e.kind(),
				format!("Error creating media directory {}: {}", dir.display(), e),
			)
		})?;

		let temp_path =
			dir.join(format!("{}.{}{}", oid.as_str(), uuid::Uuid::new_v4().simple(), TEMP_SUFFIX));
		let file = afs::OpenOptions::new().write(true).create_new(true).open(&temp_path).await?;
		debug!("Receiving {} into {}", oid, temp_path.display());

		Ok(PendingObject {
			oid: oid.clone(),
			temp_path,
			final_path: dir.join(oid.as_str()),
			file: Some(file),
			published: false,
		})
	}
}

/// Upload data that is not yet visible at its final path
///
/// Dropping an unpublished object removes its temp file.
#[derive(Debug)]
pub struct PendingObject {
	oid: Oid,
	temp_path: PathBuf,
	final_path: PathBuf,
	file: Option<afs::File>,
	published: bool,
}

impl PendingObject {
	pub fn temp_path(&self) -> &Path {
		&self.temp_path
	}

	/// Writable handle on the temp file
	pub fn file(&mut self) -> io::Result<&mut afs::File> {
		self.file
			.as_mut()
			.ok_or_else(|| io::Error::new(io::ErrorKind::Other, "temp file already closed"))
	}

	/// Flush and close the temp file
	async fn close(&mut self) -> io::Result<()> {
		if let Some(mut file) = self.file.take() {
			file.flush().await?;
			file.sync_all().await?;
		}
		Ok(())
	}

	/// Check that the received bytes hash (SHA-256) to the oid
	pub async fn matches_oid(&mut self) -> io::Result<bool> {
		self.close().await?;
		let mut file = afs::File::open(&self.temp_path).await?;
		let mut hasher = Sha256::new();
		let mut buf = vec![0u8; HASH_BUFFER_SIZE];
		loop {
			let n = file.read(&mut buf).await?;
			if n == 0 {
				break;
			}
			hasher.update(&buf[..n]);
		}
		let digest = hex::encode(hasher.finalize());
		Ok(digest.eq_ignore_ascii_case(self.oid.as_str()))
	}

	/// Atomically move the object to its final path
	pub async fn publish(mut self) -> io::Result<PathBuf> {
		self.close().await?;
		afs::rename(&self.temp_path, &self.final_path).await?;
		self.published = true;
		debug!("Published {} at {}", self.oid, self.final_path.display());
		Ok(self.final_path.clone())
	}
}

impl Drop for PendingObject {
	fn drop(&mut self) {
		if self.published {
			return;
		}
		self.file.take();
		// Drop cannot await; also runs when the handler future is cancelled
		match std::fs::remove_file(&self.temp_path) {
			Ok(()) => debug!("Discarded partial upload {}", self.temp_path.display()),
			Err(e) if e.kind() == io::ErrorKind::NotFound => {}
			Err(e) => warn!("Failed to remove temp file {}: {}", self.temp_path.display(), e),
		}
	}
}

/// Create `dir` and missing parents with the mode of its nearest existing ancestor
pub async fn create_dir_inheriting(dir: &Path) -> io::Result<()> {
	if is_dir(dir).await {
		return Ok(());
	}
	let mut mode = DEFAULT_DIR_MODE;
	for ancestor in dir.ancestors().skip(1) {
		if let Ok(meta) = afs::metadata(ancestor).await {
			if meta.is_dir() {
				mode = dir_mode(&meta);
				break;
			}
		}
	}
	create_dir_with_mode(dir, mode).await
}

/// Create `dir` and missing parents with the same mode as `template`
pub async fn create_dir_like(dir: &Path, template: &Path) -> io::Result<()> {
	let meta = afs::metadata(template).await?;
	create_dir_with_mode(dir, dir_mode(&meta)).await
}

async fn create_dir_with_mode(dir: &Path, mode: u32) -> io::Result<()> {
	// Components that do not exist yet, innermost first
	let mut missing = Vec::new();
	for ancestor in dir.ancestors() {
		if ancestor.as_os_str().is_empty() || afs::metadata(ancestor).await.is_ok() {
			break;
		}
		missing.push(ancestor.to_path_buf());
	}

	let mut builder = afs::DirBuilder::new();
	builder.recursive(true);
	#[cfg(unix)]
	builder.mode(mode);
	builder.create(dir).await?;

	// DirBuilder::mode is filtered through the umask
	#[cfg(unix)]
	for path in missing.iter().rev() {
		use std::os::unix::fs::PermissionsExt;
		if let Err(e) = afs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await {
			// Lost a creation race to another user's process
			warn!("Unable to set mode {:o} on {}: {}", mode, path.display(), e);
		}
	}
	#[cfg(not(unix))]
	let _ = (mode, missing);
	Ok(())
}

async fn is_dir(path: &Path) -> bool {
	afs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

#[cfg(unix)]
fn dir_mode(meta: &std::fs::Metadata) -> u32 {
	use std::os::unix::fs::PermissionsExt;
	meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn dir_mode(_meta: &std::fs::Metadata) -> u32 {
	DEFAULT_DIR_MODE
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	const OID: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

	fn oid(s: &str) -> Oid {
		Oid::parse(s).unwrap()
	}

	async fn put(store: &ContentStore, id: &Oid, data: &[u8]) -> PathBuf {
		let mut pending = store.begin_upload(id).await.unwrap();
		pending.file().unwrap().write_all(data).await.unwrap();
		pending.publish().await.unwrap()
	}

	#[test]
	fn test_object_path_is_sharded() {
		let store = ContentStore::new("/srv/lfs", "team/repo");
		assert_eq!(
			store.object_path(&oid(OID)),
			PathBuf::from("/srv/lfs/team/repo/2c/f2").join(OID)
		);
	}

	#[test]
	fn test_object_path_does_not_touch_disk() {
		let temp = TempDir::new().unwrap();
		let store = ContentStore::new(temp.path(), "repo");
		let _ = store.object_path(&oid(OID));
		assert!(!temp.path().join("repo").exists());
	}

	#[tokio::test]
	async fn test_stat_absent() {
		let temp = TempDir::new().unwrap();
		let store = ContentStore::new(temp.path(), "repo");
		assert_eq!(store.stat(&oid(OID)).await.unwrap(), None);
		assert!(!store.contains(&oid(OID)).await.unwrap());
	}

	#[tokio::test]
	async fn test_publish_then_stat() {
		let temp = TempDir::new().unwrap();
		let store = ContentStore::new(temp.path(), "repo");
		let path = put(&store, &oid(OID), b"hello").await;

		assert_eq!(path, store.object_path(&oid(OID)));
		assert_eq!(store.stat(&oid(OID)).await.unwrap(), Some(5));
		assert_eq!(std::fs::read(&path).unwrap(), b"hello");
	}

	#[tokio::test]
	async fn test_pending_object_is_invisible_until_published() {
		let temp = TempDir::new().unwrap();
		let store = ContentStore::new(temp.path(), "repo");
		let mut pending = store.begin_upload(&oid(OID)).await.unwrap();
		pending.file().unwrap().write_all(b"partial").await.unwrap();

		assert_eq!(store.stat(&oid(OID)).await.unwrap(), None);
		assert!(pending.temp_path().exists());
		assert_ne!(pending.temp_path(), store.object_path(&oid(OID)).as_path());
	}

	#[tokio::test]
	async fn test_dropped_upload_removes_temp_file() {
		let temp = TempDir::new().unwrap();
		let store = ContentStore::new(temp.path(), "repo");
		let pending = store.begin_upload(&oid(OID)).await.unwrap();
		let temp_path = pending.temp_path().to_path_buf();
		assert!(temp_path.exists());

		drop(pending);
		assert!(!temp_path.exists());
		assert_eq!(store.stat(&oid(OID)).await.unwrap(), None);
	}

	#[tokio::test]
	async fn test_concurrent_uploads_use_distinct_temp_files() {
		let temp = TempDir::new().unwrap();
		let store = ContentStore::new(temp.path(), "repo");
		let a = store.begin_upload(&oid(OID)).await.unwrap();
		let b = store.begin_upload(&oid(OID)).await.unwrap();
		assert_ne!(a.temp_path(), b.temp_path());
	}

	#[tokio::test]
	async fn test_republish_same_oid_replaces_atomically() {
		let temp = TempDir::new().unwrap();
		let store = ContentStore::new(temp.path(), "repo");
		put(&store, &oid(OID), b"hello").await;
		put(&store, &oid(OID), b"hello").await;
		assert_eq!(store.stat(&oid(OID)).await.unwrap(), Some(5));

		let leftovers: Vec<_> = std::fs::read_dir(store.shard_dir(&oid(OID)))
			.unwrap()
			.filter_map(|e| e.ok())
			.filter(|e| e.file_name().to_string_lossy().ends_with(TEMP_SUFFIX))
			.collect();
		assert!(leftovers.is_empty());
	}

	#[tokio::test]
	async fn test_matches_oid() {
		let temp = TempDir::new().unwrap();
		let store = ContentStore::new(temp.path(), "repo");

		// OID is the SHA-256 of "hello"
		let mut good = store.begin_upload(&oid(OID)).await.unwrap();
		good.file().unwrap().write_all(b"hello").await.unwrap();
		assert!(good.matches_oid().await.unwrap());

		let mut bad = store.begin_upload(&oid(OID)).await.unwrap();
		bad.file().unwrap().write_all(b"goodbye").await.unwrap();
		assert!(!bad.matches_oid().await.unwrap());
	}

	#[tokio::test]
	async fn test_create_dir_inheriting_is_idempotent() {
		let temp = TempDir::new().unwrap();
		let dir = temp.path().join("a/b/c");
		create_dir_inheriting(&dir).await.unwrap();
		create_dir_inheriting(&dir).await.unwrap();
		assert!(dir.is_dir());
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_create_dir_inherits_ancestor_mode() {
		use std::os::unix::fs::PermissionsExt;

		let temp = TempDir::new().unwrap();
		let root = temp.path().join("root");
		std::fs::create_dir(&root).unwrap();
		// Group write is masked out by the usual 022 umask
		std::fs::set_permissions(&root, std::fs::Permissions::from_mode(0o775)).unwrap();

		let dir = root.join("x/y");
		create_dir_inheriting(&dir).await.unwrap();
		for created in &[root.join("x"), dir] {
			let mode = std::fs::metadata(created).unwrap().permissions().mode() & 0o777;
			assert_eq!(mode, 0o775, "mode of {}", created.display());
		}
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_create_dir_like_copies_group_write() {
		use std::os::unix::fs::PermissionsExt;

		let temp = TempDir::new().unwrap();
		let template = temp.path().join("template");
		std::fs::create_dir(&template).unwrap();
		std::fs::set_permissions(&template, std::fs::Permissions::from_mode(0o777)).unwrap();

		let dir = temp.path().join("cache");
		create_dir_like(&dir, &template).await.unwrap();
		let mode = std::fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
		assert_eq!(mode, 0o777);
	}
}

// vim: ts=4
