//! Content-addressed blob storage.

use crate::error::{Error, Result};
use crate::models::Digest;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct ObjectStore {
    objects_dir: PathBuf,
}

impl ObjectStore {
    pub fn new<P: AsRef<Path>>(objects_dir: P) -> Result<Self> {
        let objects_dir = objects_dir.as_ref().to_path_buf();
        fs::create_dir_all(&objects_dir)?;
        Ok(Self { objects_dir })
    }

    pub fn path_for(&self, digest: &Digest) -> PathBuf {
        self.objects_dir.join(digest.as_str())
    }

    pub fn put(&self, content: &[u8]) -> Result<Digest> {
        let digest = Digest::of(content);
        let target = self.path_for(&digest);

        if target.exists() {
            debug!("Blob {} already stored", digest.short());
            return Ok(digest);
        }

        let tmp_path = self.objects_dir.join(format!(
            ".tmp-{}-{}-{}",
            digest.short(),
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let write_result = (|| -> std::io::Result<()> {
            let mut file = File::create(&tmp_path)?;
            file.write_all(content)?;
            file.sync_all()?;
            fs::rename(&tmp_path, &target)
        })();

        if let Err(e) = write_result {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        debug!("Stored blob {} ({} bytes)", digest.short(), content.len());
        Ok(digest)
    }

    pub fn get(&self, digest: &Digest) -> Result<Vec<u8>> {
        match fs::read(self.path_for(digest)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(Error::ObjectNotFound(digest.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn exists(&self, digest: &Digest) -> bool {
        self.path_for(digest).is_file()
    }

    pub fn digests(&self) -> Result<Vec<Digest>> {
        let mut digests = Vec::new();
        for entry in fs::read_dir(&self.objects_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if Digest::is_valid(name) {
                    digests.push(Digest::parse(name)?);
                }
            }
        }
        digests.sort();
        Ok(digests)
    }

    pub fn verify_blob(&self, digest: &Digest) -> Result<bool> {
        let file = File::open(self.path_for(digest)).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::ObjectNotFound(digest.to_string()),
            _ => Error::Io(e),
        })?;
        Ok(Digest::from_reader(file)? == *digest)
    }
}
