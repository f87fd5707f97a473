//! Filesystem blob storage for uploaded files.
//!
//! Blobs live under the blob directory at their logical path:
//! ```text
//! <BLOB_DIR>/
//!   profilePics/<uid>
//!   posts/<millis>_<filename>
//!   study-materials/<millis>_<filename>
//!   ...
//! ```
//!
//! Each upload returns the public URL recorded on the owning document.

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Top-level blob folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobKind {
    ProfilePic,
    Post,
    Event,
    LostFound,
    StudyMaterial,
    Marketplace,
}

impl BlobKind {
    pub fn folder(&self) -> &'static str {
        match self {
            BlobKind::ProfilePic => "profilePics",
            BlobKind::Post => "posts",
            BlobKind::Event => "events",
            BlobKind::LostFound => "lostfound",
            BlobKind::StudyMaterial => "study-materials",
            BlobKind::Marketplace => "marketplace",
        }
    }
}

/// Validated logical path of a blob, always `<folder>/<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobPath(String);

impl BlobPath {
    /// `profilePics/{uid}`
    pub fn profile_pic(uid: &str) -> Result<Self> {
        Self::new(BlobKind::ProfilePic, uid)
    }

    /// `{folder}/{millis}_{filename}`, keeping only the final component of `filename`.
    pub fn timestamped(kind: BlobKind, filename: &str) -> Result<Self> {
        let name = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(filename);
        Self::new(
            kind,
            &format!("{}_{}", Utc::now().timestamp_millis(), name),
        )
    }

    fn new(kind: BlobKind, name: &str) -> Result<Self> {
        validate_name(name)?;
        Ok(Self(format!("{}/{}", kind.folder(), name)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filename part after the folder.
    pub fn name(&self) -> &str {
        self.0.split_once('/').map(|(_, n)| n).unwrap_or(&self.0)
    }
}

/// Rejects empty names and anything that could escape the folder.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.starts_with('.')
    {
        return Err(Error::Invalid(format!("Invalid file name: {}", name)));
    }
    Ok(())
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRef {
    pub path: BlobPath,
    pub url: String,
    pub size: u64,
    /// Hex SHA-256 of the stored bytes.
    pub sha256: String,
}

/// A file supplied by the caller for upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Reads a local file into an upload named after it.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self { filename, bytes })
    }

    /// Lowercased extension, or `"file"` when there is none.
    pub fn file_type(&self) -> String {
        Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_else(|| "file".to_string())
    }
}

#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn file_path(&self, path: &BlobPath) -> PathBuf {
        self.root.join(path.as_str())
    }

    /// Public URL for a blob path, with each segment percent-encoded.
    pub fn url_for(&self, path: &BlobPath) -> String {
        let encoded: Vec<String> = path
            .as_str()
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.public_base_url, encoded.join("/"))
    }

    /// Stores `bytes` at `path`, replacing any existing blob.
    pub async fn upload(&self, path: BlobPath, bytes: &[u8]) -> Result<BlobRef> {
        let file_path = self.file_path(&path);

        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write atomically using temp file + rename
        let temp_path = file_path.with_extension("upload.tmp");
        tokio::fs::write(&temp_path, bytes).await?;
        tokio::fs::rename(&temp_path, &file_path).await?;

        let digest = Sha256::digest(bytes);
        let sha256 = digest.iter().map(|b| format!("{:02x}", b)).collect();

        tracing::info!("Uploaded blob {} ({} bytes)", path.as_str(), bytes.len());

        Ok(BlobRef {
            url: self.url_for(&path),
            size: bytes.len() as u64,
            sha256,
            path,
        })
    }

    /// Removes a blob. Removing a missing blob succeeds.
    pub async fn delete(&self, path: &BlobPath) -> Result<()> {
        match tokio::fs::remove_file(self.file_path(path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Uploads a caller file under a timestamped name in `kind`'s folder.
    pub async fn upload_file(&self, kind: BlobKind, upload: &Upload) -> Result<BlobRef> {
        let path = BlobPath::timestamped(kind, &upload.filename)?;
        self.upload(path, &upload.bytes).await
    }
}
