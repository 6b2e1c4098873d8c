//! Opaque handle to the bytes uploaded for one job.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Immutable upload source. Files on disk are streamed by the transport;
/// in-memory buffers are shared between clones.
#[derive(Debug, Clone)]
pub enum Payload {
    Path { path: PathBuf, len: u64 },
    Memory { name: String, bytes: Arc<[u8]> },
}

impl Payload {
    /// Payload backed by a file on disk. Records the size at admission time.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path)?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            ));
        }
        Ok(Payload::Path {
            path: path.to_path_buf(),
            len: meta.len(),
        })
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Payload::Memory {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Base file name used as the job id and as the multipart filename.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Payload::Path { path, .. } => path.file_name().and_then(|n| n.to_str()),
            Payload::Memory { name, .. } => Some(name.as_str()),
        }
    }

    pub fn len(&self) -> u64 {
        match self {
            Payload::Path { len, .. } => *len,
            Payload::Memory { bytes, .. } => bytes.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short description for error messages.
    pub fn describe(&self) -> String {
        match self {
            Payload::Path { path, .. } => path.display().to_string(),
            Payload::Memory { name, .. } => format!("<memory:{name}>"),
        }
    }
}
