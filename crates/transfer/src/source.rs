use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::TransferError;

/// Fallback MIME type when the extension is unknown.
const OCTET_STREAM: &str = "application/octet-stream";

/// Where the bytes of an [`UploadFile`] live.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// A file on disk, opened for every range read.
    Path(PathBuf),
    /// An in-memory buffer shared with the caller.
    Memory(Arc<[u8]>),
}

/// A file handed to the uploader by its host.
///
/// The uploader only ever reads from it.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub source: FileSource,
}

impl UploadFile {
    /// Describes a file on disk. Size comes from metadata, MIME type from the
    /// extension.
    pub fn from_path(path: &Path) -> Result<Self, TransferError> {
        let size = std::fs::metadata(path)?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Self {
            mime_type: guess_mime(&name),
            name,
            size,
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    /// Wraps an in-memory buffer.
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        let data: Arc<[u8]> = data.into();
        Self {
            mime_type: guess_mime(&name),
            size: data.len() as u64,
            name,
            source: FileSource::Memory(data),
        }
    }

    /// Returns `true` for `image/*` MIME types.
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Reads the half-open byte range `[start, end)`.
    pub fn read_range(&self, start: u64, end: u64) -> Result<Vec<u8>, TransferError> {
        if start > end || end > self.size {
            return Err(TransferError::InvalidRange {
                start,
                end,
                size: self.size,
            });
        }
        let len = (end - start) as usize;

        match &self.source {
            FileSource::Memory(data) => Ok(data[start as usize..end as usize].to_vec()),
            FileSource::Path(path) => {
                let mut file = std::fs::File::open(path)?;
                file.seek(SeekFrom::Start(start))?;
                let mut buf = vec![0u8; len];
                file.read_exact(&mut buf)?;
                Ok(buf)
            }
        }
    }

    /// Async [`read_range`](Self::read_range); disk reads run on the
    /// blocking pool.
    pub async fn read_range_async(&self, start: u64, end: u64) -> Result<Vec<u8>, TransferError> {
        match &self.source {
            FileSource::Memory(_) => self.read_range(start, end),
            FileSource::Path(_) => {
                let file = self.clone();
                tokio::task::spawn_blocking(move || file.read_range(start, end))
                    .await
                    .map_err(|e| TransferError::Join(e.to_string()))?
            }
        }
    }
}

fn guess_mime(name: &str) -> String {
    mime_guess::from_path(name)
        .first_raw()
        .unwrap_or(OCTET_STREAM)
        .to_string()
}
