//! Where template artwork comes from.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use async_trait::async_trait;

use crate::foundation::error::{PledgeError, PledgeResult};

/// Asynchronous provider of encoded image bytes.
///
/// Implementations only fetch; decoding happens in the compositor so that a failure in either
/// step is reported the same way.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Human-readable identity used in logs.
    fn describe(&self) -> String;

    /// Fetch the encoded bytes.
    async fn load(&self) -> PledgeResult<Arc<Vec<u8>>>;
}

/// Template read from the filesystem on every load.
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ImageSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> PledgeResult<Arc<Vec<u8>>> {
        let path = self.path.clone();
        let bytes = tokio::task::spawn_blocking(move || {
            std::fs::read(&path).with_context(|| format!("read image bytes from '{}'", path.display()))
        })
        .await
        .map_err(|e| PledgeError::Other(anyhow::anyhow!("file read task failed: {e}")))??;
        Ok(Arc::new(bytes))
    }
}

/// Template held in memory, e.g. bundled with the binary or preloaded by the shell.
#[derive(Clone, Debug)]
pub struct MemorySource {
    label: String,
    bytes: Arc<Vec<u8>>,
}

impl MemorySource {
    pub fn new(label: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            bytes: Arc::new(bytes),
        }
    }
}

#[async_trait]
impl ImageSource for MemorySource {
    fn describe(&self) -> String {
        format!("memory:{}", self.label)
    }

    async fn load(&self) -> PledgeResult<Arc<Vec<u8>>> {
        Ok(self.bytes.clone())
    }
}
