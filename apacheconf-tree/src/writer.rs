//! Writers persisting rendered files

use crate::node::Node;
use crate::render::render;
use apacheconf_core::Result;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Persists the top-level nodes of one configuration file
pub trait ConfigWriter {
    fn write(&self, path: &Path, nodes: &[Node]) -> Result<()>;
}

/// Writes rendered text to the file system
#[derive(Debug, Default, Clone, Copy)]
pub struct FsWriter;

impl ConfigWriter for FsWriter {
    fn write(&self, path: &Path, nodes: &[Node]) -> Result<()> {
        let text = render(nodes);
        std::fs::write(path, &text)?;
        tracing::info!("Wrote {} ({} bytes)", path.display(), text.len());
        Ok(())
    }
}

/// Keeps rendered text in memory
#[derive(Debug, Default)]
pub struct MemoryWriter {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemoryWriter {
    /// Last text written for `path`
    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.lock().get(path.as_ref()).cloned()
    }

    /// Everything written so far
    pub fn files(&self) -> BTreeMap<PathBuf, String> {
        self.files.lock().clone()
    }
}

impl ConfigWriter for MemoryWriter {
    fn write(&self, path: &Path, nodes: &[Node]) -> Result<()> {
        self.files.lock().insert(path.to_path_buf(), render(nodes));
        Ok(())
    }
}
