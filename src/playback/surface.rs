//! The editor the driver types into.

use std::fmt;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::state::{Persistent, StateError, StateStore};

/// Handle to a document open in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("document {0} is not open")]
    UnknownDocument(DocumentId),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    State(#[from] StateError),
}

/// Operations playback and recording need from a host editor.
///
/// Offsets and ranges count characters, matching
/// [`EditOperation`](crate::diff::EditOperation).
pub trait EditorSurface {
    /// Open the tab for a workspace-relative file, creating it if needed.
    fn open(&mut self, file: &str) -> Result<DocumentId, SurfaceError>;

    fn is_open(&self, doc: DocumentId) -> bool;

    /// The active selection; a caret is an empty range.
    fn selection(&self, doc: DocumentId) -> Result<Range<usize>, SurfaceError>;

    /// Replace the active selection. Out-of-range offsets are clamped.
    fn set_selection(&mut self, doc: DocumentId, range: Range<usize>) -> Result<(), SurfaceError>;

    /// Erase the selected text, leaving a caret at its start.
    fn erase_selection(&mut self, doc: DocumentId) -> Result<(), SurfaceError>;

    /// Insert `text` at `position`, leaving the caret after it.
    fn insert(&mut self, doc: DocumentId, position: usize, text: &str) -> Result<(), SurfaceError>;

    fn text(&self, doc: DocumentId) -> Result<String, SurfaceError>;

    /// Replace the whole content of a document.
    fn replace_text(&mut self, doc: DocumentId, text: &str) -> Result<(), SurfaceError>;

    fn save(&mut self, doc: DocumentId) -> Result<(), SurfaceError>;

    fn set_status(&mut self, doc: DocumentId, status: &str);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Buffer {
    file: String,
    #[serde(rename = "text", with = "char_text")]
    chars: Vec<char>,
    selection: Range<usize>,
    dirty: bool,
}

mod char_text {
    use super::*;

    pub fn serialize<S: Serializer>(chars: &[char], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&chars.iter().collect::<String>())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<char>, D::Error> {
        String::deserialize(deserializer).map(|text| text.chars().collect())
    }
}

/// Open buffers of a headless surface, kept so unsaved edits outlive the
/// process.
#[derive(Debug, Serialize, Deserialize)]
struct SurfaceState {
    buffers: Vec<Buffer>,
}

impl Persistent for SurfaceState {
    const STATE_KEY: &'static str = "live-demo-surface";
    const VERSION: u32 = 1;
}

/// Headless editor keeping documents in memory and saving them under a
/// workspace root.
///
/// Built with [`with_store`](Self::with_store), every change to a buffer is
/// persisted so a later process picks up the same text and selection.
#[derive(Debug)]
pub struct BufferSurface {
    root: PathBuf,
    buffers: Vec<Buffer>,
    status: String,
    store: Option<StateStore>,
}

impl BufferSurface {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            buffers: Vec::new(),
            status: String::new(),
            store: None,
        }
    }

    /// A surface persisted in `store`, restoring the buffers a previous
    /// surface left for the same root.
    pub fn with_store(root: impl Into<PathBuf>, store: StateStore) -> Self {
        let root = root.into();
        let buffers = store
            .load::<SurfaceState>(&root)
            .map(|state| state.buffers)
            .unwrap_or_default();
        if !buffers.is_empty() {
            tracing::debug!(
                root = %root.display(),
                buffers = buffers.len(),
                "restored editor buffers"
            );
        }
        Self {
            root,
            buffers,
            status: String::new(),
            store: Some(store),
        }
    }

    /// Forget the persisted buffers. In-memory buffers are kept.
    pub fn discard(&self) -> Result<(), SurfaceError> {
        if let Some(store) = &self.store {
            store.delete::<SurfaceState>(&self.root)?;
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), SurfaceError> {
        if let Some(store) = &self.store {
            let state = SurfaceState {
                buffers: self.buffers.clone(),
            };
            store.save(&self.root, &state)?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Last status message shown.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Find the document already open for `file`.
    pub fn find(&self, file: &str) -> Option<DocumentId> {
        self.buffers
            .iter()
            .position(|b| b.file == file)
            .map(|index| DocumentId(index as u64))
    }

    fn buffer(&self, doc: DocumentId) -> Result<&Buffer, SurfaceError> {
        self.buffers
            .get(doc.0 as usize)
            .ok_or(SurfaceError::UnknownDocument(doc))
    }

    fn buffer_mut(&mut self, doc: DocumentId) -> Result<&mut Buffer, SurfaceError> {
        self.buffers
            .get_mut(doc.0 as usize)
            .ok_or(SurfaceError::UnknownDocument(doc))
    }

    fn read_disk(&self, file: &str) -> Result<Vec<char>, SurfaceError> {
        let path = self.root.join(file);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(text.chars().collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(SurfaceError::Io { path, source }),
        }
    }
}

impl EditorSurface for BufferSurface {
    fn open(&mut self, file: &str) -> Result<DocumentId, SurfaceError> {
        if let Some(doc) = self.find(file) {
            // Clean buffers follow the file on disk, as an editor reloads a
            // view whose file changed underneath it.
            if !self.buffer(doc)?.dirty {
                let chars = self.read_disk(file)?;
                let buffer = self.buffer_mut(doc)?;
                if buffer.chars != chars {
                    buffer.chars = chars;
                    buffer.selection = 0..0;
                }
            }
            self.persist()?;
            return Ok(doc);
        }

        let chars = self.read_disk(file)?;
        self.buffers.push(Buffer {
            file: file.to_string(),
            chars,
            selection: 0..0,
            dirty: false,
        });
        self.persist()?;
        Ok(DocumentId(self.buffers.len() as u64 - 1))
    }

    fn is_open(&self, doc: DocumentId) -> bool {
        (doc.0 as usize) < self.buffers.len()
    }

    fn selection(&self, doc: DocumentId) -> Result<Range<usize>, SurfaceError> {
        Ok(self.buffer(doc)?.selection.clone())
    }

    fn set_selection(&mut self, doc: DocumentId, range: Range<usize>) -> Result<(), SurfaceError> {
        let buffer = self.buffer_mut(doc)?;
        let len = buffer.chars.len();
        let start = range.start.min(len);
        buffer.selection = start..range.end.clamp(start, len);
        self.persist()
    }

    fn erase_selection(&mut self, doc: DocumentId) -> Result<(), SurfaceError> {
        let buffer = self.buffer_mut(doc)?;
        let selection = buffer.selection.clone();
        if !selection.is_empty() {
            buffer.chars.drain(selection.clone());
            buffer.dirty = true;
        }
        buffer.selection = selection.start..selection.start;
        self.persist()
    }

    fn insert(&mut self, doc: DocumentId, position: usize, text: &str) -> Result<(), SurfaceError> {
        let buffer = self.buffer_mut(doc)?;
        let position = position.min(buffer.chars.len());
        let count = text.chars().count();
        buffer.chars.splice(position..position, text.chars());
        buffer.selection = position + count..position + count;
        buffer.dirty |= count > 0;
        self.persist()
    }

    fn text(&self, doc: DocumentId) -> Result<String, SurfaceError> {
        Ok(self.buffer(doc)?.chars.iter().collect())
    }

    fn replace_text(&mut self, doc: DocumentId, text: &str) -> Result<(), SurfaceError> {
        let buffer = self.buffer_mut(doc)?;
        buffer.chars = text.chars().collect();
        buffer.selection = 0..0;
        buffer.dirty = true;
        self.persist()
    }

    fn save(&mut self, doc: DocumentId) -> Result<(), SurfaceError> {
        let path = self.root.join(&self.buffer(doc)?.file);
        let io_err = |source: std::io::Error| SurfaceError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let text = self.text(doc)?;
        fs::write(&path, text).map_err(io_err)?;
        self.buffer_mut(doc)?.dirty = false;
        self.persist()
    }

    fn set_status(&mut self, _doc: DocumentId, status: &str) {
        self.status = status.to_string();
    }
}
