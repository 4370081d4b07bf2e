use std::io::Write;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Local;
use engine_logging::{engine_debug, engine_info};
use hirex_core::CachedState;
use tempfile::TempPath;

use crate::filename::export_filename;
use crate::persist::{AtomicFileWriter, PersistIoError};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("nothing cached to export")]
    NothingCached,
    #[error("cached PDF is not valid base64: {0}")]
    InvalidBase64(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistIoError),
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PdfVariant {
    #[default]
    Primary,
    Humanized,
}

impl PdfVariant {
    pub fn label(self) -> &'static str {
        match self {
            PdfVariant::Primary => "resume",
            PdfVariant::Humanized => "resume_humanized",
        }
    }
}

/// A decoded binary kept in a temp file while the preview is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobHandle {
    pub id: u64,
    pub label: String,
    pub path: PathBuf,
}

/// Owns every preview blob. Files are deleted on release, on
/// [`BlobRegistry::release_all`], or when the registry is dropped.
#[derive(Default)]
pub struct BlobRegistry {
    next_id: u64,
    blobs: Vec<(u64, TempPath)>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, label: &str, bytes: &[u8]) -> Result<BlobHandle, ExportError> {
        let mut file = tempfile::Builder::new()
            .prefix("hirex-blob-")
            .suffix(".pdf")
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        let temp_path = file.into_temp_path();

        self.next_id += 1;
        let handle = BlobHandle {
            id: self.next_id,
            label: label.to_string(),
            path: temp_path.to_path_buf(),
        };
        self.blobs.push((handle.id, temp_path));
        engine_debug!("Created blob {} at {:?}", handle.id, handle.path);
        Ok(handle)
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Returns `false` if the handle was already released.
    pub fn release(&mut self, handle: &BlobHandle) -> bool {
        let Some(pos) = self.blobs.iter().position(|(id, _)| *id == handle.id) else {
            return false;
        };
        let (_, path) = self.blobs.swap_remove(pos);
        close_blob(path);
        true
    }

    pub fn release_all(&mut self) {
        let count = self.blobs.len();
        for (_, path) in self.blobs.drain(..) {
            close_blob(path);
        }
        if count > 0 {
            engine_debug!("Released {} blob(s)", count);
        }
    }
}

impl Drop for BlobRegistry {
    fn drop(&mut self) {
        self.release_all();
    }
}

fn close_blob(path: TempPath) {
    if let Err(err) = path.close() {
        engine_debug!("Could not remove blob file: {}", err);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedBlob {
    pub path: PathBuf,
    pub handle: BlobHandle,
}

/// Writes cached artifacts into an export directory. Works purely from
/// [`CachedState`]; nothing here touches the network.
#[derive(Debug, Clone)]
pub struct Exporter {
    out_dir: PathBuf,
}

impl Exporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn export_text(
        &self,
        state: &CachedState,
        filename: Option<&str>,
    ) -> Result<PathBuf, ExportError> {
        if !state.has_result() {
            return Err(ExportError::NothingCached);
        }
        let content = state.document_text.as_bytes();
        let filename = match filename {
            Some(name) => name.to_string(),
            None => export_filename(
                &state.company_name,
                &state.role_name,
                "resume",
                "tex",
                content,
                Local::now(),
            ),
        };
        let path = AtomicFileWriter::new(self.out_dir.clone()).write_bytes(&filename, content)?;
        engine_info!("Exported document text to {:?}", path);
        Ok(path)
    }

    /// Decodes `base64`, writes it to the export directory and keeps a preview
    /// copy in `blobs`. Company and role come from `state` when the filename
    /// is generated.
    pub fn export_binary(
        &self,
        state: &CachedState,
        label: &str,
        base64: &str,
        filename: Option<&str>,
        blobs: &mut BlobRegistry,
    ) -> Result<ExportedBlob, ExportError> {
        let bytes = decode_base64(base64)?;
        let filename = match filename {
            Some(name) => name.to_string(),
            None => export_filename(
                &state.company_name,
                &state.role_name,
                label,
                "pdf",
                &bytes,
                Local::now(),
            ),
        };
        let path = AtomicFileWriter::new(self.out_dir.clone()).write_bytes(&filename, &bytes)?;
        let handle = blobs.create(label, &bytes)?;
        engine_info!("Exported {} ({} bytes) to {:?}", label, bytes.len(), path);
        Ok(ExportedBlob { path, handle })
    }

    pub fn export_pdf(
        &self,
        state: &CachedState,
        variant: PdfVariant,
        filename: Option<&str>,
        blobs: &mut BlobRegistry,
    ) -> Result<ExportedBlob, ExportError> {
        if !state.has_result() {
            return Err(ExportError::NothingCached);
        }
        let encoded = match variant {
            PdfVariant::Primary => state.primary_pdf_base64.as_deref(),
            PdfVariant::Humanized => state.secondary_pdf_base64.as_deref(),
        }
        .ok_or(ExportError::NothingCached)?;
        self.export_binary(state, variant.label(), encoded, filename, blobs)
    }
}

/// Accepts bare base64 or a `data:...;base64,` URL.
fn decode_base64(input: &str) -> Result<Vec<u8>, ExportError> {
    let trimmed = input.trim();
    let payload = match trimmed.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => trimmed,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|err| ExportError::InvalidBase64(err.to_string()))
}
