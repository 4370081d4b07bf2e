//! HIREX engine: storage, transport and effect execution.
mod cache;
mod cancel;
mod clipboard;
mod engine;
mod events;
mod export;
mod filename;
pub mod keys;
mod notify;
mod persist;
mod preferences;
mod storage;
mod transport;

pub use cache::{PersistError, ResultCache};
pub use cancel::{AbortReason, AbortToken};
#[cfg(feature = "clipboard")]
pub use clipboard::SystemClipboard;
pub use clipboard::{copy_text, Clipboard};
pub use engine::{EngineEvent, EngineHandle};
pub use events::{ChangeBus, StorageChange, StorageEvents, Subscription};
pub use export::{BlobHandle, BlobRegistry, ExportError, ExportedBlob, Exporter, PdfVariant};
pub use filename::{export_filename, sanitize_component};
pub use notify::{
    AlertFallback, Clock, ManualClock, Notice, NotificationSurface, Notifier, SystemClock,
    DEFAULT_NOTICE_DURATION,
};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistIoError};
pub use preferences::{Preferences, Theme};
pub use storage::{
    FileBackend, MemoryBackend, StorageAdapter, StorageBackend, StorageError, DEFAULT_QUOTA_BYTES,
};
pub use transport::{
    DiagnosticsSink, ReqwestTransport, Transport, TransportError, TransportSettings,
    EMPTY_OUTPUT_MESSAGE,
};
