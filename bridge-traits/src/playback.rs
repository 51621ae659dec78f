//! Playback bridge traits and supporting audio types.
//!
//! The host owns the audio device. The core only tells it what to load, when
//! to start, and asks two questions every render tick: "are you still
//! playing?" and "what time is it?".

use bytes::Bytes;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;

/// Encoded audio handed to a device or a decoder.
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Local file accessible to the host runtime.
    LocalFile { path: PathBuf },
    /// In-memory encoded audio (e.g. the body of a speech-synthesis response).
    MemoryBuffer {
        data: Bytes,
        /// MIME type reported by the producer, used as a format hint.
        mime_type: Option<String>,
    },
}

impl AudioSource {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        AudioSource::LocalFile { path: path.into() }
    }

    pub fn memory(data: impl Into<Bytes>, mime_type: Option<String>) -> Self {
        AudioSource::MemoryBuffer {
            data: data.into(),
            mime_type,
        }
    }

    /// Size in bytes when the data is already in memory.
    pub fn estimated_size(&self) -> Option<usize> {
        match self {
            AudioSource::MemoryBuffer { data, .. } => Some(data.len()),
            AudioSource::LocalFile { .. } => None,
        }
    }

    /// Short description suitable for log fields.
    pub fn describe(&self) -> String {
        match self {
            AudioSource::LocalFile { path } => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            AudioSource::MemoryBuffer { data, mime_type } => format!(
                "memory buffer ({} bytes, {})",
                data.len(),
                mime_type.as_deref().unwrap_or("unknown type")
            ),
        }
    }
}

/// Audio playback device provided by the host.
///
/// Control calls (`load`, `play`, `stop`) may fail; queries (`is_playing`,
/// `now`) must be cheap and infallible because they are made on every render
/// tick.
pub trait AudioDevice: Send + Sync {
    /// Load a clip, replacing whatever was loaded before.
    fn load(&self, source: &AudioSource) -> Result<()>;

    /// Start playing the loaded clip from the beginning.
    fn play(&self) -> Result<()>;

    /// Stop playback. Stopping an idle device is not an error.
    fn stop(&self) -> Result<()>;

    /// Whether the device is still producing sound for the current clip.
    fn is_playing(&self) -> bool;

    /// Monotonic time reading of the audio subsystem.
    fn now(&self) -> Duration;
}
