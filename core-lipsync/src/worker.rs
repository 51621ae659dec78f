//! # Analysis Worker
//!
//! Builds timelines off the render thread.
//!
//! Decoding and RMS over a whole clip is O(samples), so the work runs on
//! tokio's blocking pool. The caller gets an [`AnalysisHandle`] it can poll
//! without blocking once per tick, or await from async code.
//!
//! ```rust,no_run
//! use bridge_traits::AudioSource;
//! use core_lipsync::{AnalysisWorker, LipSyncConfig, TimelineBuilder};
//! use std::sync::Arc;
//!
//! # fn example(runtime: tokio::runtime::Handle) {
//! let builder = Arc::new(TimelineBuilder::with_default_decoder(LipSyncConfig::default()));
//! let worker = AnalysisWorker::new(builder, runtime);
//! let mut handle = worker.submit(AudioSource::local("/tmp/reply.mp3"), None);
//!
//! loop {
//!     if let Some(result) = handle.try_take() {
//!         println!("{:?}", result.map(|built| built.timeline.len()));
//!         break;
//!     }
//!     // render a frame
//! }
//! # }
//! ```

use crate::alignment::AlignmentData;
use crate::error::{LipSyncError, Result};
use crate::source::{BuiltTimeline, TimelineBuilder};
use bridge_traits::AudioSource;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::debug;

/// Submits timeline builds to the blocking pool of a tokio runtime.
#[derive(Debug, Clone)]
pub struct AnalysisWorker {
    builder: Arc<TimelineBuilder>,
    runtime: Handle,
}

impl AnalysisWorker {
    pub fn new(builder: Arc<TimelineBuilder>, runtime: Handle) -> Self {
        Self { builder, runtime }
    }

    /// Worker on the runtime the caller is running in.
    ///
    /// # Errors
    ///
    /// [`LipSyncError::WorkerCancelled`] when called outside a runtime.
    pub fn current(builder: Arc<TimelineBuilder>) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| LipSyncError::WorkerCancelled)?;
        Ok(Self::new(builder, runtime))
    }

    pub fn builder(&self) -> &Arc<TimelineBuilder> {
        &self.builder
    }

    /// Start building the timeline for `audio`.
    pub fn submit(&self, audio: AudioSource, alignment: Option<AlignmentData>) -> AnalysisHandle {
        let (tx, rx) = oneshot::channel();
        let builder = Arc::clone(&self.builder);

        self.runtime.spawn_blocking(move || {
            let built = builder.build(&audio, alignment.as_ref());
            if tx.send(built).is_err() {
                debug!("Analysis result discarded, handle dropped");
            }
        });

        AnalysisHandle { rx }
    }
}

/// Completion handle for one submitted build.
#[derive(Debug)]
pub struct AnalysisHandle {
    rx: oneshot::Receiver<BuiltTimeline>,
}

impl AnalysisHandle {
    /// Non-blocking poll.
    ///
    /// `None` while the build is still running. After a result has been
    /// returned, further calls report [`LipSyncError::WorkerCancelled`].
    pub fn try_take(&mut self) -> Option<Result<BuiltTimeline>> {
        match self.rx.try_recv() {
            Ok(built) => Some(Ok(built)),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(LipSyncError::WorkerCancelled)),
        }
    }

    /// Wait for the build to finish.
    pub async fn wait(self) -> Result<BuiltTimeline> {
        self.rx.await.map_err(|_| LipSyncError::WorkerCancelled)
    }
}
