//! # Avatar Session
//!
//! Drives one talking avatar: conversation turns in the background, mouth
//! shapes on the render thread.
//!
//! ## Workflow
//!
//! 1. `start_conversation` moves to `Listening` and spawns the turn on tokio
//! 2. The turn listens, asks the dialogue model, synthesizes the reply,
//!    parses the response and builds the mouth timeline
//! 3. Every step posts a status update on an unbounded channel; the finished
//!    turn posts a [`PreparedUtterance`]
//! 4. The render loop calls [`AvatarSession::tick`] once per frame. It drains
//!    the channel without blocking, starts playback of prepared utterances
//!    and resolves the mouth shape against the device clock
//! 5. When the device stops playing, the session returns to `Idle`
//!
//! A failed step ends the turn with an `Error` status. Nothing in the turn
//! panics the render loop.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core_runtime::config::AvatarConfig;
//! use core_service::{AvatarDependencies, AvatarSession};
//!
//! # async fn example(deps: AvatarDependencies) -> core_service::Result<()> {
//! let session = AvatarSession::new(AvatarConfig::default(), deps)?;
//! session.start_conversation()?;
//!
//! let mut ticker = tokio::time::interval(session.config().tick_interval());
//! loop {
//!     ticker.tick().await;
//!     let frame = session.tick();
//!     println!("{} {}", frame.message, frame.mouth_shape);
//! }
//! # }
//! ```

use crate::error::{Result, ServiceError};
use crate::speech::parse_synthesis_response;
use crate::status::{AvatarStatus, Failure, StatusUpdate};
use bridge_traits::{
    AudioDevice, AudioSource, DialogueModel, ListenOptions, SpeechRecognizer, SpeechSynthesizer,
};
use chrono::{DateTime, Utc};
use core_lipsync::{
    AnalysisWorker, LipSyncConfig, MouthShape, PlaybackState, Timeline, TimelineBuilder,
    TimelineSourceKind,
};
use core_playback::{SampleDecoder, SymphoniaDecoder};
use core_runtime::config::AvatarConfig;
use core_runtime::events::{
    AvatarEvent, ConversationEvent, EventBus, LipSyncEvent, PlaybackEvent,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

// ============================================================================
// Dependencies
// ============================================================================

/// Host-provided collaborators of a session.
#[derive(Clone)]
pub struct AvatarDependencies {
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub dialogue: Arc<dyn DialogueModel>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub device: Arc<dyn AudioDevice>,
    /// Decoder used for volume analysis. Defaults to [`SymphoniaDecoder`].
    pub decoder: Arc<dyn SampleDecoder>,
}

impl AvatarDependencies {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        dialogue: Arc<dyn DialogueModel>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        device: Arc<dyn AudioDevice>,
    ) -> Self {
        Self {
            recognizer,
            dialogue,
            synthesizer,
            device,
            decoder: Arc::new(SymphoniaDecoder::default()),
        }
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn SampleDecoder>) -> Self {
        self.decoder = decoder;
        self
    }
}

impl fmt::Debug for AvatarDependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvatarDependencies").finish_non_exhaustive()
    }
}

// ============================================================================
// Utterances and Frames
// ============================================================================

/// Unique identifier for one spoken reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtteranceId(pub Uuid);

impl UtteranceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UtteranceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A synthesized reply with its finished timeline, waiting to be played.
#[derive(Debug, Clone)]
pub struct PreparedUtterance {
    pub id: UtteranceId,
    pub audio: AudioSource,
    pub timeline: Arc<Timeline>,
    pub source_kind: TimelineSourceKind,
    pub prepared_at: DateTime<Utc>,
}

/// What the presentation layer draws for one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarFrame {
    pub status: AvatarStatus,
    pub message: String,
    pub mouth_shape: MouthShape,
}

#[derive(Debug)]
enum SessionMessage {
    Status(StatusUpdate),
    Utterance(PreparedUtterance),
}

// ============================================================================
// Session
// ============================================================================

struct SessionState {
    status: StatusUpdate,
    playback: PlaybackState,
    utterance: Option<UtteranceId>,
    inbox: mpsc::UnboundedReceiver<SessionMessage>,
}

/// Conversation façade for one avatar.
///
/// `AvatarSession` is `Send + Sync`; an input handler and the render loop
/// may share it through an `Arc`.
pub struct AvatarSession {
    config: AvatarConfig,
    deps: AvatarDependencies,
    worker: AnalysisWorker,
    events: EventBus,
    runtime: Handle,
    outbox: mpsc::UnboundedSender<SessionMessage>,
    state: Mutex<SessionState>,
}

impl AvatarSession {
    /// Create a session on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Fails if `config` is invalid or no runtime is running.
    pub fn new(config: AvatarConfig, deps: AvatarDependencies) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| core_runtime::Error::CapabilityMissing {
            capability: "tokio runtime".to_string(),
            message: "AvatarSession::new must be called within a tokio runtime".to_string(),
        })?;
        Self::with_runtime(config, deps, runtime)
    }

    /// Create a session whose background work runs on `runtime`.
    pub fn with_runtime(
        config: AvatarConfig,
        deps: AvatarDependencies,
        runtime: Handle,
    ) -> Result<Self> {
        config.validate()?;

        let builder = TimelineBuilder::new(LipSyncConfig::from(&config), Arc::clone(&deps.decoder));
        let worker = AnalysisWorker::new(Arc::new(builder), runtime.clone());
        let events = EventBus::new(config.event_buffer_size);
        let (outbox, inbox) = mpsc::unbounded_channel();

        info!(
            window_ms = config.window_ms,
            tick_rate_hz = config.tick_rate_hz,
            language = %config.recognition_language,
            "Avatar session created"
        );

        Ok(Self {
            config,
            deps,
            worker,
            events,
            runtime,
            outbox,
            state: Mutex::new(SessionState {
                status: StatusUpdate::idle(),
                playback: PlaybackState::new(),
                utterance: None,
                inbox,
            }),
        })
    }

    pub fn config(&self) -> &AvatarConfig {
        &self.config
    }

    /// Diagnostic event bus of this session.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn status(&self) -> StatusUpdate {
        self.state.lock().status.clone()
    }

    pub fn is_speaking(&self) -> bool {
        self.state.lock().playback.is_speaking()
    }

    /// Begin a conversation turn in the background.
    ///
    /// # Errors
    ///
    /// [`ServiceError::ConversationInProgress`] unless the session is
    /// `Idle` or `Error`.
    pub fn start_conversation(&self) -> Result<()> {
        let mut state = self.state.lock();
        let current = state.status.status;
        if !current.can_start_conversation() {
            return Err(ServiceError::ConversationInProgress(current));
        }

        self.set_status(&mut state, StatusUpdate::new(AvatarStatus::Listening));

        let turn = ConversationTurn {
            recognizer: Arc::clone(&self.deps.recognizer),
            dialogue: Arc::clone(&self.deps.dialogue),
            synthesizer: Arc::clone(&self.deps.synthesizer),
            worker: self.worker.clone(),
            events: self.events.clone(),
            outbox: self.outbox.clone(),
            listen: ListenOptions {
                language: self.config.recognition_language.clone(),
                timeout: self.config.listen_timeout,
                phrase_time_limit: self.config.phrase_time_limit,
            },
        };
        self.runtime.spawn(turn.run());

        Ok(())
    }

    /// Advance one render tick.
    ///
    /// Applies pending status updates, starts playback of a prepared
    /// utterance and resolves the mouth shape at the device clock.
    pub fn tick(&self) -> AvatarFrame {
        let mut state = self.state.lock();

        while let Ok(message) = state.inbox.try_recv() {
            match message {
                SessionMessage::Status(update) => self.set_status(&mut state, update),
                SessionMessage::Utterance(utterance) => self.begin_utterance(&mut state, utterance),
            }
        }

        let was_speaking = state.playback.is_speaking();
        let mouth_shape = state.playback.tick(self.deps.device.as_ref());

        if was_speaking && !state.playback.is_speaking() {
            if let Some(id) = state.utterance.take() {
                info!(utterance_id = %id, "Playback finished");
                publish(
                    &self.events,
                    AvatarEvent::Playback(PlaybackEvent::Finished {
                        utterance_id: id.to_string(),
                    }),
                );
            }
            self.set_status(&mut state, StatusUpdate::idle());
        }

        AvatarFrame {
            status: state.status.status,
            message: state.status.message.clone(),
            mouth_shape,
        }
    }

    /// Stop the current reply, if any, and return to `Idle`.
    ///
    /// A conversation turn still in flight is not cancelled; its utterance
    /// will play when it arrives.
    pub fn stop_speaking(&self) -> Result<()> {
        let mut state = self.state.lock();
        if !state.playback.is_speaking() {
            return Ok(());
        }

        self.deps
            .device
            .stop()
            .map_err(|e| ServiceError::Device(e.to_string()))?;
        state.playback.stop_playback();
        if let Some(id) = state.utterance.take() {
            publish(
                &self.events,
                AvatarEvent::Playback(PlaybackEvent::Finished {
                    utterance_id: id.to_string(),
                }),
            );
        }
        self.set_status(&mut state, StatusUpdate::idle());
        Ok(())
    }

    fn begin_utterance(&self, state: &mut SessionState, utterance: PreparedUtterance) {
        let device = &self.deps.device;
        let id = utterance.id;

        state.playback.install_timeline(Arc::clone(&utterance.timeline));
        publish(
            &self.events,
            AvatarEvent::LipSync(LipSyncEvent::TimelineInstalled {
                utterance_id: id.to_string(),
                source: utterance.source_kind.to_string(),
                events: utterance.timeline.len(),
            }),
        );

        match device.load(&utterance.audio).and_then(|()| device.play()) {
            Ok(()) => {
                state.playback.start_playback(device.now());
                state.utterance = Some(id);
                info!(
                    utterance_id = %id,
                    source = %utterance.source_kind,
                    events = utterance.timeline.len(),
                    "Playback started"
                );
                publish(
                    &self.events,
                    AvatarEvent::Playback(PlaybackEvent::Started {
                        utterance_id: id.to_string(),
                    }),
                );
                self.set_status(state, StatusUpdate::new(AvatarStatus::Speaking));
            }
            Err(e) => {
                error!(utterance_id = %id, "Failed to load or play audio: {}", e);
                state.playback.stop_playback();
                state.utterance = None;
                publish(
                    &self.events,
                    AvatarEvent::Playback(PlaybackEvent::Failed {
                        utterance_id: id.to_string(),
                        message: e.to_string(),
                    }),
                );
                self.set_status(state, StatusUpdate::error(Failure::Audio));
            }
        }
    }

    fn set_status(&self, state: &mut SessionState, update: StatusUpdate) {
        if state.status == update {
            return;
        }

        debug!(status = %update.status, message = %update.message, "Status changed");
        publish(
            &self.events,
            AvatarEvent::Conversation(ConversationEvent::StatusChanged {
                status: update.status.as_str().to_string(),
                message: update.message.clone(),
            }),
        );
        state.status = update;
    }
}

impl fmt::Debug for AvatarSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvatarSession")
            .field("config", &self.config)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Conversation Turn
// ============================================================================

/// Everything one background turn needs, detached from the session.
struct ConversationTurn {
    recognizer: Arc<dyn SpeechRecognizer>,
    dialogue: Arc<dyn DialogueModel>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    worker: AnalysisWorker,
    events: EventBus,
    outbox: mpsc::UnboundedSender<SessionMessage>,
    listen: ListenOptions,
}

impl ConversationTurn {
    async fn run(self) {
        let message = match self.converse().await {
            Ok(utterance) => SessionMessage::Utterance(utterance),
            Err(failure) => SessionMessage::Status(StatusUpdate::error(failure)),
        };
        self.post(message);
    }

    #[instrument(skip_all)]
    async fn converse(&self) -> std::result::Result<PreparedUtterance, Failure> {
        let heard = match self.recognizer.listen(&self.listen).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                info!("Recognizer returned an empty transcript");
                return Err(Failure::NotUnderstood);
            }
            Err(e) if e.is_no_speech() => {
                info!("Nothing understood: {}", e);
                return Err(Failure::NotUnderstood);
            }
            Err(e) => {
                error!("Speech recognition failed: {}", e);
                return Err(Failure::Microphone);
            }
        };
        info!(characters = heard.chars().count(), "User speech recognized");
        publish(
            &self.events,
            AvatarEvent::Conversation(ConversationEvent::Heard {
                characters: heard.chars().count(),
            }),
        );

        self.post(SessionMessage::Status(StatusUpdate::new(AvatarStatus::Thinking)));
        let reply = self.dialogue.reply(&heard).await.map_err(|e| {
            error!("Dialogue model failed: {}", e);
            Failure::Dialogue
        })?;
        info!(characters = reply.chars().count(), "Reply generated");
        publish(
            &self.events,
            AvatarEvent::Conversation(ConversationEvent::Replied {
                characters: reply.chars().count(),
            }),
        );

        self.post(SessionMessage::Status(StatusUpdate::new(AvatarStatus::Processing)));
        let response = self.synthesizer.synthesize(&reply).await.map_err(|e| {
            error!("Speech synthesis request failed: {}", e);
            Failure::SynthesisApi
        })?;
        let clip = parse_synthesis_response(response).map_err(|e| {
            error!("Speech synthesis response unusable: {}", e);
            Failure::Synthesis
        })?;

        let built = self
            .worker
            .submit(clip.audio.clone(), clip.alignment)
            .wait()
            .await
            .map_err(|e| {
                error!("Timeline build did not complete: {}", e);
                Failure::Synthesis
            })?;

        if let Some(reason) = built.alignment_rejected {
            publish(
                &self.events,
                AvatarEvent::LipSync(LipSyncEvent::AlignmentRejected { reason }),
            );
        }
        if let Some(reason) = built.degraded {
            warn!("Reply will play with a closed mouth");
            publish(
                &self.events,
                AvatarEvent::LipSync(LipSyncEvent::AnalysisDegraded { reason }),
            );
        }

        Ok(PreparedUtterance {
            id: UtteranceId::new(),
            audio: clip.audio,
            timeline: built.timeline,
            source_kind: built.source,
            prepared_at: Utc::now(),
        })
    }

    fn post(&self, message: SessionMessage) {
        if self.outbox.send(message).is_err() {
            debug!("Session dropped, conversation result discarded");
        }
    }
}

fn publish(events: &EventBus, event: AvatarEvent) {
    if events.emit(event).is_err() {
        trace!("No event subscribers");
    }
}
