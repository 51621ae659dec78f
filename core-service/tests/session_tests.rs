//! Conversation turns end to end, with mocked speech services and a fake
//! audio device driven by a manual clock.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bridge_traits::time::{Clock, ManualClock};
use bridge_traits::{
    AudioDevice, AudioSource, BridgeError, DialogueModel, ListenOptions, SpeechRecognizer,
    SpeechSynthesizer, SynthesisResponse,
};
use core_lipsync::MouthShape;
use core_runtime::config::AvatarConfig;
use core_runtime::events::{AvatarEvent, LipSyncEvent, PlaybackEvent};
use core_service::{AvatarDependencies, AvatarFrame, AvatarSession, AvatarStatus, ServiceError};
use mockall::mock;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

mock! {
    Recognizer {}

    #[async_trait]
    impl SpeechRecognizer for Recognizer {
        async fn listen(&self, options: &ListenOptions) -> bridge_traits::Result<String>;
    }
}

mock! {
    Dialogue {}

    #[async_trait]
    impl DialogueModel for Dialogue {
        async fn reply(&self, user_text: &str) -> bridge_traits::Result<String>;
    }
}

mock! {
    Synthesizer {}

    #[async_trait]
    impl SpeechSynthesizer for Synthesizer {
        async fn synthesize(&self, text: &str) -> bridge_traits::Result<SynthesisResponse>;
    }
}

// ============================================================================
// Fake device
// ============================================================================

struct FakeDevice {
    clock: ManualClock,
    playing: AtomicBool,
    fail_play: bool,
    loaded: Mutex<Vec<AudioSource>>,
}

impl FakeDevice {
    fn new() -> Arc<Self> {
        Self::with_play_failure(false)
    }

    fn broken() -> Arc<Self> {
        Self::with_play_failure(true)
    }

    fn with_play_failure(fail_play: bool) -> Arc<Self> {
        Arc::new(Self {
            clock: ManualClock::starting_at(Duration::from_secs(100)),
            playing: AtomicBool::new(false),
            fail_play,
            loaded: Mutex::new(Vec::new()),
        })
    }

    fn finish(&self) {
        self.playing.store(false, Ordering::SeqCst);
    }

    fn loaded_bytes(&self) -> Vec<u8> {
        match self.loaded.lock().last() {
            Some(AudioSource::MemoryBuffer { data, .. }) => data.to_vec(),
            _ => Vec::new(),
        }
    }
}

impl AudioDevice for FakeDevice {
    fn load(&self, source: &AudioSource) -> bridge_traits::Result<()> {
        self.loaded.lock().push(source.clone());
        Ok(())
    }

    fn play(&self) -> bridge_traits::Result<()> {
        if self.fail_play {
            return Err(BridgeError::OperationFailed("mixer not initialized".to_string()));
        }
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> bridge_traits::Result<()> {
        self.finish();
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn now(&self) -> Duration {
        self.clock.now()
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn recognizer_saying(text: &'static str) -> MockRecognizer {
    let mut recognizer = MockRecognizer::new();
    recognizer
        .expect_listen()
        .withf(|options| options.language == "pt-BR")
        .times(1)
        .returning(move |_| Ok(text.to_string()));
    recognizer
}

fn dialogue_replying(text: &'static str) -> MockDialogue {
    let mut dialogue = MockDialogue::new();
    dialogue
        .expect_reply()
        .times(1)
        .returning(move |_| Ok(text.to_string()));
    dialogue
}

fn synthesizer_returning(response: SynthesisResponse) -> MockSynthesizer {
    let mut synthesizer = MockSynthesizer::new();
    synthesizer
        .expect_synthesize()
        .times(1)
        .returning(move |_| Ok(response.clone()));
    synthesizer
}

fn aligned_response(audio: &[u8]) -> SynthesisResponse {
    let body = serde_json::json!({
        "audio_base64": STANDARD.encode(audio),
        "alignment": {
            "characters": ["b", "o", "m"],
            "character_start_times_seconds": [0.0, 0.1, 0.2],
            "character_end_times_seconds": [0.1, 0.2, 0.3]
        }
    });
    SynthesisResponse::new("application/json", body.to_string().into_bytes())
}

fn wav_bytes(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVEfmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}

fn session(
    recognizer: MockRecognizer,
    dialogue: MockDialogue,
    synthesizer: MockSynthesizer,
    device: Arc<FakeDevice>,
) -> AvatarSession {
    let deps = AvatarDependencies::new(
        Arc::new(recognizer),
        Arc::new(dialogue),
        Arc::new(synthesizer),
        device,
    );
    AvatarSession::new(AvatarConfig::default(), deps).unwrap()
}

/// Tick until the session leaves the in-flight statuses.
async fn tick_until_settled(session: &AvatarSession) -> AvatarFrame {
    for _ in 0..1000 {
        let frame = session.tick();
        if matches!(frame.status, AvatarStatus::Speaking | AvatarStatus::Error) {
            return frame;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("conversation turn did not settle");
}

fn drain(stream: &mut core_runtime::events::EventStream) -> Vec<AvatarEvent> {
    let mut events = Vec::new();
    while let Some(Ok(event)) = stream.try_recv() {
        events.push(event);
    }
    events
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_turn_with_alignment_drives_mouth() {
    let device = FakeDevice::new();
    let session = session(
        recognizer_saying("Olá"),
        dialogue_replying("bom"),
        synthesizer_returning(aligned_response(b"ID3 fake mp3")),
        Arc::clone(&device),
    );
    let mut events = session.events().stream();

    assert_eq!(session.tick().status, AvatarStatus::Idle);
    session.start_conversation().unwrap();
    assert_eq!(session.status().status, AvatarStatus::Listening);
    assert_eq!(session.status().message, "Ouvindo...");
    assert!(matches!(
        session.start_conversation(),
        Err(ServiceError::ConversationInProgress(AvatarStatus::Listening))
    ));

    let frame = tick_until_settled(&session).await;
    assert_eq!(frame.status, AvatarStatus::Speaking);
    assert_eq!(frame.message, "Falando...");
    assert_eq!(frame.mouth_shape, MouthShape::Closed);
    assert_eq!(device.loaded_bytes(), b"ID3 fake mp3");

    device.clock.advance(Duration::from_millis(120));
    assert_eq!(session.tick().mouth_shape, MouthShape::Open);
    device.clock.advance(Duration::from_millis(100));
    assert_eq!(session.tick().mouth_shape, MouthShape::Closed);

    device.finish();
    let frame = session.tick();
    assert_eq!(frame.status, AvatarStatus::Idle);
    assert_eq!(frame.message, "Pressione 'Espaço' para falar");
    assert_eq!(frame.mouth_shape, MouthShape::Closed);
    assert!(!session.is_speaking());

    let events = drain(&mut events);
    assert!(events.iter().any(|e| matches!(
        e,
        AvatarEvent::LipSync(LipSyncEvent::TimelineInstalled { source, events: 3, .. })
            if source == "alignment"
    )));
    assert!(events
        .iter()
        .any(|e| matches!(e, AvatarEvent::Playback(PlaybackEvent::Started { .. }))));
    assert!(events
        .iter()
        .any(|e| matches!(e, AvatarEvent::Playback(PlaybackEvent::Finished { .. }))));
}

#[tokio::test]
async fn test_raw_audio_uses_volume_analysis() {
    // 16 kHz, 50 ms windows of 800 samples: loud then silent
    let mut samples = vec![15000i16; 800];
    samples.extend(vec![0i16; 800]);

    let device = FakeDevice::new();
    let session = session(
        recognizer_saying("conta uma piada"),
        dialogue_replying("Não."),
        synthesizer_returning(SynthesisResponse::new("audio/wav", wav_bytes(&samples, 16000))),
        Arc::clone(&device),
    );
    let mut events = session.events().stream();

    session.start_conversation().unwrap();
    let frame = tick_until_settled(&session).await;

    assert_eq!(frame.status, AvatarStatus::Speaking);
    assert_eq!(frame.mouth_shape, MouthShape::Open);
    device.clock.advance(Duration::from_millis(60));
    assert_eq!(session.tick().mouth_shape, MouthShape::Closed);

    assert!(drain(&mut events).iter().any(|e| matches!(
        e,
        AvatarEvent::LipSync(LipSyncEvent::TimelineInstalled { source, events: 2, .. })
            if source == "envelope"
    )));
}

#[tokio::test]
async fn test_undecodable_audio_plays_with_closed_mouth() {
    let device = FakeDevice::new();
    let session = session(
        recognizer_saying("oi"),
        dialogue_replying("olá"),
        synthesizer_returning(SynthesisResponse::new("audio/mpeg", vec![0u8; 64])),
        Arc::clone(&device),
    );
    let mut events = session.events().stream();

    session.start_conversation().unwrap();
    let frame = tick_until_settled(&session).await;

    assert_eq!(frame.status, AvatarStatus::Speaking);
    device.clock.advance(Duration::from_millis(500));
    assert_eq!(session.tick().mouth_shape, MouthShape::Closed);
    assert!(drain(&mut events).iter().any(|e| matches!(
        e,
        AvatarEvent::LipSync(LipSyncEvent::AnalysisDegraded { .. })
    )));
}

#[tokio::test]
async fn test_nothing_heard_is_not_understood() {
    let mut recognizer = MockRecognizer::new();
    recognizer
        .expect_listen()
        .returning(|options| Err(BridgeError::Timeout(options.timeout)));
    let mut dialogue = MockDialogue::new();
    dialogue.expect_reply().times(0);

    let session = session(
        recognizer,
        dialogue,
        MockSynthesizer::new(),
        FakeDevice::new(),
    );

    session.start_conversation().unwrap();
    let frame = tick_until_settled(&session).await;

    assert_eq!(frame.status, AvatarStatus::Error);
    assert_eq!(frame.message, "Não entendi. Tente novamente.");
    assert_eq!(frame.mouth_shape, MouthShape::Closed);

    // A new turn may start from the error state
    session.start_conversation().unwrap();
    assert_eq!(session.status().status, AvatarStatus::Listening);
}

#[tokio::test]
async fn test_step_failures_map_to_messages() {
    let mut broken_mic = MockRecognizer::new();
    broken_mic
        .expect_listen()
        .returning(|_| Err(BridgeError::NotAvailable("no input device".to_string())));
    let session_a = session(
        broken_mic,
        MockDialogue::new(),
        MockSynthesizer::new(),
        FakeDevice::new(),
    );
    session_a.start_conversation().unwrap();
    assert_eq!(tick_until_settled(&session_a).await.message, "Erro no microfone.");

    let mut offline = MockDialogue::new();
    offline
        .expect_reply()
        .returning(|_| Err(BridgeError::OperationFailed("503".to_string())));
    let session_b = session(
        recognizer_saying("oi"),
        offline,
        MockSynthesizer::new(),
        FakeDevice::new(),
    );
    session_b.start_conversation().unwrap();
    assert_eq!(
        tick_until_settled(&session_b).await.message,
        "Erro ao conectar com a IA."
    );

    let mut rejected = MockSynthesizer::new();
    rejected
        .expect_synthesize()
        .returning(|_| Err(BridgeError::OperationFailed("401".to_string())));
    let session_c = session(
        recognizer_saying("oi"),
        dialogue_replying("olá"),
        rejected,
        FakeDevice::new(),
    );
    session_c.start_conversation().unwrap();
    assert_eq!(tick_until_settled(&session_c).await.message, "Erro de API.");

    let session_d = session(
        recognizer_saying("oi"),
        dialogue_replying("olá"),
        synthesizer_returning(SynthesisResponse::new("text/html", b"<html></html>".to_vec())),
        FakeDevice::new(),
    );
    session_d.start_conversation().unwrap();
    assert_eq!(tick_until_settled(&session_d).await.message, "Erro ao gerar a voz.");
}

#[tokio::test]
async fn test_device_failure_is_audio_error() {
    let device = FakeDevice::broken();
    let session = session(
        recognizer_saying("oi"),
        dialogue_replying("bom"),
        synthesizer_returning(aligned_response(b"ID3")),
        Arc::clone(&device),
    );
    let mut events = session.events().stream();

    session.start_conversation().unwrap();
    let frame = tick_until_settled(&session).await;

    assert_eq!(frame.status, AvatarStatus::Error);
    assert_eq!(frame.message, "Erro no áudio.");
    assert_eq!(frame.mouth_shape, MouthShape::Closed);
    assert!(!session.is_speaking());
    assert!(drain(&mut events)
        .iter()
        .any(|e| matches!(e, AvatarEvent::Playback(PlaybackEvent::Failed { .. }))));
}

#[tokio::test]
async fn test_stop_speaking_returns_to_idle() {
    let device = FakeDevice::new();
    let session = session(
        recognizer_saying("oi"),
        dialogue_replying("bom"),
        synthesizer_returning(aligned_response(b"ID3")),
        Arc::clone(&device),
    );

    session.start_conversation().unwrap();
    assert_eq!(tick_until_settled(&session).await.status, AvatarStatus::Speaking);

    session.stop_speaking().unwrap();
    assert!(!device.is_playing());
    let frame = session.tick();
    assert_eq!(frame.status, AvatarStatus::Idle);
    assert_eq!(frame.mouth_shape, MouthShape::Closed);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let deps = AvatarDependencies::new(
        Arc::new(MockRecognizer::new()),
        Arc::new(MockDialogue::new()),
        Arc::new(MockSynthesizer::new()),
        FakeDevice::new(),
    );
    let config = AvatarConfig {
        window_ms: 0,
        ..AvatarConfig::default()
    };

    assert!(matches!(
        AvatarSession::new(config, deps),
        Err(ServiceError::Config(_))
    ));
}

#[test]
fn test_session_requires_runtime() {
    let deps = AvatarDependencies::new(
        Arc::new(MockRecognizer::new()),
        Arc::new(MockDialogue::new()),
        Arc::new(MockSynthesizer::new()),
        FakeDevice::new(),
    );

    assert!(matches!(
        AvatarSession::new(AvatarConfig::default(), deps),
        Err(ServiceError::Config(core_runtime::Error::CapabilityMissing { .. }))
    ));
}
