//! # Avatar Service
//!
//! Conversation façade for a talking avatar.
//!
//! This crate wires host-provided bridges (speech recognizer, dialogue
//! model, speech synthesizer, audio device) into the lip-sync core. Hosts
//! build an [`AvatarDependencies`] bundle, create an [`AvatarSession`] and
//! call [`AvatarSession::tick`] from their render loop.

pub mod error;
pub mod session;
pub mod speech;
pub mod status;

pub use error::{Result, ServiceError};
pub use session::{AvatarDependencies, AvatarFrame, AvatarSession, PreparedUtterance, UtteranceId};
pub use speech::{parse_synthesis_response, SpeechClip};
pub use status::{AvatarStatus, Failure, StatusUpdate};
