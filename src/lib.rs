//! Scripted rehearsal playback.
//!
//! Feeds a multi-character script line-by-line through a pluggable speech
//! engine. The operator picks a role to mute; those lines play silent and
//! slowed so they can be rehearsed aloud while every other line is heard.
//! Chapter navigation, voice selection and stall recovery are handled here;
//! rendering and controls belong to the embedding application.

pub mod backends;
pub mod config_loader;
pub mod engine;
pub mod navigation;
pub mod script;
pub mod sequencer;
pub mod voices;
pub mod watchdog;

pub use config_loader::Settings;
pub use engine::{AudioEngine, SpeechEngine, SpeechOutcome, UtteranceRequest};
pub use script::{LineKind, Script, ScriptLine, VoiceProfile};
pub use sequencer::{PlaybackState, Sequencer, UtteranceEvent};
