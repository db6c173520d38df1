pub mod espeak;

use crate::engine::UtteranceRequest;
use crate::voices::Voice;

/// Trait that all speech synthesis backends must implement.
/// This allows us to plug in different synthesizers (eSpeak, Piper, etc.)
pub trait SpeechBackend: Send + Sync {
    /// Returns the unique ID of the backend (e.g., "espeak-ng")
    fn id(&self) -> &'static str;

    /// Synthesizes the request into playable audio bytes (WAV), honoring the
    /// request's voice, pitch and rate. Volume is applied at playback time.
    fn synthesize(&self, request: &UtteranceRequest) -> std::io::Result<Vec<u8>>;

    /// Returns a list of supported voices
    fn list_voices(&self) -> std::io::Result<Vec<Voice>>;
}
