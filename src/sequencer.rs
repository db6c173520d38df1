use crate::config_loader::Settings;
use crate::engine::{SpeechEngine, SpeechOutcome, UtteranceRequest};
use crate::script::{Script, ScriptLine, VoiceProfile};
use crate::voices::{select_voice, Voice};
use crate::watchdog::stall_timeout;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Where playback is and what it is doing. `current == None` means not
/// started; `Some(len)` means the script ran out and playback stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub current: Option<usize>,
    pub is_playing: bool,
    /// The operator's own role. Lines of this character play silent and
    /// slowed so the operator can speak them live. Empty = all audible.
    pub my_role: String,
    pub global_rate: f32,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current: None,
            is_playing: false,
            my_role: String::new(),
            global_rate: 1.0,
        }
    }
}

/// What the engine (or the watchdog standing in for it) reported about the
/// utterance started for a given line index.
#[derive(Debug, Clone, PartialEq)]
pub enum UtteranceEvent {
    Completed(usize),
    Failed(usize, String),
    StallDetected(usize),
}

impl UtteranceEvent {
    pub fn index(&self) -> usize {
        match self {
            UtteranceEvent::Completed(i)
            | UtteranceEvent::Failed(i, _)
            | UtteranceEvent::StallDetected(i) => *i,
        }
    }
}

/// Outcome of feeding one event through the transition rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Advance(usize),
    Ignore,
}

/// The single decision point for index advancement. Only an event whose
/// originating index still matches the live active index may move playback;
/// anything else is a late echo of a superseded utterance.
pub(crate) fn transition(
    playback: &PlaybackState,
    active_index: Option<usize>,
    event: &UtteranceEvent,
) -> Step {
    if !playback.is_playing {
        return Step::Ignore;
    }
    if active_index != Some(event.index()) {
        return Step::Ignore;
    }
    Step::Advance(event.index() + 1)
}

/// Removes characters some engines render as unintended pauses or silence.
/// Only the spoken text is touched; the displayed script stays as written.
pub fn sanitize_spoken(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '<' | '>' | '{' | '}' | '[' | ']'))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LineParams {
    pub volume: f32,
    pub rate: f32,
    pub pitch: f32,
}

/// Audio parameters for one line. The operator's own lines go silent and
/// half speed, leaving room to rehearse them aloud.
pub(crate) fn line_params(
    line: &ScriptLine,
    profile: &VoiceProfile,
    my_role: &str,
    global_rate: f32,
    full_volume: f32,
) -> LineParams {
    let my_turn = !my_role.is_empty() && line.character == my_role;
    let mut rate = profile.rate * global_rate;
    let volume = if my_turn {
        rate *= 0.5;
        0.0
    } else {
        full_volume
    };
    LineParams {
        volume,
        rate,
        pitch: profile.pitch,
    }
}

struct ActiveUtterance {
    index: usize,
    task: JoinHandle<()>,
}

struct Inner {
    playback: PlaybackState,
    voices: Vec<Voice>,
    active: Option<ActiveUtterance>,
}

struct Shared {
    engine: Arc<dyn SpeechEngine + Send + Sync>,
    script: Script,
    settings: Settings,
    state: Mutex<Inner>,
}

/// Drives the script through the speech engine one line at a time. All
/// state lives behind one lock owned here; operations are synchronous and
/// must run inside a Tokio runtime (each utterance is raced against its
/// stall watchdog on a spawned task).
#[derive(Clone)]
pub struct Sequencer {
    shared: Arc<Shared>,
}

impl Sequencer {
    pub fn new(
        script: Script,
        engine: Arc<dyn SpeechEngine + Send + Sync>,
        settings: Settings,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                engine,
                script,
                settings,
                state: Mutex::new(Inner {
                    playback: PlaybackState::default(),
                    voices: Vec::new(),
                    active: None,
                }),
            }),
        }
    }

    pub fn script(&self) -> &Script {
        &self.shared.script
    }

    /// Snapshot of the playback state.
    pub fn state(&self) -> PlaybackState {
        self.shared.state.lock().unwrap().playback.clone()
    }

    /// Re-queries the engine's voices and caches them for voice selection.
    pub async fn refresh_voices(&self) {
        let voices = self.shared.engine.list_voices().await;
        info!("Sequencer: cached {} voices", voices.len());
        self.shared.state.lock().unwrap().voices = voices;
    }

    /// Starts or resumes playback: from the current line, or from the top
    /// when nothing has played yet or the script already ran out.
    pub fn play(&self) {
        if !self.playback_possible() {
            return;
        }
        let mut inner = self.shared.state.lock().unwrap();
        let start = match inner.playback.current {
            Some(i) if i < self.shared.script.len() => i,
            _ => 0,
        };
        inner.playback.is_playing = true;
        inner.playback.current = Some(start);
        self.start_line(&mut inner, start);
    }

    /// Jumps to a line and speaks it immediately (line click, chapter pick).
    pub fn seek(&self, index: usize) {
        if !self.playback_possible() {
            return;
        }
        let mut inner = self.shared.state.lock().unwrap();
        inner.playback.is_playing = true;
        inner.playback.current = Some(index);
        self.start_line(&mut inner, index);
    }

    /// Stops speaking and disarms the watchdog. Idempotent; the position is
    /// kept so `play` resumes on the same line.
    pub fn pause(&self) {
        let mut inner = self.shared.state.lock().unwrap();
        if let Some(active) = inner.active.take() {
            active.task.abort();
        }
        inner.playback.is_playing = false;
        self.shared.engine.cancel();
    }

    pub fn toggle(&self) {
        let playing = self.shared.state.lock().unwrap().playback.is_playing;
        if playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Changes the muted role for subsequent lines. The line already in
    /// flight keeps the parameters it started with.
    pub fn set_role(&self, role: &str) {
        self.shared.state.lock().unwrap().playback.my_role = role.to_string();
    }

    /// Scales the speed of subsequent lines. Non-positive multipliers are
    /// ignored.
    pub fn set_global_rate(&self, multiplier: f32) {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            warn!("Sequencer: ignoring global rate {}", multiplier);
            return;
        }
        self.shared.state.lock().unwrap().playback.global_rate = multiplier;
    }

    /// Feeds one utterance event through the transition rules. Completion,
    /// failure and stall all advance when they belong to the live index;
    /// everything else is discarded.
    pub fn handle_event(&self, event: UtteranceEvent) {
        let mut inner = self.shared.state.lock().unwrap();
        let active_index = inner.active.as_ref().map(|a| a.index);
        match transition(&inner.playback, active_index, &event) {
            Step::Ignore => {
                debug!("Sequencer: discarding stale event {:?}", event);
            }
            Step::Advance(next) => {
                match &event {
                    UtteranceEvent::Completed(_) => {}
                    UtteranceEvent::Failed(i, cause) => {
                        warn!("Sequencer: line {} failed ({}), skipping", i, cause);
                    }
                    UtteranceEvent::StallDetected(i) => {
                        warn!("Sequencer: line {} stalled, forcing advance", i);
                    }
                }
                inner.active = None;
                inner.playback.current = Some(next);
                self.start_line(&mut inner, next);
            }
        }
    }

    fn playback_possible(&self) -> bool {
        if !self.shared.settings.enable_audio {
            debug!("Sequencer: audio disabled in settings");
            return false;
        }
        if !self.shared.engine.is_available() {
            warn!("Sequencer: speech engine unavailable, playback disabled");
            return false;
        }
        true
    }

    /// Cancels whatever is in flight and speaks the line at `index`. An
    /// index past the end stops playback; that is the natural end of the
    /// script, not an error.
    fn start_line(&self, inner: &mut Inner, index: usize) {
        if let Some(active) = inner.active.take() {
            active.task.abort();
        }
        self.shared.engine.cancel();

        if index >= self.shared.script.len() {
            inner.playback.is_playing = false;
            info!("Sequencer: end of script");
            return;
        }

        let line = &self.shared.script.lines()[index];
        let profile = self.shared.script.profile(&line.character);
        let params = line_params(
            line,
            &profile,
            &inner.playback.my_role,
            inner.playback.global_rate,
            self.shared.settings.playback_volume,
        );
        let text = sanitize_spoken(&line.text);
        let voice = select_voice(
            &inner.voices,
            &self.shared.settings.language,
            &self.shared.settings.voice_hint_primary,
            &self.shared.settings.voice_hint_secondary,
        )
        .map(|v| v.id.clone());

        let timeout = stall_timeout(&text, params.rate, &self.shared.settings);
        let request = UtteranceRequest {
            index,
            text,
            voice,
            language: self.shared.settings.language.clone(),
            pitch: params.pitch,
            rate: params.rate,
            volume: params.volume,
        };

        let sequencer = self.clone();
        let engine = self.shared.engine.clone();
        let task = tokio::spawn(async move {
            if engine.is_paused() {
                engine.resume();
            }
            let event = tokio::select! {
                outcome = engine.submit(request) => match outcome {
                    SpeechOutcome::Completed => UtteranceEvent::Completed(index),
                    // our own cancel; the seek or pause that caused it
                    // already moved the state on
                    SpeechOutcome::Cancelled => return,
                    SpeechOutcome::Failed(cause) => UtteranceEvent::Failed(index, cause),
                },
                _ = tokio::time::sleep(timeout) => UtteranceEvent::StallDetected(index),
            };
            sequencer.handle_event(event);
        });

        inner.active = Some(ActiveUtterance { index, task });
    }
}
