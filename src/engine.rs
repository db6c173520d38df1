use crate::backends::SpeechBackend;
use crate::voices::Voice;
use async_trait::async_trait;
use log::{error, warn};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// One request to synthesize and play a single line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct UtteranceRequest {
    pub index: usize,
    pub text: String,
    pub voice: Option<String>,
    pub language: String,
    pub pitch: f32,
    pub rate: f32,
    pub volume: f32,
}

/// How an utterance ended. `Cancelled` is reserved for cancellations this
/// side asked for; anything else the engine could not finish is `Failed`.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechOutcome {
    Completed,
    Cancelled,
    Failed(String),
}

/// The host speech engine boundary. The sequencer only ever talks to this
/// trait, so tests drive it with mocks and embedders can swap engines.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// False when the capability is absent; playback controls disable
    /// themselves rather than erroring per request.
    fn is_available(&self) -> bool {
        true
    }

    async fn list_voices(&self) -> Vec<Voice>;

    /// Plays one utterance. Resolves when the audio finished, was cancelled,
    /// or failed; there is never more than one in flight.
    async fn submit(&self, request: UtteranceRequest) -> SpeechOutcome;

    /// Stops whatever is in flight. Synchronous; a no-op when idle.
    fn cancel(&self);

    fn is_paused(&self) -> bool;

    /// Kicks a paused output back into motion.
    fn resume(&self);
}

enum AudioCmd {
    Play {
        wav: Vec<u8>,
        volume: f32,
        done: tokio::sync::oneshot::Sender<SpeechOutcome>,
    },
    Stop,
    Pause,
    Resume,
}

/// Speech engine backed by a synthesis backend and a local audio device.
/// The output stream must live on its own thread, so all playback goes
/// through a command channel to that thread.
pub struct AudioEngine {
    backend: Arc<dyn SpeechBackend>,
    tx: Sender<AudioCmd>,
    available: bool,
    paused: Arc<AtomicBool>,
}

impl AudioEngine {
    pub fn new(backend: Arc<dyn SpeechBackend>) -> Self {
        let (tx, rx) = channel::<AudioCmd>();
        let (ready_tx, ready_rx) = channel::<bool>();
        let paused = Arc::new(AtomicBool::new(false));
        let thread_paused = paused.clone();

        thread::spawn(move || {
            let (_stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    error!("No audio output device found: {}", e);
                    let _ = ready_tx.send(false);
                    return;
                }
            };
            let _ = ready_tx.send(true);
            audio_loop(rx, handle, thread_paused);
        });

        let available = ready_rx.recv().unwrap_or(false);

        Self {
            backend,
            tx,
            available,
            paused,
        }
    }

    /// Pauses the output device without discarding the in-flight utterance.
    pub fn pause_output(&self) {
        let _ = self.tx.send(AudioCmd::Pause);
    }
}

fn audio_loop(rx: Receiver<AudioCmd>, handle: OutputStreamHandle, paused: Arc<AtomicBool>) {
    let mut pending: Option<AudioCmd> = None;
    loop {
        let cmd = match pending.take() {
            Some(cmd) => cmd,
            None => match rx.recv() {
                Ok(cmd) => cmd,
                Err(_) => return,
            },
        };

        match cmd {
            AudioCmd::Play { wav, volume, done } => {
                let sink = match Sink::try_new(&handle) {
                    Ok(sink) => sink,
                    Err(e) => {
                        let _ = done.send(SpeechOutcome::Failed(format!("sink: {}", e)));
                        continue;
                    }
                };
                sink.set_volume(volume);
                match Decoder::new(Cursor::new(wav)) {
                    Ok(source) => sink.append(source.convert_samples::<f32>()),
                    Err(e) => {
                        let _ = done.send(SpeechOutcome::Failed(format!("decode: {}", e)));
                        continue;
                    }
                }
                if paused.load(Ordering::SeqCst) {
                    sink.pause();
                }

                // Poll until the sink drains, servicing control commands so
                // a cancel can land mid-utterance.
                let outcome = loop {
                    if sink.empty() {
                        break SpeechOutcome::Completed;
                    }
                    match rx.try_recv() {
                        Ok(AudioCmd::Stop) => {
                            sink.stop();
                            break SpeechOutcome::Cancelled;
                        }
                        Ok(AudioCmd::Pause) => {
                            sink.pause();
                            paused.store(true, Ordering::SeqCst);
                        }
                        Ok(AudioCmd::Resume) => {
                            sink.play();
                            paused.store(false, Ordering::SeqCst);
                        }
                        Ok(next @ AudioCmd::Play { .. }) => {
                            // Should not happen while one is in flight, but
                            // never play two at once: supersede the old one.
                            warn!("Audio: new utterance while one was in flight");
                            sink.stop();
                            pending = Some(next);
                            break SpeechOutcome::Cancelled;
                        }
                        Err(TryRecvError::Empty) => thread::sleep(Duration::from_millis(10)),
                        Err(TryRecvError::Disconnected) => {
                            sink.stop();
                            break SpeechOutcome::Cancelled;
                        }
                    }
                };
                let _ = done.send(outcome);
            }
            AudioCmd::Stop => {} // nothing in flight
            AudioCmd::Pause => paused.store(true, Ordering::SeqCst),
            AudioCmd::Resume => paused.store(false, Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl SpeechEngine for AudioEngine {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn list_voices(&self) -> Vec<Voice> {
        let backend = self.backend.clone();
        tokio::task::spawn_blocking(move || match backend.list_voices() {
            Ok(voices) => voices,
            Err(e) => {
                warn!("Listing voices failed: {}", e);
                Vec::new()
            }
        })
        .await
        .unwrap_or_default()
    }

    async fn submit(&self, request: UtteranceRequest) -> SpeechOutcome {
        if !self.available {
            return SpeechOutcome::Failed("audio output unavailable".to_string());
        }

        let volume = request.volume;
        let backend = self.backend.clone();
        let wav = match tokio::task::spawn_blocking(move || backend.synthesize(&request)).await {
            Ok(Ok(wav)) => wav,
            Ok(Err(e)) => return SpeechOutcome::Failed(format!("synthesis: {}", e)),
            Err(e) => return SpeechOutcome::Failed(format!("synthesis task: {}", e)),
        };

        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        if self
            .tx
            .send(AudioCmd::Play {
                wav,
                volume,
                done: done_tx,
            })
            .is_err()
        {
            return SpeechOutcome::Failed("audio thread is gone".to_string());
        }

        match done_rx.await {
            Ok(outcome) => outcome,
            Err(_) => SpeechOutcome::Failed("audio thread dropped the utterance".to_string()),
        }
    }

    fn cancel(&self) {
        let _ = self.tx.send(AudioCmd::Stop);
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn resume(&self) {
        let _ = self.tx.send(AudioCmd::Resume);
    }
}
