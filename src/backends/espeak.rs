use super::SpeechBackend;
use crate::engine::UtteranceRequest;
use crate::voices::{primary_subtag, Voice};

use std::io::{Error, ErrorKind, Result};
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

// espeak-ng neutral values: pitch 50 (0-99), speed 175 wpm
const BASE_PITCH: f32 = 50.0;
const BASE_SPEED_WPM: f32 = 175.0;
const SYNTH_TIMEOUT: Duration = Duration::from_secs(5);

pub struct EspeakBackend {
    binary: String,
}

impl EspeakBackend {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }
}

impl SpeechBackend for EspeakBackend {
    fn id(&self) -> &'static str {
        "espeak-ng"
    }

    fn synthesize(&self, request: &UtteranceRequest) -> Result<Vec<u8>> {
        let pitch = (request.pitch * BASE_PITCH).clamp(0.0, 99.0) as u32;
        let speed = (request.rate * BASE_SPEED_WPM).clamp(80.0, 450.0) as u32;
        let voice = request
            .voice
            .clone()
            .unwrap_or_else(|| primary_subtag(&request.language).to_string());

        let mut child = Command::new(&self.binary)
            .arg("--stdout")
            .arg("-v")
            .arg(&voice)
            .arg("-p")
            .arg(pitch.to_string())
            .arg("-s")
            .arg(speed.to_string())
            .arg(&request.text)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        match child.wait_timeout(SYNTH_TIMEOUT)? {
            Some(status) => {
                if status.success() {
                    let output = child.wait_with_output()?;
                    Ok(output.stdout)
                } else {
                    let output = child.wait_with_output()?;
                    let err_msg = String::from_utf8_lossy(&output.stderr);
                    Err(Error::new(
                        ErrorKind::Other,
                        format!("espeak error: {}", err_msg),
                    ))
                }
            }
            None => {
                // Timeout occurred, kill the process
                let _ = child.kill();
                let _ = child.wait();
                Err(Error::new(ErrorKind::TimedOut, "Backend timed out after 5s"))
            }
        }
    }

    fn list_voices(&self) -> Result<Vec<Voice>> {
        let output = Command::new(&self.binary).arg("--voices").output()?;
        if !output.status.success() {
            let err_msg = String::from_utf8_lossy(&output.stderr);
            return Err(Error::new(
                ErrorKind::Other,
                format!("espeak --voices failed: {}", err_msg),
            ));
        }
        Ok(parse_voice_table(&String::from_utf8_lossy(&output.stdout)))
    }
}

// Table layout: Pty Language Age/Gender VoiceName File Other
fn parse_voice_table(raw: &str) -> Vec<Voice> {
    raw.lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 5 {
                return None;
            }
            Some(Voice {
                id: fields[4].to_string(),
                name: fields[3].replace('_', " "),
                language: fields[1].to_string(),
            })
        })
        .collect()
}
