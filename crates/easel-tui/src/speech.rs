//! Local audio output: a speech synthesiser for reading text aloud and an
//! audio sink for playing synthesized clips.
//!
//! Both are traits so the narration state machine can be driven by stubs in
//! tests. The process-backed implementations spawn `espeak-ng`/`espeak`/`say`
//! and `mpv` the same way the player is spawned elsewhere: stdio detached,
//! killed on drop.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tracing::{debug, info, warn};

use easel_proto::error::{FetchError, FetchResult};
use easel_proto::platform;

/// A voice offered by the speech engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    /// Identifier passed back to the engine.
    pub id: String,
    pub name: String,
    pub language: String,
    pub is_default: bool,
}

/// Browser-style utterance parameters: rate and pitch are multipliers around
/// 1.0, volume is 0..=1.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceParams {
    pub voice: Option<Voice>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

pub trait SpeechEngine: Send {
    fn voices(&self) -> &[Voice];

    /// Start speaking `text`, replacing any current utterance.
    fn speak(&mut self, text: &str, params: &VoiceParams) -> FetchResult<()>;

    /// Stop the current utterance. No-op when silent.
    fn cancel(&mut self);

    fn is_speaking(&mut self) -> bool;
}

pub trait AudioSink: Send {
    /// Start playing the file at `path`, replacing any current playback.
    fn play_file(&mut self, path: &Path) -> FetchResult<()>;

    /// No-op when nothing is playing.
    fn stop(&mut self);

    fn is_playing(&mut self) -> bool;
}

/// Voice preference: the configured voice (matched on id, name or language),
/// else the engine's default voice, else the first voice available.
pub fn select_voice<'a>(voices: &'a [Voice], preferred: &str) -> Option<&'a Voice> {
    let preferred = preferred.trim();
    let matches = |v: &&Voice| {
        !preferred.is_empty()
            && (v.id.eq_ignore_ascii_case(preferred)
                || v.name.eq_ignore_ascii_case(preferred)
                || v.language.eq_ignore_ascii_case(preferred))
    };
    voices
        .iter()
        .find(matches)
        .or_else(|| voices.iter().find(|v| v.is_default))
        .or_else(|| voices.first())
}

// ── Child process bookkeeping ─────────────────────────────────────────────────

fn child_alive(child: &mut Option<tokio::process::Child>, what: &str) -> bool {
    let Some(c) = child.as_mut() else {
        return false;
    };
    match c.try_wait() {
        Ok(None) => true,
        Ok(Some(status)) => {
            debug!("{} exited: {}", what, status);
            *child = None;
            false
        }
        Err(e) => {
            warn!("{} status check failed: {}", what, e);
            *child = None;
            false
        }
    }
}

fn kill_child(child: &mut Option<tokio::process::Child>, what: &str) {
    if let Some(mut c) = child.take() {
        if let Err(e) = c.start_kill() {
            debug!("{} kill: {}", what, e);
        }
    }
}

// ── Speech synthesiser process ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    Espeak,
    Say,
}

const BASE_WPM: f32 = 175.0;

pub struct ProcessSpeechEngine {
    binary: PathBuf,
    flavor: Flavor,
    voices: Vec<Voice>,
    child: Option<tokio::process::Child>,
}

impl ProcessSpeechEngine {
    /// Locate a synthesiser and list its voices. Blocking; call once at start-up.
    pub fn detect() -> Option<Self> {
        let binary = platform::find_speech_binary()?;
        let flavor = match binary.file_stem().and_then(|s| s.to_str()) {
            Some("say") => Flavor::Say,
            _ => Flavor::Espeak,
        };
        let list_args: &[&str] = match flavor {
            Flavor::Espeak => &["--voices"],
            Flavor::Say => &["-v", "?"],
        };
        let voices = match std::process::Command::new(&binary).args(list_args).output() {
            Ok(out) => {
                let text = String::from_utf8_lossy(&out.stdout);
                match flavor {
                    Flavor::Espeak => parse_espeak_voices(&text),
                    Flavor::Say => parse_say_voices(&text),
                }
            }
            Err(e) => {
                warn!("[speech] listing voices with {:?} failed: {}", binary, e);
                Vec::new()
            }
        };
        info!(
            "[speech] using {:?} ({} voices)",
            binary,
            voices.len()
        );
        Some(Self {
            binary,
            flavor,
            voices,
            child: None,
        })
    }

    fn args(&self, text: &str, params: &VoiceParams) -> Vec<String> {
        let mut args = Vec::new();
        let wpm = (BASE_WPM * params.rate).round().max(80.0) as u32;
        match self.flavor {
            Flavor::Espeak => {
                if let Some(v) = &params.voice {
                    args.extend(["-v".to_string(), v.id.clone()]);
                }
                let pitch = (50.0 * params.pitch).round().clamp(0.0, 99.0) as u32;
                let amplitude = (100.0 * params.volume).round().clamp(0.0, 200.0) as u32;
                args.extend([
                    "-s".to_string(),
                    wpm.to_string(),
                    "-p".to_string(),
                    pitch.to_string(),
                    "-a".to_string(),
                    amplitude.to_string(),
                ]);
            }
            Flavor::Say => {
                if let Some(v) = &params.voice {
                    args.extend(["-v".to_string(), v.id.clone()]);
                }
                args.extend(["-r".to_string(), wpm.to_string()]);
            }
        }
        // A leading dash would be read as an option.
        let text = text.trim();
        if text.starts_with('-') {
            args.push(format!(" {}", text));
        } else {
            args.push(text.to_string());
        }
        args
    }
}

impl SpeechEngine for ProcessSpeechEngine {
    fn voices(&self) -> &[Voice] {
        &self.voices
    }

    fn speak(&mut self, text: &str, params: &VoiceParams) -> FetchResult<()> {
        self.cancel();
        let args = self.args(text, params);
        let child = tokio::process::Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        debug!(
            "[speech] speaking {} chars (pid {:?}, voice {:?})",
            text.len(),
            child.id(),
            params.voice.as_ref().map(|v| v.id.as_str())
        );
        self.child = Some(child);
        Ok(())
    }

    fn cancel(&mut self) {
        kill_child(&mut self.child, "speech");
    }

    fn is_speaking(&mut self) -> bool {
        child_alive(&mut self.child, "speech")
    }
}

/// Parse `espeak-ng --voices`:
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  en-gb           --/M      English_(Great_Britain) gmw/en       (en 2)
/// ```
///
/// `en` is espeak's built-in default voice.
pub fn parse_espeak_voices(output: &str) -> Vec<Voice> {
    output
        .lines()
        .skip_while(|l| !l.trim_start().starts_with("Pty"))
        .skip(1)
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let _priority = cols.next()?;
            let language = cols.next()?;
            let _age_gender = cols.next()?;
            let name = cols.next()?;
            Some(Voice {
                id: language.to_string(),
                name: name.replace('_', " "),
                language: language.to_string(),
                is_default: language == "en",
            })
        })
        .collect()
}

/// Parse `say -v ?`: `Name   lang_REGION   # sample sentence`. Names may
/// contain spaces.
pub fn parse_say_voices(output: &str) -> Vec<Voice> {
    output
        .lines()
        .filter_map(|line| {
            let head = line.split('#').next()?.trim_end();
            let (name, language) = head.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            if name.is_empty() || language.is_empty() {
                return None;
            }
            Some(Voice {
                id: name.to_string(),
                name: name.to_string(),
                language: language.replace('_', "-").to_ascii_lowercase(),
                is_default: false,
            })
        })
        .collect()
}

// ── mpv audio sink ────────────────────────────────────────────────────────────

pub struct MpvAudioSink {
    binary: PathBuf,
    child: Option<tokio::process::Child>,
}

impl MpvAudioSink {
    pub fn detect() -> Option<Self> {
        let binary = platform::find_mpv_binary()?;
        info!("[audio] using mpv at {:?}", binary);
        Some(Self {
            binary,
            child: None,
        })
    }
}

impl AudioSink for MpvAudioSink {
    fn play_file(&mut self, path: &Path) -> FetchResult<()> {
        self.stop();
        // mpv must not touch the terminal the TUI is drawing on.
        let child = tokio::process::Command::new(&self.binary)
            .arg("--no-video")
            .arg("--no-terminal")
            .arg("--quiet")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        debug!("[audio] playing {:?} (pid {:?})", path, child.id());
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) {
        kill_child(&mut self.child, "mpv");
    }

    fn is_playing(&mut self) -> bool {
        child_alive(&mut self.child, "mpv")
    }
}

/// Map a missing capability to the error shown to the user.
pub fn unsupported(what: &str) -> FetchError {
    FetchError::Unsupported(format!("{} is not available on this system", what))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(id: &str, language: &str, is_default: bool) -> Voice {
        Voice {
            id: id.into(),
            name: id.into(),
            language: language.into(),
            is_default,
        }
    }

    #[test]
    fn test_select_voice_preference_order() {
        let voices = vec![
            voice("af", "af", false),
            voice("en", "en", true),
            voice("en-gb", "en-gb", false),
        ];
        assert_eq!(select_voice(&voices, "en-GB").map(|v| v.id.as_str()), Some("en-gb"));
        assert_eq!(select_voice(&voices, "fr").map(|v| v.id.as_str()), Some("en"));
        assert_eq!(select_voice(&voices, "").map(|v| v.id.as_str()), Some("en"));

        let no_default = vec![voice("af", "af", false), voice("de", "de", false)];
        assert_eq!(select_voice(&no_default, "fr").map(|v| v.id.as_str()), Some("af"));
        assert_eq!(select_voice(&[], "en"), None);
    }

    #[test]
    fn test_parse_espeak_voices() {
        let out = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 5  en              --/M      English            gmw/en
 2  en-gb           --/M      English_(Great_Britain) gmw/en       (en 2)
";
        let voices = parse_espeak_voices(out);
        assert_eq!(voices.len(), 3);
        assert_eq!(voices[2].id, "en-gb");
        assert_eq!(voices[2].name, "English (Great Britain)");
        assert!(voices[1].is_default);
        assert!(!voices[0].is_default);
    }

    #[test]
    fn test_parse_say_voices() {
        let out = "\
Alex                en_US    # Most people recognize me by my voice.
Bad News            en_US    # The light you see at the end of the tunnel is the headlamp.
Daniel              en_GB    # Hello, my name is Daniel.
";
        let voices = parse_say_voices(out);
        assert_eq!(voices.len(), 3);
        assert_eq!(voices[1].id, "Bad News");
        assert_eq!(voices[2].language, "en-gb");
    }

    #[test]
    fn test_espeak_args_scale_params() {
        let engine = ProcessSpeechEngine {
            binary: PathBuf::from("espeak-ng"),
            flavor: Flavor::Espeak,
            voices: Vec::new(),
            child: None,
        };
        let params = VoiceParams {
            voice: Some(voice("en-gb", "en-gb", false)),
            rate: 0.8,
            pitch: 1.1,
            volume: 1.0,
        };
        let args = engine.args("- a dash first", &params);
        assert_eq!(
            args,
            vec!["-v", "en-gb", "-s", "140", "-p", "55", "-a", "100", " - a dash first"]
        );
    }
}
