//! Sound cues and the event-driven sound manager.
//!
//! Gameplay never touches the audio device. It raises `Sound/*` events and
//! the [`SoundManager`] maps cue names to voices on an [`AudioBackend`].
//! The logging [`NullBackend`] is always available; a rodio backend is
//! compiled in with the `audio` feature.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use hedge_core::assets::ContentDictionary;
use hedge_core::events::{EventAction, EventCategory, EventData, EventHandler, Raise};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio backend failed to start: {0}")]
    BackendInit(String),
    #[error("playback of '{cue}' failed: {reason}")]
    Playback { cue: String, reason: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundCategory {
    Alarm,
    #[default]
    Effect,
    Music,
    Ui,
}

#[derive(Debug, Clone)]
pub struct SoundCue {
    pub name: String,
    pub path: PathBuf,
    pub category: SoundCategory,
    pub volume: f32,
    pub looping: bool,
    /// Encoded file bytes. `None` marks a silent cue whose file was missing.
    pub data: Option<Arc<[u8]>>,
}

impl SoundCue {
    pub fn is_silent(&self) -> bool {
        self.data.is_none()
    }
}

pub type VoiceId = u32;

pub trait AudioBackend {
    fn name(&self) -> &'static str;
    fn play(&mut self, cue: &SoundCue) -> Result<VoiceId, AudioError>;
    fn stop(&mut self, voice: VoiceId);
    fn pause_all(&mut self);
    fn resume_all(&mut self);
    /// Reaps voices that finished on their own.
    fn update(&mut self);
    fn is_playing(&self, voice: VoiceId) -> bool;
}

/// Backend that plays nothing and logs every request. One-shot voices end on
/// the next `update()`; looping voices run until stopped.
#[derive(Debug, Default)]
pub struct NullBackend {
    voices: HashMap<VoiceId, bool>,
    next_id: VoiceId,
    paused: bool,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioBackend for NullBackend {
    fn name(&self) -> &'static str {
        "null"
    }

    fn play(&mut self, cue: &SoundCue) -> Result<VoiceId, AudioError> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.voices.insert(id, cue.looping);
        log::debug!(
            "[null audio] play '{}' ({:?}, volume {:.2}, looping {})",
            cue.name,
            cue.category,
            cue.volume,
            cue.looping
        );
        Ok(id)
    }

    fn stop(&mut self, voice: VoiceId) {
        if self.voices.remove(&voice).is_some() {
            log::debug!("[null audio] stop voice {}", voice);
        }
    }

    fn pause_all(&mut self) {
        self.paused = true;
    }

    fn resume_all(&mut self) {
        self.paused = false;
    }

    fn update(&mut self) {
        if !self.paused {
            self.voices.retain(|_, looping| *looping);
        }
    }

    fn is_playing(&self, voice: VoiceId) -> bool {
        self.voices.contains_key(&voice)
    }
}

#[cfg(feature = "audio")]
pub use rodio_backend::RodioBackend;

#[cfg(feature = "audio")]
mod rodio_backend {
    use super::{AudioBackend, AudioError, SoundCue, VoiceId};
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
    use std::collections::HashMap;
    use std::io::Cursor;

    pub struct RodioBackend {
        // Dropping the stream silences every sink.
        _output_stream: OutputStream,
        stream_handle: OutputStreamHandle,
        sinks: HashMap<VoiceId, Sink>,
        next_id: VoiceId,
    }

    impl RodioBackend {
        pub fn new() -> Result<Self, AudioError> {
            let (stream, stream_handle) = OutputStream::try_default()
                .map_err(|e| AudioError::BackendInit(format!("no audio output: {e}")))?;
            log::info!("Rodio audio backend initialized");
            Ok(Self {
                _output_stream: stream,
                stream_handle,
                sinks: HashMap::new(),
                next_id: 0,
            })
        }
    }

    impl AudioBackend for RodioBackend {
        fn name(&self) -> &'static str {
            "rodio"
        }

        fn play(&mut self, cue: &SoundCue) -> Result<VoiceId, AudioError> {
            let playback = |reason: String| AudioError::Playback {
                cue: cue.name.clone(),
                reason,
            };
            let data = cue
                .data
                .clone()
                .ok_or_else(|| playback("cue has no audio data".to_string()))?;
            let sink = Sink::try_new(&self.stream_handle)
                .map_err(|e| playback(format!("failed to create sink: {e}")))?;
            let cursor = Cursor::new(data);
            if cue.looping {
                let source = Decoder::new_looped(cursor)
                    .map_err(|e| playback(format!("failed to decode: {e}")))?;
                sink.append(source);
            } else {
                let source =
                    Decoder::new(cursor).map_err(|e| playback(format!("failed to decode: {e}")))?;
                sink.append(source);
            }
            sink.set_volume(cue.volume);

            let id = self.next_id;
            self.next_id = self.next_id.wrapping_add(1);
            self.sinks.insert(id, sink);
            Ok(id)
        }

        fn stop(&mut self, voice: VoiceId) {
            if let Some(sink) = self.sinks.remove(&voice) {
                sink.stop();
            }
        }

        fn pause_all(&mut self) {
            for sink in self.sinks.values() {
                sink.pause();
            }
        }

        fn resume_all(&mut self) {
            for sink in self.sinks.values() {
                sink.play();
            }
        }

        fn update(&mut self) {
            self.sinks.retain(|_, sink| !sink.empty());
        }

        fn is_playing(&self, voice: VoiceId) -> bool {
            self.sinks.contains_key(&voice)
        }
    }
}

/// Picks the best backend compiled in, falling back to [`NullBackend`].
pub fn create_backend() -> Box<dyn AudioBackend> {
    #[cfg(feature = "audio")]
    {
        match RodioBackend::new() {
            Ok(backend) => return Box::new(backend),
            Err(e) => log::warn!("{e}; falling back to silent audio"),
        }
    }
    log::info!("Audio: using silent backend");
    Box::new(NullBackend::new())
}

pub struct SoundManager {
    cues: ContentDictionary<SoundCue>,
    backend: Box<dyn AudioBackend>,
    voices: HashMap<String, VoiceId>,
    paused: bool,
}

impl SoundManager {
    const INTERESTS: [EventCategory; 2] = [EventCategory::Sound, EventCategory::Menu];

    pub fn new(cues: ContentDictionary<SoundCue>, backend: Box<dyn AudioBackend>) -> Self {
        log::info!(
            "Sound manager: {} cue(s) on '{}' backend",
            cues.len(),
            backend.name()
        );
        Self {
            cues,
            backend,
            voices: HashMap::new(),
            paused: false,
        }
    }

    #[cfg(test)]
    pub fn is_playing(&self, cue_name: &str) -> bool {
        self.voices
            .get(cue_name)
            .is_some_and(|voice| self.backend.is_playing(*voice))
    }

    pub fn stop_all(&mut self) {
        self.stop(None);
    }

    pub fn update(&mut self) {
        self.backend.update();
        let backend = &self.backend;
        self.voices.retain(|_, voice| backend.is_playing(*voice));
    }

    /// Starts `cue_name`, restarting it when `restart` is set or leaving the
    /// current voice alone otherwise. Requests made while the menu has
    /// paused audio are dropped.
    fn play(&mut self, cue_name: &str, restart: bool) {
        let cue = match self.cues.get(cue_name) {
            Ok(cue) => cue,
            Err(e) => {
                log::warn!("Sound request ignored: {e}");
                return;
            }
        };
        if cue.is_silent() {
            log::debug!("Cue '{}' is silent; nothing to play", cue_name);
            return;
        }
        if self.paused {
            log::debug!("Cue '{}' requested while paused; ignored", cue_name);
            return;
        }
        if let Some(voice) = self.voices.get(cue_name).copied() {
            if self.backend.is_playing(voice) {
                if !restart {
                    return;
                }
                self.backend.stop(voice);
            }
        }
        match self.backend.play(cue) {
            Ok(voice) => {
                self.voices.insert(cue_name.to_string(), voice);
            }
            Err(e) => log::warn!("{e}"),
        }
    }

    fn stop(&mut self, cue_name: Option<&str>) {
        match cue_name {
            Some(name) => {
                if let Some(voice) = self.voices.remove(name) {
                    self.backend.stop(voice);
                }
            }
            None => {
                for (_, voice) in self.voices.drain() {
                    self.backend.stop(voice);
                }
            }
        }
    }
}

impl EventHandler for SoundManager {
    fn interests(&self) -> &[EventCategory] {
        &Self::INTERESTS
    }

    fn on_event(&mut self, event: &EventData, _raise: &mut Raise) {
        match (event.category, event.action) {
            (EventCategory::Sound, EventAction::OnPlay) => match event.text(0) {
                Some(name) => self.play(name, true),
                None => log::warn!("{event} is missing a cue name"),
            },
            (EventCategory::Sound, EventAction::OnPlay2D) => match event.text(0) {
                Some(name) => self.play(name, false),
                None => log::warn!("{event} is missing a cue name"),
            },
            (EventCategory::Sound, EventAction::OnStop) => self.stop(event.text(0)),
            (EventCategory::Menu, EventAction::OnPause) => {
                self.backend.pause_all();
                self.paused = true;
            }
            (EventCategory::Menu, EventAction::OnPlay) => {
                self.backend.resume_all();
                self.paused = false;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(name: &str, looping: bool, silent: bool) -> SoundCue {
        SoundCue {
            name: name.to_string(),
            path: PathBuf::from(format!("assets/sounds/{name}.wav")),
            category: SoundCategory::Alarm,
            volume: 1.0,
            looping,
            data: if silent {
                None
            } else {
                Some(Arc::from(vec![0u8; 4]))
            },
        }
    }

    fn manager() -> SoundManager {
        let mut cues = ContentDictionary::new("sound");
        cues.add_named("Walking_Grass", cue("Walking_Grass", true, false))
            .expect("add");
        cues.add_named("announcement", cue("announcement", false, false))
            .expect("add");
        cues.add_named("testaudio", cue("testaudio", false, true))
            .expect("add");
        SoundManager::new(cues, Box::new(NullBackend::new()))
    }

    fn send(manager: &mut SoundManager, event: EventData) {
        manager.on_event(&event, &mut Raise::default());
    }

    fn sound(action: EventAction, name: &str) -> EventData {
        EventData::new(EventCategory::Sound, action).with_param(name)
    }

    #[test]
    fn play_and_stop_by_name() {
        let mut m = manager();
        send(&mut m, sound(EventAction::OnPlay2D, "Walking_Grass"));
        assert!(m.is_playing("Walking_Grass"));
        send(&mut m, sound(EventAction::OnStop, "Walking_Grass"));
        assert!(!m.is_playing("Walking_Grass"));
    }

    #[test]
    fn one_shot_cue_ends_after_update() {
        let mut m = manager();
        send(&mut m, sound(EventAction::OnPlay, "announcement"));
        assert!(m.is_playing("announcement"));
        m.update();
        assert!(!m.is_playing("announcement"));
    }

    #[test]
    fn unknown_and_silent_cues_are_not_fatal() {
        let mut m = manager();
        send(&mut m, sound(EventAction::OnPlay, "does_not_exist"));
        send(&mut m, sound(EventAction::OnPlay, "testaudio"));
        assert!(!m.is_playing("does_not_exist"));
        assert!(!m.is_playing("testaudio"));
    }

    #[test]
    fn menu_pause_and_resume_track_state() {
        let mut m = manager();
        send(&mut m, sound(EventAction::OnPlay2D, "Walking_Grass"));
        send(
            &mut m,
            EventData::new(EventCategory::Menu, EventAction::OnPause),
        );
        assert!(m.paused);
        m.update();
        assert!(m.is_playing("Walking_Grass"));
        send(
            &mut m,
            EventData::new(EventCategory::Menu, EventAction::OnPlay),
        );
        assert!(!m.paused);
    }

    #[test]
    fn requests_while_paused_are_dropped() {
        let mut m = manager();
        send(
            &mut m,
            EventData::new(EventCategory::Menu, EventAction::OnPause),
        );
        send(&mut m, sound(EventAction::OnPlay, "announcement"));
        assert!(!m.is_playing("announcement"));

        send(
            &mut m,
            EventData::new(EventCategory::Menu, EventAction::OnPlay),
        );
        send(&mut m, sound(EventAction::OnPlay, "announcement"));
        assert!(m.is_playing("announcement"));
    }

    #[test]
    fn stop_without_name_stops_everything() {
        let mut m = manager();
        send(&mut m, sound(EventAction::OnPlay2D, "Walking_Grass"));
        send(&mut m, sound(EventAction::OnPlay, "announcement"));
        send(
            &mut m,
            EventData::new(EventCategory::Sound, EventAction::OnStop),
        );
        assert!(!m.is_playing("Walking_Grass"));
        assert!(!m.is_playing("announcement"));
    }
}
