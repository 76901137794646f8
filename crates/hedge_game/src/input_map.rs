use std::fs;
use std::path::Path;

use hedge_core::events::{EventData, EventDispatcher};
use hedge_core::input::{InputState, Key};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEdge {
    Pressed,
    Released,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeyBinding {
    pub key: Key,
    #[serde(default = "default_edge")]
    pub edge: KeyEdge,
    pub events: Vec<EventData>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BindingsFile {
    #[serde(default = "default_version")]
    pub version: u32,
    pub bindings: Vec<KeyBinding>,
}

impl BindingsFile {
    /// Raises the events of every binding whose edge fired this step.
    /// Returns how many bindings fired.
    pub fn fire(&self, input: &InputState, events: &mut EventDispatcher) -> usize {
        let mut fired = 0;
        for binding in &self.bindings {
            let triggered = match binding.edge {
                KeyEdge::Pressed => input.is_just_pressed(binding.key),
                KeyEdge::Released => input.is_just_released(binding.key),
            };
            if !triggered {
                continue;
            }
            for event in &binding.events {
                events.raise(event.clone());
            }
            fired += 1;
        }
        fired
    }

    pub fn is_bound(&self, key: Key) -> bool {
        self.bindings.iter().any(|b| b.key == key)
    }
}

pub fn load_bindings_from_path(path: &Path) -> Result<BindingsFile, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let bindings: BindingsFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse bindings JSON {}: {e}", path.display()))?;
    validate_bindings(&bindings)?;
    Ok(bindings)
}

/// Keys the main loop handles itself (debug overlay, collision skins, reload).
const RESERVED_KEYS: [Key; 3] = [Key::F3, Key::F4, Key::F5];

fn validate_bindings(file: &BindingsFile) -> Result<(), String> {
    if file.version != 1 {
        return Err(format!(
            "Bindings validation failed: unsupported version {}",
            file.version
        ));
    }
    for (i, binding) in file.bindings.iter().enumerate() {
        if binding.events.is_empty() {
            return Err(format!(
                "Bindings validation failed: binding #{i} ({} {:?}) raises no events",
                binding.key, binding.edge
            ));
        }
    }
    for key in RESERVED_KEYS {
        if file.is_bound(key) {
            log::warn!("Binding uses {key} which the game also handles directly");
        }
    }
    Ok(())
}

const fn default_version() -> u32 {
    1
}

const fn default_edge() -> KeyEdge {
    KeyEdge::Pressed
}

#[cfg(test)]
mod tests {
    use super::*;
    use hedge_core::events::{EventAction, EventCategory};
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "hedge_bindings_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn shipped_bindings() -> BindingsFile {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/config/bindings.json");
        load_bindings_from_path(&path).expect("shipped bindings load")
    }

    #[test]
    fn walking_sound_starts_on_press_and_stops_on_release() {
        let bindings = shipped_bindings();
        let mut input = InputState::new();
        let mut events = EventDispatcher::new();

        input.key_down(Key::W);
        assert_eq!(bindings.fire(&input, &mut events), 1);
        let delivered = events.dispatch(&mut []);
        assert!(delivered[0].is(EventCategory::Sound, EventAction::OnPlay2D));
        assert_eq!(delivered[0].text(0), Some("Walking_Grass"));

        input.end_frame();
        input.key_up(Key::W);
        assert_eq!(bindings.fire(&input, &mut events), 1);
        let delivered = events.dispatch(&mut []);
        assert!(delivered[0].is(EventCategory::Sound, EventAction::OnStop));
        assert_eq!(delivered[0].text(0), Some("Walking_Grass"));
    }

    #[test]
    fn escape_pauses_and_silences_walking() {
        let bindings = shipped_bindings();
        let mut input = InputState::new();
        let mut events = EventDispatcher::new();
        input.key_down(Key::Escape);
        bindings.fire(&input, &mut events);
        let delivered = events.dispatch(&mut []);
        assert_eq!(delivered.len(), 2);
        assert!(delivered[0].is(EventCategory::Menu, EventAction::OnPause));
        assert!(delivered[1].is(EventCategory::Sound, EventAction::OnStop));
    }

    #[test]
    fn shipped_table_covers_event_keys() {
        let bindings = shipped_bindings();
        for key in [Key::Up, Key::Down, Key::Escape, Key::O, Key::Q, Key::P, Key::C, Key::V] {
            assert!(bindings.is_bound(key), "{key} should be bound");
        }
        assert!(!bindings.is_bound(Key::F3));

        let mut input = InputState::new();
        let mut events = EventDispatcher::new();
        input.key_down(Key::Down);
        bindings.fire(&input, &mut events);
        let delivered = events.dispatch(&mut []);
        assert!(delivered[0].is(EventCategory::Ui, EventAction::OnHealthDelta));
        assert_eq!(delivered[0].text(0), Some("health"));
        assert_eq!(delivered[0].int(1), Some(-1));
    }

    #[test]
    fn binding_without_events_is_rejected() {
        let path = temp_file_path("empty_events");
        fs::write(
            &path,
            r#"{ "version": 1, "bindings": [ { "key": "q", "events": [] } ] }"#,
        )
        .expect("write bindings");
        let err = load_bindings_from_path(&path).expect_err("empty events should fail");
        assert!(err.contains("raises no events"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn unknown_key_fails_to_parse() {
        let path = temp_file_path("unknown_key");
        fs::write(
            &path,
            r#"{ "bindings": [ { "key": "f12", "events": [ { "category": "menu", "action": "on_pause" } ] } ] }"#,
        )
        .expect("write bindings");
        let err = load_bindings_from_path(&path).expect_err("unknown key should fail");
        assert!(err.contains("Failed to parse bindings JSON"));
        let _ = fs::remove_file(path);
    }
}
