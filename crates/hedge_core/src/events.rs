//! System-wide event bus.
//!
//! Gameplay code never calls other systems directly: it raises an
//! [`EventData`] (category, action, parameters) and moves on. Raising is
//! fire-and-forget; nothing is acknowledged and nothing is returned.
//!
//! Delivery happens once per fixed step in [`EventDispatcher::dispatch`].
//! Each queued event goes, in FIFO order, to every handler that declared
//! interest in its category. Handlers receive a [`Raise`] sink and may queue
//! follow-up events, which are delivered in the same `dispatch` call after the
//! current batch. The number of batches per call is bounded so two handlers
//! that keep re-raising at each other cannot stall a frame.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Rounds of follow-up delivery per `dispatch` call.
pub const MAX_DISPATCH_ROUNDS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Menu,
    Sound,
    Ui,
    Video,
    Camera,
    Pickup,
    Game,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    OnPause,
    OnPlay,
    OnStop,
    #[serde(rename = "on_play_2d")]
    OnPlay2D,
    OnHealthDelta,
    OnCameraCycle,
    OnPickup,
    OnWin,
    OnLose,
    OnExit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventParam {
    Int(i32),
    Float(f32),
    Text(String),
}

impl From<&str> for EventParam {
    fn from(value: &str) -> Self {
        EventParam::Text(value.to_string())
    }
}

impl From<String> for EventParam {
    fn from(value: String) -> Self {
        EventParam::Text(value)
    }
}

impl From<i32> for EventParam {
    fn from(value: i32) -> Self {
        EventParam::Int(value)
    }
}

impl From<f32> for EventParam {
    fn from(value: f32) -> Self {
        EventParam::Float(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    pub category: EventCategory,
    pub action: EventAction,
    #[serde(default)]
    pub params: Vec<EventParam>,
}

impl EventData {
    pub fn new(category: EventCategory, action: EventAction) -> Self {
        Self {
            category,
            action,
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: impl Into<EventParam>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        match self.params.get(index) {
            Some(EventParam::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Integer parameter; whole floats are accepted since JSON bindings do
    /// not distinguish `1` from `1.0` once authored by hand.
    pub fn int(&self, index: usize) -> Option<i32> {
        match self.params.get(index) {
            Some(EventParam::Int(v)) => Some(*v),
            Some(EventParam::Float(v)) if v.fract() == 0.0 => Some(*v as i32),
            _ => None,
        }
    }

    pub fn float(&self, index: usize) -> Option<f32> {
        match self.params.get(index) {
            Some(EventParam::Float(v)) => Some(*v),
            Some(EventParam::Int(v)) => Some(*v as f32),
            _ => None,
        }
    }

    pub fn is(&self, category: EventCategory, action: EventAction) -> bool {
        self.category == category && self.action == action
    }
}

impl fmt::Display for EventData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?}", self.category, self.action)?;
        if !self.params.is_empty() {
            write!(f, " {:?}", self.params)?;
        }
        Ok(())
    }
}

/// Sink handed to handlers so they can queue follow-up events.
#[derive(Debug, Default)]
pub struct Raise {
    pending: Vec<EventData>,
}

impl Raise {
    pub fn raise(&mut self, event: EventData) {
        self.pending.push(event);
    }
}

pub trait EventHandler {
    /// Categories this handler is notified about.
    fn interests(&self) -> &[EventCategory];

    fn on_event(&mut self, event: &EventData, raise: &mut Raise);
}

#[derive(Debug, Default)]
pub struct EventDispatcher {
    queue: VecDeque<EventData>,
    delivered: u64,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&mut self, event: EventData) {
        log::trace!("raise {event}");
        self.queue.push_back(event);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Delivers queued events and any follow-ups they cause. Returns every
    /// event delivered, in delivery order.
    pub fn dispatch(&mut self, handlers: &mut [&mut dyn EventHandler]) -> Vec<EventData> {
        let mut delivered = Vec::new();
        for _ in 0..MAX_DISPATCH_ROUNDS {
            if self.queue.is_empty() {
                return delivered;
            }
            let batch: Vec<EventData> = self.queue.drain(..).collect();
            for event in batch {
                let mut raise = Raise::default();
                let mut handled = false;
                for handler in handlers.iter_mut() {
                    if handler.interests().contains(&event.category) {
                        handler.on_event(&event, &mut raise);
                        handled = true;
                    }
                }
                if !handled {
                    log::debug!("No handler for {event}; dropped");
                }
                self.queue.extend(raise.pending);
                self.delivered += 1;
                delivered.push(event);
            }
        }
        if !self.queue.is_empty() {
            log::warn!(
                "Event dispatch hit {} rounds; {} event(s) deferred to next step",
                MAX_DISPATCH_ROUNDS,
                self.queue.len()
            );
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        interests: Vec<EventCategory>,
        seen: Vec<EventData>,
    }

    impl EventHandler for Recorder {
        fn interests(&self) -> &[EventCategory] {
            &self.interests
        }

        fn on_event(&mut self, event: &EventData, _raise: &mut Raise) {
            self.seen.push(event.clone());
        }
    }

    /// Answers every menu pause with a sound stop.
    struct Echo;

    impl EventHandler for Echo {
        fn interests(&self) -> &[EventCategory] {
            &[EventCategory::Menu]
        }

        fn on_event(&mut self, event: &EventData, raise: &mut Raise) {
            if event.action == EventAction::OnPause {
                raise.raise(
                    EventData::new(EventCategory::Sound, EventAction::OnStop)
                        .with_param("Walking_Grass"),
                );
            }
        }
    }

    /// Re-raises whatever it receives, forever.
    struct Loop;

    impl EventHandler for Loop {
        fn interests(&self) -> &[EventCategory] {
            &[EventCategory::Game]
        }

        fn on_event(&mut self, event: &EventData, raise: &mut Raise) {
            raise.raise(event.clone());
        }
    }

    #[test]
    fn events_reach_only_interested_handlers_in_order() {
        let mut bus = EventDispatcher::new();
        let mut sound = Recorder {
            interests: vec![EventCategory::Sound],
            seen: Vec::new(),
        };
        let mut menu = Recorder {
            interests: vec![EventCategory::Menu],
            seen: Vec::new(),
        };

        bus.raise(EventData::new(EventCategory::Sound, EventAction::OnPlay).with_param("a"));
        bus.raise(EventData::new(EventCategory::Menu, EventAction::OnPause));
        bus.raise(EventData::new(EventCategory::Sound, EventAction::OnPlay).with_param("b"));
        bus.dispatch(&mut [&mut sound, &mut menu]);

        let names: Vec<_> = sound.seen.iter().filter_map(|e| e.text(0)).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(menu.seen.len(), 1);
        assert_eq!(bus.pending(), 0);
    }

    #[test]
    fn follow_up_events_are_delivered_in_same_dispatch() {
        let mut bus = EventDispatcher::new();
        let mut echo = Echo;
        let mut sound = Recorder {
            interests: vec![EventCategory::Sound],
            seen: Vec::new(),
        };
        bus.raise(EventData::new(EventCategory::Menu, EventAction::OnPause));
        let delivered = bus.dispatch(&mut [&mut echo, &mut sound]);

        assert_eq!(delivered.len(), 2);
        assert_eq!(sound.seen.len(), 1);
        assert!(sound.seen[0].is(EventCategory::Sound, EventAction::OnStop));
        assert_eq!(sound.seen[0].text(0), Some("Walking_Grass"));
    }

    #[test]
    fn unhandled_events_are_dropped() {
        let mut bus = EventDispatcher::new();
        bus.raise(EventData::new(EventCategory::Video, EventAction::OnPlay));
        let delivered = bus.dispatch(&mut []);
        assert_eq!(delivered.len(), 1);
        assert_eq!(bus.pending(), 0);
        assert_eq!(bus.delivered(), 1);
    }

    #[test]
    fn runaway_re_raising_is_bounded() {
        let mut bus = EventDispatcher::new();
        let mut looping = Loop;
        bus.raise(EventData::new(EventCategory::Game, EventAction::OnExit));
        let delivered = bus.dispatch(&mut [&mut looping]);
        assert_eq!(delivered.len(), MAX_DISPATCH_ROUNDS);
        assert_eq!(bus.pending(), 1);
    }

    #[test]
    fn params_accept_whole_floats_as_ints() {
        let event: EventData = serde_json::from_str(
            r#"{ "category": "ui", "action": "on_health_delta", "params": ["health", -1.0] }"#,
        )
        .expect("event should parse");
        assert_eq!(event.text(0), Some("health"));
        assert_eq!(event.int(1), Some(-1));
        assert_eq!(event.float(1), Some(-1.0));
    }

    #[test]
    fn play_2d_action_uses_explicit_name() {
        let event: EventData = serde_json::from_str(
            r#"{ "category": "sound", "action": "on_play_2d", "params": ["Walking_Grass"] }"#,
        )
        .expect("event should parse");
        assert_eq!(event.action, EventAction::OnPlay2D);
    }
}
