use hedge_core::events::{EventAction, EventCategory, EventData, EventHandler, Raise};
use hedge_ui::HudView;

/// Steps a pickup message stays on screen.
const TOAST_STEPS: u32 = 180;

/// A bounded value driven by `Ui/OnHealthDelta(name, delta)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthController {
    pub name: String,
    current: i32,
    max: i32,
}

impl HealthController {
    pub fn new(name: &str, current: i32, max: i32) -> Self {
        let max = max.max(1);
        Self {
            name: name.to_string(),
            current: current.clamp(0, max),
            max,
        }
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn apply_delta(&mut self, delta: i32) {
        self.current = self.current.saturating_add(delta).clamp(0, self.max);
    }

}

/// In-game HUD state: health bar, score, reticule and pickup messages.
#[derive(Debug)]
pub struct Hud {
    pub health: HealthController,
    score: i32,
    collected: u32,
    reticule_active: bool,
    toast: Option<(String, u32)>,
}

impl Hud {
    pub fn new(starting_health: i32) -> Self {
        Self {
            health: HealthController::new("health", starting_health, starting_health),
            score: 0,
            collected: 0,
            reticule_active: false,
            toast: None,
        }
    }

    /// Switches the reticule to its alternate state while the pick ray
    /// rests on something interactable.
    pub fn set_reticule(&mut self, active: bool) {
        self.reticule_active = active;
    }

    /// Counts down the pickup message. Called once per simulation step.
    pub fn update(&mut self) {
        if let Some((_, remaining)) = &mut self.toast {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                self.toast = None;
            }
        }
    }

    pub fn view(&self, pickups_remaining: usize) -> HudView {
        HudView {
            health: self.health.current(),
            max_health: self.health.max(),
            score: self.score,
            pickups_remaining,
            reticule_active: self.reticule_active,
            toast: self.toast.as_ref().map(|(text, _)| text.clone()),
        }
    }

    fn on_health_delta(&mut self, event: &EventData) {
        let Some(name) = event.text(0) else {
            log::warn!("{event} is missing the controller name");
            return;
        };
        if name != self.health.name {
            log::debug!("No HUD controller named '{name}'");
            return;
        }
        let Some(delta) = event.int(1) else {
            log::warn!("{event} is missing an integer delta");
            return;
        };
        self.health.apply_delta(delta);
        log::debug!("Health {}/{}", self.health.current(), self.health.max());
    }

    fn on_pickup(&mut self, event: &EventData) {
        let description = event.text(0).unwrap_or("pickup");
        let value = event.int(1).unwrap_or(0);
        self.score += value;
        self.collected += 1;
        self.toast = Some((format!("Picked up {description} (+{value})"), TOAST_STEPS));
    }
}

impl EventHandler for Hud {
    fn interests(&self) -> &[EventCategory] {
        &[EventCategory::Ui, EventCategory::Pickup]
    }

    fn on_event(&mut self, event: &EventData, _raise: &mut Raise) {
        match (event.category, event.action) {
            (EventCategory::Ui, EventAction::OnHealthDelta) => self.on_health_delta(event),
            (EventCategory::Pickup, EventAction::OnPickup) => self.on_pickup(event),
            _ => {}
        }
    }
}
