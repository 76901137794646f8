use hedge_core::events::{EventAction, EventCategory, EventData, EventDispatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Playing,
    Won,
    Lost,
}

/// Decides when a level is over. Win when every pickup is collected, lose
/// when health runs out. The outcome is latched: once decided it is raised
/// exactly once and never re-evaluated until [`GameStateManager::reset`].
#[derive(Debug)]
pub struct GameStateManager {
    outcome: GameOutcome,
    total_pickups: usize,
}

impl GameStateManager {
    pub fn new(total_pickups: usize) -> Self {
        Self {
            outcome: GameOutcome::Playing,
            total_pickups,
        }
    }

    pub fn reset(&mut self, total_pickups: usize) {
        self.outcome = GameOutcome::Playing;
        self.total_pickups = total_pickups;
    }

    pub fn evaluate(
        &mut self,
        health: i32,
        pickups_remaining: usize,
        events: &mut EventDispatcher,
    ) -> GameOutcome {
        if self.outcome != GameOutcome::Playing {
            return self.outcome;
        }
        let outcome = if health <= 0 {
            GameOutcome::Lost
        } else if self.total_pickups > 0 && pickups_remaining == 0 {
            GameOutcome::Won
        } else {
            return GameOutcome::Playing;
        };

        let action = match outcome {
            GameOutcome::Won => EventAction::OnWin,
            _ => EventAction::OnLose,
        };
        log::info!("Game over: {:?}", outcome);
        events.raise(EventData::new(EventCategory::Game, action));
        events.raise(EventData::new(EventCategory::Menu, EventAction::OnPause));
        self.outcome = outcome;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_every_pickup_wins_once() {
        let mut state = GameStateManager::new(5);
        let mut events = EventDispatcher::new();
        assert_eq!(state.evaluate(100, 3, &mut events), GameOutcome::Playing);
        assert_eq!(events.pending(), 0);

        assert_eq!(state.evaluate(100, 0, &mut events), GameOutcome::Won);
        assert_eq!(events.pending(), 2);
        assert_eq!(state.evaluate(100, 0, &mut events), GameOutcome::Won);
        assert_eq!(events.pending(), 2);

        let delivered = events.dispatch(&mut []);
        assert!(delivered[0].is(EventCategory::Game, EventAction::OnWin));
        assert!(delivered[1].is(EventCategory::Menu, EventAction::OnPause));
    }

    #[test]
    fn running_out_of_health_loses() {
        let mut state = GameStateManager::new(5);
        let mut events = EventDispatcher::new();
        assert_eq!(state.evaluate(0, 0, &mut events), GameOutcome::Lost);
        let delivered = events.dispatch(&mut []);
        assert!(delivered[0].is(EventCategory::Game, EventAction::OnLose));
    }

    #[test]
    fn level_without_pickups_never_wins() {
        let mut state = GameStateManager::new(0);
        let mut events = EventDispatcher::new();
        assert_eq!(state.evaluate(100, 0, &mut events), GameOutcome::Playing);
        state.reset(2);
        assert_eq!(state.evaluate(100, 0, &mut events), GameOutcome::Won);
    }
}
