use hedge_core::events::{EventAction, EventCategory, EventData, EventHandler, Raise};
use hedge_ui::{MenuButton, MenuView};

pub const PLAY_BUTTON: &str = "play";
pub const EXIT_BUTTON: &str = "exit";

/// Main menu scene. While it is shown the simulation is paused.
#[derive(Debug)]
pub struct MenuManager {
    title: String,
    background: String,
    visible: bool,
    message: Option<String>,
    game_over: bool,
}

impl MenuManager {
    pub fn new(title: &str, background: &str, start_paused: bool) -> Self {
        Self {
            title: title.to_string(),
            background: background.to_string(),
            visible: start_paused,
            message: None,
            game_over: false,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.visible
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Clears a finished game so the level can be played again.
    pub fn reset(&mut self) {
        self.game_over = false;
        self.message = None;
    }

    /// Texture name drawn behind the buttons.
    pub fn background(&self) -> &str {
        &self.background
    }

    /// Maps a clicked button to the event it stands for.
    pub fn click(&self, button: &str) -> Option<EventData> {
        match button {
            PLAY_BUTTON if !self.game_over => {
                Some(EventData::new(EventCategory::Menu, EventAction::OnPlay))
            }
            PLAY_BUTTON => None,
            EXIT_BUTTON => Some(EventData::new(EventCategory::Game, EventAction::OnExit)),
            other => {
                log::warn!("Unknown menu button '{other}'");
                None
            }
        }
    }

    pub fn view(&self) -> Option<MenuView> {
        if !self.visible {
            return None;
        }
        let mut buttons = Vec::with_capacity(2);
        if !self.game_over {
            buttons.push(MenuButton {
                id: PLAY_BUTTON.to_string(),
                label: "Play".to_string(),
            });
        }
        buttons.push(MenuButton {
            id: EXIT_BUTTON.to_string(),
            label: "Exit".to_string(),
        });
        Some(MenuView {
            title: self.title.clone(),
            message: self.message.clone(),
            buttons,
        })
    }
}

impl EventHandler for MenuManager {
    fn interests(&self) -> &[EventCategory] {
        &[EventCategory::Menu, EventCategory::Game]
    }

    fn on_event(&mut self, event: &EventData, _raise: &mut Raise) {
        match (event.category, event.action) {
            (EventCategory::Menu, EventAction::OnPause) => {
                self.visible = true;
                log::info!("Menu shown; simulation paused");
            }
            (EventCategory::Menu, EventAction::OnPlay) => {
                if self.game_over {
                    log::debug!("Ignoring resume after game over");
                    return;
                }
                self.visible = false;
                log::info!("Menu hidden; simulation resumed");
            }
            (EventCategory::Game, EventAction::OnWin) => {
                self.game_over = true;
                self.message = Some("You escaped the maze!".to_string());
            }
            (EventCategory::Game, EventAction::OnLose) => {
                self.game_over = true;
                self.message = Some("You ran out of health.".to_string());
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hedge_core::events::EventDispatcher;

    #[test]
    fn starts_paused_and_play_resumes() {
        let mut menu = MenuManager::new("Hedge Maze", "hedgegame", true);
        assert!(menu.is_paused());
        let view = menu.view().expect("visible");
        let ids: Vec<&str> = view.buttons.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["play", "exit"]);

        let mut events = EventDispatcher::new();
        events.raise(menu.click(PLAY_BUTTON).expect("play event"));
        events.dispatch(&mut [&mut menu]);
        assert!(!menu.is_paused());
        assert!(menu.view().is_none());

        events.raise(EventData::new(EventCategory::Menu, EventAction::OnPause));
        events.dispatch(&mut [&mut menu]);
        assert!(menu.is_paused());
    }

    #[test]
    fn exit_button_raises_game_exit() {
        let menu = MenuManager::new("Hedge Maze", "hedgegame", true);
        let event = menu.click(EXIT_BUTTON).expect("exit event");
        assert!(event.is(EventCategory::Game, EventAction::OnExit));
        assert!(menu.click("options").is_none());
    }

    #[test]
    fn game_over_locks_the_menu_open() {
        let mut menu = MenuManager::new("Hedge Maze", "hedgegame", false);
        let mut events = EventDispatcher::new();
        events.raise(EventData::new(EventCategory::Game, EventAction::OnLose));
        events.raise(EventData::new(EventCategory::Menu, EventAction::OnPause));
        events.raise(EventData::new(EventCategory::Menu, EventAction::OnPlay));
        events.dispatch(&mut [&mut menu]);

        assert!(menu.is_paused());
        assert!(menu.is_game_over());
        let view = menu.view().expect("visible");
        assert_eq!(view.message.as_deref(), Some("You ran out of health."));
        assert_eq!(view.buttons.len(), 1);
        assert!(menu.click(PLAY_BUTTON).is_none());
    }
}
