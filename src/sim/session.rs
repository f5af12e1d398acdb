/// Session launch decision.
///
///   **Single-player**: one-shot intent. Cutscene first if the level has
///   one, otherwise straight to level loading.
///
///   **Multiplayer**: fire-and-forget registration with the matchmaking
///   adapter, then the countdown is halted and re-armed and the screen
///   returns to wherever it was opened from. The actual session start is
///   driven by the network side once registration completes.

use std::time::Duration;

use tracing::info;

use crate::domain::level::LevelDescriptor;
use crate::sim::event::ViewEvent;
use crate::sim::timer::ExpiryTimer;

/// Matchmaking collaborator. Both calls return immediately.
pub trait NetworkAdapter {
    fn register(&mut self, nickname: &str, timeout: Duration, session_token: &str);
    fn reset(&mut self);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiplayerSettings {
    pub nickname: String,
    pub timeout: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Single,
    Multi(MultiplayerSettings),
}

#[derive(Clone, Debug)]
pub struct SessionStarter {
    mode: Mode,
}

impl SessionStarter {
    pub fn new(mode: Mode) -> Self {
        SessionStarter { mode }
    }

    pub fn is_multiplayer(&self) -> bool {
        matches!(self.mode, Mode::Multi(_))
    }

    /// Launch `level`. In multiplayer `timer` is the registration countdown.
    pub fn start(
        &self,
        level: &LevelDescriptor,
        network: &mut dyn NetworkAdapter,
        timer: Option<&mut ExpiryTimer>,
        out: &mut Vec<ViewEvent>,
    ) {
        match &self.mode {
            Mode::Multi(settings) => {
                let token = session_token(level);
                info!(nickname = %settings.nickname, %token, "registering for multiplayer");
                network.register(&settings.nickname, settings.timeout, &token);
                if let Some(t) = timer {
                    t.halt();
                    t.reset();
                }
                out.push(ViewEvent::ReturnToPrevious);
            }
            Mode::Single => {
                let map = level.map_reference.clone();
                match &level.intro_cutscene {
                    Some(cutscene) => {
                        info!(level = %level.id, %cutscene, "starting level after cutscene");
                        out.push(ViewEvent::CutsceneThenLoad { cutscene: cutscene.clone(), map });
                    }
                    None => {
                        info!(level = %level.id, "starting level");
                        out.push(ViewEvent::LoadLevel { map });
                    }
                }
            }
        }
    }
}

/// `"<display name> <map reference>"`, as the matchmaking side expects.
pub fn session_token(level: &LevelDescriptor) -> String {
    format!("{} {}", level.display_name, level.map_reference)
}
