/// AppState: everything the terminal front-end shows.
///
/// The two level-select sessions (single-player and multiplayer) live for
/// the whole run, like the menus they belong to. Their `ViewEvent`s are
/// folded into `view` and `phase` by `apply`; the renderer only reads
/// this struct.

use std::rc::Rc;
use std::time::Duration;

use tracing::debug;

use crate::config::AppConfig;
use crate::domain::level::LevelCatalog;
use crate::domain::unlock::Progression;
use crate::sim::event::ViewEvent;
use crate::sim::select::{LevelSelecter, SelectSettings};
use crate::sim::session::{Mode, MultiplayerSettings};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Title,
    LevelSelect,
    Cutscene { id: String, map: String, elapsed: Duration },
    Loading { map: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectKind {
    Single,
    Multi,
}

/// Last published selection, as the screen draws it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectView {
    pub show_prev: bool,
    pub show_next: bool,
    pub name: String,
    pub preview_key: String,
    pub countdown: Option<u64>,
}

pub struct AppState {
    pub phase: Phase,
    pub single: LevelSelecter,
    pub multi: LevelSelecter,
    pub active: SelectKind,
    pub view: SelectView,

    // ── UI ──
    pub message: String,
    pub message_timer: Duration,
    pub anim_tick: u32,
}

impl AppState {
    pub fn new(catalog: Rc<LevelCatalog>, config: &AppConfig, progression: &dyn Progression) -> Self {
        let settings = SelectSettings {
            countdown: config.multiplayer.countdown,
            fallback_level: config.multiplayer.fallback_level.clone(),
        };
        let multi_mode = Mode::Multi(MultiplayerSettings {
            nickname: config.multiplayer.nickname.clone(),
            timeout: config.multiplayer.timeout,
        });

        // Construction-time selections are re-published on first refresh.
        let mut discard = vec![];
        let single = LevelSelecter::new(catalog.clone(), Mode::Single, &settings, progression, &mut discard);
        let multi = LevelSelecter::new(catalog, multi_mode, &settings, progression, &mut discard);

        AppState {
            phase: Phase::Title,
            single,
            multi,
            active: SelectKind::Single,
            view: SelectView::default(),
            message: String::new(),
            message_timer: Duration::ZERO,
            anim_tick: 0,
        }
    }

    pub fn selecter(&self) -> &LevelSelecter {
        match self.active {
            SelectKind::Single => &self.single,
            SelectKind::Multi => &self.multi,
        }
    }

    pub fn selecter_mut(&mut self) -> &mut LevelSelecter {
        match self.active {
            SelectKind::Single => &mut self.single,
            SelectKind::Multi => &mut self.multi,
        }
    }

    /// Show a level-select screen and re-read progression.
    pub fn open_select(&mut self, kind: SelectKind, progression: &dyn Progression) {
        self.active = kind;
        self.view = SelectView::default();
        self.phase = Phase::LevelSelect;
        self.anim_tick = 0;
        let mut out = vec![];
        self.selecter_mut().refresh(progression, &mut out);
        self.apply(&mut out);
    }

    /// Fold emitted events into view state and screen changes.
    pub fn apply(&mut self, events: &mut Vec<ViewEvent>) {
        for event in events.drain(..) {
            debug!(?event, "view event");
            match event {
                ViewEvent::Selection { show_prev, show_next, name, preview_key } => {
                    self.view.show_prev = show_prev;
                    self.view.show_next = show_next;
                    self.view.name = name;
                    self.view.preview_key = preview_key;
                }
                ViewEvent::Countdown { seconds } => {
                    self.view.countdown = Some(seconds);
                }
                ViewEvent::ReturnToPrevious => {
                    self.phase = Phase::Title;
                }
                ViewEvent::CutsceneThenLoad { cutscene, map } => {
                    self.phase = Phase::Cutscene { id: cutscene, map, elapsed: Duration::ZERO };
                }
                ViewEvent::LoadLevel { map } => {
                    self.phase = Phase::Loading { map };
                }
            }
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: Duration) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// Advance message and cutscene timers.
    /// Returns the map to load once a cutscene has run its course.
    pub fn tick_screens(&mut self, delta: Duration, cutscene_len: Duration) -> Option<String> {
        self.anim_tick = self.anim_tick.wrapping_add(1);

        if !self.message_timer.is_zero() {
            self.message_timer = self.message_timer.saturating_sub(delta);
            if self.message_timer.is_zero() {
                self.message.clear();
            }
        }

        if let Phase::Cutscene { map, elapsed, .. } = &mut self.phase {
            *elapsed += delta;
            if *elapsed >= cutscene_len {
                return Some(map.clone());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(unlocked: usize) -> AppState {
        AppState::new(Rc::new(LevelCatalog::builtin()), &AppConfig::default(), &unlocked)
    }

    #[test]
    fn starts_on_title_without_view() {
        let a = app(0);
        assert_eq!(a.phase, Phase::Title);
        assert_eq!(a.view, SelectView::default());
        assert!(!a.single.is_multiplayer());
        assert!(a.multi.is_multiplayer());
    }

    #[test]
    fn open_multi_shows_first_level_and_countdown() {
        let mut a = app(1);
        a.open_select(SelectKind::Multi, &1usize);
        assert_eq!(a.phase, Phase::LevelSelect);
        assert_eq!(a.view.name, "Tutorial");
        assert!(a.view.show_next);
        assert!(!a.view.show_prev);
        assert_eq!(a.view.countdown, Some(60));
        assert!(a.selecter().is_visible());
    }

    #[test]
    fn events_switch_screens() {
        let mut a = app(0);
        a.apply(&mut vec![ViewEvent::CutsceneThenLoad { cutscene: "intro".into(), map: "m".into() }]);
        assert!(matches!(a.phase, Phase::Cutscene { ref id, .. } if id == "intro"));

        a.apply(&mut vec![ViewEvent::LoadLevel { map: "m".into() }]);
        assert_eq!(a.phase, Phase::Loading { map: "m".into() });

        a.apply(&mut vec![ViewEvent::ReturnToPrevious]);
        assert_eq!(a.phase, Phase::Title);
    }

    #[test]
    fn cutscene_finishes_after_its_length() {
        let mut a = app(0);
        a.apply(&mut vec![ViewEvent::CutsceneThenLoad { cutscene: "intro".into(), map: "maps/tutorial.tmx".into() }]);
        let len = Duration::from_secs(2);
        assert_eq!(a.tick_screens(Duration::from_secs(1), len), None);
        assert_eq!(a.tick_screens(Duration::from_secs(1), len), Some("maps/tutorial.tmx".to_string()));
    }

    #[test]
    fn message_clears_when_timer_runs_out() {
        let mut a = app(0);
        a.set_message("hello", Duration::from_millis(100));
        a.tick_screens(Duration::from_millis(60), Duration::from_secs(1));
        assert_eq!(a.message, "hello");
        a.tick_screens(Duration::from_millis(60), Duration::from_secs(1));
        assert!(a.message.is_empty());
    }
}
