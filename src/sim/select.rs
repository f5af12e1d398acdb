/// Level-select screen session.
///
/// Glues the selection cursor, the registration countdown and the session
/// starter into the operations the input layer calls:
///
///   refresh  → screen shown (again); re-read progression, re-publish
///   navigate → one step previous/next
///   start    → launch the current level
///   back     → abandon selection, return to the opening screen
///   tick     → per-frame countdown (multiplayer, while shown)
///
/// Every operation appends its `ViewEvent`s to the caller's outbox.

use std::rc::Rc;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::level::{Direction, LevelCatalog, LevelDescriptor};
use crate::domain::unlock::Progression;
use crate::sim::event::ViewEvent;
use crate::sim::selection::{SelectError, SelectionController};
use crate::sim::session::{Mode, NetworkAdapter, SessionStarter};
use crate::sim::timer::ExpiryTimer;

#[derive(Clone, Debug)]
pub struct SelectSettings {
    pub countdown: Duration,
    /// Level id started when the multiplayer countdown runs out.
    pub fallback_level: String,
}

impl Default for SelectSettings {
    fn default() -> Self {
        SelectSettings {
            countdown: crate::sim::timer::DEFAULT_COUNTDOWN,
            fallback_level: "level_1".to_string(),
        }
    }
}

pub struct LevelSelecter {
    catalog: Rc<LevelCatalog>,
    selection: SelectionController,
    starter: SessionStarter,
    countdown: Option<ExpiryTimer>,
    fallback: usize,
    visible: bool,
}

impl LevelSelecter {
    /// Builds the session seeded with the first level. The screen starts
    /// hidden; call `refresh` when it is shown.
    pub fn new(
        catalog: Rc<LevelCatalog>,
        mode: Mode,
        settings: &SelectSettings,
        progression: &dyn Progression,
        out: &mut Vec<ViewEvent>,
    ) -> Self {
        let fallback = match catalog.by_id(&settings.fallback_level) {
            Some(level) => level.ordinal,
            None => {
                warn!(id = %settings.fallback_level, "fallback level not in catalog, using first level");
                catalog.first().ordinal
            }
        };
        let countdown = match mode {
            Mode::Multi(_) => Some(ExpiryTimer::new(settings.countdown)),
            Mode::Single => None,
        };
        let selection = SelectionController::new(&catalog, progression, out);

        LevelSelecter {
            catalog,
            selection,
            starter: SessionStarter::new(mode),
            countdown,
            fallback,
            visible: false,
        }
    }

    pub fn current(&self) -> Option<&LevelDescriptor> {
        self.selection.current(&self.catalog)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_multiplayer(&self) -> bool {
        self.starter.is_multiplayer()
    }

    #[cfg(test)]
    pub fn countdown(&self) -> Option<&ExpiryTimer> {
        self.countdown.as_ref()
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    pub fn refresh(&mut self, progression: &dyn Progression, out: &mut Vec<ViewEvent>) {
        self.visible = true;
        self.selection.refresh(&self.catalog, progression, out);
        if let Some(t) = &self.countdown {
            if !t.is_expired() {
                out.push(ViewEvent::Countdown { seconds: t.seconds_left() });
            }
        }
    }

    pub fn navigate(
        &mut self,
        dir: Direction,
        progression: &dyn Progression,
        out: &mut Vec<ViewEvent>,
    ) -> Result<(), SelectError> {
        self.selection
            .navigate(dir, &self.catalog, progression, out)
            .map(|_| ())
    }

    /// Launch whatever is selected.
    pub fn start(&mut self, network: &mut dyn NetworkAdapter, out: &mut Vec<ViewEvent>) {
        let Some(level) = self.selection.current(&self.catalog) else {
            return;
        };
        self.starter.start(level, network, self.countdown.as_mut(), out);
        self.visible = false;
    }

    pub fn back(&mut self, network: &mut dyn NetworkAdapter, out: &mut Vec<ViewEvent>) {
        out.push(ViewEvent::ReturnToPrevious);
        if self.starter.is_multiplayer() {
            network.reset();
        }
        if let Some(t) = self.countdown.as_mut() {
            t.reset();
        }
        self.visible = false;
    }

    /// Advance the countdown. On expiry the fallback level is started.
    pub fn tick(&mut self, delta: Duration, network: &mut dyn NetworkAdapter, out: &mut Vec<ViewEvent>) {
        if !self.visible {
            return;
        }
        let Some(report) = self.countdown.as_mut().and_then(|t| t.tick(delta)) else {
            return;
        };
        out.push(ViewEvent::Countdown { seconds: report.seconds });

        if report.fired {
            let Some(level) = self.catalog.get(self.fallback) else {
                return;
            };
            info!(level = %level.id, "registration countdown expired, starting fallback");
            self.starter.start(level, network, self.countdown.as_mut(), out);
            self.visible = false;
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::session::tests::{alice, RecordingNetwork};

    fn multi(unlocked: usize) -> (LevelSelecter, Vec<ViewEvent>) {
        let mut out = vec![];
        let mut sel = LevelSelecter::new(
            Rc::new(LevelCatalog::builtin()),
            alice(),
            &SelectSettings::default(),
            &unlocked,
            &mut out,
        );
        out.clear();
        sel.refresh(&unlocked, &mut out);
        (sel, out)
    }

    fn fired_starts(out: &[ViewEvent]) -> usize {
        out.iter().filter(|e| **e == ViewEvent::ReturnToPrevious).count()
    }

    #[test]
    fn new_screen_is_hidden_until_refreshed() {
        let mut out = vec![];
        let sel = LevelSelecter::new(
            Rc::new(LevelCatalog::builtin()),
            Mode::Single,
            &SelectSettings::default(),
            &0usize,
            &mut out,
        );
        assert!(!sel.is_visible());
        assert_eq!(out.len(), 1);
        assert_eq!(sel.current().map(|l| l.ordinal), Some(0));
        assert!(sel.countdown().is_none());
    }

    #[test]
    fn refresh_in_multiplayer_shows_countdown() {
        let (sel, out) = multi(1);
        assert!(sel.is_visible());
        assert!(out.contains(&ViewEvent::Countdown { seconds: 60 }));
    }

    #[test]
    fn start_on_level1_registers_alice() {
        let (mut sel, _) = multi(1);
        let mut out = vec![];
        let mut net = RecordingNetwork::default();
        sel.navigate(Direction::Next, &1usize, &mut out).unwrap();
        sel.tick(Duration::from_secs(12), &mut net, &mut out);

        out.clear();
        sel.start(&mut net, &mut out);

        assert_eq!(net.registrations.len(), 1);
        assert_eq!(net.registrations[0].0, "Alice");
        assert_eq!(net.registrations[0].2, "Level_1 maps/level1.tmx");
        assert_eq!(out, vec![ViewEvent::ReturnToPrevious]);
        let timer = sel.countdown().unwrap();
        assert_eq!(timer.remaining(), Duration::from_secs(60));
        assert!(!timer.is_expired());
        assert!(!sel.is_visible());
    }

    #[test]
    fn countdown_expiry_starts_fallback_once() {
        let (mut sel, _) = multi(0);
        let mut out = vec![];
        let mut net = RecordingNetwork::default();

        // Tutorial stays selected; expiry still targets the fixed fallback.
        for _ in 0..240 {
            sel.tick(Duration::from_millis(250), &mut net, &mut out);
        }
        assert!(out.contains(&ViewEvent::Countdown { seconds: 0 }));
        assert_eq!(fired_starts(&out), 1);
        assert_eq!(net.registrations.len(), 1);
        assert_eq!(net.registrations[0].2, "Level_1 maps/level1.tmx");

        for _ in 0..240 {
            sel.tick(Duration::from_millis(250), &mut net, &mut out);
        }
        assert_eq!(net.registrations.len(), 1);
    }

    #[test]
    fn ticks_ignored_while_hidden() {
        let (mut sel, _) = multi(1);
        let mut out = vec![];
        let mut net = RecordingNetwork::default();
        sel.back(&mut net, &mut out);
        out.clear();

        sel.tick(Duration::from_secs(600), &mut net, &mut out);
        assert!(out.is_empty());
        assert!(net.registrations.is_empty());
    }

    #[test]
    fn back_resets_network_and_countdown() {
        let (mut sel, _) = multi(1);
        let mut out = vec![];
        let mut net = RecordingNetwork::default();
        sel.tick(Duration::from_secs(45), &mut net, &mut out);

        out.clear();
        sel.back(&mut net, &mut out);
        assert_eq!(out, vec![ViewEvent::ReturnToPrevious]);
        assert_eq!(net.resets, 1);
        assert_eq!(sel.countdown().unwrap().remaining(), Duration::from_secs(60));
    }

    #[test]
    fn single_player_back_leaves_network_alone() {
        let mut out = vec![];
        let mut sel = LevelSelecter::new(
            Rc::new(LevelCatalog::builtin()),
            Mode::Single,
            &SelectSettings::default(),
            &0usize,
            &mut out,
        );
        let mut net = RecordingNetwork::default();
        sel.refresh(&0usize, &mut out);
        sel.back(&mut net, &mut out);
        assert_eq!(net.resets, 0);
    }

    #[test]
    fn single_player_start_on_tutorial_plays_intro() {
        let mut out = vec![];
        let mut sel = LevelSelecter::new(
            Rc::new(LevelCatalog::builtin()),
            Mode::Single,
            &SelectSettings::default(),
            &3usize,
            &mut out,
        );
        let mut net = RecordingNetwork::default();
        sel.refresh(&3usize, &mut out);
        out.clear();
        sel.start(&mut net, &mut out);
        assert_eq!(
            out,
            vec![ViewEvent::CutsceneThenLoad {
                cutscene: "intro".into(),
                map: "maps/tutorial.tmx".into(),
            }]
        );
    }

    #[test]
    fn unknown_fallback_uses_first_level() {
        let mut out = vec![];
        let settings = SelectSettings {
            countdown: Duration::from_secs(1),
            fallback_level: "missing".into(),
        };
        let mut sel = LevelSelecter::new(
            Rc::new(LevelCatalog::builtin()),
            alice(),
            &settings,
            &0usize,
            &mut out,
        );
        let mut net = RecordingNetwork::default();
        sel.refresh(&0usize, &mut out);
        sel.tick(Duration::from_secs(1), &mut net, &mut out);
        assert_eq!(net.registrations[0].2, "Tutorial maps/tutorial.tmx");
    }
}
