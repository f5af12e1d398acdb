/// Keyboard input, drained once per frame.
///
/// Level selection only needs edge-triggered presses: one arrow press is
/// one navigation step. Release and repeat events are ignored so a held
/// key does not race through the catalog.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

pub struct InputState {
    /// Keys pressed during the most recent `drain_events()` call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for modifier checks.
    raw_events: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events without blocking.
    pub fn drain_events(&mut self) -> std::io::Result<()> {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                self.raw_events.push(key);
                if key.kind == KeyEventKind::Press {
                    self.fresh_presses.push(key.code);
                }
            }
        }
        Ok(())
    }

    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Convenience: was any of these keys pressed this frame?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}
