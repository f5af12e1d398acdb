/// Selection cursor over the level catalog.
///
/// Owns the "current level" and guarantees it never lands on a locked or
/// nonexistent entry. A neighbour that exists but is still locked is
/// treated exactly like a missing one: no motion, and the arrow that
/// would lead there is hidden.

use thiserror::Error;
use tracing::debug;

use crate::domain::level::{Direction, LevelCatalog, LevelDescriptor};
use crate::domain::unlock::{is_unlocked, Progression};
use crate::sim::event::ViewEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SelectError {
    #[error("no level in that direction")]
    NotFound,
    #[error("level is still locked")]
    Locked,
}

#[derive(Clone, Debug, Default)]
pub struct SelectionController {
    /// Ordinal of the displayed level. `None` before first initialization.
    current: Option<usize>,
}

impl SelectionController {
    /// Create a controller already seeded with the catalog's first entry.
    pub fn new(catalog: &LevelCatalog, progression: &dyn Progression, out: &mut Vec<ViewEvent>) -> Self {
        let mut ctl = SelectionController::default();
        ctl.initialize(catalog, progression, out);
        ctl
    }

    pub fn current<'a>(&self, catalog: &'a LevelCatalog) -> Option<&'a LevelDescriptor> {
        self.current.and_then(|i| catalog.get(i))
    }

    /// Reset the cursor to the first entry and publish it.
    pub fn initialize(&mut self, catalog: &LevelCatalog, progression: &dyn Progression, out: &mut Vec<ViewEvent>) {
        let first = catalog.first();
        self.current = Some(first.ordinal);
        apply(first, catalog, progression, out);
    }

    /// Re-publish the current selection against fresh progression,
    /// or initialize if nothing is selected yet.
    pub fn refresh(&mut self, catalog: &LevelCatalog, progression: &dyn Progression, out: &mut Vec<ViewEvent>) {
        match self.current(catalog) {
            Some(level) => apply(level, catalog, progression, out),
            None => self.initialize(catalog, progression, out),
        }
    }

    /// Move one step. On rejection nothing changes and nothing is emitted.
    pub fn navigate<'a>(
        &mut self,
        dir: Direction,
        catalog: &'a LevelCatalog,
        progression: &dyn Progression,
        out: &mut Vec<ViewEvent>,
    ) -> Result<&'a LevelDescriptor, SelectError> {
        let here = self.current(catalog).ok_or(SelectError::NotFound)?;
        let candidate = match catalog.neighbor(here, dir) {
            Some(c) => c,
            None => {
                debug!(from = %here.id, ?dir, "navigation rejected: boundary");
                return Err(SelectError::NotFound);
            }
        };
        if !is_unlocked(candidate, progression) {
            debug!(from = %here.id, to = %candidate.id, "navigation rejected: locked");
            return Err(SelectError::Locked);
        }

        self.current = Some(candidate.ordinal);
        apply(candidate, catalog, progression, out);
        Ok(candidate)
    }
}

/// Is there an unlocked neighbour in this direction?
fn can_move(level: &LevelDescriptor, dir: Direction, catalog: &LevelCatalog, progression: &dyn Progression) -> bool {
    catalog
        .neighbor(level, dir)
        .map_or(false, |n| is_unlocked(n, progression))
}

fn apply(level: &LevelDescriptor, catalog: &LevelCatalog, progression: &dyn Progression, out: &mut Vec<ViewEvent>) {
    out.push(ViewEvent::Selection {
        show_prev: can_move(level, Direction::Previous, catalog, progression),
        show_next: can_move(level, Direction::Next, catalog, progression),
        name: level.display_name.clone(),
        preview_key: level.preview_key.clone(),
    });
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
