/// Unlock gate: which catalog entries the player may reach.
///
/// Progression is owned by an outside save subsystem and handed in as a
/// read accessor. It is queried on every call, never cached here.

use crate::domain::level::LevelDescriptor;

/// Read access to the external unlock counter.
pub trait Progression {
    fn highest_unlocked_ordinal(&self) -> usize;
}

/// A fixed threshold. Handy for tests and for a progression snapshot.
impl Progression for usize {
    fn highest_unlocked_ordinal(&self) -> usize {
        *self
    }
}

pub fn is_unlocked(level: &LevelDescriptor, progression: &dyn Progression) -> bool {
    level.ordinal <= progression.highest_unlocked_ordinal()
}
