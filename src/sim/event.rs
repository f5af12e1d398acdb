/// Intents emitted by the level-select core.
/// The presentation layer consumes these to redraw or switch screens.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewEvent {
    /// Current selection changed or was re-applied.
    Selection {
        show_prev: bool,
        show_next: bool,
        name: String,
        preview_key: String,
    },
    /// Whole seconds left on the multiplayer countdown.
    Countdown { seconds: u64 },
    /// Pop back to whatever screen opened level selection.
    ReturnToPrevious,
    CutsceneThenLoad { cutscene: String, map: String },
    LoadLevel { map: String },
}
