pub mod event;
pub mod progress;
pub mod select;
pub mod selection;
pub mod session;
pub mod timer;
pub mod world;
