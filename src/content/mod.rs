pub mod migration;

pub use migration::{move_notes, move_todo, MoveOutcome, NOTES_SEPARATOR};
