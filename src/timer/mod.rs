pub mod controller;
pub mod state;

pub use controller::{TickerControl, TickerKey, TickerSet};
pub use state::{format_remaining, phase_of, StartOutcome, TickOutcome, TimerPhase};
