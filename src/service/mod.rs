// Service layer: match lifecycle, live timing, bracket views
pub mod bracket;
pub mod match_clock;
pub mod match_manager;
pub mod match_registry;
pub mod match_timer;

mod match_manager_test;

pub use bracket::{derive_rounds, load_tournament_bracket, BracketRound, Bracketed, RoundLabel};
pub use match_clock::MatchClock;
pub use match_manager::{MatchManager, MatchOutcome};
pub use match_registry::{MatchRegistry, SharedMatch};
pub use match_timer::{format_clock, MatchTimer};
