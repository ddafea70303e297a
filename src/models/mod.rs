// Core models
pub mod configuration;
pub mod match_model;
pub mod timer;
pub mod tournament;

// Re-export commonly used types
pub use configuration::*;
pub use match_model::*;
pub use timer::*;
pub use tournament::*;
