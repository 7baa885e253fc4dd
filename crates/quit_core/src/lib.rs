pub mod achievements;
pub mod calendar;
pub mod engine;
pub mod error;
pub mod milestones;
pub mod profile;
pub mod recovery;
pub mod savings;
pub mod service;
pub mod snapshot;
pub mod thresholds;
pub mod time_basis;

pub use crate::engine::{ProgressEngine, ProgressEngineBuilder};
pub use crate::error::EngineError;
pub use crate::profile::{QuitProfile, RawProfile};
pub use crate::service::{ProgressService, ProgressServiceBuilder};
pub use crate::snapshot::DerivedSnapshot;
