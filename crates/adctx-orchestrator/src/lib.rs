mod config;
mod error;
mod orchestrator;
mod router;

pub use adctx_core::*;
pub use config::OrchestratorConfig;
pub use error::OrchestratorError;
pub use orchestrator::{AddOutcome, AddReport, MemoryOrchestrator, SearchReport};
pub use router::{StoreMode, StoreRouter};
