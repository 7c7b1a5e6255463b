pub mod engine;
pub mod executor;
pub mod liquidation;
pub mod orchestrator;
pub mod pacing;
pub mod valuator;
