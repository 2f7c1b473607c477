//! Migration workflow orchestration

pub mod migration_engine;

pub use migration_engine::{ItemOutcome, ItemStage, MigrationEngine, MigrationSummary};
