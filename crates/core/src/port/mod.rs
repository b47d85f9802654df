// Port Layer - Interfaces for external dependencies

pub mod entity_store;
pub mod fault_policy;
pub mod id_provider; // For deterministic testing
pub mod memory_store;
pub mod time_provider;

// Re-exports
pub use entity_store::{
    merge_fields, table, Collection, Entity, EntityStore, IndexKey, IndexQuery, Record, Table,
    WriteBatch, WriteOp,
};
pub use fault_policy::{
    FaultConfig, FaultPlan, FaultPolicy, NoFaults, Operation, RandomFaultPolicy, Verb,
};
pub use id_provider::{IdProvider, UuidProvider};
pub use memory_store::MemoryEntityStore;
pub use time_provider::{SystemTimeProvider, TimeProvider};
