//! In-memory `EngineBackend` implementation (components C5-C8, ambient C10).

pub mod memory_engine;

pub use memory_engine::MemoryEngine;
