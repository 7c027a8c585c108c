//! Game-specific automation tables built on top of the engine.

pub mod raid;
