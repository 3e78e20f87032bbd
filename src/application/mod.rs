//! Application layer: the dispatch engine orchestrating delivery creation,
//! rider assignment and the status state machine over the store ports.

pub mod engine;
pub mod strategies;
