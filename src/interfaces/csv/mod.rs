//! CSV interface for the demo CLI: a scenario script in, the final platform
//! state out.

pub mod script_reader;
pub mod state_writer;
