//! Answer generation with tool calling.
//!
//! The [`Generator`] drives a bounded conversation with the language model:
//! the model may search course content or fetch outlines for a fixed
//! number of rounds before it has to answer.

mod generator;

pub use generator::{Generation, Generator, ToolCallRecord, DEFAULT_MAX_ROUNDS};
