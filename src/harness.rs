//! The benchmark harness: reads problem lines, dispatches them to the algebra engine,
//! times the engine calls and writes one result line per problem.
//!
//! ```text
//! driver -> reader -> problem -> tokenizer -> solver -> timer(engine) -> format -> output
//! ```
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod format;
pub mod problem;
pub mod reader;
pub mod solver;
pub mod timer;
pub mod tokenizer;
