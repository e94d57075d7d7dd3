//! Natural language answers over retrieved datasets.
//!
//! `AnswerGenerator` hands the question, its plan and a bounded summary of
//! the data to an LLM and cites every dataset that was consulted.

mod answer_generator;
mod types;

pub use answer_generator::{AnswerGenerator, AnswerGeneratorBuilder};
pub use types::{Answer, Citation};
