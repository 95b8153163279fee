#![forbid(unsafe_code)]

pub mod error;
pub mod generator;
pub mod kanji;
pub mod model;
pub mod time;

pub use error::Error;
pub use generator::{GenerationPolicy, ProblemGenerator, multiplication_facts};
pub use time::Clock;
