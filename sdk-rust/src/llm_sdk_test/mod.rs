//! Test doubles for code built on [`LanguageModel`](crate::LanguageModel).
mod model;

pub use model::{MockGenerateResult, MockLanguageModel};
