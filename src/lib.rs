//! Material agent: a language-model agent driving a material screening
//! pipeline (read, predict, match, save) through tool calls.
//!
//! Composition parsing, featurization and the gradient-boosted classifier
//! live in-crate; the model backend is any OpenAI-compatible endpoint.

pub mod agent;
pub mod chem;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod tools;
pub mod training;
pub mod types;
pub mod web;
