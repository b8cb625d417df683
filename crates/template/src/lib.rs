//! Dispute template synthesis.
//!
//! This crate provides:
//! - A minimal placeholder language (`{{ name }}`, `{{# section }}`, `{{^ inverted }}`)
//!   with a tokenizer and a section-stack evaluator
//! - The dispute template document rendered into the foreign proxy's constructor
//! - The data mapping document describing how placeholders are populated

pub mod dispute;
mod error;
pub mod eval;
pub mod lexer;
pub mod mapping;

pub use dispute::{render_template, Answer, DisputeTemplate, TemplateSettings};
pub use error::TemplateRenderError;
pub use eval::{Context, Template, Value};
pub use mapping::{render_mapping, DisputeTemplateMapping, MappingEntry};
