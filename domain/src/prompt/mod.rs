//! Prompt templates for routing and collaboration

mod template;

pub use template::PromptTemplate;
