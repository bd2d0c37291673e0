//! Prompt domain
//!
//! Templates for the extraction prompt sent to every provider and the
//! arbitration prompt sent when their answers disagree.

mod template;

pub use template::PromptTemplate;
