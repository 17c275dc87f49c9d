pub mod keywords;
pub mod pipeline;

pub use keywords::{top_words, DEFAULT_TOP_N};
pub use pipeline::InsightPipeline;
