pub mod chat;
pub mod record;
pub mod relevance;
pub mod tier;

pub use chat::ChatCompletionResponse;
pub use record::*;
pub use relevance::*;
pub use tier::*;
