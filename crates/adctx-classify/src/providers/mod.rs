pub mod keyword;
pub mod openai_compatible;

pub use keyword::KeywordClassifier;
pub use openai_compatible::OpenAiCompatibleClassifier;
