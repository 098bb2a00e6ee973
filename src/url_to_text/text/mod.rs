mod extractor;
pub mod json_repair;

pub use extractor::{parse_model_output, response_text, AiExtractor, ModelOutput};
