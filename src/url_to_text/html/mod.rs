pub mod extractors;
pub mod preprocess;

pub use preprocess::{preprocess_html, PreprocessOptions};
