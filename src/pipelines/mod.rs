pub mod url;

pub use url::Clipper;
