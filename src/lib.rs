//! Clips recipe web pages into canonical, structured recipe records.
//!
//! Pages are read from their JSON-LD when they carry a complete schema.org
//! Recipe; otherwise the narrowed HTML goes to a generative model and its
//! answer is repaired, parsed and normalized the same way.
//!
//! ```no_run
//! use recipe_clipper::Clipper;
//!
//! # async fn run() -> Result<(), recipe_clipper::ClipError> {
//! let clipper = Clipper::builder().build()?;
//! let record = clipper.clip("https://example.com/best-banana-bread").await?;
//! println!("{}: {} ingredients", record.recipe.name, record.recipe.ingredients.len());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod pipelines;
pub mod providers;
pub mod server;
pub mod url_to_text;

pub use builder::ClipperBuilder;
pub use crate::config::{load_config, ClipperConfig};
pub use error::ClipError;
pub use model::{CachedRecipeRecord, CanonicalRecipe};
pub use pipelines::Clipper;
