pub mod dialog;
pub mod error;
pub mod intent;
pub mod keywords;
pub mod models;
pub mod normalize;

pub use dialog::{compose_reply, format_price};
pub use error::{CatalogError, VectorizeError};
pub use intent::IntentClassifier;
pub use keywords::KeywordDetector;
pub use models::*;
pub use normalize::{expand_abbreviations, normalize_text};
