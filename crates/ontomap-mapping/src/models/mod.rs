//! Built-in scoring models.

pub mod knn;
pub mod lexicon;

pub use knn::{Exemplar, KnnArtifact, KnnModel};
pub use lexicon::LexiconModel;
