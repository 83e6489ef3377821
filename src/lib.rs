#![warn(missing_docs)]
//! Core library for embedding document collections and running KNN
//! semantic search against a Solr collection.

pub mod config;
pub mod corpus;
pub mod document;
pub mod embedder;
pub mod error;
pub mod knn;
pub mod pipeline;
pub mod prompt;
pub mod reducer;
pub mod search;
#[cfg(test)]
mod test_http;
pub mod vector;

pub use document::{Document, FieldValue};
pub use embedder::{Embedder, EmbeddingGateway};
pub use error::{Error, Result};
pub use knn::{encode_knn, KnnQuery, DEFAULT_TOP_K};
pub use pipeline::{
    batch_embed, batch_embed_file, semantic_search, vector_search, BatchOptions, BatchReport,
    SearchOptions,
};
pub use reducer::{reduce, ExcludedFields};
pub use search::{SearchBackend, SearchHit, SearchRequest};
pub use vector::DEFAULT_DIMENSIONS;
