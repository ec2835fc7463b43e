//! # HashVDB - A Toy Session Vector Database
//!
//! HashVDB turns text into 384-dimensional unit vectors with a deterministic
//! hashing scheme (no model involved), keeps them in a per-session store, and
//! ranks stored entries against a query by cosine similarity.
//!
//! Similarity reflects shared words and text length, not meaning.
//!
//! ## Example
//!
//! ```
//! use hashvdb::{cosine_similarity, embed, EntryStore};
//!
//! let mut store = EntryStore::new();
//!
//! // Vectorize and store some text
//! store.add_text("the quick brown fox").unwrap();
//! store.add_text("a lazy afternoon nap").unwrap();
//! store.add_text("quick brown foxes jump").unwrap();
//!
//! // Search for similar entries (top 10, most similar first)
//! let results = store.search("quick brown fox").unwrap();
//! assert_eq!(results.len(), 3);
//! assert!(results[0].similarity >= results[1].similarity);
//!
//! // Embeddings are deterministic
//! let v = embed("hello");
//! assert!((cosine_similarity(&v, &embed("HELLO")).unwrap() - 1.0).abs() < 1e-9);
//! ```

pub mod config;
pub mod embedding;
pub mod entry;
pub mod error;
pub mod search;
pub mod server;
pub mod store;
pub mod vector;

pub use config::ServerConfig;
pub use embedding::{embed, embedding_preview, EMBEDDING_DIM};
pub use entry::Entry;
pub use error::{StoreError, VectorError};
pub use search::{format_similarity, rank, rank_top_k, SearchResult, SimilarityTier, TOP_K};
pub use store::EntryStore;
pub use vector::{cosine_similarity, Embedding};
