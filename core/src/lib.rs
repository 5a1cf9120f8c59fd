//! Romanian-aware document indexing and keyword search.
//!
//! Write path: [`extract`] → [`normalizer`] → [`builder`] → [`persist`].
//! Read path: [`persist`] → [`search`] (which parses with [`query`] and
//! normalizes with the same [`normalizer`]).

pub mod builder;
pub mod error;
pub mod extract;
pub mod index;
pub mod normalizer;
pub mod persist;
pub mod query;
pub mod search;
pub mod stopwords;

pub use builder::{index_sources, BuildReport, DocumentSource, IndexBuilder, SkippedDocument};
pub use error::{DocSearchError, Result};
pub use extract::{ExtractorRegistry, TextExtractor};
pub use index::{DocId, DocMeta, Document, InvertedIndex, Posting, TermId};
pub use normalizer::Normalizer;
pub use persist::IndexStore;
pub use search::{search, Bm25Params, SearchEngine, SearchHit, DEFAULT_K};
pub use stopwords::StopwordSet;
