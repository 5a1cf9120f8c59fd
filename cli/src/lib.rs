use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser};
use docsearch_core::{
    index_sources, DocSearchError, DocumentSource, ExtractorRegistry, IndexStore, Normalizer, SearchEngine,
    StopwordSet, DEFAULT_K,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "docsearch")]
#[command(about = "Index a folder of documents and search it with Romanian-aware normalization", long_about = None)]
#[command(group(ArgGroup::new("mode").required(true).args(["index", "search"])))]
pub struct Cli {
    /// Rebuild the index from the documents in --directory
    #[arg(long, requires = "directory")]
    pub index: bool,
    /// Search the last built index for --query
    #[arg(long, requires = "query")]
    pub search: bool,
    /// Folder with .txt, .pdf and .docx files (not searched recursively)
    #[arg(long, value_name = "PATH")]
    pub directory: Option<PathBuf>,
    /// Query text; supports +required, -excluded, AND/OR/NOT and "phrases"
    #[arg(long, value_name = "TEXT")]
    pub query: Option<String>,
    /// Where the index is stored
    #[arg(long, env = "DOCSEARCH_INDEX_DIR", default_value = "./index")]
    pub index_dir: PathBuf,
    /// Stopword list, one word per line ('#' comments); defaults to the built-in Romanian list
    #[arg(long, env = "DOCSEARCH_STOPWORDS", value_name = "FILE")]
    pub stopwords: Option<PathBuf>,
    /// Maximum number of results
    #[arg(long, short = 'k', env = "DOCSEARCH_LIMIT", default_value_t = DEFAULT_K)]
    pub limit: usize,
}

pub fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    let normalizer = load_normalizer(cli.stopwords.as_deref())?;
    let store = IndexStore::new(&cli.index_dir);

    match (&cli.directory, &cli.query) {
        (Some(directory), _) if cli.index => {
            let summary = index_directory(directory, &store, &normalizer)?;
            writeln!(
                out,
                "Indexed {} document(s) from {} into {} ({} skipped)",
                summary.indexed,
                directory.display(),
                store.root().display(),
                summary.skipped
            )?;
        }
        (_, Some(query)) if cli.search => {
            for filename in search_index(query, &store, &normalizer, cli.limit)? {
                writeln!(out, "{filename}")?;
            }
        }
        _ => bail!("either --index --directory <PATH> or --search --query <TEXT> is required"),
    }
    Ok(())
}

pub fn load_normalizer(stopwords: Option<&Path>) -> Result<Normalizer> {
    let set = match stopwords {
        Some(path) => StopwordSet::load(path).with_context(|| format!("failed to read stopwords from {}", path.display()))?,
        None => StopwordSet::romanian(),
    };
    Ok(Normalizer::new(set))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSummary {
    pub indexed: usize,
    pub skipped: usize,
}

/// Wipe the store and rebuild it from the files directly inside `directory`.
pub fn index_directory(directory: &Path, store: &IndexStore, normalizer: &Normalizer) -> Result<IndexSummary> {
    if !directory.is_dir() {
        bail!("{} is not a directory", directory.display());
    }
    let documents = directory
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", directory.display()))?;
    if let Ok(root) = store.root().canonicalize() {
        if documents.starts_with(&root) {
            bail!(
                "index directory {} contains the documents in {}; choose another --index-dir",
                store.root().display(),
                directory.display()
            );
        }
    }
    let sources = collect_sources(directory);
    tracing::info!(directory = %directory.display(), files = sources.len(), "indexing documents");

    store.clear()?;
    let report = index_sources(&sources, &ExtractorRegistry::with_defaults(), normalizer);
    store.save(&report.index)?;

    Ok(IndexSummary { indexed: report.indexed, skipped: report.skipped.len() })
}

/// Regular files directly inside `directory`, sorted by name.
pub fn collect_sources(directory: &Path) -> Vec<DocumentSource> {
    WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                tracing::warn!(%err, "cannot read directory entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| DocumentSource::new(e.into_path()))
        .collect()
}

/// Filenames of the best matches for `query`, best first.
pub fn search_index(query: &str, store: &IndexStore, normalizer: &Normalizer, limit: usize) -> Result<Vec<String>> {
    let index = store.load()?;
    let hits = SearchEngine::new(&index, normalizer).search(query, limit)?;
    Ok(hits
        .into_iter()
        .filter_map(|hit| index.doc(hit.doc_id).map(|meta| meta.filename.clone()))
        .collect())
}

/// One-line message for the terminal. User mistakes get just the message;
/// everything else gets the full context chain.
pub fn error_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<DocSearchError>() {
        Some(e) if e.is_user_facing() => e.to_string(),
        _ => format!("{err:#}"),
    }
}
