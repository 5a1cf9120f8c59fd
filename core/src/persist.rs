use crate::error::{DocSearchError, Result};
use crate::{DocId, DocMeta, InvertedIndex, Posting, TermId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub total_tokens: u64,
    pub created_at: String,
    pub version: u32,
}

struct IndexPaths {
    root: PathBuf,
}

impl IndexPaths {
    fn dictionary(&self) -> PathBuf { self.root.join("dictionary.bin") }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    fn postings_dir(&self) -> PathBuf { self.root.join("postings") }
    fn postings_for(&self, term_id: TermId) -> PathBuf {
        self.postings_dir().join(format!("{term_id:08}.postings.bin"))
    }
}

/// On-disk home of one index. Single writer; a build owns the directory
/// for its whole duration.
pub struct IndexStore {
    paths: IndexPaths,
}

impl IndexStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { paths: IndexPaths { root: root.as_ref().to_path_buf() } }
    }

    pub fn root(&self) -> &Path {
        &self.paths.root
    }

    /// An index counts as present once its metadata file is written, which
    /// `save` does last.
    pub fn exists(&self) -> bool {
        self.paths.meta().is_file()
    }

    /// Remove everything under the root, subdirectories included, and leave
    /// an empty root behind.
    ///
    /// Only a directory that is empty or holds a saved index is removed; any
    /// other non-empty directory is refused with a storage error.
    pub fn clear(&self) -> Result<()> {
        let root = &self.paths.root;
        if root.exists() {
            if !self.exists() && !is_empty_dir(root)? {
                return Err(storage(format!(
                    "refusing to clear {}: it is not empty and holds no index",
                    root.display()
                )));
            }
            fs::remove_dir_all(root)
                .map_err(|e| storage(format!("failed to remove {}: {e}", root.display())))?;
            tracing::info!(path = %root.display(), "removed previous index");
        }
        create_dir_all(root).map_err(|e| storage(format!("failed to create {}: {e}", root.display())))?;
        Ok(())
    }

    pub fn save(&self, index: &InvertedIndex) -> Result<()> {
        create_dir_all(self.paths.postings_dir())
            .map_err(|e| storage(format!("failed to create {}: {e}", self.paths.root.display())))?;

        // Persist postings per term, then dictionary and docs; meta last.
        for (term_id, postings) in &index.postings {
            write_bin(&self.paths.postings_for(*term_id), postings)?;
        }
        write_bin(&self.paths.dictionary(), &(&index.dictionary, &index.df))?;
        write_bin(&self.paths.docs(), &index.docs)?;

        let meta = MetaFile {
            num_docs: index.num_docs,
            total_tokens: index.total_tokens,
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
            version: FORMAT_VERSION,
        };
        let json = serde_json::to_string_pretty(&meta)?;
        write_file(&self.paths.meta(), json.as_bytes())?;

        tracing::info!(path = %self.paths.root.display(), num_docs = index.num_docs, num_terms = index.num_terms(), "index saved");
        Ok(())
    }

    pub fn load_meta(&self) -> Result<MetaFile> {
        if !self.exists() {
            return Err(DocSearchError::IndexNotFound(self.paths.root.clone()));
        }
        let buf = read_file(&self.paths.meta())?;
        let meta: MetaFile = serde_json::from_slice(&buf)
            .map_err(|e| storage(format!("failed to decode {}: {e}", self.paths.meta().display())))?;
        if meta.version != FORMAT_VERSION {
            return Err(storage(format!(
                "index format version {} is not supported (expected {FORMAT_VERSION}); rebuild the index",
                meta.version
            )));
        }
        Ok(meta)
    }

    pub fn load(&self) -> Result<InvertedIndex> {
        let meta = self.load_meta()?;
        let (dictionary, df): (HashMap<String, TermId>, Vec<u32>) = read_bin(&self.paths.dictionary())?;
        let docs: HashMap<DocId, DocMeta> = read_bin(&self.paths.docs())?;

        let mut postings = HashMap::with_capacity(dictionary.len());
        for term_id in dictionary.values() {
            let list: Vec<Posting> = read_bin(&self.paths.postings_for(*term_id))?;
            postings.insert(*term_id, list);
        }

        if docs.len() != meta.num_docs as usize || df.len() != dictionary.len() {
            return Err(storage(format!("index at {} is inconsistent; rebuild it", self.paths.root.display())));
        }

        tracing::debug!(num_docs = meta.num_docs, num_terms = dictionary.len(), created_at = %meta.created_at, "index loaded");
        Ok(InvertedIndex { dictionary, df, postings, docs, num_docs: meta.num_docs, total_tokens: meta.total_tokens })
    }
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path).map_err(|e| storage(format!("failed to read {}: {e}", path.display())))?;
    Ok(entries.next().is_none())
}

fn storage(message: String) -> DocSearchError {
    DocSearchError::Storage(message)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut f = File::create(path).map_err(|e| storage(format!("failed to create {}: {e}", path.display())))?;
    f.write_all(bytes).map_err(|e| storage(format!("failed to write {}: {e}", path.display())))?;
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let mut f = File::open(path).map_err(|e| storage(format!("failed to open {}: {e}", path.display())))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf).map_err(|e| storage(format!("failed to read {}: {e}", path.display())))?;
    Ok(buf)
}

fn write_bin<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let bytes = bincode::serialize(value)?;
    write_file(path, &bytes)
}

fn read_bin<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let buf = read_file(path)?;
    bincode::deserialize(&buf).map_err(|e| storage(format!("failed to decode {}: {e}", path.display())))
}
