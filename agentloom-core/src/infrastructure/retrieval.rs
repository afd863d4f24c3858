//! Document retrieval boundary and a small in-memory keyword retriever.

use crate::types::Document;
use async_trait::async_trait;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("failed to read corpus at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid document on line {line} of {path:?}: {reason}")]
    InvalidDocument {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    /// Ordered documents for `query`; `filters` narrows to documents that
    /// mention at least one of the given entities.
    async fn retrieve(&self, query: &str, filters: &[String]) -> Result<Vec<Document>, RetrievalError>;
}

const DEFAULT_TOP_K: usize = 4;

/// Ranks an in-memory corpus by query-term overlap.
#[derive(Debug, Clone, Default)]
pub struct KeywordRetriever {
    documents: Vec<Document>,
    top_k: usize,
}

impl KeywordRetriever {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Load a JSON-lines corpus. Each line is either a JSON document object
    /// (`{"content": "...", "source": "..."}`) or a JSON string.
    pub fn from_jsonl(path: &Path) -> Result<Self, RetrievalError> {
        let content = fs::read_to_string(path).map_err(|source| RetrievalError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut documents = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let document = if line.starts_with('"') {
                serde_json::from_str::<String>(line).map(Document::new)
            } else {
                serde_json::from_str::<Document>(line)
            }
            .map_err(|e| RetrievalError::InvalidDocument {
                path: path.to_path_buf(),
                line: idx + 1,
                reason: e.to_string(),
            })?;
            documents.push(document);
        }
        debug!(path = %path.display(), documents = documents.len(), "Loaded retrieval corpus");
        Ok(Self::new(documents))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn rank<'a>(&'a self, terms: &HashSet<String>, candidates: impl Iterator<Item = &'a Document>) -> Vec<Document> {
        let mut scored: Vec<(usize, usize, &Document)> = candidates
            .enumerate()
            .filter_map(|(pos, doc)| {
                let doc_terms = terms_of(&doc.content);
                let score = terms.iter().filter(|t| doc_terms.contains(*t)).count();
                (score > 0).then_some((score, pos, doc))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        scored
            .into_iter()
            .take(self.top_k)
            .map(|(_, _, doc)| doc.clone())
            .collect()
    }
}

#[async_trait]
impl DocumentRetriever for KeywordRetriever {
    async fn retrieve(&self, query: &str, filters: &[String]) -> Result<Vec<Document>, RetrievalError> {
        let terms = terms_of(query);
        let lowered: Vec<String> = filters
            .iter()
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty())
            .collect();

        if !lowered.is_empty() {
            let filtered = self.rank(
                &terms,
                self.documents.iter().filter(|doc| {
                    let content = doc.content.to_lowercase();
                    lowered.iter().any(|entity| content.contains(entity.as_str()))
                }),
            );
            if !filtered.is_empty() {
                return Ok(filtered);
            }
            debug!(?filters, "No document matched entity filters, ranking whole corpus");
        }

        Ok(self.rank(&terms, self.documents.iter()))
    }
}

fn terms_of(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 2)
        .map(str::to_lowercase)
        .collect()
}
