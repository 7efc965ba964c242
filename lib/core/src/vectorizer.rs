//! Bag-of-words count vectorizer
//!
//! Turns free-text descriptions into [`SparseVector`]s over a vocabulary of at
//! most `max_features` terms. The vocabulary keeps the most frequent terms of
//! the corpus (ties by term) and indexes them alphabetically, so the output is
//! fully determined by the input corpus and the [`VectorizerConfig`].

use ahash::AHashMap;
use std::cmp::Reverse;

use crate::config::VectorizerConfig;
use crate::sparse::SparseVector;
use crate::stopwords::StopWordSet;

#[derive(Debug, Clone)]
pub struct CountVectorizer {
    config: VectorizerConfig,
    stop_words: StopWordSet,
}

impl CountVectorizer {
    #[must_use]
    pub fn new(config: VectorizerConfig) -> Self {
        let stop_words = StopWordSet::from_config(&config.stop_words);
        Self { config, stop_words }
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    /// Lowercase, split on anything that is not alphanumeric or `_`, then drop
    /// short tokens and stop words
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        tokenize(text, self.config.min_token_len, &self.stop_words)
    }

    /// Learn the vocabulary from a corpus
    pub fn fit<S: AsRef<str>>(&self, documents: &[S]) -> FittedVectorizer {
        let mut totals: AHashMap<String, u64> = AHashMap::new();
        for doc in documents {
            for token in self.tokenize(doc.as_ref()) {
                *totals.entry(token).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, u64)> = totals.into_iter().collect();
        ranked.sort_unstable_by(|a, b| (Reverse(a.1), &a.0).cmp(&(Reverse(b.1), &b.0)));
        ranked.truncate(self.config.max_features);

        let mut terms: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        terms.sort_unstable();

        let vocabulary = terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx as u32))
            .collect();

        tracing::debug!(
            documents = documents.len(),
            vocabulary = terms.len(),
            "Fitted count vectorizer"
        );

        FittedVectorizer {
            vocabulary,
            terms,
            min_token_len: self.config.min_token_len,
            stop_words: self.stop_words.clone(),
        }
    }

    /// Fit on the corpus and transform every document of it
    pub fn fit_transform<S: AsRef<str>>(&self, documents: &[S]) -> (FittedVectorizer, Vec<SparseVector>) {
        let fitted = self.fit(documents);
        let vectors = documents.iter().map(|d| fitted.transform(d.as_ref())).collect();
        (fitted, vectors)
    }
}

/// Vectorizer with a learned vocabulary
#[derive(Debug, Clone)]
pub struct FittedVectorizer {
    vocabulary: AHashMap<String, u32>,
    terms: Vec<String>,
    min_token_len: usize,
    stop_words: StopWordSet,
}

impl FittedVectorizer {
    /// Count in-vocabulary terms of one document
    pub fn transform(&self, text: &str) -> SparseVector {
        let pairs = tokenize(text, self.min_token_len, &self.stop_words)
            .iter()
            .filter_map(|token| self.vocabulary.get(token).map(|&idx| (idx, 1.0)))
            .collect();
        SparseVector::from_pairs(pairs)
    }

    /// Vocabulary terms in index order
    pub fn vocabulary(&self) -> &[String] {
        &self.terms
    }

    pub fn term_index(&self, term: &str) -> Option<u32> {
        self.vocabulary.get(term).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

fn tokenize(text: &str, min_len: usize, stop_words: &StopWordSet) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|s| s.chars().count() >= min_len)
        .filter(|s| !stop_words.contains(s))
        .map(str::to_string)
        .collect()
}
