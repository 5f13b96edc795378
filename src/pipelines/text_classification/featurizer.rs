//! Bag-of-n-grams text featurization.
//!
//! Text is normalized and split with the `tokenizers` normalizers and pre-tokenizers, then
//! counted as word n-grams and character n-grams against a vocabulary learned at fit time.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use serde::{Deserialize, Serialize};
use tokenizers::{
    normalizers::bert::BertNormalizer, pre_tokenizers::whitespace::WhitespaceSplit,
    NormalizedString, Normalizer, OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer,
};

use crate::error::{Error, Result};

use super::{Norm, SparseVector};

/// Marks the start of a text for character n-grams
const TEXT_START: char = '\u{2}';

/// Marks the end of a text for character n-grams
const TEXT_END: char = '\u{3}';

/// Text featurization settings
#[derive(burn::config::Config, Debug)]
pub struct FeaturizerConfig {
    /// Longest word n-gram; all shorter lengths are included too
    #[config(default = 2)]
    pub word_ngram_length: usize,

    /// Character n-gram length; 0 disables character n-grams
    #[config(default = 3)]
    pub char_ngram_length: usize,

    /// Lowercase text before splitting
    #[config(default = true)]
    pub lowercase: bool,

    /// Remove diacritics before splitting
    #[config(default = true)]
    pub strip_accents: bool,

    /// Drop terms found in fewer rows than this
    #[config(default = 1)]
    pub min_document_frequency: usize,

    /// Vector normalization
    #[config(default = "Norm::L2")]
    pub norm: Norm,

    /// Keep at most this many terms, most frequent first
    pub max_terms: Option<usize>,
}

/// The subset of [FeaturizerConfig] a fitted featurizer needs at apply time
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextOptions {
    /// Longest word n-gram
    pub word_ngram_length: usize,
    /// Character n-gram length
    pub char_ngram_length: usize,
    /// Lowercase text before splitting
    pub lowercase: bool,
    /// Remove diacritics before splitting
    pub strip_accents: bool,
    /// Vector normalization
    pub norm: Norm,
}

impl From<&FeaturizerConfig> for TextOptions {
    fn from(config: &FeaturizerConfig) -> Self {
        Self {
            word_ngram_length: config.word_ngram_length,
            char_ngram_length: config.char_ngram_length,
            lowercase: config.lowercase,
            strip_accents: config.strip_accents,
            norm: config.norm,
        }
    }
}

impl TextOptions {
    /// Split a text into the terms it contributes, with repetition
    pub fn terms(&self, text: &str) -> Result<Vec<String>> {
        let normalizer = BertNormalizer::new(true, false, Some(self.strip_accents), self.lowercase);

        let mut normalized = NormalizedString::from(text);
        normalizer
            .normalize(&mut normalized)
            .map_err(|e| Error::Tokenizer(e.to_string()))?;

        let chars: Vec<char> = normalized.get().chars().collect();

        let mut pre_tokenized = PreTokenizedString::from(normalized);
        WhitespaceSplit
            .pre_tokenize(&mut pre_tokenized)
            .map_err(|e| Error::Tokenizer(e.to_string()))?;

        let words: Vec<&str> = pre_tokenized
            .get_splits(OffsetReferential::Normalized, OffsetType::Byte)
            .into_iter()
            .map(|(word, _, _)| word)
            .collect();

        let mut terms = Vec::new();

        for n in 1..=self.word_ngram_length {
            for window in words.windows(n) {
                terms.push(format!("w:{}", window.join(" ")));
            }
        }

        if self.char_ngram_length > 0 {
            let framed: Vec<char> = std::iter::once(TEXT_START)
                .chain(chars)
                .chain(std::iter::once(TEXT_END))
                .collect();

            for window in framed.windows(self.char_ngram_length) {
                let mut term = String::with_capacity(2 + window.len() * 4);
                term.push_str("c:");
                term.extend(window);
                terms.push(term);
            }
        }

        Ok(terms)
    }
}

/// A fitted text featurizer: normalization options plus the learned term vocabulary
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextFeaturizer {
    options: TextOptions,
    vocabulary: BTreeMap<String, u32>,
}

impl TextFeaturizer {
    /// Learn the vocabulary from a column of texts
    pub fn fit(config: &FeaturizerConfig, texts: &[String]) -> Result<Self> {
        let options = TextOptions::from(config);

        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for text in texts {
            let unique: BTreeSet<String> = options.terms(text)?.into_iter().collect();

            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let mut kept: Vec<(String, usize)> = document_frequency
            .into_iter()
            .filter(|(_, df)| *df >= config.min_document_frequency)
            .collect();

        if let Some(max_terms) = config.max_terms {
            if kept.len() > max_terms {
                // Stable sort keeps ties in term order
                kept.sort_by(|a, b| b.1.cmp(&a.1));
                kept.truncate(max_terms);
                kept.sort_by(|a, b| a.0.cmp(&b.0));
            }
        }

        let vocabulary: BTreeMap<String, u32> = kept
            .into_iter()
            .enumerate()
            .map(|(index, (term, _))| (term, index as u32))
            .collect();

        debug!(
            "Featurizer vocabulary: {} terms from {} texts",
            vocabulary.len(),
            texts.len()
        );

        Ok(Self {
            options,
            vocabulary,
        })
    }

    /// The dimension of the vectors this featurizer produces
    pub fn dim(&self) -> usize {
        self.vocabulary.len()
    }

    /// Featurize one text. Terms outside the vocabulary are ignored.
    pub fn transform(&self, text: &str) -> Result<SparseVector> {
        let pairs = self
            .options
            .terms(text)?
            .iter()
            .filter_map(|term| self.vocabulary.get(term).map(|index| (*index, 1.0)))
            .collect();

        let mut vector = SparseVector::from_pairs(self.dim(), pairs);
        vector.normalize(self.options.norm);

        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn words_only() -> FeaturizerConfig {
        FeaturizerConfig::new()
            .with_char_ngram_length(0)
            .with_norm(Norm::None)
    }

    #[test]
    fn word_terms_include_bigrams() -> Result<()> {
        let options = TextOptions::from(&words_only());

        assert_eq!(
            options.terms("Slow  WebSockets")?,
            vec!["w:slow", "w:websockets", "w:slow websockets"]
        );

        Ok(())
    }

    #[test]
    fn char_terms_are_framed() -> Result<()> {
        let config = FeaturizerConfig::new()
            .with_word_ngram_length(0)
            .with_char_ngram_length(3);
        let options = TextOptions::from(&config);

        assert_eq!(
            options.terms("Ab")?,
            vec!["c:\u{2}ab".to_string(), "c:ab\u{3}".to_string()]
        );

        Ok(())
    }

    #[test]
    fn accents_are_stripped() -> Result<()> {
        let options = TextOptions::from(&words_only().with_word_ngram_length(1));

        assert_eq!(options.terms("Café")?, vec!["w:cafe"]);

        Ok(())
    }

    #[test]
    fn unknown_terms_are_ignored() -> Result<()> {
        let texts = vec!["entity framework".to_string(), "signalr hub".to_string()];
        let featurizer = TextFeaturizer::fit(&words_only().with_word_ngram_length(1), &texts)?;

        assert_eq!(featurizer.dim(), 4);

        let vector = featurizer.transform("entity entity kestrel")?;
        assert_eq!(vector.nnz(), 1);
        assert_eq!(vector.values, vec![2.0]);

        Ok(())
    }

    #[test]
    fn min_document_frequency_and_cap() -> Result<()> {
        let texts = vec![
            "a b c".to_string(),
            "a b".to_string(),
            "a".to_string(),
        ];

        let config = words_only()
            .with_word_ngram_length(1)
            .with_min_document_frequency(2);
        let frequent = TextFeaturizer::fit(&config, &texts)?;
        assert_eq!(frequent.dim(), 2);

        let config = words_only()
            .with_word_ngram_length(1)
            .with_max_terms(Some(1));
        let capped = TextFeaturizer::fit(&config, &texts)?;
        assert_eq!(capped.dim(), 1);
        assert_eq!(capped.transform("a")?.nnz(), 1);

        Ok(())
    }

    #[test]
    fn l2_vectors_have_unit_length() -> Result<()> {
        let texts = vec!["threads are failing".to_string()];
        let featurizer = TextFeaturizer::fit(&FeaturizerConfig::new(), &texts)?;

        let vector = featurizer.transform("threads are failing")?;
        let length: f32 = vector.values.iter().map(|v| v * v).sum::<f32>().sqrt();

        assert!((length - 1.0).abs() < 1e-5);

        Ok(())
    }
}
