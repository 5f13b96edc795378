use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::utils::classes::invert_map;

/// The distinct label values observed at fit time, in order of first occurrence.
///
/// A label's key is its position in this list. Empty values count as missing and never
/// receive a key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelVocabulary {
    labels: Vec<String>,
}

impl LabelVocabulary {
    /// Learn the vocabulary from a column of label values
    pub fn fit(values: &[String]) -> Self {
        let mut labels: Vec<String> = Vec::new();

        for value in values {
            if !value.is_empty() && !labels.contains(value) {
                labels.push(value.clone());
            }
        }

        Self { labels }
    }

    /// Rebuild a vocabulary from labels already in key order
    pub fn from_labels(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// The number of labels
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when no labels were observed
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in key order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The label for a key
    pub fn label(&self, key: u32) -> Option<&str> {
        self.labels.get(key as usize).map(String::as_str)
    }

    /// A lookup from label to key
    pub fn label2id(&self) -> HashMap<&str, u32> {
        invert_map(
            self.labels
                .iter()
                .enumerate()
                .map(|(key, label)| (key as u32, label.as_str())),
        )
    }

    /// Map label values to keys; values outside the vocabulary become `None`
    pub fn encode(&self, values: &[String]) -> Vec<Option<u32>> {
        let label2id = self.label2id();

        values
            .iter()
            .map(|value| label2id.get(value.as_str()).copied())
            .collect()
    }

    /// A shared copy of the labels, as carried by key columns
    pub fn shared(&self) -> Arc<Vec<String>> {
        Arc::new(self.labels.clone())
    }
}
