use std::{
    collections::BTreeMap,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{columns, Item, SparseVector};

/// The kind of values a column holds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Raw text
    Text,
    /// Integer keys into a label vocabulary
    Key,
    /// Sparse numeric vectors
    Vector,
    /// Dense per-class probabilities
    Scores,
}

/// A single named column of a [Frame]
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    /// Raw text values
    Text(Vec<String>),

    /// Label keys. `None` marks a value outside the vocabulary.
    Key {
        /// One key per row
        keys: Vec<Option<u32>>,
        /// The labels the keys index into
        vocabulary: Arc<Vec<String>>,
    },

    /// Feature vectors
    Vector(Vec<SparseVector>),

    /// Per-class probabilities, in vocabulary order
    Scores(Vec<Vec<f32>>),
}

impl Column {
    /// The kind of this column
    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Text(_) => ColumnKind::Text,
            Column::Key { .. } => ColumnKind::Key,
            Column::Vector(_) => ColumnKind::Vector,
            Column::Scores(_) => ColumnKind::Scores,
        }
    }

    /// The number of rows
    pub fn len(&self) -> usize {
        match self {
            Column::Text(values) => values.len(),
            Column::Key { keys, .. } => keys.len(),
            Column::Vector(values) => values.len(),
            Column::Scores(values) => values.len(),
        }
    }

    /// True when the column has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An in-memory tabular view: named columns of equal length, in insertion order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    rows: usize,
    columns: Vec<(String, Column)>,
}

impl Frame {
    /// An empty frame expecting `rows` rows per column
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            columns: Vec::new(),
        }
    }

    /// Build a frame with `Title`, `Description` and, when any item is labeled, `Area`
    pub fn from_items<I: Item>(items: &[I]) -> Self {
        let mut frame = Self::new(items.len());

        let titles = items.iter().map(|item| item.title().to_string()).collect();
        let descriptions = items
            .iter()
            .map(|item| item.description().to_string())
            .collect();

        frame.columns.push((columns::TITLE.to_string(), Column::Text(titles)));
        frame.columns.push((
            columns::DESCRIPTION.to_string(),
            Column::Text(descriptions),
        ));

        if items.iter().any(|item| item.area().is_some()) {
            let areas = items
                .iter()
                .map(|item| item.area().unwrap_or_default().to_string())
                .collect();

            frame.columns.push((columns::AREA.to_string(), Column::Text(areas)));
        }

        frame
    }

    /// A single-row frame with one text column per field of the row
    pub fn from_row(row: &Row) -> Self {
        let mut frame = Self::new(1);

        for (name, value) in row.iter() {
            frame
                .columns
                .push((name.clone(), Column::Text(vec![value.clone()])));
        }

        frame
    }

    /// The number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Column names in insertion order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// True when a column with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    /// Add a column, replacing any existing column of the same name in place
    pub fn insert(&mut self, name: &str, column: Column) -> Result<()> {
        if column.len() != self.rows {
            return Err(Error::RowCount {
                column: name.to_string(),
                expected: self.rows,
                found: column.len(),
            });
        }

        match self.columns.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = column,
            None => self.columns.push((name.to_string(), column)),
        }

        Ok(())
    }

    /// Remove and return a column
    pub fn remove(&mut self, name: &str) -> Option<Column> {
        let position = self.columns.iter().position(|(n, _)| n == name)?;

        Some(self.columns.remove(position).1)
    }

    /// Keep only the columns `keep` accepts
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.columns.retain(|(name, _)| keep(name));
    }

    /// Look up a column
    pub fn get(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, column)| column)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Look up a text column
    pub fn text(&self, name: &str) -> Result<&[String]> {
        match self.get(name)? {
            Column::Text(values) => Ok(values),
            other => Err(kind_error(name, ColumnKind::Text, other)),
        }
    }

    /// Look up a key column along with its vocabulary
    pub fn keys(&self, name: &str) -> Result<(&[Option<u32>], &Arc<Vec<String>>)> {
        match self.get(name)? {
            Column::Key { keys, vocabulary } => Ok((keys, vocabulary)),
            other => Err(kind_error(name, ColumnKind::Key, other)),
        }
    }

    /// Look up a vector column
    pub fn vectors(&self, name: &str) -> Result<&[SparseVector]> {
        match self.get(name)? {
            Column::Vector(values) => Ok(values),
            other => Err(kind_error(name, ColumnKind::Vector, other)),
        }
    }

    /// Look up a score column
    pub fn scores(&self, name: &str) -> Result<&[Vec<f32>]> {
        match self.get(name)? {
            Column::Scores(values) => Ok(values),
            other => Err(kind_error(name, ColumnKind::Scores, other)),
        }
    }

    /// Describe the columns of this frame
    pub fn schema(&self) -> Schema {
        Schema(
            self.columns
                .iter()
                .map(|(name, column)| SchemaColumn::new(name, column.kind()))
                .collect(),
        )
    }
}

fn kind_error(name: &str, expected: ColumnKind, found: &Column) -> Error {
    Error::ColumnKind {
        column: name.to_string(),
        expected,
        found: found.kind(),
    }
}

/// A named, typed column description
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaColumn {
    /// Column name
    pub name: String,

    /// Column kind
    pub kind: ColumnKind,
}

impl SchemaColumn {
    /// Create a column description
    pub fn new(name: &str, kind: ColumnKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }
}

/// The ordered columns a frame holds, or a fitted pipeline expects
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema(pub Vec<SchemaColumn>);

impl Schema {
    /// Find a column by name
    pub fn column(&self, name: &str) -> Option<&SchemaColumn> {
        self.0.iter().find(|column| column.name == name)
    }

    /// True when a column of this name is described
    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Column names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|column| column.name.as_str())
    }
}

/// A single ad-hoc record: column name to text value
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row(BTreeMap<String, String>);

impl Row {
    /// An empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, builder style
    pub fn with(mut self, column: &str, value: impl Into<String>) -> Self {
        self.0.insert(column.to_string(), value.into());
        self
    }
}

impl<I: Item> From<&I> for Row {
    fn from(item: &I) -> Self {
        let row = Row::new()
            .with(columns::TITLE, item.title())
            .with(columns::DESCRIPTION, item.description());

        match item.area() {
            Some(area) => row.with(columns::AREA, area),
            None => row,
        }
    }
}

impl Deref for Row {
    type Target = BTreeMap<String, String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Row {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn insert_replaces_in_place() -> Result<()> {
        let mut frame = Frame::new(2);
        frame.insert("a", Column::Text(vec!["x".into(), "y".into()]))?;
        frame.insert("b", Column::Scores(vec![vec![1.0], vec![0.5]]))?;
        frame.insert("a", Column::Text(vec!["z".into(), "w".into()]))?;

        assert_eq!(frame.column_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(frame.text("a")?, &["z".to_string(), "w".to_string()]);

        Ok(())
    }

    #[test]
    fn insert_rejects_wrong_length() {
        let mut frame = Frame::new(2);
        let result = frame.insert("a", Column::Text(vec!["x".into()]));

        assert!(matches!(result, Err(Error::RowCount { found: 1, .. })));
    }

    #[test]
    fn typed_lookup_reports_kind() {
        let mut frame = Frame::new(1);
        frame
            .insert("a", Column::Text(vec!["x".into()]))
            .expect("insert");

        assert!(matches!(
            frame.vectors("a"),
            Err(Error::ColumnKind {
                expected: ColumnKind::Vector,
                found: ColumnKind::Text,
                ..
            })
        ));
        assert!(matches!(frame.text("b"), Err(Error::MissingColumn(_))));
    }

    #[test]
    fn row_becomes_single_row_frame() -> Result<()> {
        let row = Row::new().with("Title", "t").with("Description", "d");
        let frame = Frame::from_row(&row);

        assert_eq!(frame.rows(), 1);
        assert_eq!(frame.text("Title")?, &["t".to_string()]);
        assert_eq!(
            frame.schema(),
            Schema(vec![
                SchemaColumn::new("Description", ColumnKind::Text),
                SchemaColumn::new("Title", ColumnKind::Text),
            ])
        );

        Ok(())
    }
}
