use std::{fs::File, path::Path};

use burn::data::dataset::{self, Dataset as _, InMemDataset};
use derive_new::new;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    pipelines::text_classification::{self, columns, Frame},
};

/// The name of the GitHub issues dataset
pub static DATASET: &str = "github-issues";

/// A GitHub issue, as read from one row of the tab-separated dataset
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Issue {
    /// The issue identifier; carried along but never featurized
    #[serde(rename = "ID", default)]
    pub id: Option<String>,

    /// The area label, absent for unlabeled issues
    #[serde(rename = "Area", default)]
    pub area: Option<String>,

    /// The issue title
    #[serde(rename = "Title")]
    pub title: String,

    /// The issue description
    #[serde(rename = "Description")]
    pub description: String,
}

impl Issue {
    /// An unlabeled issue with no identifier
    pub fn unlabeled(title: &str, description: &str) -> Self {
        Self::new(None, None, title.to_string(), description.to_string())
    }
}

impl text_classification::Item for Issue {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn area(&self) -> Option<&str> {
        self.area.as_deref()
    }
}

/// Struct for the GitHub issues dataset
pub struct IssueDataset {
    /// Underlying In-Memory dataset
    dataset: InMemDataset<Issue>,
}

/// Implement the Dataset trait for the GitHub issues dataset
impl dataset::Dataset<Issue> for IssueDataset {
    /// Returns a specific issue from the dataset
    fn get(&self, index: usize) -> Option<Issue> {
        self.dataset.get(index)
    }

    /// Returns the length of the dataset
    fn len(&self) -> usize {
        self.dataset.len()
    }
}

impl IssueDataset {
    /// Wrap issues already in memory
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        Self {
            dataset: InMemDataset::new(issues),
        }
    }

    /// Load a labeled dataset; the header must name `Area`, `Title` and `Description`
    pub fn load_labeled(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(
            path.as_ref(),
            &[columns::AREA, columns::TITLE, columns::DESCRIPTION],
        )
    }

    /// Load an unlabeled dataset; the header must name `Title` and `Description`
    pub fn load_unlabeled(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(path.as_ref(), &[columns::TITLE, columns::DESCRIPTION])
    }

    fn load(path: &Path, required: &[&str]) -> Result<Self> {
        let file = File::open(path)?;

        // Descriptions hold raw quote characters, so quoting is off
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .quoting(false)
            .has_headers(true)
            .from_reader(file);

        let headers = reader.headers()?.clone();
        for column in required {
            if !headers.iter().any(|header| header == *column) {
                return Err(Error::Schema {
                    path: path.display().to_string(),
                    column: column.to_string(),
                });
            }
        }

        let issues = reader
            .deserialize::<Issue>()
            .collect::<std::result::Result<Vec<_>, csv::Error>>()?;

        info!(
            "Loaded {} {} issues from {}",
            issues.len(),
            DATASET,
            path.display()
        );

        Ok(Self::from_issues(issues))
    }

    /// The in-memory tabular view of every issue
    pub fn to_frame(&self) -> Frame {
        let issues: Vec<Issue> = self.iter().collect();

        Frame::from_items(&issues)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use burn::data::dataset::Dataset;
    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    use super::*;

    fn write(contents: &str) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(contents.as_bytes())?;

        Ok(file)
    }

    #[test]
    fn loads_labeled_issues_with_quotes() -> Result<()> {
        let file = write(
            "ID\tArea\tTitle\tDescription\n\
             1\tarea-mvc\tRazor \"pages\" break\tThe \"asp-for\" helper fails\n\
             2\tarea-infra\tBuild is red\t\n",
        )?;

        let dataset = IssueDataset::load_labeled(file.path())?;

        assert_eq!(dataset.len(), 2);
        assert_eq!(
            dataset.get(0),
            Some(Issue::new(
                Some("1".to_string()),
                Some("area-mvc".to_string()),
                "Razor \"pages\" break".to_string(),
                "The \"asp-for\" helper fails".to_string(),
            ))
        );

        let frame = dataset.to_frame();
        assert_eq!(
            frame.text(columns::AREA)?,
            &["area-mvc".to_string(), "area-infra".to_string()]
        );
        assert_eq!(frame.text(columns::DESCRIPTION)?[1], "");

        Ok(())
    }

    #[test]
    fn labeled_header_requires_area() -> Result<()> {
        let file = write("Title\tDescription\nCrash\tIt crashes\n")?;

        assert!(matches!(
            IssueDataset::load_labeled(file.path()),
            Err(Error::Schema { column, .. }) if column == "Area"
        ));

        let dataset = IssueDataset::load_unlabeled(file.path())?;
        assert_eq!(dataset.len(), 1);
        assert!(!dataset.to_frame().contains(columns::AREA));

        Ok(())
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            IssueDataset::load_labeled("does/not/exist.tsv"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn short_row_is_a_csv_error() -> Result<()> {
        let file = write("Area\tTitle\tDescription\narea-mvc\tonly a title\n")?;

        assert!(matches!(
            IssueDataset::load_labeled(file.path()),
            Err(Error::Csv(_))
        ));

        Ok(())
    }
}
