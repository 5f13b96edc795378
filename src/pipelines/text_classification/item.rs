use std::fmt::Debug;

/// A trait for items that can be used for issue classification
pub trait Item: Send + Sync + Clone + Debug {
    /// Returns the issue title
    fn title(&self) -> &str;

    /// Returns the issue description
    fn description(&self) -> &str;

    /// Returns the area label, if the item is labeled
    fn area(&self) -> Option<&str>;
}
