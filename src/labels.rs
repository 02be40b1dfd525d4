//! Class label files.
//!
//! Label files hold one class name per line, index-aligned with the model
//! output vector. Exports commonly prefix each line with its index
//! ("0 safe"); that numeric token is dropped.

use std::borrow::Cow;
use std::path::Path;

use anyhow::{Context, Result};

/// Ordered class names aligned with model output positions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    /// Read and parse a label file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read label file {}", path.display()))?;
        Ok(Self::parse(&raw))
    }

    /// Like `load`, but degrades to an empty set and logs the failure.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(labels) => {
                log::info!("loaded {} labels from {}: {:?}", labels.len(), path.display(), labels.names);
                labels
            }
            Err(err) => {
                log::warn!("label load failed, falling back to class_<index> names: {:#}", err);
                Self::default()
            }
        }
    }

    /// Parse label text. Blank lines keep their slot so indices stay aligned.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
        let names = raw.lines().map(parse_line).collect();
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Label for `index`, or the synthesized `class_<index>` when out of range.
    pub fn name_for(&self, index: usize) -> Cow<'_, str> {
        match self.get(index) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("class_{}", index)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for LabelSet {
    fn from(names: Vec<String>) -> Self {
        Self { names }
    }
}

impl<'a> From<&'a [&'a str]> for LabelSet {
    fn from(names: &'a [&'a str]) -> Self {
        Self {
            names: names.iter().map(|name| name.to_string()).collect(),
        }
    }
}

fn parse_line(line: &str) -> String {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((index, rest)) if index.parse::<u64>().is_ok() => rest.trim_start().to_string(),
        _ => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn strips_leading_index_token() {
        let labels = LabelSet::parse("0 safe\n1 unsafe\n");
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get(0), Some("safe"));
        assert_eq!(labels.get(1), Some("unsafe"));
    }

    #[test]
    fn keeps_multi_word_names_and_unindexed_lines() {
        let labels = LabelSet::parse("0 big dog\nsmall cat\n2\tno entry\r\n");
        assert_eq!(labels.get(0), Some("big dog"));
        assert_eq!(labels.get(1), Some("small cat"));
        assert_eq!(labels.get(2), Some("no entry"));
    }

    #[test]
    fn bare_number_is_kept_as_name() {
        let labels = LabelSet::parse("42\n");
        assert_eq!(labels.get(0), Some("42"));
    }

    #[test]
    fn blank_lines_keep_alignment() {
        let labels = LabelSet::parse("0 a\n\n2 c\n");
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(1), Some(""));
        assert_eq!(labels.get(2), Some("c"));
    }

    #[test]
    fn name_for_synthesizes_out_of_range() {
        let labels = LabelSet::from(&["safe"][..]);
        assert_eq!(labels.name_for(0), "safe");
        assert_eq!(labels.name_for(1), "class_1");
    }

    #[test]
    fn load_reads_file_and_strips_bom() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all("\u{feff}0 safe\n1 unsafe\n".as_bytes())?;

        let labels = LabelSet::load(file.path())?;
        assert_eq!(labels.iter().collect::<Vec<_>>(), vec!["safe", "unsafe"]);
        Ok(())
    }

    #[test]
    fn missing_file_degrades_to_empty() {
        assert!(LabelSet::load("/nonexistent/labels.txt").is_err());
        assert!(LabelSet::load_or_empty("/nonexistent/labels.txt").is_empty());
    }
}
