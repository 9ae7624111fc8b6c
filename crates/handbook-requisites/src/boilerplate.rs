//! Allow-list of boilerplate inherent-requirement statements.
//!
//! Most requirement pages repeat the same core-participation paragraphs. The
//! section parser drops any inherent-requirements line found in this list so
//! only subject-specific text remains.

use std::collections::HashSet;
use std::path::Path;

use crate::text::normalize_ws;
use crate::types::RequisiteResult;

/// Read-only set of boilerplate lines, compared after whitespace normalisation.
#[derive(Debug, Clone, Default)]
pub struct InherentBoilerplate {
    lines: HashSet<String>,
}

impl InherentBoilerplate {
    /// An empty list; nothing is filtered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from individual statements. Blank entries are ignored.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines = lines
            .into_iter()
            .map(|l| normalize_ws(l.as_ref()))
            .filter(|l| !l.is_empty())
            .collect();
        Self { lines }
    }

    /// Load a newline-separated list from disk.
    pub fn load(path: &Path) -> RequisiteResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_lines(content.lines()))
    }

    pub fn contains(&self, line: &str) -> bool {
        self.lines.contains(&normalize_ws(line))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_lines_normalizes() {
        let list = InherentBoilerplate::from_lines(["  The University   is committed ", "", "  "]);
        assert_eq!(list.len(), 1);
        assert!(list.contains("The University is committed"));
        assert!(list.contains("The  University is committed\n"));
        assert!(!list.contains("Something else"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Students must be able to attend lectures.").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "Students must be able to participate in group work.").unwrap();

        let list = InherentBoilerplate::load(file.path()).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.contains("Students must be able to attend lectures."));
    }

    #[test]
    fn test_load_missing_file() {
        let result = InherentBoilerplate::load(Path::new("/nonexistent/inherent.txt"));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty() {
        assert!(InherentBoilerplate::empty().is_empty());
    }
}
