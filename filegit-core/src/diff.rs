use similar::{ChangeTag, TextDiff};

/// Default number of context lines around each hunk.
pub const DEFAULT_CONTEXT: usize = 3;

/// Outcome of diffing a timeline entry against its predecessor.
#[derive(Debug, Clone)]
pub enum EntryDiff {
    /// The entry is the oldest version; there is nothing to compare with.
    FirstVersion,
    /// One side is not valid UTF-8.
    Binary,
    Text(FileDiff),
}

#[derive(Debug, Clone)]
pub struct FileDiff {
    pub path: String,
    pub old_content: String,
    pub new_content: String,
    pub diff_lines: Vec<DiffLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub line_type: DiffLineType,
    pub content: String,
    pub old_line_number: Option<usize>,
    pub new_line_number: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLineType {
    Context,
    Addition,
    Deletion,
}

impl EntryDiff {
    pub fn between(path: &str, old: Option<&[u8]>, new: &[u8]) -> Self {
        let Some(old) = old else {
            return EntryDiff::FirstVersion;
        };

        match (std::str::from_utf8(old), std::str::from_utf8(new)) {
            (Ok(old), Ok(new)) => EntryDiff::Text(FileDiff::new(path, old, new)),
            _ => EntryDiff::Binary,
        }
    }
}

impl FileDiff {
    pub fn new(path: &str, old_text: &str, new_text: &str) -> Self {
        FileDiff {
            path: path.to_string(),
            old_content: old_text.to_string(),
            new_content: new_text.to_string(),
            diff_lines: Self::compute_diff(old_text, new_text),
        }
    }

    fn compute_diff(old_text: &str, new_text: &str) -> Vec<DiffLine> {
        let diff = TextDiff::from_lines(old_text, new_text);
        let mut lines = Vec::new();
        let mut old_line_num = 1;
        let mut new_line_num = 1;

        for change in diff.iter_all_changes() {
            let (line_type, old_num, new_num) = match change.tag() {
                ChangeTag::Delete => {
                    let num = old_line_num;
                    old_line_num += 1;
                    (DiffLineType::Deletion, Some(num), None)
                }
                ChangeTag::Insert => {
                    let num = new_line_num;
                    new_line_num += 1;
                    (DiffLineType::Addition, None, Some(num))
                }
                ChangeTag::Equal => {
                    let old_num = old_line_num;
                    let new_num = new_line_num;
                    old_line_num += 1;
                    new_line_num += 1;
                    (DiffLineType::Context, Some(old_num), Some(new_num))
                }
            };

            lines.push(DiffLine {
                line_type,
                content: change.to_string(),
                old_line_number: old_num,
                new_line_number: new_num,
            });
        }

        lines
    }

    pub fn is_empty(&self) -> bool {
        self.diff_lines
            .iter()
            .all(|l| l.line_type == DiffLineType::Context)
    }

    /// `(additions, deletions)`.
    pub fn stats(&self) -> (usize, usize) {
        self.diff_lines
            .iter()
            .fold((0, 0), |(add, del), line| match line.line_type {
                DiffLineType::Addition => (add + 1, del),
                DiffLineType::Deletion => (add, del + 1),
                DiffLineType::Context => (add, del),
            })
    }

    pub fn format_unified(&self, context_lines: usize) -> String {
        let old_header = format!("a/{}", self.path.trim_start_matches('/'));
        let new_header = format!("b/{}", self.path.trim_start_matches('/'));

        TextDiff::from_lines(&self.old_content, &self.new_content)
            .unified_diff()
            .context_radius(context_lines)
            .header(&old_header, &new_header)
            .to_string()
    }
}
