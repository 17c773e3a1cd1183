//! Parse `snapraid diff` output into per-category change counts.

/// Change counts from one diff run.
///
/// Every category is an explicit field so an absent category is zero, never
/// a missing key; the aggregate [`total`](DiffCounts::total) is always
/// defined.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiffCounts {
    pub added: u64,
    pub removed: u64,
    pub moved: u64,
    pub updated: u64,
}

impl DiffCounts {
    /// Total number of detected changes across all categories.
    pub fn total(&self) -> u64 {
        self.added + self.removed + self.moved + self.updated
    }
}

/// Count diff lines by their first whitespace-delimited token.
///
/// Lines outside the fixed category set (summary lines, blank lines) do not
/// contribute to any count.
pub fn analyze<S: AsRef<str>>(lines: &[S]) -> DiffCounts {
    let mut counts = DiffCounts::default();
    for line in lines {
        match line.as_ref().split_whitespace().next() {
            Some("add") => counts.added += 1,
            Some("remove") => counts.removed += 1,
            Some("move") => counts.moved += 1,
            Some("update") => counts.updated += 1,
            _ => {}
        }
    }
    counts
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
