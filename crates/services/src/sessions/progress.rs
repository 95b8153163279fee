/// Where a session's cursor stands relative to its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

impl SessionProgress {
    /// Progress of a `total`-item session whose cursor sits at `cursor`.
    #[must_use]
    pub fn at(cursor: usize, total: usize) -> Self {
        let answered = cursor.min(total);
        Self {
            total,
            answered,
            remaining: total - answered,
            is_complete: total > 0 && answered == total,
        }
    }
}
