//! Batch completion counter.

/// Completed-item count paired with the fixed batch total.
///
/// Owned by the collecting loop of a single batch call; nothing else writes it.
#[derive(Debug)]
pub(super) struct ProgressCounter {
    completed: usize,
    total: usize,
}

impl ProgressCounter {
    pub(super) fn new(total: usize) -> Self {
        Self {
            completed: 0,
            total,
        }
    }

    /// Record one completion and return the new completed count.
    pub(super) fn advance(&mut self) -> usize {
        debug_assert!(self.completed < self.total, "more completions than items");
        self.completed += 1;
        self.completed
    }

    pub(super) fn completed(&self) -> usize {
        self.completed
    }

    pub(super) fn total(&self) -> usize {
        self.total
    }

    pub(super) fn percent(&self) -> f32 {
        if self.total == 0 {
            100.0
        } else {
            (self.completed as f32 / self.total as f32) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_counts_up_to_total() {
        let mut counter = ProgressCounter::new(3);
        assert_eq!(counter.completed(), 0);
        assert_eq!(counter.advance(), 1);
        assert_eq!(counter.advance(), 2);
        assert_eq!(counter.advance(), 3);
        assert_eq!(counter.total(), 3);
        assert_eq!(counter.percent(), 100.0);
    }

    #[test]
    fn percent_of_partial_batch() {
        let mut counter = ProgressCounter::new(4);
        counter.advance();
        assert_eq!(counter.percent(), 25.0);
    }
}
