/// Default number of questions drawn for one random exam.
pub const DEFAULT_RANDOM_BATCH_SIZE: usize = 30;

/// Tunables for sessions and random draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSettings {
    random_batch_size: usize,
    advance_delay_ms: u64,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            random_batch_size: DEFAULT_RANDOM_BATCH_SIZE,
            advance_delay_ms: 0,
        }
    }
}

impl QuizSettings {
    /// Sets the random-exam batch size. Zero falls back to the default.
    #[must_use]
    pub fn with_random_batch_size(mut self, size: usize) -> Self {
        self.random_batch_size = if size == 0 {
            DEFAULT_RANDOM_BATCH_SIZE
        } else {
            size
        };
        self
    }

    /// Sets the delay used when advancing right after an answer in study mode.
    #[must_use]
    pub fn with_advance_delay_ms(mut self, delay_ms: u64) -> Self {
        self.advance_delay_ms = delay_ms;
        self
    }

    #[must_use]
    pub fn random_batch_size(&self) -> usize {
        self.random_batch_size
    }

    #[must_use]
    pub fn advance_delay_ms(&self) -> u64 {
        self.advance_delay_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_batch_size_falls_back_to_default() {
        let settings = QuizSettings::default().with_random_batch_size(0);
        assert_eq!(settings.random_batch_size(), DEFAULT_RANDOM_BATCH_SIZE);
    }
}
