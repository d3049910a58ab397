//! Ordered fallback: "prefer A, else B, else computed".

/// A chain of lazily evaluated candidates; the first `Some` wins.
///
/// Later steps are never run once an earlier one produced a value, which is
/// what keeps cross-day provider queries lazy.
pub struct Fallback<'a, T> {
    steps: Vec<Box<dyn FnOnce() -> Option<T> + 'a>>,
}

impl<'a, T: 'a> Fallback<'a, T> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Add a lazily computed candidate.
    pub fn then<F>(mut self, step: F) -> Self
    where
        F: FnOnce() -> Option<T> + 'a,
    {
        self.steps.push(Box::new(step));
        self
    }

    /// Add an already known candidate.
    pub fn or(self, value: Option<T>) -> Self {
        self.then(move || value)
    }

    pub fn resolve(self) -> Option<T> {
        self.steps.into_iter().find_map(|step| step())
    }
}

impl<'a, T: 'a> Default for Fallback<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_first_present_value_wins() {
        let value = Fallback::new().or(None).or(Some(2)).or(Some(3)).resolve();
        assert_eq!(value, Some(2));
    }

    #[test]
    fn test_all_absent() {
        assert_eq!(Fallback::<i32>::new().or(None).then(|| None).resolve(), None);
    }

    #[test]
    fn test_later_steps_are_not_evaluated() {
        let calls = Cell::new(0);
        let value = Fallback::new()
            .then(|| {
                calls.set(calls.get() + 1);
                Some("primary")
            })
            .then(|| {
                calls.set(calls.get() + 1);
                Some("secondary")
            })
            .resolve();

        assert_eq!(value, Some("primary"));
        assert_eq!(calls.get(), 1);
    }
}
