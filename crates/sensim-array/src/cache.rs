//! Lazily computed values.

/// A value that is either not yet computed or computed and current.
///
/// Starts uninitialised. [`invalidate`](Self::invalidate) returns it to
/// that state; the next [`get_or_try_compute`](Self::get_or_try_compute)
/// recomputes. A failed computation leaves the cache uninitialised.
#[derive(Clone, Debug, PartialEq)]
pub struct Cached<T> {
    value: Option<T>,
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T> Cached<T> {
    /// An uninitialised cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The computed value, if any.
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Whether a value is held.
    pub fn is_computed(&self) -> bool {
        self.value.is_some()
    }

    /// Store `value`, replacing any previous one.
    pub fn set(&mut self, value: T) -> &T {
        self.value.insert(value)
    }

    /// Drop the held value.
    pub fn invalidate(&mut self) {
        self.value = None;
    }

    /// Return the held value, computing it first if needed.
    pub fn get_or_try_compute<E>(
        &mut self,
        compute: impl FnOnce() -> Result<T, E>,
    ) -> Result<&T, E> {
        let value = match self.value.take() {
            Some(value) => value,
            None => compute()?,
        };
        Ok(self.value.insert(value))
    }
}
