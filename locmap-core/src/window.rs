//! Fixed-capacity running window over a scalar stream.

use std::collections::VecDeque;

use crate::error::{Error, Result};

/// A FIFO buffer of at most `size` scalars exposing a running average.
///
/// Callers use this to smooth a moving signal across a stream, e.g. the
/// per-image threshold chosen by the adaptive thresholder.
#[derive(Debug, Clone)]
pub struct RunningWindow {
    buf: VecDeque<f64>,
    size: usize,
}

impl RunningWindow {
    /// Creates a window holding at most `size` elements.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(size),
            size,
        }
    }

    /// Appends `value`, evicting the oldest element first when full.
    pub fn put(&mut self, value: f64) {
        if self.buf.len() >= self.size {
            self.buf.pop_front();
        }
        self.buf.push_back(value);
    }

    /// Removes and returns the oldest element.
    ///
    /// # Errors
    /// Returns [`Error::InsufficientData`] when the window is empty.
    pub fn pop(&mut self) -> Result<f64> {
        self.buf.pop_front().ok_or(Error::InsufficientData {
            operation: "pop",
            required: 1,
            have: 0,
        })
    }

    /// Arithmetic mean of the currently held elements.
    ///
    /// # Errors
    /// Returns [`Error::InsufficientData`] when the window is empty.
    pub fn avg(&self) -> Result<f64> {
        if self.buf.is_empty() {
            return Err(Error::InsufficientData {
                operation: "avg",
                required: 1,
                have: 0,
            });
        }
        Ok(self.buf.iter().sum::<f64>() / self.buf.len() as f64)
    }

    /// Number of elements currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no elements are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Iterates over the held elements, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.buf.iter()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_fifo_eviction_and_average() {
        let mut window = RunningWindow::new(3);
        window.put(1.0);
        window.put(2.0);
        window.put(3.0);
        window.put(4.0);

        let held: Vec<f64> = window.iter().copied().collect();
        assert_eq!(held, vec![2.0, 3.0, 4.0]);
        assert_eq!(window.avg().unwrap(), 3.0);
    }

    #[test]
    fn test_pop_removes_oldest() {
        let mut window = RunningWindow::new(4);
        window.put(10.0);
        window.put(20.0);
        assert_eq!(window.pop().unwrap(), 10.0);
        assert_eq!(window.len(), 1);
        assert_eq!(window.avg().unwrap(), 20.0);
    }

    #[test]
    fn test_empty_window_errors() {
        let mut window = RunningWindow::new(2);
        assert!(window.avg().is_err());
        assert!(window.pop().is_err());
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut window = RunningWindow::new(2);
        for i in 0..10 {
            window.put(f64::from(i));
            assert!(window.len() <= 2);
        }
    }
}
