//! Progress reporting for mesh generation.
//!
//! Generation runs for up to a few hundred relaxation iterations; the
//! [`Progress`] callback lets callers surface that to a UI or log.
//!
//! # Example
//!
//! ```
//! use tessella::mesher::Progress;
//!
//! let progress = Progress::new(|current, total, message| {
//!     eprintln!("[{current}/{total}] {message}");
//! });
//! progress.report(3, 10, "relaxing mesh");
//! ```

/// A progress callback that receives updates during mesh generation.
///
/// The callback receives:
/// - `current`: Current step (0-based)
/// - `total`: Total number of steps
/// - `message`: Description of the current operation
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Create a new progress reporter with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// Create a no-op progress reporter that discards all updates.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}
