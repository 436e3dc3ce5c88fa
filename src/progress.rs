use crate::error::QuantizeError;

/// Receives completion fractions in `0.0..=1.0`.
///
/// Returning `false` stops the running operation, which then fails with
/// [`QuantizeError::Cancelled`].
pub trait Progress {
    fn report(&mut self, complete: f64) -> bool;
}

impl<F> Progress for F
where
    F: FnMut(f64) -> bool,
{
    fn report(&mut self, complete: f64) -> bool {
        self(complete)
    }
}

/// Progress sink that ignores all reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&mut self, _complete: f64) -> bool {
        true
    }
}

/// Report `done / total` and turn a refusal into [`QuantizeError::Cancelled`].
pub(crate) fn step(
    progress: &mut dyn Progress,
    done: usize,
    total: usize,
) -> Result<(), QuantizeError> {
    let complete = if total == 0 {
        1.0
    } else {
        done as f64 / total as f64
    };
    if progress.report(complete) {
        Ok(())
    } else {
        log::debug!("cancelled at {:.1}%", complete * 100.0);
        Err(QuantizeError::Cancelled)
    }
}
