use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Delay-and-coalesce for bursty input.
///
/// At most one invocation is pending at any time. Rescheduling before the
/// delay elapses suppresses the earlier call; dropping the debouncer cancels
/// whatever is still pending.
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Option<CancellationToken>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` once `delay` has passed without another call to `schedule`.
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, f: F, delay: Duration)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        let token = CancellationToken::new();
        let task_token = token.clone();
        self.pending = Some(token);

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = task_token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if !task_token.is_cancelled() {
                        task_token.cancel();
                        f();
                    }
                }
            }
        });
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|t| !t.is_cancelled())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
