use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Holds at most one scheduled task. Scheduling again cancels whatever was
/// pending; a cancelled task never runs its callback.
#[derive(Debug, Default)]
pub struct TaskSlot {
    current: Option<(CancellationToken, JoinHandle<()>)>,
}

impl TaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` once after `delay` unless superseded or cancelled first.
    pub fn schedule_after<F>(&mut self, delay: Duration, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let token = CancellationToken::new();
        let guard = token.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = guard.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if !guard.is_cancelled() {
                        f();
                    }
                }
            }
        });
        self.current = Some((token, handle));
    }

    /// Runs `f` every `period` until cancelled. The first run is one period out.
    pub fn schedule_every<F>(&mut self, period: Duration, f: F)
    where
        F: Fn() + Send + 'static,
    {
        self.cancel();
        let token = CancellationToken::new();
        let guard = token.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = guard.cancelled() => break,
                    _ = ticker.tick() => {
                        if guard.is_cancelled() {
                            break;
                        }
                        f();
                    }
                }
            }
        });
        self.current = Some((token, handle));
    }

    pub fn cancel(&mut self) {
        if let Some((token, _handle)) = self.current.take() {
            token.cancel();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|(token, handle)| !token.is_cancelled() && !handle.is_finished())
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
