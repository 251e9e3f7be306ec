use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;

/// Quiet period applied to search input before it reaches the controller.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Forwards the latest value from `input` once no newer value has arrived for
/// `delay`. A value still pending when `input` closes is flushed.
pub fn debounce<T>(mut input: mpsc::Receiver<T>, delay: Duration) -> mpsc::Receiver<T>
where
    T: Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        while let Some(mut latest) = input.recv().await {
            loop {
                tokio::select! {
                    next = input.recv() => match next {
                        Some(value) => latest = value,
                        None => {
                            let _ = tx.send(latest).await;
                            return;
                        }
                    },
                    _ = sleep(delay) => break,
                }
            }
            if tx.send(latest).await.is_err() {
                return;
            }
        }
    });
    rx
}
