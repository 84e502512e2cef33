//! Cancellable background work reporting over a channel polled each frame.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use super::state::Generation;

pub enum Poll<T> {
    Pending,
    Ready(T),
    /// The worker exited without sending, or the task was cancelled.
    Gone,
}

pub struct BackgroundTask<T> {
    rx: Receiver<T>,
    cancel: Arc<AtomicBool>,
    generation: Generation,
}

impl<T: Send + 'static> BackgroundTask<T> {
    /// Runs `work` on a worker thread. The worker gets the cancel flag and
    /// its result is not delivered once the flag is set.
    pub fn spawn<F>(generation: Generation, work: F) -> Self
    where
        F: FnOnce(&AtomicBool) -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);

        thread::spawn(move || {
            let value = work(&flag);
            if !flag.load(Ordering::Acquire) {
                let _ = tx.send(value);
            }
        });

        Self {
            rx,
            cancel,
            generation,
        }
    }
}

impl<T> BackgroundTask<T> {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    pub fn poll(&self) -> Poll<T> {
        if self.is_cancelled() {
            return Poll::Gone;
        }
        match self.rx.try_recv() {
            Ok(value) => Poll::Ready(value),
            Err(TryRecvError::Empty) => Poll::Pending,
            Err(TryRecvError::Disconnected) => Poll::Gone,
        }
    }
}

impl<T> Drop for BackgroundTask<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    fn wait<T>(task: &BackgroundTask<T>) -> Poll<T> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match task.poll() {
                Poll::Pending if Instant::now() < deadline => thread::sleep(Duration::from_millis(2)),
                other => return other,
            }
        }
    }

    #[test]
    fn delivers_result() {
        let task = BackgroundTask::spawn(Generation::from_value(3), |_| 42);
        assert!(matches!(wait(&task), Poll::Ready(42)));
        assert_eq!(task.generation(), Generation::from_value(3));
    }

    #[test]
    fn cancelled_task_never_delivers() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let task = BackgroundTask::spawn(Generation::default(), move |_| {
            let _ = release_rx.recv();
            1
        });
        task.cancel();
        let _ = release_tx.send(());
        assert!(matches!(wait(&task), Poll::Gone));
    }
}
