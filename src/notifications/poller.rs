//! Per-session unread-count refresh.
//!
//! Each logged-in session owns one [`UnreadPoller`]: a task that re-reads the
//! user's unread notification count on a fixed interval and publishes it on a
//! `watch` channel. Logging out stops the task; a task whose session vanished
//! without logout stops itself after a maximum lifetime.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::errors::AppError;
use crate::models::notification;

/// Upper bound on how long a poller runs without being stopped.
pub const DEFAULT_MAX_LIFETIME: Duration = Duration::from_secs(12 * 60 * 60);

/// Where a poller reads unread counts from.
pub trait UnreadSource: 'static {
    fn unread_count(&self, user_id: i64) -> impl Future<Output = Result<i64, AppError>>;
}

impl UnreadSource for PgPool {
    fn unread_count(&self, user_id: i64) -> impl Future<Output = Result<i64, AppError>> {
        notification::count_unread(self, user_id)
    }
}

pub struct UnreadPoller {
    count: watch::Receiver<Option<i64>>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl UnreadPoller {
    /// Start polling. The first read happens immediately.
    pub fn spawn<S: UnreadSource>(source: S, user_id: i64, every: Duration, max_lifetime: Duration) -> Self {
        let (count_tx, count_rx) = watch::channel(None);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = actix_web::rt::spawn(async move {
            let mut interval = tokio::time::interval(every);
            let deadline = tokio::time::sleep(max_lifetime);
            tokio::pin!(deadline);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = &mut deadline => {
                        log::debug!("Unread poller for user {user_id} reached its maximum lifetime");
                        break;
                    }
                    _ = interval.tick() => {
                        match source.unread_count(user_id).await {
                            Ok(n) => {
                                if count_tx.send(Some(n)).is_err() {
                                    break;
                                }
                            }
                            Err(e) => log::warn!("Unread count refresh failed for user {user_id}: {e}"),
                        }
                    }
                }
            }
        });

        UnreadPoller { count: count_rx, shutdown: Some(shutdown_tx), handle: Some(handle) }
    }

    /// Most recent count, or `None` before the first successful read.
    pub fn latest(&self) -> Option<i64> {
        *self.count.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map(|h| h.is_finished()).unwrap_or(true)
    }

    /// Signal the task and wait for it to exit.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for UnreadPoller {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Live pollers keyed by session id. Shared across workers through `web::Data`.
#[derive(Clone)]
pub struct SessionPollers {
    pollers: Arc<Mutex<HashMap<String, UnreadPoller>>>,
    every: Duration,
    max_lifetime: Duration,
}

impl SessionPollers {
    pub fn new(every: Duration, max_lifetime: Duration) -> Self {
        Self {
            pollers: Arc::new(Mutex::new(HashMap::new())),
            every,
            max_lifetime,
        }
    }

    /// Start a poller for a session, replacing (and stopping) any previous one.
    pub fn start<S: UnreadSource>(&self, sid: &str, source: S, user_id: i64) {
        let poller = UnreadPoller::spawn(source, user_id, self.every, self.max_lifetime);
        let mut map = self.pollers.lock().unwrap_or_else(|e| e.into_inner());
        map.retain(|_, p| !p.is_finished());
        map.insert(sid.to_string(), poller);
    }

    /// Stop the session's poller. Returns false when none was running.
    pub async fn stop(&self, sid: &str) -> bool {
        let poller = {
            let mut map = self.pollers.lock().unwrap_or_else(|e| e.into_inner());
            map.remove(sid)
        };
        match poller {
            Some(p) => {
                p.stop().await;
                true
            }
            None => false,
        }
    }

    /// Cached unread count for a session with a live poller.
    pub fn unread(&self, sid: &str) -> Option<i64> {
        let mut map = self.pollers.lock().unwrap_or_else(|e| e.into_inner());
        map.retain(|_, p| !p.is_finished());
        map.get(sid).and_then(|p| p.latest())
    }

    pub fn is_running(&self, sid: &str) -> bool {
        let map = self.pollers.lock().unwrap_or_else(|e| e.into_inner());
        map.get(sid).map(|p| !p.is_finished()).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        let mut map = self.pollers.lock().unwrap_or_else(|e| e.into_inner());
        map.retain(|_, p| !p.is_finished());
        map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Counts reads and reports the number of reads so far as the unread count.
    #[derive(Clone, Default)]
    struct CountingSource {
        reads: Rc<Cell<i64>>,
    }

    impl UnreadSource for CountingSource {
        fn unread_count(&self, _user_id: i64) -> impl Future<Output = Result<i64, AppError>> {
            let reads = self.reads.clone();
            async move {
                reads.set(reads.get() + 1);
                Ok(reads.get())
            }
        }
    }

    async fn wait_for<F: Fn() -> bool>(cond: F) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[actix_rt::test]
    async fn publishes_counts_until_stopped() {
        let source = CountingSource::default();
        let poller = UnreadPoller::spawn(source.clone(), 1, Duration::from_millis(10), DEFAULT_MAX_LIFETIME);

        wait_for(|| poller.latest().unwrap_or(0) >= 2).await;
        poller.stop().await;

        let reads_at_stop = source.reads.get();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.reads.get(), reads_at_stop);
    }

    #[actix_rt::test]
    async fn stops_itself_after_max_lifetime() {
        let source = CountingSource::default();
        let poller = UnreadPoller::spawn(source, 1, Duration::from_millis(5), Duration::from_millis(30));
        wait_for(|| poller.is_finished()).await;
        assert!(poller.latest().is_some());
    }

    #[actix_rt::test]
    async fn session_registry_start_and_stop() {
        let pollers = SessionPollers::new(Duration::from_millis(10), DEFAULT_MAX_LIFETIME);
        let source = CountingSource::default();

        pollers.start("sid-a", source.clone(), 1);
        assert!(pollers.is_running("sid-a"));
        wait_for(|| pollers.unread("sid-a").is_some()).await;

        assert!(pollers.stop("sid-a").await);
        assert!(!pollers.is_running("sid-a"));
        assert_eq!(pollers.unread("sid-a"), None);
        assert!(!pollers.stop("sid-a").await);
        assert!(pollers.is_empty());
    }

    #[actix_rt::test]
    async fn restarting_a_session_replaces_its_poller() {
        let pollers = SessionPollers::new(Duration::from_millis(10), DEFAULT_MAX_LIFETIME);
        let first = CountingSource::default();
        let second = CountingSource::default();

        pollers.start("sid", first.clone(), 1);
        wait_for(|| first.reads.get() >= 1).await;
        pollers.start("sid", second.clone(), 1);
        assert_eq!(pollers.len(), 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let first_reads = first.reads.get();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(first.reads.get(), first_reads);
        assert!(second.reads.get() >= 1);

        pollers.stop("sid").await;
    }
}
