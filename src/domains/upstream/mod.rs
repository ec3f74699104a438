//! Upstream domain module.
//!
//! The upstream user API is an external collaborator: the server only needs
//! one capability from it, fetching the current set of user records. That
//! capability is the [`RecordSource`] trait; [`HttpRecordSource`] is the
//! production implementation backed by `reqwest`.

mod client;
mod error;

pub use client::{HttpRecordSource, RecordSource, USERS_PATH};
pub use error::{UpstreamError, UpstreamResult};

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory record sources for tests.

    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    use super::{RecordSource, UpstreamError, UpstreamResult};
    use crate::domains::search::UserRecord;

    /// Returns a fixed set of records.
    pub struct StaticSource(pub Vec<UserRecord>);

    #[async_trait]
    impl RecordSource for StaticSource {
        async fn fetch_records(&self) -> UpstreamResult<Vec<UserRecord>> {
            Ok(self.0.clone())
        }
    }

    /// Always fails with an HTTP status error.
    pub struct FailingSource;

    #[async_trait]
    impl RecordSource for FailingSource {
        async fn fetch_records(&self) -> UpstreamResult<Vec<UserRecord>> {
            Err(UpstreamError::Status {
                status: 503,
                body: "service unavailable".to_string(),
            })
        }
    }

    /// Sleeps before answering, to exercise timeouts.
    pub struct SlowSource(pub Duration);

    #[async_trait]
    impl RecordSource for SlowSource {
        async fn fetch_records(&self) -> UpstreamResult<Vec<UserRecord>> {
            tokio::time::sleep(self.0).await;
            Ok(Vec::new())
        }
    }

    /// Panics if called; proves a code path never reaches the upstream.
    pub struct UnreachableSource;

    #[async_trait]
    impl RecordSource for UnreachableSource {
        async fn fetch_records(&self) -> UpstreamResult<Vec<UserRecord>> {
            panic!("upstream must not be contacted")
        }
    }

    /// Never answers. `started` fires once a fetch is in flight and `dropped`
    /// is set when that fetch's future is dropped.
    #[derive(Clone, Default)]
    pub struct HangingSource {
        pub started: Arc<Notify>,
        pub dropped: Arc<AtomicBool>,
    }

    struct SetOnDrop(Arc<AtomicBool>);

    impl Drop for SetOnDrop {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl RecordSource for HangingSource {
        async fn fetch_records(&self) -> UpstreamResult<Vec<UserRecord>> {
            let _flag = SetOnDrop(self.dropped.clone());
            self.started.notify_one();
            std::future::pending().await
        }
    }
}
