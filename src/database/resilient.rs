//! Retry discipline for storage access.
//!
//! Every storage call made by the services goes through [`Storage::run`]. Lock
//! contention and a schema that is not materialized yet are waited out with a
//! fixed delay; anything else is returned to the caller immediately.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use sea_orm::{DatabaseConnection, DbErr};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(100))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFault {
    /// Busy/locked database, deadlock, serialization failure or timeout.
    Contention,
    /// The table behind the query does not exist yet.
    SchemaNotReady,
    Other,
}

impl StorageFault {
    pub fn classify(err: &DbErr) -> Self {
        let msg = err.to_string().to_ascii_lowercase();

        if msg.contains("no such table")
            || (msg.contains("relation") && msg.contains("does not exist"))
        {
            return StorageFault::SchemaNotReady;
        }

        const CONTENTION: [&str; 8] = [
            "database is locked",
            "database table is locked",
            "sqlite_busy",
            "could not obtain lock",
            "deadlock detected",
            "could not serialize access",
            "timed out",
            "timeout",
        ];
        if CONTENTION.iter().any(|sig| msg.contains(sig)) {
            return StorageFault::Contention;
        }

        StorageFault::Other
    }

    pub fn is_transient(self) -> bool {
        !matches!(self, StorageFault::Other)
    }
}

impl fmt::Display for StorageFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageFault::Contention => write!(f, "contention"),
            StorageFault::SchemaNotReady => write!(f, "schema not ready"),
            StorageFault::Other => write!(f, "unexpected"),
        }
    }
}

/// Runs `op` until it succeeds, fails with a non-transient error, or the
/// policy's attempts are used up. The last error is carried unchanged.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let fault = StorageFault::classify(&err);
        if !fault.is_transient() {
            return Err(AppError::DatabaseError(err));
        }
        if attempt >= attempts {
            log::error!("{label}: giving up after {attempts} attempts ({fault}): {err}");
            return Err(AppError::TransientStorage {
                attempts,
                source: err,
            });
        }

        log::warn!(
            "{label}: {fault} on attempt {attempt}/{attempts}, retrying in {:?}: {err}",
            policy.delay
        );
        tokio::time::sleep(policy.delay).await;
        attempt += 1;
    }
}

/// Connection handle paired with the retry policy every call runs under.
#[derive(Clone)]
pub struct Storage {
    conn: DatabaseConnection,
    policy: RetryPolicy,
}

impl Storage {
    pub fn new(conn: DatabaseConnection, policy: RetryPolicy) -> Self {
        Self { conn, policy }
    }

    /// `op` is called once per attempt and must build a fresh query each time.
    pub async fn run<'a, T, F, Fut>(&'a self, label: &str, mut op: F) -> AppResult<T>
    where
        F: FnMut(&'a DatabaseConnection) -> Fut,
        Fut: Future<Output = Result<T, DbErr>> + 'a,
    {
        let conn = &self.conn;
        with_retry(&self.policy, label, || op(conn)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::from_millis(1))
    }

    #[test]
    fn test_classify_contention() {
        for msg in [
            "Execution Error: error returned from database: (code: 5) database is locked",
            "Query Error: SQLITE_BUSY",
            "error returned from database: deadlock detected",
            "Failed to acquire connection from pool: Connection pool timed out",
        ] {
            assert_eq!(
                StorageFault::classify(&DbErr::Custom(msg.into())),
                StorageFault::Contention,
                "{msg}"
            );
        }
    }

    #[test]
    fn test_classify_schema_not_ready() {
        let sqlite = DbErr::Custom("error returned from database: no such table: fees".into());
        let postgres =
            DbErr::Custom("error returned from database: relation \"fees\" does not exist".into());
        assert_eq!(StorageFault::classify(&sqlite), StorageFault::SchemaNotReady);
        assert_eq!(
            StorageFault::classify(&postgres),
            StorageFault::SchemaNotReady
        );
    }

    #[test]
    fn test_classify_other() {
        let err = DbErr::Custom("UNIQUE constraint failed: plans.name".into());
        assert_eq!(StorageFault::classify(&err), StorageFault::Other);
        assert!(!StorageFault::Other.is_transient());
    }

    #[test]
    fn test_policy_never_zero_attempts() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).attempts, 1);
        assert_eq!(RetryPolicy::default().attempts, 5);
        assert_eq!(RetryPolicy::default().delay, Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_success_returns_immediately() {
        let calls = Cell::new(0);
        let result = with_retry(&fast_policy(5), "test", || {
            calls.set(calls.get() + 1);
            async { Ok::<_, DbErr>(42) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_retries_contention_then_succeeds() {
        let calls = Cell::new(0);
        let result = with_retry(&fast_policy(5), "test", || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 3 {
                    Err(DbErr::Custom("database is locked".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_retries_missing_table() {
        let calls = Cell::new(0);
        let result = with_retry(&fast_policy(5), "test", || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n == 1 {
                    Err(DbErr::Custom("no such table: fees".into()))
                } else {
                    Ok(())
                }
            }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_attempts() {
        let calls = Cell::new(0);
        let result: AppResult<()> = with_retry(&fast_policy(4), "test", || {
            calls.set(calls.get() + 1);
            async { Err(DbErr::Custom("database is locked".into())) }
        })
        .await;
        assert_eq!(calls.get(), 4);
        match result {
            Err(AppError::TransientStorage { attempts, source }) => {
                assert_eq!(attempts, 4);
                assert!(source.to_string().contains("database is locked"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_other_errors_propagate_without_retry() {
        let calls = Cell::new(0);
        let result: AppResult<()> = with_retry(&fast_policy(5), "test", || {
            calls.set(calls.get() + 1);
            async { Err(DbErr::Custom("UNIQUE constraint failed: plans.name".into())) }
        })
        .await;
        assert_eq!(calls.get(), 1);
        assert!(matches!(result, Err(AppError::DatabaseError(_))));
    }
}
