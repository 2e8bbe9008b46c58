use futures_core::future::BoxFuture;

use crate::error::Error;
use crate::session::{MySqlResult, Session};

/// The result of running a caller's action inside a transaction wrapper.
///
/// `Atomic` carries the caller's own successful value through unchanged;
/// `Aborted` carries the reason a rollback was issued, and — when the
/// rollback itself completed — its result alongside the original cause.
#[derive(Debug)]
pub enum Outcome<V> {
    Atomic(V),
    Aborted(AbortReason),
}

#[derive(Debug)]
pub enum AbortReason {
    /// `begin` itself failed; nothing was ever rolled back.
    BeginFailed(Error),
    /// The caller's action failed (or the commit that followed it did);
    /// `rollback_result` is `Ok` with whatever the server returned for
    /// `ROLLBACK`, or the error encountered trying to issue it.
    RolledBack {
        cause: Error,
        rollback_result: Result<MySqlResult, Error>,
    },
    /// The session's receive channel was gone by the time the wrapper tried
    /// to act on it — the connection task is no longer running.
    ConnectionExited,
}

/// Wraps a caller-supplied action in `BEGIN` / `COMMIT` / `ROLLBACK`,
/// mirroring the source's catch-all exception handler: a normal return
/// commits, an `Err` return rolls back preserving the original cause, and a
/// session that disappears mid-flight (observed as `Error::SocketClosed`)
/// is reported as a dead connection rather than folded into a generic
/// server error.
///
/// There is no panic/unwind recovery here — Rust gives us no safe way to
/// catch a panic across an `.await` point, so "the caller process died" in
/// the source's design is modeled as the `action` returning `Err` like any
/// other failure; a caller that wants panic-safety should catch it with
/// `std::panic::catch_unwind` before ever constructing a non-unwind-safe
/// future.
pub async fn transaction<V, F>(session: &mut Session, action: F) -> Outcome<V>
where
    F: for<'c> FnOnce(&'c mut Session) -> BoxFuture<'c, Result<V, Error>>,
{
    if let Err(e) = session.begin().await {
        return Outcome::Aborted(AbortReason::BeginFailed(e));
    }

    match action(session).await {
        Ok(value) => match session.commit().await {
            Ok(_) => Outcome::Atomic(value),
            Err(commit_err) => {
                let rollback_result = session.rollback().await;
                Outcome::Aborted(AbortReason::RolledBack {
                    cause: commit_err,
                    rollback_result,
                })
            }
        },

        Err(action_err) => {
            if matches!(action_err, Error::SocketClosed) {
                return Outcome::Aborted(AbortReason::ConnectionExited);
            }

            let rollback_result = session.rollback().await;
            Outcome::Aborted(AbortReason::RolledBack {
                cause: action_err,
                rollback_result,
            })
        }
    }
}
