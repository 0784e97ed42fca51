use futures::future::{Either, select};
use futures::pin_mut;
use std::future::Future;
use std::time::Duration;
use tracing::info;

/// How long in-flight requests get to finish before the process is forced
/// down.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    Drained,
    TimedOut,
}

/// Resolves on SIGINT, or on SIGTERM where the platform has it.
pub async fn wait_for_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use actix_web::rt::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate())?;
        let interrupt = actix_web::rt::signal::ctrl_c();
        let term = terminate.recv();
        pin_mut!(interrupt, term);

        match select(interrupt, term).await {
            Either::Left((result, _)) => {
                result?;
                info!("Received SIGINT");
            }
            Either::Right(_) => info!("Received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        actix_web::rt::signal::ctrl_c().await?;
        info!("Received Ctrl-C");
    }

    Ok(())
}

/// Races `drain` against a `grace` timer; whichever finishes first decides
/// the outcome.
pub async fn drain_within<F>(drain: F, grace: Duration) -> ShutdownOutcome
where
    F: Future<Output = ()>,
{
    let timer = actix_web::rt::time::sleep(grace);
    pin_mut!(drain, timer);

    match select(drain, timer).await {
        Either::Left(_) => ShutdownOutcome::Drained,
        Either::Right(_) => ShutdownOutcome::TimedOut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[actix_web::test]
    async fn finished_drain_wins() {
        let closed = Arc::new(AtomicBool::new(false));
        let flag = closed.clone();

        let outcome = drain_within(
            async move {
                actix_web::rt::time::sleep(Duration::from_millis(5)).await;
                flag.store(true, Ordering::SeqCst);
            },
            Duration::from_secs(5),
        )
        .await;

        assert_eq!(outcome, ShutdownOutcome::Drained);
        assert!(closed.load(Ordering::SeqCst));
    }

    #[actix_web::test]
    async fn hung_drain_times_out() {
        let outcome = drain_within(futures::future::pending(), Duration::from_millis(20)).await;
        assert_eq!(outcome, ShutdownOutcome::TimedOut);
    }

    #[test]
    fn grace_period_is_ten_seconds() {
        assert_eq!(SHUTDOWN_GRACE, Duration::from_secs(10));
    }
}
