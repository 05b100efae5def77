//! Subscription behavior tests against a scripted fetcher.
//!
//! All timer-driven cases run on the paused tokio clock, so interval ticks
//! and slow fetches are deterministic.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

use miniapps_user_client::{
    FetchError, ProfileFetcher, ProfileResponse, RequestOptions, UserProfile,
};
use miniapps_user_watch::{watch_user_profile, ProfileState, WatchOptions};

fn profile(id: &str) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        email: None,
        auth_type: "wallet".to_string(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
        wallet_address: "0xabc".to_string(),
        extra: Default::default(),
    }
}

fn response(id: &str) -> ProfileResponse {
    ProfileResponse {
        profile: profile(id),
        message: None,
    }
}

type Behavior =
    Box<dyn Fn(usize) -> (Duration, Result<ProfileResponse, FetchError>) + Send + Sync>;

/// Fetcher scripted per call index: each call gets a settle delay and an
/// outcome.
struct ScriptedFetcher {
    calls: AtomicUsize,
    behavior: Behavior,
}

impl ScriptedFetcher {
    fn new(
        behavior: impl Fn(usize) -> (Duration, Result<ProfileResponse, FetchError>)
            + Send
            + Sync
            + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            behavior: Box::new(behavior),
        })
    }

    fn immediate(outcome: Result<ProfileResponse, FetchError>) -> Arc<Self> {
        Self::new(move |_| (Duration::ZERO, outcome.clone()))
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileFetcher for ScriptedFetcher {
    async fn fetch_profile(
        &self,
        _user_id: &str,
        _options: RequestOptions,
    ) -> Result<ProfileResponse, FetchError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        let (delay, outcome) = (self.behavior)(index);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}

fn collector() -> (
    impl Fn(&ProfileState) + Send + Sync + 'static,
    mpsc::UnboundedReceiver<ProfileState>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        move |state: &ProfileState| {
            let _ = tx.send(state.clone());
        },
        rx,
    )
}

async fn next_state(rx: &mut mpsc::UnboundedReceiver<ProfileState>) -> ProfileState {
    rx.recv().await.expect("subscription still alive")
}

/// Let the paused clock run far ahead and confirm nothing else happened.
async fn assert_quiescent(rx: &mut mpsc::UnboundedReceiver<ProfileState>) {
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(rx.try_recv().is_err(), "unexpected state transition");
}

#[tokio::test(start_paused = true)]
async fn activation_commits_loading_then_success() {
    let fetcher = ScriptedFetcher::immediate(Ok(response("u1")));
    let (listener, mut states) = collector();

    let watch = watch_user_profile(
        Arc::clone(&fetcher),
        "u1",
        WatchOptions::default(),
        listener,
    );

    assert_eq!(next_state(&mut states).await, ProfileState {
        data: None,
        loading: true,
        error: None,
    });

    let settled = next_state(&mut states).await;
    assert!(!settled.loading);
    assert_eq!(settled.error, None);
    assert_eq!(settled.data.as_ref().map(|p| p.id.as_str()), Some("u1"));
    assert_eq!(fetcher.calls(), 1);

    assert_eq!(watch.state(), settled);
}

#[tokio::test(start_paused = true)]
async fn fetch_failures_become_error_state() {
    let fetcher = ScriptedFetcher::immediate(Err(FetchError::Rejected {
        message: "User not found".to_string(),
    }));
    let (listener, mut states) = collector();

    let _watch = watch_user_profile(
        Arc::clone(&fetcher),
        "u1",
        WatchOptions::default(),
        listener,
    );

    assert!(next_state(&mut states).await.loading);
    let settled = next_state(&mut states).await;
    assert_eq!(settled.data, None);
    assert_eq!(settled.error.as_deref(), Some("User not found"));
}

#[tokio::test(start_paused = true)]
async fn disabled_subscription_never_fetches() {
    let fetcher = ScriptedFetcher::immediate(Ok(response("u1")));
    let (listener, mut states) = collector();

    let watch = watch_user_profile(
        Arc::clone(&fetcher),
        "u1",
        WatchOptions {
            enabled: false,
            ..WatchOptions::default()
        },
        listener,
    );

    assert_quiescent(&mut states).await;
    assert_eq!(fetcher.calls(), 0);
    assert_eq!(watch.state(), ProfileState::default());
}

#[tokio::test(start_paused = true)]
async fn empty_user_id_never_fetches_even_manually() {
    let fetcher = ScriptedFetcher::immediate(Ok(response("u1")));
    let (listener, mut states) = collector();

    let watch = watch_user_profile(
        Arc::clone(&fetcher),
        "",
        WatchOptions::default(),
        listener,
    );

    watch.refetch();
    assert_quiescent(&mut states).await;
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn refetch_bypasses_the_enabled_gate() {
    let fetcher = ScriptedFetcher::immediate(Ok(response("u1")));
    let (listener, mut states) = collector();

    let watch = watch_user_profile(
        Arc::clone(&fetcher),
        "u1",
        WatchOptions {
            enabled: false,
            ..WatchOptions::default()
        },
        listener,
    );

    watch.refetch();
    assert!(next_state(&mut states).await.loading);
    let settled = next_state(&mut states).await;
    assert_eq!(settled.data.as_ref().map(|p| p.id.as_str()), Some("u1"));
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn disabling_mid_flight_keeps_the_settled_state() {
    let fetcher =
        ScriptedFetcher::new(|_| (Duration::from_millis(500), Ok(response("u1"))));
    let (listener, mut states) = collector();

    let watch = watch_user_profile(
        Arc::clone(&fetcher),
        "u1",
        WatchOptions::default(),
        listener,
    );

    assert!(next_state(&mut states).await.loading);
    watch.set_enabled(false);

    // The in-flight fetch still settles and commits.
    let settled = next_state(&mut states).await;
    assert_eq!(settled.data.as_ref().map(|p| p.id.as_str()), Some("u1"));
    assert_eq!(fetcher.calls(), 1);

    // No further automatic fetches while disabled.
    assert_quiescent(&mut states).await;
    assert_eq!(fetcher.calls(), 1);

    // Re-enabling triggers exactly one fetch.
    watch.set_enabled(true);
    assert!(next_state(&mut states).await.loading);
    let settled = next_state(&mut states).await;
    assert!(!settled.loading);
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn interval_refetches_once_per_tick_until_teardown() {
    let fetcher = ScriptedFetcher::immediate(Ok(response("u1")));
    let (listener, mut states) = collector();

    let watch = watch_user_profile(
        Arc::clone(&fetcher),
        "u1",
        WatchOptions {
            refetch_interval: Some(Duration::from_secs(1)),
            ..WatchOptions::default()
        },
        listener,
    );

    // Activation fetch.
    assert!(next_state(&mut states).await.loading);
    assert!(!next_state(&mut states).await.loading);
    assert_eq!(fetcher.calls(), 1);

    // One additional fetch per tick.
    for tick in 1..=3 {
        assert!(next_state(&mut states).await.loading);
        assert!(!next_state(&mut states).await.loading);
        assert_eq!(fetcher.calls(), 1 + tick);
    }

    // Teardown stops the ticks; nothing settles afterwards.
    drop(watch);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(states.try_recv().is_err());
    assert_eq!(fetcher.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn changing_the_interval_replaces_the_timer() {
    let fetcher = ScriptedFetcher::immediate(Ok(response("u1")));
    let (listener, mut states) = collector();

    let watch = watch_user_profile(
        Arc::clone(&fetcher),
        "u1",
        WatchOptions::default(),
        listener,
    );

    // Activation fetch, no timer yet.
    assert!(next_state(&mut states).await.loading);
    assert!(!next_state(&mut states).await.loading);
    assert_quiescent(&mut states).await;
    assert_eq!(fetcher.calls(), 1);

    // Arm a timer after the fact.
    watch.set_refetch_interval(Some(Duration::from_secs(1)));
    assert!(next_state(&mut states).await.loading);
    assert!(!next_state(&mut states).await.loading);
    assert_eq!(fetcher.calls(), 2);

    // Clearing it stops periodic fetches.
    watch.set_refetch_interval(None);
    assert_quiescent(&mut states).await;
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn last_settled_fetch_wins() {
    // Call 0 (activation) settles late with "stale"; call 1 (manual
    // refetch) settles immediately with "fresh". The stale settlement
    // overwrites the fresh one: settlement order is the only order.
    let fetcher = ScriptedFetcher::new(|index| {
        if index == 0 {
            (Duration::from_millis(500), Ok(response("stale")))
        } else {
            (Duration::ZERO, Ok(response("fresh")))
        }
    });
    let (listener, mut states) = collector();

    let watch = watch_user_profile(
        Arc::clone(&fetcher),
        "u1",
        WatchOptions::default(),
        listener,
    );

    assert!(next_state(&mut states).await.loading);
    watch.refetch();
    assert!(next_state(&mut states).await.loading);

    let first = next_state(&mut states).await;
    assert_eq!(first.data.as_ref().map(|p| p.id.as_str()), Some("fresh"));

    let second = next_state(&mut states).await;
    assert_eq!(second.data.as_ref().map(|p| p.id.as_str()), Some("stale"));
    assert_eq!(watch.state(), second);
}
