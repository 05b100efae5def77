//! Reactive subscription over the profile fetcher.
//!
//! Each subscription runs as a spawned task that owns its state. Commands,
//! interval ticks, and fetch settlements all drain through one queue, so
//! transitions commit in settlement order. Overlapping fetches are not
//! sequence-guarded: the last one to settle wins.

use std::sync::Arc;
use std::time::Duration;

use miniapps_user_client::{FetchError, ProfileFetcher, ProfileResponse, RequestOptions};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::state::ProfileState;

/// Options for one subscription, on top of the per-call request options.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Gate for automatic fetches (activation and interval ticks). Manual
    /// [`ProfileWatch::refetch`] bypasses it.
    pub enabled: bool,
    /// Re-issue the fetch on this cadence while enabled.
    pub refetch_interval: Option<Duration>,
    /// Options forwarded to every fetch.
    pub request: RequestOptions,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            refetch_interval: None,
            request: RequestOptions::default(),
        }
    }
}

enum Msg {
    Refetch,
    SetEnabled(bool),
    SetInterval(Option<Duration>),
    Settled(Result<ProfileResponse, FetchError>),
}

/// Live subscription handle.
///
/// Dropping it tears the subscription down; no tick, fetch, or listener
/// call happens afterward.
pub struct ProfileWatch {
    commands: mpsc::UnboundedSender<Msg>,
    state: watch::Receiver<ProfileState>,
    task: JoinHandle<()>,
}

impl ProfileWatch {
    /// Current state snapshot.
    pub fn state(&self) -> ProfileState {
        self.state.borrow().clone()
    }

    /// Watch channel mirror of the state, for callers that prefer awaiting
    /// changes over a callback.
    pub fn subscribe(&self) -> watch::Receiver<ProfileState> {
        self.state.clone()
    }

    /// Issue one fresh fetch immediately, bypassing the `enabled` gate. A
    /// subscription bound to an empty user id still fetches nothing.
    pub fn refetch(&self) {
        let _ = self.commands.send(Msg::Refetch);
    }

    /// Toggle automatic fetching. Disabling disarms the interval;
    /// re-enabling re-arms it and triggers one fetch.
    pub fn set_enabled(&self, enabled: bool) {
        let _ = self.commands.send(Msg::SetEnabled(enabled));
    }

    /// Replace the auto-refetch cadence. `None` stops periodic fetches.
    pub fn set_refetch_interval(&self, interval: Option<Duration>) {
        let _ = self.commands.send(Msg::SetInterval(interval));
    }
}

impl Drop for ProfileWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Subscribe to a user's profile.
///
/// `on_change` runs after every committed transition. Fetches are driven by
/// activation, [`ProfileWatch::refetch`], and the optional interval; all of
/// them go through `fetcher`. Fetch failures are values, so nothing escapes
/// the cycle: every outcome lands in [`ProfileState`].
pub fn watch_user_profile<F>(
    fetcher: Arc<F>,
    user_id: impl Into<String>,
    options: WatchOptions,
    on_change: impl Fn(&ProfileState) + Send + Sync + 'static,
) -> ProfileWatch
where
    F: ProfileFetcher + 'static,
{
    let (commands, rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(ProfileState::default());

    let subscription = Subscription {
        fetcher,
        user_id: user_id.into(),
        request: options.request,
        enabled: options.enabled,
        refetch_interval: options.refetch_interval,
        listener: Box::new(on_change),
        state_tx,
        settlements: commands.clone(),
    };
    let task = tokio::spawn(subscription.run(rx));

    ProfileWatch {
        commands,
        state: state_rx,
        task,
    }
}

struct Subscription<F: ProfileFetcher + 'static> {
    fetcher: Arc<F>,
    user_id: String,
    request: RequestOptions,
    enabled: bool,
    refetch_interval: Option<Duration>,
    listener: Box<dyn Fn(&ProfileState) + Send + Sync>,
    state_tx: watch::Sender<ProfileState>,
    settlements: mpsc::UnboundedSender<Msg>,
}

impl<F: ProfileFetcher + 'static> Subscription<F> {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Msg>) {
        let mut next_tick = self.arm_interval();

        if self.enabled {
            self.start_fetch();
        }

        loop {
            let deadline = next_tick;
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else { break };
                    match msg {
                        Msg::Refetch => self.start_fetch(),
                        Msg::SetEnabled(enabled) => {
                            let was_enabled = self.enabled;
                            self.enabled = enabled;
                            next_tick = self.arm_interval();
                            if enabled && !was_enabled {
                                self.start_fetch();
                            }
                        }
                        Msg::SetInterval(interval) => {
                            self.refetch_interval = interval;
                            next_tick = self.arm_interval();
                        }
                        Msg::Settled(outcome) => self.commit_settled(outcome),
                    }
                }
                _ = sleep_until_or_forever(deadline) => {
                    self.start_fetch();
                    next_tick = self.arm_interval();
                }
            }
        }
    }

    /// Next periodic trigger, or `None` while disabled or without a cadence.
    fn arm_interval(&self) -> Option<Instant> {
        let period = self.refetch_interval.filter(|_| self.enabled)?;
        if period.is_zero() {
            return None;
        }
        Some(Instant::now() + period)
    }

    /// Spawn one fetch. Its settlement re-enters the queue, so overlapping
    /// fetches commit in the order they settle.
    fn start_fetch(&mut self) {
        if self.user_id.is_empty() {
            return;
        }

        self.commit(ProfileState::loading());

        let fetcher = Arc::clone(&self.fetcher);
        let user_id = self.user_id.clone();
        let request = self.request.clone();
        let settlements = self.settlements.clone();
        tokio::spawn(async move {
            let outcome = fetcher.fetch_profile(&user_id, request).await;
            let _ = settlements.send(Msg::Settled(outcome));
        });
    }

    fn commit_settled(&mut self, outcome: Result<ProfileResponse, FetchError>) {
        match outcome {
            Ok(response) => self.commit(ProfileState::success(response.profile)),
            Err(err) => self.commit(ProfileState::failed(err.to_string())),
        }
    }

    fn commit(&mut self, next: ProfileState) {
        debug!(
            loading = next.loading,
            has_data = next.data.is_some(),
            error = ?next.error,
            "profile state transition"
        );
        let _ = self.state_tx.send(next.clone());
        (self.listener)(&next);
    }
}

async fn sleep_until_or_forever(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
