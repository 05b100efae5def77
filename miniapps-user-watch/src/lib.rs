//! Reactive subscription layer over the miniapps user profile client.
//!
//! [`watch_user_profile`] bridges the one-shot fetch into a stateful
//! subscription: it tracks loading/data/error, notifies a listener on every
//! transition, and supports manual refetch, conditional enablement, and
//! periodic auto-refetch. Any UI layer can adapt the listener callback (or
//! the mirrored watch channel) into its own re-render mechanism.

mod state;
mod subscription;

pub use state::ProfileState;
pub use subscription::{watch_user_profile, ProfileWatch, WatchOptions};
