//! Subscription-owned fetch state.

use miniapps_user_client::UserProfile;

/// Snapshot of one subscription's fetch lifecycle.
///
/// `{None, false, None}` before the first fetch, `{None, true, None}` while
/// one is in flight, then `{Some(_), false, None}` on success or
/// `{None, false, Some(_)}` on failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileState {
    pub data: Option<UserProfile>,
    pub loading: bool,
    pub error: Option<String>,
}

impl ProfileState {
    pub(crate) fn loading() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
        }
    }

    pub(crate) fn success(profile: UserProfile) -> Self {
        Self {
            data: Some(profile),
            loading: false,
            error: None,
        }
    }

    pub(crate) fn failed(error: String) -> Self {
        Self {
            data: None,
            loading: false,
            error: Some(error),
        }
    }
}
