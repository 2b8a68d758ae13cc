//! Caller session and the guest-logging rule.

/// Who is producing events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    /// Command-line or test context; such callers are always logged.
    pub cli: bool,
    /// A user is logged in.
    pub logged_in: bool,
    /// The logged-in user is the guest account.
    pub guest: bool,
}

impl Session {
    /// Command-line session.
    pub fn cli() -> Self {
        Self {
            cli: true,
            logged_in: false,
            guest: false,
        }
    }

    /// Interactive session for a regular logged-in user.
    pub fn user() -> Self {
        Self {
            cli: false,
            logged_in: true,
            guest: false,
        }
    }

    /// Interactive session for a guest.
    pub fn guest() -> Self {
        Self {
            cli: false,
            logged_in: true,
            guest: true,
        }
    }

    /// Interactive session without a logged-in user.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Returns true when events from this session are dropped.
    pub fn ignores_events(&self, log_guests: bool) -> bool {
        !self.cli && !log_guests && (self.guest || !self.logged_in)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_rule() {
        assert!(Session::guest().ignores_events(false));
        assert!(Session::anonymous().ignores_events(false));
        assert!(!Session::user().ignores_events(false));
        assert!(!Session::cli().ignores_events(false));
        assert!(!Session::guest().ignores_events(true));
        assert!(!Session::anonymous().ignores_events(true));
    }
}
