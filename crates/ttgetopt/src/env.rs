//! Environment values the parser consults, injected rather than read ad hoc.

/// Snapshot of the environment variables that influence parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// `TIMESTEN_HOME`; the argv entry point refuses to run without it.
    pub timesten_home: Option<String>,
    /// `TT_CONNSTR`; fallback for an unresolved `<CONNSTR>`.
    pub tt_connstr: Option<String>,
}

impl Environment {
    /// Read both variables from the current process.
    pub fn from_process() -> Self {
        Environment {
            timesten_home: std::env::var("TIMESTEN_HOME").ok(),
            tt_connstr: std::env::var("TT_CONNSTR").ok(),
        }
    }

    pub fn with_home(mut self, home: impl Into<String>) -> Self {
        self.timesten_home = Some(home.into());
        self
    }

    pub fn with_connstr(mut self, connstr: impl Into<String>) -> Self {
        self.tt_connstr = Some(connstr.into());
        self
    }

    /// `TT_CONNSTR` if it is set to something non-empty.
    pub(crate) fn connstr_fallback(&self) -> Option<&str> {
        self.tt_connstr.as_deref().filter(|s| !s.is_empty())
    }
}
