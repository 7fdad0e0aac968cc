//! Persistence policy
//!
//! Decides whether a finished snapshot is committed to the store. The
//! interactive variant asks once and remembers the answer for the run.

use std::fmt;

/// When snapshots are committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistPolicy {
    Always,
    Never,
    /// Ask on the first commit, then reuse the answer
    ConfirmOnce,
}

impl fmt::Display for PersistPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Always => "always",
            Self::Never => "never",
            Self::ConfirmOnce => "ask",
        };
        write!(f, "{}", name)
    }
}

/// Source of a yes/no answer for the `ConfirmOnce` policy
pub trait Confirm {
    fn confirm(&mut self, site: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, site: &str) -> bool {
        self(site)
    }
}

/// Applies a [`PersistPolicy`] across one run
pub struct PersistDecider {
    policy: PersistPolicy,
    confirm: Option<Box<dyn Confirm>>,
    answer: Option<bool>,
}

impl PersistDecider {
    pub fn always() -> Self {
        Self {
            policy: PersistPolicy::Always,
            confirm: None,
            answer: None,
        }
    }

    pub fn never() -> Self {
        Self {
            policy: PersistPolicy::Never,
            confirm: None,
            answer: None,
        }
    }

    pub fn confirm_once(confirm: impl Confirm + 'static) -> Self {
        Self {
            policy: PersistPolicy::ConfirmOnce,
            confirm: Some(Box::new(confirm)),
            answer: None,
        }
    }

    pub fn policy(&self) -> PersistPolicy {
        self.policy
    }

    /// Returns true if the snapshot of `site` should be committed
    pub fn should_persist(&mut self, site: &str) -> bool {
        match self.policy {
            PersistPolicy::Always => true,
            PersistPolicy::Never => false,
            PersistPolicy::ConfirmOnce => {
                if let Some(answer) = self.answer {
                    return answer;
                }
                let answer = match self.confirm.as_mut() {
                    Some(confirm) => confirm.confirm(site),
                    None => false,
                };
                tracing::info!(
                    "Persistence {} for the rest of this run",
                    if answer { "enabled" } else { "disabled" }
                );
                self.answer = Some(answer);
                answer
            }
        }
    }
}

/// Interprets a typed answer: `y` or `yy` mean yes, anything else no
pub fn parse_answer(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yy" | "yes")
}
