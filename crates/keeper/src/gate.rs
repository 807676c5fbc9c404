//! Master password gate - a bounded number of attempts to type the secret

use tracing::warn;

/// Outcome of a gate check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Granted { attempts: u32 },
    Denied,
}

impl GateOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordGate {
    max_attempts: u32,
}

impl Default for PasswordGate {
    fn default() -> Self {
        Self::new(3)
    }
}

impl PasswordGate {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Ask for the secret until it matches `expected` or attempts run out.
    ///
    /// `read_attempt` receives the 1-based attempt number. A read error ends
    /// the check immediately and is returned.
    pub fn admit<F>(&self, expected: &str, mut read_attempt: F) -> std::io::Result<GateOutcome>
    where
        F: FnMut(u32) -> std::io::Result<String>,
    {
        for attempt in 1..=self.max_attempts {
            if read_attempt(attempt)? == expected {
                return Ok(GateOutcome::Granted { attempts: attempt });
            }
            warn!(attempt, max = self.max_attempts, "wrong master password");
        }
        Ok(GateOutcome::Denied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripted(answers: &'static [&'static str]) -> impl FnMut(u32) -> std::io::Result<String> {
        let mut iter = answers.iter();
        move |_| {
            iter.next()
                .map(|s| s.to_string())
                .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "no more input"))
        }
    }

    #[test]
    fn test_granted_first_try() {
        let gate = PasswordGate::default();
        let outcome = gate.admit("hunter2", scripted(&["hunter2"])).unwrap();
        assert_eq!(outcome, GateOutcome::Granted { attempts: 1 });
        assert!(outcome.is_granted());
    }

    #[test]
    fn test_granted_on_last_attempt() {
        let gate = PasswordGate::new(3);
        let outcome = gate.admit("hunter2", scripted(&["a", "b", "hunter2"])).unwrap();
        assert_eq!(outcome, GateOutcome::Granted { attempts: 3 });
    }

    #[test]
    fn test_denied_after_max_attempts() {
        let gate = PasswordGate::new(3);
        let mut calls = 0;
        let outcome = gate
            .admit("hunter2", |_| {
                calls += 1;
                Ok("wrong".to_string())
            })
            .unwrap();
        assert_eq!(outcome, GateOutcome::Denied);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_attempt_numbers() {
        let gate = PasswordGate::new(2);
        let mut seen = vec![];
        gate.admit("x", |n| {
            seen.push(n);
            Ok(String::new())
        })
        .unwrap();
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn test_zero_attempts_denies() {
        let gate = PasswordGate::new(0);
        let outcome = gate.admit("", scripted(&[""])).unwrap();
        assert_eq!(outcome, GateOutcome::Denied);
    }

    #[test]
    fn test_comparison_is_exact() {
        let gate = PasswordGate::new(2);
        let outcome = gate.admit("Secret", scripted(&["secret", "Secret "])).unwrap();
        assert_eq!(outcome, GateOutcome::Denied);
    }

    #[test]
    fn test_read_error_propagates() {
        let gate = PasswordGate::new(3);
        assert!(gate.admit("x", scripted(&["a"])).is_err());
    }
}
