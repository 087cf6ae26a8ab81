//! Compilation sessions and the pass driver.
//!
//! A [`CompileSession`] owns the record cache and the unknown registry of a
//! single compilation pass. It is created by the host, handed by `&mut` to
//! every resolution call and consumed with [`CompileSession::finish`] once
//! the pass is over. A new pass starts from a new session, so records
//! fetched in one pass never leak into the next one.

use chrono::{DateTime, Utc};

use crate::cache::RecordCache;
use crate::unknown::{UnknownParameter, UnknownRegistry};

/// State of one compilation pass.
#[derive(Debug, Default)]
pub struct CompileSession {
    /// Pass number, starting at 1.
    pub pass: u32,

    /// Records fetched during this pass.
    pub cache: RecordCache,

    /// Parameters deferred during this pass.
    pub unknowns: UnknownRegistry,

    started_at: Option<DateTime<Utc>>,
}

impl CompileSession {
    /// Create a session for the given pass.
    pub fn new(pass: u32) -> Self {
        Self {
            pass,
            cache: RecordCache::new(),
            unknowns: UnknownRegistry::new(),
            started_at: Some(Utc::now()),
        }
    }

    /// Close the pass and report what stayed unresolved.
    pub fn finish(mut self) -> PassOutcome {
        let finished_at = Utc::now();
        let duration_ms = self
            .started_at
            .map(|start| (finished_at - start).num_milliseconds().max(0) as u64)
            .unwrap_or(0);

        PassOutcome {
            pass: self.pass,
            unknowns: self.unknowns.take(),
            records_fetched: self.cache.len(),
            duration_ms,
        }
    }
}

/// Result of a finished compilation pass.
#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub pass: u32,
    pub unknowns: Vec<UnknownParameter>,
    pub records_fetched: usize,
    pub duration_ms: u64,
}

impl PassOutcome {
    /// Returns true if every parameter was resolved.
    pub fn is_complete(&self) -> bool {
        self.unknowns.is_empty()
    }
}

/// What the host should do after a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    /// No parameter is unknown anymore.
    Converged,
    /// Some parameters are unknown; another pass may resolve them.
    Continue,
    /// The pass deferred exactly the same parameters as the previous one.
    Stalled,
    /// The pass limit was reached.
    Exhausted,
}

impl Convergence {
    /// Returns true if no further pass should run.
    pub fn is_final(&self) -> bool {
        !matches!(self, Convergence::Continue)
    }
}

/// Drives repeated compilation passes until the unknowns settle.
#[derive(Debug)]
pub struct PassDriver {
    max_passes: u32,
    history: Vec<PassOutcome>,
}

impl PassDriver {
    /// Create a driver that runs at most `max_passes` passes.
    pub fn new(max_passes: u32) -> Self {
        Self {
            max_passes: max_passes.max(1),
            history: Vec::new(),
        }
    }

    /// Start the next pass, or `None` once the limit is reached.
    pub fn next_session(&self) -> Option<CompileSession> {
        let pass = self.history.len() as u32 + 1;
        if pass > self.max_passes {
            return None;
        }
        tracing::info!(pass, "Starting compilation pass");
        Some(CompileSession::new(pass))
    }

    /// Record a finished pass and decide whether to continue.
    pub fn complete(&mut self, session: CompileSession) -> Convergence {
        let outcome = session.finish();
        let convergence = if outcome.is_complete() {
            Convergence::Converged
        } else if self
            .history
            .last()
            .is_some_and(|previous| previous.unknowns == outcome.unknowns)
        {
            Convergence::Stalled
        } else if outcome.pass >= self.max_passes {
            Convergence::Exhausted
        } else {
            Convergence::Continue
        };

        tracing::info!(
            pass = outcome.pass,
            unknowns = outcome.unknowns.len(),
            records = outcome.records_fetched,
            ?convergence,
            "Compilation pass finished"
        );

        self.history.push(outcome);
        convergence
    }

    /// Outcomes of all finished passes.
    pub fn history(&self) -> &[PassOutcome] {
        &self.history
    }

    /// Parameters still unknown after the last pass.
    pub fn unresolved(&self) -> &[UnknownParameter] {
        self.history
            .last()
            .map(|outcome| outcome.unknowns.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forms_core::Fields;

    #[test]
    fn test_finish_drains_registry() {
        let mut session = CompileSession::new(1);
        session.cache.insert("r1", Fields::new());
        session.unknowns.register_record("hostname", "r2");

        let outcome = session.finish();
        assert_eq!(outcome.pass, 1);
        assert_eq!(outcome.records_fetched, 1);
        assert_eq!(outcome.unknowns.len(), 1);
        assert!(!outcome.is_complete());
    }

    #[test]
    fn test_driver_converges() {
        let mut driver = PassDriver::new(5);

        let mut first = driver.next_session().unwrap();
        first.unknowns.register_form("hostname", "infra::Server");
        assert_eq!(driver.complete(first), Convergence::Continue);

        let second = driver.next_session().unwrap();
        assert_eq!(second.pass, 2);
        assert!(second.cache.is_empty());
        assert_eq!(driver.complete(second), Convergence::Converged);
        assert!(driver.unresolved().is_empty());
    }

    #[test]
    fn test_driver_detects_stall() {
        let mut driver = PassDriver::new(5);

        for expected in [Convergence::Continue, Convergence::Stalled] {
            let mut session = driver.next_session().unwrap();
            session.unknowns.register_form("hostname", "infra::Server");
            assert_eq!(driver.complete(session), expected);
        }
        assert_eq!(driver.unresolved().len(), 1);
    }

    #[test]
    fn test_driver_exhausts() {
        let mut driver = PassDriver::new(2);

        let mut first = driver.next_session().unwrap();
        first.unknowns.register_form("a", "f");
        assert_eq!(driver.complete(first), Convergence::Continue);

        let mut second = driver.next_session().unwrap();
        second.unknowns.register_form("b", "f");
        let convergence = driver.complete(second);
        assert_eq!(convergence, Convergence::Exhausted);
        assert!(convergence.is_final());
        assert!(driver.next_session().is_none());
    }
}
