//! Ordered archetype selection
//!
//! Archetype detectors overlap: a directory can carry both `WEB-INF/` and a
//! runnable jar. Registration order is the tie-break, so the first candidate
//! to detect wins and later candidates are never asked.

use crate::plugin::Plugin;
use std::sync::Arc;
use tracing::{debug, warn};

/// The winning candidate and the label it reported
pub struct Selection<C: ?Sized> {
    pub candidate: Arc<C>,
    pub label: String,
}

impl<C: Plugin + ?Sized> std::fmt::Debug for Selection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selection")
            .field("candidate", &self.candidate.name())
            .field("label", &self.label)
            .finish()
    }
}

pub struct ArchetypeRegistry<C: ?Sized> {
    kind: &'static str,
    candidates: Vec<Arc<C>>,
}

impl<C: Plugin + ?Sized> ArchetypeRegistry<C> {
    /// `kind` names the concern in logs, e.g. "container" or "jre"
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            candidates: Vec::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Append a candidate; it is tried after every earlier registration
    pub fn register(&mut self, candidate: Arc<C>) {
        self.candidates.push(candidate);
    }

    pub fn with(mut self, candidate: Arc<C>) -> Self {
        self.register(candidate);
        self
    }

    pub fn candidates(&self) -> &[Arc<C>] {
        &self.candidates
    }

    pub fn names(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// First candidate, in registration order, that detects positively.
    ///
    /// A detector that errors is logged and treated as a non-match.
    pub fn select(&self) -> Option<Selection<C>> {
        for candidate in &self.candidates {
            match candidate.detect() {
                Ok(Some(label)) => {
                    debug!(kind = self.kind, candidate = candidate.name(), label = %label, "Candidate matched");
                    return Some(Selection {
                        candidate: Arc::clone(candidate),
                        label,
                    });
                }
                Ok(None) => {
                    debug!(kind = self.kind, candidate = candidate.name(), "Candidate did not match");
                }
                Err(e) => {
                    warn!(
                        kind = self.kind,
                        candidate = candidate.name(),
                        error = %format!("{:#}", e),
                        "Detection failed, skipping candidate"
                    );
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Outcome {
        Match,
        NoMatch,
        Broken,
    }

    struct Candidate {
        name: &'static str,
        outcome: Outcome,
        calls: AtomicUsize,
    }

    impl Candidate {
        fn new(name: &'static str, outcome: Outcome) -> Arc<Self> {
            Arc::new(Self {
                name,
                outcome,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Plugin for Candidate {
        fn name(&self) -> &str {
            self.name
        }

        fn detect(&self) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome {
                Outcome::Match => Ok(Some(format!("{}-label", self.name))),
                Outcome::NoMatch => Ok(None),
                Outcome::Broken => anyhow::bail!("detector crashed"),
            }
        }

        fn install(&self) -> Result<()> {
            Ok(())
        }

        fn configure(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_first_match_in_registration_order_wins() {
        let a = Candidate::new("A", Outcome::NoMatch);
        let b = Candidate::new("B", Outcome::Match);
        let c = Candidate::new("C", Outcome::Match);

        let registry = ArchetypeRegistry::<Candidate>::new("test")
            .with(a.clone())
            .with(b.clone())
            .with(c.clone());

        let selection = registry.select().unwrap();
        assert_eq!(selection.candidate.name(), "B");
        assert_eq!(selection.label, "B-label");
        assert_eq!(a.calls(), 1);
        assert_eq!(c.calls(), 0);
    }

    #[test]
    fn test_registration_order_breaks_ties() {
        let first = Candidate::new("first", Outcome::Match);
        let second = Candidate::new("second", Outcome::Match);

        let forward = ArchetypeRegistry::<Candidate>::new("test")
            .with(first.clone())
            .with(second.clone());
        let reversed = ArchetypeRegistry::<Candidate>::new("test")
            .with(second)
            .with(first);

        assert_eq!(forward.select().unwrap().candidate.name(), "first");
        assert_eq!(reversed.select().unwrap().candidate.name(), "second");
    }

    #[test]
    fn test_broken_detector_is_skipped() {
        let broken = Candidate::new("broken", Outcome::Broken);
        let fallback = Candidate::new("fallback", Outcome::Match);

        let registry = ArchetypeRegistry::<Candidate>::new("test")
            .with(broken.clone())
            .with(fallback);

        assert_eq!(registry.select().unwrap().candidate.name(), "fallback");
        assert_eq!(broken.calls(), 1);
    }

    #[test]
    fn test_no_match() {
        let registry = ArchetypeRegistry::<Candidate>::new("test")
            .with(Candidate::new("A", Outcome::NoMatch))
            .with(Candidate::new("B", Outcome::Broken));
        assert!(registry.select().is_none());

        let empty = ArchetypeRegistry::<Candidate>::new("test");
        assert!(empty.is_empty());
        assert!(empty.select().is_none());
    }

    #[test]
    fn test_trait_object_registry() {
        let mut registry: ArchetypeRegistry<dyn Plugin> = ArchetypeRegistry::new("dyn");
        registry.register(Candidate::new("A", Outcome::NoMatch));
        registry.register(Candidate::new("B", Outcome::Match));

        assert_eq!(registry.names(), vec!["A", "B"]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.kind(), "dyn");
        assert_eq!(registry.select().unwrap().label, "B-label");
    }
}
