//! Ordered resolution fallback.

use super::types::ResolutionCandidate;

/// Every candidate has been tried and none was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no supported resolution on this device")]
pub struct Exhausted;

/// Walks an ordered list of resolution candidates, highest first.
#[derive(Debug, Clone)]
pub struct ResolutionNegotiator {
    candidates: Vec<ResolutionCandidate>,
    index: usize,
}

impl ResolutionNegotiator {
    /// Returns `None` for an empty candidate list.
    pub fn new(candidates: Vec<ResolutionCandidate>) -> Option<Self> {
        if candidates.is_empty() {
            return None;
        }
        Some(Self {
            candidates,
            index: 0,
        })
    }

    pub fn current(&self) -> ResolutionCandidate {
        self.candidates[self.index]
    }

    /// Move to the next candidate, or report that the list is used up.
    ///
    /// Once exhausted, the negotiator stays on the last candidate.
    pub fn advance(&mut self) -> Result<ResolutionCandidate, Exhausted> {
        if self.index + 1 >= self.candidates.len() {
            return Err(Exhausted);
        }
        self.index += 1;
        Ok(self.current())
    }

    /// Start again from the highest candidate.
    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Number of candidates tried so far, including the current one.
    pub fn attempts(&self) -> usize {
        self.index + 1
    }

    pub fn candidates(&self) -> &[ResolutionCandidate] {
        &self.candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_rejected() {
        assert!(ResolutionNegotiator::new(Vec::new()).is_none());
    }

    #[test]
    fn test_walks_in_order_then_exhausts() {
        let mut negotiator = ResolutionNegotiator::new(ResolutionCandidate::defaults()).unwrap();
        assert_eq!(negotiator.current(), ResolutionCandidate::square(1200));
        assert_eq!(negotiator.attempts(), 1);

        assert_eq!(negotiator.advance(), Ok(ResolutionCandidate::square(1000)));
        assert_eq!(negotiator.advance(), Ok(ResolutionCandidate::square(800)));
        assert_eq!(negotiator.advance(), Ok(ResolutionCandidate::square(600)));
        assert_eq!(negotiator.advance(), Ok(ResolutionCandidate::square(400)));
        assert_eq!(negotiator.attempts(), 5);

        assert_eq!(negotiator.advance(), Err(Exhausted));
        assert_eq!(negotiator.advance(), Err(Exhausted));
        assert_eq!(negotiator.current(), ResolutionCandidate::square(400));
    }

    #[test]
    fn test_single_candidate_exhausts_immediately() {
        let mut negotiator =
            ResolutionNegotiator::new(vec![ResolutionCandidate::square(640)]).unwrap();
        assert_eq!(negotiator.advance(), Err(Exhausted));
    }

    #[test]
    fn test_reset() {
        let mut negotiator = ResolutionNegotiator::new(ResolutionCandidate::defaults()).unwrap();
        negotiator.advance().unwrap();
        negotiator.advance().unwrap();
        negotiator.reset();
        assert_eq!(negotiator.current(), ResolutionCandidate::square(1200));
        assert_eq!(negotiator.attempts(), 1);
    }
}
