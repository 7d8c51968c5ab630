pub use crate::config::*;

use log::{debug, warn};
use std::collections::HashMap;

use crate::{compute_rankings, record_to_ballot};

/// A builder for collecting ballots, one per voter.
///
/// Submitting again for the same voter replaces the previous ballot. The
/// replaced ballot keeps its original place in the collection.
///
/// ```
/// use borda_count::builder::Builder;
///
/// let mut builder: Builder<String> = Builder::new();
/// builder.add_ballot("ann", &["x".to_string(), "y".to_string()]);
/// builder.add_ballot("bob", &["y".to_string()]);
/// // Ann changes her mind.
/// builder.add_ballot("ann", &["y".to_string(), "x".to_string()]);
///
/// let rankings = builder.rankings();
/// assert_eq!(rankings[0].candidate, "y");
/// assert_eq!(rankings[0].score, 3);
/// ```
#[derive(Debug, Clone)]
pub struct Builder<K> {
    pub(crate) _ballots: Vec<Ballot<K>>,
    pub(crate) _voter_index: HashMap<String, usize>,
    pub(crate) _num_received: usize,
}

impl<K: CandidateKey> Builder<K> {
    pub fn new() -> Builder<K> {
        Builder {
            _ballots: Vec::new(),
            _voter_index: HashMap::new(),
            _num_received: 0,
        }
    }

    /// Adds the ballot of a voter.
    ///
    /// Returns true if this voter had already submitted a ballot, which is now replaced.
    pub fn add_ballot(&mut self, voter: &str, entries: &[K]) -> bool {
        self.insert(Ballot::new(voter, entries.to_vec()))
    }

    /// Adds a ballot as retrieved from a store.
    ///
    /// A malformed record is rejected and leaves the builder unchanged. The
    /// index in the error counts every record submitted to this builder.
    pub fn add_record(&mut self, record: &BallotRecord<K>) -> Result<bool, RankingErrors> {
        let index = self._num_received;
        let ballot = record_to_ballot(index, record);
        match ballot {
            Ok(b) => Ok(self.insert(b)),
            Err(e) => {
                self._num_received += 1;
                Err(e)
            }
        }
    }

    fn insert(&mut self, ballot: Ballot<K>) -> bool {
        self._num_received += 1;
        if let Some(&idx) = self._voter_index.get(&ballot.voter) {
            warn!(
                "Builder: voter {:?} submitted again, replacing the previous ballot",
                ballot.voter
            );
            self._ballots[idx] = ballot;
            true
        } else {
            debug!(
                "Builder: new ballot from voter {:?}: {} entries",
                ballot.voter,
                ballot.entries.len()
            );
            self._voter_index
                .insert(ballot.voter.clone(), self._ballots.len());
            self._ballots.push(ballot);
            false
        }
    }

    /// The current ballots, one per voter, in order of first submission.
    pub fn ballots(&self) -> &[Ballot<K>] {
        &self._ballots
    }

    /// The number of distinct voters.
    pub fn len(&self) -> usize {
        self._ballots.len()
    }

    pub fn is_empty(&self) -> bool {
        self._ballots.is_empty()
    }

    pub fn rankings(&self) -> Vec<RankingEntry<K>> {
        compute_rankings(&self._ballots)
    }
}

impl<K: CandidateKey> Default for Builder<K> {
    fn default() -> Self {
        Builder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resubmission_replaces_in_place() {
        let mut b: Builder<String> = Builder::new();
        assert!(!b.add_ballot("ann", &names(&["x"])));
        assert!(!b.add_ballot("bob", &names(&["y"])));
        assert!(b.add_ballot("ann", &names(&["z", "x"])));
        assert_eq!(b.len(), 2);
        assert_eq!(b.ballots()[0], Ballot::new("ann", names(&["z", "x"])));
        assert_eq!(b.ballots()[1], Ballot::new("bob", names(&["y"])));
    }

    #[test]
    fn malformed_record_is_rejected() {
        let mut b: Builder<String> = Builder::new();
        let good = BallotRecord {
            voter: "ann".to_string(),
            entries: RecordEntries::Ranked(names(&["x"])),
        };
        let bad = BallotRecord {
            voter: "bob".to_string(),
            entries: RecordEntries::Missing,
        };
        assert_eq!(b.add_record(&good), Ok(false));
        let err = b.add_record(&bad).unwrap_err();
        assert_eq!(
            err,
            RankingErrors::MalformedBallot {
                index: 1,
                voter: "bob".to_string(),
                reason: "the ballot has no ranked entries".to_string(),
            }
        );
        assert_eq!(b.len(), 1);
        assert_eq!(b.add_record(&good), Ok(true));
    }

    #[test]
    fn empty_builder_ranks_nothing() {
        let b: Builder<String> = Builder::default();
        assert!(b.is_empty());
        assert!(b.rankings().is_empty());
    }
}
