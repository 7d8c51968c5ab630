// ********* Input data structures ***********

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Debug, Display};

/// An identifier for a candidate on a ballot.
///
/// The engine never reconciles identities: two keys are the same candidate
/// only if they compare equal. The canonical name is used for the final,
/// alphabetical step of the tie-break and for lookups by name.
pub trait CandidateKey: Ord + Clone + Debug {
    /// The canonical string projection of this candidate.
    fn canonical_name(&self) -> Cow<'_, str>;
}

impl CandidateKey for String {
    fn canonical_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl CandidateKey for &str {
    fn canonical_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(*self)
    }
}

/// One voter's ranked list of candidates, most preferred first.
///
/// Ballots may have different lengths. Duplicated candidates are not rejected:
/// each occurrence is tallied.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ballot<K> {
    pub voter: String,
    pub entries: Vec<K>,
}

impl<K> Ballot<K> {
    pub fn new(voter: impl Into<String>, entries: Vec<K>) -> Ballot<K> {
        Ballot {
            voter: voter.into(),
            entries,
        }
    }
}

/// The entries of a stored ballot, as retrieved from a ballot store.
///
/// Stores are not trusted to contain a sequence of candidates.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RecordEntries<K> {
    /// A well-formed ranked list.
    Ranked(Vec<K>),
    /// The record has no entries field at all.
    Missing,
    /// The entries field holds something other than a list of candidates.
    /// The string describes what was found instead.
    WrongType(String),
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BallotRecord<K> {
    pub voter: String,
    pub entries: RecordEntries<K>,
}

// ******** Output data structures *********

/// Per-position vote counts for one candidate.
///
/// Position 0 is the most preferred slot of a ballot, whatever the length of
/// that ballot. Positions that no ballot used are absent and count as zero.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct PositionHistogram(BTreeMap<usize, u64>);

impl PositionHistogram {
    pub fn new() -> PositionHistogram {
        PositionHistogram(BTreeMap::new())
    }

    pub(crate) fn record(&mut self, position: usize) {
        *self.0.entry(position).or_insert(0) += 1;
    }

    /// The number of ballots that placed the candidate at this position.
    pub fn count_at(&self, position: usize) -> u64 {
        self.0.get(&position).cloned().unwrap_or(0)
    }

    /// One past the highest recorded position, or 0 when nothing was recorded.
    pub fn span(&self) -> usize {
        self.0.keys().next_back().map(|p| p + 1).unwrap_or(0)
    }

    /// The recorded (position, count) pairs, in increasing position.
    pub fn iter(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.0.iter().map(|(p, c)| (*p, *c))
    }

    /// The counts for positions `0..span()`, with zeros for the gaps.
    pub fn to_dense(&self) -> Vec<u64> {
        let mut dense = vec![0; self.span()];
        for (position, count) in self.iter() {
            dense[position] = count;
        }
        dense
    }

    /// The first position at which the two histograms disagree, with the
    /// counts of `self` and `other` at that position.
    pub fn first_divergence(&self, other: &PositionHistogram) -> Option<(usize, u64, u64)> {
        let span = self.span().max(other.span());
        (0..span)
            .map(|p| (p, self.count_at(p), other.count_at(p)))
            .find(|(_, a, b)| a != b)
    }
}

impl FromIterator<(usize, u64)> for PositionHistogram {
    fn from_iter<I: IntoIterator<Item = (usize, u64)>>(iter: I) -> Self {
        PositionHistogram(iter.into_iter().filter(|(_, c)| *c > 0).collect())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum TieBreakOutcome {
    Won,
    Lost,
}

/// Why an entry was placed where it is relative to an entry with the same score.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct TieBreakNote {
    pub outcome: TieBreakOutcome,
    /// Zero-based ballot position that decided the run-off.
    pub position: usize,
}

impl TieBreakNote {
    /// The 1-based place that decided the run-off.
    pub fn place(&self) -> usize {
        self.position + 1
    }
}

impl Display for TieBreakNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let place = self.place();
        match self.outcome {
            TieBreakOutcome::Won => write!(
                f,
                "Tied in score, won due to more {}{}-place votes",
                place,
                ordinal_suffix(place)
            ),
            TieBreakOutcome::Lost => write!(
                f,
                "Tied in score, lost due to fewer {}{}-place votes",
                place,
                ordinal_suffix(place)
            ),
        }
    }
}

/// Superscript English ordinal suffix: 1ˢᵗ, 2ⁿᵈ, 3ʳᵈ, 4ᵗʰ, 11ᵗʰ, 21ˢᵗ.
pub fn ordinal_suffix(n: usize) -> &'static str {
    match (n % 10, n % 100) {
        (_, 11..=13) => "ᵗʰ",
        (1, _) => "ˢᵗ",
        (2, _) => "ⁿᵈ",
        (3, _) => "ʳᵈ",
        _ => "ᵗʰ",
    }
}

/// One line of the final ranking.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankingEntry<K> {
    pub candidate: K,
    /// Sum over ballots of `ballot length - position`.
    pub score: u64,
    pub histogram: PositionHistogram,
    /// Only set when a neighbouring entry has the same score and the positional
    /// run-off separated the two.
    pub tie_break: Option<TieBreakNote>,
}

impl<K> RankingEntry<K> {
    pub fn tie_break_message(&self) -> Option<String> {
        self.tie_break.map(|n| n.to_string())
    }
}

/// Errors that prevent the ranking from being computed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RankingErrors {
    /// A stored ballot does not hold a sequence of candidates.
    MalformedBallot {
        /// Index of the record in the input collection.
        index: usize,
        voter: String,
        reason: String,
    },
}

impl Error for RankingErrors {}

impl Display for RankingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankingErrors::MalformedBallot {
                index,
                voter,
                reason,
            } => write!(
                f,
                "malformed ballot #{} (voter {:?}): {}",
                index, voter, reason
            ),
        }
    }
}
