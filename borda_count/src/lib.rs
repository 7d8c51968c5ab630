/*!
Borda-count tally of ranked-preference ballots.

Every ballot awards `L - i` points to the candidate at zero-based position `i`,
where `L` is the length of *that* ballot. A candidate ranked first on a short
ballot therefore earns fewer points than one ranked first on a long ballot.

Ties on score are broken by a positional run-off: more first-place votes wins,
then more second-place votes, and so on. Candidates with identical profiles are
ordered alphabetically by their canonical name. The result is a total order.

```
use borda_count::{compute_rankings, Ballot};

let ballots = vec![
    Ballot::new("ann", vec!["x".to_string(), "y".to_string()]),
    Ballot::new("bob", vec!["x".to_string(), "y".to_string()]),
    Ballot::new("cid", vec!["y".to_string(), "x".to_string()]),
];
let rankings = compute_rankings(&ballots);
assert_eq!(rankings[0].candidate, "x");
assert_eq!(rankings[0].score, 5);
assert_eq!(rankings[1].score, 4);
```

The computation is pure: no I/O and no state kept between calls.
*/

pub mod builder;
mod config;
pub mod manual;

use log::{debug, info};

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
};

pub use crate::config::*;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Default)]
struct CandidateTally {
    score: u64,
    histogram: PositionHistogram,
}

/// Computes the ranking for the given ballots.
///
/// The output holds one entry per distinct candidate, sorted by decreasing
/// score with the run-off rules applied. The order in which the ballots are
/// provided has no influence on the result. An empty collection gives an
/// empty ranking.
pub fn compute_rankings<K: CandidateKey>(ballots: &[Ballot<K>]) -> Vec<RankingEntry<K>> {
    info!("compute_rankings: processing {} ballots", ballots.len());

    let tallies = tally_ballots(ballots);
    let mut entries: Vec<RankingEntry<K>> = tallies
        .into_iter()
        .map(|(candidate, t)| RankingEntry {
            candidate,
            score: t.score,
            histogram: t.histogram,
            tie_break: None,
        })
        .collect();
    info!("compute_rankings: {} candidates", entries.len());

    entries.sort_by(compare_entries);
    annotate_ties(&mut entries);

    for (idx, e) in entries.iter().enumerate() {
        debug!(
            "compute_rankings: {}: {:?} score: {} histogram: {:?} tiebreak: {:?}",
            idx + 1,
            e.candidate,
            e.score,
            e.histogram.to_dense(),
            e.tie_break
        );
    }
    entries
}

/// Computes the ranking for ballots as they were retrieved from a store.
///
/// Fails with [`RankingErrors::MalformedBallot`] on the first record that does
/// not hold a ranked list. Nothing is tallied in that case.
pub fn compute_rankings_checked<K: CandidateKey>(
    records: &[BallotRecord<K>],
) -> Result<Vec<RankingEntry<K>>, RankingErrors> {
    let ballots = check_ballots(records)?;
    Ok(compute_rankings(&ballots))
}

/// Converts stored records into ballots, failing on the first malformed one.
pub fn check_ballots<K: Clone>(records: &[BallotRecord<K>]) -> Result<Vec<Ballot<K>>, RankingErrors> {
    debug!("check_ballots: {} records", records.len());
    records
        .iter()
        .enumerate()
        .map(|(index, r)| record_to_ballot(index, r))
        .collect()
}

pub(crate) fn record_to_ballot<K: Clone>(
    index: usize,
    record: &BallotRecord<K>,
) -> Result<Ballot<K>, RankingErrors> {
    match &record.entries {
        RecordEntries::Ranked(entries) => Ok(Ballot {
            voter: record.voter.clone(),
            entries: entries.clone(),
        }),
        RecordEntries::Missing => Err(RankingErrors::MalformedBallot {
            index,
            voter: record.voter.clone(),
            reason: "the ballot has no ranked entries".to_string(),
        }),
        RecordEntries::WrongType(found) => Err(RankingErrors::MalformedBallot {
            index,
            voter: record.voter.clone(),
            reason: format!("expected a ranked list of candidates, found {}", found),
        }),
    }
}

/// The ordering used for the final ranking.
///
/// In order: higher score first; then the first position at which the vote
/// counts differ, more votes first; then the canonical names in ascending
/// order. Distinct keys sharing a canonical name fall back on their own order.
pub fn compare_entries<K: CandidateKey>(a: &RankingEntry<K>, b: &RankingEntry<K>) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| match a.histogram.first_divergence(&b.histogram) {
            Some((_, count_a, count_b)) => count_b.cmp(&count_a),
            None => Ordering::Equal,
        })
        .then_with(|| {
            a.candidate
                .canonical_name()
                .cmp(&b.candidate.canonical_name())
        })
        .then_with(|| a.candidate.cmp(&b.candidate))
}

/// The voters whose ballot ranks a candidate with this canonical name.
///
/// Voters are returned sorted and without repetition.
pub fn voters_for<'a, K: CandidateKey>(ballots: &'a [Ballot<K>], name: &str) -> Vec<&'a str> {
    let voters: BTreeSet<&str> = ballots
        .iter()
        .filter(|b| b.entries.iter().any(|c| c.canonical_name() == name))
        .map(|b| b.voter.as_str())
        .collect();
    debug!("voters_for: {:?}: {} voters", name, voters.len());
    voters.into_iter().collect()
}

// The accumulation does not depend on the order of the ballots.
fn tally_ballots<K: CandidateKey>(ballots: &[Ballot<K>]) -> BTreeMap<K, CandidateTally> {
    let mut tallies: BTreeMap<K, CandidateTally> = BTreeMap::new();
    for b in ballots.iter() {
        let num_entries = b.entries.len() as u64;
        debug!(
            "tally_ballots: voter {:?}: {} entries",
            b.voter, num_entries
        );
        for (position, candidate) in b.entries.iter().enumerate() {
            let t = tallies.entry(candidate.clone()).or_default();
            t.score += num_entries - position as u64;
            t.histogram.record(position);
        }
    }
    tallies
}

// Only neighbours are compared. In a tie between three or more candidates, the
// note of an entry reflects its last comparison.
fn annotate_ties<K: CandidateKey>(entries: &mut [RankingEntry<K>]) {
    for idx in 1..entries.len() {
        let (head, tail) = entries.split_at_mut(idx);
        let prev = &mut head[idx - 1];
        let curr = &mut tail[0];
        if prev.score != curr.score {
            continue;
        }
        match prev.histogram.first_divergence(&curr.histogram) {
            Some((position, count_prev, count_curr)) => {
                let (outcome_prev, outcome_curr) = if count_prev > count_curr {
                    (TieBreakOutcome::Won, TieBreakOutcome::Lost)
                } else {
                    (TieBreakOutcome::Lost, TieBreakOutcome::Won)
                };
                prev.tie_break = Some(TieBreakNote {
                    outcome: outcome_prev,
                    position,
                });
                curr.tie_break = Some(TieBreakNote {
                    outcome: outcome_curr,
                    position,
                });
                debug!(
                    "annotate_ties: {:?} vs {:?}: decided at position {}",
                    prev.candidate, curr.candidate, position
                );
            }
            None => {
                debug!(
                    "annotate_ties: {:?} vs {:?}: identical profiles, ordered by name",
                    prev.candidate, curr.candidate
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn ballot(voter: &str, entries: &[&str]) -> Ballot<String> {
        Ballot::new(voter, entries.iter().map(|s| s.to_string()).collect())
    }

    fn summary(rankings: &[RankingEntry<String>]) -> Vec<(String, u64, Vec<u64>, Option<String>)> {
        rankings
            .iter()
            .map(|e| {
                (
                    e.candidate.clone(),
                    e.score,
                    e.histogram.to_dense(),
                    e.tie_break_message(),
                )
            })
            .collect()
    }

    #[test]
    fn identical_profiles_fall_back_to_names() {
        init();
        let rankings = compute_rankings(&[ballot("a", &["y", "x"]), ballot("b", &["x", "y"])]);
        assert_eq!(
            summary(&rankings),
            vec![
                ("x".to_string(), 3, vec![1, 1], None),
                ("y".to_string(), 3, vec![1, 1], None),
            ]
        );
    }

    #[test]
    fn clear_winner_by_score() {
        init();
        let rankings = compute_rankings(&[
            ballot("a", &["x", "y"]),
            ballot("b", &["x", "y"]),
            ballot("c", &["y", "x"]),
        ]);
        assert_eq!(
            summary(&rankings),
            vec![
                ("x".to_string(), 5, vec![2, 1], None),
                ("y".to_string(), 4, vec![1, 2], None),
            ]
        );
    }

    #[test]
    fn three_candidates_without_ties() {
        init();
        let rankings = compute_rankings(&[
            ballot("a", &["x", "y", "z"]),
            ballot("b", &["y", "x", "z"]),
            ballot("c", &["y", "z", "x"]),
        ]);
        assert_eq!(
            summary(&rankings),
            vec![
                ("y".to_string(), 8, vec![2, 1], None),
                ("x".to_string(), 6, vec![1, 1, 1], None),
                ("z".to_string(), 4, vec![0, 1, 2], None),
            ]
        );
    }

    #[test]
    fn runoff_on_second_place() {
        init();
        let rankings = compute_rankings(&[
            ballot("a", &["p", "q", "s"]),
            ballot("b", &["q", "p", "s", "t"]),
            ballot("c", &["s", "p"]),
            ballot("d", &["t", "s", "r", "q"]),
        ]);
        assert_eq!(
            summary(&rankings),
            vec![
                ("s".to_string(), 8, vec![1, 1, 2], None),
                (
                    "p".to_string(),
                    7,
                    vec![1, 2],
                    Some("Tied in score, won due to more 2ⁿᵈ-place votes".to_string())
                ),
                (
                    "q".to_string(),
                    7,
                    vec![1, 1, 0, 1],
                    Some("Tied in score, lost due to fewer 2ⁿᵈ-place votes".to_string())
                ),
                ("t".to_string(), 5, vec![1, 0, 0, 1], None),
                ("r".to_string(), 2, vec![0, 0, 1], None),
            ]
        );
    }

    #[test]
    fn three_way_tie_only_explains_neighbours() {
        init();
        let rankings = compute_rankings(&[ballot("a", &["x", "y", "z"]), ballot("b", &["z", "y", "x"])]);
        assert_eq!(
            summary(&rankings),
            vec![
                ("x".to_string(), 4, vec![1, 0, 1], None),
                (
                    "z".to_string(),
                    4,
                    vec![1, 0, 1],
                    Some("Tied in score, won due to more 1ˢᵗ-place votes".to_string())
                ),
                (
                    "y".to_string(),
                    4,
                    vec![0, 2],
                    Some("Tied in score, lost due to fewer 1ˢᵗ-place votes".to_string())
                ),
            ]
        );
    }

    #[test]
    fn points_follow_each_ballot_length() {
        init();
        // First on a single-entry ballot is worth 1 point, last on a 3-entry ballot too.
        let rankings = compute_rankings(&[ballot("a", &["x"]), ballot("b", &["y", "z", "w"])]);
        let scores: Vec<(String, u64)> = rankings
            .iter()
            .map(|e| (e.candidate.clone(), e.score))
            .collect();
        assert_eq!(
            scores,
            vec![
                ("y".to_string(), 3),
                ("z".to_string(), 2),
                ("x".to_string(), 1),
                ("w".to_string(), 1),
            ]
        );
        // x and w tie on score; x has the first-place vote.
        assert_eq!(
            rankings[2].tie_break_message().as_deref(),
            Some("Tied in score, won due to more 1ˢᵗ-place votes")
        );
        assert_eq!(
            rankings[3].tie_break_message().as_deref(),
            Some("Tied in score, lost due to fewer 1ˢᵗ-place votes")
        );
    }

    #[test]
    fn duplicates_in_a_ballot_accumulate() {
        init();
        let rankings = compute_rankings(&[ballot("a", &["x", "x", "y"])]);
        assert_eq!(
            summary(&rankings),
            vec![
                ("x".to_string(), 5, vec![1, 1], None),
                ("y".to_string(), 1, vec![0, 0, 1], None),
            ]
        );
    }

    #[test]
    fn empty_inputs() {
        init();
        let none: Vec<Ballot<String>> = vec![];
        assert!(compute_rankings(&none).is_empty());
        assert!(compute_rankings(&[ballot("a", &[])]).is_empty());
        let records: Vec<BallotRecord<String>> = vec![];
        assert_eq!(compute_rankings_checked(&records), Ok(vec![]));
    }

    #[test]
    fn malformed_record_fails_everything() {
        init();
        let records = vec![
            BallotRecord {
                voter: "a".to_string(),
                entries: RecordEntries::Ranked(vec!["x".to_string()]),
            },
            BallotRecord {
                voter: "b".to_string(),
                entries: RecordEntries::WrongType("a string".to_string()),
            },
            BallotRecord {
                voter: "c".to_string(),
                entries: RecordEntries::Missing,
            },
        ];
        assert_eq!(
            compute_rankings_checked(&records),
            Err(RankingErrors::MalformedBallot {
                index: 1,
                voter: "b".to_string(),
                reason: "expected a ranked list of candidates, found a string".to_string(),
            })
        );
    }

    #[test]
    fn str_keys() {
        init();
        let ballots = vec![Ballot::new("a", vec!["b", "a"])];
        let rankings = compute_rankings(&ballots);
        assert_eq!(rankings[0].candidate, "b");
        assert_eq!(rankings[1].candidate, "a");
    }

    #[test]
    fn voters_by_name() {
        init();
        let ballots = vec![
            ballot("zoe", &["x", "y"]),
            ballot("al", &["y"]),
            ballot("bo", &["z", "x"]),
        ];
        assert_eq!(voters_for(&ballots, "x"), vec!["bo", "zoe"]);
        assert_eq!(voters_for(&ballots, "y"), vec!["al", "zoe"]);
        assert!(voters_for(&ballots, "w").is_empty());
    }

    #[test]
    fn comparator_uses_key_order_last() {
        #[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone)]
        struct Tagged(&'static str, u8);
        impl CandidateKey for Tagged {
            fn canonical_name(&self) -> std::borrow::Cow<'_, str> {
                std::borrow::Cow::Borrowed(self.0)
            }
        }
        let rankings = compute_rankings(&[
            Ballot::new("a", vec![Tagged("x", 2)]),
            Ballot::new("b", vec![Tagged("x", 1)]),
        ]);
        assert_eq!(rankings[0].candidate, Tagged("x", 1));
        assert_eq!(rankings[1].candidate, Tagged("x", 2));
        assert_eq!(
            compare_entries(&rankings[0], &rankings[1]),
            Ordering::Less
        );
    }
}
