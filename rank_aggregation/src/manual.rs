/*!

This is the long-form manual for `rank_aggregation`.

## The problem

A shared board holds candidate topics. Each voter submits a ranking of the
subset of topics they care about: a first choice, a second choice, and so on.
Rankings are partial, they overlap arbitrarily, and some topics may never be
ranked by anyone. The library turns all of these partial orderings into one
global ordering.

## Scoring

The default method is a normalized Borda count. A voter who ranked `N` topics
awards `N + 1 - position` points: `N` points to their first choice, down to
`1` point for the last topic they ranked. A topic's score is the *average* of
the points it received, taken over the voters who ranked it, not the raw sum.

Averaging is the normalization step. Summing raw points lets a topic every
voter has merely seen outrank a topic a few voters feel strongly about; with
the average, a few strong rankings compete fairly with many lukewarm ones.

A second method, [`ScoreMethod::MeanNormalized`](crate::ScoreMethod), awards
`(N - position) / N` instead, so every per-voter contribution lands in the
0..1 band, and averages over *all* voters with a valid ballot rather than
only the topic's rankers: a voter who never ranked the topic contributes a
zero to its mean. Both methods agree on the qualitative invariants:

* a more preferred topic never scores below a less preferred one on the same
  ballot;
* a topic nobody ranked sorts below every ranked topic.

They do NOT agree on exact orderings in general, which is why the method is
part of [`RankingRules`](crate::RankingRules) and is chosen once: every view
derived from the same data must use the same rules.

## Ordering

Standings are sorted in three layers:

1. topics with at least one vote come before topics with none;
2. within the voted partition, average score descending;
3. any remaining tie, and the whole unvoted partition, by creation time
   descending (newest first).

The third layer makes the output deterministic: two runs over the same data
produce the same order, with no dependence on hash-map iteration.

## Malformed data

The aggregation is defensive at the ballot level and strict at the topic
level. A ballot with a zero rank, a ballot pointing at a topic that has been
deleted, or a duplicated (voter, topic) pair is skipped with a warning; the
rest of that voter's ballot set is re-packed into dense positions and scored
normally. Two topics sharing an id, on the other hand, mean the caller's
candidate set is corrupt, and aggregation fails with
[`RankingErrors::DuplicateTopic`](crate::RankingErrors).

*/
