//! Winning-shape enumeration and the per-group distance computation behind
//! the shanten table.
//!
//! A lookup group is either a number suit (9 ranks, runs allowed) or the
//! honors (7 ranks, no runs). For each group we enumerate every count vector
//! formed by 0-4 melds plus an optional pair, keyed by its tile total
//! (`3 * melds + 2 * pair`). The distance from a hand sub-vector `h` to a
//! target `t` is the number of tiles still missing, `sum(max(t_i - h_i, 0))`.
//!
//! The minimum distance over all targets of one total is computed for every
//! sub-vector at once with a multi-source 0-1 BFS over base-5 encoded
//! vectors: walking from a target towards a hand, adding a tile is free and
//! removing one costs 1, so the shortest path is exactly the number of target
//! tiles the hand lacks. The search visits every vector, which makes the
//! minimum exhaustive.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const MAX_MELDS: u8 = 4;
pub const MAX_PAIRS: u8 = 1;

/// Copies of a code, also the largest digit of a base-5 vector.
const MAX_COUNT: u8 = 4;

/// Tile totals a group can contribute to a finished hand.
pub const TARGET_COUNTS: [u8; 10] = [0, 2, 3, 5, 6, 8, 9, 11, 12, 14];

/// Largest tile total of a hand.
pub const MAX_HAND_TILES: u8 = 14;

/// Position of a tile total in [`TARGET_COUNTS`].
#[inline]
pub fn target_slot(count: u8) -> Option<usize> {
    TARGET_COUNTS.iter().position(|&c| c == count)
}

// ---------------------------------------------------------------------------
// GroupKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// Manzu, pinzu or souzu.
    Number,
    Honor,
}

impl GroupKind {
    pub const fn ranks(self) -> usize {
        match self {
            GroupKind::Number => 9,
            GroupKind::Honor => 7,
        }
    }

    pub const fn allows_runs(self) -> bool {
        matches!(self, GroupKind::Number)
    }

    /// Number of base-5 vectors, including ones with more than 14 tiles.
    pub const fn space_size(self) -> usize {
        5usize.pow(self.ranks() as u32)
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Base-5 index of a count vector, first rank most significant.
#[inline]
pub fn encode(counts: &[u8]) -> usize {
    counts.iter().fold(0, |acc, &c| acc * 5 + c as usize)
}

pub fn decode(mut index: usize, ranks: usize) -> Vec<u8> {
    let mut counts = vec![0u8; ranks];
    for slot in counts.iter_mut().rev() {
        *slot = (index % 5) as u8;
        index /= 5;
    }
    counts
}

/// Every vector of `kind` holding at most [`MAX_HAND_TILES`] tiles, as
/// `(index, counts)` in index order.
pub fn reachable_vectors(kind: GroupKind) -> impl Iterator<Item = (usize, Vec<u8>)> {
    (0..kind.space_size()).filter_map(move |index| {
        let counts = decode(index, kind.ranks());
        let total: u8 = counts.iter().sum();
        (total <= MAX_HAND_TILES).then_some((index, counts))
    })
}

// ---------------------------------------------------------------------------
// Winning shapes
// ---------------------------------------------------------------------------

/// Every winning sub-vector of a group, keyed by tile total.
pub fn win_patterns(kind: GroupKind) -> BTreeMap<u8, BTreeSet<Vec<u8>>> {
    let ranks = kind.ranks();
    let mut melds: Vec<Vec<u8>> = (0..ranks)
        .map(|r| {
            let mut v = vec![0u8; ranks];
            v[r] = 3;
            v
        })
        .collect();
    if kind.allows_runs() {
        melds.extend((0..ranks - 2).map(|start| {
            let mut v = vec![0u8; ranks];
            v[start..start + 3].fill(1);
            v
        }));
    }

    let mut patterns: BTreeMap<u8, BTreeSet<Vec<u8>>> = BTreeMap::new();
    let mut current = vec![0u8; ranks];
    collect_meld_combinations(&melds, 0, MAX_MELDS, &mut current, &mut |base: &[u8]| {
        insert_pattern(&mut patterns, base.to_vec());
        for pair_rank in 0..ranks {
            if base[pair_rank] + 2 <= MAX_COUNT {
                let mut with_pair = base.to_vec();
                with_pair[pair_rank] += 2;
                insert_pattern(&mut patterns, with_pair);
            }
        }
    });
    patterns
}

fn insert_pattern(patterns: &mut BTreeMap<u8, BTreeSet<Vec<u8>>>, counts: Vec<u8>) {
    let total = counts.iter().sum();
    patterns.entry(total).or_default().insert(counts);
}

/// Visits every multiset of at most `remaining` melds drawn from
/// `melds[first..]` that keeps each rank within four copies.
fn collect_meld_combinations(
    melds: &[Vec<u8>],
    first: usize,
    remaining: u8,
    current: &mut [u8],
    visit: &mut impl FnMut(&[u8]),
) {
    visit(current);
    if remaining == 0 {
        return;
    }
    for (offset, meld) in melds[first..].iter().enumerate() {
        if current.iter().zip(meld).any(|(&c, &m)| c + m > MAX_COUNT) {
            continue;
        }
        for (c, &m) in current.iter_mut().zip(meld) {
            *c += m;
        }
        collect_meld_combinations(melds, first + offset, remaining - 1, current, visit);
        for (c, &m) in current.iter_mut().zip(meld) {
            *c -= m;
        }
    }
}

// ---------------------------------------------------------------------------
// Distances
// ---------------------------------------------------------------------------

/// Tiles `hand` is missing to reach `target`. Surplus tiles never count.
#[inline]
pub fn distance(hand: &[u8], target: &[u8]) -> u8 {
    hand.iter()
        .zip(target)
        .map(|(&h, &t)| t.saturating_sub(h))
        .sum()
}

/// Minimum [`distance`] from every vector of the group to the closest of
/// `targets`, indexed by [`encode`]. Vectors no target can reach keep
/// `u8::MAX`, which only happens when `targets` is empty.
pub fn distance_field<'a>(kind: GroupKind, targets: impl IntoIterator<Item = &'a Vec<u8>>) -> Vec<u8> {
    let ranks = kind.ranks();
    let place: Vec<usize> = (0..ranks).map(|r| 5usize.pow((ranks - 1 - r) as u32)).collect();
    let mut dist = vec![u8::MAX; kind.space_size()];
    let mut queue: VecDeque<(u8, usize)> = VecDeque::new();

    for target in targets {
        let index = encode(target);
        dist[index] = 0;
        queue.push_back((0, index));
    }

    while let Some((d, index)) = queue.pop_front() {
        if d > dist[index] {
            continue;
        }
        for &p in &place {
            let digit = (index / p) % 5;
            if digit < MAX_COUNT as usize {
                let next = index + p;
                if dist[next] > d {
                    dist[next] = d;
                    queue.push_front((d, next));
                }
            }
            if digit > 0 {
                let next = index - p;
                if dist[next] > d + 1 {
                    dist[next] = d + 1;
                    queue.push_back((d + 1, next));
                }
            }
        }
    }
    dist
}

/// Reference minimum by direct enumeration over targets. Slow; used to
/// cross-check [`distance_field`].
pub fn naive_min_distance<'a>(hand: &[u8], targets: impl IntoIterator<Item = &'a Vec<u8>>) -> u8 {
    targets
        .into_iter()
        .map(|t| distance(hand, t))
        .min()
        .unwrap_or(u8::MAX)
}

// ---------------------------------------------------------------------------
// Agari partitions
// ---------------------------------------------------------------------------

/// Per-group tile totals `[manzu, pinzu, souzu, honor]` of a finished hand.
pub type AgariPartition = [u8; 4];

/// All partitions of a hand with `called_melds` melds already exposed: each
/// group total is drawn from [`TARGET_COUNTS`], the totals sum to
/// `14 - 3 * called_melds`, and exactly one group carries the pair (the
/// remainders mod 3 sum to 2).
pub fn agari_partitions(called_melds: u8) -> Vec<AgariPartition> {
    let Some(total) = MAX_HAND_TILES.checked_sub(3 * called_melds) else {
        return Vec::new();
    };
    let mut partitions = Vec::new();
    for &m in &TARGET_COUNTS {
        for &p in &TARGET_COUNTS {
            for &s in &TARGET_COUNTS {
                for &z in &TARGET_COUNTS {
                    let parts = [m, p, s, z];
                    let sum: u8 = parts.iter().sum();
                    let remainders: u8 = parts.iter().map(|c| c % 3).sum();
                    if sum == total && remainders == 2 {
                        partitions.push(parts);
                    }
                }
            }
        }
    }
    partitions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_counts_are_meld_and_pair_sums() {
        let mut expected: Vec<u8> = (0..=MAX_MELDS)
            .flat_map(|m| (0..=MAX_PAIRS).map(move |p| 3 * m + 2 * p))
            .collect();
        expected.sort_unstable();
        assert_eq!(expected, TARGET_COUNTS.to_vec());
    }

    #[test]
    fn encode_decode_inverse() {
        let counts = vec![4, 0, 1, 2, 3, 0, 0, 1, 4];
        let index = encode(&counts);
        assert_eq!(decode(index, 9), counts);
        assert_eq!(encode(&[0; 7]), 0);
        assert_eq!(encode(&[4; 7]), GroupKind::Honor.space_size() - 1);
    }

    #[test]
    fn honor_patterns_have_no_runs() {
        let patterns = win_patterns(GroupKind::Honor);
        for set in patterns.values() {
            for counts in set {
                assert!(
                    counts.iter().all(|&c| c == 0 || c == 2 || c == 3),
                    "{counts:?} is not a triplet/pair shape"
                );
            }
        }
        // One triplet: 7 choices.
        assert_eq!(patterns[&3].len(), 7);
        // One pair: 7 choices.
        assert_eq!(patterns[&2].len(), 7);
    }

    #[test]
    fn number_patterns_include_runs() {
        let patterns = win_patterns(GroupKind::Number);
        // One meld: 9 triplets + 7 runs.
        assert_eq!(patterns[&3].len(), 16);
        assert!(patterns[&3].contains(&vec![1, 1, 1, 0, 0, 0, 0, 0, 0]));
        assert!(patterns[&14].contains(&vec![3, 1, 1, 1, 1, 1, 1, 1, 4]));
        for (total, set) in &patterns {
            assert!(target_slot(*total).is_some(), "unexpected total {total}");
            for counts in set {
                assert!(counts.iter().all(|&c| c <= 4));
                assert_eq!(counts.iter().sum::<u8>(), *total);
            }
        }
    }

    #[test]
    fn distance_ignores_surplus() {
        assert_eq!(distance(&[3, 0, 0], &[1, 1, 1]), 2);
        assert_eq!(distance(&[1, 1, 1], &[1, 1, 1]), 0);
        assert_eq!(distance(&[0, 0, 0], &[0, 3, 0]), 3);
    }

    #[test]
    fn bfs_matches_enumeration_on_honors() {
        let patterns = win_patterns(GroupKind::Honor);
        for (&total, targets) in &patterns {
            let field = distance_field(GroupKind::Honor, targets);
            for (index, counts) in reachable_vectors(GroupKind::Honor).step_by(37) {
                assert_eq!(
                    field[index],
                    naive_min_distance(&counts, targets),
                    "honor {counts:?} total {total}"
                );
            }
        }
    }

    #[test]
    fn bfs_matches_enumeration_on_number_samples() {
        let patterns = win_patterns(GroupKind::Number);
        let targets = &patterns[&8];
        let field = distance_field(GroupKind::Number, targets);
        for (index, counts) in reachable_vectors(GroupKind::Number).step_by(4099) {
            assert_eq!(field[index], naive_min_distance(&counts, targets), "{counts:?}");
        }
    }

    #[test]
    fn closed_hand_partitions() {
        let partitions = agari_partitions(0);
        assert!(!partitions.is_empty());
        for p in &partitions {
            assert_eq!(p.iter().sum::<u8>(), 14);
            assert_eq!(p.iter().filter(|&&c| c % 3 == 2).count(), 1, "{p:?}");
        }
        // 5 + 2 + 2 + 5 carries three pairs' worth of remainders.
        assert!(!partitions.contains(&[5, 2, 2, 5]));
        assert!(partitions.contains(&[14, 0, 0, 0]));
        assert!(partitions.contains(&[3, 3, 6, 2]));
    }

    #[test]
    fn partitions_shrink_with_called_melds() {
        assert!(agari_partitions(4).contains(&[0, 0, 0, 2]));
        assert!(agari_partitions(4).iter().all(|p| p.iter().sum::<u8>() == 2));
        assert!(agari_partitions(5).is_empty());
    }
}
