//! The live bracket set: the ordered brackets of all currently active frames.

use super::bracket::{Bracket, BracketKey};
use crate::{frames::Side, treevec::TreeVec, InternalError};

/// Branching factor of the backing tree. Live sets are usually small, so most
/// of the time the whole set is a single leaf node.
const BRANCHING: usize = 64;

/// The ordered collection of brackets for all frames whose vertical extent
/// contains the sweep coordinate.
///
/// The set always holds exactly two brackets per active frame (its open and
/// close), and is empty before the sweep starts and after it completes. All
/// depth bookkeeping happens here: brackets are stored by value in an indexed
/// balanced tree and nothing outside this type can mutate a depth.
#[derive(Clone, Debug)]
pub struct BracketSet {
    brackets: TreeVec<Bracket, BRANCHING>,
}

impl BracketSet {
    pub(crate) fn new() -> Self {
        BracketSet {
            brackets: TreeVec::new(),
        }
    }

    /// The number of live brackets (twice the number of active frames).
    pub fn len(&self) -> usize {
        self.brackets.len()
    }

    /// Is no frame currently active?
    pub fn is_empty(&self) -> bool {
        self.brackets.is_empty()
    }

    /// All live brackets, in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Bracket> + '_ {
        self.brackets.iter()
    }

    /// Index of the first bracket whose key is `>= key`.
    fn lower_bound(&self, key: BracketKey) -> usize {
        self.brackets.partition_point(|b| b.key() < key)
    }

    /// Index of the first bracket whose key is `> key`.
    fn upper_bound(&self, key: BracketKey) -> usize {
        self.brackets.partition_point(|b| b.key() <= key)
    }

    pub(crate) fn contains(&self, key: BracketKey) -> bool {
        let idx = self.lower_bound(key);
        self.brackets.get(idx).map(|b| b.key()) == Some(key)
    }

    /// Makes the frame of `side` live, inserting its two brackets.
    ///
    /// The open bracket's depth starts at its predecessor's depth plus one
    /// (or one, with no predecessor); every bracket strictly inside the new
    /// span is incremented, and the close bracket ends one below the final
    /// nesting. Locating the span is O(log n); the walk touches only the k
    /// brackets nested inside the new interval, which stays small for
    /// realistic per-scanline overlap counts.
    pub(crate) fn insert(&mut self, side: &Side) {
        let open = BracketKey::open(side);
        let close = BracketKey::close(side);
        let lo = self.lower_bound(open);
        let hi = self.lower_bound(close);

        let open_depth = if lo == 0 {
            1
        } else {
            self.brackets[lo - 1].following_depth() + 1
        };
        let mut nesting = open_depth;
        for bracket in self.brackets.range_mut(lo..hi) {
            bracket.raise();
            nesting = bracket.following_depth();
        }
        // Inserting the close bracket first keeps `lo` valid.
        self.brackets.insert(hi, Bracket::new(close, nesting - 1));
        self.brackets.insert(lo, Bracket::new(open, open_depth));

        #[cfg(feature = "slow-asserts")]
        self.check_consistency();
    }

    /// Removes the two brackets of `side`'s frame.
    ///
    /// Both brackets must be live; a missing bracket means the driver's
    /// add/remove bookkeeping is broken, and is reported rather than ignored.
    pub(crate) fn remove(&mut self, side: &Side) -> Result<(), InternalError> {
        let open = BracketKey::open(side);
        let close = BracketKey::close(side);

        let lo = self.lower_bound(open);
        if self.brackets.get(lo).map(|b| b.key()) != Some(open) {
            return Err(InternalError::MissingBracket {
                frame: open.frame,
                role: open.role,
            });
        }
        let hi = self.lower_bound(close);
        if self.brackets.get(hi).map(|b| b.key()) != Some(close) {
            return Err(InternalError::MissingBracket {
                frame: close.frame,
                role: close.role,
            });
        }

        for bracket in self.brackets.range_mut(lo + 1..hi) {
            bracket.lower();
        }
        // Higher index first, so the lower one stays valid.
        self.brackets.remove(hi);
        self.brackets.remove(lo);

        #[cfg(feature = "slow-asserts")]
        self.check_consistency();
        Ok(())
    }

    /// The ordered sub-collection of brackets whose positions fall within
    /// `side`'s transversal span, inclusive on both ends.
    ///
    /// This is every bracket of every frame whose span overlaps the given
    /// side's span at the current sweep coordinate.
    pub fn intersections(&self, side: &Side) -> impl Iterator<Item = &Bracket> + '_ {
        let lo = self.lower_bound(BracketKey::open(side));
        let hi = self.upper_bound(BracketKey::close(side));
        self.brackets.range(lo..hi)
    }

    /// The last bracket strictly before `side`'s span, if any.
    ///
    /// Together with [`BracketSet::first_after_right`] this lets a consumer
    /// detect adjacency: covered intervals that touch the span exactly at a
    /// boundary.
    pub fn last_before_left(&self, side: &Side) -> Option<&Bracket> {
        let lo = self.lower_bound(BracketKey::open(side));
        (lo > 0).then(|| &self.brackets[lo - 1])
    }

    /// The first bracket strictly after `side`'s span, if any.
    pub fn first_after_right(&self, side: &Side) -> Option<&Bracket> {
        let hi = self.upper_bound(BracketKey::close(side));
        self.brackets.get(hi)
    }

    /// The smallest transversal position connected to `side`'s span by
    /// continuous coverage.
    ///
    /// Walks left from the span's open bracket until the covering depth drops
    /// to zero. Meaningful only in touching mode, where the side's own frame
    /// is live while its side is processed.
    pub fn max_left_in_union(&self, side: &Side) -> i64 {
        let lo = self.lower_bound(BracketKey::open(side));
        let mut last = side.from();
        for idx in (0..lo).rev() {
            let bracket = &self.brackets[idx];
            if bracket.following_depth() == 0 {
                return last;
            }
            last = bracket.x();
        }
        last
    }

    /// The largest transversal position connected to `side`'s span by
    /// continuous coverage; the mirror of [`BracketSet::max_left_in_union`].
    pub fn min_right_in_union(&self, side: &Side) -> i64 {
        let lo = self.lower_bound(BracketKey::close(side));
        for bracket in self.brackets.range(lo..self.brackets.len()) {
            if bracket.following_depth() == 0 {
                return bracket.x();
            }
        }
        side.to()
    }

    /// Re-derives every depth from scratch and compares.
    ///
    /// The following covering depth of a bracket must equal the number of
    /// opens minus closes up to and including it; the running count must end
    /// at zero.
    #[cfg(any(test, feature = "slow-asserts"))]
    pub(crate) fn check_consistency(&self) {
        use super::bracket::BracketRole;

        let mut count = 0u32;
        let mut prev: Option<BracketKey> = None;
        for bracket in self.brackets.iter() {
            if let Some(prev) = prev {
                assert!(prev < bracket.key(), "live set out of order");
            }
            prev = Some(bracket.key());
            match bracket.role() {
                BracketRole::Open => count += 1,
                BracketRole::Close => count -= 1,
            }
            assert_eq!(
                bracket.following_depth(),
                count,
                "depth mismatch at {bracket:?}"
            );
        }
        assert_eq!(count, 0, "unbalanced live set");
    }
}
