//! The driver that walks the side sequence and keeps the live set current.

use super::bracket::Bracket;
use super::bracket_set::BracketSet;
use crate::frames::{Frames, Side};
use crate::{Error, InternalError, IntersectionMode};

#[cfg(feature = "slow-asserts")]
use super::bracket::BracketKey;

/// Where a [`Sweeper`] is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SweepState {
    /// `advance()` has not been called yet; there is no current side.
    NotStarted,
    /// The sweep is positioned at a side.
    Running,
    /// `advance()` has returned `false`; the live set is empty.
    Finished,
}

/// Sides belonging to the same group become live and dead together, at group
/// boundaries. Touching mode groups by coordinate alone; strict mode splits
/// each coordinate into its enter run and its exit run.
fn same_group(a: &Side, b: &Side, strict: bool) -> bool {
    a.coord() == b.coord() && (!strict || a.role() == b.role())
}

/// A sweep over the sorted side sequence of a frame arena.
///
/// Each call to [`Sweeper::advance`] moves to the next side and, when a group
/// boundary is crossed, updates the live [`BracketSet`] according to the
/// configured [`IntersectionMode`]:
///
/// - *touching*: on leaving a coordinate, remove that coordinate's exit
///   sides; on reaching a new coordinate, add its enter sides. A frame is
///   live for every side whose coordinate its vertical extent contains,
///   endpoints included.
/// - *strict*: on leaving an enter run, add its sides; on reaching an exit
///   run, remove its sides. Additions are deferred and removals brought
///   forward by half a group, so the live set describes the open strip next
///   to the coordinate rather than the coordinate itself.
///
/// In both modes the live set is empty once the sweep finishes.
#[derive(Debug)]
pub struct Sweeper<'a> {
    sides: &'a [Side],
    mode: IntersectionMode,
    state: SweepState,
    /// Position of the current side; meaningful only while `Running`.
    idx: usize,
    current: Option<Side>,
    live: BracketSet,
}

impl<'a> Sweeper<'a> {
    /// Create a sweep over all sides of `frames`.
    pub fn new(frames: &'a Frames, mode: IntersectionMode) -> Result<Self, Error> {
        Self::from_sides(frames.sides(), mode)
    }

    /// Create a sweep over an explicit side sequence.
    ///
    /// The sequence must be non-empty and sorted ascending; both conditions
    /// are checked here, once, rather than trusted during the sweep.
    pub fn from_sides(sides: &'a [Side], mode: IntersectionMode) -> Result<Self, Error> {
        if sides.is_empty() {
            return Err(Error::NoSides);
        }
        for (i, w) in sides.windows(2).enumerate() {
            if w[1] < w[0] {
                return Err(Error::UnsortedSides { index: i + 1 });
            }
        }
        Ok(Sweeper {
            sides,
            mode,
            state: SweepState::NotStarted,
            idx: 0,
            current: None,
            live: BracketSet::new(),
        })
    }

    /// Move to the next side, updating the live set at group boundaries.
    ///
    /// Returns `true` while a current side exists and `false` exactly once,
    /// when the sequence is exhausted; calling again after that is an
    /// [`Error::SweepExhausted`]. An `Err(Error::Internal(_))` means the
    /// bookkeeping itself failed and the sweep should be discarded.
    pub fn advance(&mut self) -> Result<bool, Error> {
        let next_idx = match self.state {
            SweepState::NotStarted => 0,
            SweepState::Running => self.idx + 1,
            SweepState::Finished => return Err(Error::SweepExhausted),
        };
        let sides = self.sides;
        let next = sides.get(next_idx).copied();
        let strict = self.mode == IntersectionMode::Strict;

        let boundary = match (&self.current, &next) {
            (Some(cur), Some(next)) => !same_group(cur, next, strict),
            _ => true,
        };
        if boundary {
            // Close out the group we are leaving. Touching mode kept its
            // exiting frames alive until now; strict mode owes it the frames
            // that entered there.
            if let Some(cur) = self.current {
                let mut start = self.idx;
                while start > 0 && same_group(&sides[start - 1], &cur, strict) {
                    start -= 1;
                }
                for side in &sides[start..=self.idx] {
                    if strict {
                        if side.is_enter() {
                            self.live.insert(side);
                        }
                    } else if side.is_exit() {
                        self.live.remove(side)?;
                    }
                }
            }
            // Open the group we are entering.
            if let Some(first) = next {
                let mut end = next_idx;
                while end < sides.len() && same_group(&sides[end], &first, strict) {
                    end += 1;
                }
                for side in &sides[next_idx..end] {
                    if strict {
                        if side.is_exit() {
                            self.live.remove(side)?;
                        }
                    } else if side.is_enter() {
                        self.live.insert(side);
                    }
                }
            }
        }

        self.idx = next_idx;
        self.current = next;
        match next {
            Some(_) => {
                self.state = SweepState::Running;
                Ok(true)
            }
            None => {
                self.state = SweepState::Finished;
                if !self.live.is_empty() {
                    return Err(InternalError::NonEmptyAtEnd {
                        remaining: self.live.len(),
                    }
                    .into());
                }
                Ok(false)
            }
        }
    }

    /// The side the sweep is positioned at, or `None` before the first
    /// `advance()` and after the last.
    pub fn current_side(&self) -> Option<&Side> {
        self.current.as_ref()
    }

    /// Where the sweep is in its lifecycle.
    pub fn state(&self) -> SweepState {
        self.state
    }

    /// The sweep coordinate of the current side, if there is one.
    pub fn coord(&self) -> Option<i64> {
        self.current.map(|s| s.coord())
    }

    /// The live bracket set, for direct inspection.
    pub fn live(&self) -> &BracketSet {
        &self.live
    }

    // unwrap: queries are only meaningful at a side, so misuse is a caller
    // bug rather than a recoverable condition.
    fn current(&self) -> &Side {
        self.current
            .as_ref()
            .expect("no current side; call advance() first")
    }

    /// All live brackets within the current side's transversal span,
    /// inclusive on both ends.
    ///
    /// In touching mode this always includes the current frame's own two
    /// brackets. Calling this again without advancing yields the same
    /// brackets with the same depths.
    ///
    /// # Panics
    ///
    /// Panics if there is no current side.
    pub fn current_intersections(&self) -> impl Iterator<Item = &Bracket> + '_ {
        let side = self.current();
        #[cfg(feature = "slow-asserts")]
        if self.mode == IntersectionMode::Touching {
            assert!(self.live.contains(BracketKey::open(side)));
            assert!(self.live.contains(BracketKey::close(side)));
        }
        self.live.intersections(side)
    }

    /// The last live bracket strictly left of the current side's span.
    ///
    /// # Panics
    ///
    /// Panics if there is no current side.
    pub fn last_intersection_before_left(&self) -> Option<&Bracket> {
        self.live.last_before_left(self.current())
    }

    /// The first live bracket strictly right of the current side's span.
    ///
    /// # Panics
    ///
    /// Panics if there is no current side.
    pub fn first_intersection_after_right(&self) -> Option<&Bracket> {
        self.live.first_after_right(self.current())
    }

    /// The smallest transversal position connected to the current side's
    /// span by continuous coverage.
    ///
    /// # Panics
    ///
    /// Panics if there is no current side.
    pub fn max_left_in_union(&self) -> i64 {
        debug_assert!(
            self.mode == IntersectionMode::Touching,
            "union runs require touching mode"
        );
        self.live.max_left_in_union(self.current())
    }

    /// The largest transversal position connected to the current side's
    /// span by continuous coverage.
    ///
    /// # Panics
    ///
    /// Panics if there is no current side.
    pub fn min_right_in_union(&self) -> i64 {
        debug_assert!(
            self.mode == IntersectionMode::Touching,
            "union runs require touching mode"
        );
        self.live.min_right_in_union(self.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BracketRole, FrameIdx, Rect, SideRole};
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    fn rect(x_min: i64, x_max: i64, y_min: i64, y_max: i64) -> Rect {
        Rect::new(x_min, x_max, y_min, y_max).unwrap()
    }

    /// Indices of the frames currently live, ascending.
    fn live_frames(sweeper: &Sweeper) -> Vec<usize> {
        let mut v: Vec<usize> = sweeper
            .live()
            .iter()
            .filter(|b| b.role() == BracketRole::Open)
            .map(|b| b.frame().0)
            .collect();
        v.sort();
        v
    }

    #[test]
    fn two_identical_squares() {
        let frames = Frames::from_rects([rect(0, 1, 0, 1), rect(0, 1, 0, 1)]);
        let mut sweeper = Sweeper::new(&frames, IntersectionMode::Touching).unwrap();
        assert_eq!(sweeper.state(), SweepState::NotStarted);

        // Both enter sides at coordinate 0: the whole arena becomes live at
        // the first step and the overlap reaches depth 2.
        assert!(sweeper.advance().unwrap());
        assert_eq!(sweeper.coord(), Some(0));
        assert_eq!(live_frames(&sweeper), vec![0, 1]);
        let depths: Vec<u32> = sweeper
            .current_intersections()
            .map(|b| b.following_depth())
            .collect();
        // Frame 1's close bracket sorts after frame 0's and falls outside the
        // inclusive query range.
        assert_eq!(depths, vec![1, 2, 1]);

        assert!(sweeper.advance().unwrap());
        assert!(sweeper.advance().unwrap());
        assert_eq!(sweeper.coord(), Some(1));
        // Touching: the exiting frames stay live until we leave coordinate 1.
        assert_eq!(live_frames(&sweeper), vec![0, 1]);
        assert!(sweeper.advance().unwrap());

        assert!(!sweeper.advance().unwrap());
        assert_eq!(sweeper.state(), SweepState::Finished);
        assert!(sweeper.live().is_empty());
        assert_matches!(sweeper.advance(), Err(Error::SweepExhausted));
    }

    #[test]
    fn partial_overlap_sees_neighbor() {
        // A = [0,2]^2 and B = [1,3]^2 overlap in a unit square.
        let frames = Frames::from_rects([rect(0, 2, 0, 2), rect(1, 3, 1, 3)]);
        let mut sweeper = Sweeper::new(&frames, IntersectionMode::Touching).unwrap();
        assert!(sweeper.advance().unwrap());
        assert!(sweeper.advance().unwrap());

        let side = sweeper.current_side().unwrap();
        assert_eq!((side.frame(), side.role()), (FrameIdx(1), SideRole::Enter));
        let hit_frames: Vec<FrameIdx> = sweeper.current_intersections().map(|b| b.frame()).collect();
        assert!(hit_frames.contains(&FrameIdx(0)));
        assert!(hit_frames.contains(&FrameIdx(1)));
    }

    #[test]
    fn partial_overlap_step_log() {
        let frames = Frames::from_rects([rect(0, 2, 0, 2), rect(1, 3, 1, 3)]);
        let mut sweeper = Sweeper::new(&frames, IntersectionMode::Touching).unwrap();
        let mut log = Vec::new();
        while sweeper.advance().unwrap() {
            let brackets: Vec<String> = sweeper.live().iter().map(|b| format!("{b:?}")).collect();
            log.push(format!(
                "{:?}: {}",
                sweeper.current_side().unwrap(),
                brackets.join(", ")
            ));
        }
        insta::assert_debug_snapshot!(log, @r#"
        [
            "f_0 Enter side 0..2 at 0: open[f_0 @ 0, depth 1], close[f_0 @ 2, depth 0]",
            "f_1 Enter side 1..3 at 1: open[f_0 @ 0, depth 1], open[f_1 @ 1, depth 2], close[f_0 @ 2, depth 1], close[f_1 @ 3, depth 0]",
            "f_0 Exit side 0..2 at 2: open[f_0 @ 0, depth 1], open[f_1 @ 1, depth 2], close[f_0 @ 2, depth 1], close[f_1 @ 3, depth 0]",
            "f_1 Exit side 1..3 at 3: open[f_1 @ 1, depth 1], close[f_1 @ 3, depth 0]",
        ]
        "#);
    }

    #[test]
    fn vertically_touching_frames_by_mode() {
        // B sits exactly on top of A: they share the line y = 1.
        let frames = Frames::from_rects([rect(0, 2, 0, 1), rect(0, 2, 1, 2)]);

        let mut touching = Sweeper::new(&frames, IntersectionMode::Touching).unwrap();
        assert!(touching.advance().unwrap());
        assert_eq!(live_frames(&touching), vec![0]);
        assert!(touching.advance().unwrap());
        // At the shared coordinate both frames are live, so they intersect.
        assert_eq!(touching.coord(), Some(1));
        assert_eq!(live_frames(&touching), vec![0, 1]);
        let hits: Vec<FrameIdx> = touching.current_intersections().map(|b| b.frame()).collect();
        assert!(hits.contains(&FrameIdx(0)));
        assert!(touching.advance().unwrap());
        assert_eq!(live_frames(&touching), vec![0, 1]);
        assert!(touching.advance().unwrap());
        assert_eq!(live_frames(&touching), vec![1]);
        assert!(!touching.advance().unwrap());

        let mut strict = Sweeper::new(&frames, IntersectionMode::Strict).unwrap();
        // Enter of A: the strip above y = 0 is not covered yet.
        assert!(strict.advance().unwrap());
        assert_eq!(live_frames(&strict), Vec::<usize>::new());
        // Enter of B at y = 1 sees the strip above y = 1: A is gone there,
        // B itself not yet counted.
        assert!(strict.advance().unwrap());
        assert_eq!(
            (
                strict.current_side().unwrap().frame(),
                strict.current_side().unwrap().role()
            ),
            (FrameIdx(1), SideRole::Enter)
        );
        assert_eq!(live_frames(&strict), vec![0]);
        // Exit of A at y = 1 sees the strip below y = 1, which B covers.
        assert!(strict.advance().unwrap());
        assert_eq!(
            (
                strict.current_side().unwrap().frame(),
                strict.current_side().unwrap().role()
            ),
            (FrameIdx(0), SideRole::Exit)
        );
        assert_eq!(live_frames(&strict), vec![1]);
        assert!(strict.advance().unwrap());
        assert_eq!(live_frames(&strict), Vec::<usize>::new());
        assert!(!strict.advance().unwrap());
    }

    #[test]
    fn same_coord_runs_are_mutually_invisible_in_strict() {
        // Two frames spanning the same vertical range, touching in x.
        let frames = Frames::from_rects([rect(0, 1, 0, 2), rect(1, 2, 0, 2)]);

        let mut strict = Sweeper::new(&frames, IntersectionMode::Strict).unwrap();
        // Neither enter side sees the other frame entering at the same
        // coordinate, and neither exit side sees the other frame exiting
        // at the same coordinate.
        while strict.advance().unwrap() {
            assert_eq!(live_frames(&strict), Vec::<usize>::new());
        }

        let mut touching = Sweeper::new(&frames, IntersectionMode::Touching).unwrap();
        assert!(touching.advance().unwrap());
        // Touching in x counts: A's span query reaches B's open bracket.
        let hits: Vec<FrameIdx> = touching.current_intersections().map(|b| b.frame()).collect();
        assert!(hits.contains(&FrameIdx(1)));
    }

    #[test]
    fn zero_height_frame() {
        let frames = Frames::from_rects([rect(0, 1, 5, 5)]);

        let mut touching = Sweeper::new(&frames, IntersectionMode::Touching).unwrap();
        assert!(touching.advance().unwrap());
        assert_eq!(live_frames(&touching), vec![0]);
        assert!(touching.advance().unwrap());
        // Still live while its own exit side is current.
        assert_eq!(live_frames(&touching), vec![0]);
        assert!(!touching.advance().unwrap());
        assert!(touching.live().is_empty());

        // A frame of zero vertical extent covers no open strip at all.
        let mut strict = Sweeper::new(&frames, IntersectionMode::Strict).unwrap();
        while strict.advance().unwrap() {
            assert_eq!(live_frames(&strict), Vec::<usize>::new());
        }
        assert!(strict.live().is_empty());
    }

    #[test]
    fn union_queries() {
        // [0,2] and [2,4] chain into one covered run.
        let frames = Frames::from_rects([rect(0, 2, 0, 1), rect(2, 4, 0, 1)]);
        let mut sweeper = Sweeper::new(&frames, IntersectionMode::Touching).unwrap();
        assert!(sweeper.advance().unwrap());
        assert_eq!(sweeper.max_left_in_union(), 0);
        assert_eq!(sweeper.min_right_in_union(), 4);
        assert!(sweeper.last_intersection_before_left().is_none());
        // Frame 1's close bracket lies strictly beyond frame 0's span.
        let after = sweeper.first_intersection_after_right().unwrap();
        assert_eq!((after.frame(), after.x()), (FrameIdx(1), 4));
    }

    #[test]
    fn repeated_queries_are_stable() {
        let frames = Frames::from_rects([rect(0, 2, 0, 2), rect(1, 3, 1, 3)]);
        let mut sweeper = Sweeper::new(&frames, IntersectionMode::Touching).unwrap();
        assert!(sweeper.advance().unwrap());
        assert!(sweeper.advance().unwrap());

        let snapshot = |s: &Sweeper| -> Vec<(i64, BracketRole, FrameIdx, u32)> {
            s.current_intersections()
                .map(|b| (b.x(), b.role(), b.frame(), b.following_depth()))
                .collect()
        };
        assert_eq!(snapshot(&sweeper), snapshot(&sweeper));
    }

    #[test]
    fn empty_input_is_rejected() {
        let frames = Frames::default();
        assert_matches!(
            Sweeper::new(&frames, IntersectionMode::Touching),
            Err(Error::NoSides)
        );
    }

    #[test]
    fn unsorted_sides_are_rejected() {
        let frames = Frames::from_rects([rect(0, 1, 0, 1), rect(0, 1, 2, 3)]);
        let mut sides = frames.sides().to_vec();
        sides.reverse();
        assert_matches!(
            Sweeper::from_sides(&sides, IntersectionMode::Touching),
            Err(Error::UnsortedSides { index: 1 })
        );
    }

    #[test]
    #[should_panic(expected = "no current side")]
    fn querying_before_advancing_panics() {
        let frames = Frames::from_rects([rect(0, 1, 0, 1)]);
        let sweeper = Sweeper::new(&frames, IntersectionMode::Touching).unwrap();
        let _ = sweeper.current_intersections().count();
    }

    proptest! {
        // Run full sweeps over random arenas in both modes and compare the
        // live set against a direct membership oracle at every step. The
        // sweep must visit every side exactly once and end empty.
        #[test]
        fn live_membership_matches_extents(
            rects in proptest::collection::vec(
                (-20i64..20, 0i64..10, -20i64..20, 0i64..10),
                1..12,
            ),
        ) {
            let frames = Frames::from_rects(
                rects.iter().map(|&(x, w, y, h)| rect(x, x + w, y, y + h)),
            );
            for mode in [IntersectionMode::Touching, IntersectionMode::Strict] {
                let mut sweeper = Sweeper::new(&frames, mode).unwrap();
                let mut steps = 0;
                while sweeper.advance().unwrap() {
                    steps += 1;
                    let side = *sweeper.current_side().unwrap();
                    let c = side.coord();
                    let expected: Vec<usize> = frames
                        .indices()
                        .filter(|&f| {
                            let r = &frames[f];
                            match mode {
                                IntersectionMode::Touching => {
                                    r.y_min() <= c && c <= r.y_max()
                                }
                                IntersectionMode::Strict => match side.role() {
                                    SideRole::Enter => r.y_min() < c && r.y_max() >= c,
                                    SideRole::Exit => r.y_min() <= c && r.y_max() > c,
                                },
                            }
                        })
                        .map(|f| f.0)
                        .collect();
                    prop_assert_eq!(live_frames(&sweeper), expected);
                    sweeper.live().check_consistency();
                }
                prop_assert_eq!(steps, frames.sides().len());
                prop_assert!(sweeper.live().is_empty());
                prop_assert_eq!(sweeper.state(), SweepState::Finished);
            }
        }
    }
}
