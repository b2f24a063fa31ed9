//! The frame arena and the sweep sides it contributes.

use crate::geom::Rect;

/// An index into our frame arena.
///
/// Throughout this library, we assign identities to frames, so that we may
/// consider frames as different even if they cover the same rectangle. The
/// index is assigned monotonically and stays stable for the lifetime of a
/// sweep; bracket ordering uses it as the final tie-break, which is what
/// makes sweeps over coinciding rectangles deterministic.
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, serde::Serialize)]
pub struct FrameIdx(pub usize);

impl std::fmt::Debug for FrameIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "f_{}", self.0)
    }
}

/// Whether a side is the entry or the exit of its frame along the sweep axis.
///
/// The derived ordering puts `Enter` before `Exit`, so that at a shared
/// coordinate the opening side of one frame sorts before the closing side of
/// another. This is what makes vertically adjacent frames count as
/// intersecting in touching mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub enum SideRole {
    /// The side at the frame's smallest vertical coordinate.
    Enter,
    /// The side at the frame's largest vertical coordinate.
    Exit,
}

/// One horizontal edge of a frame: fixed along the sweep axis, spanning an
/// interval on the transversal axis.
///
/// Sides are immutable and precomputed by [`Frames`]. Their `Ord` impl is the
/// explicit sort key of the sweep: `(coord, role, from, to, frame)`, with
/// `Enter` before `Exit`. The driver additionally groups equal-coordinate
/// runs of this ordering; see [`crate::IntersectionMode`].
#[derive(Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Side {
    coord: i64,
    from: i64,
    to: i64,
    role: SideRole,
    frame: FrameIdx,
}

impl std::fmt::Debug for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?} {:?} side {}..{} at {}",
            self.frame,
            self.role,
            self.from,
            self.to,
            self.coord
        )
    }
}

impl Ord for Side {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.coord, self.role, self.from, self.to, self.frame).cmp(&(
            other.coord,
            other.role,
            other.from,
            other.to,
            other.frame,
        ))
    }
}

impl PartialOrd for Side {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Side {
    /// The side's position along the sweep axis.
    pub fn coord(&self) -> i64 {
        self.coord
    }

    /// The smallest transversal coordinate the side controls.
    pub fn from(&self) -> i64 {
        self.from
    }

    /// The largest transversal coordinate the side controls.
    pub fn to(&self) -> i64 {
        self.to
    }

    /// Entry or exit?
    pub fn role(&self) -> SideRole {
        self.role
    }

    /// The frame this side belongs to.
    pub fn frame(&self) -> FrameIdx {
        self.frame
    }

    /// Is this the entry side of its frame?
    pub fn is_enter(&self) -> bool {
        self.role == SideRole::Enter
    }

    /// Is this the exit side of its frame?
    pub fn is_exit(&self) -> bool {
        self.role == SideRole::Exit
    }
}

/// An arena of frames.
///
/// Frames are indexed by [`FrameIdx`] and can be retrieved by indexing (i.e.
/// with square brackets). Adding rectangles also builds the sorted sweep-side
/// sequence consumed by [`crate::Sweeper`]; frames and sides are never
/// mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct Frames {
    rects: Vec<Rect>,
    /// Both sides of every frame, sorted ascending by the `Side` ordering.
    sides: Vec<Side>,
}

impl Frames {
    /// The number of frames in this arena.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Iterate over all indices that can be used to index into this arena.
    pub fn indices(&self) -> impl Iterator<Item = FrameIdx> {
        (0..self.rects.len()).map(FrameIdx)
    }

    /// Add a batch of rectangles to this arena.
    ///
    /// The side sequence is re-sorted once at the end of the batch, so this
    /// is much faster than adding rectangles one at a time.
    pub fn add_rects(&mut self, rects: impl IntoIterator<Item = Rect>) {
        for rect in rects {
            let frame = FrameIdx(self.rects.len());
            self.sides.push(Side {
                coord: rect.y_min(),
                from: rect.x_min(),
                to: rect.x_max(),
                role: SideRole::Enter,
                frame,
            });
            self.sides.push(Side {
                coord: rect.y_max(),
                from: rect.x_min(),
                to: rect.x_max(),
                role: SideRole::Exit,
                frame,
            });
            self.rects.push(rect);
        }
        self.sides.sort();
    }

    /// Construct an arena from a collection of rectangles.
    pub fn from_rects(rects: impl IntoIterator<Item = Rect>) -> Self {
        let mut ret = Self::default();
        ret.add_rects(rects);
        ret
    }

    /// Both sides of every frame, sorted ascending.
    ///
    /// Every frame contributes exactly one enter and one exit side, so the
    /// sequence is balanced by construction.
    pub fn sides(&self) -> &[Side] {
        &self.sides
    }
}

impl std::ops::Index<FrameIdx> for Frames {
    type Output = Rect;

    fn index(&self, index: FrameIdx) -> &Self::Output {
        &self.rects[index.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x_min: i64, x_max: i64, y_min: i64, y_max: i64) -> Rect {
        Rect::new(x_min, x_max, y_min, y_max).unwrap()
    }

    #[test]
    fn sides_are_sorted_and_balanced() {
        let frames = Frames::from_rects([
            rect(0, 2, 1, 5),
            rect(-3, 0, -1, 1),
            rect(4, 8, 1, 1),
        ]);
        let sides = frames.sides();
        assert_eq!(sides.len(), 6);
        assert!(sides.windows(2).all(|w| w[0] < w[1]));

        let enters = sides.iter().filter(|s| s.is_enter()).count();
        let exits = sides.iter().filter(|s| s.is_exit()).count();
        assert_eq!(enters, exits);
    }

    #[test]
    fn enter_sorts_before_exit_at_shared_coord() {
        // Frame 0 exits at y=1 exactly where frame 1 enters.
        let frames = Frames::from_rects([rect(0, 1, 0, 1), rect(0, 1, 1, 2)]);
        let sides = frames.sides();
        assert_eq!(sides[1].coord(), 1);
        assert_eq!(sides[2].coord(), 1);
        assert!(sides[1].is_enter());
        assert_eq!(sides[1].frame(), FrameIdx(1));
        assert!(sides[2].is_exit());
        assert_eq!(sides[2].frame(), FrameIdx(0));
    }

    #[test]
    fn id_breaks_ties_between_coinciding_frames() {
        let frames = Frames::from_rects([rect(0, 1, 0, 1), rect(0, 1, 0, 1)]);
        let sides = frames.sides();
        assert_eq!(sides[0].frame(), FrameIdx(0));
        assert_eq!(sides[1].frame(), FrameIdx(1));
        assert!(sides[0] < sides[1]);
    }
}
