#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

mod frames;
mod geom;
pub mod sweep;

pub use frames::{FrameIdx, Frames, Side, SideRole};
pub use geom::Rect;
pub use sweep::{Bracket, BracketRole, BracketSet, SweepState, Sweeper};

// pub so that external fuzz targets can reach it, but it's really private
#[doc(hidden)]
pub mod treevec;

/// Decides whether frames that merely touch count as intersecting.
///
/// Two frames *touch* when they share a boundary coordinate without any area
/// overlap. The mode changes the moment at which same-coordinate sides are
/// added to and removed from the live bracket set, so it affects exactly the
/// degenerate configurations where the distinction matters.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum IntersectionMode {
    /// Only genuine area overlap counts as intersection.
    ///
    /// While an enter side is current, the live set describes coverage of the
    /// strip just above the sweep coordinate; while an exit side is current,
    /// the strip just below it. The side's own frame is absent in both cases.
    Strict,
    /// Touching counts as intersecting.
    ///
    /// While any side at coordinate `c` is current, every frame whose
    /// vertical extent contains `c` is live, including the side's own frame.
    Touching,
}

/// The input frames or sides were faulty, or the sweep was misused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// A rectangle had a minimum bound greater than its maximum bound.
    InvalidRect {
        /// The offending bounds, in `(min, max)` order as supplied.
        bounds: (i64, i64),
        /// `"x"` or `"y"`.
        axis: &'static str,
    },
    /// The side sequence was empty.
    NoSides,
    /// The side sequence was not sorted ascending.
    UnsortedSides {
        /// Index of the first side that sorts before its predecessor.
        index: usize,
    },
    /// `advance()` was called again after the sweep finished.
    SweepExhausted,
    /// The sweep's internal bookkeeping was inconsistent.
    ///
    /// This is a defect in the depth-bookkeeping algorithm, never a
    /// consequence of caller input. Tests assert that it cannot occur for
    /// valid input.
    Internal(InternalError),
}

/// An internal-consistency violation; see [`Error::Internal`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InternalError {
    /// A bracket that should have been live was not found on removal.
    MissingBracket {
        /// The frame whose bracket was expected.
        frame: FrameIdx,
        /// Which of the frame's two brackets was missing.
        role: BracketRole,
    },
    /// The live bracket set was not empty when the sweep completed.
    NonEmptyAtEnd {
        /// Number of brackets left over.
        remaining: usize,
    },
}

impl From<InternalError> for Error {
    fn from(e: InternalError) -> Self {
        Error::Internal(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidRect { bounds, axis } => write!(
                f,
                "invalid rectangle: {axis} bounds {}..{} are reversed",
                bounds.0, bounds.1
            ),
            Error::NoSides => write!(f, "the side sequence was empty"),
            Error::UnsortedSides { index } => {
                write!(f, "side {index} sorts before its predecessor")
            }
            Error::SweepExhausted => write!(f, "advance() called after the sweep finished"),
            Error::Internal(e) => write!(f, "internal error: {e}"),
        }
    }
}

impl std::fmt::Display for InternalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InternalError::MissingBracket { frame, role } => {
                write!(f, "{role:?} bracket of {frame:?} missing on removal")
            }
            InternalError::NonEmptyAtEnd { remaining } => {
                write!(f, "{remaining} brackets left live at the end of the sweep")
            }
        }
    }
}

impl std::error::Error for Error {}
