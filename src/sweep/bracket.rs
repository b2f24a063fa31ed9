//! Brackets: the events stored in the live set.

use crate::frames::{FrameIdx, Side};

/// Whether a bracket opens or closes its frame's transversal span.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub enum BracketRole {
    /// The bracket at the frame's smallest transversal coordinate.
    Open,
    /// The bracket at the frame's largest transversal coordinate.
    Close,
}

/// The ordering key of a bracket: `(x, open-before-close, frame)`.
///
/// The frame index makes this a strict total order even when many frames
/// share identical boundaries; two distinct brackets never compare equal, so
/// the live set can treat keys as unique.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub(crate) struct BracketKey {
    pub(crate) x: i64,
    pub(crate) role: BracketRole,
    pub(crate) frame: FrameIdx,
}

impl BracketKey {
    /// The key of the bracket opening the span of `side`'s frame.
    pub(crate) fn open(side: &Side) -> Self {
        BracketKey {
            x: side.from(),
            role: BracketRole::Open,
            frame: side.frame(),
        }
    }

    /// The key of the bracket closing the span of `side`'s frame.
    pub(crate) fn close(side: &Side) -> Self {
        BracketKey {
            x: side.to(),
            role: BracketRole::Close,
            frame: side.frame(),
        }
    }
}

/// A live sweep event: one transversal bound of one active frame.
///
/// Brackets are created when their frame enters the live set and discarded
/// when it leaves. The covering depth is owned and mutated exclusively by
/// [`crate::BracketSet`]; it is not part of a bracket's identity, so equality
/// and ordering consider the key alone.
#[derive(Clone, Copy, serde::Serialize)]
pub struct Bracket {
    key: BracketKey,
    depth: u32,
}

impl Bracket {
    pub(crate) fn new(key: BracketKey, depth: u32) -> Self {
        Bracket { key, depth }
    }

    pub(crate) fn key(&self) -> BracketKey {
        self.key
    }

    pub(crate) fn raise(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn lower(&mut self) {
        debug_assert!(self.depth > 0);
        self.depth -= 1;
    }

    /// The bracket's position on the transversal axis.
    pub fn x(&self) -> i64 {
        self.key.x
    }

    /// Opening or closing?
    pub fn role(&self) -> BracketRole {
        self.key.role
    }

    /// The frame this bracket belongs to.
    pub fn frame(&self) -> FrameIdx {
        self.key.frame
    }

    /// The *following covering depth*: the number of simultaneously active
    /// frame spans immediately after this bracket's position in sorted order.
    pub fn following_depth(&self) -> u32 {
        self.depth
    }
}

impl PartialEq for Bracket {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Bracket {}

impl Ord for Bracket {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

impl PartialOrd for Bracket {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Debug for Bracket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let role = match self.key.role {
            BracketRole::Open => "open",
            BracketRole::Close => "close",
        };
        write!(
            f,
            "{}[{:?} @ {}, depth {}]",
            role, self.key.frame, self.key.x, self.depth
        )
    }
}
