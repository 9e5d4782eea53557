//! Hierarchical addresses of boxes in a recursive binary decomposition.
//!
//! A [`SubdivCode`] packs the path from the root box into a single `u64`.
//! The highest set bit is a sentinel marking the root; every bit below it is
//! one split, `0` for the low-side child and `1` for the high-side child,
//! most significant first. The root is `1`, its children `0b10` and `0b11`,
//! their children `0b100..=0b111`, and so on. Depth is therefore the number
//! of bits below the sentinel, which caps a decomposition at 63 levels.

use crate::error::{GeometryError, Result};
use std::fmt;

/// Maximum number of splits a code can record.
pub const MAX_DEPTH: u32 = 63;

/// Which half of a split a child box occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    /// Child adjacent to the lower bound of the split axis
    Low = 0,
    /// Child adjacent to the upper bound of the split axis
    High = 1,
}

/// Path code of a box inside a decomposition tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubdivCode(u64);

impl SubdivCode {
    /// Code of a decomposition root.
    pub const ROOT: SubdivCode = SubdivCode(1);

    /// Wrap a raw code. Zero is not a valid code and is mapped to the root.
    pub fn from_raw(raw: u64) -> Self {
        if raw == 0 {
            Self::ROOT
        } else {
            SubdivCode(raw)
        }
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    /// Number of splits between the root and this box.
    #[inline]
    pub fn depth(self) -> u32 {
        MAX_DEPTH - self.0.leading_zeros()
    }

    pub fn is_root(self) -> bool {
        self.0 == 1
    }

    /// Code of the child on the given side of the next split.
    pub fn child(self, branch: Branch) -> Result<Self> {
        if self.depth() >= MAX_DEPTH {
            return Err(GeometryError::SubdivisionTooDeep);
        }
        Ok(SubdivCode((self.0 << 1) | branch as u64))
    }

    /// Code of the enclosing box, or `None` for the root.
    pub fn parent(self) -> Option<Self> {
        if self.is_root() {
            None
        } else {
            Some(SubdivCode(self.0 >> 1))
        }
    }

    /// Branch taken by the last split, or `None` for the root.
    pub fn last_branch(self) -> Option<Branch> {
        if self.is_root() {
            None
        } else if self.0 & 1 == 0 {
            Some(Branch::Low)
        } else {
            Some(Branch::High)
        }
    }

    /// Compare this code with `other`. See [`is_in`].
    #[inline]
    pub fn is_in(self, other: SubdivCode) -> Containment {
        is_in(self, other)
    }
}

impl Default for SubdivCode {
    fn default() -> Self {
        Self::ROOT
    }
}

impl fmt::Display for SubdivCode {
    /// Prints the branch path, e.g. `root/1/0/0`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "root")?;
        for level in (0..self.depth()).rev() {
            write!(f, "/{}", (self.0 >> level) & 1)?;
        }
        Ok(())
    }
}

/// Outcome of comparing two subdivision codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Containment {
    /// The box lies outside the other box's cell (disjoint, or an ancestor)
    Outside = -1,
    /// Both codes name the same cell
    Equal = 0,
    /// The box is a strict descendant of the other box
    Inside = 1,
}

impl Containment {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<Containment> for i32 {
    fn from(c: Containment) -> i32 {
        c.as_i32()
    }
}

/// Structural containment test between two boxes of the same decomposition.
///
/// Returns `Inside` when `this` is a strict descendant of `other`, `Equal`
/// when the codes match and `Outside` otherwise. No geometry is consulted
/// and nothing is allocated.
pub fn is_in(this: SubdivCode, other: SubdivCode) -> Containment {
    if this == other {
        return Containment::Equal;
    }
    let this_depth = this.depth();
    let other_depth = other.depth();
    if this_depth > other_depth && (this.0 >> (this_depth - other_depth)) == other.0 {
        Containment::Inside
    } else {
        Containment::Outside
    }
}
