//! Typed indices for mesh elements.
//!
//! Vertices, half-edges and faces live in [`Vec`] arenas inside
//! [`PlanarMesh`](super::PlanarMesh); all cross-references between them are
//! index fields rather than pointers, so structural edits (edge flips, lazy
//! deletions) only rewire integers. The wrappers here keep the three index
//! spaces from being mixed up and reserve the maximum value of the backing
//! integer as an "invalid" sentinel, which doubles as the null link.
//!
//! The backing width is chosen through the [`MeshIndex`] trait: `u32` is the
//! default and fits any mesh this crate is meant for, `u16` halves the arena
//! footprint for small meshes, `u64` is available for completeness.

use std::fmt::{self, Debug};
use std::hash::Hash;

/// Integer types usable as the backing storage of a mesh index.
pub trait MeshIndex:
    Copy + Clone + Eq + PartialEq + Ord + PartialOrd + Hash + Debug + Send + Sync + 'static
{
    /// Largest addressable index; one less than the sentinel.
    const MAX: Self;

    /// Sentinel standing in for "no element".
    const INVALID: Self;

    /// Convert from `usize`, debug-asserting that the value fits.
    fn from_usize(v: usize) -> Self;

    /// Widen back to `usize` for arena addressing.
    fn to_usize(self) -> usize;

    /// Whether this value is a real index rather than the sentinel.
    fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl MeshIndex for u16 {
    const MAX: Self = u16::MAX - 1;
    const INVALID: Self = u16::MAX;

    #[inline]
    fn from_usize(v: usize) -> Self {
        debug_assert!(v <= Self::MAX as usize, "index {} overflows u16", v);
        v as u16
    }

    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }
}

impl MeshIndex for u32 {
    const MAX: Self = u32::MAX - 1;
    const INVALID: Self = u32::MAX;

    #[inline]
    fn from_usize(v: usize) -> Self {
        debug_assert!(v <= Self::MAX as usize, "index {} overflows u32", v);
        v as u32
    }

    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }
}

impl MeshIndex for u64 {
    const MAX: Self = u64::MAX - 1;
    const INVALID: Self = u64::MAX;

    #[inline]
    fn from_usize(v: usize) -> Self {
        v as u64
    }

    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }
}

/// Index of a vertex in the mesh arena.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId<I: MeshIndex = u32>(I);

/// Index of a half-edge in the mesh arena.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct HalfEdgeId<I: MeshIndex = u32>(I);

/// Index of a face in the mesh arena.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId<I: MeshIndex = u32>(I);

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl<I: MeshIndex> $name<I> {
            /// Wrap a raw arena position.
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(I::from_usize(index))
            }

            /// The null/sentinel value of this index space.
            #[inline]
            pub fn invalid() -> Self {
                Self(I::INVALID)
            }

            /// The arena position this index refers to.
            #[inline]
            pub fn index(self) -> usize {
                self.0.to_usize()
            }

            /// Whether the index refers to an element at all.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0.is_valid()
            }
        }

        impl<I: MeshIndex> Debug for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $display, self.index())
                } else {
                    write!(f, "{}(-)", $display)
                }
            }
        }

        impl<I: MeshIndex> Default for $name<I> {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl<I: MeshIndex> From<usize> for $name<I> {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_index_type!(VertexId, "V");
impl_index_type!(HalfEdgeId, "E");
impl_index_type!(FaceId, "F");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_and_invalid() {
        let v: VertexId = VertexId::new(7);
        assert_eq!(v.index(), 7);
        assert!(v.is_valid());

        let none: VertexId = VertexId::invalid();
        assert!(!none.is_valid());
        assert_eq!(none, VertexId::default());
    }

    #[test]
    fn test_index_spaces_are_distinct_types() {
        let v: VertexId = VertexId::new(3);
        let e: HalfEdgeId = HalfEdgeId::new(3);
        let f: FaceId = FaceId::new(3);

        // Same raw value, three incompatible types.
        assert_eq!(v.index(), e.index());
        assert_eq!(e.index(), f.index());
    }

    #[test]
    fn test_narrow_backing_width() {
        let v: VertexId<u16> = VertexId::new(512);
        assert_eq!(v.index(), 512);
        assert!(!VertexId::<u16>::invalid().is_valid());
    }

    #[test]
    fn test_debug_formatting() {
        let e: HalfEdgeId = HalfEdgeId::new(42);
        assert_eq!(format!("{:?}", e), "E(42)");
        assert_eq!(format!("{:?}", HalfEdgeId::<u32>::invalid()), "E(-)");
    }
}
