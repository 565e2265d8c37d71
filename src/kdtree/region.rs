//! Query regions for range searches.

use geo_traits::{CoordTrait, RectTrait};

use crate::r#type::IndexableNum;

/// A region of space that can be used to query a KDTree.
///
/// The range search prunes subtrees one axis at a time using [`min_coord`][Region::min_coord] and
/// [`max_coord`][Region::max_coord], so the region must be convex and monotonic along every axis:
/// any point inside it must lie within `[min_coord(axis), max_coord(axis)]` on each axis.
/// Whether a point is actually reported is decided by
/// [`is_fully_inside`][Region::is_fully_inside] alone.
pub trait Region<N: IndexableNum> {
    /// The smallest coordinate of the region along `axis`.
    fn min_coord(&self, axis: usize) -> N;

    /// The largest coordinate of the region along `axis`.
    fn max_coord(&self, axis: usize) -> N;

    /// Returns `true` if `point` lies inside the region, boundary included.
    fn is_fully_inside(&self, point: &[N]) -> bool;
}

/// An axis-aligned k-dimensional box, boundaries included.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox<N: IndexableNum> {
    min: Vec<N>,
    max: Vec<N>,
}

impl<N: IndexableNum> BoundingBox<N> {
    /// Create a box spanning `min..=max` on every axis.
    ///
    /// Axes past the end of either corner are treated as unbounded.
    pub fn new(min: impl Into<Vec<N>>, max: impl Into<Vec<N>>) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
        }
    }

    /// The lower corner of the box.
    pub fn min(&self) -> &[N] {
        &self.min
    }

    /// The upper corner of the box.
    pub fn max(&self) -> &[N] {
        &self.max
    }
}

impl<N: IndexableNum> Region<N> for BoundingBox<N> {
    fn min_coord(&self, axis: usize) -> N {
        self.min.get(axis).copied().unwrap_or_else(N::min_value)
    }

    fn max_coord(&self, axis: usize) -> N {
        self.max.get(axis).copied().unwrap_or_else(N::max_value)
    }

    fn is_fully_inside(&self, point: &[N]) -> bool {
        point.iter().enumerate().all(|(axis, &c)| {
            c >= self.min_coord(axis) && c <= self.max_coord(axis)
        })
    }
}

/// Adapter that lets any [`RectTrait`] implementation be used as a [`Region`].
///
/// A rectangle only describes the axes covered by its dimension (x and y, plus z and m when
/// present). Any further axis of the tree is left unbounded.
#[derive(Debug, Clone, Copy)]
pub struct RectRegion<'a, R>(pub &'a R);

impl<N: IndexableNum, R: RectTrait<T = N>> Region<N> for RectRegion<'_, R> {
    fn min_coord(&self, axis: usize) -> N {
        nth_or(&self.0.min(), axis, N::min_value())
    }

    fn max_coord(&self, axis: usize) -> N {
        nth_or(&self.0.max(), axis, N::max_value())
    }

    fn is_fully_inside(&self, point: &[N]) -> bool {
        let min = self.0.min();
        let max = self.0.max();
        point.iter().enumerate().all(|(axis, &c)| {
            c >= nth_or(&min, axis, N::min_value()) && c <= nth_or(&max, axis, N::max_value())
        })
    }
}

#[inline]
fn nth_or<C: CoordTrait>(coord: &C, axis: usize, default: C::T) -> C::T {
    if axis < coord.dim().size() {
        coord.nth_or_panic(axis)
    } else {
        default
    }
}
