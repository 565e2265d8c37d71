use std::fmt::Debug;

use num_traits::{Bounded, Num, NumCast, ToPrimitive};

/// A trait for types that can be used for indexed coordinates.
///
/// This trait is sealed and cannot be implemented for external types. Distances are always
/// evaluated in `f64`, so every implementor must be losslessly (or near-losslessly) convertible
/// through [`ToPrimitive::to_f64`].
pub trait IndexableNum:
    private::Sealed + Num + NumCast + ToPrimitive + PartialOrd + Copy + Debug + Send + Sync + Bounded
{
    /// Convert this coordinate to `f64` for distance computations.
    #[inline]
    fn as_f64(self) -> f64 {
        self.to_f64().unwrap_or(0.0)
    }
}

impl IndexableNum for i8 {}
impl IndexableNum for u8 {}
impl IndexableNum for i16 {}
impl IndexableNum for u16 {}
impl IndexableNum for i32 {}
impl IndexableNum for u32 {}
impl IndexableNum for f32 {}
impl IndexableNum for f64 {}

/// Squared euclidean distance between two points of equal dimensionality.
#[inline]
pub(crate) fn sq_dist<N: IndexableNum>(a: &[N], b: &[N]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&a, &b)| {
            let d = a.as_f64() - b.as_f64();
            d * d
        })
        .sum()
}

// https://rust-lang.github.io/api-guidelines/future-proofing.html#sealed-traits-protect-against-downstream-implementations-c-sealed
mod private {
    pub trait Sealed {}

    impl Sealed for i8 {}
    impl Sealed for u8 {}
    impl Sealed for i16 {}
    impl Sealed for u16 {}
    impl Sealed for i32 {}
    impl Sealed for u32 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}
