//! Typed access to the payload.

use super::descriptor::{ByteOrder, Dtype};
use byteorder::{BigEndian, ByteOrder as _, LittleEndian};

/// A scalar type that can be stored in the payload of an `.npy` file.
///
/// Implemented for `i8`, `i16`, `i32`, `i64`, `f32`, `f64` and, with the
/// `num-complex` feature, `Complex<f32>` and `Complex<f64>`.
pub trait Element: Copy {
    /// Element kind written to the `descr` field.
    const DTYPE: Dtype;

    /// Width in bytes written to the `descr` field.
    const WIDTH: usize;

    /// Decodes one element from the first [`Self::WIDTH`] bytes of `bytes`.
    ///
    /// Panics if `bytes` is shorter than [`Self::WIDTH`].
    fn read_from(bytes: &[u8], order: ByteOrder) -> Self;

    /// Encodes `self` into the first [`Self::WIDTH`] bytes of `out`.
    ///
    /// Panics if `out` is shorter than [`Self::WIDTH`].
    fn write_to(self, out: &mut [u8], order: ByteOrder);
}

impl Element for i8 {
    const DTYPE: Dtype = Dtype::Integer;
    const WIDTH: usize = 1;

    fn read_from(bytes: &[u8], _: ByteOrder) -> Self {
        bytes[0] as i8
    }

    fn write_to(self, out: &mut [u8], _: ByteOrder) {
        out[0] = self as u8;
    }
}

macro_rules! impl_primitive {
    ($elem:ty, $dtype:expr, $read:ident, $write:ident) => {
        impl Element for $elem {
            const DTYPE: Dtype = $dtype;
            const WIDTH: usize = std::mem::size_of::<$elem>();

            fn read_from(bytes: &[u8], order: ByteOrder) -> Self {
                match order {
                    ByteOrder::LittleEndian => LittleEndian::$read(bytes),
                    ByteOrder::BigEndian => BigEndian::$read(bytes),
                }
            }

            fn write_to(self, out: &mut [u8], order: ByteOrder) {
                match order {
                    ByteOrder::LittleEndian => LittleEndian::$write(out, self),
                    ByteOrder::BigEndian => BigEndian::$write(out, self),
                }
            }
        }
    };
}

impl_primitive!(i16, Dtype::Integer, read_i16, write_i16);
impl_primitive!(i32, Dtype::Integer, read_i32, write_i32);
impl_primitive!(i64, Dtype::Integer, read_i64, write_i64);
impl_primitive!(f32, Dtype::Float, read_f32, write_f32);
impl_primitive!(f64, Dtype::Float, read_f64, write_f64);

#[cfg(feature = "num-complex")]
mod complex {
    use super::*;
    use num_complex::Complex;

    // A complex number is stored as its real part followed by its imaginary
    // part, each in the array's byte order.
    macro_rules! impl_complex {
        ($float:ty) => {
            impl Element for Complex<$float> {
                const DTYPE: Dtype = Dtype::Complex;
                const WIDTH: usize = 2 * <$float as Element>::WIDTH;

                fn read_from(bytes: &[u8], order: ByteOrder) -> Self {
                    let (re, im) = bytes.split_at(<$float as Element>::WIDTH);
                    Complex::new(
                        <$float>::read_from(re, order),
                        <$float>::read_from(im, order),
                    )
                }

                fn write_to(self, out: &mut [u8], order: ByteOrder) {
                    let (re, im) = out.split_at_mut(<$float as Element>::WIDTH);
                    self.re.write_to(re, order);
                    self.im.write_to(im, order);
                }
            }
        };
    }

    impl_complex!(f32);
    impl_complex!(f64);
}
