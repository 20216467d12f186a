use std::fmt;
use thiserror::Error;

/// The kind of scalar stored in the array, independent of its width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dtype {
    /// Signed integer (`i`).
    Integer,
    /// Floating point (`f`).
    Float,
    /// Complex floating point (`c`).
    Complex,
}

impl Dtype {
    /// The type character used in the `descr` field.
    pub const fn type_char(self) -> char {
        match self {
            Self::Integer => 'i',
            Self::Float => 'f',
            Self::Complex => 'c',
        }
    }

    /// Inverse of [`Dtype::type_char`].
    pub const fn from_type_char(c: char) -> Option<Self> {
        match c {
            'i' => Some(Self::Integer),
            'f' => Some(Self::Float),
            'c' => Some(Self::Complex),
            _ => None,
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Complex => "complex",
        };
        f.write_str(name)
    }
}

/// Byte order of the scalars in the payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// `<`, and also `=` or no endian character at all.
    #[default]
    LittleEndian,
    /// `>`.
    BigEndian,
}

impl ByteOrder {
    /// The endian character written to the `descr` field.
    pub const fn endian_char(self) -> char {
        match self {
            Self::LittleEndian => '<',
            Self::BigEndian => '>',
        }
    }

    /// Maps an endian character of the `descr` field to a byte order.
    ///
    /// `None` stands for a `descr` without an endian character.
    pub const fn from_endian_char(c: Option<char>) -> Option<Self> {
        match c {
            None | Some('<') | Some('=') => Some(Self::LittleEndian),
            Some('>') => Some(Self::BigEndian),
            Some(_) => None,
        }
    }
}

/// An error building a [`Descriptor`] or pairing one with a payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// Elements must be at least one byte wide.
    #[error("element width must be positive")]
    ZeroWidth,
    /// Scalar (zero-dimensional) arrays are not supported.
    #[error("shape must have at least one dimension")]
    EmptyShape,
    /// Overflow while computing the number of elements or bytes.
    #[error("overflow computing length from shape")]
    LengthOverflow,
    /// The payload does not hold `element_width * element_count` bytes.
    #[error("payload has {found} bytes but the descriptor requires {expected}")]
    PayloadSizeMismatch {
        /// Bytes implied by the descriptor.
        expected: usize,
        /// Bytes actually supplied.
        found: usize,
    },
}

/// Metadata of one array: element kind, width, byte order, memory order and
/// shape.
///
/// The element count is derived from the shape and kept in sync with it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Descriptor {
    dtype: Dtype,
    element_width: usize,
    byte_order: ByteOrder,
    fortran_order: bool,
    shape: Vec<usize>,
    element_count: usize,
}

impl Descriptor {
    /// Creates a descriptor, checking that the width is positive, the shape
    /// is non-empty and the byte size of the payload fits in `isize`.
    pub fn new(
        dtype: Dtype,
        element_width: usize,
        byte_order: ByteOrder,
        fortran_order: bool,
        shape: Vec<usize>,
    ) -> Result<Self, DescriptorError> {
        if element_width == 0 {
            return Err(DescriptorError::ZeroWidth);
        }
        if shape.is_empty() {
            return Err(DescriptorError::EmptyShape);
        }
        let element_count = shape_length_checked(&shape, element_width)
            .ok_or(DescriptorError::LengthOverflow)?;
        Ok(Self { dtype, element_width, byte_order, fortran_order, shape, element_count })
    }

    /// Element kind.
    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    /// Bytes per scalar element.
    pub fn element_width(&self) -> usize {
        self.element_width
    }

    /// Byte order of the payload.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// `true` for column-major data. Descriptive only; the payload is never
    /// transposed.
    pub fn fortran_order(&self) -> bool {
        self.fortran_order
    }

    /// Extent of each axis.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Product of the shape.
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Size of the payload in bytes, `element_width * element_count`.
    pub fn byte_size(&self) -> usize {
        // Bounded in `new`; reshaping never changes the element count.
        self.element_width * self.element_count
    }

    /// Replaces the shape and recomputes the element count.
    ///
    /// The caller must have checked that `element_count` is the product of
    /// `shape`.
    pub(crate) fn set_shape(&mut self, shape: Vec<usize>, element_count: usize) {
        debug_assert_eq!(element_count_checked(&shape), Some(element_count));
        self.shape = shape;
        self.element_count = element_count;
    }
}

/// Product of the axis lengths, or `None` on overflow.
pub(crate) fn element_count_checked(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &len| acc.checked_mul(len))
}

/// Computes the number of elements of `shape`.
///
/// Returns `None` if the number of elements or the length in bytes would
/// overflow `isize`.
pub(crate) fn shape_length_checked(shape: &[usize], element_width: usize) -> Option<usize> {
    const MAX: usize = isize::MAX as usize;
    let len = element_count_checked(shape)?;
    (len.checked_mul(element_width)? <= MAX).then_some(len)
}
