mod descriptor;
mod elements;
pub mod header;
mod reshape;

pub use self::{
    descriptor::{ByteOrder, Descriptor, DescriptorError, Dtype},
    elements::Element,
    header::{ParseHeaderError, Version},
    reshape::{ReshapeError, Reshaped},
};
use self::header::{Header, ReadHeaderError, WriteHeaderError};
use std::{fs, io, io::Read as _};
use thiserror::Error;

/// Upper bound on the buffer reserved before reading a payload.
const MAX_PREALLOCATED_PAYLOAD: usize = 1 << 20;

/// Read an `.npy` file located at the specified path.
///
/// This is a convenience function for using `File::open` followed by
/// [`ReadNpyExt::read_npy`].
///
/// # Example
///
/// ```no_run
/// use npyfile::{read_npy, NpyArray};
/// # use npyfile::ReadNpyError;
///
/// let arr: NpyArray = read_npy("array.npy")?;
/// println!("shape = {:?}", arr.shape());
/// # Ok::<_, ReadNpyError>(())
/// ```
pub fn read_npy<P, T>(path: P) -> Result<T, ReadNpyError>
where
    P: AsRef<std::path::Path>,
    T: ReadNpyExt,
{
    T::read_npy(fs::File::open(path)?)
}

/// Writes an array to an `.npy` file at the specified path.
///
/// This function will create the file if it does not exist, or overwrite it if
/// it does.
///
/// This is a convenience function for `BufWriter::new(File::create(path)?)`
/// followed by [`WriteNpyExt::write_npy`].
pub fn write_npy<P, T>(path: P, array: &T) -> Result<(), WriteNpyError>
where
    P: AsRef<std::path::Path>,
    T: WriteNpyExt,
{
    array.write_npy(io::BufWriter::new(fs::File::create(path)?))
}

/// Writes `data` as the payload of an `.npy` stream described by `descriptor`.
///
/// Nothing is written if `data` is not exactly `descriptor.byte_size()` bytes
/// long. The writer is flushed before returning.
pub fn write_raw_npy<W: io::Write>(
    mut writer: W,
    descriptor: &Descriptor,
    data: &[u8],
) -> Result<(), WriteNpyError> {
    let expected = descriptor.byte_size();
    if data.len() != expected {
        return Err(WriteNpyError::PayloadSizeMismatch { expected, found: data.len() });
    }
    Header { version: Version::V1_0, descriptor: descriptor.clone() }.write(&mut writer)?;
    writer.write_all(data)?;
    writer.flush()?;
    Ok(())
}

/// An array in `.npy` layout: a [`Descriptor`] and the raw payload it
/// describes.
///
/// The payload is always exactly `element_width * element_count` bytes long.
/// The bytes are kept in the byte order and memory order recorded in the
/// descriptor and are never converted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NpyArray {
    version: Version,
    descriptor: Descriptor,
    data: Vec<u8>,
}

impl NpyArray {
    /// Pairs a descriptor with its payload.
    pub fn from_parts(descriptor: Descriptor, data: Vec<u8>) -> Result<Self, DescriptorError> {
        let expected = descriptor.byte_size();
        if data.len() != expected {
            return Err(DescriptorError::PayloadSizeMismatch { expected, found: data.len() });
        }
        Ok(Self { version: Version::V1_0, descriptor, data })
    }

    /// Creates a little-endian, C-order array from typed elements.
    ///
    /// ```
    /// use npyfile::{Dtype, NpyArray};
    ///
    /// let arr = NpyArray::from_elements(vec![2, 3], &[1i32, 2, 3, 4, 5, 6])?;
    /// assert_eq!(arr.dtype(), Dtype::Integer);
    /// assert_eq!(arr.byte_size(), 24);
    /// assert_eq!(arr.to_vec::<i32>()?, [1, 2, 3, 4, 5, 6]);
    /// # Ok::<_, Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_elements<A: Element>(
        shape: Vec<usize>,
        elements: &[A],
    ) -> Result<Self, DescriptorError> {
        let descriptor = Descriptor::new(A::DTYPE, A::WIDTH, ByteOrder::LittleEndian, false, shape)?;
        if elements.len() != descriptor.element_count() {
            return Err(DescriptorError::PayloadSizeMismatch {
                expected: descriptor.byte_size(),
                found: elements.len() * A::WIDTH,
            });
        }
        let mut data = vec![0; descriptor.byte_size()];
        for (elem, out) in elements.iter().zip(data.chunks_exact_mut(A::WIDTH)) {
            elem.write_to(out, ByteOrder::LittleEndian);
        }
        Ok(Self { version: Version::V1_0, descriptor, data })
    }

    /// Decodes the payload into elements of type `A`, in storage order.
    pub fn to_vec<A: Element>(&self) -> Result<Vec<A>, ElementTypeError> {
        if self.dtype() != A::DTYPE || self.element_width() != A::WIDTH {
            return Err(ElementTypeError::WrongDescriptor {
                dtype: self.dtype(),
                element_width: self.element_width(),
            });
        }
        let order = self.byte_order();
        Ok(self.data.chunks_exact(A::WIDTH).map(|chunk| A::read_from(chunk, order)).collect())
    }

    /// The version read from the preamble; [`Version::V1_0`] for arrays built
    /// in memory.
    pub fn version(&self) -> Version {
        self.version
    }

    /// The metadata of the array.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Element kind.
    pub fn dtype(&self) -> Dtype {
        self.descriptor.dtype()
    }

    /// Bytes per element.
    pub fn element_width(&self) -> usize {
        self.descriptor.element_width()
    }

    /// Byte order of the payload.
    pub fn byte_order(&self) -> ByteOrder {
        self.descriptor.byte_order()
    }

    /// `true` if the payload is in column-major order.
    pub fn fortran_order(&self) -> bool {
        self.descriptor.fortran_order()
    }

    /// Extent of each axis.
    pub fn shape(&self) -> &[usize] {
        self.descriptor.shape()
    }

    /// Number of elements.
    pub fn element_count(&self) -> usize {
        self.descriptor.element_count()
    }

    /// Size of the payload in bytes.
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    /// The raw payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The raw payload, mutable in place but not resizable.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Splits the array into its descriptor and payload.
    pub fn into_parts(self) -> (Descriptor, Vec<u8>) {
        (self.descriptor, self.data)
    }

    /// Changes the shape without touching the payload, see
    /// [`Descriptor::reshape`].
    ///
    /// ```
    /// use npyfile::{NpyArray, Reshaped};
    ///
    /// let mut arr = NpyArray::from_elements(vec![24], &[0f32; 24])?;
    /// assert_eq!(arr.reshape(&[4]), Reshaped::InferredTrailingAxis(6));
    /// assert_eq!(arr.shape(), &[4, 6]);
    /// assert_eq!(arr.reshape(&[5]), Reshaped::Unchanged);
    /// assert_eq!(arr.shape(), &[4, 6]);
    /// # Ok::<_, Box<dyn std::error::Error>>(())
    /// ```
    pub fn reshape(&mut self, shape: &[usize]) -> Reshaped {
        self.descriptor.reshape(shape)
    }

    /// Like [`NpyArray::reshape`], but reports a shape that cannot hold the
    /// elements as an error.
    pub fn try_reshape(&mut self, shape: &[usize]) -> Result<Reshaped, ReshapeError> {
        match self.reshape(shape) {
            Reshaped::Unchanged => Err(ReshapeError::Incompatible {
                element_count: self.element_count(),
                requested: shape.to_vec(),
            }),
            reshaped => Ok(reshaped),
        }
    }

    /// Consuming form of [`NpyArray::reshape`]. The array is returned as it
    /// was if the shape cannot hold its elements.
    pub fn into_reshaped(mut self, shape: &[usize]) -> Self {
        let _ = self.reshape(shape);
        self
    }
}

impl ReadNpyExt for NpyArray {
    fn read_npy<R: io::Read>(mut reader: R) -> Result<Self, ReadNpyError> {
        let Header { version, descriptor } = Header::from_reader(&mut reader)?;
        let expected = descriptor.byte_size();
        // The declared size is untrusted until the bytes have arrived
        let mut data = Vec::with_capacity(expected.min(MAX_PREALLOCATED_PAYLOAD));
        (&mut reader).take(expected as u64).read_to_end(&mut data)?;
        if data.len() != expected {
            return Err(ReadNpyError::TruncatedPayload { expected, found: data.len() });
        }
        Ok(Self { version, descriptor, data })
    }
}

impl WriteNpyExt for NpyArray {
    fn write_npy<W: io::Write>(&self, writer: W) -> Result<(), WriteNpyError> {
        write_raw_npy(writer, &self.descriptor, &self.data)
    }
}

/// Extension trait for writing an array to `.npy` files.
///
/// If writes are expensive (e.g. for a file or network socket), it is
/// recommended to wrap the writer in a [`std::io::BufWriter`]. For the sake of
/// convenience, this method calls [`io::Write::flush()`] on the writer before
/// returning.
///
/// # Example
///
/// ```
/// use npyfile::{NpyArray, WriteNpyExt};
/// # use npyfile::WriteNpyError;
///
/// let arr = NpyArray::from_elements(vec![3], &[1.0f64, 2.0, 3.0]).unwrap();
/// let mut buf = Vec::new();
/// arr.write_npy(&mut buf)?;
/// assert_eq!(buf.len(), 128 + 24);
/// # Ok::<_, WriteNpyError>(())
/// ```
pub trait WriteNpyExt {
    /// Writes the array to `writer` in [`.npy`
    /// format](https://numpy.org/doc/stable/reference/generated/numpy.lib.format.html).
    fn write_npy<W: io::Write>(&self, writer: W) -> Result<(), WriteNpyError>;
}

/// An error writing a `.npy` file.
#[derive(Debug, Error)]
pub enum WriteNpyError {
    /// An error caused by I/O.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The header does not fit in a version 1.0 file.
    #[error("header of {0} bytes does not fit in a version 1.0 file")]
    HeaderTooLong(usize),
    /// The payload does not match the size implied by the descriptor.
    #[error("payload has {found} bytes but the descriptor requires {expected}")]
    PayloadSizeMismatch {
        /// Bytes implied by the descriptor.
        expected: usize,
        /// Bytes supplied.
        found: usize,
    },
    /// An array could not be described, see [`DescriptorError`].
    #[error("invalid array: {0}")]
    Descriptor(#[from] DescriptorError),
}

impl From<WriteHeaderError> for WriteNpyError {
    fn from(err: WriteHeaderError) -> Self {
        match err {
            WriteHeaderError::Io(err) => Self::Io(err),
            WriteHeaderError::TooLong(len) => Self::HeaderTooLong(len),
        }
    }
}

/// Extension trait for reading arrays from `.npy` files.
///
/// # Example
///
/// ```no_run
/// use npyfile::{NpyArray, ReadNpyExt};
/// use std::fs::File;
/// # use npyfile::ReadNpyError;
///
/// let reader = File::open("array.npy")?;
/// let arr = NpyArray::read_npy(reader)?;
/// println!("{} elements of {} bytes", arr.element_count(), arr.element_width());
/// # Ok::<_, ReadNpyError>(())
/// ```
pub trait ReadNpyExt: Sized {
    /// Reads the array from `reader` in [`.npy`
    /// format](https://numpy.org/doc/stable/reference/generated/numpy.lib.format.html).
    ///
    /// Exactly the header and the payload it describes are consumed.
    fn read_npy<R: io::Read>(reader: R) -> Result<Self, ReadNpyError>;
}

/// An error reading a `.npy` file.
#[derive(Debug, Error)]
pub enum ReadNpyError {
    /// An error caused by I/O.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The start of the file does not match the magic string.
    #[error("start does not match magic string")]
    InvalidMagic,
    /// `HEADER_LEN` does not match the length of the header line.
    #[error("header line does not match HEADER_LEN {header_len}")]
    InvalidHeader {
        /// The declared `HEADER_LEN`.
        header_len: usize,
    },
    /// An error parsing the header dictionary.
    #[error("error parsing header: {0}")]
    HeaderParseFailed(#[from] ParseHeaderError),
    /// The shape in the header is an empty tuple.
    #[error("shape in header is empty")]
    InvalidShape,
    /// Overflow while computing the length of the array (in units of bytes or
    /// the number of elements) from the shape described in the file header.
    #[error("overflow computing length from shape")]
    LengthOverflow,
    /// The file does not contain all the data described in the header.
    #[error("expected {expected} bytes of data, found only {found}")]
    TruncatedPayload {
        /// Bytes described by the header.
        expected: usize,
        /// Bytes available before EOF.
        found: usize,
    },
    /// The element type does not match the descriptor.
    #[error("error reading elements: {0}")]
    WrongDescriptor(#[from] ElementTypeError),
    /// An error caused by incorrect `Dimension` type.
    #[error("ndim {1} of array did not match Dimension type with NDIM = {0:?}")]
    WrongNdim(Option<usize>, usize),
}

impl From<ReadHeaderError> for ReadNpyError {
    fn from(err: ReadHeaderError) -> Self {
        match err {
            ReadHeaderError::Io(err) => Self::Io(err),
            ReadHeaderError::MagicString => Self::InvalidMagic,
            ReadHeaderError::HeaderLength(header_len) => Self::InvalidHeader { header_len },
            ReadHeaderError::Parse(err) => Self::HeaderParseFailed(err),
            ReadHeaderError::EmptyShape => Self::InvalidShape,
            ReadHeaderError::LengthOverflow => Self::LengthOverflow,
        }
    }
}

/// The descriptor does not match the requested element type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ElementTypeError {
    /// Kind or width differ from the element type.
    #[error("incorrect descriptor ({dtype}, {element_width} bytes) for this type")]
    WrongDescriptor {
        /// Element kind of the array.
        dtype: Dtype,
        /// Element width of the array.
        element_width: usize,
    },
}
