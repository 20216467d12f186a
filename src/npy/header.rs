use super::descriptor::{ByteOrder, Descriptor, Dtype};
use byteorder::{ByteOrder as _, LittleEndian, ReadBytesExt};
use num_traits::ToPrimitive;
use py_literal::{ParseError as PyValueParseError, Value as PyValue};
use std::{borrow::Cow, error::Error, fmt, io, io::Read as _};

/// Magic string to indicate npy format.
const MAGIC_STRING: &[u8] = b"\x93NUMPY";

/// Length of the magic string, version number and `HEADER_LEN` value.
const PREFIX_LEN: usize = MAGIC_STRING.len() + Version::VERSION_NUM_BYTES + 2;

/// The header is padded with spaces so that the prefix, the array format
/// description, the padding and the final newline add up to a multiple of
/// this value.
const HEADER_ALIGNMENT: usize = 0x80;

/// An error parsing the array format dictionary of a `.npy` header.
#[derive(Debug)]
pub enum ParseHeaderError {
    /// The array format string contains non-ASCII characters.
    NonAscii,
    /// Error parsing the metadata dictionary.
    DictParse(PyValueParseError),
    /// The metadata is not a dictionary.
    MetaNotDict(PyValue),
    /// A required key was missing from the metadata dictionary.
    MissingKey(&'static str),
    /// An illegal value was found for a key in the metadata dictionary.
    IllegalValue {
        /// The key for which the value was illegal.
        key: &'static str,
        /// The illegal value.
        value: PyValue,
    },
}

impl Error for ParseHeaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NonAscii => None,
            Self::DictParse(err) => Some(err),
            Self::MetaNotDict(_) => None,
            Self::MissingKey(_) => None,
            Self::IllegalValue { .. } => None,
        }
    }
}

impl fmt::Display for ParseHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NonAscii => write!(f, "non-ascii in array format string"),
            Self::DictParse(err) => write!(f, "error parsing metadata dict: {err}"),
            Self::MetaNotDict(value) => write!(f, "metadata is not a dict: {value}"),
            Self::MissingKey(key) => write!(f, "missing key: {key}"),
            Self::IllegalValue { key, value } => write!(f, "illegal value for key {key}: {value}"),
        }
    }
}

impl From<PyValueParseError> for ParseHeaderError {
    fn from(err: PyValueParseError) -> Self {
        Self::DictParse(err)
    }
}

#[derive(Debug)]
pub(crate) enum ReadHeaderError {
    Io(io::Error),
    MagicString,
    HeaderLength(usize),
    Parse(ParseHeaderError),
    EmptyShape,
    LengthOverflow,
}

impl Error for ReadHeaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for ReadHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::MagicString => write!(f, "start does not match magic string"),
            Self::HeaderLength(len) => write!(f, "header line does not match HEADER_LEN {len}"),
            Self::Parse(err) => write!(f, "error parsing header: {err}"),
            Self::EmptyShape => write!(f, "shape is empty"),
            Self::LengthOverflow => write!(f, "overflow computing length from shape"),
        }
    }
}

impl From<io::Error> for ReadHeaderError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ParseHeaderError> for ReadHeaderError {
    fn from(err: ParseHeaderError) -> Self {
        Self::Parse(err)
    }
}

#[derive(Debug)]
pub(crate) enum WriteHeaderError {
    Io(io::Error),
    /// `HEADER_LEN` does not fit in two bytes.
    TooLong(usize),
}

impl Error for WriteHeaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::TooLong(_) => None,
        }
    }
}

impl fmt::Display for WriteHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::TooLong(len) => write!(f, "header of {len} bytes is too long"),
        }
    }
}

impl From<io::Error> for WriteHeaderError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Format version found in the second part of the preamble.
///
/// Only the layout of version 1.0 is understood. Other numbers are kept as
/// read, and the header is still decoded with a two-byte `HEADER_LEN`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Version {
    /// Major version number.
    pub major: u8,
    /// Minor version number.
    pub minor: u8,
}

impl Version {
    /// Version 1.0, the only version ever written.
    pub const V1_0: Self = Self { major: 1, minor: 0 };

    /// Number of bytes taken up by version number (1 byte for major version, 1
    /// byte for minor version).
    const VERSION_NUM_BYTES: usize = 2;

    fn from_array([major, minor]: [u8; Self::VERSION_NUM_BYTES]) -> Self {
        Self { major, minor }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::V1_0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Header {
    pub version: Version,
    pub descriptor: Descriptor,
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&format_dict(&self.descriptor))
    }
}

impl Header {
    pub(crate) fn from_reader<R: io::Read>(mut reader: R) -> Result<Self, ReadHeaderError> {
        // Check for magic string
        {
            let mut buf = [0; MAGIC_STRING.len()];
            match reader.read_exact(&mut buf) {
                Ok(()) if buf == MAGIC_STRING => {}
                Ok(()) => return Err(ReadHeaderError::MagicString),
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                    return Err(ReadHeaderError::MagicString)
                }
                Err(err) => return Err(err.into()),
            }
        }

        // Get version number
        let mut buf = [0; Version::VERSION_NUM_BYTES];
        reader.read_exact(&mut buf)?;
        let version = Version::from_array(buf);
        if version != Version::V1_0 {
            log::warn!("reading .npy version {version} as version 1.0");
        }

        // Get `HEADER_LEN`
        let header_len = usize::from(reader.read_u16::<LittleEndian>()?);

        // The header is a single line whose length, newline included, is
        // exactly `HEADER_LEN`
        let mut buf = Vec::with_capacity(header_len);
        (&mut reader).take(header_len as u64).read_to_end(&mut buf)?;
        let newline = buf.iter().position(|&b| b == b'\n');
        if buf.len() != header_len || newline.map(|pos| pos + 1) != Some(header_len) {
            return Err(ReadHeaderError::HeaderLength(header_len));
        }
        let header_str = std::str::from_utf8(&buf[..header_len - 1])
            .ok()
            .filter(|s| s.is_ascii())
            .ok_or(ParseHeaderError::NonAscii)?;

        // Parse the dictionary describing the array's format
        let arr_format =
            strip_long_suffixes(header_str).parse().map_err(ParseHeaderError::from)?;
        let header = Self { version, descriptor: descriptor_from_py_value(arr_format)? };
        log::debug!("parsed .npy {version} header {header}");
        Ok(header)
    }

    fn to_bytes(&self) -> Result<Vec<u8>, WriteHeaderError> {
        // Metadata describing array's format as ASCII string
        let arr_format = format_dict(&self.descriptor);

        let padding_len =
            HEADER_ALIGNMENT - 1 - (PREFIX_LEN + arr_format.len()) % HEADER_ALIGNMENT;
        let header_len = arr_format.len() + padding_len + 1;
        let formatted_header_len =
            u16::try_from(header_len).map_err(|_| WriteHeaderError::TooLong(header_len))?;

        // Write the header
        let mut out = Vec::with_capacity(PREFIX_LEN + header_len);
        out.extend_from_slice(MAGIC_STRING);
        out.push(Version::V1_0.major);
        out.push(Version::V1_0.minor);
        let mut len_bytes = [0; 2];
        LittleEndian::write_u16(&mut len_bytes, formatted_header_len);
        out.extend_from_slice(&len_bytes);
        out.extend_from_slice(arr_format.as_bytes());
        out.resize(out.len() + padding_len, b' ');
        out.push(b'\n');

        // Verify the length of the header
        debug_assert_eq!(out.len(), PREFIX_LEN + header_len);
        debug_assert_eq!(out.len() % HEADER_ALIGNMENT, 0);

        Ok(out)
    }

    pub(crate) fn write<W: io::Write>(&self, mut writer: W) -> Result<(), WriteHeaderError> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }
}

fn descriptor_from_py_value(value: PyValue) -> Result<Descriptor, ReadHeaderError> {
    let PyValue::Dict(dict) = value else {
        return Err(ParseHeaderError::MetaNotDict(value).into());
    };
    let mut type_descriptor = None;
    let mut fortran_order = None;
    let mut shape = None;
    for (key, value) in dict {
        match &key {
            PyValue::String(k) if k == "descr" && type_descriptor.is_none() => {
                let parsed = parse_descr(&value);
                type_descriptor =
                    Some(parsed.ok_or(ParseHeaderError::IllegalValue { key: "descr", value })?);
            }
            PyValue::String(k) if k == "fortran_order" && fortran_order.is_none() => {
                if let PyValue::Boolean(b) = value {
                    fortran_order = Some(b);
                } else {
                    return Err(ParseHeaderError::IllegalValue { key: "fortran_order", value }.into());
                }
            }
            PyValue::String(k) if k == "shape" && shape.is_none() => {
                fn parse_shape(value: &PyValue) -> Option<Vec<usize>> {
                    value
                        .as_tuple()?
                        .iter()
                        .map(|elem| elem.as_integer()?.to_usize())
                        .collect()
                }
                if let Some(s) = parse_shape(&value) {
                    shape = Some(s);
                } else {
                    return Err(ParseHeaderError::IllegalValue { key: "shape", value }.into());
                }
            }
            _ => log::debug!("ignoring header entry {key}: {value}"),
        }
    }
    let (byte_order, dtype, element_width) =
        type_descriptor.ok_or(ParseHeaderError::MissingKey("descr"))?;
    let fortran_order = fortran_order.ok_or(ParseHeaderError::MissingKey("fortran_order"))?;
    let shape = shape.ok_or(ParseHeaderError::MissingKey("shape"))?;
    if shape.is_empty() {
        return Err(ReadHeaderError::EmptyShape);
    }
    // Width and shape were checked above, only the length can be off
    Descriptor::new(dtype, element_width, byte_order, fortran_order, shape)
        .map_err(|_| ReadHeaderError::LengthOverflow)
}

/// Drops the `L` suffix that Python 2 appended to long integers, as in
/// `'shape': (2L, 3L)`. Quoted strings are left alone.
fn strip_long_suffixes(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    let mut quote = None;
    let mut out = String::new();
    let mut copied = 0;
    for (i, &b) in bytes.iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'\'' || b == b'"' => quote = Some(b),
            None if matches!(b, b'L' | b'l') && i > 0 && bytes[i - 1].is_ascii_digit() => {
                out.push_str(&text[copied..i]);
                copied = i + 1;
            }
            None => {}
        }
    }
    if copied == 0 {
        Cow::Borrowed(text)
    } else {
        out.push_str(&text[copied..]);
        Cow::Owned(out)
    }
}

/// Parses a `descr` string of the form `[<=>]?[ifc][0-9]*`.
fn parse_descr(value: &PyValue) -> Option<(ByteOrder, Dtype, usize)> {
    let PyValue::String(descr) = value else {
        return None;
    };
    let (endian, rest) = match descr.chars().next()? {
        c @ ('<' | '=' | '>') => (Some(c), &descr[1..]),
        _ => (None, descr.as_str()),
    };
    let byte_order = ByteOrder::from_endian_char(endian)?;
    let mut chars = rest.chars();
    let dtype = Dtype::from_type_char(chars.next()?)?;
    let digits = chars.as_str();
    let element_width = if digits.is_empty() {
        1
    } else if digits.bytes().all(|b| b.is_ascii_digit()) {
        digits.parse().ok().filter(|&width| width > 0)?
    } else {
        return None;
    };
    Some((byte_order, dtype, element_width))
}

/// Formats the dictionary literal, without padding or newline.
fn format_dict(descriptor: &Descriptor) -> String {
    let fortran_order = if descriptor.fortran_order() { "True" } else { "False" };
    format!(
        "{{'descr': '{}{}{}', 'fortran_order': {fortran_order}, 'shape': {}, }}",
        descriptor.byte_order().endian_char(),
        descriptor.dtype().type_char(),
        descriptor.element_width(),
        format_shape(descriptor.shape()),
    )
}

/// Formats the shape as a Python tuple, `(5,)` or `(2, 3)`.
fn format_shape(shape: &[usize]) -> String {
    let joined = shape.iter().map(usize::to_string).collect::<Vec<_>>().join(", ");
    if shape.len() == 1 {
        format!("({joined},)")
    } else {
        format!("({joined})")
    }
}
