#![doc = include_str!("../README.md")]
//! ## Decoding
//!
//! - [`ReadNpyExt`] extension trait, implemented for [`NpyArray`] and, with the
//!   `ndarray` feature, for `ndarray` arrays
//! - [`read_npy`] convenience function
//!
//! ## Encoding
//!
//! - [`WriteNpyExt`] extension trait
//! - [`write_npy`] convenience function
//! - [`write_raw_npy`] for a [`Descriptor`] and a borrowed payload
//!
//! ## Reshaping
//!
//! [`NpyArray::reshape`] replaces the shape when the element count is
//! preserved, or appends an inferred trailing axis when the requested shape
//! evenly divides it. Other requests leave the shape unchanged and return
//! [`Reshaped::Unchanged`]; [`NpyArray::try_reshape`] turns that into an
//! error.
//!
//! ## Limitations
//!
//! - Only the version 1.0 layout (two-byte `HEADER_LEN`) is supported.
//!   Headers are always written as version 1.0.
//!
//! - The `descr` field must be a simple type string `[<=>]?[ifc][0-9]*`.
//!   Structured dtypes are rejected.
//!
//! - Zero-dimensional (scalar) arrays are rejected.
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(missing_docs)]

mod npy;

#[cfg(feature = "ndarray")]
mod impl_ndarray;

pub use crate::npy::{
    read_npy, write_npy, write_raw_npy, ByteOrder, Descriptor, DescriptorError, Dtype, Element,
    ElementTypeError, NpyArray, ParseHeaderError, ReadNpyError, ReadNpyExt, ReshapeError,
    Reshaped, Version, WriteNpyError, WriteNpyExt,
};
