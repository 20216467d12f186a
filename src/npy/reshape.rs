use super::descriptor::{element_count_checked, Descriptor};
use thiserror::Error;

/// What a call to [`Descriptor::reshape`] did to the shape.
#[must_use = "a reshape can leave the shape unchanged"]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reshaped {
    /// The requested shape had the same number of elements and replaced the
    /// old one verbatim.
    Exact,
    /// The requested shape had fewer elements, evenly dividing the old count.
    /// A trailing axis of the given extent was appended to it.
    InferredTrailingAxis(usize),
    /// The requested shape could not hold the elements; nothing changed.
    Unchanged,
}

impl Reshaped {
    /// `true` unless the shape was left as it was.
    pub fn is_applied(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// An error reshaping an array, see [`NpyArray::try_reshape`].
///
/// [`NpyArray::try_reshape`]: crate::NpyArray::try_reshape
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReshapeError {
    /// The requested shape neither matches nor evenly divides the element
    /// count.
    #[error("cannot reshape {element_count} elements into {requested:?}")]
    Incompatible {
        /// Element count of the array.
        element_count: usize,
        /// The rejected shape.
        requested: Vec<usize>,
    },
}

impl Descriptor {
    /// Gives the descriptor a new shape holding the same number of elements.
    ///
    /// If `shape` holds fewer elements than the array and evenly divides the
    /// count, the missing extent is appended as a trailing axis, so reshaping
    /// 24 elements to `[4]` gives `[4, 6]`. Any other mismatch leaves the
    /// shape as it was and returns [`Reshaped::Unchanged`]. The payload is not
    /// affected either way.
    pub fn reshape(&mut self, shape: &[usize]) -> Reshaped {
        let old_count = self.element_count();
        let outcome = match element_count_checked(shape) {
            _ if shape.is_empty() => Reshaped::Unchanged,
            Some(new_count) if new_count == old_count => {
                self.set_shape(shape.to_vec(), new_count);
                Reshaped::Exact
            }
            Some(new_count)
                if new_count != 0 && new_count < old_count && old_count % new_count == 0 =>
            {
                let extent = old_count / new_count;
                let mut new_shape = Vec::with_capacity(shape.len() + 1);
                new_shape.extend_from_slice(shape);
                new_shape.push(extent);
                self.set_shape(new_shape, old_count);
                Reshaped::InferredTrailingAxis(extent)
            }
            Some(_) | None => Reshaped::Unchanged,
        };
        if outcome == Reshaped::Unchanged {
            log::debug!(
                "reshape of {old_count} elements to {shape:?} rejected, keeping {:?}",
                self.shape(),
            );
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ByteOrder, Dtype};

    fn descriptor(shape: Vec<usize>) -> Descriptor {
        Descriptor::new(Dtype::Float, 4, ByteOrder::LittleEndian, false, shape).unwrap()
    }

    #[test]
    fn exact() {
        let mut descr = descriptor(vec![2, 3, 4]);
        assert_eq!(descr.reshape(&[4, 6]), Reshaped::Exact);
        assert_eq!(descr.shape(), &[4, 6]);
        assert_eq!(descr.element_count(), 24);
    }

    #[test]
    fn infers_trailing_axis() {
        let mut descr = descriptor(vec![24]);
        assert_eq!(descr.reshape(&[4]), Reshaped::InferredTrailingAxis(6));
        assert_eq!(descr.shape(), &[4, 6]);
        assert_eq!(descr.element_count(), 24);

        assert_eq!(descr.reshape(&[2, 2]), Reshaped::InferredTrailingAxis(6));
        assert_eq!(descr.shape(), &[2, 2, 6]);
    }

    #[test]
    fn incompatible_is_a_no_op() {
        let mut descr = descriptor(vec![2, 12]);
        assert_eq!(descr.reshape(&[5]), Reshaped::Unchanged);
        assert_eq!(descr.reshape(&[5, 5]), Reshaped::Unchanged);
        assert_eq!(descr.reshape(&[0]), Reshaped::Unchanged);
        assert_eq!(descr.reshape(&[]), Reshaped::Unchanged);
        assert_eq!(descr.reshape(&[usize::MAX, 2]), Reshaped::Unchanged);
        assert_eq!(descr.shape(), &[2, 12]);
        assert_eq!(descr.element_count(), 24);
        assert!(!Reshaped::Unchanged.is_applied());
    }

    #[test]
    fn empty_arrays() {
        let mut descr = descriptor(vec![0, 3]);
        assert_eq!(descr.reshape(&[3, 0, 7]), Reshaped::Exact);
        assert_eq!(descr.shape(), &[3, 0, 7]);
        assert_eq!(descr.reshape(&[1]), Reshaped::Unchanged);
    }
}
