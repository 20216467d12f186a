use crate::{
    ByteOrder, Descriptor, Element, NpyArray, ReadNpyError, ReadNpyExt, WriteNpyError, WriteNpyExt,
};
use ndarray::{prelude::*, Data, DataOwned, IntoDimension as _};
use std::io;

impl<A, S, D> WriteNpyExt for ArrayBase<S, D>
where
    A: Element,
    S: Data<Elem = A>,
    D: Dimension,
{
    fn write_npy<W: io::Write>(&self, writer: W) -> Result<(), WriteNpyError> {
        let write_contiguous = |writer: W,
                                elements: &[A],
                                fortran_order: bool|
         -> Result<(), WriteNpyError> {
            let descriptor = Descriptor::new(
                A::DTYPE,
                A::WIDTH,
                ByteOrder::LittleEndian,
                fortran_order,
                self.shape().to_owned(),
            )?;
            let mut data = vec![0; descriptor.byte_size()];
            for (elem, out) in elements.iter().zip(data.chunks_exact_mut(A::WIDTH)) {
                elem.write_to(out, ByteOrder::LittleEndian);
            }
            NpyArray::from_parts(descriptor, data)?.write_npy(writer)
        };
        match self.as_slice_memory_order() {
            Some(elements) if self.is_standard_layout() => {
                write_contiguous(writer, elements, false)
            }
            Some(elements) if self.view().reversed_axes().is_standard_layout() => {
                write_contiguous(writer, elements, true)
            }
            _ => {
                let elements: Vec<A> = self.iter().copied().collect();
                write_contiguous(writer, &elements[..], false)
            }
        }
    }
}

impl<A, S, D> ReadNpyExt for ArrayBase<S, D>
where
    A: Element,
    S: DataOwned<Elem = A>,
    D: Dimension,
{
    fn read_npy<R: io::Read>(reader: R) -> Result<Self, ReadNpyError> {
        let arr = NpyArray::read_npy(reader)?;
        let shape = arr.shape().into_dimension();
        let ndim = shape.ndim();
        let data = arr.to_vec::<A>()?;
        ArrayBase::from_shape_vec(shape.set_f(arr.fortran_order()), data)
            .unwrap()
            .into_dimensionality()
            .map_err(|_| ReadNpyError::WrongNdim(D::NDIM, ndim))
    }
}
