//! Integration tests for decoding, encoding and reshaping `.npy` streams.

use npyfile::{
    read_npy, write_npy, ByteOrder, Descriptor, Dtype, NpyArray, ReadNpyError, ReadNpyExt,
    Reshaped, Version, WriteNpyExt,
};

/// Builds an `.npy` stream from a header text and payload, with `HEADER_LEN`
/// set to the text length plus the newline.
fn npy_stream(text: &str, payload: &[u8]) -> Vec<u8> {
    let mut out = b"\x93NUMPY\x01\x00".to_vec();
    out.extend_from_slice(&(text.len() as u16 + 1).to_le_bytes());
    out.extend_from_slice(text.as_bytes());
    out.push(b'\n');
    out.extend_from_slice(payload);
    out
}

fn encode(arr: &NpyArray) -> Vec<u8> {
    let mut buf = Vec::new();
    arr.write_npy(&mut buf).unwrap();
    buf
}

#[test]
fn exact_bytes() {
    let arr = NpyArray::from_elements(vec![2, 3], &[1i32, 2, 3, 4, 5, 6]).unwrap();
    let buf = encode(&arr);

    let text = "{'descr': '<i4', 'fortran_order': False, 'shape': (2, 3), }";
    let mut expected = b"\x93NUMPY\x01\x00\x76\x00".to_vec();
    expected.extend_from_slice(text.as_bytes());
    expected.resize(127, b' ');
    expected.push(b'\n');
    for v in 1i32..=6 {
        expected.extend_from_slice(&v.to_le_bytes());
    }
    assert_eq!(buf, expected);
}

#[test]
fn one_tuple_shape() {
    let arr = NpyArray::from_elements(vec![5], &[0f64; 5]).unwrap();
    let buf = encode(&arr);
    let header = std::str::from_utf8(&buf[10..128]).unwrap();
    assert!(header.starts_with("{'descr': '<f8', 'fortran_order': False, 'shape': (5,), }"));
    assert!(header.ends_with(" \n"));
}

#[test]
fn round_trip() {
    let cases = [
        (Dtype::Integer, 1, ByteOrder::LittleEndian, false, vec![7]),
        (Dtype::Integer, 8, ByteOrder::BigEndian, true, vec![2, 3, 4]),
        (Dtype::Float, 4, ByteOrder::LittleEndian, true, vec![1, 1, 1, 1, 1]),
        (Dtype::Float, 8, ByteOrder::BigEndian, false, vec![3, 0]),
        (Dtype::Complex, 16, ByteOrder::LittleEndian, false, vec![4, 2]),
        (Dtype::Complex, 8, ByteOrder::BigEndian, true, vec![1_000]),
    ];
    for (dtype, width, order, fortran_order, shape) in cases {
        let descr = Descriptor::new(dtype, width, order, fortran_order, shape).unwrap();
        let data = (0..descr.byte_size()).map(|i| (i * 7 % 251) as u8).collect();
        let arr = NpyArray::from_parts(descr, data).unwrap();
        let buf = encode(&arr);
        let header_len = usize::from(u16::from_le_bytes([buf[8], buf[9]]));
        assert_eq!((10 + header_len) % 64, 0);
        assert_eq!(buf.len(), 10 + header_len + arr.byte_size());
        let back = NpyArray::read_npy(&buf[..]).unwrap();
        assert_eq!(back, arr);
        assert_eq!(back.version(), Version::V1_0);
    }
}

#[test]
fn reads_hand_written_headers() {
    let payload: Vec<u8> = (1..=8).collect();
    let arr = NpyArray::read_npy(
        &npy_stream("{'descr': '>i2', 'fortran_order': True, 'shape': (2,2)}", &payload)[..],
    )
    .unwrap();
    assert_eq!(arr.dtype(), Dtype::Integer);
    assert_eq!(arr.element_width(), 2);
    assert_eq!(arr.byte_order(), ByteOrder::BigEndian);
    assert!(arr.fortran_order());
    assert_eq!(arr.shape(), &[2, 2]);
    assert_eq!(arr.data(), &payload[..]);
    assert_eq!(arr.to_vec::<i16>().unwrap(), [0x0102, 0x0304, 0x0506, 0x0708]);
}

#[test]
fn descr_without_endian_char() {
    let arr = NpyArray::read_npy(
        &npy_stream("{'descr': 'i4', 'fortran_order': False, 'shape': (1,), }", &[1, 0, 0, 0])[..],
    )
    .unwrap();
    assert_eq!(arr.byte_order(), ByteOrder::LittleEndian);
    assert_eq!(arr.to_vec::<i32>().unwrap(), [1]);
}

#[test]
fn invalid_magic() {
    let mut buf = encode(&NpyArray::from_elements(vec![2], &[1i8, 2]).unwrap());
    buf[0] = 0x92;
    assert!(matches!(NpyArray::read_npy(&buf[..]), Err(ReadNpyError::InvalidMagic)));
    assert!(matches!(NpyArray::read_npy(&b"PK\x03\x04"[..]), Err(ReadNpyError::InvalidMagic)));
}

#[test]
fn invalid_header_length() {
    let mut buf = encode(&NpyArray::from_elements(vec![2], &[1i8, 2]).unwrap());
    buf[8] -= 1;
    assert!(matches!(
        NpyArray::read_npy(&buf[..]),
        Err(ReadNpyError::InvalidHeader { header_len: 117 }),
    ));
    buf[8] += 2;
    assert!(matches!(
        NpyArray::read_npy(&buf[..]),
        Err(ReadNpyError::InvalidHeader { header_len: 119 }),
    ));
}

#[test]
fn header_parse_failures() {
    for text in [
        "{'descr': '<i4', 'fortran_order': False, }",
        "{'descr': '<i4', 'shape': (1,), }",
        "{'fortran_order': False, 'shape': (1,), }",
        "{'descr': '|b1', 'fortran_order': False, 'shape': (1,), }",
        "{'descr': [('x', '<i4')], 'fortran_order': False, 'shape': (1,), }",
        "not a dict",
    ] {
        assert!(
            matches!(
                NpyArray::read_npy(&npy_stream(text, &[0; 4])[..]),
                Err(ReadNpyError::HeaderParseFailed(_)),
            ),
            "{text}",
        );
    }
}

#[test]
fn empty_shape() {
    let stream = npy_stream("{'descr': '<i4', 'fortran_order': False, 'shape': (), }", &[0; 4]);
    assert!(matches!(NpyArray::read_npy(&stream[..]), Err(ReadNpyError::InvalidShape)));
}

#[test]
fn truncated_payload() {
    let stream = npy_stream("{'descr': '<f8', 'fortran_order': False, 'shape': (3,), }", &[0; 20]);
    assert!(matches!(
        NpyArray::read_npy(&stream[..]),
        Err(ReadNpyError::TruncatedPayload { expected: 24, found: 20 }),
    ));
}

#[test]
fn io_errors_pass_through() {
    struct Failing;

    impl std::io::Read for Failing {
        fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    match NpyArray::read_npy(Failing) {
        Err(ReadNpyError::Io(err)) => assert_eq!(err.kind(), std::io::ErrorKind::PermissionDenied),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn reshape_before_encode() {
    let values: Vec<i64> = (0..24).collect();
    let mut arr = NpyArray::from_elements(vec![2, 3, 4], &values).unwrap();

    assert_eq!(arr.reshape(&[4, 6]), Reshaped::Exact);
    assert_eq!(arr.element_count(), 24);
    assert_eq!(arr.reshape(&[5]), Reshaped::Unchanged);
    assert_eq!(arr.shape(), &[4, 6]);
    assert_eq!(arr.reshape(&[4]), Reshaped::InferredTrailingAxis(6));
    assert_eq!(arr.shape(), &[4, 6]);
    assert_eq!(arr.reshape(&[48]), Reshaped::Unchanged);

    let arr = arr.into_reshaped(&[3]);
    assert_eq!(arr.shape(), &[3, 8]);
    let back = NpyArray::read_npy(&encode(&arr)[..]).unwrap();
    assert_eq!(back.shape(), &[3, 8]);
    assert_eq!(back.to_vec::<i64>().unwrap(), values);
}

#[test]
fn file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("array.npy");
    let arr = NpyArray::from_elements(vec![2, 2], &[1.5f32, -2.0, 0.25, 8.0]).unwrap();
    write_npy(&path, &arr).unwrap();
    let back: NpyArray = read_npy(&path).unwrap();
    assert_eq!(back, arr);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 128 + 16);
}

#[test]
fn missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let res: Result<NpyArray, _> = read_npy(dir.path().join("missing.npy"));
    assert!(matches!(res, Err(ReadNpyError::Io(_))));
}

#[cfg(feature = "num-complex")]
#[test]
fn complex_elements() {
    use num_complex::Complex;

    let values = [Complex::new(1.0f64, 2.0), Complex::new(-3.0, 0.5)];
    let arr = NpyArray::from_elements(vec![2], &values).unwrap();
    assert_eq!(arr.dtype(), Dtype::Complex);
    assert_eq!(arr.element_width(), 16);
    let buf = encode(&arr);
    assert!(std::str::from_utf8(&buf[10..40]).unwrap().contains("'<c16'"));
    assert_eq!(NpyArray::read_npy(&buf[..]).unwrap().to_vec::<Complex<f64>>().unwrap(), values);
}
