use std::io::Cursor;

use amsgpack::{FileUnpacker, Value};

#[test]
fn iterates_values_pulled_through_small_reads() {
    let mut bytes = Vec::new();
    for i in 0..100u64 {
        bytes.extend(amsgpack::encode(&Value::IntU(i)).unwrap());
    }

    let unpacker = FileUnpacker::with_options(
        Cursor::new(bytes),
        10,
        false,
        None,
        amsgpack::Limits::default(),
    );
    let got: Vec<_> = unpacker.map(|r| r.unwrap()).collect();
    let want: Vec<_> = (0..100u64).map(Value::IntU).collect();
    assert_eq!(got, want);
}

#[test]
fn reports_decode_errors_through_the_same_iterator() {
    let mut unpacker = FileUnpacker::new(Cursor::new(b"\x00\xc1".to_vec()));
    assert_eq!(unpacker.next().unwrap().unwrap(), Value::IntU(0));
    let err = unpacker.next().unwrap().unwrap_err();
    assert_eq!(err.to_string(), "0xc1 byte must not be used");
}

struct FailingReader;

impl std::io::Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "Oops"))
    }
}

#[test]
fn io_errors_propagate_through_the_iterator() {
    let mut unpacker = FileUnpacker::new(FailingReader);
    let err = unpacker.next().unwrap().unwrap_err();
    assert_eq!(err.to_string(), "I/O error: Oops");
}
