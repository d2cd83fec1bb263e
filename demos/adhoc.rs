use amsgpack::{Unpacker, Value};

fn main() {
    let mut packed = Vec::new();
    packed.extend(amsgpack::encode(&Value::Str("hello".into())).unwrap());
    packed.extend(amsgpack::encode(&Value::Array(vec![Value::IntU(1), Value::IntU(2)])).unwrap());

    let mut unpacker = Unpacker::new();
    unpacker.feed(&packed);
    for value in unpacker {
        match value {
            Ok(v) => println!("{v:?}"),
            Err(e) => println!("error: {e}"),
        }
    }
}
