use amsgpack::{encode, Encoder, EncodeError, Ext, Timestamp, Value};

#[test]
fn concrete_scenario_main_page_example() {
    let value = Value::Map(vec![
        (Value::Str("compact".into()), Value::Bool(true)),
        (Value::Str("schema".into()), Value::IntU(0)),
    ]);
    assert_eq!(encode(&value).unwrap(), b"\x82\xa7compact\xc3\xa6schema\x00");
}

#[test]
fn concrete_scenario_pi() {
    assert_eq!(
        encode(&Value::F64(std::f64::consts::PI)).unwrap(),
        b"\xcb@\t!\xfbTD-\x18"
    );
}

#[test]
fn concrete_scenario_i64_min() {
    assert_eq!(
        encode(&Value::IntS(i64::MIN)).unwrap(),
        vec![0xd3, 0x80, 0, 0, 0, 0, 0, 0, 0]
    );
}

#[test]
fn concrete_scenario_ext() {
    assert_eq!(
        encode(&Value::Ext(Ext::new(0x42, b"123".to_vec()))).unwrap(),
        b"\xc7\x03B123"
    );
}

#[test]
fn integer_boundaries_pick_smallest_form() {
    let cases: &[(i128, Vec<u8>)] = &[
        (-33, vec![0xd0, 0xdf]),
        (-32, vec![0xe0]),
        (127, vec![0x7f]),
        (128, vec![0xcc, 0x80]),
        (255, vec![0xcc, 0xff]),
        (256, vec![0xcd, 0x01, 0x00]),
        (65535, vec![0xcd, 0xff, 0xff]),
        (65536, vec![0xce, 0x00, 0x01, 0x00, 0x00]),
    ];
    for (v, expected) in cases {
        let value = if *v < 0 {
            Value::IntS(*v as i64)
        } else {
            Value::IntU(*v as u64)
        };
        assert_eq!(encode(&value).unwrap(), *expected, "v={v}");
    }

    assert_eq!(
        encode(&Value::IntU(u32::MAX as u64)).unwrap(),
        vec![0xce, 0xff, 0xff, 0xff, 0xff]
    );
    assert_eq!(
        encode(&Value::IntU(u32::MAX as u64 + 1)).unwrap(),
        vec![0xcf, 0, 0, 0, 1, 0, 0, 0, 0]
    );
    assert_eq!(
        encode(&Value::IntU(u64::MAX)).unwrap(),
        vec![0xcf, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
    );

    // 2^31-1, 2^31, 2^32-1, 2^32, 2^63-1, 2^63, 2^64-1: all still fit the
    // smallest unsigned form that covers them, since `IntU` never goes
    // negative.
    for v in [
        (1u64 << 31) - 1,
        1u64 << 31,
        (1u64 << 32) - 1,
        1u64 << 32,
        (1u64 << 63) - 1,
        1u64 << 63,
        u64::MAX,
    ] {
        let bytes = encode(&Value::IntU(v)).unwrap();
        assert_eq!(amsgpack::decode(&bytes).unwrap(), Value::IntU(v), "v={v}");
    }
}

#[test]
fn string_length_boundaries_pick_smallest_header() {
    for len in [0usize, 31, 32, 255, 256, 65535, 65536, 65537] {
        let s = "a".repeat(len);
        let bytes = encode(&Value::Str(s)).unwrap();
        let header_len = match len {
            0..=31 => 1,
            32..=255 => 2,
            256..=65535 => 3,
            _ => 5,
        };
        assert_eq!(bytes.len(), header_len + len, "len={len}");
        match len {
            0..=31 => assert_eq!(bytes[0], 0xa0 | len as u8),
            32..=255 => assert_eq!(bytes[0], 0xd9),
            256..=65535 => assert_eq!(bytes[0], 0xda),
            _ => assert_eq!(bytes[0], 0xdb),
        }
    }
}

#[test]
fn array_length_boundaries_pick_smallest_header() {
    for len in [0usize, 15, 16, 65535, 65536, 65537] {
        let arr = Value::Array(vec![Value::Nil; len]);
        let bytes = encode(&arr).unwrap();
        match len {
            0..=15 => assert_eq!(bytes[0], 0x90 | len as u8),
            16..=65535 => assert_eq!(bytes[0], 0xdc),
            _ => assert_eq!(bytes[0], 0xdd),
        }
    }
}

#[test]
fn map_length_boundaries_pick_smallest_header() {
    for len in [0usize, 15, 16, 65535, 65536] {
        let pairs = (0..len as u64)
            .map(|i| (Value::IntU(i), Value::Nil))
            .collect();
        let bytes = encode(&Value::Map(pairs)).unwrap();
        match len {
            0..=15 => assert_eq!(bytes[0], 0x80 | len as u8),
            16..=65535 => assert_eq!(bytes[0], 0xde),
            _ => assert_eq!(bytes[0], 0xdf),
        }
    }
}

#[test]
fn ext_payload_boundaries_pick_fixed_or_variable_header() {
    for len in [1usize, 2, 4, 8, 16] {
        let bytes = encode(&Value::Ext(Ext::new(1, vec![0u8; len]))).unwrap();
        let tag = match len {
            1 => 0xd4,
            2 => 0xd5,
            4 => 0xd6,
            8 => 0xd7,
            16 => 0xd8,
            _ => unreachable!(),
        };
        assert_eq!(bytes[0], tag);
    }
    for len in [3usize, 5, 9, 17, 255, 256, 65535, 65536, 67000] {
        let bytes = encode(&Value::Ext(Ext::new(1, vec![0u8; len]))).unwrap();
        let tag = match len {
            3 | 5 | 9 | 17 | 255 => 0xc7,
            256 | 65535 => 0xc8,
            _ => 0xc9,
        };
        assert_eq!(bytes[0], tag, "len={len}");
    }
}

#[test]
fn ext_boundary_payloads_round_trip_through_decode() {
    for len in [1usize, 2, 3, 4, 5, 8, 9, 16, 17, 255, 256, 65535, 65536, 67000] {
        let value = Value::Ext(Ext::new(0x7f, vec![0xab; len]));
        let bytes = encode(&value).unwrap();
        assert_eq!(amsgpack::decode(&bytes).unwrap(), value, "len={len}");
    }
}

#[test]
fn default_hook_is_never_invoked_for_well_formed_values() {
    // Every `Value` variant this crate defines encodes directly, so a
    // `default` hook is dead weight for any value actually reachable
    // through this API; it exists for forward compatibility only.
    let mut value = Value::Array(vec![]);
    for _ in 0..5 {
        value = Value::Array(vec![value]);
    }
    let result = amsgpack::encode_with_default(&value, Box::new(|v| Ok(v.clone())));
    assert!(result.is_ok());
}

#[test]
fn hook_variant_displays_its_message_verbatim() {
    // `default` hooks return `Result<Value, EncodeError>` directly, so a
    // hook that wants to raise its own error constructs this variant
    // itself; nothing in the encoder wraps or rewrites its text.
    let err = EncodeError::Hook("nope".into());
    assert_eq!(err.to_string(), "nope");
}

#[test]
fn timestamp_round_trips_all_three_wire_forms() {
    for ts in [
        Timestamp::new(1_752_955_664, 0),
        Timestamp::new(1_752_955_664, 1),
        Timestamp::new(-5, 0),
        Timestamp::new(17_529_556_640_000, 1000),
    ] {
        let bytes = encode(&Value::Timestamp(ts)).unwrap();
        assert_eq!(amsgpack::decode(&bytes).unwrap(), Value::Timestamp(ts));
    }
}

#[test]
fn nesting_guard_matches_on_encode_and_decode() {
    let mut value = Value::Array(vec![]);
    for _ in 0..32 {
        value = Value::Array(vec![value]);
    }
    assert!(matches!(
        Encoder::new().encode(&value),
        Err(EncodeError::NestingTooDeep)
    ));
}
