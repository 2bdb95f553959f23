use chrono::{DateTime, FixedOffset, Utc};

use crate::error::{CodecError, CodecResult};
use crate::tag::Tag;
use crate::value::Value;

/// Deepest sequence nesting accepted by the encoder and the decoder.
pub const MAX_DEPTH: usize = 64;

const TAG_SIZE: usize = 1;
const LEN_SIZE: usize = 4;
const TIMESTAMP_SIZE: usize = 8 + 4 + 4;
/// Smallest possible encoded element (a bool).
const MIN_ELEMENT_SIZE: usize = TAG_SIZE + 1;

/// Canonical tagged encoding of [`Value`].
///
/// Layout: `[1 byte tag][payload]`. Integers and floats are 8 bytes
/// big-endian, text and bytes carry a `u32` big-endian length, sequences and
/// tuples a `u32` big-endian element count followed by the encoded elements,
/// bools a
/// single `0x00`/`0x01` byte and timestamps `i64` seconds, `u32` nanos and
/// `i32` offset seconds, all big-endian.
///
/// The encoding is canonical: equal values always produce equal bytes, and
/// every byte string accepted by [`TypeCodec::decode`] re-encodes to itself.
pub struct TypeCodec;

impl TypeCodec {
    /// Encode a value into a fresh buffer.
    pub fn encode(value: &Value) -> CodecResult<Vec<u8>> {
        let len = Self::encoded_len(value)?;
        let mut buf = Vec::with_capacity(len);
        write_value(&mut buf, value);
        Ok(buf)
    }

    /// Append the encoding of `value` to `buf`.
    ///
    /// Nothing is written if the value cannot be encoded.
    pub fn encode_into(buf: &mut Vec<u8>, value: &Value) -> CodecResult<()> {
        let len = Self::encoded_len(value)?;
        buf.reserve(len);
        write_value(buf, value);
        Ok(())
    }

    /// Exact number of bytes [`TypeCodec::encode`] produces for `value`.
    pub fn encoded_len(value: &Value) -> CodecResult<usize> {
        measure(value, 0)
    }

    /// Decode a buffer holding exactly one encoded value.
    pub fn decode(data: &[u8]) -> CodecResult<Value> {
        let (value, consumed) = Self::decode_prefix(data)?;
        if consumed != data.len() {
            return Err(CodecError::corrupt(
                consumed,
                format!("{} trailing bytes after value", data.len() - consumed),
            ));
        }
        Ok(value)
    }

    /// Decode one value from the front of `data`. Returns (value, bytes_consumed).
    pub fn decode_prefix(data: &[u8]) -> CodecResult<(Value, usize)> {
        let mut reader = Reader { data, pos: 0 };
        let value = reader.read_value(0)?;
        Ok((value, reader.pos))
    }
}

fn checked_len(len: usize, type_name: &str) -> CodecResult<usize> {
    if u32::try_from(len).is_err() {
        return Err(CodecError::unsupported(
            type_name,
            format!("length {len} exceeds the u32 length field"),
        ));
    }
    Ok(len)
}

fn measure(value: &Value, depth: usize) -> CodecResult<usize> {
    let payload = match value {
        Value::Integer(_) | Value::Float(_) => 8,
        Value::Bool(_) => 1,
        Value::Timestamp(_) => TIMESTAMP_SIZE,
        Value::Bytes(b) => LEN_SIZE + checked_len(b.len(), "bytes")?,
        Value::Text(s) => LEN_SIZE + checked_len(s.len(), "text")?,
        Value::Sequence(items) | Value::Tuple(items) => {
            let type_name = value.kind().name();
            if depth >= MAX_DEPTH {
                return Err(CodecError::unsupported(
                    type_name,
                    format!("nesting deeper than {MAX_DEPTH} levels"),
                ));
            }
            checked_len(items.len(), type_name)?;
            items.iter().try_fold(LEN_SIZE, |acc, item| {
                Ok::<_, CodecError>(acc + measure(item, depth + 1)?)
            })?
        }
    };
    Ok(TAG_SIZE + payload)
}

/// Callers must have validated `value` with [`measure`] first.
fn write_value(buf: &mut Vec<u8>, value: &Value) {
    buf.push(Tag::of(value).as_byte());
    match value {
        Value::Integer(n) => buf.extend_from_slice(&n.to_be_bytes()),
        Value::Float(f) => buf.extend_from_slice(&f.to_be_bytes()),
        Value::Bytes(b) => {
            buf.extend_from_slice(&(b.len() as u32).to_be_bytes());
            buf.extend_from_slice(b);
        }
        Value::Text(s) => {
            buf.extend_from_slice(&(s.len() as u32).to_be_bytes());
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Bool(b) => buf.push(u8::from(*b)),
        Value::Timestamp(ts) => {
            buf.extend_from_slice(&ts.timestamp().to_be_bytes());
            buf.extend_from_slice(&ts.timestamp_subsec_nanos().to_be_bytes());
            buf.extend_from_slice(&ts.offset().local_minus_utc().to_be_bytes());
        }
        Value::Sequence(items) | Value::Tuple(items) => {
            buf.extend_from_slice(&(items.len() as u32).to_be_bytes());
            for item in items {
                write_value(buf, item);
            }
        }
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize, what: &str) -> CodecResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(CodecError::corrupt(
                self.pos,
                format!("truncated {what}: need {n} bytes, have {}", self.remaining()),
            ));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, what: &str) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    fn read_len(&mut self, what: &str) -> CodecResult<usize> {
        Ok(u32::from_be_bytes(self.array(what)?) as usize)
    }

    fn read_value(&mut self, depth: usize) -> CodecResult<Value> {
        let tag_offset = self.pos;
        let [byte] = self.array::<1>("tag")?;
        let tag = Tag::from_byte(byte).ok_or_else(|| {
            CodecError::corrupt(tag_offset, format!("unrecognized tag {byte:#04x}"))
        })?;

        match tag {
            Tag::Integer => Ok(Value::Integer(i64::from_be_bytes(self.array("integer")?))),
            Tag::Float => Ok(Value::Float(f64::from_be_bytes(self.array("float")?))),
            Tag::Bytes => {
                let len = self.read_len("bytes length")?;
                Ok(Value::Bytes(self.take(len, "bytes")?.to_vec()))
            }
            Tag::Text => {
                let len = self.read_len("text length")?;
                let start = self.pos;
                let raw = self.take(len, "text")?;
                let text = std::str::from_utf8(raw).map_err(|e| {
                    CodecError::corrupt(start + e.valid_up_to(), "invalid UTF-8 in text")
                })?;
                Ok(Value::Text(text.to_owned()))
            }
            Tag::Bool => {
                let offset = self.pos;
                match self.array::<1>("bool")? {
                    [0] => Ok(Value::Bool(false)),
                    [1] => Ok(Value::Bool(true)),
                    [other] => Err(CodecError::corrupt(
                        offset,
                        format!("invalid bool byte {other:#04x}"),
                    )),
                }
            }
            Tag::Timestamp => self.read_timestamp(),
            Tag::Sequence => Ok(Value::Sequence(self.read_items("sequence", tag_offset, depth)?)),
            Tag::Tuple => Ok(Value::Tuple(self.read_items("tuple", tag_offset, depth)?)),
        }
    }

    fn read_items(&mut self, what: &str, tag_offset: usize, depth: usize) -> CodecResult<Vec<Value>> {
        if depth >= MAX_DEPTH {
            return Err(CodecError::corrupt(
                tag_offset,
                format!("{what} nested deeper than {MAX_DEPTH} levels"),
            ));
        }
        let count_offset = self.pos;
        let count = self.read_len(what)?;
        if count > self.remaining() / MIN_ELEMENT_SIZE {
            return Err(CodecError::corrupt(
                count_offset,
                format!(
                    "{what} count {count} exceeds the {} bytes remaining",
                    self.remaining()
                ),
            ));
        }
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.read_value(depth + 1)?);
        }
        Ok(items)
    }

    fn read_timestamp(&mut self) -> CodecResult<Value> {
        let offset = self.pos;
        let secs = i64::from_be_bytes(self.array("timestamp seconds")?);
        let nanos = u32::from_be_bytes(self.array("timestamp nanos")?);
        let utc_offset = i32::from_be_bytes(self.array("timestamp offset")?);

        let zone = FixedOffset::east_opt(utc_offset).ok_or_else(|| {
            CodecError::corrupt(offset, format!("invalid UTC offset {utc_offset}s"))
        })?;
        let instant = DateTime::<Utc>::from_timestamp(secs, nanos).ok_or_else(|| {
            CodecError::corrupt(offset, format!("timestamp {secs}s+{nanos}ns out of range"))
        })?;
        Ok(Value::Timestamp(instant.with_timezone(&zone)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn roundtrip(value: &Value) -> Value {
        let encoded = TypeCodec::encode(value).unwrap();
        assert_eq!(encoded.len(), TypeCodec::encoded_len(value).unwrap());
        TypeCodec::decode(&encoded).unwrap()
    }

    fn nested(depth: usize) -> Value {
        (0..depth).fold(Value::Integer(0), |inner, _| Value::Sequence(vec![inner]))
    }

    // -----------------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------------

    #[test]
    fn integer_layout() {
        let encoded = TypeCodec::encode(&Value::Integer(-2)).unwrap();
        assert_eq!(encoded, [b'#', 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe]);
    }

    #[test]
    fn float_layout() {
        let encoded = TypeCodec::encode(&Value::Float(1.0)).unwrap();
        assert_eq!(encoded, [b'%', 0x3f, 0xf0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn text_layout() {
        let encoded = TypeCodec::encode(&Value::from("foo")).unwrap();
        assert_eq!(encoded, [b'"', 0, 0, 0, 3, b'f', b'o', b'o']);
    }

    #[test]
    fn sequence_layout() {
        let encoded = TypeCodec::encode(&Value::sequence([true, false])).unwrap();
        assert_eq!(encoded, [b'[', 0, 0, 0, 2, b'?', 1, b'?', 0]);
    }

    #[test]
    fn tuple_layout() {
        let encoded = TypeCodec::encode(&Value::tuple([true])).unwrap();
        assert_eq!(encoded, [b'(', 0, 0, 0, 1, b'?', 1]);
    }

    #[test]
    fn variants_never_share_a_prefix() {
        let int = TypeCodec::encode(&Value::Integer(55)).unwrap();
        let float = TypeCodec::encode(&Value::Float(55.0)).unwrap();
        assert_ne!(int[0], float[0]);
        assert_eq!(roundtrip(&Value::Integer(55)).kind(), ValueKind::Integer);
        assert_eq!(roundtrip(&Value::Float(55.0)).kind(), ValueKind::Float);
    }

    // -----------------------------------------------------------------------
    // Round trips
    // -----------------------------------------------------------------------

    #[test]
    fn text_with_embedded_nul() {
        let value = Value::from("mel\0ott\0homeruns");
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn empty_text_and_bytes() {
        assert_eq!(roundtrip(&Value::from("")), Value::from(""));
        assert_eq!(roundtrip(&Value::Bytes(vec![])), Value::Bytes(vec![]));
    }

    #[test]
    fn integer_extremes() {
        for n in [i64::MIN, -1, 0, 1, 1001, i64::MAX] {
            assert_eq!(roundtrip(&Value::Integer(n)), Value::Integer(n));
        }
    }

    #[test]
    fn negative_zero_is_preserved() {
        let decoded = roundtrip(&Value::Float(-0.0));
        assert!(decoded.as_float().unwrap().is_sign_negative());
        assert_ne!(
            TypeCodec::encode(&Value::Float(0.0)).unwrap(),
            TypeCodec::encode(&Value::Float(-0.0)).unwrap()
        );
    }

    #[test]
    fn nan_bits_are_preserved() {
        let odd_nan = f64::from_bits(0x7ff8_0000_dead_beef);
        let decoded = roundtrip(&Value::Float(odd_nan));
        assert_eq!(decoded.as_float().unwrap().to_bits(), odd_nan.to_bits());
    }

    #[test]
    fn fibonacci_sequence() {
        let fib = Value::sequence([1, 1, 2, 3, 5, 8, 13, 21]);
        assert_eq!(roundtrip(&fib), fib);
    }

    #[test]
    fn mixed_nested_sequence() {
        let value = Value::Sequence(vec![
            Value::from("511"),
            Value::from(b"baz"),
            Value::Float(21.34),
            Value::Sequence(vec![Value::Integer(55), Value::Sequence(vec![])]),
            Value::Bool(false),
        ]);
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn timestamp_keeps_offset_and_nanos() {
        let zone = FixedOffset::west_opt(5 * 3600).unwrap();
        let ts = zone.with_ymd_and_hms(1999, 12, 31, 23, 59, 58).unwrap()
            + chrono::Duration::nanoseconds(123_456_789);
        let decoded = roundtrip(&Value::from(ts));
        let back = decoded.as_timestamp().unwrap();
        assert_eq!(back.offset(), &zone);
        assert_eq!(back.timestamp_subsec_nanos(), 123_456_789);
    }

    #[test]
    fn tuple_round_trip_keeps_variant() {
        let tuple = Value::tuple([Value::from("a"), Value::tuple([1, 2]), Value::sequence([3])]);
        let decoded = roundtrip(&tuple);
        assert_eq!(decoded, tuple);
        assert_eq!(decoded.kind(), ValueKind::Tuple);
        assert_ne!(
            TypeCodec::encode(&Value::tuple([1, 2])).unwrap(),
            TypeCodec::encode(&Value::sequence([1, 2])).unwrap()
        );
    }

    #[test]
    fn max_depth_is_accepted() {
        let value = nested(MAX_DEPTH);
        assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn encode_into_appends() {
        let mut buf = vec![0xaa];
        TypeCodec::encode_into(&mut buf, &Value::Bool(true)).unwrap();
        assert_eq!(buf, [0xaa, b'?', 1]);
    }

    #[test]
    fn decode_prefix_reports_consumed() {
        let mut buf = TypeCodec::encode(&Value::Integer(7)).unwrap();
        buf.extend_from_slice(b"rest");
        let (value, consumed) = TypeCodec::decode_prefix(&buf).unwrap();
        assert_eq!(value, Value::Integer(7));
        assert_eq!(consumed, 9);
    }

    // -----------------------------------------------------------------------
    // Encode failures
    // -----------------------------------------------------------------------

    #[test]
    fn too_deep_is_unsupported() {
        let err = TypeCodec::encode(&nested(MAX_DEPTH + 1)).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedType { .. }));
    }

    #[test]
    fn failed_encode_into_leaves_buffer_untouched() {
        let mut buf = vec![1, 2, 3];
        assert!(TypeCodec::encode_into(&mut buf, &nested(MAX_DEPTH + 1)).is_err());
        assert_eq!(buf, [1, 2, 3]);
    }

    // -----------------------------------------------------------------------
    // Decode failures
    // -----------------------------------------------------------------------

    fn assert_corrupt(data: &[u8]) -> usize {
        match TypeCodec::decode(data) {
            Err(CodecError::CorruptPayload { offset, .. }) => offset,
            other => panic!("expected corrupt payload, got {other:?}"),
        }
    }

    #[test]
    fn empty_input() {
        assert_eq!(assert_corrupt(&[]), 0);
    }

    #[test]
    fn unknown_tag() {
        assert_eq!(assert_corrupt(&[b'{', 0, 0]), 0);
    }

    #[test]
    fn truncated_integer() {
        assert_corrupt(&[b'#', 0, 0, 0]);
    }

    #[test]
    fn length_longer_than_payload() {
        assert_eq!(assert_corrupt(&[b'\'', 0, 0, 0, 9, 1, 2]), 5);
    }

    #[test]
    fn trailing_bytes() {
        let mut buf = TypeCodec::encode(&Value::Bool(true)).unwrap();
        buf.push(0);
        assert_eq!(assert_corrupt(&buf), 2);
    }

    #[test]
    fn invalid_utf8() {
        assert_eq!(assert_corrupt(&[b'"', 0, 0, 0, 2, b'a', 0xff]), 6);
    }

    #[test]
    fn invalid_bool_byte() {
        assert_eq!(assert_corrupt(&[b'?', 2]), 1);
    }

    #[test]
    fn invalid_utc_offset() {
        let mut buf = vec![b'+'];
        buf.extend_from_slice(&0i64.to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&86_400i32.to_be_bytes());
        assert_corrupt(&buf);
    }

    #[test]
    fn absurd_sequence_count() {
        assert_eq!(assert_corrupt(&[b'[', 0xff, 0xff, 0xff, 0xff, b'?', 1]), 1);
    }

    #[test]
    fn too_deep_on_decode() {
        let mut buf = Vec::new();
        for _ in 0..=MAX_DEPTH {
            buf.extend_from_slice(&[b'[', 0, 0, 0, 1]);
        }
        buf.extend_from_slice(&[b'?', 1]);
        assert_corrupt(&buf);
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    fn arb_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<String>().prop_map(Value::Text),
            proptest::collection::vec(any::<u8>(), 0..64).prop_map(Value::Bytes),
            any::<i64>().prop_map(Value::Integer),
            any::<f64>().prop_map(Value::Float),
            any::<bool>().prop_map(Value::Bool),
            (-10_000_000_000i64..10_000_000_000, 0u32..1_000_000_000, -86_399i32..86_400)
                .prop_map(|(secs, nanos, offset)| {
                    let zone = FixedOffset::east_opt(offset).unwrap();
                    let instant = DateTime::<Utc>::from_timestamp(secs, nanos).unwrap();
                    Value::Timestamp(instant.with_timezone(&zone))
                }),
        ]
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        arb_scalar().prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..8).prop_map(Value::Sequence),
                proptest::collection::vec(inner, 0..8).prop_map(Value::Tuple),
            ]
        })
    }

    #[derive(Clone, Debug)]
    enum Mutation {
        Keep,
        Truncate(proptest::sample::Index),
        Flip(proptest::sample::Index, u8),
        Append(u8),
    }

    fn arb_mutation() -> impl Strategy<Value = Mutation> {
        prop_oneof![
            Just(Mutation::Keep),
            any::<proptest::sample::Index>().prop_map(Mutation::Truncate),
            (any::<proptest::sample::Index>(), 1u8..=255).prop_map(|(i, x)| Mutation::Flip(i, x)),
            any::<u8>().prop_map(Mutation::Append),
        ]
    }

    /// Encodings of real values, damaged in small ways, so a useful share of
    /// inputs still decodes.
    fn arb_near_valid_bytes() -> impl Strategy<Value = Vec<u8>> {
        (arb_value(), arb_mutation()).prop_map(|(value, mutation)| {
            let mut data = TypeCodec::encode(&value).unwrap();
            match mutation {
                Mutation::Keep => {}
                Mutation::Truncate(i) => data.truncate(i.index(data.len())),
                Mutation::Flip(i, x) => {
                    let at = i.index(data.len());
                    data[at] ^= x;
                }
                Mutation::Append(b) => data.push(b),
            }
            data
        })
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(value in arb_value()) {
            let encoded = TypeCodec::encode(&value).unwrap();
            let decoded = TypeCodec::decode(&encoded).unwrap();
            prop_assert_eq!(decoded.kind(), value.kind());
            prop_assert_eq!(decoded, value);
        }

        #[test]
        fn prop_accepted_bytes_are_canonical(data in arb_near_valid_bytes()) {
            if let Ok(value) = TypeCodec::decode(&data) {
                prop_assert_eq!(TypeCodec::encode(&value).unwrap(), data);
            }
        }

        #[test]
        fn prop_tagged_garbage_never_panics(tag in proptest::sample::select(Tag::ALL.to_vec()),
                                            body in proptest::collection::vec(any::<u8>(), 0..32)) {
            let mut data = vec![tag.as_byte()];
            data.extend_from_slice(&body);
            let _ = TypeCodec::decode(&data);
        }
    }
}
