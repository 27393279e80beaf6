//! A single accumulator cell of an invertible Bloom filter.
//!
//! A bucket keeps a signed count of the items stored in it, the XOR of their
//! contents, and the XOR of their digests. XOR is taken over the longer
//! operand, the shorter one being padded with zero bytes, so a bucket's byte
//! sequences grow to the longest content it has ever seen.
//!
//! ## Wire form
//!
//! ```text
//! <count>:<base64(xored)>:<base64(hashed)>
//! ```
//!
//! The empty bucket is `0::`.
//!
//! Counts wrap modulo 2^64, so grouping stays invertible for any count a
//! peer sends.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::IbfError;

/// An immutable accumulator of (count, XOR of contents, XOR of digests).
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Bucket {
    count: i64,
    xored: Vec<u8>,
    hashed: Vec<u8>,
}

impl Bucket {
    /// The empty bucket: count zero, zero-length byte sequences.
    pub const EMPTY: Self = Self {
        count: 0,
        xored: Vec::new(),
        hashed: Vec::new(),
    };

    /// Build a bucket from raw parts.
    pub fn new(count: i64, xored: Vec<u8>, hashed: Vec<u8>) -> Self {
        Self {
            count,
            xored,
            hashed,
        }
    }

    /// Signed number of items accumulated.
    pub fn count(&self) -> i64 {
        self.count
    }

    /// XOR of every accumulated content.
    pub fn xored(&self) -> &[u8] {
        &self.xored
    }

    /// XOR of every accumulated digest.
    pub fn hashed(&self) -> &[u8] {
        &self.hashed
    }

    /// Accumulate `delta` occurrences of an item with the given digest.
    pub fn modify(&self, delta: i64, content: &[u8], digest: &[u8]) -> Bucket {
        Bucket {
            count: self.count.wrapping_add(delta),
            xored: xor(&self.xored, content),
            hashed: xor(&self.hashed, digest),
        }
    }

    /// Accumulate the whole state of another bucket.
    pub fn group(&self, other: &Bucket) -> Bucket {
        Bucket {
            count: self.count.wrapping_add(other.count),
            xored: xor(&self.xored, &other.xored),
            hashed: xor(&self.hashed, &other.hashed),
        }
    }

    /// Take the whole state of another bucket back out.
    ///
    /// XOR is its own inverse, so only the count differs from [`group`].
    ///
    /// [`group`]: Bucket::group
    pub fn ungroup(&self, other: &Bucket) -> Bucket {
        Bucket {
            count: self.count.wrapping_sub(other.count),
            xored: xor(&self.xored, &other.xored),
            hashed: xor(&self.hashed, &other.hashed),
        }
    }

    /// True when nothing is accumulated: zero count and all-zero bytes.
    ///
    /// The byte sequences may be longer than zero after items cancelled out.
    pub fn is_empty(&self) -> bool {
        self.count == 0
            && self.xored.iter().all(|b| *b == 0)
            && self.hashed.iter().all(|b| *b == 0)
    }
}

fn xor(left: &[u8], right: &[u8]) -> Vec<u8> {
    let (long, short) = if left.len() >= right.len() {
        (left, right)
    } else {
        (right, left)
    };
    let mut out = long.to_vec();
    for (o, s) in out.iter_mut().zip(short) {
        *o ^= s;
    }
    out
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.count,
            STANDARD.encode(&self.xored),
            STANDARD.encode(&self.hashed)
        )
    }
}

impl FromStr for Bucket {
    type Err = IbfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split(':');
        let (Some(count), Some(xored), Some(hashed), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(IbfError::MalformedBucket(format!(
                "expected three colon-separated fields in {:?}",
                s
            )));
        };

        let count = count
            .parse::<i64>()
            .map_err(|e| IbfError::MalformedBucket(format!("count {:?}: {}", count, e)))?;
        let xored = STANDARD
            .decode(xored)
            .map_err(|e| IbfError::MalformedBucket(format!("content: {}", e)))?;
        let hashed = STANDARD
            .decode(hashed)
            .map_err(|e| IbfError::MalformedBucket(format!("digest: {}", e)))?;

        Ok(Bucket::new(count, xored, hashed))
    }
}

impl fmt::Debug for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bucket({}, {}, {})",
            self.count,
            hex::encode(&self.xored),
            hex::encode(&self.hashed)
        )
    }
}

impl Serialize for Bucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Bucket {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bucket_strategy() -> impl Strategy<Value = Bucket> {
        (
            -8i64..=8,
            prop::collection::vec(any::<u8>(), 0..12),
            prop::collection::vec(any::<u8>(), 0..12),
        )
            .prop_map(|(count, xored, hashed)| Bucket::new(count, xored, hashed))
    }

    #[test]
    fn test_empty_wire_form() {
        assert_eq!(Bucket::EMPTY.to_string(), "0::");
        assert_eq!("0::".parse::<Bucket>().unwrap(), Bucket::EMPTY);
        assert_eq!(Bucket::default(), Bucket::EMPTY);
    }

    #[test]
    fn test_modify_zero_extends() {
        let b = Bucket::EMPTY
            .modify(1, &[0x01, 0x02], &[0xff])
            .modify(1, &[0x10], &[0x0f, 0x01]);
        assert_eq!(b.count(), 2);
        assert_eq!(b.xored(), &[0x11, 0x02]);
        assert_eq!(b.hashed(), &[0xf0, 0x01]);
    }

    #[test]
    fn test_modify_cancels() {
        let b = Bucket::EMPTY.modify(1, b"abc", b"d").modify(-1, b"abc", b"d");
        assert!(b.is_empty());
        assert_eq!(b.xored().len(), 3);
        assert_ne!(b, Bucket::EMPTY);
    }

    #[test]
    fn test_ungroup_self_is_empty() {
        let b = Bucket::EMPTY.modify(3, b"abc", b"def");
        assert!(b.ungroup(&b).is_empty());
    }

    #[test]
    fn test_known_wire_form() {
        let b = Bucket::EMPTY.modify(-1, &[5], &[4]);
        assert_eq!(b.to_string(), "-1:BQ==:BA==");
    }

    #[test]
    fn test_extreme_counts_wrap() {
        let top = Bucket::new(i64::MAX, vec![1], vec![2]);
        assert_eq!(top.modify(1, &[1], &[2]).count(), i64::MIN);

        let bottom: Bucket = "-9223372036854775808::".parse().unwrap();
        let small = Bucket::EMPTY.modify(3, b"x", b"y");
        assert_eq!(small.ungroup(&bottom).count(), i64::MIN + 3);
        assert_eq!(small.ungroup(&bottom).group(&bottom), small);
        assert!(bottom.ungroup(&bottom).is_empty());
    }

    #[test]
    fn test_malformed_rejected() {
        assert!("".parse::<Bucket>().is_err());
        assert!("1:AA==".parse::<Bucket>().is_err());
        assert!("1:AA==:AA==:AA==".parse::<Bucket>().is_err());
        assert!("x:AA==:AA==".parse::<Bucket>().is_err());
        assert!("1:!!:AA==".parse::<Bucket>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let b = Bucket::EMPTY.modify(1, &[5], &[4]);
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(json, "\"1:BQ==:BA==\"");
        let back: Bucket = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
    }

    proptest! {
        #[test]
        fn test_wire_roundtrip(b in bucket_strategy()) {
            let parsed: Bucket = b.to_string().parse().unwrap();
            prop_assert_eq!(parsed, b);
        }

        #[test]
        fn test_group_commutative(a in bucket_strategy(), b in bucket_strategy()) {
            prop_assert_eq!(a.group(&b), b.group(&a));
        }

        #[test]
        fn test_group_associative(
            a in bucket_strategy(),
            b in bucket_strategy(),
            c in bucket_strategy(),
        ) {
            prop_assert_eq!(a.group(&b).group(&c), a.group(&b.group(&c)));
        }

        #[test]
        fn test_group_empty_identity(b in bucket_strategy()) {
            prop_assert_eq!(b.group(&Bucket::EMPTY), b.clone());
            prop_assert_eq!(Bucket::EMPTY.group(&b), b);
        }

        #[test]
        fn test_group_is_modify(a in bucket_strategy(), b in bucket_strategy()) {
            prop_assert_eq!(a.group(&b), a.modify(b.count(), b.xored(), b.hashed()));
        }
    }
}
