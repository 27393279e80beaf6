//! Golden wire vectors.
//!
//! These pin the textual bucket and filter encodings so that independent
//! implementations can exchange summaries.

use setrecon_core::{Bucket, Ibf, Result};

use crate::fixtures::{stub_config, STUB_ITEM_A, STUB_ITEM_B};

/// A bucket and its expected wire text.
#[derive(Debug, Clone)]
pub struct BucketVector {
    /// Short label reported on failure.
    pub name: &'static str,
    /// Bucket count.
    pub count: i64,
    /// Content XOR.
    pub xored: &'static [u8],
    /// Digest XOR.
    pub hashed: &'static [u8],
    /// Expected `count:xored:hashed` text.
    pub wire: &'static str,
}

impl BucketVector {
    pub fn bucket(&self) -> Bucket {
        Bucket::new(self.count, self.xored.to_vec(), self.hashed.to_vec())
    }
}

/// Get all bucket vectors.
pub fn bucket_vectors() -> Vec<BucketVector> {
    vec![
        BucketVector {
            name: "empty bucket",
            count: 0,
            xored: &[],
            hashed: &[],
            wire: "0::",
        },
        BucketVector {
            name: "single removal",
            count: -1,
            xored: &[5],
            hashed: &[4],
            wire: "-1:BQ==:BA==",
        },
        BucketVector {
            name: "text content",
            count: 1,
            xored: b"hello",
            hashed: &[0xff],
            wire: "1:aGVsbG8=:/w==",
        },
        BucketVector {
            name: "no padding",
            count: 2,
            xored: &[0, 0, 0],
            hashed: &[1, 2, 3],
            wire: "2:AAAA:AQID",
        },
        BucketVector {
            name: "plus sign alphabet, empty hash",
            count: -42,
            xored: &[0xde, 0xad, 0xbe, 0xef],
            hashed: &[],
            wire: "-42:3q2+7w==:",
        },
    ]
}

/// A filter built from stub items and its expected JSON.
#[derive(Debug, Clone)]
pub struct FilterVector {
    /// Short label reported on failure.
    pub name: &'static str,
    /// Items added to an empty filter, in order.
    pub added: &'static [&'static [u8]],
    /// Expected JSON wire form.
    pub json: &'static str,
}

impl FilterVector {
    /// Build the filter at level 5 with the stub configuration.
    pub fn build(&self) -> Result<Ibf> {
        let mut ibf = Ibf::new(5, stub_config())?;
        for item in self.added {
            ibf = ibf.add(item)?;
        }
        Ok(ibf)
    }
}

/// Get all filter vectors.
pub fn filter_vectors() -> Vec<FilterVector> {
    vec![
        FilterVector {
            name: "one item",
            added: &[STUB_ITEM_A],
            json: r#"{"level":5,"buckets":["0::","0::","0::","1:BQ==:BA==","1:BQ==:BA==","0::","1:BQ==:BA==","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::"]}"#,
        },
        FilterVector {
            name: "two overlapping items",
            added: &[STUB_ITEM_A, STUB_ITEM_B],
            json: r#"{"level":5,"buckets":["0::","0::","1:Bg==:CA==","2:Aw==:DA==","2:Aw==:DA==","0::","1:BQ==:BA==","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::","0::"]}"#,
        },
    ]
}

/// Check every vector in both directions, returning the names that fail.
pub fn verify_all_vectors() -> Vec<&'static str> {
    let mut failures = Vec::new();
    for vector in bucket_vectors() {
        let encoded = vector.bucket().to_string();
        let decoded = vector.wire.parse::<Bucket>().ok();
        if encoded != vector.wire || decoded.as_ref() != Some(&vector.bucket()) {
            failures.push(vector.name);
        }
    }
    for vector in filter_vectors() {
        let Ok(ibf) = vector.build() else {
            failures.push(vector.name);
            continue;
        };
        let encoded = ibf.to_json().ok();
        let decoded = Ibf::from_json(vector.json, stub_config()).ok();
        if encoded.as_deref() != Some(vector.json) || decoded.as_ref() != Some(&ibf) {
            failures.push(vector.name);
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_pass() {
        let failures = verify_all_vectors();
        assert!(failures.is_empty(), "failing vectors: {:?}", failures);
    }

    #[test]
    fn test_filter_vectors_decode_to_their_items() {
        for vector in filter_vectors() {
            let ibf = Ibf::from_json(vector.json, stub_config()).unwrap();
            let diff = ibf.decode();
            assert!(diff.complete, "{}", vector.name);
            assert_eq!(diff.removed.len(), vector.added.len(), "{}", vector.name);
        }
    }

    #[test]
    fn test_vector_names_unique() {
        let mut names: Vec<_> = bucket_vectors().iter().map(|v| v.name).collect();
        names.extend(filter_vectors().iter().map(|v| v.name));
        let count = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), count);
    }
}
