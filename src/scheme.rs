//! Identifier schemes and the single-field records keyed by them.

use std::fmt;

use clap::ValueEnum;
use mongodb::bson::{oid::ObjectId, spec::BinarySubtype, Binary, Bson};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the `_id` of a benchmark record is generated and encoded.
///
/// Adding a scheme means adding a variant here plus its arm in each match;
/// the runner iterates whatever set the configuration lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
pub enum IdentifierScheme {
    /// 12-byte ObjectId: timestamp, process-unique value and counter.
    #[serde(rename = "oid")]
    #[value(name = "oid")]
    ObjectId,
    /// 16-byte random (v4) UUID, stored as BSON binary subtype 4.
    #[serde(rename = "uuid")]
    #[value(name = "uuid")]
    Uuid,
}

impl IdentifierScheme {
    pub const ALL: [IdentifierScheme; 2] = [IdentifierScheme::ObjectId, IdentifierScheme::Uuid];

    /// Label used in result rows, e.g. `"mongodb local OID"`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ObjectId => "OID",
            Self::Uuid => "UUID",
        }
    }

    pub fn collection_suffix(&self) -> &'static str {
        match self {
            Self::ObjectId => "oid",
            Self::Uuid => "uuid",
        }
    }

    /// Generate a fresh identifier of this scheme.
    pub fn generate(&self) -> Identifier {
        match self {
            Self::ObjectId => Identifier::ObjectId(ObjectId::new()),
            Self::Uuid => Identifier::Uuid(Uuid::new_v4()),
        }
    }
}

impl fmt::Display for IdentifierScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A document key of one of the supported schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identifier {
    ObjectId(ObjectId),
    Uuid(Uuid),
}

impl Identifier {
    pub fn scheme(&self) -> IdentifierScheme {
        match self {
            Self::ObjectId(_) => IdentifierScheme::ObjectId,
            Self::Uuid(_) => IdentifierScheme::Uuid,
        }
    }

    /// Encoded size of the raw key in bytes.
    pub fn byte_len(&self) -> usize {
        match self {
            Self::ObjectId(oid) => oid.bytes().len(),
            Self::Uuid(uuid) => uuid.as_bytes().len(),
        }
    }

    pub fn to_bson(&self) -> Bson {
        match self {
            Self::ObjectId(oid) => Bson::ObjectId(*oid),
            Self::Uuid(uuid) => Bson::Binary(Binary {
                subtype: BinarySubtype::Uuid,
                bytes: uuid.as_bytes().to_vec(),
            }),
        }
    }

    /// Decode an `_id` value read back from the database.
    ///
    /// Returns `None` for BSON values that no scheme produces.
    pub fn from_bson(value: &Bson) -> Option<Identifier> {
        match value {
            Bson::ObjectId(oid) => Some(Self::ObjectId(*oid)),
            Bson::Binary(bin) if bin.subtype == BinarySubtype::Uuid => {
                Uuid::from_slice(&bin.bytes).ok().map(Self::Uuid)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ObjectId(oid) => write!(f, "ObjectId({})", oid.to_hex()),
            Self::Uuid(uuid) => write!(f, "UUID({})", uuid.hyphenated()),
        }
    }
}

/// A benchmark document. It has exactly one field, its `_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Record {
    pub id: Identifier,
}

impl Record {
    /// Build a record with a freshly generated identifier.
    pub fn new(scheme: IdentifierScheme) -> Self {
        Self {
            id: scheme.generate(),
        }
    }

    /// Build `count` records of one scheme, in generation order.
    pub fn batch(scheme: IdentifierScheme, count: usize) -> Vec<Record> {
        (0..count).map(|_| Record::new(scheme)).collect()
    }
}
