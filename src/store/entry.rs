//! Value model shared by the local (memory and sled) stores.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Bytes(Vec<u8>),
    Hash(BTreeMap<String, String>),
    SortedSet(BTreeMap<String, f64>),
    Set(BTreeSet<String>),
    List(VecDeque<Vec<u8>>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub value: Value,
    /// Absolute expiry in epoch milliseconds
    pub expires_at: Option<i64>,
}

impl Entry {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    pub fn is_expired(&self, now_millis: i64) -> bool {
        self.expires_at.is_some_and(|at| now_millis >= at)
    }

    /// Empty collections are dropped, as Redis drops them.
    pub fn is_empty(&self) -> bool {
        match &self.value {
            Value::Bytes(_) => false,
            Value::Hash(hash) => hash.is_empty(),
            Value::SortedSet(zset) => zset.is_empty(),
            Value::Set(set) => set.is_empty(),
            Value::List(list) => list.is_empty(),
        }
    }
}

macro_rules! typed_access {
    ($read:ident, $write:ident, $variant:ident, $ty:ty) => {
        pub fn $read<'a>(entry: Option<&'a Entry>, key: &str) -> Result<Option<&'a $ty>, StoreError> {
            match entry.map(|e| &e.value) {
                None => Ok(None),
                Some(Value::$variant(inner)) => Ok(Some(inner)),
                Some(_) => Err(StoreError::WrongType(key.to_string())),
            }
        }

        /// Borrow the slot as this type, creating an empty one if absent.
        pub fn $write<'a>(slot: &'a mut Option<Entry>, key: &str) -> Result<&'a mut $ty, StoreError> {
            let entry = slot.get_or_insert_with(|| Entry::new(Value::$variant(Default::default())));
            match &mut entry.value {
                Value::$variant(inner) => Ok(inner),
                _ => Err(StoreError::WrongType(key.to_string())),
            }
        }
    };
}

typed_access!(bytes_ref, bytes_mut, Bytes, Vec<u8>);
typed_access!(hash_ref, hash_mut, Hash, BTreeMap<String, String>);
typed_access!(zset_ref, zset_mut, SortedSet, BTreeMap<String, f64>);
typed_access!(set_ref, set_mut, Set, BTreeSet<String>);
typed_access!(list_ref, list_mut, List, VecDeque<Vec<u8>>);

/// Members ordered by score, then by member, like a Redis sorted set.
pub fn ordered_members(zset: &BTreeMap<String, f64>) -> Vec<(&String, f64)> {
    let mut members: Vec<_> = zset.iter().map(|(member, score)| (member, *score)).collect();
    members.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    members
}
