//! Per-participant-set nonce table

use crate::core::Address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Order-insensitive key for a participant set
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantKey(Vec<Address>);

impl ParticipantKey {
    pub fn new(participants: &[Address]) -> Self {
        let mut sorted = participants.to_vec();
        sorted.sort();
        Self(sorted)
    }

    pub fn participants(&self) -> &[Address] {
        &self.0
    }
}

impl fmt::Display for ParticipantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|a| a.to_string()).collect();
        f.write_str(&parts.join(","))
    }
}

impl FromStr for ParticipantKey {
    type Err = crate::core::AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let participants = s
            .split(',')
            .map(str::parse)
            .collect::<Result<Vec<Address>, _>>()?;
        Ok(Self::new(&participants))
    }
}

impl Serialize for ParticipantKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ParticipantKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Monotonic counters, implicitly zero until first advanced
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NonceTable {
    nonces: BTreeMap<ParticipantKey, u64>,
}

impl NonceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current nonce for a participant set
    pub fn get(&self, participants: &[Address]) -> u64 {
        self.nonces
            .get(&ParticipantKey::new(participants))
            .copied()
            .unwrap_or(0)
    }

    /// Increment by one and return the new value
    pub(crate) fn advance(&mut self, participants: &[Address]) -> u64 {
        let entry = self
            .nonces
            .entry(ParticipantKey::new(participants))
            .or_insert(0);
        *entry += 1;
        *entry
    }

    /// Number of participant sets that have ever advanced
    pub fn len(&self) -> usize {
        self.nonces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nonces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantKey, u64)> {
        self.nonces.iter().map(|(k, v)| (k, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn test_argument_order_irrelevant() {
        let mut table = NonceTable::new();
        assert_eq!(table.get(&[addr(1), addr(2)]), 0);

        assert_eq!(table.advance(&[addr(2), addr(1)]), 1);
        assert_eq!(table.get(&[addr(1), addr(2)]), 1);
        assert_eq!(table.get(&[addr(2), addr(1)]), 1);
        assert_eq!(table.get(&[addr(1), addr(3)]), 0);
    }

    #[test]
    fn test_serde_keys() {
        let mut table = NonceTable::new();
        table.advance(&[addr(2), addr(1)]);
        table.advance(&[addr(2), addr(1)]);

        let json = serde_json::to_string(&table).unwrap();
        let back: NonceTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
        assert_eq!(back.get(&[addr(1), addr(2)]), 2);
    }
}
