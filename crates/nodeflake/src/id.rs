use core::fmt;

/// Number of bits in the timestamp field.
pub const EPOCH_BITS: u32 = 41;

/// Number of bits in the node ID field.
pub const NODE_ID_BITS: u32 = 10;

/// Number of bits in the sequence field.
pub const SEQUENCE_BITS: u32 = 12;

/// Largest node ID that fits in [`NODE_ID_BITS`] (`1023`).
pub const MAX_NODE_ID: u64 = (1 << NODE_ID_BITS) - 1;

/// Largest sequence value that fits in [`SEQUENCE_BITS`] (`4095`).
pub const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;

/// Largest timestamp (milliseconds since the epoch) that fits in
/// [`EPOCH_BITS`].
pub const MAX_TIMESTAMP: u64 = (1 << EPOCH_BITS) - 1;

/// A 64-bit Snowflake ID.
///
/// - 1 bit reserved (always zero, keeps the value a positive `i64`)
/// - 41 bits timestamp (ms since the generator epoch)
/// - 10 bits node ID
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63           63 62            22 21          12 11             0
///              +--------------+----------------+--------------+---------------+
///  Field:      | reserved (1) | timestamp (41) | node ID (10) | sequence (12) |
///              +--------------+----------------+--------------+---------------+
///              |<----------- MSB ---------- 64 bits --------- LSB ----------->|
/// ```
///
/// Ordering follows the raw integer, so IDs sort by timestamp, then node,
/// then sequence.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnowflakeId {
    id: u64,
}

impl SnowflakeId {
    /// Number of bits to shift the timestamp to its position (bit 22).
    pub const TIMESTAMP_SHIFT: u32 = NODE_ID_BITS + SEQUENCE_BITS;

    /// Number of bits to shift the node ID to its position (bit 12).
    pub const NODE_ID_SHIFT: u32 = SEQUENCE_BITS;

    /// Bitmask selecting the node ID field in place (bits 12 through 21).
    pub const NODE_ID_MASK: u64 = MAX_NODE_ID << Self::NODE_ID_SHIFT;

    /// Bitmask selecting the sequence field (bits 0 through 11).
    pub const SEQUENCE_MASK: u64 = MAX_SEQUENCE;

    /// Bitmask selecting the reserved high bit.
    pub const RESERVED_MASK: u64 = 1 << 63;

    /// Packs the three components into an ID.
    ///
    /// Components are not range checked; values wider than their field bleed
    /// into the neighbouring fields. See [`encode`].
    pub const fn from_components(timestamp: u64, node_id: u64, sequence: u64) -> Self {
        Self {
            id: encode(timestamp, node_id, sequence),
        }
    }

    /// Wraps a raw integer without validation.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns the raw integer.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Returns the ID as an `i64`, the type most databases store it as.
    ///
    /// Lossless for every ID produced by a generator since the reserved bit is
    /// always zero.
    pub const fn as_i64(&self) -> i64 {
        self.id as i64
    }

    /// Milliseconds since the generator epoch.
    pub const fn timestamp(&self) -> u64 {
        self.id >> Self::TIMESTAMP_SHIFT
    }

    pub const fn node_id(&self) -> u64 {
        (self.id & Self::NODE_ID_MASK) >> Self::NODE_ID_SHIFT
    }

    pub const fn sequence(&self) -> u64 {
        self.id & Self::SEQUENCE_MASK
    }

    /// Returns `true` if the reserved bit is clear.
    pub const fn is_valid(&self) -> bool {
        self.id & Self::RESERVED_MASK == 0
    }

    /// Returns true if the sequence can be incremented within the current
    /// millisecond.
    pub const fn has_sequence_room(&self) -> bool {
        self.sequence() < MAX_SEQUENCE
    }

    /// Returns a new ID with the sequence incremented.
    pub(crate) const fn increment_sequence(&self) -> Self {
        Self::from_components(self.timestamp(), self.node_id(), self.sequence() + 1)
    }

    /// Returns a new ID for a newer timestamp with the sequence reset to zero.
    pub(crate) const fn rollover_to_timestamp(&self, timestamp: u64) -> Self {
        Self::from_components(timestamp, self.node_id(), 0)
    }

    /// Decodes the ID, adding `epoch` back onto the timestamp.
    pub const fn decode(&self, epoch: u64) -> ParsedId {
        decode(self.id, epoch)
    }

    /// Returns the ID as a zero-padded 20-digit string.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_raw()
    }
}

impl From<u64> for SnowflakeId {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("raw", &format_args!("0x{:016x} ({})", self.id, self.id))
            .field("timestamp", &self.timestamp())
            .field("node_id", &self.node_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

/// The decoded components of an ID.
///
/// Unlike [`SnowflakeId::timestamp`], `timestamp` here is absolute:
/// milliseconds since the Unix epoch.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParsedId {
    pub timestamp: u64,
    pub node_id: u64,
    pub sequence: u64,
}

/// Packs `(timestamp, node_id, sequence)` into a raw 64-bit ID:
/// `(timestamp << 22) | (node_id << 12) | sequence`.
///
/// The caller is responsible for keeping `timestamp < 2^41`,
/// `node_id <= 1023` and `sequence <= 4095`; the generator always does.
pub const fn encode(timestamp: u64, node_id: u64, sequence: u64) -> u64 {
    (timestamp << SnowflakeId::TIMESTAMP_SHIFT) | (node_id << SnowflakeId::NODE_ID_SHIFT) | sequence
}

/// Unpacks a raw ID into its components. Pure, and the inverse of
/// [`encode`]: `decode(encode(t, n, s), e) == (t + e, n, s)`.
pub const fn decode(id: u64, epoch: u64) -> ParsedId {
    ParsedId {
        timestamp: (id >> SnowflakeId::TIMESTAMP_SHIFT).saturating_add(epoch),
        node_id: (id & SnowflakeId::NODE_ID_MASK) >> SnowflakeId::NODE_ID_SHIFT,
        sequence: id & SnowflakeId::SEQUENCE_MASK,
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for SnowflakeId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        s.serialize_u64(self.id)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for SnowflakeId {
    /// Rejects integers with the reserved bit set.
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = Self::from_raw(<u64 as serde::Deserialize>::deserialize(d)?);
        if !id.is_valid() {
            return Err(serde::de::Error::custom(format_args!(
                "{id} has the reserved bit set"
            )));
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_EPOCH;

    #[test]
    fn known_literal_decodes() {
        let raw = encode(0, 5, 0);
        assert_eq!(raw, 20480);
        assert_eq!(
            decode(raw, DEFAULT_EPOCH),
            ParsedId {
                timestamp: 1_420_070_400_000,
                node_id: 5,
                sequence: 0,
            }
        );
    }

    #[test]
    fn round_trips_field_boundaries() {
        let timestamps = [0, 1, 1 << 20, MAX_TIMESTAMP - 1, MAX_TIMESTAMP];
        let nodes = [0, 1, 512, MAX_NODE_ID];
        let sequences = [0, 1, 2048, MAX_SEQUENCE];

        for &t in &timestamps {
            for &n in &nodes {
                for &s in &sequences {
                    let id = SnowflakeId::from_components(t, n, s);
                    assert!(id.is_valid());
                    assert_eq!(
                        decode(id.to_raw(), 0),
                        ParsedId {
                            timestamp: t,
                            node_id: n,
                            sequence: s,
                        }
                    );
                }
            }
        }
    }

    #[test]
    fn fields_do_not_overlap() {
        let id = SnowflakeId::from_components(MAX_TIMESTAMP, 0, 0);
        assert_eq!(id.node_id(), 0);
        assert_eq!(id.sequence(), 0);
        assert_eq!(id.to_raw(), i64::MAX as u64 & !((1 << 22) - 1));

        let id = SnowflakeId::from_components(0, MAX_NODE_ID, 0);
        assert_eq!(id.timestamp(), 0);
        assert_eq!(id.sequence(), 0);
        assert_eq!(id.to_raw(), SnowflakeId::NODE_ID_MASK);
    }

    #[test]
    fn max_id_is_a_positive_i64() {
        let id = SnowflakeId::from_components(MAX_TIMESTAMP, MAX_NODE_ID, MAX_SEQUENCE);
        assert_eq!(id.as_i64(), i64::MAX);
        assert!(!id.has_sequence_room());
    }

    #[test]
    fn reserved_bit_is_invalid() {
        assert!(!SnowflakeId::from_raw(1 << 63).is_valid());
        assert!(SnowflakeId::from_raw(20480).is_valid());
    }

    #[test]
    fn ordering_follows_timestamp_then_sequence() {
        let a = SnowflakeId::from_components(10, 3, MAX_SEQUENCE);
        let b = SnowflakeId::from_components(11, 3, 0);
        let c = b.increment_sequence();
        assert!(a < b && b < c);
        assert_eq!(c.sequence(), 1);
        assert_eq!(a.rollover_to_timestamp(11), b);
    }

    #[test]
    fn display_and_padding() {
        let id = SnowflakeId::from_raw(20480);
        assert_eq!(id.to_string(), "20480");
        assert_eq!(id.to_padded_string(), "00000000000000020480");
        assert_eq!(format!("{id:>8}"), "   20480");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_uses_native_integer() {
        let id = SnowflakeId::from_components(1234, 7, 9);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, id.to_raw().to_string());
        let back: SnowflakeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        let reserved = (1u64 << 63).to_string();
        assert!(serde_json::from_str::<SnowflakeId>(&reserved).is_err());
    }
}
