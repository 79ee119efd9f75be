use core::fmt::{self, Write as _};
use std::io;

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

use crate::{Error, MAX_NODE_ID, Result};

/// A validated node identifier in `0..=1023`.
///
/// Node IDs keep generators on different machines from minting the same ID.
/// Assigning distinct node IDs across a cluster is the caller's job; this
/// type only guarantees the value fits the 10-bit field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Largest valid node ID.
    pub const MAX: Self = Self(MAX_NODE_ID);

    /// Validates an explicitly supplied node ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `value > 1023`.
    pub fn new(value: u64) -> Result<Self> {
        if value > MAX_NODE_ID {
            return Err(out_of_range(value));
        }
        Ok(Self(value))
    }

    /// Derives a node ID from the hardware addresses reported by `source`.
    ///
    /// The addresses are rendered as upper-case hex, concatenated, hashed
    /// with [`string_hash`] and masked to 10 bits. If enumeration fails or
    /// finds no usable address this falls back to [`NodeId::random`] instead
    /// of failing.
    pub fn from_hardware(source: &impl HardwareAddressSource) -> Self {
        let addresses = match source.hardware_addresses() {
            Ok(addresses) => addresses,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                warn!(
                    error = %_e,
                    "failed to enumerate network interfaces, using a random node id"
                );
                return Self::random();
            }
        };

        let mut hex = String::new();
        for address in addresses.iter().filter(|a| is_usable(a)) {
            for byte in address {
                let _ = write!(hex, "{byte:02X}");
            }
        }

        if hex.is_empty() {
            #[cfg(feature = "tracing")]
            warn!("no network interface reported a hardware address, using a random node id");
            return Self::random();
        }

        let node = Self::masked(u64::from(string_hash(&hex) as u32));
        #[cfg(feature = "tracing")]
        debug!(node_id = node.0, "derived node id from hardware addresses");
        node
    }

    /// Picks a node ID from the thread-local CSPRNG.
    pub fn random() -> Self {
        Self::masked(u64::from(rand::random::<u32>()))
    }

    /// Returns the raw node ID.
    pub const fn get(self) -> u64 {
        self.0
    }

    const fn masked(value: u64) -> Self {
        Self(value & MAX_NODE_ID)
    }
}

impl TryFrom<u64> for NodeId {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<i64> for NodeId {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        let value = u64::try_from(value).map_err(|_| out_of_range(value))?;
        Self::new(value)
    }
}

impl From<NodeId> for u64 {
    fn from(node: NodeId) -> Self {
        node.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

fn out_of_range(value: impl fmt::Display) -> Error {
    Error::invalid_configuration(format!(
        "node id {value} must be between 0 and {MAX_NODE_ID}"
    ))
}

// Loopback and some virtual interfaces report an all-zero address.
fn is_usable(address: &[u8]) -> bool {
    address.iter().any(|&b| b != 0)
}

/// Enumerates the hardware (MAC) addresses of the local network interfaces.
///
/// [`SystemInterfaces`] reads them from the host; tests substitute a fixed
/// list or a failing source.
pub trait HardwareAddressSource {
    /// Returns one entry per interface that has a hardware address.
    ///
    /// # Errors
    ///
    /// Returns an error if the interfaces could not be enumerated.
    fn hardware_addresses(&self) -> io::Result<Vec<Vec<u8>>>;
}

/// The host's network interfaces.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemInterfaces;

impl HardwareAddressSource for SystemInterfaces {
    fn hardware_addresses(&self) -> io::Result<Vec<Vec<u8>>> {
        let interfaces = mac_address::MacAddressIterator::new().map_err(io::Error::other)?;
        Ok(interfaces.map(|mac| mac.bytes().to_vec()).collect())
    }
}

/// Where a generator gets its node ID from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NodeIdSource {
    /// A caller-assigned value, validated to `0..=1023`.
    Explicit(i64),
    /// Derived from the host's hardware addresses, random if there are none.
    #[default]
    Network,
    /// Drawn from the CSPRNG.
    Random,
}

impl NodeIdSource {
    /// Resolves the node ID. Only [`NodeIdSource::Explicit`] can fail.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for an explicit value outside
    /// `0..=1023`.
    pub fn resolve(&self) -> Result<NodeId> {
        match *self {
            Self::Explicit(value) => NodeId::try_from(value),
            Self::Network => Ok(NodeId::from_hardware(&SystemInterfaces)),
            Self::Random => Ok(NodeId::random()),
        }
    }
}

impl From<Option<i64>> for NodeIdSource {
    fn from(node_id: Option<i64>) -> Self {
        node_id.map_or(Self::Network, Self::Explicit)
    }
}

/// Deterministic 32-bit polynomial string hash: `h = 31 * h + c` over the
/// UTF-16 code units with wrapping arithmetic.
///
/// The hash is stable across platforms and releases, so a host keeps its
/// derived node ID as long as its interfaces do not change.
pub fn string_hash(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(i32::from(c)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedInterfaces(Vec<Vec<u8>>);

    impl HardwareAddressSource for FixedInterfaces {
        fn hardware_addresses(&self) -> io::Result<Vec<Vec<u8>>> {
            Ok(self.0.clone())
        }
    }

    struct FailingInterfaces;

    impl HardwareAddressSource for FailingInterfaces {
        fn hardware_addresses(&self) -> io::Result<Vec<Vec<u8>>> {
            Err(io::Error::other("no permission"))
        }
    }

    #[test]
    fn explicit_range_is_validated() {
        assert_eq!(NodeId::new(1023).unwrap().get(), 1023);
        assert_eq!(NodeId::new(0).unwrap().get(), 0);
        assert!(matches!(
            NodeId::new(1024),
            Err(Error::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            NodeId::try_from(-1i64),
            Err(Error::InvalidConfiguration { .. })
        ));
        assert_eq!(NodeId::try_from(5i64).unwrap().get(), 5);
    }

    #[test]
    fn explicit_source_errors_instead_of_masking() {
        assert!(NodeIdSource::Explicit(1024).resolve().is_err());
        assert!(NodeIdSource::Explicit(-1).resolve().is_err());
        assert_eq!(NodeIdSource::Explicit(7).resolve().unwrap().get(), 7);
    }

    #[test]
    fn string_hash_matches_reference_values() {
        assert_eq!(string_hash(""), 0);
        assert_eq!(string_hash("abc"), 96354);
        assert_eq!(string_hash("hello"), 99_162_322);
        assert_eq!(string_hash("001A2B3C4D5EAABBCCDDEEFF"), -669_896_496);
    }

    #[test]
    fn hardware_node_id_is_deterministic() {
        let source = FixedInterfaces(vec![vec![0x00, 0x1A, 0x2B, 0x3C, 0x4D, 0x5E]]);
        assert_eq!(NodeId::from_hardware(&source).get(), 560);
        assert_eq!(NodeId::from_hardware(&source), NodeId::from_hardware(&source));
    }

    #[test]
    fn hardware_addresses_are_concatenated_in_order() {
        // Negative hash: masking keeps the low 10 bits of the 32-bit value.
        let source = FixedInterfaces(vec![
            vec![0x00, 0x1A, 0x2B, 0x3C, 0x4D, 0x5E],
            vec![0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF],
        ]);
        assert_eq!(NodeId::from_hardware(&source).get(), 208);
    }

    #[test]
    fn zero_addresses_are_skipped() {
        let with_loopback = FixedInterfaces(vec![
            vec![0; 6],
            vec![0x00, 0x1A, 0x2B, 0x3C, 0x4D, 0x5E],
        ]);
        assert_eq!(NodeId::from_hardware(&with_loopback).get(), 560);
    }

    #[test]
    fn falls_back_to_random_in_range() {
        for _ in 0..64 {
            assert!(NodeId::from_hardware(&FailingInterfaces).get() <= MAX_NODE_ID);
            assert!(NodeId::from_hardware(&FixedInterfaces(vec![])).get() <= MAX_NODE_ID);
            assert!(NodeId::random().get() <= MAX_NODE_ID);
        }
    }

    #[test]
    fn derived_sources_always_resolve() {
        assert!(NodeIdSource::Network.resolve().unwrap() <= NodeId::MAX);
        assert!(NodeIdSource::Random.resolve().unwrap() <= NodeId::MAX);
        assert_eq!(NodeIdSource::from(None), NodeIdSource::Network);
        assert_eq!(NodeIdSource::from(Some(3)), NodeIdSource::Explicit(3));
    }
}
