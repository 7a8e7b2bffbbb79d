//! Serialization of fitted parameters.
//!
//! Fitted stages expose their learned state as plain parameter structs
//! (`Vec<f64>`, scalars, enums). This module is the single codec that turns
//! those structs into bytes and back: bincode with fixed-width little-endian
//! integers. Decoding rejects trailing bytes.

use crate::error::{HousingError, Result};
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

/// A parameter representation that can be serialized to and from bytes.
///
/// Implementors should contain only plain numerical data, never live handles.
pub trait SerializableParams: Sized {
    /// Serialize the parameters into a byte buffer.
    fn to_bytes(&self) -> Result<Vec<u8>>;

    /// Deserialize the parameters from a byte buffer.
    ///
    /// Undecodable input is reported as `CorruptArtifact`.
    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}

impl<T> SerializableParams for T
where
    T: Serialize + DeserializeOwned,
{
    fn to_bytes(&self) -> Result<Vec<u8>> {
        codec().serialize(self).map_err(|e| HousingError::Serialization(e.to_string()))
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        codec().deserialize(bytes).map_err(|e| HousingError::CorruptArtifact(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Stats {
        values: Vec<f64>,
        n_features: usize,
    }

    #[test]
    fn test_params_bytes_are_exact() {
        let stats = Stats {
            values: vec![0.1 + 0.2, -1e-300, f64::MAX],
            n_features: 3,
        };
        let bytes = stats.to_bytes().unwrap();
        let restored = Stats::from_bytes(&bytes).unwrap();
        assert_eq!(stats, restored);
    }

    #[test]
    fn test_truncated_bytes_are_corrupt() {
        let stats = Stats {
            values: vec![1.0, 2.0],
            n_features: 2,
        };
        let bytes = stats.to_bytes().unwrap();
        let result = Stats::from_bytes(&bytes[..bytes.len() - 3]);
        assert!(matches!(result, Err(HousingError::CorruptArtifact(_))));
    }

    #[test]
    fn test_trailing_bytes_are_corrupt() {
        let stats = Stats {
            values: vec![1.0],
            n_features: 1,
        };
        let mut bytes = stats.to_bytes().unwrap();
        bytes.push(0);
        let result = Stats::from_bytes(&bytes);
        assert!(matches!(result, Err(HousingError::CorruptArtifact(_))));
    }
}
