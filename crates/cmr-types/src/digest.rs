use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a digest variant: which hash algorithm was applied to which
/// normalised form of the content.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigesterType {
    pub hash_algorithm: String,
    pub normalization_algorithm: String,
}

impl DigesterType {
    pub fn new(hash_algorithm: impl Into<String>, normalization_algorithm: impl Into<String>) -> Self {
        Self {
            hash_algorithm: hash_algorithm.into(),
            normalization_algorithm: normalization_algorithm.into(),
        }
    }
}

impl fmt::Display for DigesterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.hash_algorithm, self.normalization_algorithm)
    }
}

/// A computed content digest.
///
/// The serialized field names follow the persisted component descriptor
/// format (`hashAlgorithm`, `normalisationAlgorithm`, `value`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestDescriptor {
    pub hash_algorithm: String,
    pub normalisation_algorithm: String,
    pub value: String,
}

impl DigestDescriptor {
    pub fn new(
        hash_algorithm: impl Into<String>,
        normalisation_algorithm: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            hash_algorithm: hash_algorithm.into(),
            normalisation_algorithm: normalisation_algorithm.into(),
            value: value.into(),
        }
    }

    /// The digester variant that produced this descriptor.
    pub fn digester_type(&self) -> DigesterType {
        DigesterType::new(&self.hash_algorithm, &self.normalisation_algorithm)
    }
}

impl fmt::Display for DigestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}[{}]",
            self.hash_algorithm, self.value, self.normalisation_algorithm
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_reports_its_type() {
        let d = DigestDescriptor::new("SHA-256", "genericBlobDigest/v1", "abcd");
        assert_eq!(
            d.digester_type(),
            DigesterType::new("SHA-256", "genericBlobDigest/v1")
        );
    }

    #[test]
    fn descriptor_wire_names() {
        let d = DigestDescriptor::new("SHA-256", "genericBlobDigest/v1", "abcd");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["hashAlgorithm"], "SHA-256");
        assert_eq!(json["normalisationAlgorithm"], "genericBlobDigest/v1");
        assert_eq!(json["value"], "abcd");
    }

    #[test]
    fn display_forms() {
        let t = DigesterType::new("hash", "norm");
        assert_eq!(t.to_string(), "hash/norm");
        let d = DigestDescriptor::new("hash", "norm", "Z");
        assert_eq!(d.to_string(), "hash:Z[norm]");
    }
}
