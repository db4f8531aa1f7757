//! Well-known resource type names.
//!
//! Digesters are registered per resource type; these are the names the
//! built-in registrations and tests use. Any other string is equally valid.

/// A generic OCI artifact following the OCI image specification.
pub const OCI_ARTIFACT: &str = "ociArtifact";
/// An OCI artifact containing an image.
pub const OCI_IMAGE: &str = "ociImage";
/// A helm chart, stored either as OCI artifact or as tar blob.
pub const HELM_CHART: &str = "helmChart";
/// Any anonymous, untyped blob.
pub const BLOB: &str = "blob";
/// A directory structure stored as archive.
pub const DIRECTORY_TREE: &str = "directoryTree";
/// Plain text content.
pub const PLAIN_TEXT: &str = "plainText";
