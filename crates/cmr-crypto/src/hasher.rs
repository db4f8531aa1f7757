use std::io::{self, Read};

use sha2::Digest;

/// Incremental hash computation.
pub trait HashState: Send {
    fn update(&mut self, data: &[u8]);

    /// Consume the state and return the raw digest.
    fn finalize(self: Box<Self>) -> Vec<u8>;
}

/// A named hash algorithm.
pub trait Hasher: Send + Sync {
    /// Algorithm name as it appears in digest descriptors (e.g. `SHA-256`).
    fn algorithm(&self) -> &str;

    /// Start a new incremental computation.
    fn create(&self) -> Box<dyn HashState>;

    /// Hex digest of a byte slice.
    fn digest(&self, data: &[u8]) -> String {
        let mut state = self.create();
        state.update(data);
        hex::encode(state.finalize())
    }

    /// Hex digest of everything a reader yields.
    fn digest_reader(&self, reader: &mut dyn Read) -> io::Result<String> {
        let mut state = self.create();
        let mut buf = [0u8; 8192];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            state.update(&buf[..n]);
        }
        Ok(hex::encode(state.finalize()))
    }
}

struct Sha256State(sha2::Sha256);

impl HashState for Sha256State {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().to_vec()
    }
}

struct Sha512State(sha2::Sha512);

impl HashState for Sha512State {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().to_vec()
    }
}

struct Blake3State(blake3::Hasher);

impl HashState for Blake3State {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().as_bytes().to_vec()
    }
}

/// SHA-256.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Hasher;

impl Sha256Hasher {
    pub const ALGORITHM: &'static str = "SHA-256";
}

impl Hasher for Sha256Hasher {
    fn algorithm(&self) -> &str {
        Self::ALGORITHM
    }

    fn create(&self) -> Box<dyn HashState> {
        Box::new(Sha256State(sha2::Sha256::new()))
    }
}

/// SHA-512.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha512Hasher;

impl Sha512Hasher {
    pub const ALGORITHM: &'static str = "SHA-512";
}

impl Hasher for Sha512Hasher {
    fn algorithm(&self) -> &str {
        Self::ALGORITHM
    }

    fn create(&self) -> Box<dyn HashState> {
        Box::new(Sha512State(sha2::Sha512::new()))
    }
}

/// BLAKE3 (32-byte output).
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake3Hasher;

impl Blake3Hasher {
    pub const ALGORITHM: &'static str = "BLAKE3";
}

impl Hasher for Blake3Hasher {
    fn algorithm(&self) -> &str {
        Self::ALGORITHM
    }

    fn create(&self) -> Box<dyn HashState> {
        Box::new(Blake3State(blake3::Hasher::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            Sha256Hasher.digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn blake3_matches_library() {
        assert_eq!(
            Blake3Hasher.digest(b"hello world"),
            blake3::hash(b"hello world").to_hex().to_string()
        );
    }

    #[test]
    fn reader_digest_matches_slice_digest() {
        let data = vec![7u8; 20_000];
        for hasher in [&Sha256Hasher as &dyn Hasher, &Sha512Hasher, &Blake3Hasher] {
            let mut cursor = io::Cursor::new(&data);
            assert_eq!(hasher.digest_reader(&mut cursor).unwrap(), hasher.digest(&data));
        }
    }

    #[test]
    fn hash_is_deterministic_and_distinct() {
        assert_eq!(Sha256Hasher.digest(b"x"), Sha256Hasher.digest(b"x"));
        assert_ne!(Sha256Hasher.digest(b"x"), Sha256Hasher.digest(b"y"));
        assert_eq!(Sha512Hasher.digest(b"x").len(), 128);
    }
}
