//! Hash providers: one implementation per algorithm name.
//!
//! SHA-1 and the SHA-2 family are built in. SHA-3 and BLAKE2b ship behind the
//! `sha3` / `blake2` cargo features and are registered explicitly, mirroring a
//! runtime where those primitives come from an optional crypto provider.

use std::marker::PhantomData;

use sha2::Digest;

/// Computes one named digest.
pub trait HashProvider: Send + Sync {
    /// Lowercase algorithm name this provider answers for, e.g. `sha-256`.
    fn algorithm(&self) -> &str;

    fn digest(&self, data: &[u8]) -> Vec<u8>;
}

/// Adapter from any RustCrypto [`Digest`] to [`HashProvider`].
pub struct DigestProvider<D> {
    name: &'static str,
    _digest: PhantomData<fn() -> D>,
}

impl<D> DigestProvider<D> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _digest: PhantomData,
        }
    }
}

impl<D: Digest> HashProvider for DigestProvider<D> {
    fn algorithm(&self) -> &str {
        self.name
    }

    fn digest(&self, data: &[u8]) -> Vec<u8> {
        D::digest(data).to_vec()
    }
}

impl<D> std::fmt::Debug for DigestProvider<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestProvider").field("name", &self.name).finish()
    }
}

pub(crate) fn builtin() -> Vec<Box<dyn HashProvider>> {
    vec![
        Box::new(DigestProvider::<sha1::Sha1>::new("sha-1")),
        Box::new(DigestProvider::<sha2::Sha224>::new("sha-224")),
        Box::new(DigestProvider::<sha2::Sha256>::new("sha-256")),
        Box::new(DigestProvider::<sha2::Sha384>::new("sha-384")),
        Box::new(DigestProvider::<sha2::Sha512>::new("sha-512")),
    ]
}

/// `sha3-256` and `sha3-512`.
#[cfg(feature = "sha3")]
pub fn sha3_providers() -> Vec<Box<dyn HashProvider>> {
    vec![
        Box::new(DigestProvider::<sha3::Sha3_256>::new("sha3-256")),
        Box::new(DigestProvider::<sha3::Sha3_512>::new("sha3-512")),
    ]
}

/// `blake2b-256` and `blake2b-512`.
#[cfg(feature = "blake2")]
pub fn blake2_providers() -> Vec<Box<dyn HashProvider>> {
    type Blake2b256 = blake2::Blake2b<blake2::digest::consts::U32>;
    vec![
        Box::new(DigestProvider::<Blake2b256>::new("blake2b-256")),
        Box::new(DigestProvider::<blake2::Blake2b512>::new("blake2b-512")),
    ]
}
