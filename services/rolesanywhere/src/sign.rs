// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::fmt::{Display, Formatter};

use p256::ecdsa::signature::hazmat::PrehashSigner;
use rand::rngs::StdRng;
use rand::{CryptoRng, RngCore, SeedableRng};
use rsa::Pkcs1v15Sign;
use sha2::{Sha256, Sha384, Sha512};
use signing_helper_core::hash::{sha256, sha384, sha512};
use signing_helper_core::{Error, Result};

use crate::key::{EcPrivateKey, KeyType, PrivateKey};

/// Digest used to hash the canonical request and to build the signature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DigestAlgorithm {
    /// SHA-256
    #[default]
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl DigestAlgorithm {
    /// Hash `content` with this algorithm.
    pub fn digest(&self, content: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha256 => sha256(content),
            DigestAlgorithm::Sha384 => sha384(content),
            DigestAlgorithm::Sha512 => sha512(content),
        }
    }

    /// Output length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }

    fn pkcs1v15(&self) -> Pkcs1v15Sign {
        match self {
            DigestAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
            DigestAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
            DigestAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
        }
    }
}

impl Display for DigestAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DigestAlgorithm::Sha256 => f.write_str("SHA256"),
            DigestAlgorithm::Sha384 => f.write_str("SHA384"),
            DigestAlgorithm::Sha512 => f.write_str("SHA512"),
        }
    }
}

/// Algorithm identifier used in the string to sign and the authorization header.
///
/// For example: `AWS4-X509-RSA-SHA256`, `AWS4-X509-ECDSA-SHA384`.
pub fn signing_algorithm(key_type: KeyType, digest: DigestAlgorithm) -> String {
    match key_type {
        KeyType::Rsa => format!("AWS4-X509-RSA-{digest}"),
        KeyType::Ec => format!("AWS4-X509-ECDSA-{digest}"),
    }
}

/// Options for a single [`sign`] call.
#[derive(Debug, Clone, Copy)]
pub struct SigningOpts<'a> {
    /// Key used to sign.
    pub private_key: &'a PrivateKey,
    /// Digest applied to the payload.
    pub digest: DigestAlgorithm,
}

/// Output of a single [`sign`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningResult {
    /// Lowercase hex encoded signature.
    pub signature: String,
}

/// Hash `payload` and sign the digest.
pub fn sign(payload: &[u8], opts: &SigningOpts<'_>) -> Result<SigningResult> {
    sign_with_rng(&mut rand::rngs::OsRng, payload, opts)
}

/// Same as [`sign`] with an explicit random source.
///
/// The random source is only used for RSA blinding. ECDSA nonces are derived from the key
/// and the digest, so ECDSA signatures do not depend on it. A failing random source is
/// reported as [`signing_helper_core::ErrorKind::SigningFailed`].
pub fn sign_with_rng<R: CryptoRng + RngCore>(
    rng: &mut R,
    payload: &[u8],
    opts: &SigningOpts<'_>,
) -> Result<SigningResult> {
    let digest = opts.digest.digest(payload);
    let signature = opts.private_key.sign_digest(rng, &digest, opts.digest)?;

    Ok(SigningResult {
        signature: hex::encode(signature),
    })
}

impl PrivateKey {
    /// Sign a precomputed digest.
    ///
    /// - RSA: PKCS#1 v1.5 with the OID of `alg`.
    /// - EC: DER encoded `(r, s)`, digest truncated to the curve order when longer.
    pub fn sign_digest<R: CryptoRng + RngCore>(
        &self,
        rng: &mut R,
        digest: &[u8],
        alg: DigestAlgorithm,
    ) -> Result<Vec<u8>> {
        if digest.len() != alg.output_len() {
            return Err(Error::signing_failed(format!(
                "digest length {} does not match {alg}",
                digest.len()
            )));
        }

        match self {
            PrivateKey::Rsa(key) => {
                // Blinding draws from the rng infallibly, so seed it up front.
                let mut seed = <StdRng as SeedableRng>::Seed::default();
                rng.try_fill_bytes(&mut seed).map_err(|e| {
                    Error::signing_failed("failed to read random source").with_source(e)
                })?;
                let mut blinding = StdRng::from_seed(seed);

                key.sign_with_rng(&mut blinding, alg.pkcs1v15(), digest)
                    .map_err(|e| {
                        Error::signing_failed("failed to sign digest with rsa key").with_source(e)
                    })
            }
            PrivateKey::Ec(EcPrivateKey::P256(key)) => {
                let sig: p256::ecdsa::Signature = key.sign_prehash(digest).map_err(|e| {
                    Error::signing_failed("failed to sign digest with p256 key").with_source(e)
                })?;
                Ok(sig.to_der().as_bytes().to_vec())
            }
            PrivateKey::Ec(EcPrivateKey::P384(key)) => {
                let sig: p384::ecdsa::Signature = key.sign_prehash(digest).map_err(|e| {
                    Error::signing_failed("failed to sign digest with p384 key").with_source(e)
                })?;
                Ok(sig.to_der().as_bytes().to_vec())
            }
        }
    }
}
