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

use std::fmt::{Debug, Display, Formatter};

use log::debug;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use signing_helper_core::hash::base64_encode;
use signing_helper_core::time::{now, DateTime};
use signing_helper_core::{Context, Error, Result, SigningCredential};
use x509_parser::parse_x509_certificate;
use x509_parser::public_key::PublicKey;

use crate::Config;

const CERTIFICATE_TAG: &str = "CERTIFICATE";

/// Public key family of a certificate or private key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    /// rsaEncryption
    Rsa,
    /// id-ecPublicKey
    Ec,
}

impl Display for KeyType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyType::Rsa => f.write_str("RSA"),
            KeyType::Ec => f.write_str("EC"),
        }
    }
}

/// A parsed X.509 certificate with the fields needed for signing.
#[derive(Clone, PartialEq, Eq)]
pub struct CertificateData {
    key_type: KeyType,
    certificate_data: String,
    serial_number: String,
    not_after: DateTime,
    der: Vec<u8>,
}

impl Debug for CertificateData {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateData")
            .field("key_type", &self.key_type)
            .field("serial_number", &self.serial_number)
            .field("not_after", &self.not_after)
            .finish_non_exhaustive()
    }
}

impl CertificateData {
    /// Parse the first `CERTIFICATE` block of a PEM document.
    pub fn from_pem(content: &[u8]) -> Result<Self> {
        let blocks = pem::parse_many(content).map_err(|e| {
            Error::certificate_invalid("could not parse certificate: invalid pem").with_source(e)
        })?;
        let block = blocks
            .iter()
            .find(|p| p.tag() == CERTIFICATE_TAG)
            .ok_or_else(|| {
                Error::certificate_invalid("could not parse certificate: no certificate block")
            })?;

        Self::from_der(block.contents())
    }

    /// Parse a DER encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (_, cert) = parse_x509_certificate(der).map_err(|e| {
            Error::certificate_invalid(format!("could not parse certificate: {e}"))
        })?;

        let key_type = match cert.public_key().parsed() {
            Ok(PublicKey::RSA(_)) => KeyType::Rsa,
            Ok(PublicKey::EC(_)) => KeyType::Ec,
            Ok(_) => {
                return Err(Error::certificate_invalid(
                    "could not parse certificate: unsupported public key algorithm",
                )
                .with_context(format!(
                    "algorithm: {}",
                    cert.public_key().algorithm.algorithm
                )))
            }
            Err(e) => {
                return Err(Error::certificate_invalid(format!(
                    "could not parse certificate: invalid public key: {e}"
                )))
            }
        };

        let not_after =
            DateTime::from_timestamp(cert.validity().not_after.timestamp(), 0).ok_or_else(|| {
                Error::certificate_invalid("could not parse certificate: validity out of range")
            })?;

        Ok(Self {
            key_type,
            certificate_data: base64_encode(der),
            serial_number: cert.serial.to_string(),
            not_after,
            der: der.to_vec(),
        })
    }

    /// Public key family of this certificate.
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Base64 encoded DER, as sent in `x-amz-x509`.
    pub fn certificate_data(&self) -> &str {
        &self.certificate_data
    }

    /// Serial number in decimal.
    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    /// End of the validity period.
    pub fn not_after(&self) -> DateTime {
        self.not_after
    }

    /// Raw DER bytes.
    pub fn der(&self) -> &[u8] {
        &self.der
    }
}

/// Read a single PEM certificate.
pub async fn read_certificate_data(ctx: &Context, path: &str) -> Result<CertificateData> {
    let content = ctx.file_read(path).await?;
    CertificateData::from_pem(&content).map_err(|e| e.with_context(format!("path: {path}")))
}

/// Read every certificate of a PEM bundle in file order.
///
/// A bundle without any PEM block yields an empty list.
pub async fn read_certificate_bundle_data(
    ctx: &Context,
    path: &str,
) -> Result<Vec<CertificateData>> {
    let content = ctx.file_read(path).await?;
    parse_certificate_bundle(&content).map_err(|e| e.with_context(format!("path: {path}")))
}

fn parse_certificate_bundle(content: &[u8]) -> Result<Vec<CertificateData>> {
    let blocks = pem::parse_many(content).map_err(|e| {
        Error::certificate_invalid("could not parse certificate: invalid pem").with_source(e)
    })?;

    blocks
        .iter()
        .enumerate()
        .map(|(idx, block)| {
            if block.tag() != CERTIFICATE_TAG {
                return Err(Error::certificate_invalid(format!(
                    "could not parse certificate: unexpected pem block `{}`",
                    block.tag()
                ))
                .with_context(format!("index: {idx}")));
            }
            CertificateData::from_der(block.contents())
                .map_err(|e| e.with_context(format!("index: {idx}")))
        })
        .collect()
}

/// EC private key on one of the supported curves.
#[derive(Clone)]
pub enum EcPrivateKey {
    /// NIST P-256
    P256(p256::ecdsa::SigningKey),
    /// NIST P-384
    P384(p384::ecdsa::SigningKey),
}

/// Private key material, tagged with its family at load time.
#[derive(Clone)]
pub enum PrivateKey {
    /// RSA private key.
    Rsa(Box<RsaPrivateKey>),
    /// EC private key.
    Ec(EcPrivateKey),
}

impl Debug for PrivateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PrivateKey::Rsa(_) => f.write_str("PrivateKey::Rsa(***)"),
            PrivateKey::Ec(EcPrivateKey::P256(_)) => f.write_str("PrivateKey::Ec(P256, ***)"),
            PrivateKey::Ec(EcPrivateKey::P384(_)) => f.write_str("PrivateKey::Ec(P384, ***)"),
        }
    }
}

impl PrivateKey {
    /// Parse a PEM private key.
    ///
    /// PKCS#1, SEC1 and PKCS#8 containers are all tried for every private key block,
    /// whatever its label says.
    pub fn from_pem(content: &[u8]) -> Result<Self> {
        let blocks = pem::parse_many(content).map_err(|e| {
            Error::private_key_invalid("unable to parse private key: invalid pem").with_source(e)
        })?;

        for block in blocks.iter().filter(|p| p.tag().ends_with("PRIVATE KEY")) {
            if let Some(key) = Self::from_der(block.contents()) {
                return Ok(key);
            }
            debug!("pem block `{}` is not a supported private key", block.tag());
        }

        Err(Error::private_key_invalid(
            "unable to parse private key: no supported key found",
        ))
    }

    fn from_der(der: &[u8]) -> Option<Self> {
        if let Ok(k) = RsaPrivateKey::from_pkcs1_der(der) {
            return Some(PrivateKey::Rsa(Box::new(k)));
        }
        if let Ok(k) = p256::SecretKey::from_sec1_der(der) {
            return Some(PrivateKey::Ec(EcPrivateKey::P256(k.into())));
        }
        if let Ok(k) = p384::SecretKey::from_sec1_der(der) {
            return Some(PrivateKey::Ec(EcPrivateKey::P384(k.into())));
        }
        if let Ok(k) = RsaPrivateKey::from_pkcs8_der(der) {
            return Some(PrivateKey::Rsa(Box::new(k)));
        }
        if let Ok(k) = p256::SecretKey::from_pkcs8_der(der) {
            return Some(PrivateKey::Ec(EcPrivateKey::P256(k.into())));
        }
        if let Ok(k) = p384::SecretKey::from_pkcs8_der(der) {
            return Some(PrivateKey::Ec(EcPrivateKey::P384(k.into())));
        }
        None
    }

    /// Family of this key.
    pub fn key_type(&self) -> KeyType {
        match self {
            PrivateKey::Rsa(_) => KeyType::Rsa,
            PrivateKey::Ec(_) => KeyType::Ec,
        }
    }
}

/// Read a PEM private key.
pub async fn read_private_key_data(ctx: &Context, path: &str) -> Result<PrivateKey> {
    let content = ctx.file_read(path).await?;
    PrivateKey::from_pem(&content).map_err(|e| e.with_context(format!("path: {path}")))
}

/// A leaf certificate, its intermediates and the matching private key.
#[derive(Clone, Debug)]
pub struct X509Identity {
    certificate: CertificateData,
    chain: Vec<CertificateData>,
    private_key: PrivateKey,
}

impl X509Identity {
    /// Create a new identity, rejecting a private key of another family than the
    /// certificate.
    pub fn new(
        certificate: CertificateData,
        chain: Vec<CertificateData>,
        private_key: PrivateKey,
    ) -> Result<Self> {
        if certificate.key_type() != private_key.key_type() {
            return Err(Error::config_invalid(format!(
                "private key type {} does not match certificate key type {}",
                private_key.key_type(),
                certificate.key_type()
            )));
        }

        Ok(Self {
            certificate,
            chain,
            private_key,
        })
    }

    /// Load the identity described by `config`.
    pub async fn load(ctx: &Context, config: &Config) -> Result<Self> {
        let cert_path = config
            .certificate_id
            .as_deref()
            .ok_or_else(|| Error::config_invalid("certificate_id is required"))?;
        let key_path = config
            .private_key_id
            .as_deref()
            .ok_or_else(|| Error::config_invalid("private_key_id is required"))?;

        let certificate = read_certificate_data(ctx, cert_path).await?;
        let chain = match config.certificate_bundle_id.as_deref() {
            Some(path) => read_certificate_bundle_data(ctx, path).await?,
            None => Vec::new(),
        };
        let private_key = read_private_key_data(ctx, key_path).await?;

        Self::new(certificate, chain, private_key)
    }

    /// Leaf certificate.
    pub fn certificate(&self) -> &CertificateData {
        &self.certificate
    }

    /// Intermediate certificates.
    pub fn chain(&self) -> &[CertificateData] {
        &self.chain
    }

    /// Private key.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }
}

impl SigningCredential for X509Identity {
    fn is_valid(&self) -> bool {
        self.certificate.not_after > now()
    }
}
