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

use async_trait::async_trait;
use http::request::Parts;
use http::{header, HeaderValue};
use log::debug;
use rand::{CryptoRng, RngCore};
use signing_helper_core::hash::{hex_sha256, EMPTY_STRING_SHA256};
use signing_helper_core::time::{now, DateTime};
use signing_helper_core::{Context, Error, Result, SignRequest, SigningRequest};

use crate::canonical::{
    canonical_request_string, canonicalize_headers, credential_scope, signed_header_names,
    string_to_sign,
};
use crate::key::X509Identity;
use crate::sign::{signing_algorithm, DigestAlgorithm};

/// RequestSigner attaches asymmetric SigV4 headers to a request.
#[derive(Debug)]
pub struct RequestSigner {
    service: String,
    region: String,
    digest: DigestAlgorithm,
}

impl RequestSigner {
    /// Create a new signer for `service` in `region` using SHA-256.
    pub fn new(service: &str, region: &str) -> Self {
        Self {
            service: service.into(),
            region: region.into(),
            digest: DigestAlgorithm::default(),
        }
    }

    /// Set the digest algorithm.
    pub fn with_digest(mut self, digest: DigestAlgorithm) -> Self {
        self.digest = digest;
        self
    }

    /// Sign `req` as of `now`.
    ///
    /// `req` is only modified once the signature has been computed; on error it is left
    /// as it was.
    pub fn sign_at(
        &self,
        req: &mut Parts,
        body: &[u8],
        identity: &X509Identity,
        now: DateTime,
    ) -> Result<()> {
        self.sign_at_with_rng(&mut rand::rngs::OsRng, req, body, identity, now)
    }

    /// Same as [`RequestSigner::sign_at`] with an explicit random source.
    pub fn sign_at_with_rng<R: CryptoRng + RngCore>(
        &self,
        rng: &mut R,
        req: &mut Parts,
        body: &[u8],
        identity: &X509Identity,
        now: DateTime,
    ) -> Result<()> {
        let mut signed_req = SigningRequest::build(req)?;

        canonicalize_headers(&mut signed_req, identity, body, now)?;

        let payload_hash = if body.is_empty() {
            EMPTY_STRING_SHA256.to_string()
        } else {
            hex_sha256(body)
        };
        let creq = canonical_request_string(&signed_req, &payload_hash)?;
        debug!("calculated canonical request: {creq}");
        let encoded_req = hex::encode(self.digest.digest(creq.as_bytes()));

        let algorithm = signing_algorithm(identity.certificate().key_type(), self.digest);
        let scope = credential_scope(now, &self.region, &self.service);
        debug!("calculated scope: {scope}");

        let string_to_sign = string_to_sign(&algorithm, now, &scope, &encoded_req)?;
        debug!("calculated string to sign: {string_to_sign}");

        let digest = self.digest.digest(string_to_sign.as_bytes());
        let signature = identity
            .private_key()
            .sign_digest(rng, &digest, self.digest)?;

        let mut authorization = HeaderValue::from_str(&format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            algorithm,
            identity.certificate().serial_number(),
            scope,
            signed_header_names(&signed_req).join(";"),
            hex::encode(signature)
        ))
        .map_err(|e| {
            Error::unexpected("failed to create authorization header").with_source(e)
        })?;
        authorization.set_sensitive(true);

        signed_req
            .headers
            .insert(header::AUTHORIZATION, authorization);

        signed_req.apply(req)
    }
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = X509Identity;

    async fn sign_request(
        &self,
        _: &Context,
        req: &mut Parts,
        body: &[u8],
        credential: Option<&Self::Credential>,
    ) -> Result<()> {
        let Some(identity) = credential else {
            return Ok(());
        };

        self.sign_at(req, body, identity, now())
    }
}
