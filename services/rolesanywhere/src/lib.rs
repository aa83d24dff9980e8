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

//! Certificate based request signing and session exchange.
//!
//! This crate signs HTTP requests with an X.509 certificate and its private key using
//! the asymmetric SigV4 scheme (`AWS4-X509-RSA-*` and `AWS4-X509-ECDSA-*`), and trades
//! such a signed request for temporary credentials at a `POST /sessions` endpoint.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use signing_helper_core::{Context, OsEnv, ProvideCredential};
//! use signing_helper_file_read_tokio::TokioFileRead;
//! use signing_helper_http_send_reqwest::ReqwestHttpSend;
//! use signing_helper_rolesanywhere::{Config, CreateSessionCredentialProvider};
//!
//! #[tokio::main]
//! async fn main() -> signing_helper_core::Result<()> {
//!     let ctx = Context::new()
//!         .with_file_read(TokioFileRead)
//!         .with_http_send(ReqwestHttpSend::default())
//!         .with_env(OsEnv);
//!
//!     let config = Config::default()
//!         .with_certificate_id("/etc/pki/workload.pem")
//!         .with_private_key_id("/etc/pki/workload-key.pem")
//!         .from_env(&ctx)?;
//!
//!     let provider = CreateSessionCredentialProvider::new(Arc::new(config));
//!     if let Some(cred) = provider.provide_credential(&ctx).await? {
//!         println!("credential expires at {}", cred.expiration);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Signing other requests
//!
//! [`RequestSigner`] works on any `http::request::Parts`. The signing time is an explicit
//! argument of [`RequestSigner::sign_at`]; the [`signing_helper_core::SignRequest`]
//! implementation uses the current time.
//!
//! ```no_run
//! use signing_helper_rolesanywhere::{
//!     CertificateData, DigestAlgorithm, PrivateKey, RequestSigner, X509Identity,
//! };
//!
//! # fn example(cert: &[u8], key: &[u8]) -> signing_helper_core::Result<()> {
//! let identity = X509Identity::new(
//!     CertificateData::from_pem(cert)?,
//!     vec![],
//!     PrivateKey::from_pem(key)?,
//! )?;
//!
//! let (mut parts, body) = http::Request::post("https://rolesanywhere.us-east-1.amazonaws.com/sessions")
//!     .body(b"{}".to_vec())
//!     .expect("request must be valid")
//!     .into_parts();
//!
//! RequestSigner::new("rolesanywhere", "us-east-1")
//!     .with_digest(DigestAlgorithm::Sha256)
//!     .sign_at(&mut parts, &body, &identity, chrono::Utc::now())?;
//! # Ok(())
//! # }
//! ```

mod constants;

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod key;
pub use key::read_certificate_bundle_data;
pub use key::read_certificate_data;
pub use key::read_private_key_data;
pub use key::CertificateData;
pub use key::EcPrivateKey;
pub use key::KeyType;
pub use key::PrivateKey;
pub use key::X509Identity;

mod sign;
pub use sign::sign;
pub use sign::sign_with_rng;
pub use sign::signing_algorithm;
pub use sign::DigestAlgorithm;
pub use sign::SigningOpts;
pub use sign::SigningResult;

pub mod canonical;

mod sign_request;
pub use sign_request::RequestSigner;

mod provide_credential;
pub use provide_credential::*;
