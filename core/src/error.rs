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

use std::fmt;
use thiserror::Error;

/// The error type for signing helper operations
#[derive(Error, Debug)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
    context: Vec<String>,
    retryable: bool,
}

/// The kind of error that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Certificate could not be parsed or uses an unsupported key algorithm
    CertificateInvalid,

    /// Private key could not be parsed in any supported container format
    PrivateKeyInvalid,

    /// Signature could not be produced (key/digest mismatch, rng failure)
    SigningFailed,

    /// The remote endpoint rejected the request with a non-success status
    CredentialDenied,

    /// The remote endpoint answered with a body that could not be understood
    ResponseInvalid,

    /// The request could not be delivered (dns, connect, io)
    Network,

    /// The request did not complete before the deadline
    Timeout,

    /// Request cannot be signed (missing required fields, etc.)
    RequestInvalid,

    /// Configuration error (missing fields, invalid values)
    ConfigInvalid,

    /// Unexpected errors
    Unexpected,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            context: Vec::new(),
            retryable: false,
        }
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attach a line of context, like the file path or endpoint involved.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Mark whether retrying the same operation may succeed.
    pub fn set_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the error message without context
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the context lines attached to this error
    pub fn context(&self) -> &[String] {
        &self.context
    }

    /// Check if retrying the operation may succeed
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Check if this error was raised while loading certificate or key material
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::CertificateInvalid | ErrorKind::PrivateKeyInvalid
        )
    }

    /// Check if this error comes from the transport layer
    pub fn is_network_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Network | ErrorKind::Timeout)
    }

    /// Check if the remote endpoint answered but the exchange still failed
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::CredentialDenied | ErrorKind::ResponseInvalid
        )
    }
}

// Convenience constructors
impl Error {
    /// Create a certificate invalid error
    pub fn certificate_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CertificateInvalid, message)
    }

    /// Create a private key invalid error
    pub fn private_key_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PrivateKeyInvalid, message)
    }

    /// Create a signing failed error
    pub fn signing_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SigningFailed, message)
    }

    /// Create a credential denied error
    pub fn credential_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialDenied, message)
    }

    /// Create a response invalid error
    pub fn response_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ResponseInvalid, message)
    }

    /// Create a network error, retryable by default
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message).set_retryable(true)
    }

    /// Create a timeout error, retryable by default
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message).set_retryable(true)
    }

    /// Create a request invalid error
    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestInvalid, message)
    }

    /// Create a config invalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)?;
        for ctx in &self.context {
            write!(f, ", {ctx}")?;
        }
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::CertificateInvalid => write!(f, "invalid certificate"),
            ErrorKind::PrivateKeyInvalid => write!(f, "invalid private key"),
            ErrorKind::SigningFailed => write!(f, "signing failed"),
            ErrorKind::CredentialDenied => write!(f, "credential denied"),
            ErrorKind::ResponseInvalid => write!(f, "invalid response"),
            ErrorKind::Network => write!(f, "network error"),
            ErrorKind::Timeout => write!(f, "timed out"),
            ErrorKind::RequestInvalid => write!(f, "invalid request"),
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

// Common From implementations
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(err)
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::ToStrError> for Error {
    fn from(err: http::header::ToStrError) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}
