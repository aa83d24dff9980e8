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

use http::uri::Authority;
use http::HeaderMap;
use http::HeaderValue;
use http::Method;
use percent_encoding::percent_decode_str;

use crate::{Error, Result};

/// Signing context for request.
///
/// Built from a borrowed request so that a failed signing attempt never leaves the
/// original request half modified. The result is written back with [`SigningRequest::apply`].
#[derive(Debug, Clone)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP authority.
    pub authority: Authority,
    /// HTTP path.
    pub path: String,
    /// HTTP query parameters, percent decoded.
    ///
    /// A `+` is kept as is and a key without `=` has an empty value.
    pub query: Vec<(String, String)>,
    /// HTTP headers.
    pub headers: HeaderMap,
}

impl SigningRequest {
    /// Build a signing context from http::request::Parts.
    pub fn build(parts: &http::request::Parts) -> Result<Self> {
        let authority = parts.uri.authority().cloned().ok_or_else(|| {
            Error::request_invalid("request without authority is invalid for signing")
        })?;
        let path = match parts.uri.path() {
            "" => "/".to_string(),
            v => v.to_string(),
        };

        Ok(SigningRequest {
            method: parts.method.clone(),
            authority,
            path,
            query: parts
                .uri
                .query()
                .map(Self::query_decode)
                .unwrap_or_default(),
            headers: parts.headers.clone(),
        })
    }

    fn query_decode(query: &str) -> Vec<(String, String)> {
        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                (
                    percent_decode_str(k).decode_utf8_lossy().into_owned(),
                    percent_decode_str(v).decode_utf8_lossy().into_owned(),
                )
            })
            .collect()
    }

    /// Apply the signing context back to http::request::Parts.
    ///
    /// Only the method and headers are written back. The URI is signed as sent and is
    /// never rewritten.
    pub fn apply(self, parts: &mut http::request::Parts) -> Result<()> {
        parts.method = self.method;
        parts.headers = self.headers;
        Ok(())
    }

    /// Normalize header value.
    ///
    /// Leading and trailing spaces are removed and every inner run of spaces or tabs is
    /// collapsed into a single space.
    pub fn header_value_normalize(v: &mut HeaderValue) {
        let sensitive = v.is_sensitive();

        let mut out = Vec::with_capacity(v.len());
        for word in v
            .as_bytes()
            .split(|b| *b == b' ' || *b == b'\t')
            .filter(|w| !w.is_empty())
        {
            if !out.is_empty() {
                out.push(b' ');
            }
            out.extend_from_slice(word);
        }

        // Only whitespace was removed from a valid value, so this always succeeds.
        if let Ok(mut normalized) = HeaderValue::from_bytes(&out) {
            normalized.set_sensitive(sensitive);
            *v = normalized;
        }
    }

    /// Get header names as sorted vector.
    pub fn header_name_to_vec_sorted(&self) -> Vec<&str> {
        let mut h = self
            .headers
            .keys()
            .map(|k| k.as_str())
            .collect::<Vec<&str>>();
        h.sort_unstable();

        h
    }
}
