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

//! Canonical request construction for asymmetric SigV4.
//!
//! Everything here is a pure function of the request fields, the identity and the signing
//! time, so the output can be checked against fixed vectors without a server.

use std::fmt::Write;

use http::{header, HeaderValue};
use percent_encoding::{percent_decode_str, utf8_percent_encode};
use signing_helper_core::hash::hex_sha256;
use signing_helper_core::time::{format_date, format_iso8601, DateTime};
use signing_helper_core::{Error, Result, SigningRequest};

use crate::constants::{
    AWS_QUERY_ENCODE_SET, AWS_URI_ENCODE_SET, IGNORED_HEADERS, X_AMZ_CONTENT_SHA_256,
    X_AMZ_DATE, X_AMZ_X509, X_AMZ_X509_CHAIN,
};
use crate::key::X509Identity;

/// Insert the headers required by the signing scheme and normalize every header value.
///
/// - `host` is only added when absent.
/// - `x-amz-x509-chain` is only present when the identity carries intermediates.
/// - `x-amz-content-sha256` is only present when the body is not empty.
pub fn canonicalize_headers(
    req: &mut SigningRequest,
    identity: &X509Identity,
    body: &[u8],
    now: DateTime,
) -> Result<()> {
    for (_, value) in req.headers.iter_mut() {
        SigningRequest::header_value_normalize(value)
    }

    if req.headers.get(header::HOST).is_none() {
        req.headers.insert(
            header::HOST,
            HeaderValue::from_str(req.authority.as_str()).map_err(|e| {
                Error::request_invalid("failed to parse authority as header value").with_source(e)
            })?,
        );
    }

    req.headers
        .insert(X_AMZ_DATE, HeaderValue::try_from(format_iso8601(now))?);
    req.headers.insert(
        X_AMZ_X509,
        HeaderValue::from_str(identity.certificate().certificate_data())?,
    );

    if identity.chain().is_empty() {
        req.headers.remove(X_AMZ_X509_CHAIN);
    } else {
        let chain = identity
            .chain()
            .iter()
            .map(|c| c.certificate_data())
            .collect::<Vec<_>>()
            .join(",");
        req.headers
            .insert(X_AMZ_X509_CHAIN, HeaderValue::from_str(&chain)?);
    }

    if body.is_empty() {
        req.headers.remove(X_AMZ_CONTENT_SHA_256);
    } else {
        req.headers
            .insert(X_AMZ_CONTENT_SHA_256, HeaderValue::try_from(hex_sha256(body))?);
    }

    Ok(())
}

/// Sorted names of the headers covered by the signature.
pub fn signed_header_names(req: &SigningRequest) -> Vec<&str> {
    req.header_name_to_vec_sorted()
        .into_iter()
        .filter(|name| !IGNORED_HEADERS.contains(name))
        .collect()
}

/// Build the canonical request.
///
/// ```text
/// POST
/// /sessions
///
/// content-type:application/json
/// host:rolesanywhere.us-east-1.amazonaws.com
/// x-amz-date:20220301T081234Z
///
/// content-type;host;x-amz-date
/// <hex sha256 of the body>
/// ```
pub fn canonical_request_string(req: &SigningRequest, payload_hash: &str) -> Result<String> {
    // 512 is chosen for the certificate header which is always present.
    let mut f = String::with_capacity(512);

    writeln!(f, "{}", req.method)?;

    let path = percent_decode_str(&req.path)
        .decode_utf8()
        .map_err(|e| Error::request_invalid("failed to decode path").with_source(e))?;
    writeln!(f, "{}", utf8_percent_encode(&path, &AWS_URI_ENCODE_SET))?;

    let mut query = req
        .query
        .iter()
        .map(|(k, v)| {
            (
                utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET).to_string(),
                utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET).to_string(),
            )
        })
        .collect::<Vec<_>>();
    query.sort();
    writeln!(
        f,
        "{}",
        query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    )?;

    let signed_headers = signed_header_names(req);
    for name in signed_headers.iter() {
        let values = req
            .headers
            .get_all(*name)
            .iter()
            .map(|v| v.to_str())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        writeln!(f, "{}:{}", name, values.join(","))?;
    }
    writeln!(f)?;
    writeln!(f, "{}", signed_headers.join(";"))?;
    write!(f, "{payload_hash}")?;

    Ok(f)
}

/// Credential scope: `<date>/<region>/<service>/aws4_request`.
pub fn credential_scope(now: DateTime, region: &str, service: &str) -> String {
    format!("{}/{}/{}/aws4_request", format_date(now), region, service)
}

/// Build the string to sign.
///
/// ```text
/// AWS4-X509-RSA-SHA256
/// 20220301T081234Z
/// 20220301/us-east-1/rolesanywhere/aws4_request
/// <hex digest of the canonical request>
/// ```
pub fn string_to_sign(
    algorithm: &str,
    now: DateTime,
    scope: &str,
    hashed_canonical_request: &str,
) -> Result<String> {
    let mut f = String::new();
    writeln!(f, "{algorithm}")?;
    writeln!(f, "{}", format_iso8601(now))?;
    writeln!(f, "{scope}")?;
    write!(f, "{hashed_canonical_request}")?;
    Ok(f)
}
