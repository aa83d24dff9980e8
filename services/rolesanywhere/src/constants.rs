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

use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;

// Headers used in the asymmetric signing scheme.
pub const X_AMZ_CONTENT_SHA_256: &str = "x-amz-content-sha256";
pub const X_AMZ_DATE: &str = "x-amz-date";
pub const X_AMZ_X509: &str = "x-amz-x509";
pub const X_AMZ_X509_CHAIN: &str = "x-amz-x509-chain";
pub const X_AMZ_USER_AGENT: &str = "x-amz-user-agent";

/// Headers that are never part of the canonical request.
pub const IGNORED_HEADERS: &[&str] = &["authorization", "user-agent", X_AMZ_USER_AGENT];

// Env values used by the session exchange.
pub const AWS_ROLESANYWHERE_CERTIFICATE: &str = "AWS_ROLESANYWHERE_CERTIFICATE";
pub const AWS_ROLESANYWHERE_PRIVATE_KEY: &str = "AWS_ROLESANYWHERE_PRIVATE_KEY";
pub const AWS_ROLESANYWHERE_INTERMEDIATES: &str = "AWS_ROLESANYWHERE_INTERMEDIATES";
pub const AWS_ROLE_ARN: &str = "AWS_ROLE_ARN";
pub const AWS_ROLESANYWHERE_PROFILE_ARN: &str = "AWS_ROLESANYWHERE_PROFILE_ARN";
pub const AWS_ROLESANYWHERE_TRUST_ANCHOR_ARN: &str = "AWS_ROLESANYWHERE_TRUST_ANCHOR_ARN";
pub const AWS_ROLESANYWHERE_ENDPOINT: &str = "AWS_ROLESANYWHERE_ENDPOINT";
pub const AWS_REGION: &str = "AWS_REGION";
pub const AWS_ROLESANYWHERE_SESSION_DURATION: &str = "AWS_ROLESANYWHERE_SESSION_DURATION";
pub const AWS_ROLE_SESSION_NAME: &str = "AWS_ROLE_SESSION_NAME";

/// Signing name of the session exchange service.
pub const ROLESANYWHERE_SERVICE: &str = "rolesanywhere";

pub const DEFAULT_SESSION_DURATION_SECS: u64 = 3600;
pub const MIN_SESSION_DURATION_SECS: u64 = 900;
pub const MAX_SESSION_DURATION_SECS: u64 = 43200;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// AsciiSet for [AWS UriEncode](https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-query-string-auth.html)
///
/// - URI encode every byte except the unreserved characters: 'A'-'Z', 'a'-'z', '0'-'9', '-', '.', '_', and '~'.
/// - The forward slash is kept as is in paths.
pub static AWS_URI_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// AsciiSet for [AWS UriEncode](https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-query-string-auth.html)
///
/// Same as [`AWS_URI_ENCODE_SET`] but the forward slash is encoded too.
pub static AWS_QUERY_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');
