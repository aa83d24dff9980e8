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

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use http::{header, Method, StatusCode};
use pretty_assertions::assert_eq;
use rsa::Pkcs1v15Sign;
use sha2::Sha256;
use signing_helper_core::hash::{hex_sha256, sha256};
use signing_helper_core::{Context, ErrorKind, HttpSend, ProvideCredential, SigningRequest};
use signing_helper_file_read_tokio::TokioFileRead;
use signing_helper_rolesanywhere::canonical::{
    canonical_request_string, credential_scope, string_to_sign,
};
use signing_helper_rolesanywhere::{
    generate_credentials, Config, CreateSessionCredentialProvider, PrivateKey,
};

const ROLE_ARN: &str = "arn:aws:iam::123456789012:role/test";
const PROFILE_ARN: &str =
    "arn:aws:rolesanywhere:us-east-1:123456789012:profile/a1b2c3d4-5678-90ab-cdef-EXAMPLE22222";
const TRUST_ANCHOR_ARN: &str =
    "arn:aws:rolesanywhere:us-east-1:123456789012:trust-anchor/a1b2c3d4-5678-90ab-cdef-EXAMPLE11111";

const CREATE_SESSION_RESPONSE: &str = r#"{
    "credentialSet": [
        {
            "assumedRoleUser": {
                "arn": "arn:aws:sts::123456789012:assumed-role/test/0123456789abcdef",
                "assumedRoleId": "AROAEXAMPLE:0123456789abcdef"
            },
            "credentials": {
                "accessKeyId": "accessKeyId",
                "expiration": "2030-01-01T00:00:00Z",
                "secretAccessKey": "secretAccessKey",
                "sessionToken": "sessionToken"
            },
            "packedPolicySize": 10,
            "roleArn": "arn:aws:iam::123456789012:role/test",
            "sourceIdentity": "CN=Roles Anywhere Test RSA"
        }
    ],
    "subjectArn": "arn:aws:rolesanywhere:us-east-1:123456789012:subject/41cl0bae-6783-40d4-ab20-65dc5d922e45"
}"#;

/// MockHttpSend answers every request with a fixed response and keeps the last request.
#[derive(Debug, Clone)]
struct MockHttpSend {
    status: StatusCode,
    body: &'static str,
    delay: Option<Duration>,
    last_request: Arc<Mutex<Option<http::Request<Bytes>>>>,
}

impl MockHttpSend {
    fn new(status: StatusCode, body: &'static str) -> Self {
        Self {
            status,
            body,
            delay: None,
            last_request: Arc::default(),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn last_request(&self) -> http::Request<Bytes> {
        self.last_request
            .lock()
            .unwrap()
            .clone()
            .expect("a request must have been sent")
    }
}

#[async_trait]
impl HttpSend for MockHttpSend {
    async fn http_send(
        &self,
        req: http::Request<Bytes>,
    ) -> signing_helper_core::Result<http::Response<Bytes>> {
        *self.last_request.lock().unwrap() = Some(req);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        Ok(http::Response::builder()
            .status(self.status)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Bytes::from_static(self.body.as_bytes()))
            .unwrap())
    }
}

fn testdata(name: &str) -> String {
    format!("{}/testdata/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn context(http: MockHttpSend) -> Context {
    let _ = env_logger::builder().is_test(true).try_init();

    Context::new()
        .with_file_read(TokioFileRead)
        .with_http_send(http)
}

fn config() -> Config {
    Config::default()
        .with_certificate_id(testdata("rsa-2048-sha256-cert.pem"))
        .with_private_key_id(testdata("rsa-2048-key.pem"))
        .with_role_arn(ROLE_ARN)
        .with_profile_arn(PROFILE_ARN)
        .with_trust_anchor_arn(TRUST_ANCHOR_ARN)
}

/// Rebuild the string to sign from the received request and check the signature with the
/// public half of the key.
fn verify_signature(req: &http::Request<Bytes>, key_path: &str) -> Result<()> {
    let authorization = req.headers()[header::AUTHORIZATION].to_str()?;
    let (algorithm, rest) = authorization
        .split_once(' ')
        .expect("authorization must contain algorithm");
    assert_eq!(algorithm, "AWS4-X509-RSA-SHA256");
    let signature = rest
        .rsplit_once("Signature=")
        .map(|(_, v)| v)
        .expect("authorization must contain signature");

    let date = req.headers()["x-amz-date"].to_str()?;
    let now = chrono::NaiveDateTime::parse_from_str(date, "%Y%m%dT%H%M%SZ")?.and_utc();

    let (parts, body) = req.clone().into_parts();
    let signing_req = SigningRequest::build(&parts)?;
    let creq = canonical_request_string(&signing_req, &hex_sha256(&body))?;
    let scope = credential_scope(now, "us-east-1", "rolesanywhere");
    let sts = string_to_sign(algorithm, now, &scope, &hex_sha256(creq.as_bytes()))?;

    let PrivateKey::Rsa(key) = PrivateKey::from_pem(&std::fs::read(key_path)?)? else {
        panic!("key must be rsa");
    };
    key.to_public_key().verify(
        Pkcs1v15Sign::new::<Sha256>(),
        &sha256(sts.as_bytes()),
        &hex::decode(signature)?,
    )?;
    Ok(())
}

#[tokio::test]
async fn test_create_session() -> Result<()> {
    let http = MockHttpSend::new(StatusCode::CREATED, CREATE_SESSION_RESPONSE);
    let ctx = context(http.clone());

    let provider = CreateSessionCredentialProvider::new(Arc::new(config()));
    let cred = provider
        .provide_credential(&ctx)
        .await?
        .expect("credential must be returned");

    assert_eq!(cred.access_key_id, "accessKeyId");
    assert_eq!(cred.secret_access_key, "secretAccessKey");
    assert_eq!(cred.session_token, "sessionToken");
    assert_eq!(cred.expiration.to_rfc3339(), "2030-01-01T00:00:00+00:00");

    let req = http.last_request();
    assert_eq!(req.method(), Method::POST);
    assert_eq!(
        req.uri().to_string(),
        "https://rolesanywhere.us-east-1.amazonaws.com/sessions"
    );
    assert_eq!(req.headers()[header::CONTENT_TYPE], "application/json");
    assert!(req.headers().get("x-amz-x509-chain").is_none());
    assert_eq!(
        req.headers()["x-amz-content-sha256"].to_str()?,
        hex_sha256(req.body())
    );

    let body: serde_json::Value = serde_json::from_slice(req.body())?;
    assert_eq!(
        body,
        serde_json::json!({
            "durationSeconds": 3600,
            "profileArn": PROFILE_ARN,
            "roleArn": ROLE_ARN,
            "trustAnchorArn": TRUST_ANCHOR_ARN,
        })
    );

    let authorization = req.headers()[header::AUTHORIZATION].to_str()?;
    assert!(authorization.contains(
        "SignedHeaders=content-type;host;x-amz-content-sha256;x-amz-date;x-amz-x509,"
    ));
    assert!(authorization.contains("Credential=81985529216486895/"));
    verify_signature(&req, &testdata("rsa-2048-key.pem"))?;
    Ok(())
}

#[tokio::test]
async fn test_create_session_with_intermediates() -> Result<()> {
    let http = MockHttpSend::new(StatusCode::CREATED, CREATE_SESSION_RESPONSE);
    let ctx = context(http.clone());

    let config = config()
        .with_certificate_bundle_id(testdata("cert-bundle.pem"))
        .with_role_session_name("workload")
        .with_session_duration(900)
        .with_endpoint("https://rolesanywhere.example.com/");
    generate_credentials(&ctx, &config).await?;

    let req = http.last_request();
    assert_eq!(
        req.uri().to_string(),
        "https://rolesanywhere.example.com/sessions"
    );
    let chain = req.headers()["x-amz-x509-chain"].to_str()?;
    assert_eq!(chain.split(',').count(), 2);

    let body: serde_json::Value = serde_json::from_slice(req.body())?;
    assert_eq!(body["durationSeconds"], 900);
    assert_eq!(body["roleSessionName"], "workload");

    let authorization = req.headers()[header::AUTHORIZATION].to_str()?;
    assert!(authorization.contains("x-amz-x509;x-amz-x509-chain,"));
    verify_signature(&req, &testdata("rsa-2048-key.pem"))?;
    Ok(())
}

#[tokio::test]
async fn test_create_session_with_ec_identity() -> Result<()> {
    let http = MockHttpSend::new(StatusCode::CREATED, CREATE_SESSION_RESPONSE);
    let ctx = context(http.clone());

    let config = config()
        .with_certificate_id(testdata("ec-prime256v1-sha256-cert.pem"))
        .with_private_key_id(testdata("ec-prime256v1-key-pkcs8.pem"));
    let cred = generate_credentials(&ctx, &config).await?;
    assert_eq!(cred.access_key_id, "accessKeyId");

    let req = http.last_request();
    let authorization = req.headers()[header::AUTHORIZATION].to_str()?;
    assert!(authorization.starts_with("AWS4-X509-ECDSA-SHA256 Credential=4242/"));
    Ok(())
}

#[tokio::test]
async fn test_create_session_denied() {
    let http = MockHttpSend::new(
        StatusCode::FORBIDDEN,
        r#"{"message":"Untrusted signing certificate."}"#,
    );
    let ctx = context(http.clone());

    let err = generate_credentials(&ctx, &config())
        .await
        .expect_err("403 must fail");

    assert_eq!(err.kind(), ErrorKind::CredentialDenied);
    assert!(err.is_protocol_error());
    assert!(!err.is_retryable());
    let message = err.to_string();
    assert!(message.contains("403"), "{message}");
    assert!(message.contains("Untrusted signing certificate."), "{message}");
}

#[tokio::test]
async fn test_create_session_malformed_response() {
    let http = MockHttpSend::new(StatusCode::CREATED, r#"{"credentialSet": "nope"}"#);
    let ctx = context(http);

    let err = generate_credentials(&ctx, &config())
        .await
        .expect_err("malformed body must fail");
    assert_eq!(err.kind(), ErrorKind::ResponseInvalid);
}

#[tokio::test]
async fn test_create_session_timeout() {
    let http = MockHttpSend::new(StatusCode::CREATED, CREATE_SESSION_RESPONSE)
        .with_delay(Duration::from_secs(5));
    let ctx = context(http);

    let config = config().with_timeout(Duration::from_millis(50));
    let err = generate_credentials(&ctx, &config)
        .await
        .expect_err("slow endpoint must time out");

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.is_network_error());
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_create_session_invalid_certificate() {
    let http = MockHttpSend::new(StatusCode::CREATED, CREATE_SESSION_RESPONSE);
    let ctx = context(http);

    let config = config().with_certificate_id(testdata("invalid-rsa-cert.pem"));
    let err = generate_credentials(&ctx, &config)
        .await
        .expect_err("corrupted certificate must fail");

    assert_eq!(err.kind(), ErrorKind::CertificateInvalid);
    assert!(err.to_string().contains("could not parse certificate"));
    assert!(err.to_string().contains("invalid-rsa-cert.pem"));
}

#[tokio::test]
async fn test_create_session_mismatched_key() {
    let http = MockHttpSend::new(StatusCode::CREATED, CREATE_SESSION_RESPONSE);
    let ctx = context(http);

    let config = config().with_private_key_id(testdata("ec-prime256v1-key.pem"));
    let err = generate_credentials(&ctx, &config)
        .await
        .expect_err("mismatched key must fail");
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
}
