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

use anyhow::Result;
use httpmock::Method::POST;
use httpmock::MockServer;
use signing_helper_core::{Context, ErrorKind};
use signing_helper_file_read_tokio::TokioFileRead;
use signing_helper_http_send_reqwest::ReqwestHttpSend;
use signing_helper_rolesanywhere::{generate_credentials, Config};

fn testdata(name: &str) -> String {
    format!("{}/testdata/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn context() -> Context {
    let _ = env_logger::builder().is_test(true).try_init();

    Context::new()
        .with_file_read(TokioFileRead)
        .with_http_send(ReqwestHttpSend::default())
}

fn config(endpoint: String) -> Config {
    Config::default()
        .with_certificate_id(testdata("ec-secp384r1-sha384-cert.pem"))
        .with_private_key_id(testdata("ec-secp384r1-key.pem"))
        .with_role_arn("arn:aws:iam::000000000000:role/ExampleS3WriteRole")
        .with_profile_arn(
            "arn:aws:rolesanywhere:us-east-1:000000000000:profile/41cl0bae-6783-40d4-ab20-65dc5d922e45",
        )
        .with_trust_anchor_arn(
            "arn:aws:rolesanywhere:us-east-1:000000000000:trust-anchor/41cl0bae-6783-40d4-ab20-65dc5d922e45",
        )
        .with_endpoint(endpoint)
        .with_session_duration(900)
}

#[tokio::test]
async fn test_exchange_over_http() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/sessions")
                .header("content-type", "application/json")
                .header_exists("authorization")
                .header_exists("x-amz-date")
                .header_exists("x-amz-x509")
                .header_exists("x-amz-content-sha256")
                .json_body_partial(r#"{"durationSeconds": 900}"#);
            then.status(201)
                .header("content-type", "application/json")
                .body(
                    r#"{
                        "credentialSet": [{
                            "credentials": {
                                "accessKeyId": "accessKeyId",
                                "expiration": "2022-07-27T04:36:55Z",
                                "secretAccessKey": "secretAccessKey",
                                "sessionToken": "sessionToken"
                            },
                            "roleArn": "arn:aws:iam::000000000000:role/ExampleS3WriteRole"
                        }],
                        "subjectArn": "arn:aws:rolesanywhere:us-east-1:000000000000:subject/41cl0bae-6783-40d4-ab20-65dc5d922e45"
                    }"#,
                );
        })
        .await;

    let cred = generate_credentials(&context(), &config(server.base_url())).await?;
    mock.assert_async().await;

    assert_eq!(cred.access_key_id, "accessKeyId");
    assert_eq!(cred.secret_access_key, "secretAccessKey");
    assert_eq!(cred.session_token, "sessionToken");
    Ok(())
}

#[tokio::test]
async fn test_exchange_over_http_denied() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/sessions");
            then.status(403)
                .body(r#"{"message":"Unable to assume role for arn"}"#);
        })
        .await;

    let err = generate_credentials(&context(), &config(server.base_url()))
        .await
        .expect_err("403 must fail");
    mock.assert_hits_async(1).await;

    assert_eq!(err.kind(), ErrorKind::CredentialDenied);
    assert!(err.to_string().contains("Unable to assume role for arn"));
}

#[tokio::test]
async fn test_exchange_connection_refused() {
    let err = generate_credentials(&context(), &config("http://127.0.0.1:1".to_string()))
        .await
        .expect_err("closed port must fail");

    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(err.is_network_error());
}
