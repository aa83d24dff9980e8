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

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::{header, HeaderValue, Method};
use log::debug;
use serde::{Deserialize, Serialize};
use signing_helper_core::time::{now, parse_rfc3339};
use signing_helper_core::{Context, Error, ProvideCredential, Result};

use crate::constants::ROLESANYWHERE_SERVICE;
use crate::key::X509Identity;
use crate::sign_request::RequestSigner;
use crate::{Config, Credential};

/// CreateSessionCredentialProvider exchanges an X.509 identity for temporary credentials.
///
/// Every call loads the certificate and key again and performs one `POST /sessions`
/// round trip. Nothing is cached and nothing is retried.
#[derive(Debug)]
pub struct CreateSessionCredentialProvider {
    config: Arc<Config>,
}

impl CreateSessionCredentialProvider {
    /// Create a new `CreateSessionCredentialProvider` instance.
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ProvideCredential for CreateSessionCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        if self.config.certificate_id.is_none() || self.config.private_key_id.is_none() {
            debug!("certificate or private key is not configured, skip create session");
            return Ok(None);
        }

        generate_credentials(ctx, &self.config).await.map(Some)
    }
}

/// Load the identity described by `config`, sign a session request with it and exchange it
/// for a [`Credential`].
pub async fn generate_credentials(ctx: &Context, config: &Config) -> Result<Credential> {
    let role_arn = required(&config.role_arn, "role_arn")?;
    let profile_arn = required(&config.profile_arn, "profile_arn")?;
    let trust_anchor_arn = required(&config.trust_anchor_arn, "trust_anchor_arn")?;
    let duration_seconds = config.session_duration_secs()?;
    let region = config.region()?;
    let endpoint = config.endpoint(&region);

    let identity = X509Identity::load(ctx, config).await?;

    let body = serde_json::to_vec(&CreateSessionRequest {
        duration_seconds,
        profile_arn,
        role_arn,
        trust_anchor_arn,
        role_session_name: config.role_session_name.as_deref(),
    })
    .map_err(|e| Error::unexpected("failed to serialize create session request").with_source(e))?;

    let url = format!("{endpoint}/sessions");
    debug!("creating session at {url}");

    let (mut parts, ()) = http::Request::builder()
        .method(Method::POST)
        .uri(&url)
        .header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        )
        .body(())
        .map_err(|e| Error::config_invalid("failed to build create session request").with_source(e))?
        .into_parts();

    RequestSigner::new(ROLESANYWHERE_SERVICE, &region).sign_at(&mut parts, &body, &identity, now())?;

    let req = http::Request::from_parts(parts, Bytes::from(body));
    let resp = match tokio::time::timeout(config.timeout(), ctx.http_send(req)).await {
        Ok(resp) => resp?,
        Err(_) => {
            return Err(Error::timeout(format!(
                "create session did not complete within {:?}",
                config.timeout()
            ))
            .with_context(format!("url: {url}")))
        }
    };

    let status = resp.status();
    let content = String::from_utf8_lossy(resp.body()).to_string();
    if !status.is_success() {
        return Err(Error::credential_denied(format!(
            "create session failed: status={status}, body={content}"
        )));
    }

    parse_create_session_response(&content)
}

fn required<'a>(v: &'a Option<String>, name: &str) -> Result<&'a str> {
    v.as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::config_invalid(format!("{name} is required")))
}

fn parse_create_session_response(content: &str) -> Result<Credential> {
    let resp: CreateSessionResponse = serde_json::from_str(content).map_err(|e| {
        Error::response_invalid("failed to parse create session response").with_source(e)
    })?;
    debug!(
        "session created for subject {}",
        resp.subject_arn.as_deref().unwrap_or("<unknown>")
    );

    let set = resp.credential_set.into_iter().next().ok_or_else(|| {
        Error::response_invalid("create session response contains no credential set")
    })?;
    if let Some(user) = &set.assumed_role_user {
        debug!("assumed role user: {}", user.arn);
    }

    let cred = set.credentials;
    let expiration = parse_rfc3339(&cred.expiration).map_err(|e| {
        Error::response_invalid("failed to parse credential expiration").with_source(e)
    })?;

    Ok(Credential {
        access_key_id: cred.access_key_id,
        secret_access_key: cred.secret_access_key,
        session_token: cred.session_token,
        expiration,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest<'a> {
    duration_seconds: u64,
    profile_arn: &'a str,
    role_arn: &'a str,
    trust_anchor_arn: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    role_session_name: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionResponse {
    credential_set: Vec<CredentialSet>,
    subject_arn: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialSet {
    assumed_role_user: Option<AssumedRoleUser>,
    credentials: CredentialsPayload,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssumedRoleUser {
    arn: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsPayload {
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
    expiration: String,
}
