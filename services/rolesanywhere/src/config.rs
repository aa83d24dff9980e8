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

use std::time::Duration;

use signing_helper_core::{Context, Error, Result};

use crate::constants::*;

/// Config for a certificate based session exchange.
///
/// Fields left as `None` fall back to the environment through [`Config::from_env`] and
/// then to built-in defaults.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Path to the PEM private key.
    pub private_key_id: Option<String>,
    /// Path to the PEM leaf certificate.
    pub certificate_id: Option<String>,
    /// Path to a PEM bundle of intermediate certificates.
    pub certificate_bundle_id: Option<String>,
    /// ARN of the role to assume.
    pub role_arn: Option<String>,
    /// ARN of the profile holding the session policy.
    pub profile_arn: Option<String>,
    /// ARN of the trust anchor that issued the certificate.
    pub trust_anchor_arn: Option<String>,
    /// Session endpoint, for example `https://rolesanywhere.us-east-1.amazonaws.com`.
    ///
    /// Derived from the region when unset.
    pub endpoint: Option<String>,
    /// Region used in the credential scope.
    ///
    /// Derived from the trust anchor ARN when unset.
    pub region: Option<String>,
    /// Requested session duration in seconds, 3600 by default.
    pub session_duration: Option<u64>,
    /// Optional name of the role session.
    pub role_session_name: Option<String>,
    /// Deadline of the exchange round trip, 30 seconds by default.
    pub timeout: Option<Duration>,
}

impl Config {
    /// Set the private key path.
    pub fn with_private_key_id(mut self, v: impl Into<String>) -> Self {
        self.private_key_id = Some(v.into());
        self
    }

    /// Set the certificate path.
    pub fn with_certificate_id(mut self, v: impl Into<String>) -> Self {
        self.certificate_id = Some(v.into());
        self
    }

    /// Set the intermediate bundle path.
    pub fn with_certificate_bundle_id(mut self, v: impl Into<String>) -> Self {
        self.certificate_bundle_id = Some(v.into());
        self
    }

    /// Set the role ARN.
    pub fn with_role_arn(mut self, v: impl Into<String>) -> Self {
        self.role_arn = Some(v.into());
        self
    }

    /// Set the profile ARN.
    pub fn with_profile_arn(mut self, v: impl Into<String>) -> Self {
        self.profile_arn = Some(v.into());
        self
    }

    /// Set the trust anchor ARN.
    pub fn with_trust_anchor_arn(mut self, v: impl Into<String>) -> Self {
        self.trust_anchor_arn = Some(v.into());
        self
    }

    /// Set the endpoint.
    pub fn with_endpoint(mut self, v: impl Into<String>) -> Self {
        self.endpoint = Some(v.into());
        self
    }

    /// Set the region.
    pub fn with_region(mut self, v: impl Into<String>) -> Self {
        self.region = Some(v.into());
        self
    }

    /// Set the session duration in seconds.
    pub fn with_session_duration(mut self, secs: u64) -> Self {
        self.session_duration = Some(secs);
        self
    }

    /// Set the role session name.
    pub fn with_role_session_name(mut self, v: impl Into<String>) -> Self {
        self.role_session_name = Some(v.into());
        self
    }

    /// Set the exchange timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fill every unset field from the environment.
    pub fn from_env(mut self, ctx: &Context) -> Result<Self> {
        let envs = ctx.env_vars();
        let get = |key: &str| envs.get(key).filter(|v| !v.is_empty()).cloned();

        self.certificate_id = self
            .certificate_id
            .or_else(|| get(AWS_ROLESANYWHERE_CERTIFICATE));
        self.private_key_id = self
            .private_key_id
            .or_else(|| get(AWS_ROLESANYWHERE_PRIVATE_KEY));
        self.certificate_bundle_id = self
            .certificate_bundle_id
            .or_else(|| get(AWS_ROLESANYWHERE_INTERMEDIATES));
        self.role_arn = self.role_arn.or_else(|| get(AWS_ROLE_ARN));
        self.profile_arn = self
            .profile_arn
            .or_else(|| get(AWS_ROLESANYWHERE_PROFILE_ARN));
        self.trust_anchor_arn = self
            .trust_anchor_arn
            .or_else(|| get(AWS_ROLESANYWHERE_TRUST_ANCHOR_ARN));
        self.endpoint = self.endpoint.or_else(|| get(AWS_ROLESANYWHERE_ENDPOINT));
        self.region = self.region.or_else(|| get(AWS_REGION));
        self.role_session_name = self
            .role_session_name
            .or_else(|| get(AWS_ROLE_SESSION_NAME));

        if self.session_duration.is_none() {
            if let Some(v) = get(AWS_ROLESANYWHERE_SESSION_DURATION) {
                let secs = v.parse::<u64>().map_err(|e| {
                    Error::config_invalid("session duration must be a number of seconds")
                        .with_source(e)
                        .with_context(format!("{AWS_ROLESANYWHERE_SESSION_DURATION}: {v}"))
                })?;
                self.session_duration = Some(secs);
            }
        }

        Ok(self)
    }

    /// Requested session duration, checked against the allowed range.
    pub fn session_duration_secs(&self) -> Result<u64> {
        let secs = self
            .session_duration
            .unwrap_or(DEFAULT_SESSION_DURATION_SECS);
        if !(MIN_SESSION_DURATION_SECS..=MAX_SESSION_DURATION_SECS).contains(&secs) {
            return Err(Error::config_invalid(format!(
                "session duration must be between {MIN_SESSION_DURATION_SECS} and {MAX_SESSION_DURATION_SECS} seconds, got {secs}"
            )));
        }
        Ok(secs)
    }

    /// Deadline of the exchange round trip.
    pub fn timeout(&self) -> Duration {
        self.timeout
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Region used to sign, taken from the trust anchor ARN when not configured.
    ///
    /// `arn:aws:rolesanywhere:us-east-1:123456789012:trust-anchor/...` gives `us-east-1`.
    pub fn region(&self) -> Result<String> {
        if let Some(region) = &self.region {
            return Ok(region.clone());
        }

        let arn = self
            .trust_anchor_arn
            .as_deref()
            .ok_or_else(|| Error::config_invalid("trust_anchor_arn is required"))?;
        match arn.split(':').nth(3) {
            Some(region) if arn.starts_with("arn:") && !region.is_empty() => {
                Ok(region.to_string())
            }
            _ => Err(Error::config_invalid("failed to get region from trust anchor arn")
                .with_context(format!("trust_anchor_arn: {arn}"))),
        }
    }

    /// Session endpoint without trailing slash.
    pub fn endpoint(&self, region: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None if region.starts_with("cn-") => {
                format!("https://rolesanywhere.{region}.amazonaws.com.cn")
            }
            None => format!("https://rolesanywhere.{region}.amazonaws.com"),
        }
    }
}
