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

use std::env;
use std::sync::Arc;

use anyhow::Result;
use log::warn;
use signing_helper_core::{Context, OsEnv, ProvideCredential, SigningCredential};
use signing_helper_file_read_tokio::TokioFileRead;
use signing_helper_http_send_reqwest::ReqwestHttpSend;
use signing_helper_rolesanywhere::{Config, CreateSessionCredentialProvider};

/// Exchange a real certificate against a real endpoint.
///
/// Enabled with `SIGNING_HELPER_ROLESANYWHERE_TEST=on`; everything else is read from the
/// usual `AWS_ROLESANYWHERE_*` variables.
#[tokio::test]
async fn test_live_create_session() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    if env::var("SIGNING_HELPER_ROLESANYWHERE_TEST").as_deref() != Ok("on") {
        warn!("SIGNING_HELPER_ROLESANYWHERE_TEST is not set, skipped");
        return Ok(());
    }

    let ctx = Context::new()
        .with_file_read(TokioFileRead)
        .with_http_send(ReqwestHttpSend::default())
        .with_env(OsEnv);
    let config = Config::default().from_env(&ctx)?;

    let provider = CreateSessionCredentialProvider::new(Arc::new(config));
    let cred = provider
        .provide_credential(&ctx)
        .await?
        .expect("certificate and private key must be configured");

    assert!(cred.is_valid());
    Ok(())
}
