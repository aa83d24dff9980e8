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

//! Reqwest-based HTTP client for the signing helper.
//!
//! [`ReqwestHttpSend`] implements `HttpSend` from `signing_helper_core` with a
//! [`reqwest::Client`]. Transport failures are classified so callers can tell a timeout
//! from any other network failure.
//!
//! ```no_run
//! use signing_helper_core::Context;
//! use signing_helper_http_send_reqwest::ReqwestHttpSend;
//!
//! let ctx = Context::new().with_http_send(ReqwestHttpSend::default());
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::BodyExt;
use reqwest::{Client, Request};
use signing_helper_core::{Error, HttpSend, Result};

/// HttpSend implementation backed by reqwest.
#[derive(Debug, Default)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn classify(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::timeout("http request timed out").with_source(e)
    } else {
        Error::network("failed to send http request").with_source(e)
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let req = Request::try_from(req)
            .map_err(|e| Error::request_invalid("failed to build http request").with_source(e))?;
        let resp: http::Response<_> = self.client.execute(req).await.map_err(classify)?.into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(classify)?;
        Ok(http::Response::from_parts(parts, bs))
    }
}
