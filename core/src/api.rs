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

use crate::{Context, Result};
use std::fmt::Debug;

/// SigningCredential is implemented by every credential this workspace produces.
pub trait SigningCredential: Clone + Debug + Send + Sync + Unpin + 'static {
    /// Check if the credential is still usable.
    fn is_valid(&self) -> bool;
}

/// ProvideCredential is the trait used to obtain a credential.
///
/// Implementations must not cache: every call performs the full load or exchange and
/// hands the result back to the caller, who owns refresh scheduling.
#[async_trait::async_trait]
pub trait ProvideCredential: Debug + Send + Sync + Unpin + 'static {
    /// Credential returned by this provider.
    type Credential: Send + Sync + Unpin + 'static;

    /// Load credential from current context.
    ///
    /// Returns `Ok(None)` when the provider is not configured.
    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>>;
}

/// SignRequest is the trait used to attach authentication headers to a request.
#[async_trait::async_trait]
pub trait SignRequest: Debug + Send + Sync + Unpin + 'static {
    /// Credential used by this signer.
    ///
    /// Typically, it will be a certificate together with its private key.
    type Credential: Send + Sync + Unpin + 'static;

    /// Sign the request with the current time.
    ///
    /// ## Body
    ///
    /// The `body` is the exact payload that will be sent. Signers digest it into the
    /// canonical request, so it must not change after signing.
    ///
    /// ## Credential
    ///
    /// If `credential` is `None`, the request is left untouched.
    ///
    /// On error, implementations must leave `req` untouched.
    async fn sign_request(
        &self,
        ctx: &Context,
        req: &mut http::request::Parts,
        body: &[u8],
        credential: Option<&Self::Credential>,
    ) -> Result<()>;
}
