/*
 * Copyright (c) 2021 gematik GmbH
 * 
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 * 
 *    http://www.apache.org/licenses/LICENSE-2.0
 * 
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 */

use std::fs::read_to_string;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Overrides the OCSP responder taken from the certificate.
    pub ocsp_url: Option<String>,

    /// Time stamping authority; time stamps are skipped if not set.
    pub timestamp_url: Option<String>,

    pub http: HttpConfig,

    #[serde(rename = "mobile-id")]
    pub mobile_id: MobileIdConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let json = read_to_string(path)?;

        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: concat!("bdoc-signer/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MobileIdConfig {
    /// Base URL of the Mobile-ID REST API (with trailing slash).
    pub url: String,
    pub relying_party_name: String,
    pub relying_party_uuid: String,

    /// Language of the message shown on the phone (`EST`, `ENG`, `RUS`, `LIT`).
    pub language: String,
}

impl MobileIdConfig {
    /// The public demo service.
    pub fn demo() -> Self {
        Self {
            url: "https://tsp.demo.sk.ee/mid-api/".into(),
            relying_party_name: "DEMO".into(),
            relying_party_uuid: "00000000-0000-0000-0000-000000000000".into(),
            language: "EST".into(),
        }
    }
}

impl Default for MobileIdConfig {
    fn default() -> Self {
        Self::demo()
    }
}
