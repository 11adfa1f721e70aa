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

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRequest<'a> {
    #[serde(rename = "relyingPartyUUID")]
    pub relying_party_uuid: &'a str,
    pub relying_party_name: &'a str,
    pub phone_number: &'a str,
    pub national_identity_number: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CertificateResponse {
    pub result: String,

    #[serde(default)]
    pub cert: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRequest<'a> {
    #[serde(rename = "relyingPartyUUID")]
    pub relying_party_uuid: &'a str,
    pub relying_party_name: &'a str,
    pub phone_number: &'a str,
    pub national_identity_number: &'a str,
    pub hash: String,
    pub hash_type: &'a str,
    pub language: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SignatureResponse {
    #[serde(rename = "sessionID")]
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionStatus {
    pub state: String,

    #[serde(default)]
    pub result: Option<String>,

    #[serde(default)]
    pub signature: Option<SessionSignature>,
}

#[derive(Debug, Deserialize)]
pub struct SessionSignature {
    pub algorithm: String,
    pub value: String,
}
