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

use crate::{Error, HashMethod};

/* SignatureMethod */

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SignatureMethod {
    RsaSha256,
    RsaSha384,
    RsaSha512,
    EcdsaSha256,
    EcdsaSha384,
    EcdsaSha512,
    DsaSha256,
}

impl SignatureMethod {
    pub fn uri(&self) -> &'static str {
        match self {
            SignatureMethod::RsaSha256 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256",
            SignatureMethod::RsaSha384 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha384",
            SignatureMethod::RsaSha512 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha512",
            SignatureMethod::EcdsaSha256 => "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256",
            SignatureMethod::EcdsaSha384 => "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha384",
            SignatureMethod::EcdsaSha512 => "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha512",
            SignatureMethod::DsaSha256 => "http://www.w3.org/2009/xmldsig11#dsa-sha256",
        }
    }

    pub fn from_uri(uri: &str) -> Result<Self, Error> {
        [
            SignatureMethod::RsaSha256,
            SignatureMethod::RsaSha384,
            SignatureMethod::RsaSha512,
            SignatureMethod::EcdsaSha256,
            SignatureMethod::EcdsaSha384,
            SignatureMethod::EcdsaSha512,
            SignatureMethod::DsaSha256,
        ]
        .iter()
        .find(|method| method.uri() == uri)
        .copied()
        .ok_or_else(|| Error::UnknownSignatureMethod(uri.into()))
    }

    pub fn hash_method(&self) -> HashMethod {
        match self {
            SignatureMethod::RsaSha256
            | SignatureMethod::EcdsaSha256
            | SignatureMethod::DsaSha256 => HashMethod::Sha256,
            SignatureMethod::RsaSha384 | SignatureMethod::EcdsaSha384 => HashMethod::Sha384,
            SignatureMethod::RsaSha512 | SignatureMethod::EcdsaSha512 => HashMethod::Sha512,
        }
    }
}
