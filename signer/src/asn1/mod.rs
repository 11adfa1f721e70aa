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

//! ASN.1 structures used by the signer, built on the `der` and `x509-cert`
//! crates: X.509 certificates, OCSP and time stamp protocol messages,
//! `DigestInfo` and the directory string syntaxes of distinguished names.

pub mod digest_info;
pub mod ldap;
pub mod ocsp;
pub mod tsp;
pub mod types;
pub mod x509;

mod error;

pub use der::{
    asn1::{BitString, Int, ObjectIdentifier, OctetString},
    Any, Decode, Encode,
};
pub use error::Error;
