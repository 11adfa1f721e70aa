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

//! Signature engine for BDOC (XAdES / ASiC-E) containers.

#[macro_use]
extern crate lazy_static;

pub mod algorithm;
pub mod asic;
pub mod asn1;
pub mod certificate;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod mobile_id;
pub mod ocsp;
pub mod pem;
pub mod store;
pub mod timestamp;
pub mod xades;

pub use asic::AsicContainer;
pub use certificate::{Certificate, Format};
pub use config::Config;
pub use error::Error;
pub use mobile_id::{MobileId, MobileIdError};
pub use ocsp::{Ocsp, OcspError, OcspRequest, OcspResponse};
pub use store::{CertificateStore, TrustServiceList};
pub use timestamp::{Timestamp, TimestampError, TimestampRequest, TimestampResponse};
pub use xades::{SignableFile, ToBuffer, XadesSignature};
