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

use std::io::Error as IoError;

use base64::DecodeError as Base64Error;
use der::Error as DerError;
use log::SetLoggerError;
use log4rs::config::runtime::ConfigErrors as Log4RsError;
use openssl::error::ErrorStack as OpenSslError;
use quick_xml::DeError as XmlDeError;
use reqwest::{Error as ReqwestError, StatusCode};
use serde_json::Error as JsonError;
use thiserror::Error;
use url::ParseError as UrlError;
use xmlsec::Error as XmlError;
use zip::result::ZipError;

use crate::{
    asn1::Error as Asn1Error, mobile_id::MobileIdError, ocsp::OcspError,
    timestamp::TimestampError,
};

#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("IO Error: {0}")]
    IoError(IoError),

    #[error("ASN.1 Error: {0}")]
    Asn1Error(Asn1Error),

    #[error("XML Error: {0}")]
    XmlError(XmlError),

    #[error("XML Deserialize Error: {0}")]
    XmlDeError(XmlDeError),

    #[error("Base64 Error: {0}")]
    Base64Error(Base64Error),

    #[error("Json Error: {0}")]
    JsonError(JsonError),

    #[error("OpenSSL Error: {0}")]
    OpenSslError(OpenSslError),

    #[error("Reqwest Error: {0}")]
    ReqwestError(ReqwestError),

    #[error("Url Parse Error: {0}")]
    UrlError(UrlError),

    #[error("ZIP Error: {0}")]
    ZipError(ZipError),

    #[error("Unable to set logger: {0}")]
    SetLoggerError(SetLoggerError),

    #[error("Unable to setup log4rs: {0}")]
    Log4RsError(Log4RsError),

    #[error("OCSP Error: {0}")]
    OcspError(OcspError),

    #[error("Timestamp Error: {0}")]
    TimestampError(TimestampError),

    #[error("Mobile-ID Error: {0}")]
    MobileIdError(MobileIdError),

    #[error("Invalid Response ({0} - {1})")]
    InvalidResponse(StatusCode, String),

    #[error("Unsupported Algorithm: {0}!")]
    UnsupportedAlgorithm(String),

    #[error("Unable to find Issuer Certificate!")]
    IssuerNotFound,

    #[error("Missing OCSP responder URL!")]
    OcspUrlMissing,

    #[error("OCSP response nonce does not match the request!")]
    OcspNonceMismatch,

    #[error("OCSP response does not contain a status for the requested certificate!")]
    OcspStatusMissing,

    #[error("Container invariant violated: {0}!")]
    ContainerInvariant(String),

    #[error("Invalid signature document: {0}!")]
    InvalidSignature(String),

    #[error("Signature value was not set yet!")]
    SignatureValueMissing,
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Self {
        Self::IoError(err)
    }
}

impl From<Asn1Error> for Error {
    fn from(err: Asn1Error) -> Self {
        Self::Asn1Error(err)
    }
}

impl From<DerError> for Error {
    fn from(err: DerError) -> Self {
        Self::Asn1Error(err.into())
    }
}

impl From<XmlError> for Error {
    fn from(err: XmlError) -> Self {
        Self::XmlError(err)
    }
}

impl From<XmlDeError> for Error {
    fn from(err: XmlDeError) -> Self {
        Self::XmlDeError(err)
    }
}

impl From<Base64Error> for Error {
    fn from(err: Base64Error) -> Self {
        Self::Base64Error(err)
    }
}

impl From<JsonError> for Error {
    fn from(err: JsonError) -> Self {
        Self::JsonError(err)
    }
}

impl From<OpenSslError> for Error {
    fn from(err: OpenSslError) -> Self {
        Self::OpenSslError(err)
    }
}

impl From<ReqwestError> for Error {
    fn from(err: ReqwestError) -> Self {
        Self::ReqwestError(err)
    }
}

impl From<UrlError> for Error {
    fn from(err: UrlError) -> Self {
        Self::UrlError(err)
    }
}

impl From<ZipError> for Error {
    fn from(err: ZipError) -> Self {
        Self::ZipError(err)
    }
}

impl From<SetLoggerError> for Error {
    fn from(err: SetLoggerError) -> Self {
        Self::SetLoggerError(err)
    }
}

impl From<Log4RsError> for Error {
    fn from(err: Log4RsError) -> Self {
        Self::Log4RsError(err)
    }
}

impl From<OcspError> for Error {
    fn from(err: OcspError) -> Self {
        Self::OcspError(err)
    }
}

impl From<TimestampError> for Error {
    fn from(err: TimestampError) -> Self {
        Self::TimestampError(err)
    }
}

impl From<MobileIdError> for Error {
    fn from(err: MobileIdError) -> Self {
        Self::MobileIdError(err)
    }
}
