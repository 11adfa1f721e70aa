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
use std::str::Utf8Error;

use openssl::error::ErrorStack as SslError;
use quick_xml::Error as XmlError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO Error: {0}")]
    IoError(IoError),

    #[error("XML Error: {0}")]
    XmlError(XmlError),

    #[error("SSL Error: {0}")]
    SslError(SslError),

    #[error("UTF-8 Error: {0}")]
    Utf8Error(Utf8Error),

    #[error("Document has no root element!")]
    NoRootElement,

    #[error("Document has more than one root element!")]
    MultipleRootElements,

    #[error("Unexpected closing tag: {0}!")]
    UnexpectedClosingTag(String),

    #[error("Unexpected end of document!")]
    UnexpectedEndOfDocument,

    #[error("Namespace prefix is not bound: {0}!")]
    UnboundPrefix(String),

    #[error("Unknown Canonization Method: {0}!")]
    UnknownCanonizationMethod(String),

    #[error("Unknown Signature Method: {0}!")]
    UnknownSignatureMethod(String),

    #[error("Unknown Digest Method: {0}!")]
    UnknownDigestMethod(String),
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Self {
        Self::IoError(err)
    }
}

impl From<XmlError> for Error {
    fn from(err: XmlError) -> Self {
        Self::XmlError(err)
    }
}

impl From<SslError> for Error {
    fn from(err: SslError) -> Self {
        Self::SslError(err)
    }
}

impl From<Utf8Error> for Error {
    fn from(err: Utf8Error) -> Self {
        Self::Utf8Error(err)
    }
}
