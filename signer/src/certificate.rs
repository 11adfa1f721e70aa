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

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use base64::encode;
use chrono::{DateTime, Utc};
use openssl::{
    bn::BigNum,
    x509::{X509VerifyResult, X509},
};

use crate::{
    algorithm::oid_to_name,
    asn1::{
        ldap::{decode_directory_string, AttributeTable},
        x509::{X509Certificate, OID_AD_OCSP},
        ObjectIdentifier,
    },
    error::Error,
    pem,
};

const OID_COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");

/// Output format of [`Certificate::format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Hex,
    Base64,
    Pem,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hex" => Ok(Self::Hex),
            "base64" => Ok(Self::Base64),
            "pem" => Ok(Self::Pem),
            s => Err(format!("Unknown certificate format: {}", s)),
        }
    }
}

/// Decoded X.509 certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    inner: X509Certificate,
}

impl Certificate {
    /// Parses a DER or PEM encoded certificate.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        if pem::is_pem(data) {
            let pem = String::from_utf8_lossy(data);
            let (_, der) = pem::unwrap(&pem)?;

            Self::from_der(&der)
        } else {
            Self::from_der(data)
        }
    }

    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let inner = X509Certificate::from_der(der)?;

        Ok(Self { inner })
    }

    pub fn from_base64(data: &str) -> Result<Self, Error> {
        let der = base64::decode(data.trim())?;

        Self::from_der(&der)
    }

    pub fn encode(&self) -> Vec<u8> {
        self.inner.to_der().to_vec()
    }

    pub fn format(&self, format: Format) -> String {
        let der = self.encode();

        match format {
            Format::Hex => hex::encode(&der),
            Format::Base64 => encode(&der),
            Format::Pem => pem::wrap("CERTIFICATE", &der),
        }
    }

    pub fn x509(&self) -> &X509Certificate {
        &self.inner
    }

    pub fn to_openssl(&self) -> Result<X509, Error> {
        Ok(X509::from_der(&self.encode())?)
    }

    /// Content octets of the serial number.
    pub fn serial_number_bytes(&self) -> &[u8] {
        self.inner.tbs_certificate.serial_number.as_bytes()
    }

    /// Serial number as decimal string.
    pub fn serial_number(&self) -> Result<String, Error> {
        integer_to_decimal(self.serial_number_bytes())
    }

    pub fn subject_raw(&self) -> &[u8] {
        &self.inner.subject.raw
    }

    pub fn issuer_raw(&self) -> &[u8] {
        &self.inner.issuer.raw
    }

    pub fn subject_distinguished_name(&self) -> String {
        self.subject_distinguished_name_with(&AttributeTable::default())
    }

    pub fn subject_distinguished_name_with(&self, table: &AttributeTable) -> String {
        table.readable(&self.inner.subject.rdns)
    }

    pub fn issuer_distinguished_name(&self) -> String {
        self.issuer_distinguished_name_with(&AttributeTable::default())
    }

    pub fn issuer_distinguished_name_with(&self, table: &AttributeTable) -> String {
        table.readable(&self.inner.issuer.rdns)
    }

    pub fn subject_rfc4514_name(&self) -> String {
        AttributeTable::default().rfc4514(&self.inner.subject.rdns)
    }

    pub fn issuer_rfc4514_name(&self) -> String {
        AttributeTable::default().rfc4514(&self.inner.issuer.rdns)
    }

    pub fn common_name(&self) -> Option<String> {
        self.inner
            .subject
            .rdns
            .iter()
            .flatten()
            .find(|attrib| attrib.oid == OID_COMMON_NAME)
            .and_then(|attrib| decode_directory_string(&attrib.value))
    }

    pub fn valid_from(&self) -> DateTime<Utc> {
        self.inner.not_before
    }

    pub fn valid_until(&self) -> DateTime<Utc> {
        self.inner.not_after
    }

    /// Encoded `SubjectPublicKeyInfo`.
    pub fn public_key(&self) -> &[u8] {
        self.inner.spki_der()
    }

    /// Content of the `subjectPublicKey` bit string.
    pub fn public_key_bits(&self) -> &[u8] {
        self.inner
            .subject_public_key_info
            .subject_public_key
            .raw_bytes()
    }

    pub fn public_key_algorithm(&self) -> &ObjectIdentifier {
        &self.inner.subject_public_key_info.algorithm.oid
    }

    /// Registered name of the key algorithm, or the dotted OID if unknown.
    pub fn public_key_algorithm_name(&self) -> String {
        name_or_oid(self.public_key_algorithm())
    }

    pub fn issuer_signature_algorithm_name(&self) -> String {
        name_or_oid(&self.inner.signature_algorithm.oid)
    }

    /// URI of the OCSP responder from the authority information access
    /// extension.
    pub fn ocsp_url(&self) -> Option<String> {
        self.inner
            .access_locations(OID_AD_OCSP)
            .ok()?
            .into_iter()
            .next()
    }

    /// Checks whether `issuer` signed this certificate.
    ///
    /// This is a single hop check, no chain is built.
    pub fn is_issued_by(&self, issuer: &Certificate) -> Result<bool, Error> {
        if self.issuer_raw() != issuer.subject_raw() {
            return Ok(false);
        }

        let cert = self.to_openssl()?;
        let issuer = issuer.to_openssl()?;
        if issuer.issued(&cert) != X509VerifyResult::OK {
            return Ok(false);
        }

        let pub_key = issuer.public_key()?;

        Ok(cert.verify(&pub_key)?)
    }
}

/// Decimal form of the two's complement content octets of an INTEGER.
pub(crate) fn integer_to_decimal(bytes: &[u8]) -> Result<String, Error> {
    let mut value = BigNum::from_slice(bytes)?;

    if bytes.first().map_or(false, |b| b & 0x80 != 0) {
        let one = BigNum::from_u32(1)?;
        let mut modulus = BigNum::new()?;
        modulus.lshift(&one, bytes.len() as i32 * 8)?;

        let mut negative = BigNum::new()?;
        negative.checked_sub(&value, &modulus)?;
        value = negative;
    }

    Ok(value.to_dec_str()?.to_string())
}

fn name_or_oid(oid: &ObjectIdentifier) -> String {
    oid_to_name(oid)
        .map(Into::into)
        .unwrap_or_else(|_| oid.to_string())
}

impl Display for Certificate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.subject_distinguished_name())
    }
}
