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

use chrono::{DateTime, Utc};
use der::{
    asn1::{BitString, Int},
    Any, Decode, DecodeValue, Encode, FixedTag, Header, Reader, Sequence, Tag,
};
use spki::{AlgorithmIdentifierOwned, ObjectIdentifier, SubjectPublicKeyInfoOwned};
use x509_cert::{
    attr::AttributeTypeAndValue,
    certificate::Version,
    ext::{
        pkix::{name::GeneralName, AuthorityInfoAccessSyntax},
        Extension, Extensions,
    },
    time::{Time, Validity},
};

use super::{types::from_unix_duration, Error};

pub const OID_AUTHORITY_INFO_ACCESS: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.1.1");
pub const OID_AD_OCSP: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.1");

/// Algorithm identifier with an explicit NULL parameter.
pub fn algorithm_with_null(oid: ObjectIdentifier) -> Result<AlgorithmIdentifierOwned, Error> {
    Ok(AlgorithmIdentifierOwned {
        oid,
        parameters: Some(Any::new(Tag::Null, Vec::new())?),
    })
}

/* Certificate */

/// Outer certificate structure. The signed part stays undecoded so that the
/// exact bytes the issuer signed are available.
#[derive(Debug, Clone, PartialEq, Eq, Sequence)]
struct CertificateRaw {
    tbs_certificate: Any,
    signature_algorithm: AlgorithmIdentifierOwned,
    signature: BitString,
}

/// `TBSCertificate` with names and key info kept as raw elements.
#[derive(Debug, Clone, PartialEq, Eq, Sequence)]
pub struct TbsCertificate {
    #[asn1(context_specific = "0", default = "Default::default")]
    pub version: Version,
    pub serial_number: Int,
    pub signature: AlgorithmIdentifierOwned,
    pub issuer: Any,
    pub validity: Validity,
    pub subject: Any,
    pub subject_public_key_info: Any,

    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", optional = "true")]
    pub issuer_unique_id: Option<BitString>,

    #[asn1(context_specific = "2", tag_mode = "IMPLICIT", optional = "true")]
    pub subject_unique_id: Option<BitString>,

    #[asn1(context_specific = "3", tag_mode = "EXPLICIT", optional = "true")]
    pub extensions: Option<Extensions>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X509Certificate {
    raw: Vec<u8>,
    raw_tbs: Vec<u8>,
    raw_spki: Vec<u8>,

    pub tbs_certificate: TbsCertificate,
    pub issuer: Name,
    pub subject: Name,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub subject_public_key_info: SubjectPublicKeyInfoOwned,
    pub signature_algorithm: AlgorithmIdentifierOwned,
    pub signature: BitString,
}

impl X509Certificate {
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let cert = CertificateRaw::from_der(der)?;
        let raw_tbs = cert.tbs_certificate.to_der()?;
        let tbs_certificate = TbsCertificate::from_der(&raw_tbs)?;

        let issuer = Name::from_any(&tbs_certificate.issuer)?;
        let subject = Name::from_any(&tbs_certificate.subject)?;
        let not_before = to_chrono(tbs_certificate.validity.not_before)?;
        let not_after = to_chrono(tbs_certificate.validity.not_after)?;
        let raw_spki = tbs_certificate.subject_public_key_info.to_der()?;
        let subject_public_key_info = SubjectPublicKeyInfoOwned::from_der(&raw_spki)?;

        Ok(Self {
            raw: der.to_vec(),
            raw_tbs,
            raw_spki,
            tbs_certificate,
            issuer,
            subject,
            not_before,
            not_after,
            subject_public_key_info,
            signature_algorithm: cert.signature_algorithm,
            signature: cert.signature,
        })
    }

    /// Encoding the certificate was decoded from.
    pub fn to_der(&self) -> &[u8] {
        &self.raw
    }

    /// Encoding of the signed part.
    pub fn tbs_der(&self) -> &[u8] {
        &self.raw_tbs
    }

    /// Encoding of the `SubjectPublicKeyInfo`.
    pub fn spki_der(&self) -> &[u8] {
        &self.raw_spki
    }

    pub fn extension(&self, oid: ObjectIdentifier) -> Option<&Extension> {
        self.tbs_certificate
            .extensions
            .as_ref()?
            .iter()
            .find(|ext| ext.extn_id == oid)
    }

    /// URIs of the authority information access extension for `method`.
    pub fn access_locations(&self, method: ObjectIdentifier) -> Result<Vec<String>, Error> {
        let ext = match self.extension(OID_AUTHORITY_INFO_ACCESS) {
            Some(ext) => ext,
            None => return Ok(Vec::new()),
        };

        let aia = AuthorityInfoAccessSyntax::from_der(ext.extn_value.as_bytes())?;
        let uris = aia
            .0
            .into_iter()
            .filter(|desc| desc.access_method == method)
            .filter_map(|desc| match desc.access_location {
                GeneralName::UniformResourceIdentifier(uri) => Some(uri.to_string()),
                _ => None,
            })
            .collect();

        Ok(uris)
    }
}

fn to_chrono(time: Time) -> Result<DateTime<Utc>, Error> {
    from_unix_duration(time.to_unix_duration())
}

/* Name */

/// Set of attributes sharing one level of a distinguished name.
pub type RelativeDistinguishedName = Vec<AttributeTypeAndValue>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    /// Encoding of the complete name as it was found in the certificate.
    pub raw: Vec<u8>,
    pub rdns: Vec<RelativeDistinguishedName>,
}

impl Name {
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let rdns = Vec::<RdnSet>::from_der(der)?
            .into_iter()
            .map(|set| set.0)
            .collect();

        Ok(Self {
            raw: der.to_vec(),
            rdns,
        })
    }

    fn from_any(any: &Any) -> Result<Self, Error> {
        Self::from_der(&any.to_der()?)
    }
}

/// RDN that keeps the encoded order of its attributes and does not insist
/// on DER set ordering.
struct RdnSet(Vec<AttributeTypeAndValue>);

impl FixedTag for RdnSet {
    const TAG: Tag = Tag::Set;
}

impl<'a> DecodeValue<'a> for RdnSet {
    fn decode_value<R: Reader<'a>>(reader: &mut R, header: Header) -> der::Result<Self> {
        reader.read_nested(header.length, |reader| {
            let mut attribs = Vec::new();
            while !reader.is_finished() {
                attribs.push(reader.decode()?);
            }

            Ok(Self(attribs))
        })
    }
}
