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

//! XAdES signatures of the BDOC profile.
//!
//! The signed parts of a signature (`SignedInfo` and `SignedProperties`) are
//! built once by [`XadesSignature::new`] and never touched afterwards. Only the
//! signature value and the unsigned properties can be changed later on.

mod unsigned;

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::{copy, Read};

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use xmlsec::{C14nMethod, Element, HashMethod, Hasher, Namespace, SignatureMethod};

use crate::{
    algorithm::name_to_oid,
    asn1::{digest_info::DigestInfo, x509::algorithm_with_null, Encode, OctetString},
    certificate::Certificate,
    error::Error,
    timestamp::TimestampError,
};

pub use unsigned::ToBuffer;

pub const NS_DS: &str = "http://www.w3.org/2000/09/xmldsig#";
pub const NS_XADES: &str = "http://uri.etsi.org/01903/v1.3.2#";
pub const NS_ASIC: &str = "http://uri.etsi.org/02918/v1.2.1#";

const POLICY_ID: &str = "urn:oid:1.3.6.1.4.1.10015.1000.3.2.1";
const POLICY_HASH: &str = "3Tl1oILSvOAWomdI9VeWV6IA/32eSXRUri9kPEz1IVs=";
const POLICY_URI: &str = "https://www.sk.ee/repository/bdoc-spec21.pdf";

const SIGNED_PROPERTIES_TYPE: &str = "http://uri.etsi.org/01903#SignedProperties";
const SIGNED_PROPERTIES_URI: &str = "#S0-SignedProperties";

const C14N: C14nMethod = C14nMethod::C14n_Exclusive_1_0;
const DIGEST: HashMethod = HashMethod::Sha256;

/// Characters of a path that stay unescaped in a reference URI.
const URI_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

pub(crate) fn ds() -> Namespace {
    Namespace::new("ds", NS_DS)
}

pub(crate) fn xades() -> Namespace {
    Namespace::new("xades", NS_XADES)
}

fn asic() -> Namespace {
    Namespace::new("asic", NS_ASIC)
}

/* SignableFile */

/// A file referenced from a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignableFile {
    pub path: String,
    pub mime_type: String,

    /// SHA-256 digest of the content.
    pub digest: Vec<u8>,
}

impl SignableFile {
    pub fn new(path: &str, mime_type: &str, data: &[u8]) -> Result<Self, Error> {
        Ok(Self::with_digest(path, mime_type, DIGEST.digest(data)?))
    }

    /// Hashes the content of `reader` chunk by chunk.
    pub fn from_reader<R: Read>(path: &str, mime_type: &str, reader: &mut R) -> Result<Self, Error> {
        let mut hasher = Hasher::new(DIGEST)?;
        copy(reader, &mut hasher)?;

        Ok(Self::with_digest(path, mime_type, hasher.finish()?))
    }

    pub fn with_digest(path: &str, mime_type: &str, digest: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            mime_type: mime_type.into(),
            digest,
        }
    }
}

/* XadesSignature */

#[derive(Debug, Clone)]
pub struct XadesSignature {
    certificate: Certificate,
    files: Vec<SignableFile>,
    signing_time: DateTime<Utc>,
    method: SignatureMethod,
    root: Element,
    ocsp_response: Option<Vec<u8>>,
    timestamp: Option<Vec<u8>>,
}

impl XadesSignature {
    pub fn new(certificate: Certificate, files: Vec<SignableFile>) -> Result<Self, Error> {
        Self::new_at(certificate, files, Utc::now())
    }

    /// Builds the signed parts of a signature made at `signing_time`.
    pub fn new_at(
        certificate: Certificate,
        files: Vec<SignableFile>,
        signing_time: DateTime<Utc>,
    ) -> Result<Self, Error> {
        let signing_time = signing_time.trunc_subsecs(0);
        let method = signature_method(&certificate)?;

        let signed_properties = signed_properties(&certificate, &files, &signing_time)?;
        let signed_properties_digest = DIGEST.digest(&signed_properties.canonicalize(C14N))?;

        let mut signed_info = Element::new(&ds(), "SignedInfo")
            .attr("Id", "S0-SignedInfo")
            .child(Element::new(&ds(), "CanonicalizationMethod").attr("Algorithm", C14N.uri()))
            .child(Element::new(&ds(), "SignatureMethod").attr("Algorithm", method.uri()));
        for (i, file) in files.iter().enumerate() {
            let uri = utf8_percent_encode(&file.path, URI_SET).to_string();
            signed_info.push(reference(i, &uri, &file.digest));
        }
        signed_info.push(
            reference(files.len(), SIGNED_PROPERTIES_URI, &signed_properties_digest)
                .attr("Type", SIGNED_PROPERTIES_TYPE),
        );

        let key_info = Element::new(&ds(), "KeyInfo").attr("Id", "S0-KeyInfo").child(
            Element::new(&ds(), "X509Data").child(
                Element::new(&ds(), "X509Certificate").text(base64::encode(certificate.encode())),
            ),
        );

        let qualifying_properties = Element::new(&xades(), "QualifyingProperties")
            .attr("Id", "S0-QualifyingProperties")
            .attr("Target", "#S0")
            .child(signed_properties);

        let signature = Element::new(&ds(), "Signature")
            .attr("Id", "S0")
            .child(signed_info)
            .child(Element::new(&ds(), "SignatureValue").attr("Id", "S0-SIG"))
            .child(key_info)
            .child(
                Element::new(&ds(), "Object")
                    .attr("Id", "S0-object-xades")
                    .child(qualifying_properties),
            );

        let root = Element::new(&asic(), "XAdESSignatures")
            .declare(&asic())
            .declare(&ds())
            .declare(&xades())
            .child(signature);

        Ok(Self {
            certificate,
            files,
            signing_time,
            method,
            root,
            ocsp_response: None,
            timestamp: None,
        })
    }

    /// Reads a signature document.
    pub fn parse(xml: &str) -> Result<Self, Error> {
        let root = xmlsec::parse(xml)?;

        let signature = root
            .find(NS_DS, "Signature")
            .ok_or_else(|| missing("Signature"))?;
        let signed_info = signature
            .get(NS_DS, "SignedInfo")
            .ok_or_else(|| missing("SignedInfo"))?;

        let certificate = signature
            .find(NS_DS, "X509Certificate")
            .ok_or_else(|| missing("X509Certificate"))?;
        let certificate = Certificate::from_der(&decode_base64(certificate)?)?;

        let method = signed_info
            .get(NS_DS, "SignatureMethod")
            .and_then(|e| e.attribute("Algorithm"))
            .ok_or_else(|| missing("SignatureMethod"))?;
        let method = SignatureMethod::from_uri(method)?;

        let signing_time = signature
            .find(NS_XADES, "SigningTime")
            .ok_or_else(|| missing("SigningTime"))?
            .text_content();
        let signing_time = DateTime::parse_from_rfc3339(signing_time.trim())
            .map_err(|err| Error::InvalidSignature(format!("Invalid signing time: {}", err)))?
            .with_timezone(&Utc);

        let mime_types = signature
            .find_all(NS_XADES, "DataObjectFormat")
            .into_iter()
            .filter_map(|format| {
                let reference = format.attribute("ObjectReference")?;
                let mime_type = format.get(NS_XADES, "MimeType")?.text_content();

                Some((reference.trim_start_matches('#').to_owned(), mime_type))
            })
            .collect::<HashMap<_, _>>();

        let mut files = Vec::new();
        for reference in signed_info.get_all(NS_DS, "Reference") {
            let uri = reference.attribute("URI").unwrap_or_default();
            if reference.attribute("Type") == Some(SIGNED_PROPERTIES_TYPE) || uri.starts_with('#') {
                continue;
            }

            let path = percent_decode_str(uri)
                .decode_utf8()
                .map_err(|_| Error::InvalidSignature(format!("Invalid reference URI: {}", uri)))?;
            let digest = reference
                .get(NS_DS, "DigestValue")
                .ok_or_else(|| missing("DigestValue"))?;
            let mime_type = reference
                .attribute("Id")
                .and_then(|id| mime_types.get(id))
                .map(String::as_str)
                .unwrap_or("application/octet-stream");

            files.push(SignableFile::with_digest(&path, mime_type, decode_base64(digest)?));
        }

        let ocsp_response = signature
            .find(NS_XADES, "EncapsulatedOCSPValue")
            .map(decode_base64)
            .transpose()?;
        let timestamp = signature
            .find(NS_XADES, "EncapsulatedTimeStamp")
            .map(decode_base64)
            .transpose()?;

        Ok(Self {
            certificate,
            files,
            signing_time,
            method,
            root,
            ocsp_response,
            timestamp,
        })
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    pub fn files(&self) -> &[SignableFile] {
        &self.files
    }

    pub fn signing_time(&self) -> DateTime<Utc> {
        self.signing_time
    }

    pub fn signature_method(&self) -> SignatureMethod {
        self.method
    }

    /// Digest of the canonical `SignedInfo`, the value to be signed.
    pub fn signable(&self) -> Result<Vec<u8>, Error> {
        let signed_info = self
            .root
            .find(NS_DS, "SignedInfo")
            .ok_or_else(|| missing("SignedInfo"))?;

        Ok(self.method.hash_method().digest(&signed_info.canonicalize(C14N))?)
    }

    /// The signable digest wrapped into a DER encoded `DigestInfo`.
    pub fn signable_digest_info(&self) -> Result<Vec<u8>, Error> {
        let hash = self.method.hash_method();
        let digest_info = DigestInfo {
            algorithm: algorithm_with_null(name_to_oid(hash_name(hash))?)?,
            digest: OctetString::new(self.signable()?)?,
        };

        Ok(digest_info.to_der()?)
    }

    /// Stores the raw signature value over [`signable`](Self::signable).
    pub fn set_signature(&mut self, signature: &[u8]) -> Result<(), Error> {
        let value = self
            .root
            .find_mut(NS_DS, "SignatureValue")
            .ok_or_else(|| missing("SignatureValue"))?;
        value.set_text(base64::encode(signature));

        Ok(())
    }

    pub fn signature_value(&self) -> Option<Vec<u8>> {
        let value = self.root.find(NS_DS, "SignatureValue")?;
        let value = decode_base64(value).ok()?;

        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// Canonical `SignatureValue` element, the input of the signature time
    /// stamp.
    pub fn signature_element(&self) -> Result<Vec<u8>, Error> {
        if self.signature_value().is_none() {
            return Err(Error::SignatureValueMissing);
        }

        let value = self
            .root
            .find(NS_DS, "SignatureValue")
            .ok_or(Error::SignatureValueMissing)?;

        Ok(value.canonicalize(C14N))
    }

    pub fn set_ocsp_response<T: ToBuffer + ?Sized>(&mut self, response: &T) -> Result<(), Error> {
        self.ocsp_response = Some(response.to_buffer().into_owned());

        self.update_unsigned_properties()
    }

    /// Embeds a time stamp token. An empty token, as produced by a rejected
    /// time stamp response, is refused.
    pub fn set_timestamp<T: ToBuffer + ?Sized>(&mut self, timestamp: &T) -> Result<(), Error> {
        let token = timestamp.to_buffer();
        if token.is_empty() {
            return Err(TimestampError::MissingToken.into());
        }

        self.timestamp = Some(token.into_owned());

        self.update_unsigned_properties()
    }

    pub fn ocsp_response(&self) -> Option<&[u8]> {
        self.ocsp_response.as_deref()
    }

    pub fn timestamp(&self) -> Option<&[u8]> {
        self.timestamp.as_deref()
    }

    pub fn to_document(&self) -> String {
        self.root.to_document()
    }

    fn update_unsigned_properties(&mut self) -> Result<(), Error> {
        let properties = unsigned::unsigned_properties(
            self.timestamp.as_deref(),
            self.ocsp_response.as_deref(),
        );

        let qualifying = self
            .root
            .find_mut(NS_XADES, "QualifyingProperties")
            .ok_or_else(|| missing("QualifyingProperties"))?;
        qualifying.remove_all(NS_XADES, "UnsignedProperties");
        qualifying.push(properties);

        Ok(())
    }
}

impl Display for XadesSignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.to_document())
    }
}

/// Signature method for the key of `certificate`, always with SHA-256.
pub fn signature_method(certificate: &Certificate) -> Result<SignatureMethod, Error> {
    match certificate.public_key_algorithm_name().as_str() {
        "rsa" => Ok(SignatureMethod::RsaSha256),
        "ecdsa" => Ok(SignatureMethod::EcdsaSha256),
        "dsa" => Ok(SignatureMethod::DsaSha256),
        name => Err(Error::UnsupportedAlgorithm(name.into())),
    }
}

fn signed_properties(
    certificate: &Certificate,
    files: &[SignableFile],
    signing_time: &DateTime<Utc>,
) -> Result<Element, Error> {
    let cert_digest = DIGEST.digest(&certificate.encode())?;

    let signing_certificate = Element::new(&xades(), "SigningCertificate").child(
        Element::new(&xades(), "Cert")
            .child(
                Element::new(&xades(), "CertDigest")
                    .child(digest_method(DIGEST))
                    .child(Element::new(&ds(), "DigestValue").text(base64::encode(&cert_digest))),
            )
            .child(
                Element::new(&xades(), "IssuerSerial")
                    .child(
                        Element::new(&ds(), "X509IssuerName")
                            .text(certificate.issuer_rfc4514_name()),
                    )
                    .child(
                        Element::new(&ds(), "X509SerialNumber")
                            .text(certificate.serial_number()?),
                    ),
            ),
    );

    let policy = Element::new(&xades(), "SignaturePolicyIdentifier").child(
        Element::new(&xades(), "SignaturePolicyId")
            .child(
                Element::new(&xades(), "SigPolicyId").child(
                    Element::new(&xades(), "Identifier")
                        .attr("Qualifier", "OIDAsURN")
                        .text(POLICY_ID),
                ),
            )
            .child(
                Element::new(&xades(), "SigPolicyHash")
                    .child(digest_method(HashMethod::Sha256))
                    .child(Element::new(&ds(), "DigestValue").text(POLICY_HASH)),
            )
            .child(
                Element::new(&xades(), "SigPolicyQualifiers").child(
                    Element::new(&xades(), "SigPolicyQualifier")
                        .child(Element::new(&xades(), "SPURI").text(POLICY_URI)),
                ),
            ),
    );

    let signed_signature_properties = Element::new(&xades(), "SignedSignatureProperties")
        .attr("Id", "S0-SignedSignatureProperties")
        .child(
            Element::new(&xades(), "SigningTime")
                .text(signing_time.to_rfc3339_opts(SecondsFormat::Secs, true)),
        )
        .child(signing_certificate)
        .child(policy);

    let mut data_object_properties = Element::new(&xades(), "SignedDataObjectProperties");
    for (i, file) in files.iter().enumerate() {
        data_object_properties.push(
            Element::new(&xades(), "DataObjectFormat")
                .attr("ObjectReference", &format!("#{}", reference_id(i)))
                .child(Element::new(&xades(), "MimeType").text(file.mime_type.as_str())),
        );
    }

    Ok(Element::new(&xades(), "SignedProperties")
        .attr("Id", "S0-SignedProperties")
        .child(signed_signature_properties)
        .child(data_object_properties))
}

fn reference(index: usize, uri: &str, digest: &[u8]) -> Element {
    let mut reference = Element::new(&ds(), "Reference")
        .attr("Id", &reference_id(index))
        .attr("URI", uri);

    if uri.starts_with('#') {
        reference.push(
            Element::new(&ds(), "Transforms")
                .child(Element::new(&ds(), "Transform").attr("Algorithm", C14N.uri())),
        );
    }

    reference
        .child(digest_method(DIGEST))
        .child(Element::new(&ds(), "DigestValue").text(base64::encode(digest)))
}

fn reference_id(index: usize) -> String {
    format!("S0-RefId{}", index)
}

fn digest_method(method: HashMethod) -> Element {
    Element::new(&ds(), "DigestMethod").attr("Algorithm", method.uri())
}

fn hash_name(method: HashMethod) -> &'static str {
    match method {
        HashMethod::Sha1 => "sha1",
        HashMethod::Sha256 => "sha256",
        HashMethod::Sha384 => "sha384",
        HashMethod::Sha512 => "sha512",
    }
}

fn decode_base64(element: &Element) -> Result<Vec<u8>, Error> {
    let text = element.text_content().split_whitespace().collect::<String>();

    Ok(base64::decode(text)?)
}

fn missing(name: &str) -> Error {
    Error::InvalidSignature(format!("Missing element: {}", name))
}

impl ToBuffer for XadesSignature {
    fn to_buffer(&self) -> Cow<'_, [u8]> {
        Cow::Owned(self.to_document().into_bytes())
    }
}
