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

use der::{
    asn1::{BitString, Int, Null, OctetString},
    Any, Choice, Decode, Encode, Sequence,
};
use spki::{AlgorithmIdentifierOwned, ObjectIdentifier};
use x509_cert::ext::{pkix::name::GeneralName, Extension, Extensions};

use super::{
    types::{EnumeratedValue, GeneralizedTime},
    Error,
};

pub const OID_PKIX_OCSP_BASIC: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.1.1");
pub const OID_PKIX_OCSP_NONCE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.1.2");
pub const OID_PKIX_OCSP_RESPONSE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.1.4");

/* CertId */

#[derive(Debug, Clone, PartialEq, Eq, Sequence)]
pub struct CertId {
    pub hash_algorithm: AlgorithmIdentifierOwned,
    pub issuer_name_hash: OctetString,
    pub issuer_key_hash: OctetString,
    pub serial_number: Int,
}

/* Request */

#[derive(Debug, Clone, PartialEq, Eq, Sequence)]
pub struct SingleRequest {
    pub req_cert: CertId,

    #[asn1(context_specific = "0", optional = "true")]
    pub single_request_extensions: Option<Extensions>,
}

#[derive(Debug, Clone, PartialEq, Eq, Sequence)]
pub struct TbsRequest {
    #[asn1(context_specific = "0", default = "Default::default")]
    pub version: u8,

    #[asn1(context_specific = "1", optional = "true")]
    pub requestor_name: Option<GeneralName>,

    pub request_list: Vec<SingleRequest>,

    #[asn1(context_specific = "2", optional = "true")]
    pub request_extensions: Option<Extensions>,
}

/// `OCSPRequest`; the requestor signature is kept undecoded.
#[derive(Debug, Clone, PartialEq, Eq, Sequence)]
pub struct Request {
    pub tbs_request: TbsRequest,

    #[asn1(context_specific = "0", optional = "true")]
    pub optional_signature: Option<Any>,
}

impl Request {
    pub fn new(cert_ids: Vec<CertId>, extensions: Extensions) -> Self {
        Self {
            tbs_request: TbsRequest {
                version: 0,
                requestor_name: None,
                request_list: cert_ids
                    .into_iter()
                    .map(|req_cert| SingleRequest {
                        req_cert,
                        single_request_extensions: None,
                    })
                    .collect(),
                request_extensions: Some(extensions).filter(|ext| !ext.is_empty()),
            },
            optional_signature: None,
        }
    }

    pub fn nonce(&self) -> Option<Vec<u8>> {
        find_nonce(self.tbs_request.request_extensions.as_deref()?)
    }
}

/// Extension asking the responder for a basic OCSP response.
pub fn acceptable_responses_extension() -> Result<Extension, Error> {
    let value = vec![OID_PKIX_OCSP_BASIC].to_der()?;

    Ok(Extension {
        extn_id: OID_PKIX_OCSP_RESPONSE,
        critical: false,
        extn_value: OctetString::new(value)?,
    })
}

/// Nonce extension; the value is wrapped into an OCTET STRING.
pub fn nonce_extension(nonce: &[u8]) -> Result<Extension, Error> {
    let value = OctetString::new(nonce)?.to_der()?;

    Ok(Extension {
        extn_id: OID_PKIX_OCSP_NONCE,
        critical: false,
        extn_value: OctetString::new(value)?,
    })
}

/// Nonce of the extension list.
///
/// Responders are not consistent whether they wrap the nonce into an
/// OCTET STRING or not, so both forms are accepted.
pub fn find_nonce(extensions: &[Extension]) -> Option<Vec<u8>> {
    let value = extensions
        .iter()
        .find(|ext| ext.extn_id == OID_PKIX_OCSP_NONCE)?
        .extn_value
        .as_bytes();

    match OctetString::from_der(value) {
        Ok(nonce) => Some(nonce.as_bytes().to_vec()),
        Err(_) => Some(value.to_vec()),
    }
}

/* Response */

#[derive(Debug, Clone, PartialEq, Eq, Sequence)]
pub struct ResponseBytes {
    pub response_type: ObjectIdentifier,
    pub response: OctetString,
}

/// `OCSPResponse`. Unknown status values are kept to report them.
#[derive(Debug, Clone, PartialEq, Eq, Sequence)]
pub struct Response {
    pub response_status: EnumeratedValue,

    #[asn1(context_specific = "0", optional = "true")]
    pub response_bytes: Option<ResponseBytes>,
}

/* BasicResponse */

#[derive(Debug, Clone, PartialEq, Eq, Sequence)]
pub struct BasicResponse {
    /// `ResponseData` as signed by the responder.
    pub tbs_response_data: Any,
    pub signature_algorithm: AlgorithmIdentifierOwned,
    pub signature: BitString,

    #[asn1(context_specific = "0", optional = "true")]
    pub certs: Option<Vec<Any>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Sequence)]
pub struct ResponseData {
    #[asn1(context_specific = "0", default = "Default::default")]
    pub version: u8,
    pub responder_id: ResponderId,
    pub produced_at: GeneralizedTime,
    pub responses: Vec<SingleResponse>,

    #[asn1(context_specific = "1", optional = "true")]
    pub response_extensions: Option<Extensions>,
}

impl ResponseData {
    pub fn nonce(&self) -> Option<Vec<u8>> {
        find_nonce(self.response_extensions.as_deref()?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Choice)]
pub enum ResponderId {
    /// Encoded `Name` of the responder.
    #[asn1(context_specific = "1", tag_mode = "EXPLICIT", constructed = "true")]
    ByName(Any),

    /// SHA-1 hash of the responder key.
    #[asn1(context_specific = "2", tag_mode = "EXPLICIT", constructed = "true")]
    ByKey(OctetString),
}

#[derive(Debug, Clone, PartialEq, Eq, Sequence)]
pub struct SingleResponse {
    pub cert_id: CertId,
    pub cert_status: CertStatus,
    pub this_update: GeneralizedTime,

    #[asn1(context_specific = "0", optional = "true")]
    pub next_update: Option<GeneralizedTime>,

    #[asn1(context_specific = "1", optional = "true")]
    pub single_extensions: Option<Extensions>,
}

#[derive(Debug, Clone, PartialEq, Eq, Choice)]
pub enum CertStatus {
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT")]
    Good(Null),

    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", constructed = "true")]
    Revoked(RevokedInfo),

    #[asn1(context_specific = "2", tag_mode = "IMPLICIT")]
    Unknown(Null),
}

#[derive(Debug, Clone, PartialEq, Eq, Sequence)]
pub struct RevokedInfo {
    pub revocation_time: GeneralizedTime,

    /// `CRLReason` value.
    #[asn1(context_specific = "0", optional = "true")]
    pub revocation_reason: Option<EnumeratedValue>,
}

#[cfg(test)]
pub mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};

    use super::super::x509::algorithm_with_null;

    fn cert_id() -> CertId {
        CertId {
            hash_algorithm: algorithm_with_null(ObjectIdentifier::new_unwrap("1.3.14.3.2.26"))
                .unwrap(),
            issuer_name_hash: OctetString::new(vec![1; 20]).unwrap(),
            issuer_key_hash: OctetString::new(vec![2; 20]).unwrap(),
            serial_number: Int::new(&[0x01, 0x23]).unwrap(),
        }
    }

    #[test]
    fn request_with_nonce() {
        let request = Request::new(
            vec![cert_id()],
            vec![
                acceptable_responses_extension().unwrap(),
                nonce_extension(&[7; 16]).unwrap(),
            ],
        );

        let der = request.to_der().unwrap();
        let decoded = Request::from_der(&der).unwrap();

        assert_eq!(decoded, request);
        assert_eq!(decoded.nonce().unwrap(), vec![7; 16]);
    }

    #[test]
    fn request_without_extensions() {
        let request = Request::new(vec![cert_id()], Vec::new());

        assert!(request.tbs_request.request_extensions.is_none());
        assert!(request.nonce().is_none());
    }

    #[test]
    fn error_response_without_bytes() {
        let der = hex::decode("30030a0106").unwrap();
        let response = Response::from_der(&der).unwrap();

        assert_eq!(response.response_status, EnumeratedValue(6));
        assert!(response.response_bytes.is_none());
        assert_eq!(response.to_der().unwrap(), der);
    }

    #[test]
    fn raw_nonce_is_accepted() {
        let ext = Extension {
            extn_id: OID_PKIX_OCSP_NONCE,
            critical: false,
            extn_value: OctetString::new(vec![0xAB, 0xCD]).unwrap(),
        };

        assert_eq!(find_nonce(&[ext]).unwrap(), vec![0xAB, 0xCD]);
    }

    #[test]
    fn revoked_status_with_reason() {
        let time = Utc.with_ymd_and_hms(2021, 1, 2, 3, 4, 5).unwrap();
        let status = CertStatus::Revoked(RevokedInfo {
            revocation_time: time.into(),
            revocation_reason: Some(EnumeratedValue(1)),
        });

        let der = status.to_der().unwrap();

        assert_eq!(der[0], 0xA1);
        assert_eq!(CertStatus::from_der(&der).unwrap(), status);
        assert_eq!(
            CertStatus::from_der(&[0x80, 0x00]).unwrap(),
            CertStatus::Good(Null)
        );
    }
}
