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

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use openssl::{
    hash::{hash, MessageDigest},
    rand::rand_bytes,
    sign::Verifier,
};
use thiserror::Error;

use crate::{
    algorithm::{name_to_oid, oid_to_name},
    asn1::{
        ocsp::{
            acceptable_responses_extension, nonce_extension, BasicResponse, CertId, Request,
            Response, ResponseData, SingleResponse, OID_PKIX_OCSP_BASIC,
        },
        types::EnumeratedValue,
        x509::algorithm_with_null,
        Decode, Encode, Error as Asn1Error, Int, ObjectIdentifier, OctetString,
    },
    certificate::Certificate,
    error::Error,
    http::Client,
    store::TrustServiceList,
    xades::ToBuffer,
};

pub use crate::asn1::ocsp::CertStatus;

/* OcspError */

/// Unsuccessful OCSP response status.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcspError {
    #[error("Illegal confirmation request!")]
    MalformedRequest,

    #[error("Internal error in issuer!")]
    InternalError,

    #[error("Try again later!")]
    TryLater,

    #[error("Must sign the request!")]
    SigRequired,

    #[error("Request unauthorized!")]
    Unauthorized,

    #[error("Unsupported response type!")]
    UnsupportedResponse,
}

impl OcspError {
    /// Maps a `responseStatus` other than `successful`.
    pub fn from_status(status: u32) -> Option<Self> {
        match status {
            1 => Some(Self::MalformedRequest),
            2 => Some(Self::InternalError),
            3 => Some(Self::TryLater),
            5 => Some(Self::SigRequired),
            6 => Some(Self::Unauthorized),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedRequest => "malformedRequest",
            Self::InternalError => "internalError",
            Self::TryLater => "tryLater",
            Self::SigRequired => "sigRequired",
            Self::Unauthorized => "unauthorized",
            Self::UnsupportedResponse => "unsupportedResponse",
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

/* OcspRequest */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcspRequest {
    request: Request,
}

impl OcspRequest {
    /// Builds a request for the status of `cert`.
    ///
    /// The issuer name and key hashes always use SHA-1.
    pub fn new(issuer: &Certificate, cert: &Certificate, nonce: Option<&[u8]>) -> Result<Self, Error> {
        let cert_id = CertId {
            hash_algorithm: algorithm_with_null(name_to_oid("sha1")?)?,
            issuer_name_hash: OctetString::new(hash(MessageDigest::sha1(), issuer.subject_raw())?.to_vec())?,
            issuer_key_hash: OctetString::new(hash(MessageDigest::sha1(), issuer.public_key_bits())?.to_vec())?,
            serial_number: Int::new(cert.serial_number_bytes())?,
        };

        let mut extensions = vec![acceptable_responses_extension()?];
        if let Some(nonce) = nonce {
            extensions.push(nonce_extension(nonce)?);
        }

        Ok(Self {
            request: Request::new(vec![cert_id], extensions),
        })
    }

    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        Ok(Self {
            request: Request::from_der(der)?,
        })
    }

    pub fn cert_id(&self) -> Option<&CertId> {
        self.request
            .tbs_request
            .request_list
            .first()
            .map(|single| &single.req_cert)
    }

    pub fn nonce(&self) -> Option<Vec<u8>> {
        self.request.nonce()
    }

    pub fn to_der(&self) -> Result<Vec<u8>, Error> {
        Ok(self.request.to_der()?)
    }
}

/* OcspResponse */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcspResponse {
    raw: Vec<u8>,
    basic: BasicResponse,
    data: ResponseData,
}

impl OcspResponse {
    /// Parses a DER encoded `OCSPResponse`.
    ///
    /// A `responseStatus` other than `successful` and response types other
    /// than the basic one are returned as [`OcspError`].
    pub fn parse(der: &[u8]) -> Result<Self, Error> {
        let response = Response::from_der(der)?;

        let EnumeratedValue(status) = response.response_status;
        if status != 0 {
            let err = OcspError::from_status(status).ok_or(Asn1Error::UnknownEnumVariant(status))?;

            return Err(err.into());
        }

        let basic = match &response.response_bytes {
            Some(bytes) if bytes.response_type == OID_PKIX_OCSP_BASIC => {
                BasicResponse::from_der(bytes.response.as_bytes())?
            }
            _ => return Err(OcspError::UnsupportedResponse.into()),
        };
        let data = ResponseData::from_der(&basic.tbs_response_data.to_der()?)?;

        Ok(Self {
            raw: der.to_vec(),
            basic,
            data,
        })
    }

    pub fn produced_at(&self) -> DateTime<Utc> {
        self.data.produced_at.0
    }

    pub fn responses(&self) -> &[SingleResponse] {
        &self.data.responses
    }

    pub fn nonce(&self) -> Option<Vec<u8>> {
        self.data.nonce()
    }

    pub fn basic(&self) -> &BasicResponse {
        &self.basic
    }

    /// Certificates sent along by the responder.
    pub fn certificates(&self) -> Result<Vec<Certificate>, Error> {
        self.basic
            .certs
            .iter()
            .flatten()
            .map(|cert| Certificate::from_der(&cert.to_der()?))
            .collect()
    }

    /// Status entry of `cert`, matched on serial number and issuer name hash.
    pub fn status_for(&self, cert: &Certificate) -> Option<&SingleResponse> {
        self.data.responses.iter().find(|single| {
            let id = &single.cert_id;
            if id.serial_number.as_bytes() != cert.serial_number_bytes() {
                return false;
            }

            match digest_of(&id.hash_algorithm.oid) {
                Some(md) => match hash(md, cert.issuer_raw()) {
                    Ok(name_hash) => *name_hash == *id.issuer_name_hash.as_bytes(),
                    Err(_) => false,
                },
                None => false,
            }
        })
    }

    /// Checks the responder signature with the key of `responder`.
    pub fn verify(&self, responder: &Certificate) -> Result<bool, Error> {
        let name = oid_to_name(&self.basic.signature_algorithm.oid)?;
        let digest = name
            .split('-')
            .nth(1)
            .and_then(MessageDigest::from_name)
            .ok_or_else(|| Error::UnsupportedAlgorithm(name.into()))?;

        let key = responder.to_openssl()?.public_key()?;
        let mut verifier = Verifier::new(digest, &key)?;
        verifier.update(&self.basic.tbs_response_data.to_der()?)?;

        Ok(verifier.verify(self.basic.signature.raw_bytes())?)
    }
}

impl ToBuffer for OcspResponse {
    fn to_buffer(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.raw)
    }
}

fn digest_of(algorithm: &ObjectIdentifier) -> Option<MessageDigest> {
    oid_to_name(algorithm).ok().and_then(MessageDigest::from_name)
}

impl CertStatus {
    pub fn code(&self) -> &'static str {
        match self {
            CertStatus::Good(_) => "good",
            CertStatus::Revoked(_) => "revoked",
            CertStatus::Unknown(_) => "unknown",
        }
    }
}

/* Ocsp */

/// OCSP client.
pub struct Ocsp {
    client: Client,
    url: Option<String>,
}

impl Ocsp {
    /// Creates a new client; `url` overrides the responder of the certificates.
    pub fn new(client: Client, url: Option<String>) -> Self {
        Self { client, url }
    }

    pub async fn send(&self, url: &str, request: &OcspRequest) -> Result<Vec<u8>, Error> {
        self.client
            .post_der(
                url,
                "application/ocsp-request",
                "application/ocsp-response",
                request.to_der()?,
            )
            .await
    }

    /// Requests the revocation status of `cert`.
    ///
    /// The issuer is taken from `issuer` or, if not given, looked up in `tsl`.
    pub async fn read(
        &self,
        cert: &Certificate,
        issuer: Option<&Certificate>,
        tsl: Option<&TrustServiceList>,
    ) -> Result<OcspResponse, Error> {
        let found;
        let issuer = match (issuer, tsl) {
            (Some(issuer), _) => issuer,
            (None, Some(tsl)) => {
                found = tsl.get_issuer(cert).ok_or(Error::IssuerNotFound)?;

                &found
            }
            (None, None) => return Err(Error::IssuerNotFound),
        };

        let url = match &self.url {
            Some(url) => url.clone(),
            None => cert.ocsp_url().ok_or(Error::OcspUrlMissing)?,
        };

        let mut nonce = [0u8; 16];
        rand_bytes(&mut nonce)?;

        let request = OcspRequest::new(issuer, cert, Some(&nonce))?;
        let response = self.send(&url, &request).await?;
        let response = OcspResponse::parse(&response)?;

        match response.nonce() {
            Some(echo) if echo != nonce => return Err(Error::OcspNonceMismatch),
            Some(_) => (),
            None => warn!("OCSP responder did not echo the nonce ({})", url),
        }

        let status = response
            .status_for(cert)
            .ok_or(Error::OcspStatusMissing)?;

        if !verify_responder(&response, issuer) {
            warn!("Unable to verify the signature of the OCSP response ({})", url);
        }

        info!(
            "OCSP status of {} (serial={}): {}",
            cert,
            cert.serial_number().unwrap_or_default(),
            status.cert_status.code()
        );

        Ok(response)
    }
}

fn verify_responder(response: &OcspResponse, issuer: &Certificate) -> bool {
    let mut responders = response.certificates().unwrap_or_default();
    responders.push(issuer.clone());

    responders.iter().any(|responder| match response.verify(responder) {
        Ok(verified) => verified,
        Err(err) => {
            debug!("Unable to verify OCSP response with {}: {}", responder, err);

            false
        }
    })
}

#[cfg(test)]
pub mod tests {
    use super::*;

    use chrono::TimeZone;
    use der::asn1::{BitString, Null};
    use httpmock::{Method::POST, MockServer};
    use openssl::{
        ocsp::{OcspCertId, OcspRequest as OpenSslOcspRequest},
        pkey::{PKey, Private},
        sha::sha1,
        sign::Signer,
    };

    use crate::{
        asn1::{
            ocsp::{ResponderId, ResponseBytes, RevokedInfo},
            Any,
        },
        certificate::tests::{create_ca, create_cert},
    };

    /// Basic response signed with `key`, wrapped into an `OCSPResponse`.
    pub fn create_response(
        cert_id: &CertId,
        status: &CertStatus,
        nonce: Option<&[u8]>,
        key: &PKey<Private>,
        certs: &[&Certificate],
    ) -> Vec<u8> {
        let time = Utc.with_ymd_and_hms(2021, 5, 6, 7, 8, 9).unwrap();

        let data = ResponseData {
            version: 0,
            responder_id: ResponderId::ByKey(OctetString::new(vec![0x11; 20]).unwrap()),
            produced_at: time.into(),
            responses: vec![SingleResponse {
                cert_id: cert_id.clone(),
                cert_status: status.clone(),
                this_update: time.into(),
                next_update: None,
                single_extensions: None,
            }],
            response_extensions: nonce.map(|nonce| vec![nonce_extension(nonce).unwrap()]),
        };
        let tbs = data.to_der().unwrap();

        let mut signer = Signer::new(MessageDigest::sha256(), key).unwrap();
        signer.update(&tbs).unwrap();
        let signature = signer.sign_to_vec().unwrap();

        let certs = certs
            .iter()
            .map(|cert| Any::from_der(&cert.encode()).unwrap())
            .collect::<Vec<_>>();
        let basic = BasicResponse {
            tbs_response_data: Any::from_der(&tbs).unwrap(),
            signature_algorithm: algorithm_with_null(name_to_oid("rsa-sha256").unwrap()).unwrap(),
            signature: BitString::from_bytes(&signature).unwrap(),
            certs: Some(certs).filter(|certs| !certs.is_empty()),
        };

        Response {
            response_status: EnumeratedValue(0),
            response_bytes: Some(ResponseBytes {
                response_type: OID_PKIX_OCSP_BASIC,
                response: OctetString::new(basic.to_der().unwrap()).unwrap(),
            }),
        }
        .to_der()
        .unwrap()
    }

    fn good() -> CertStatus {
        CertStatus::Good(Null)
    }

    #[test]
    fn request_hashes() {
        let ca = create_ca("Test CA");
        let leaf = create_cert(&ca, "Leaf", 0x1234, None);

        let request = OcspRequest::new(&ca.cert, &leaf.cert, Some(&[5; 16])).unwrap();
        let cert_id = request.cert_id().unwrap();

        assert_eq!(cert_id.issuer_name_hash.as_bytes(), sha1(ca.cert.subject_raw()));
        assert_eq!(cert_id.issuer_key_hash.as_bytes(), sha1(ca.cert.public_key_bits()));
        assert_eq!(cert_id.serial_number.as_bytes(), &[0x12, 0x34]);
        assert_eq!(request.nonce().unwrap(), vec![5; 16]);

        let decoded = OcspRequest::from_der(&request.to_der().unwrap()).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn cert_id_matches_openssl() {
        let ca = create_ca("Test CA");
        let leaf = create_cert(&ca, "Leaf", 77, None);

        let id = OcspCertId::from_cert(MessageDigest::sha1(), &leaf.x509, &ca.x509).unwrap();
        let mut expected = OpenSslOcspRequest::new().unwrap();
        expected.add_id(id).unwrap();
        let expected = OcspRequest::from_der(&expected.to_der().unwrap()).unwrap();

        let actual = OcspRequest::new(&ca.cert, &leaf.cert, None).unwrap();

        assert_eq!(actual.cert_id(), expected.cert_id());
    }

    #[test]
    fn unauthorized_status() {
        let der = hex::decode("30030a0106").unwrap();

        match OcspResponse::parse(&der) {
            Err(Error::OcspError(err)) => {
                assert_eq!(err, OcspError::Unauthorized);
                assert_eq!(err.code(), "unauthorized");
            }
            _ => panic!("expected unauthorized OCSP error"),
        }
    }

    #[test]
    fn unknown_status() {
        let der = hex::decode("30030a0104").unwrap();

        assert!(matches!(
            OcspResponse::parse(&der),
            Err(Error::Asn1Error(Asn1Error::UnknownEnumVariant(4)))
        ));
    }

    #[test]
    fn non_basic_response_type() {
        let der = Response {
            response_status: EnumeratedValue(0),
            response_bytes: Some(ResponseBytes {
                response_type: ObjectIdentifier::new_unwrap("1.2.3.4"),
                response: OctetString::new(vec![0x30, 0x00]).unwrap(),
            }),
        }
        .to_der()
        .unwrap();

        assert!(matches!(
            OcspResponse::parse(&der),
            Err(Error::OcspError(OcspError::UnsupportedResponse))
        ));
    }

    #[test]
    fn successful_response() {
        let ca = create_ca("Test CA");
        let leaf = create_cert(&ca, "Leaf", 77, None);
        let other = create_cert(&ca, "Other", 78, None);

        let request = OcspRequest::new(&ca.cert, &leaf.cert, Some(&[9; 16])).unwrap();
        let der = create_response(
            request.cert_id().unwrap(),
            &good(),
            Some(&[9; 16]),
            &ca.key,
            &[&ca.cert],
        );

        let response = OcspResponse::parse(&der).unwrap();

        assert_eq!(&*response.to_buffer(), der.as_slice());
        assert_eq!(response.nonce().unwrap(), vec![9; 16]);
        assert_eq!(response.produced_at(), Utc.with_ymd_and_hms(2021, 5, 6, 7, 8, 9).unwrap());
        assert_eq!(response.certificates().unwrap(), vec![ca.cert.clone()]);
        assert_eq!(response.status_for(&leaf.cert).unwrap().cert_status, good());
        assert!(response.status_for(&other.cert).is_none());
        assert!(response.verify(&ca.cert).unwrap());
        assert!(!response.verify(&leaf.cert).unwrap());
        assert!(verify_responder(&response, &ca.cert));
    }

    #[test]
    fn revoked_response() {
        let ca = create_ca("Test CA");
        let leaf = create_cert(&ca, "Leaf", 77, None);
        let revoked = CertStatus::Revoked(RevokedInfo {
            revocation_time: Utc.with_ymd_and_hms(2021, 1, 2, 3, 4, 5).unwrap().into(),
            revocation_reason: Some(EnumeratedValue(1)),
        });

        let request = OcspRequest::new(&ca.cert, &leaf.cert, None).unwrap();
        let der = create_response(request.cert_id().unwrap(), &revoked, None, &ca.key, &[]);

        let response = OcspResponse::parse(&der).unwrap();
        let status = &response.status_for(&leaf.cert).unwrap().cert_status;

        assert_eq!(status.code(), "revoked");
        assert_eq!(*status, revoked);
        assert!(response.nonce().is_none());
        assert!(response.certificates().unwrap().is_empty());
    }

    #[tokio::test]
    async fn read_requires_issuer_and_url() {
        let ca = create_ca("Test CA");
        let leaf = create_cert(&ca, "Leaf", 77, None);
        let ocsp = Ocsp::new(Client::new(&Default::default()).unwrap(), None);

        assert!(matches!(
            ocsp.read(&leaf.cert, None, None).await,
            Err(Error::IssuerNotFound)
        ));
        assert!(matches!(
            ocsp.read(&leaf.cert, Some(&ca.cert), None).await,
            Err(Error::OcspUrlMissing)
        ));
    }

    /* HTTP exchange */

    fn request_len(ca: &Certificate, leaf: &Certificate) -> usize {
        OcspRequest::new(ca, leaf, Some(&[0; 16]))
            .unwrap()
            .to_der()
            .unwrap()
            .len()
    }

    #[tokio::test]
    async fn read_posts_request_to_certificate_responder() {
        let server = MockServer::start_async().await;
        let ca = create_ca("Test CA");
        let leaf = create_cert(&ca, "Leaf", 77, Some(&server.url("/ocsp")));

        let request = OcspRequest::new(&ca.cert, &leaf.cert, None).unwrap();
        let body = create_response(request.cert_id().unwrap(), &good(), None, &ca.key, &[]);

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/ocsp")
                    .header("content-type", "application/ocsp-request")
                    .header("accept", "application/ocsp-response")
                    .header("content-length", request_len(&ca.cert, &leaf.cert).to_string());
                then.status(200)
                    .header("content-type", "application/ocsp-response")
                    .body(&body);
            })
            .await;

        let ocsp = Ocsp::new(Client::new(&Default::default()).unwrap(), None);
        let response = ocsp.read(&leaf.cert, Some(&ca.cert), None).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.status_for(&leaf.cert).unwrap().cert_status, good());
        assert_eq!(&*response.to_buffer(), body.as_slice());
    }

    #[tokio::test]
    async fn read_rejects_foreign_nonce() {
        let server = MockServer::start_async().await;
        let ca = create_ca("Test CA");
        let leaf = create_cert(&ca, "Leaf", 77, None);

        let request = OcspRequest::new(&ca.cert, &leaf.cert, None).unwrap();
        let body = create_response(request.cert_id().unwrap(), &good(), Some(&[1; 16]), &ca.key, &[]);

        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/ocsp");
                then.status(200).body(&body);
            })
            .await;

        let ocsp = Ocsp::new(
            Client::new(&Default::default()).unwrap(),
            Some(server.url("/ocsp")),
        );

        assert!(matches!(
            ocsp.read(&leaf.cert, Some(&ca.cert), None).await,
            Err(Error::OcspNonceMismatch)
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn read_requires_status_of_certificate() {
        let server = MockServer::start_async().await;
        let ca = create_ca("Test CA");
        let leaf = create_cert(&ca, "Leaf", 77, None);
        let other = create_cert(&ca, "Other", 78, None);

        let request = OcspRequest::new(&ca.cert, &other.cert, None).unwrap();
        let body = create_response(request.cert_id().unwrap(), &good(), None, &ca.key, &[]);

        server
            .mock_async(|when, then| {
                when.method(POST).path("/ocsp");
                then.status(200).body(&body);
            })
            .await;

        let ocsp = Ocsp::new(
            Client::new(&Default::default()).unwrap(),
            Some(server.url("/ocsp")),
        );

        assert!(matches!(
            ocsp.read(&leaf.cert, Some(&ca.cert), None).await,
            Err(Error::OcspStatusMissing)
        ));
    }

    #[tokio::test]
    async fn read_reports_http_errors() {
        let server = MockServer::start_async().await;
        let ca = create_ca("Test CA");
        let leaf = create_cert(&ca, "Leaf", 77, None);

        server
            .mock_async(|when, then| {
                when.method(POST).path("/ocsp");
                then.status(503).body("maintenance");
            })
            .await;

        let ocsp = Ocsp::new(
            Client::new(&Default::default()).unwrap(),
            Some(server.url("/ocsp")),
        );

        match ocsp.read(&leaf.cert, Some(&ca.cert), None).await {
            Err(Error::InvalidResponse(status, text)) => {
                assert_eq!(status, 503);
                assert_eq!(text, "maintenance");
            }
            _ => panic!("expected invalid response"),
        }
    }
}
