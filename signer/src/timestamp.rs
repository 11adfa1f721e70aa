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
use log::{info, warn};
use openssl::rand::rand_bytes;
use thiserror::Error;

use crate::{
    algorithm::name_to_oid,
    asn1::{
        tsp::{
            signed_data_content, MessageImprint, PkiStatusInfo, TimeStampReq, TimeStampResp,
            TstInfo, OID_SIGNED_DATA, OID_TST_INFO,
        },
        x509::algorithm_with_null,
        Decode, Encode, Int, OctetString,
    },
    error::Error,
    http::Client,
    xades::ToBuffer,
};

/* TimestampError */

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("Timestamp request was not granted ({status}): {message}!")]
    Rejected { status: u32, message: String },

    #[error("Unexpected content type of the timestamp token: {0}!")]
    ContentType(String),

    #[error("Timestamp response does not contain a token!")]
    MissingToken,

    #[error("Message imprint of the timestamp token does not match the request!")]
    ImprintMismatch,

    #[error("Timestamp nonce does not match the request!")]
    NonceMismatch,
}

/* TimestampRequest */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampRequest {
    request: TimeStampReq,
}

impl TimestampRequest {
    /// Request for a token over `digest`, computed with the hash `algorithm`.
    pub fn new(digest: &[u8], algorithm: &str) -> Result<Self, Error> {
        let message_imprint = MessageImprint {
            hash_algorithm: algorithm_with_null(name_to_oid(algorithm)?)?,
            hashed_message: OctetString::new(digest)?,
        };

        Ok(Self {
            request: TimeStampReq::new(message_imprint),
        })
    }

    /// Sets the nonce, given as the content octets of a DER INTEGER.
    pub fn with_nonce(mut self, nonce: &[u8]) -> Result<Self, Error> {
        self.request.nonce = Some(Int::new(nonce)?);

        Ok(self)
    }

    pub fn message_imprint(&self) -> &MessageImprint {
        &self.request.message_imprint
    }

    pub fn nonce(&self) -> Option<&[u8]> {
        self.request.nonce.as_ref().map(Int::as_bytes)
    }

    pub fn to_der(&self) -> Result<Vec<u8>, Error> {
        Ok(self.request.to_der()?)
    }
}

/* TimestampResponse */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampResponse {
    raw: Vec<u8>,
    status: PkiStatusInfo,
    token: Option<Vec<u8>>,
    info: Option<TstInfo>,
}

impl TimestampResponse {
    /// Parses a DER encoded `TimeStampResp`.
    ///
    /// A token that is not a `SignedData` carrying a `TSTInfo` is rejected.
    pub fn parse(der: &[u8]) -> Result<Self, Error> {
        let response = TimeStampResp::from_der(der)?;

        let (token, info) = match &response.time_stamp_token {
            Some(token) => {
                if token.content_type != OID_SIGNED_DATA {
                    return Err(TimestampError::ContentType(token.content_type.to_string()).into());
                }

                let (content_type, content) = signed_data_content(token)?;
                if content_type != OID_TST_INFO {
                    return Err(TimestampError::ContentType(content_type.to_string()).into());
                }

                let content = content.ok_or(TimestampError::MissingToken)?;

                (Some(token.to_der()?), Some(TstInfo::from_der(&content)?))
            }
            None => (None, None),
        };

        Ok(Self {
            raw: der.to_vec(),
            status: response.status,
            token,
            info,
        })
    }

    pub fn status(&self) -> u32 {
        self.status.status
    }

    pub fn status_name(&self) -> &'static str {
        match self.status.status {
            0 => "granted",
            1 => "grantedWithMods",
            2 => "rejection",
            3 => "waiting",
            4 => "revocationWarning",
            5 => "revocationNotification",
            _ => "unknown",
        }
    }

    /// Free text sent by the authority, or the name of the status.
    pub fn message(&self) -> String {
        match &self.status.status_string {
            Some(strings) if !strings.is_empty() => strings.join("; "),
            _ => self.status_name().into(),
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self.status.status, 0 | 1)
    }

    pub fn info(&self) -> Option<&TstInfo> {
        self.info.as_ref()
    }

    pub fn gen_time(&self) -> Option<DateTime<Utc>> {
        self.info.as_ref().map(|info| info.gen_time.0)
    }

    /// Encoding of the time stamp token (`ContentInfo`).
    pub fn token(&self) -> Option<&[u8]> {
        self.token.as_deref()
    }

    /// Encoding of the whole response.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Checks the response against the request it answers.
    pub fn verify(&self, request: &TimestampRequest) -> Result<(), Error> {
        if !self.is_granted() {
            return Err(TimestampError::Rejected {
                status: self.status(),
                message: self.message(),
            }
            .into());
        }

        let info = self.info.as_ref().ok_or(TimestampError::MissingToken)?;
        if info.message_imprint != *request.message_imprint() {
            return Err(TimestampError::ImprintMismatch.into());
        }

        match (request.nonce(), info.nonce.as_ref().map(Int::as_bytes)) {
            (Some(expected), Some(actual)) if expected != actual => {
                return Err(TimestampError::NonceMismatch.into())
            }
            (Some(_), None) => warn!("Timestamp authority did not echo the nonce"),
            (_, _) => (),
        }

        Ok(())
    }
}

/// Embeds the time stamp token. Responses without a token give an empty
/// buffer, which [`XadesSignature::set_timestamp`](crate::XadesSignature::set_timestamp)
/// refuses.
impl ToBuffer for TimestampResponse {
    fn to_buffer(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.token().unwrap_or_default())
    }
}

/* Timestamp */

/// RFC 3161 time stamp client.
pub struct Timestamp {
    client: Client,
    url: String,
}

impl Timestamp {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }

    pub async fn send(&self, request: &TimestampRequest) -> Result<Vec<u8>, Error> {
        self.client
            .post_der(
                &self.url,
                "application/timestamp-query",
                "application/timestamp-reply",
                request.to_der()?,
            )
            .await
    }

    /// Requests a token over `digest` and checks the answer.
    pub async fn read(&self, digest: &[u8], algorithm: &str) -> Result<TimestampResponse, Error> {
        let request = TimestampRequest::new(digest, algorithm)?.with_nonce(&random_nonce()?)?;

        let response = self.send(&request).await?;
        let response = TimestampResponse::parse(&response)?;
        response.verify(&request)?;

        info!(
            "Received timestamp from {} ({})",
            self.url,
            response
                .gen_time()
                .map(|time| time.to_rfc3339())
                .unwrap_or_default()
        );

        Ok(response)
    }
}

/// Positive 64 bit INTEGER content without leading zero octets.
fn random_nonce() -> Result<Vec<u8>, Error> {
    let mut nonce = vec![0u8; 8];
    rand_bytes(&mut nonce)?;
    nonce[0] = (nonce[0] & 0x7F) | 0x01;

    Ok(nonce)
}

#[cfg(test)]
pub mod tests {
    use super::*;

    use chrono::TimeZone;
    use httpmock::{Method::POST, MockServer};

    use crate::{
        asn1::{tsp::tests::signed_data_token, ObjectIdentifier},
        certificate::tests::create_ca,
        xades::{SignableFile, XadesSignature},
    };

    fn tst_info(digest: &[u8], nonce: Option<&[u8]>) -> TstInfo {
        TstInfo {
            version: 1,
            policy: ObjectIdentifier::new_unwrap("1.3.6.1.4.1.10015.0"),
            message_imprint: TimestampRequest::new(digest, "sha256")
                .unwrap()
                .message_imprint()
                .clone(),
            serial_number: Int::new(&[0x2A]).unwrap(),
            gen_time: Utc.with_ymd_and_hms(2021, 5, 6, 7, 8, 9).unwrap().into(),
            accuracy: None,
            ordering: false,
            nonce: nonce.map(|nonce| Int::new(nonce).unwrap()),
            tsa: None,
            extensions: None,
        }
    }

    pub fn create_response(status: u32, content_type: ObjectIdentifier, info: Option<&TstInfo>) -> Vec<u8> {
        let token = info.map(|info| {
            signed_data_token(content_type, OID_TST_INFO, &info.to_der().unwrap())
        });

        TimeStampResp {
            status: PkiStatusInfo {
                status,
                status_string: None,
                fail_info: None,
            },
            time_stamp_token: token,
        }
        .to_der()
        .unwrap()
    }

    #[test]
    fn request_fields() {
        let request = TimestampRequest::new(&[7; 32], "sha256")
            .unwrap()
            .with_nonce(&[0x01, 0x02])
            .unwrap();

        let decoded = TimeStampReq::from_der(&request.to_der().unwrap()).unwrap();

        assert!(decoded.cert_req);
        assert_eq!(decoded.nonce.as_ref().map(Int::as_bytes), Some(&[0x01, 0x02][..]));
        assert_eq!(
            decoded.message_imprint.hash_algorithm.oid,
            ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1")
        );
        assert_eq!(decoded.message_imprint.hashed_message.as_bytes(), &[7; 32]);
    }

    #[test]
    fn unknown_digest_algorithm() {
        assert!(matches!(
            TimestampRequest::new(&[7; 32], "md5"),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn granted_response() {
        let info = tst_info(&[7; 32], Some(&[0x01, 0x02]));
        let der = create_response(0, OID_SIGNED_DATA, Some(&info));

        let response = TimestampResponse::parse(&der).unwrap();

        assert!(response.is_granted());
        assert_eq!(response.message(), "granted");
        assert_eq!(response.info(), Some(&info));
        assert_eq!(response.raw(), der.as_slice());
        assert_eq!(response.gen_time(), Some(Utc.with_ymd_and_hms(2021, 5, 6, 7, 8, 9).unwrap()));
        assert!(der.ends_with(&response.to_buffer()));

        let request = TimestampRequest::new(&[7; 32], "sha256")
            .unwrap()
            .with_nonce(&[0x01, 0x02])
            .unwrap();
        response.verify(&request).unwrap();

        let other = TimestampRequest::new(&[8; 32], "sha256").unwrap();
        assert!(matches!(
            response.verify(&other),
            Err(Error::TimestampError(TimestampError::ImprintMismatch))
        ));

        let other = TimestampRequest::new(&[7; 32], "sha256")
            .unwrap()
            .with_nonce(&[0x03])
            .unwrap();
        assert!(matches!(
            response.verify(&other),
            Err(Error::TimestampError(TimestampError::NonceMismatch))
        ));
    }

    #[test]
    fn content_type_mismatch() {
        let info = tst_info(&[7; 32], None);
        let der = create_response(0, ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.1"), Some(&info));

        assert!(matches!(
            TimestampResponse::parse(&der),
            Err(Error::TimestampError(TimestampError::ContentType(_)))
        ));
    }

    #[test]
    fn rejected_response() {
        let der = create_response(2, OID_SIGNED_DATA, None);

        let response = TimestampResponse::parse(&der).unwrap();
        let request = TimestampRequest::new(&[7; 32], "sha256").unwrap();

        assert!(!response.is_granted());
        assert!(response.token().is_none());
        match response.verify(&request) {
            Err(Error::TimestampError(TimestampError::Rejected { status, message })) => {
                assert_eq!(status, 2);
                assert_eq!(message, "rejection");
            }
            _ => panic!("expected rejected timestamp"),
        }
    }

    #[test]
    fn rejected_response_is_not_embedded() {
        let der = create_response(2, OID_SIGNED_DATA, None);
        let response = TimestampResponse::parse(&der).unwrap();

        let files = vec![SignableFile::new("test.txt", "text/plain", b"Hello").unwrap()];
        let mut signature = XadesSignature::new(create_ca("Signer").cert, files).unwrap();
        signature.set_signature(&[1, 2, 3]).unwrap();

        assert!(matches!(
            signature.set_timestamp(&response),
            Err(Error::TimestampError(TimestampError::MissingToken))
        ));
        assert!(signature.timestamp().is_none());
    }

    #[test]
    fn nonce_is_positive() {
        for _ in 0..16 {
            let nonce = random_nonce().unwrap();

            assert_eq!(nonce.len(), 8);
            assert!(nonce[0] > 0 && nonce[0] < 0x80);
        }
    }

    /* HTTP exchange */

    fn request_len() -> usize {
        TimestampRequest::new(&[7; 32], "sha256")
            .unwrap()
            .with_nonce(&[0x01; 8])
            .unwrap()
            .to_der()
            .unwrap()
            .len()
    }

    #[tokio::test]
    async fn read_posts_timestamp_query() {
        let server = MockServer::start_async().await;
        let body = create_response(0, OID_SIGNED_DATA, Some(&tst_info(&[7; 32], None)));

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/tsa")
                    .header("content-type", "application/timestamp-query")
                    .header("accept", "application/timestamp-reply")
                    .header("content-length", request_len().to_string());
                then.status(200)
                    .header("content-type", "application/timestamp-reply")
                    .body(&body);
            })
            .await;

        let timestamp = Timestamp::new(Client::new(&Default::default()).unwrap(), server.url("/tsa"));
        let response = timestamp.read(&[7; 32], "sha256").await.unwrap();

        mock.assert_async().await;
        assert!(response.is_granted());
        assert_eq!(response.raw(), body.as_slice());
    }

    #[tokio::test]
    async fn read_rejects_foreign_nonce() {
        let server = MockServer::start_async().await;
        let body = create_response(0, OID_SIGNED_DATA, Some(&tst_info(&[7; 32], Some(&[0x80, 0x00]))));

        server
            .mock_async(|when, then| {
                when.method(POST).path("/tsa");
                then.status(200).body(&body);
            })
            .await;

        let timestamp = Timestamp::new(Client::new(&Default::default()).unwrap(), server.url("/tsa"));

        assert!(matches!(
            timestamp.read(&[7; 32], "sha256").await,
            Err(Error::TimestampError(TimestampError::NonceMismatch))
        ));
    }

    #[tokio::test]
    async fn read_rejects_rejection() {
        let server = MockServer::start_async().await;
        let body = create_response(2, OID_SIGNED_DATA, None);

        server
            .mock_async(|when, then| {
                when.method(POST).path("/tsa");
                then.status(200).body(&body);
            })
            .await;

        let timestamp = Timestamp::new(Client::new(&Default::default()).unwrap(), server.url("/tsa"));

        assert!(matches!(
            timestamp.read(&[7; 32], "sha256").await,
            Err(Error::TimestampError(TimestampError::Rejected { status: 2, .. }))
        ));
    }
}
