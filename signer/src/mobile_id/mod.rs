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

//! Remote signing with Mobile-ID.

mod error;
mod messages;

use std::time::Duration;

use log::{debug, info};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::{
    certificate::Certificate,
    config::MobileIdConfig,
    error::Error,
    http::{check_status, Client},
};

pub use error::MobileIdError;

use messages::{
    CertificateRequest, CertificateResponse, SessionStatus, SignatureRequest, SignatureResponse,
};

/// Characters of a session id that stay unescaped in the status URL.
const SEGMENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Client of the Mobile-ID REST service.
pub struct MobileId {
    client: Client,
    config: MobileIdConfig,
}

impl MobileId {
    pub fn new(client: Client, config: MobileIdConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &MobileIdConfig {
        &self.config
    }

    /// Fetches the signing certificate of the person.
    pub async fn read_certificate(&self, phone: &str, id: &str) -> Result<Certificate, Error> {
        let url = self.url("certificate")?;
        let body = CertificateRequest {
            relying_party_uuid: &self.config.relying_party_uuid,
            relying_party_name: &self.config.relying_party_name,
            phone_number: phone,
            national_identity_number: id,
        };

        debug!("Read Mobile-ID certificate from {}", url);

        let res = self.client.post(url)?.json(&body).send().await?;
        let res = check_status(res).await?;
        let res = res.json::<CertificateResponse>().await?;

        certificate_result(res)
    }

    /// Starts a signing session for `digest` and returns its id.
    pub async fn sign(&self, phone: &str, id: &str, digest: &[u8]) -> Result<String, Error> {
        let url = self.url("signature")?;
        let body = SignatureRequest {
            relying_party_uuid: &self.config.relying_party_uuid,
            relying_party_name: &self.config.relying_party_name,
            phone_number: phone,
            national_identity_number: id,
            hash: base64::encode(digest),
            hash_type: hash_type(digest)?,
            language: &self.config.language,
        };

        let res = self.client.post(url)?.json(&body).send().await?;
        let res = check_status(res).await?;
        let res = res.json::<SignatureResponse>().await?;

        info!(
            "Started Mobile-ID signing session {} (verification code {})",
            res.session_id,
            confirmation(digest)
        );

        Ok(res.session_id)
    }

    /// Polls the session once.
    ///
    /// The service holds the request for up to `timeout` seconds. Returns
    /// `None` if the user has not finished yet.
    pub async fn wait_for_signature(&self, session: &str, timeout: u64) -> Result<Option<Vec<u8>>, Error> {
        let url = self.session_url(session, timeout)?;

        let res = self
            .client
            .get(url)?
            .timeout(Duration::from_secs(timeout.saturating_add(5)))
            .send()
            .await?;
        let res = check_status(res).await?;
        let res = res.json::<SessionStatus>().await?;

        session_result(res)
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(Url::parse(&self.config.url)?.join(path)?)
    }

    fn session_url(&self, session: &str, timeout: u64) -> Result<Url, Error> {
        let session = utf8_percent_encode(session, SEGMENT_SET);

        let mut url = self.url(&format!("signature/session/{}", session))?;
        url.query_pairs_mut()
            .append_pair("timeoutMs", &timeout.saturating_mul(1000).to_string());

        Ok(url)
    }
}

/// Four digit verification code shown on the phone and to the user.
///
/// Made of the 6 most significant bits of the first and the 7 least
/// significant bits of the last byte of the digest.
pub fn confirmation(digest: &[u8]) -> String {
    let first = digest.first().copied().unwrap_or_default() as u32;
    let last = digest.last().copied().unwrap_or_default() as u32;

    format!("{:04}", ((first >> 2) << 7) + (last & 0x7F))
}

fn hash_type(digest: &[u8]) -> Result<&'static str, Error> {
    match digest.len() {
        32 => Ok("SHA256"),
        48 => Ok("SHA384"),
        64 => Ok("SHA512"),
        len => Err(Error::UnsupportedAlgorithm(format!("{} byte digest", len))),
    }
}

fn certificate_result(res: CertificateResponse) -> Result<Certificate, Error> {
    match (res.result.as_str(), res.cert) {
        ("OK", Some(cert)) => Certificate::from_base64(&cert),
        ("OK", None) => Err(MobileIdError::Other("OK without certificate".into()).into()),
        (code, _) => Err(MobileIdError::from_code(code).into()),
    }
}

fn session_result(res: SessionStatus) -> Result<Option<Vec<u8>>, Error> {
    if res.state == "RUNNING" {
        return Ok(None);
    }

    match (res.result.as_deref(), res.signature) {
        (Some("OK"), Some(signature)) => {
            debug!("Received Mobile-ID signature ({})", signature.algorithm);

            Ok(Some(base64::decode(signature.value.trim())?))
        }
        (Some("OK"), None) => Err(MobileIdError::Other("OK without signature".into()).into()),
        (Some(code), _) => Err(MobileIdError::from_code(code).into()),
        (None, _) => Err(MobileIdError::Other(res.state).into()),
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    use httpmock::{
        Method::{GET, POST},
        MockServer,
    };
    use serde_json::json;

    use crate::{
        certificate::{tests::create_ca, Format},
        config::HttpConfig,
    };

    fn mobile_id(server: &MockServer) -> MobileId {
        let config = MobileIdConfig {
            url: server.url("/mid-api/"),
            ..MobileIdConfig::demo()
        };

        MobileId::new(Client::new(&HttpConfig::default()).unwrap(), config)
    }

    #[test]
    fn confirmation_code() {
        let digest =
            hex::decode("78225701eab0c124a4909e28a7e3323f48c9e0de828f690763bcc57ac06de0e1").unwrap();

        assert_eq!(confirmation(&digest), "3937");
        assert_eq!(confirmation(&[0x00; 32]), "0000");
        assert_eq!(confirmation(&[0xFF; 32]), "8191");
    }

    #[test]
    fn hash_type_by_length() {
        assert_eq!(hash_type(&[0; 32]).unwrap(), "SHA256");
        assert_eq!(hash_type(&[0; 48]).unwrap(), "SHA384");
        assert_eq!(hash_type(&[0; 64]).unwrap(), "SHA512");
        assert!(matches!(hash_type(&[0; 20]), Err(Error::UnsupportedAlgorithm(_))));
    }

    #[test]
    fn request_body() {
        let config = MobileIdConfig::demo();
        let body = SignatureRequest {
            relying_party_uuid: &config.relying_party_uuid,
            relying_party_name: &config.relying_party_name,
            phone_number: "+37200000766",
            national_identity_number: "60001019906",
            hash: base64::encode([0u8; 32]),
            hash_type: "SHA256",
            language: &config.language,
        };

        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["relyingPartyUUID"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["relyingPartyName"], "DEMO");
        assert_eq!(json["phoneNumber"], "+37200000766");
        assert_eq!(json["nationalIdentityNumber"], "60001019906");
        assert_eq!(json["hashType"], "SHA256");
        assert_eq!(json["language"], "EST");
    }

    #[test]
    fn certificate_results() {
        let cert = create_ca("Mobile-ID").cert;
        let res = serde_json::from_str::<CertificateResponse>(&format!(
            r#"{{"result":"OK","cert":"{}"}}"#,
            cert.format(Format::Base64)
        ))
        .unwrap();
        assert_eq!(certificate_result(res).unwrap(), cert);

        let res = serde_json::from_str::<CertificateResponse>(r#"{"result":"NOT_FOUND"}"#).unwrap();
        assert!(matches!(
            certificate_result(res),
            Err(Error::MobileIdError(MobileIdError::NotFound))
        ));
    }

    #[test]
    fn session_states() {
        let running = serde_json::from_str::<SessionStatus>(r#"{"state":"RUNNING"}"#).unwrap();
        assert_eq!(session_result(running).unwrap(), None);

        let complete = serde_json::from_str::<SessionStatus>(
            r#"{"state":"COMPLETE","result":"OK","signature":{"algorithm":"SHA256WithECEncryption","value":"AQID"}}"#,
        )
        .unwrap();
        assert_eq!(session_result(complete).unwrap(), Some(vec![1, 2, 3]));

        let cancelled =
            serde_json::from_str::<SessionStatus>(r#"{"state":"COMPLETE","result":"USER_CANCELLED"}"#)
                .unwrap();
        match session_result(cancelled) {
            Err(Error::MobileIdError(err)) => assert_eq!(err.code(), "USER_CANCELLED"),
            _ => panic!("expected cancelled session"),
        }
    }

    #[test]
    fn service_urls() {
        let client = Client::new(&HttpConfig::default()).unwrap();
        let mobile_id = MobileId::new(client, MobileIdConfig::demo());

        assert_eq!(
            mobile_id.url("signature/session/abc").unwrap().as_str(),
            "https://tsp.demo.sk.ee/mid-api/signature/session/abc"
        );
    }

    #[test]
    fn session_urls_are_escaped() {
        let client = Client::new(&HttpConfig::default()).unwrap();
        let mobile_id = MobileId::new(client, MobileIdConfig::demo());

        assert_eq!(
            mobile_id
                .session_url("de305d54-75b4-431b-adb2-eb6b9e546014", 10)
                .unwrap()
                .as_str(),
            "https://tsp.demo.sk.ee/mid-api/signature/session/de305d54-75b4-431b-adb2-eb6b9e546014?timeoutMs=10000"
        );
        assert_eq!(
            mobile_id.session_url("../a/b?c#d", 1).unwrap().as_str(),
            "https://tsp.demo.sk.ee/mid-api/signature/session/..%2Fa%2Fb%3Fc%23d?timeoutMs=1000"
        );
        assert_eq!(
            mobile_id.session_url("x", u64::MAX).unwrap().query(),
            Some(format!("timeoutMs={}", u64::MAX).as_str())
        );
    }

    /* HTTP exchange */

    #[tokio::test]
    async fn read_certificate_posts_json() {
        let server = MockServer::start_async().await;
        let cert = create_ca("Mobile-ID").cert;

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/mid-api/certificate")
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "relyingPartyUUID": "00000000-0000-0000-0000-000000000000",
                        "relyingPartyName": "DEMO",
                        "phoneNumber": "+37200000766",
                        "nationalIdentityNumber": "60001019906",
                    }));
                then.status(200).json_body(json!({
                    "result": "OK",
                    "cert": cert.format(Format::Base64),
                }));
            })
            .await;

        let res = mobile_id(&server)
            .read_certificate("+37200000766", "60001019906")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(res, cert);
    }

    #[tokio::test]
    async fn read_certificate_reports_service_result() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(POST).path("/mid-api/certificate");
                then.status(200).json_body(json!({ "result": "NOT_FOUND" }));
            })
            .await;

        assert!(matches!(
            mobile_id(&server).read_certificate("+37200000766", "60001019906").await,
            Err(Error::MobileIdError(MobileIdError::NotFound))
        ));
    }

    #[tokio::test]
    async fn sign_posts_digest() {
        let server = MockServer::start_async().await;
        let digest = [0x11u8; 32];

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/mid-api/signature")
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "relyingPartyUUID": "00000000-0000-0000-0000-000000000000",
                        "relyingPartyName": "DEMO",
                        "phoneNumber": "+37200000766",
                        "nationalIdentityNumber": "60001019906",
                        "hash": base64::encode(digest),
                        "hashType": "SHA256",
                        "language": "EST",
                    }));
                then.status(200)
                    .json_body(json!({ "sessionID": "de305d54-75b4-431b-adb2-eb6b9e546014" }));
            })
            .await;

        let session = mobile_id(&server)
            .sign("+37200000766", "60001019906", &digest)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(session, "de305d54-75b4-431b-adb2-eb6b9e546014");
    }

    #[tokio::test]
    async fn wait_for_signature_polls_session() {
        let server = MockServer::start_async().await;

        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/mid-api/signature/session/de305d54-75b4")
                    .query_param("timeoutMs", "5000");
                then.status(200).json_body(json!({
                    "state": "COMPLETE",
                    "result": "OK",
                    "signature": { "algorithm": "SHA256WithECEncryption", "value": "AQID" },
                }));
            })
            .await;

        let signature = mobile_id(&server).wait_for_signature("de305d54-75b4", 5).await.unwrap();

        mock.assert_async().await;
        assert_eq!(signature, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn wait_for_signature_reports_http_errors() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/mid-api/signature/session/abc");
                then.status(400).body("bad session");
            })
            .await;

        assert!(matches!(
            mobile_id(&server).wait_for_signature("abc", 1).await,
            Err(Error::InvalidResponse(_, _))
        ));
    }
}
