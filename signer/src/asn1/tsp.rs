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

use cms::{content_info::ContentInfo, signed_data::EncapsulatedContentInfo};
use der::{
    asn1::{BitString, Int, OctetString},
    Any, Decode, DecodeValue, Encode, FixedTag, Header, Reader, Sequence, Tag,
};
use spki::{AlgorithmIdentifierOwned, ObjectIdentifier};
use x509_cert::ext::{pkix::name::GeneralName, Extensions};

use super::{types::GeneralizedTime, Error};

pub const OID_SIGNED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");
pub const OID_TST_INFO: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.1.4");

/* MessageImprint */

#[derive(Debug, Clone, PartialEq, Eq, Sequence)]
pub struct MessageImprint {
    pub hash_algorithm: AlgorithmIdentifierOwned,
    pub hashed_message: OctetString,
}

/* TimeStampReq */

#[derive(Debug, Clone, PartialEq, Eq, Sequence)]
pub struct TimeStampReq {
    pub version: u8,
    pub message_imprint: MessageImprint,

    #[asn1(optional = "true")]
    pub req_policy: Option<ObjectIdentifier>,

    #[asn1(optional = "true")]
    pub nonce: Option<Int>,

    #[asn1(default = "Default::default")]
    pub cert_req: bool,

    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", optional = "true")]
    pub extensions: Option<Extensions>,
}

impl TimeStampReq {
    pub fn new(message_imprint: MessageImprint) -> Self {
        Self {
            version: 1,
            message_imprint,
            req_policy: None,
            nonce: None,
            cert_req: true,
            extensions: None,
        }
    }
}

/* TimeStampResp */

#[derive(Debug, Clone, PartialEq, Eq, Sequence)]
pub struct PkiStatusInfo {
    pub status: u32,

    #[asn1(optional = "true")]
    pub status_string: Option<Vec<String>>,

    #[asn1(optional = "true")]
    pub fail_info: Option<BitString>,
}

#[derive(Debug, Clone, PartialEq, Eq, Sequence)]
pub struct TimeStampResp {
    pub status: PkiStatusInfo,

    #[asn1(optional = "true")]
    pub time_stamp_token: Option<ContentInfo>,
}

/* TSTInfo */

#[derive(Debug, Clone, PartialEq, Eq, Sequence)]
pub struct TstInfo {
    pub version: u8,
    pub policy: ObjectIdentifier,
    pub message_imprint: MessageImprint,
    pub serial_number: Int,
    pub gen_time: GeneralizedTime,

    #[asn1(optional = "true")]
    pub accuracy: Option<Accuracy>,

    #[asn1(default = "Default::default")]
    pub ordering: bool,

    #[asn1(optional = "true")]
    pub nonce: Option<Int>,

    #[asn1(context_specific = "0", optional = "true")]
    pub tsa: Option<GeneralName>,

    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", optional = "true")]
    pub extensions: Option<Extensions>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Sequence)]
pub struct Accuracy {
    #[asn1(optional = "true")]
    pub seconds: Option<u64>,

    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", optional = "true")]
    pub millis: Option<u16>,

    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", optional = "true")]
    pub micros: Option<u16>,
}

/* SignedData */

/// Encapsulated content of a `SignedData`.
///
/// Certificates and signer infos of time stamp tokens are not needed here
/// and are skipped without decoding, so tokens with unsorted sets are still
/// accepted.
struct SignedDataContent(EncapsulatedContentInfo);

impl FixedTag for SignedDataContent {
    const TAG: Tag = Tag::Sequence;
}

impl<'a> DecodeValue<'a> for SignedDataContent {
    fn decode_value<R: Reader<'a>>(reader: &mut R, header: Header) -> der::Result<Self> {
        reader.read_nested(header.length, |reader| {
            let _version: u8 = reader.decode()?;
            let _digest_algorithms: Any = reader.decode()?;
            let content: EncapsulatedContentInfo = reader.decode()?;
            while !reader.is_finished() {
                let _: Any = reader.decode()?;
            }

            Ok(Self(content))
        })
    }
}

/// Encapsulated content type and content of the `SignedData` inside `token`.
pub fn signed_data_content(token: &ContentInfo) -> Result<(ObjectIdentifier, Option<Vec<u8>>), Error> {
    let signed_data = SignedDataContent::from_der(&token.content.to_der()?)?;
    let encap = signed_data.0;

    let content = match encap.econtent {
        Some(econtent) => Some(OctetString::from_der(&econtent.to_der()?)?.as_bytes().to_vec()),
        None => None,
    };

    Ok((encap.econtent_type, content))
}

#[cfg(test)]
pub mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};
    use cms::{
        content_info::CmsVersion,
        signed_data::{SignedData, SignerInfos},
    };
    use der::asn1::SetOfVec;

    use super::super::x509::algorithm_with_null;

    fn imprint() -> MessageImprint {
        MessageImprint {
            hash_algorithm: algorithm_with_null(ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1"))
                .unwrap(),
            hashed_message: OctetString::new(vec![0x42; 32]).unwrap(),
        }
    }

    /// `ContentInfo` with a `SignedData` carrying `content`, without signer infos.
    pub fn signed_data_token(
        content_type: ObjectIdentifier,
        econtent_type: ObjectIdentifier,
        content: &[u8],
    ) -> ContentInfo {
        let econtent = OctetString::new(content).unwrap().to_der().unwrap();
        let signed_data = SignedData {
            version: CmsVersion::V3,
            digest_algorithms: SetOfVec::new(),
            encap_content_info: EncapsulatedContentInfo {
                econtent_type,
                econtent: Some(Any::from_der(&econtent).unwrap()),
            },
            certificates: None,
            crls: None,
            signer_infos: SignerInfos(SetOfVec::new()),
        };

        ContentInfo {
            content_type,
            content: Any::from_der(&signed_data.to_der().unwrap()).unwrap(),
        }
    }

    #[test]
    fn request_encoding() {
        let mut request = TimeStampReq::new(imprint());
        request.nonce = Some(Int::new(&[0x01, 0x02]).unwrap());

        let der = request.to_der().unwrap();

        assert_eq!(&der[2..5], &[0x02, 0x01, 0x01]);
        assert_eq!(&der[der.len() - 3..], &[0x01, 0x01, 0xFF]);
        assert_eq!(TimeStampReq::from_der(&der).unwrap(), request);
    }

    #[test]
    fn response_with_token() {
        let tst_info = TstInfo {
            version: 1,
            policy: ObjectIdentifier::new_unwrap("1.2.3.4"),
            message_imprint: imprint(),
            serial_number: Int::new(&[0x05]).unwrap(),
            gen_time: Utc.with_ymd_and_hms(2021, 5, 6, 7, 8, 9).unwrap().into(),
            accuracy: Some(Accuracy {
                seconds: Some(1),
                millis: None,
                micros: None,
            }),
            ordering: false,
            nonce: Some(Int::new(&[0x07]).unwrap()),
            tsa: None,
            extensions: None,
        };
        let token = signed_data_token(OID_SIGNED_DATA, OID_TST_INFO, &tst_info.to_der().unwrap());

        let response = TimeStampResp {
            status: PkiStatusInfo {
                status: 0,
                status_string: Some(vec!["Operation Okay".into()]),
                fail_info: None,
            },
            time_stamp_token: Some(token),
        };

        let decoded = TimeStampResp::from_der(&response.to_der().unwrap()).unwrap();
        assert_eq!(decoded, response);

        let token = decoded.time_stamp_token.unwrap();
        let (content_type, content) = signed_data_content(&token).unwrap();
        assert_eq!(content_type, OID_TST_INFO);
        assert_eq!(TstInfo::from_der(&content.unwrap()).unwrap(), tst_info);
    }

    #[test]
    fn rejection_without_token() {
        let der = hex::decode("3003020102").unwrap();
        let response = TimeStampResp::from_der(&hex::decode("30053003020102").unwrap()).unwrap();

        assert_eq!(response.status.status, 2);
        assert!(response.time_stamp_token.is_none());
        assert_eq!(PkiStatusInfo::from_der(&der).unwrap(), response.status);
    }
}
