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

use std::convert::TryFrom;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use der::{DecodeValue, EncodeValue, FixedTag, Header, Length, Reader, Tag, Writer};

use super::super::Error;

/* GeneralizedTime */

/// GeneralizedTime that also accepts fractional seconds.
///
/// Time stamp authorities and OCSP responders regularly send `genTime`
/// and `producedAt` with fractions, which `der::asn1::GeneralizedTime`
/// refuses. Encoding always drops the fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneralizedTime(pub DateTime<Utc>);

impl From<DateTime<Utc>> for GeneralizedTime {
    fn from(time: DateTime<Utc>) -> Self {
        Self(time)
    }
}

impl FixedTag for GeneralizedTime {
    const TAG: Tag = Tag::GeneralizedTime;
}

impl<'a> DecodeValue<'a> for GeneralizedTime {
    fn decode_value<R: Reader<'a>>(reader: &mut R, header: Header) -> der::Result<Self> {
        let value = reader.read_slice(header.length)?;
        let time = decode_generalized_time(value).map_err(|_| Self::TAG.value_error())?;

        Ok(Self(time))
    }
}

impl EncodeValue for GeneralizedTime {
    fn value_len(&self) -> der::Result<Length> {
        Length::try_from(encode_generalized_time(&self.0).len())
    }

    fn encode_value(&self, writer: &mut impl Writer) -> der::Result<()> {
        writer.write(&encode_generalized_time(&self.0))
    }
}

/// Decodes a GeneralizedTime value (`YYYYMMDDHHMMSS[.f]Z`).
pub fn decode_generalized_time(value: &[u8]) -> Result<DateTime<Utc>, Error> {
    let s = std::str::from_utf8(value)
        .map_err(|_| Error::InvalidTime("invalid GeneralizedTime".into()))?;
    if !s.ends_with('Z') {
        return Err(Error::InvalidTime(s.into()));
    }

    let time = NaiveDateTime::parse_from_str(s, "%Y%m%d%H%M%S%.fZ")
        .map_err(|err| Error::InvalidTime(format!("{}: {}", s, err)))?;

    Ok(Utc.from_utc_datetime(&time))
}

pub fn encode_generalized_time(time: &DateTime<Utc>) -> Vec<u8> {
    time.format("%Y%m%d%H%M%SZ").to_string().into_bytes()
}

/// Converts the time since the epoch used by `x509-cert` into a chrono time.
pub fn from_unix_duration(duration: Duration) -> Result<DateTime<Utc>, Error> {
    let secs = i64::try_from(duration.as_secs())
        .map_err(|_| Error::InvalidTime(format!("{:?}", duration)))?;

    Utc.timestamp_opt(secs, duration.subsec_nanos())
        .single()
        .ok_or_else(|| Error::InvalidTime(format!("{:?}", duration)))
}
