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

use der::{Any, Encode, Tag, Tagged};
use x509_cert::attr::AttributeTypeAndValue;

use super::ObjectIdentifier;

/// Short name of a directory attribute type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeType {
    pub oid: ObjectIdentifier,
    pub name: &'static str,
}

pub const DEFAULT_ATTRIBUTES: &[AttributeType] = &[
    AttributeType { oid: ObjectIdentifier::new_unwrap("2.5.4.3"), name: "CN" },
    AttributeType { oid: ObjectIdentifier::new_unwrap("2.5.4.4"), name: "SN" },
    AttributeType { oid: ObjectIdentifier::new_unwrap("2.5.4.5"), name: "SERIALNUMBER" },
    AttributeType { oid: ObjectIdentifier::new_unwrap("2.5.4.6"), name: "C" },
    AttributeType { oid: ObjectIdentifier::new_unwrap("2.5.4.7"), name: "L" },
    AttributeType { oid: ObjectIdentifier::new_unwrap("2.5.4.8"), name: "ST" },
    AttributeType { oid: ObjectIdentifier::new_unwrap("2.5.4.9"), name: "STREET" },
    AttributeType { oid: ObjectIdentifier::new_unwrap("2.5.4.10"), name: "O" },
    AttributeType { oid: ObjectIdentifier::new_unwrap("2.5.4.11"), name: "OU" },
    AttributeType { oid: ObjectIdentifier::new_unwrap("2.5.4.12"), name: "T" },
    AttributeType { oid: ObjectIdentifier::new_unwrap("2.5.4.42"), name: "GN" },
    AttributeType { oid: ObjectIdentifier::new_unwrap("2.5.4.43"), name: "initials" },
    AttributeType { oid: ObjectIdentifier::new_unwrap("2.5.4.44"), name: "generationQualifier" },
    AttributeType { oid: ObjectIdentifier::new_unwrap("2.5.4.46"), name: "dnQualifier" },
    AttributeType { oid: ObjectIdentifier::new_unwrap("2.5.4.65"), name: "pseudonym" },
    AttributeType { oid: ObjectIdentifier::new_unwrap("2.5.4.97"), name: "organizationIdentifier" },
    AttributeType { oid: ObjectIdentifier::new_unwrap("0.9.2342.19200300.100.1.1"), name: "UID" },
    AttributeType { oid: ObjectIdentifier::new_unwrap("0.9.2342.19200300.100.1.25"), name: "DC" },
    AttributeType { oid: ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1"), name: "emailAddress" },
];

/// Lookup table from attribute type OIDs to their short names.
#[derive(Debug, Clone)]
pub struct AttributeTable(Cow<'static, [AttributeType]>);

impl AttributeTable {
    pub fn new(attributes: Vec<AttributeType>) -> Self {
        Self(Cow::Owned(attributes))
    }

    pub fn name(&self, oid: &ObjectIdentifier) -> Option<&'static str> {
        self.0.iter().find(|a| *oid == a.oid).map(|a| a.name)
    }

    pub fn oid(&self, name: &str) -> Option<ObjectIdentifier> {
        self.0
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.oid)
    }

    /// Distinguished name following RFC 4514: RDNs in encoded order,
    /// separated by `,` with multi valued RDNs joined by `+`.
    pub fn rfc4514(&self, rdns: &[Vec<AttributeTypeAndValue>]) -> String {
        self.format(rdns, ",", "+", true)
    }

    /// Human readable form of a distinguished name.
    pub fn readable(&self, rdns: &[Vec<AttributeTypeAndValue>]) -> String {
        self.format(rdns, ", ", " + ", false)
    }

    fn format(
        &self,
        rdns: &[Vec<AttributeTypeAndValue>],
        rdn_sep: &str,
        attrib_sep: &str,
        escape: bool,
    ) -> String {
        rdns.iter()
            .map(|rdn| {
                rdn.iter()
                    .map(|attrib| self.format_attribute(attrib, escape))
                    .collect::<Vec<_>>()
                    .join(attrib_sep)
            })
            .collect::<Vec<_>>()
            .join(rdn_sep)
    }

    fn format_attribute(&self, attrib: &AttributeTypeAndValue, escape: bool) -> String {
        let name = self.name(&attrib.oid);
        let value = match (name, decode_directory_string(&attrib.value)) {
            (Some(_), Some(value)) if escape => escape_value(&value),
            (Some(_), Some(value)) => value,
            (_, _) => format!("#{}", hex::encode(attrib.value.to_der().unwrap_or_default())),
        };

        match name {
            Some(name) => format!("{}={}", name, value),
            None => format!("{}={}", attrib.oid, value),
        }
    }
}

impl Default for AttributeTable {
    fn default() -> Self {
        Self(Cow::Borrowed(DEFAULT_ATTRIBUTES))
    }
}

/// Decodes the directory string syntaxes found in distinguished names.
pub fn decode_directory_string(value: &Any) -> Option<String> {
    let bytes = value.value();

    match value.tag() {
        Tag::Utf8String
        | Tag::PrintableString
        | Tag::Ia5String
        | Tag::NumericString
        | Tag::VisibleString => String::from_utf8(bytes.to_vec()).ok(),
        Tag::TeletexString => Some(bytes.iter().map(|b| *b as char).collect()),
        Tag::BmpString => {
            if bytes.len() % 2 != 0 {
                return None;
            }

            let units = bytes
                .chunks(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect::<Vec<_>>();

            String::from_utf16(&units).ok()
        }
        _ => None,
    }
}

/// Escapes an attribute value as described in RFC 4514 section 2.4.
pub fn escape_value(value: &str) -> String {
    let mut ret = String::with_capacity(value.len());
    let last = value.chars().count().saturating_sub(1);

    for (i, c) in value.chars().enumerate() {
        match c {
            ' ' if i == 0 || i == last => ret.push_str("\\ "),
            '#' if i == 0 => ret.push_str("\\#"),
            '\0' => ret.push_str("\\00"),
            '"' | '+' | ',' | ';' | '<' | '>' | '\\' => {
                ret.push('\\');
                ret.push(c);
            }
            c => ret.push(c),
        }
    }

    ret
}
