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

use crate::{asn1::ObjectIdentifier, error::Error};

/// Known algorithm names and their object identifiers.
const ALGORITHMS: &[(&str, ObjectIdentifier)] = &[
    ("sha1", ObjectIdentifier::new_unwrap("1.3.14.3.2.26")),
    ("sha256", ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1")),
    ("sha384", ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.2")),
    ("sha512", ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.3")),
    ("rsa", ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1")),
    ("rsa-sha1", ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.5")),
    ("rsa-sha256", ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11")),
    ("rsa-sha384", ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12")),
    ("rsa-sha512", ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.13")),
    ("ecdsa", ObjectIdentifier::new_unwrap("1.2.840.10045.2.1")),
    ("ecdsa-sha1", ObjectIdentifier::new_unwrap("1.2.840.10045.4.1")),
    ("ecdsa-sha256", ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2")),
    ("ecdsa-sha384", ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.3")),
    ("ecdsa-sha512", ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.4")),
    ("dsa", ObjectIdentifier::new_unwrap("1.2.840.10040.4.1")),
    ("dsa-sha1", ObjectIdentifier::new_unwrap("1.2.840.10040.4.3")),
    ("dsa-sha256", ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.3.2")),
];

pub fn names() -> impl Iterator<Item = &'static str> {
    ALGORITHMS.iter().map(|(name, _)| *name)
}

pub fn name_to_oid(name: &str) -> Result<ObjectIdentifier, Error> {
    let (_, oid) = ALGORITHMS
        .iter()
        .find(|(n, _)| *n == name)
        .ok_or_else(|| Error::UnsupportedAlgorithm(name.into()))?;

    Ok(*oid)
}

pub fn oid_to_name(oid: &ObjectIdentifier) -> Result<&'static str, Error> {
    ALGORITHMS
        .iter()
        .find(|(_, o)| oid == o)
        .map(|(name, _)| *name)
        .ok_or_else(|| Error::UnsupportedAlgorithm(oid.to_string()))
}
