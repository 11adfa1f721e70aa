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

use base64::{decode, encode};
use regex::Regex;

use crate::asn1::Error;

/// Returns `true` if `data` looks like a PEM document.
pub fn is_pem(data: &[u8]) -> bool {
    let data = match data.iter().position(|b| !b.is_ascii_whitespace()) {
        Some(pos) => &data[pos..],
        None => return false,
    };

    data.starts_with(b"-----BEGIN")
}

/// Decodes the first PEM block and returns its label and content.
pub fn unwrap(pem: &str) -> Result<(String, Vec<u8>), Error> {
    lazy_static! {
        static ref RX: Regex = Regex::new(
            r"(?s)-----BEGIN ([A-Z0-9 ]+)-----(.*?)-----END ([A-Z0-9 ]+)-----"
        )
        .unwrap();
    }

    let caps = RX
        .captures(pem)
        .ok_or_else(|| Error::InvalidPem("missing BEGIN/END markers".into()))?;

    let label = &caps[1];
    if label != &caps[3] {
        return Err(Error::InvalidPem(format!(
            "BEGIN {} does not match END {}",
            label, &caps[3]
        )));
    }

    let body = caps[2]
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect::<String>();
    let data = decode(&body).map_err(|err| Error::InvalidPem(err.to_string()))?;

    Ok((label.into(), data))
}

/// Wraps `data` into a PEM block with the given label.
pub fn wrap(label: &str, data: &[u8]) -> String {
    format!(
        "-----BEGIN {}-----\n{}\n-----END {}-----\n",
        label,
        encode(data),
        label
    )
}
