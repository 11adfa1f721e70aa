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

mod tsl;

use std::collections::HashMap;

use log::debug;
use openssl::sha::sha256;

pub use tsl::{
    extract::{TrustServiceStatusList, TspService},
    TrustServiceList,
};

use crate::certificate::Certificate;

/// Certificates indexed by the hash of their encoded subject name.
#[derive(Debug, Default, Clone)]
pub struct CertificateStore {
    items: HashMap<[u8; 32], Vec<Certificate>>,
}

impl CertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key of a certificate with the given encoded name as subject.
    pub fn cert_key(name: &[u8]) -> [u8; 32] {
        sha256(name)
    }

    pub fn add(&mut self, cert: Certificate) {
        let key = Self::cert_key(cert.subject_raw());

        let items = self.items.entry(key).or_default();
        if !items.contains(&cert) {
            items.push(cert);
        }
    }

    pub fn len(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn certificates(&self) -> impl Iterator<Item = &Certificate> {
        self.items.values().flatten()
    }

    /// Looks up the issuer of `cert`.
    ///
    /// If several certificates share the issuer name, the one whose key
    /// verifies the signature of `cert` is preferred.
    pub fn get_issuer(&self, cert: &Certificate) -> Option<&Certificate> {
        let key = Self::cert_key(cert.issuer_raw());
        let candidates = self.items.get(&key)?;

        if candidates.len() > 1 {
            for candidate in candidates {
                match cert.is_issued_by(candidate) {
                    Ok(true) => return Some(candidate),
                    Ok(false) => (),
                    Err(err) => debug!("Unable to verify issuer candidate {}: {}", candidate, err),
                }
            }
        }

        candidates.first()
    }
}

impl Extend<Certificate> for CertificateStore {
    fn extend<T: IntoIterator<Item = Certificate>>(&mut self, iter: T) {
        for cert in iter {
            self.add(cert);
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    use crate::certificate::tests::{create_ca, create_cert};

    #[test]
    fn issuer_lookup() {
        let ca = create_ca("Test CA");
        let other = create_ca("Other CA");
        let leaf = create_cert(&ca, "Leaf", 2, None);

        let mut store = CertificateStore::new();
        store.add(other.cert.clone());
        assert!(store.get_issuer(&leaf.cert).is_none());

        store.add(ca.cert.clone());
        store.add(ca.cert.clone());
        assert_eq!(store.len(), 2);
        assert_eq!(store.get_issuer(&leaf.cert), Some(&ca.cert));
    }

    #[test]
    fn prefers_verifying_issuer() {
        let first = create_ca("Test CA");
        let second = create_ca("Test CA");
        let leaf = create_cert(&second, "Leaf", 2, None);

        let mut store = CertificateStore::new();
        store.extend(vec![first.cert.clone(), second.cert.clone()]);

        assert_eq!(store.get_issuer(&leaf.cert), Some(&second.cert));
    }
}
