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

use std::io::{Result as IoResult, Write};

use openssl::hash::{hash, Hasher as SslHasher, MessageDigest};

use crate::Error;

/* HashMethod */

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HashMethod {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashMethod {
    pub fn uri(&self) -> &'static str {
        match self {
            HashMethod::Sha1 => "http://www.w3.org/2000/09/xmldsig#sha1",
            HashMethod::Sha256 => "http://www.w3.org/2001/04/xmlenc#sha256",
            HashMethod::Sha384 => "http://www.w3.org/2001/04/xmldsig-more#sha384",
            HashMethod::Sha512 => "http://www.w3.org/2001/04/xmlenc#sha512",
        }
    }

    pub fn from_uri(uri: &str) -> Result<Self, Error> {
        match uri {
            "http://www.w3.org/2000/09/xmldsig#sha1" => Ok(HashMethod::Sha1),
            "http://www.w3.org/2001/04/xmlenc#sha256" => Ok(HashMethod::Sha256),
            "http://www.w3.org/2001/04/xmldsig-more#sha384" => Ok(HashMethod::Sha384),
            "http://www.w3.org/2001/04/xmlenc#sha512" => Ok(HashMethod::Sha512),
            uri => Err(Error::UnknownDigestMethod(uri.into())),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            HashMethod::Sha1 => 20,
            HashMethod::Sha256 => 32,
            HashMethod::Sha384 => 48,
            HashMethod::Sha512 => 64,
        }
    }

    pub fn digest(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(hash((*self).into(), data)?.to_vec())
    }
}

impl From<HashMethod> for MessageDigest {
    fn from(method: HashMethod) -> MessageDigest {
        match method {
            HashMethod::Sha1 => MessageDigest::sha1(),
            HashMethod::Sha256 => MessageDigest::sha256(),
            HashMethod::Sha384 => MessageDigest::sha384(),
            HashMethod::Sha512 => MessageDigest::sha512(),
        }
    }
}

/* Hasher */

/// Incremental digest over chunked input.
///
/// Implements `Write`, so `std::io::copy` can feed it from any reader.
pub struct Hasher {
    method: HashMethod,
    hasher: SslHasher,
}

impl Hasher {
    pub fn new(method: HashMethod) -> Result<Self, Error> {
        let hasher = SslHasher::new(method.into())?;

        Ok(Self { method, hasher })
    }

    pub fn method(&self) -> HashMethod {
        self.method
    }

    pub fn update(&mut self, data: &[u8]) -> Result<(), Error> {
        self.hasher.update(data)?;

        Ok(())
    }

    pub fn finish(mut self) -> Result<Vec<u8>, Error> {
        let digest = self.hasher.finish()?;

        Ok(digest.to_vec())
    }
}

impl Write for Hasher {
    fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
        self.hasher.write(buf)
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    use std::io::{copy, Cursor};

    #[test]
    fn incremental_matches_one_shot() {
        let data = b"The quick brown fox jumps over the lazy dog";

        let mut hasher = Hasher::new(HashMethod::Sha256).unwrap();
        hasher.update(&data[..10]).unwrap();
        hasher.update(&data[10..]).unwrap();
        let actual = hasher.finish().unwrap();

        let expected = HashMethod::Sha256.digest(data).unwrap();

        assert_eq!(actual, expected);
        assert_eq!(
            base64::encode(&actual),
            "16j7swfXgJRpypq8sAguT41WUeRtPNt2LQLQvzfJ5ZI="
        );
    }

    #[test]
    fn hasher_consumes_readers() {
        let mut hasher = Hasher::new(HashMethod::Sha1).unwrap();
        copy(&mut Cursor::new(b"abc".to_vec()), &mut hasher).unwrap();

        assert_eq!(
            base64::encode(hasher.finish().unwrap()),
            "qZk+NkcGgWq6PiVxeFDCbJzQ2J0="
        );
    }

    #[test]
    fn uri_round_trip() {
        for method in &[
            HashMethod::Sha1,
            HashMethod::Sha256,
            HashMethod::Sha384,
            HashMethod::Sha512,
        ] {
            assert_eq!(HashMethod::from_uri(method.uri()).unwrap(), *method);
        }

        assert!(HashMethod::from_uri("urn:unknown").is_err());
    }
}
