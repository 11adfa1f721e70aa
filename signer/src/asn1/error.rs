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

use der::Error as DerError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("DER Error: {0}!")]
    DerError(DerError),

    #[error("Invalid Time ({0})!")]
    InvalidTime(String),

    #[error("Unknown Enum Variant (value={0})!")]
    UnknownEnumVariant(u32),

    #[error("Invalid PEM: {0}!")]
    InvalidPem(String),
}

impl From<DerError> for Error {
    fn from(err: DerError) -> Self {
        Self::DerError(err)
    }
}
