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

use thiserror::Error;

/// Unsuccessful result of a Mobile-ID request or session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MobileIdError {
    #[error("Person is not a Mobile-ID client or the certificate was not found!")]
    NotFound,

    #[error("Mobile-ID certificate is not active!")]
    NotActive,

    #[error("User did not respond in time!")]
    Timeout,

    #[error("Person is not a Mobile-ID client!")]
    NotMidClient,

    #[error("User cancelled the operation!")]
    UserCancelled,

    #[error("Verification codes did not match!")]
    SignatureHashMismatch,

    #[error("Phone is not reachable!")]
    PhoneAbsent,

    #[error("Unable to deliver the message to the phone!")]
    DeliveryError,

    #[error("SIM card error!")]
    SimError,

    #[error("Unexpected Mobile-ID result: {0}!")]
    Other(String),
}

impl MobileIdError {
    pub fn from_code(code: &str) -> Self {
        match code {
            "NOT_FOUND" => Self::NotFound,
            "NOT_ACTIVE" => Self::NotActive,
            "TIMEOUT" => Self::Timeout,
            "NOT_MID_CLIENT" => Self::NotMidClient,
            "USER_CANCELLED" => Self::UserCancelled,
            "SIGNATURE_HASH_MISMATCH" => Self::SignatureHashMismatch,
            "PHONE_ABSENT" => Self::PhoneAbsent,
            "DELIVERY_ERROR" => Self::DeliveryError,
            "SIM_ERROR" => Self::SimError,
            code => Self::Other(code.into()),
        }
    }

    /// Result code as sent by the service.
    pub fn code(&self) -> &str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::NotActive => "NOT_ACTIVE",
            Self::Timeout => "TIMEOUT",
            Self::NotMidClient => "NOT_MID_CLIENT",
            Self::UserCancelled => "USER_CANCELLED",
            Self::SignatureHashMismatch => "SIGNATURE_HASH_MISMATCH",
            Self::PhoneAbsent => "PHONE_ABSENT",
            Self::DeliveryError => "DELIVERY_ERROR",
            Self::SimError => "SIM_ERROR",
            Self::Other(code) => code,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn codes_survive_round_trip() {
        for code in &[
            "NOT_FOUND",
            "NOT_ACTIVE",
            "TIMEOUT",
            "NOT_MID_CLIENT",
            "USER_CANCELLED",
            "SIGNATURE_HASH_MISMATCH",
            "PHONE_ABSENT",
            "DELIVERY_ERROR",
            "SIM_ERROR",
            "SOMETHING_NEW",
        ] {
            assert_eq!(MobileIdError::from_code(code).code(), *code);
        }

        assert_eq!(
            MobileIdError::from_code("SOMETHING_NEW"),
            MobileIdError::Other("SOMETHING_NEW".into())
        );
    }
}
