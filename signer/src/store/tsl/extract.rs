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

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct TrustServiceStatusList {
    #[serde(rename = "SchemeInformation")]
    pub scheme_information: SchemeInformation,

    #[serde(rename = "TrustServiceProviderList", default)]
    pub provider_list: TrustServiceProviderList,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SchemeInformation {
    #[serde(rename = "TSLSequenceNumber")]
    pub sequence_number: u64,

    #[serde(rename = "SchemeTerritory")]
    pub territory: String,

    #[serde(rename = "ListIssueDateTime")]
    pub issue_date_time: String,

    #[serde(rename = "NextUpdate")]
    pub next_update: Option<NextUpdate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NextUpdate {
    #[serde(rename = "dateTime")]
    pub date_time: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TrustServiceProviderList {
    #[serde(rename = "TrustServiceProvider", default)]
    pub provider: Vec<TrustServiceProvider>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrustServiceProvider {
    #[serde(rename = "TSPInformation")]
    pub information: TspInformation,

    #[serde(rename = "TSPServices", default)]
    pub services: TspServices,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TspInformation {
    #[serde(rename = "TSPName")]
    pub name: MultiLangNames,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TspServices {
    #[serde(rename = "TSPService", default)]
    pub service: Vec<TspService>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TspService {
    #[serde(rename = "ServiceInformation")]
    pub infos: ServiceInformation,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInformation {
    #[serde(rename = "ServiceTypeIdentifier")]
    pub ident: String,

    #[serde(rename = "ServiceName")]
    pub name: MultiLangNames,

    #[serde(rename = "ServiceDigitalIdentity")]
    pub identity: ServiceDigitalIdentity,

    #[serde(rename = "ServiceStatus")]
    pub status: String,

    #[serde(rename = "StatusStartingTime")]
    pub starting_time: String,

    #[serde(rename = "ServiceSupplyPoints")]
    pub supply_points: Option<ServiceSupplyPoints>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MultiLangNames {
    #[serde(rename = "Name", default)]
    pub name: Vec<MultiLangName>,
}

impl MultiLangNames {
    /// First name of the list, which is the English one in practice.
    pub fn first(&self) -> Option<&str> {
        self.name.first().map(|n| n.value.trim())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MultiLangName {
    #[serde(rename = "$text", default)]
    pub value: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ServiceSupplyPoints {
    #[serde(rename = "ServiceSupplyPoint", default)]
    pub supply_point: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceDigitalIdentity {
    #[serde(rename = "DigitalId", default)]
    pub id: Vec<DigitalId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DigitalId {
    #[serde(rename = "X509Certificate")]
    pub cert: Option<String>,
}
