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

pub mod extract;

mod fetch;

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use quick_xml::de::from_str;
use url::Url;

use crate::{certificate::Certificate, error::Error, http::Client};

use super::CertificateStore;

use extract::{TrustServiceProvider, TrustServiceStatusList, TspService};
use fetch::fetch_data;

/// Parsed ETSI trust service status list.
pub struct TrustServiceList {
    tsl: TrustServiceStatusList,
    store: Mutex<Option<Arc<CertificateStore>>>,
}

impl TrustServiceList {
    pub fn parse(xml: &str) -> Result<Self, Error> {
        let tsl: TrustServiceStatusList = from_str(xml)?;

        Ok(Self {
            tsl,
            store: Mutex::new(None),
        })
    }

    pub async fn fetch(client: &Client, url: &Url) -> Result<Self, Error> {
        let xml = fetch_data(client, url).await?;

        Self::parse(&xml)
    }

    pub fn territory(&self) -> &str {
        self.tsl.scheme_information.territory.trim()
    }

    pub fn sequence_number(&self) -> u64 {
        self.tsl.scheme_information.sequence_number
    }

    pub fn issue_time(&self) -> Option<DateTime<Utc>> {
        parse_time(&self.tsl.scheme_information.issue_date_time)
    }

    pub fn next_update(&self) -> Option<DateTime<Utc>> {
        self.tsl
            .scheme_information
            .next_update
            .as_ref()?
            .date_time
            .as_deref()
            .and_then(parse_time)
    }

    pub fn providers(&self) -> &[TrustServiceProvider] {
        &self.tsl.provider_list.provider
    }

    /// Store with all certificates of all services of all providers.
    ///
    /// The store is built on the first call and shared afterwards.
    pub fn certificate_store(&self) -> Arc<CertificateStore> {
        let mut store = match self.store.lock() {
            Ok(store) => store,
            Err(err) => err.into_inner(),
        };

        if let Some(store) = &*store {
            return store.clone();
        }

        let mut next = CertificateStore::new();
        for provider in self.providers() {
            for service in &provider.services.service {
                next.extend(service_certificates(service));
            }
        }

        debug!(
            "Certificate store of trust list ({}/{}) created with {} certificates",
            self.territory(),
            self.sequence_number(),
            next.len()
        );

        let next = Arc::new(next);
        *store = Some(next.clone());

        next
    }

    pub fn get_issuer(&self, cert: &Certificate) -> Option<Certificate> {
        self.certificate_store().get_issuer(cert).cloned()
    }
}

impl TrustServiceProvider {
    pub fn name(&self) -> Option<&str> {
        self.information.name.first()
    }
}

impl TspService {
    pub fn type_identifier(&self) -> &str {
        self.infos.ident.trim()
    }

    pub fn name(&self) -> Option<&str> {
        self.infos.name.first()
    }

    pub fn status(&self) -> &str {
        self.infos.status.trim()
    }

    pub fn status_starting_time(&self) -> Option<DateTime<Utc>> {
        parse_time(&self.infos.starting_time)
    }

    pub fn supply_points(&self) -> Vec<&str> {
        self.infos
            .supply_points
            .iter()
            .flat_map(|points| points.supply_point.iter())
            .map(|point| point.trim())
            .collect()
    }

    pub fn certificates(&self) -> Result<Vec<Certificate>, Error> {
        self.infos
            .identity
            .id
            .iter()
            .filter_map(|id| id.cert.as_deref())
            .map(Certificate::from_base64)
            .collect()
    }
}

/// Certificates of a service; broken entries are logged and skipped.
fn service_certificates(service: &TspService) -> Vec<Certificate> {
    service
        .infos
        .identity
        .id
        .iter()
        .filter_map(|id| id.cert.as_deref())
        .filter_map(|cert| match Certificate::from_base64(cert) {
            Ok(cert) => Some(cert),
            Err(err) => {
                warn!(
                    "Unable to decode certificate of trust service {}: {}",
                    service.name().unwrap_or("<unknown>"),
                    err
                );

                None
            }
        })
        .collect()
}

fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|time| time.with_timezone(&Utc))
}

#[cfg(test)]
pub mod tests {
    use super::*;

    use crate::certificate::{
        tests::{create_ca, create_cert},
        Format,
    };

    pub fn create_tsl(certs: &[&Certificate]) -> String {
        let identities = certs
            .iter()
            .map(|cert| {
                format!(
                    "<DigitalId><X509Certificate>\n{}\n</X509Certificate></DigitalId>",
                    cert.format(Format::Base64)
                )
            })
            .collect::<String>();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<TrustServiceStatusList xmlns="http://uri.etsi.org/02231/v2#" Id="TrustServiceStatusList" TSLTag="http://uri.etsi.org/19612/TSLTag">
  <SchemeInformation>
    <TSLVersionIdentifier>5</TSLVersionIdentifier>
    <TSLSequenceNumber>42</TSLSequenceNumber>
    <SchemeOperatorName><Name xml:lang="en">Test Authority</Name></SchemeOperatorName>
    <SchemeTerritory>EE</SchemeTerritory>
    <ListIssueDateTime>2021-04-01T00:00:00Z</ListIssueDateTime>
    <NextUpdate><dateTime>2021-10-01T00:00:00Z</dateTime></NextUpdate>
  </SchemeInformation>
  <TrustServiceProviderList>
    <TrustServiceProvider>
      <TSPInformation><TSPName><Name xml:lang="en">AS Foo</Name><Name xml:lang="et">AS Foo</Name></TSPName></TSPInformation>
      <TSPServices>
        <TSPService>
          <ServiceInformation>
            <ServiceTypeIdentifier>http://uri.etsi.org/TrstSvc/Svctype/CA/QC</ServiceTypeIdentifier>
            <ServiceName><Name xml:lang="en">Test CA</Name></ServiceName>
            <ServiceDigitalIdentity>{}</ServiceDigitalIdentity>
            <ServiceStatus>http://uri.etsi.org/TrstSvc/TrustedList/Svcstatus/granted</ServiceStatus>
            <StatusStartingTime>2016-06-30T22:00:00Z</StatusStartingTime>
            <ServiceSupplyPoints><ServiceSupplyPoint>http://ocsp.example.com/</ServiceSupplyPoint></ServiceSupplyPoints>
          </ServiceInformation>
        </TSPService>
      </TSPServices>
    </TrustServiceProvider>
  </TrustServiceProviderList>
</TrustServiceStatusList>"#,
            identities
        )
    }

    #[test]
    fn parse_tsl() {
        let ca = create_ca("Test CA");
        let tsl = TrustServiceList::parse(&create_tsl(&[&ca.cert])).unwrap();

        assert_eq!(tsl.territory(), "EE");
        assert_eq!(tsl.sequence_number(), 42);
        assert_eq!(tsl.issue_time().unwrap().to_rfc3339(), "2021-04-01T00:00:00+00:00");
        assert!(tsl.next_update().unwrap() > tsl.issue_time().unwrap());

        let provider = &tsl.providers()[0];
        assert_eq!(provider.name(), Some("AS Foo"));

        let service = &provider.services.service[0];
        assert_eq!(service.type_identifier(), "http://uri.etsi.org/TrstSvc/Svctype/CA/QC");
        assert_eq!(service.name(), Some("Test CA"));
        assert_eq!(service.supply_points(), vec!["http://ocsp.example.com/"]);
        assert_eq!(service.certificates().unwrap(), vec![ca.cert.clone()]);
    }

    #[test]
    fn issuer_from_tsl() {
        let ca = create_ca("Test CA");
        let leaf = create_cert(&ca, "Leaf", 2, None);
        let tsl = TrustServiceList::parse(&create_tsl(&[&ca.cert])).unwrap();

        assert_eq!(tsl.get_issuer(&leaf.cert), Some(ca.cert.clone()));
        assert!(tsl.get_issuer(&ca.cert).is_some());
        assert!(tsl.get_issuer(&create_ca("Unknown CA").cert).is_none());
        assert!(Arc::ptr_eq(&tsl.certificate_store(), &tsl.certificate_store()));
    }

    #[tokio::test]
    async fn fetch_from_file() {
        let ca = create_ca("Test CA");
        let path = std::env::temp_dir().join("bdoc-signer-fetch-tsl.xml");
        std::fs::write(&path, create_tsl(&[&ca.cert])).unwrap();

        let client = Client::new(&Default::default()).unwrap();
        let url = Url::from_file_path(&path).unwrap();
        let tsl = TrustServiceList::fetch(&client, &url).await.unwrap();

        assert_eq!(tsl.sequence_number(), 42);
        assert_eq!(tsl.certificate_store().len(), 1);
    }
}
