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

use std::fs::{read, write};
use std::path::PathBuf;

use signer::{config::Config, error::Error, store::TrustServiceList, Certificate, Ocsp, ToBuffer};
use structopt::StructOpt;
use url::Url;

use super::misc::create_client;

#[derive(StructOpt)]
/// Tool to query the revocation status of a certificate.
///
/// The issuer of the certificate is taken from the passed issuer file or is
/// looked up in the passed trust service status list.
pub struct Opts {
    /// Path of the certificate to check.
    #[structopt(short, long)]
    cert: PathBuf,

    /// Path of the issuer certificate.
    #[structopt(short, long)]
    issuer: Option<PathBuf>,

    /// URL of the trust service status list to look up the issuer in.
    ///
    /// `file://` URLs are read from the local file system.
    #[structopt(short, long)]
    tsl: Option<Url>,

    /// URL of the OCSP responder.
    ///
    /// Overrides the configured responder and the one from the certificate.
    #[structopt(short, long)]
    url: Option<String>,

    /// Path to write the DER encoded OCSP response to.
    #[structopt(short, long)]
    output: Option<PathBuf>,
}

pub async fn execute(opts: Opts, config: &Config) -> Result<(), Error> {
    let cert = Certificate::parse(&read(&opts.cert)?)?;
    let issuer = match &opts.issuer {
        Some(issuer) => Some(Certificate::parse(&read(issuer)?)?),
        None => None,
    };

    let client = create_client(config)?;
    let tsl = match &opts.tsl {
        Some(url) => Some(TrustServiceList::fetch(&client, url).await?),
        None => None,
    };

    let ocsp = Ocsp::new(client, opts.url.or_else(|| config.ocsp_url.clone()));
    let response = ocsp.read(&cert, issuer.as_ref(), tsl.as_ref()).await?;

    if let Some(single) = response.status_for(&cert) {
        println!("Status: {}", single.cert_status.code());
        println!("This update: {}", single.this_update.0.to_rfc3339());
    }
    println!("Produced at: {}", response.produced_at().to_rfc3339());

    if let Some(output) = &opts.output {
        write(output, response.to_buffer())?;
    }

    Ok(())
}
