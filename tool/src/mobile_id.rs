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

use std::path::PathBuf;

use signer::{certificate::Format, config::Config, error::Error, MobileId};
use structopt::StructOpt;

use super::misc::{create_client, write_output};

#[derive(StructOpt)]
/// Tool to fetch the signing certificate of a Mobile-ID user.
pub struct Opts {
    /// Phone number of the user, including the country code.
    #[structopt(short, long)]
    phone: String,

    /// National identity number of the user.
    #[structopt(short, long)]
    id: String,

    /// Path to write the PEM encoded certificate to.
    ///
    /// If this parameter is not passed, the certificate is written to stdout.
    #[structopt(short, long)]
    output: Option<PathBuf>,
}

pub async fn execute(opts: Opts, config: &Config) -> Result<(), Error> {
    let mobile_id = MobileId::new(create_client(config)?, config.mobile_id.clone());
    let cert = mobile_id.read_certificate(&opts.phone, &opts.id).await?;

    write_output(&opts.output, cert.format(Format::Pem).as_bytes())?;

    Ok(())
}
