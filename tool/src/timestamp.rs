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

use openssl::sha::sha256;
use signer::{config::Config, error::Error, Timestamp, ToBuffer};
use structopt::StructOpt;

use super::misc::{create_client, read_input, write_output};

#[derive(StructOpt)]
/// Tool to request an RFC 3161 time stamp token.
///
/// The SHA-256 digest of the input is sent to the time stamping authority and
/// the received token is written to the output.
pub struct Opts {
    /// Path of the file to time stamp.
    ///
    /// If this parameter is not passed, the content is read from stdin.
    #[structopt(short, long)]
    input: Option<PathBuf>,

    /// URL of the time stamping authority.
    ///
    /// If this parameter is not passed, the configured authority is used.
    #[structopt(short, long)]
    url: Option<String>,

    /// Path to write the DER encoded token to.
    ///
    /// If this parameter is not passed, the token is written to stdout.
    #[structopt(short, long)]
    output: Option<PathBuf>,
}

pub async fn execute(opts: Opts, config: &Config) -> Result<(), Error> {
    let url = opts
        .url
        .or_else(|| config.timestamp_url.clone())
        .expect("No time stamping authority configured!");

    let digest = sha256(&read_input(&opts.input)?);

    let timestamp = Timestamp::new(create_client(config)?, url);
    let response = timestamp.read(&digest, "sha256").await?;

    write_output(&opts.output, &response.to_buffer())?;

    Ok(())
}
