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

use serde_json::json;
use signer::{certificate::Format, error::Error, Certificate};
use structopt::StructOpt;

use super::misc::{read_input, write_output};

#[derive(StructOpt)]
/// Tool to inspect or convert X.509 certificates.
///
/// Reads a DER or PEM encoded certificate and prints its fields as JSON, or
/// writes it in the requested format.
pub struct Opts {
    /// Path of the certificate file.
    ///
    /// If this parameter is not passed, the certificate is read from stdin.
    #[structopt(short, long)]
    input: Option<PathBuf>,

    /// Output format of the certificate (hex, base64 or pem).
    ///
    /// If this parameter is not passed, the fields of the certificate are printed.
    #[structopt(short, long)]
    format: Option<Format>,

    /// Path of the file to write to.
    ///
    /// If this parameter is not passed, the output is written to stdout.
    #[structopt(short, long)]
    output: Option<PathBuf>,
}

pub fn execute(opts: Opts) -> Result<(), Error> {
    let cert = read_input(&opts.input)?;
    let cert = Certificate::parse(&cert)?;

    let output = match opts.format {
        Some(format) => cert.format(format),
        None => {
            let info = json!({
                "subject": cert.subject_distinguished_name(),
                "subjectRfc4514": cert.subject_rfc4514_name(),
                "issuer": cert.issuer_distinguished_name(),
                "serialNumber": cert.serial_number()?,
                "validFrom": cert.valid_from().to_rfc3339(),
                "validUntil": cert.valid_until().to_rfc3339(),
                "publicKeyAlgorithm": cert.public_key_algorithm_name(),
                "signatureAlgorithm": cert.issuer_signature_algorithm_name(),
                "ocspUrl": cert.ocsp_url(),
            });

            serde_json::to_string_pretty(&info)?
        }
    };

    write_output(&opts.output, output.as_bytes())?;

    Ok(())
}
