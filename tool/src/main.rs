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

mod certificate;
mod confirmation;
mod misc;
mod mobile_id;
mod ocsp;
mod timestamp;

use std::path::PathBuf;
use std::process::exit;

use log::{error, LevelFilter};
use signer::{config::Config, error::Error, logging::init_logger};
use structopt::StructOpt;

use certificate::{execute as certificate, Opts as CertificateOpts};
use confirmation::{execute as confirmation, Opts as ConfirmationOpts};
use mobile_id::{execute as mobile_id_certificate, Opts as MobileIdCertificateOpts};
use ocsp::{execute as ocsp, Opts as OcspOpts};
use timestamp::{execute as timestamp, Opts as TimestampOpts};

#[tokio::main]
async fn main() {
    let opts = Opts::from_args();

    init_logger(&opts.log_config, opts.log_level).expect("Unable to initialize logger!");

    let config = match &opts.config {
        Some(path) => Config::from_file(path).expect("Unable to load config!"),
        None => Config::default(),
    };

    let result = match opts.command {
        Command::Certificate(opts) => certificate(opts),
        Command::Ocsp(opts) => ocsp(opts, &config).await,
        Command::Timestamp(opts) => timestamp(opts, &config).await,
        Command::MobileIdCertificate(opts) => mobile_id_certificate(opts, &config).await,
        Command::Confirmation(opts) => confirmation(opts),
    };

    if let Err(err) = result {
        error!("{}", err);
        eprintln!("{}", err);

        exit(exit_code(&err));
    }
}

#[derive(StructOpt)]
struct Opts {
    /// Path of the JSON configuration file.
    #[structopt(long)]
    config: Option<PathBuf>,

    /// Path of the log4rs configuration file.
    #[structopt(long, default_value = "log4rs.yml")]
    log_config: PathBuf,

    /// Log level used if the log4rs configuration can not be loaded.
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
enum Command {
    Certificate(CertificateOpts),
    Ocsp(OcspOpts),
    Timestamp(TimestampOpts),
    MobileIdCertificate(MobileIdCertificateOpts),
    Confirmation(ConfirmationOpts),
}

/// Process exit code for each kind of failure.
fn exit_code(err: &Error) -> i32 {
    use signer::{MobileIdError, OcspError, TimestampError};

    match err {
        Error::IssuerNotFound => 3,
        Error::OcspUrlMissing => 4,
        Error::UnsupportedAlgorithm(_) => 5,
        Error::Asn1Error(_) | Error::XmlError(_) | Error::XmlDeError(_) | Error::Base64Error(_) => 6,
        Error::IoError(_) => 7,
        Error::ReqwestError(_) | Error::InvalidResponse(_, _) | Error::UrlError(_) => 8,
        Error::OcspNonceMismatch | Error::OcspStatusMissing => 9,
        Error::OcspError(err) => match err {
            OcspError::MalformedRequest => 11,
            OcspError::InternalError => 12,
            OcspError::TryLater => 13,
            OcspError::SigRequired => 15,
            OcspError::Unauthorized => 16,
            OcspError::UnsupportedResponse => 17,
        },
        Error::MobileIdError(err) => match err {
            MobileIdError::NotFound => 20,
            MobileIdError::NotActive => 21,
            MobileIdError::Timeout => 22,
            MobileIdError::NotMidClient => 23,
            MobileIdError::UserCancelled => 24,
            MobileIdError::SignatureHashMismatch => 25,
            MobileIdError::PhoneAbsent => 26,
            MobileIdError::DeliveryError => 27,
            MobileIdError::SimError => 28,
            MobileIdError::Other(_) => 29,
        },
        Error::TimestampError(err) => match err {
            TimestampError::Rejected { .. } => 30,
            TimestampError::ContentType(_) | TimestampError::MissingToken => 31,
            TimestampError::ImprintMismatch | TimestampError::NonceMismatch => 32,
        },
        _ => 1,
    }
}
