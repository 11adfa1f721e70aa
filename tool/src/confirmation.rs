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

use signer::{error::Error, mobile_id::confirmation};
use structopt::StructOpt;

#[derive(StructOpt)]
/// Tool to derive the Mobile-ID verification code of a digest.
pub struct Opts {
    /// Hex encoded digest that is signed.
    digest: String,
}

pub fn execute(opts: Opts) -> Result<(), Error> {
    let digest = hex::decode(opts.digest.trim()).expect("Invalid hex digest!");

    println!("{}", confirmation(&digest));

    Ok(())
}
