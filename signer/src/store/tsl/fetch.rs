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

use std::fs::read_to_string;

use log::info;
use url::Url;

use crate::{
    error::Error,
    http::{check_status, Client},
};

/// Loads the trust list document from an `http(s)` or `file` URL.
pub async fn fetch_data(client: &Client, url: &Url) -> Result<String, Error> {
    let body = if url.scheme() == "file" {
        let filename = match url.host() {
            Some(host) => format!("{}{}", host, url.path()),
            None => url.path().into(),
        };

        read_to_string(filename)?
    } else {
        let res = client.get(url.clone())?.send().await?;
        let res = check_status(res).await?;

        res.text().await?
    };

    info!("Trust list loaded: {}", url);

    Ok(body)
}
