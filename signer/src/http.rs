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

use std::time::Duration;

use log::debug;
use reqwest::{
    header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE},
    Client as HttpClient, Error as ReqwestError, IntoUrl, RequestBuilder, Response,
};

use crate::{config::HttpConfig, error::Error};

/// HTTP client shared by the protocol clients.
#[derive(Clone)]
pub struct Client {
    http: HttpClient,
}

impl Client {
    pub fn new(config: &HttpConfig) -> Result<Self, Error> {
        let http = HttpClient::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self { http })
    }

    pub fn get<U: IntoUrl>(&self, url: U) -> Result<RequestBuilder, ReqwestError> {
        let url = url.into_url()?;

        Ok(self.http.get(url))
    }

    pub fn post<U: IntoUrl>(&self, url: U) -> Result<RequestBuilder, ReqwestError> {
        let url = url.into_url()?;

        Ok(self.http.post(url))
    }

    /// Posts a DER encoded message and returns the body of the response.
    pub async fn post_der(
        &self,
        url: &str,
        content_type: &str,
        accept: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, Error> {
        debug!("POST {} ({}, {} bytes)", url, content_type, body.len());

        let res = self
            .post(url)?
            .header(CONTENT_TYPE, content_type)
            .header(ACCEPT, accept)
            .header(CONTENT_LENGTH, body.len())
            .body(body)
            .send()
            .await?;
        let res = check_status(res).await?;

        Ok(res.bytes().await?.to_vec())
    }
}

/// Fails with `InvalidResponse` for anything but `200 OK`.
pub async fn check_status(res: Response) -> Result<Response, Error> {
    let status = res.status();
    if status != 200 {
        let text = res.text().await.unwrap_or_default();

        return Err(Error::InvalidResponse(status, text));
    }

    Ok(res)
}
