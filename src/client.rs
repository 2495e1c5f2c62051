use anyhow::{bail, Result};
use reqwest::{Response, StatusCode};

use crate::api::*;

pub struct Client {
    url: String,
    client: reqwest::Client,
}
impl Client {
    pub fn new(url: String) -> Self {
        let client = reqwest::Client::new();
        Self { url, client }
    }
    pub async fn create_prediction(&self, request: &NewPredictionRequest) -> Response {
        self.client
            .post(self.url.clone() + "/prediction")
            .json(request)
            .send()
            .await
            .unwrap()
    }
    pub async fn submit_opinion(&self, request: &NewOpinionRequest) -> Response {
        self.client
            .post(self.url.clone() + "/opinion")
            .json(request)
            .send()
            .await
            .unwrap()
    }
    pub async fn get_predictions(&self, category: Option<&str>) -> Result<PredictionListResponse> {
        let mut request = self.client.get(self.url.clone() + "/predictions");
        if let Some(category) = category {
            request = request.query(&[("category", category)]);
        }
        let response = request.send().await?;
        if response.status() != StatusCode::OK {
            bail!("{}: {}", response.status(), response.text().await?)
        }
        Ok(response.json::<PredictionListResponse>().await?)
    }
    #[cfg(test)]
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> Response {
        self.client
            .post(self.url.clone() + path)
            .json(body)
            .send()
            .await
            .unwrap()
    }
}
