//! Spring actuator endpoints. These answer with plain JSON, not the envelope.

use reqwest::Method;
use serde_json::{Value, json};

use super::{ApiClient, ApiError};

#[derive(Clone)]
pub struct ActuatorApi {
    api: ApiClient,
}

impl ActuatorApi {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.api
            .send_raw(self.api.request(Method::GET, path))
            .await
    }

    pub async fn health(&self) -> Result<Value, ApiError> {
        self.get("/actuator/health").await
    }

    pub async fn info(&self) -> Result<Value, ApiError> {
        self.get("/actuator/info").await
    }

    pub async fn metric(&self, name: &str) -> Result<Value, ApiError> {
        self.get(&format!("/actuator/metrics/{name}")).await
    }

    pub async fn env(&self) -> Result<Value, ApiError> {
        self.get("/actuator/env").await
    }

    pub async fn loggers(&self) -> Result<Value, ApiError> {
        self.get("/actuator/loggers").await
    }

    pub async fn set_logger_level(&self, logger: &str, level: &str) -> Result<Value, ApiError> {
        self.api
            .send_raw(
                self.api
                    .request(Method::POST, &format!("/actuator/loggers/{logger}"))
                    .json(&json!({ "configuredLevel": level })),
            )
            .await
    }

    pub async fn thread_dump(&self) -> Result<Value, ApiError> {
        self.get("/actuator/threaddump").await
    }

    pub async fn mappings(&self) -> Result<Value, ApiError> {
        self.get("/actuator/mappings").await
    }

    pub async fn beans(&self) -> Result<Value, ApiError> {
        self.get("/actuator/beans").await
    }
}
