//! HTTP gateway over the Cloudflare v4 REST API

use super::dto::{
    ApiEnvelope, BulkUpdateRequest, SingleUpdateRequest, UniversalSslDto, ZoneDto, ZoneSettingDto,
};
use super::mapper::join_messages;
use crate::config::ApiConfig;
use crate::contract::{GatewayError, Setting, TargetDetails};
use crate::domain::ZoneGateway;
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Gateway speaking to `{base_url}/zones/...`
///
/// Owns request timeouts and retries. Throttled (429), failed-server (5xx)
/// and transport errors are retried with linear backoff; anything else is
/// returned on the first attempt.
#[derive(Clone)]
pub struct CloudflareGateway {
    http: reqwest::Client,
    base_url: Url,
    api_token: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl CloudflareGateway {
    pub fn new(config: &ApiConfig) -> Result<Self, GatewayError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| GatewayError::Transport {
            message: format!("invalid base URL {:?}: {}", config.base_url, e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::Transport {
                message: format!("base URL {:?} cannot carry a path", config.base_url),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GatewayError::Transport {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            base_url,
            api_token: config.api_token.clone(),
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        resource: &str,
    ) -> Result<Option<T>, GatewayError> {
        let mut attempt = 0;
        loop {
            let outcome = self
                .send_once::<T>(method.clone(), url.clone(), body.as_ref(), resource)
                .await;
            match outcome {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.retry_backoff * attempt;
                    warn!(%method, %url, attempt, ?delay, "Retrying request: {}", e);
                    tokio::time::sleep(delay).await;
                }
                outcome => return outcome,
            }
        }
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        resource: &str,
    ) -> Result<Option<T>, GatewayError> {
        debug!(%method, %url, "Calling zone API");
        let mut request = self.http.request(method, url).bearer_auth(&self.api_token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(transport)?;

        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound {
                resource: resource.to_string(),
            });
        }

        if !status.is_success() {
            let (code, message) = match serde_json::from_slice::<ApiEnvelope<Value>>(&bytes) {
                Ok(envelope) if !envelope.errors.is_empty() => (
                    envelope.errors.first().and_then(|e| e.code),
                    join_messages(&envelope.errors),
                ),
                _ => (None, String::from_utf8_lossy(&bytes).into_owned()),
            };
            return Err(GatewayError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }

        let envelope: ApiEnvelope<T> =
            serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode {
                message: format!("{}: {}", resource, e),
            })?;
        if !envelope.success {
            return Err(GatewayError::Api {
                status: status.as_u16(),
                code: envelope.errors.first().and_then(|e| e.code),
                message: join_messages(&envelope.errors),
            });
        }
        Ok(envelope.result)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url, resource: &str) -> Result<T, GatewayError> {
        self.execute(Method::GET, url, None, resource)
            .await?
            .ok_or_else(|| GatewayError::Decode {
                message: format!("{}: response carries no result", resource),
            })
    }

    async fn patch(&self, url: Url, body: Value, resource: &str) -> Result<(), GatewayError> {
        self.execute::<Value>(Method::PATCH, url, Some(body), resource)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl ZoneGateway for CloudflareGateway {
    async fn read_all(&self, zone_id: &str) -> Result<Vec<Setting>, GatewayError> {
        let url = self.endpoint(&["zones", zone_id, "settings"]);
        let settings: Vec<ZoneSettingDto> =
            self.get(url, &format!("settings of zone {}", zone_id)).await?;
        Ok(settings.into_iter().map(Setting::from).collect())
    }

    async fn read_single(&self, zone_id: &str, setting_id: &str) -> Result<Setting, GatewayError> {
        let url = self.endpoint(&["zones", zone_id, "settings", setting_id]);
        let setting: ZoneSettingDto = self
            .get(url, &format!("setting {} of zone {}", setting_id, zone_id))
            .await?;
        Ok(setting.into())
    }

    async fn write_single(
        &self,
        zone_id: &str,
        setting_id: &str,
        setting: &Setting,
    ) -> Result<(), GatewayError> {
        let url = self.endpoint(&["zones", zone_id, "settings", setting_id]);
        let body = encode_body(&SingleUpdateRequest {
            value: &setting.value,
        })?;
        self.patch(url, body, &format!("setting {} of zone {}", setting_id, zone_id))
            .await
    }

    async fn read_toggle(&self, zone_id: &str) -> Result<bool, GatewayError> {
        let url = self.endpoint(&["zones", zone_id, "ssl", "universal", "settings"]);
        let status: UniversalSslDto = self
            .get(url, &format!("universal SSL settings of zone {}", zone_id))
            .await?;
        Ok(status.enabled)
    }

    async fn write_toggle(&self, zone_id: &str, enabled: bool) -> Result<(), GatewayError> {
        let url = self.endpoint(&["zones", zone_id, "ssl", "universal", "settings"]);
        let body = encode_body(&UniversalSslDto { enabled })?;
        self.patch(url, body, &format!("universal SSL settings of zone {}", zone_id))
            .await
    }

    async fn write_many(&self, zone_id: &str, settings: &[Setting]) -> Result<(), GatewayError> {
        let url = self.endpoint(&["zones", zone_id, "settings"]);
        let body = encode_body(&BulkUpdateRequest {
            items: settings.iter().map(Into::into).collect(),
        })?;
        self.patch(url, body, &format!("settings of zone {}", zone_id))
            .await
    }

    async fn target_details(&self, zone_id: &str) -> Result<Option<TargetDetails>, GatewayError> {
        let url = self.endpoint(&["zones", zone_id]);
        match self.get::<ZoneDto>(url, &format!("zone {}", zone_id)).await {
            Ok(zone) => Ok(Some(zone.into())),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn transport(err: reqwest::Error) -> GatewayError {
    GatewayError::Transport {
        message: err.to_string(),
    }
}

fn encode_body<T: serde::Serialize>(body: &T) -> Result<Value, GatewayError> {
    serde_json::to_value(body).map_err(|e| GatewayError::Decode {
        message: format!("failed to encode request body: {}", e),
    })
}
