//! Fetching today's readings from the station's cloud dashboard.

use crate::observations::error::ObservationError;
use crate::types::compass::wind_direction_degrees;
use crate::types::observation::{finite, Observation};
use bon::bon;
use chrono::{Local, NaiveDate};
use log::{debug, info, warn};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_TOKEN_URL: &str = "https://api2.arduino.cc/iot/v1/clients/token";
pub const DEFAULT_API_BASE: &str = "https://api2.arduino.cc/iot";
pub const DEFAULT_AUDIENCE: &str = "https://api2.arduino.cc/iot";

pub const PROPERTY_RAIN: &str = "Rain";
pub const PROPERTY_TEMP_MAX: &str = "Max_temp_today";
pub const PROPERTY_TEMP_MIN: &str = "Min_temp_today";
pub const PROPERTY_WIND_SPEED: &str = "Max_wind_speed_today";
pub const PROPERTY_WIND_DIRECTION: &str = "Prevailing_wind_direction";

/// Anything that can produce the most recent day of readings.
pub trait ObservationSource {
    fn fetch_latest(&self) -> impl Future<Output = Result<Observation, ObservationError>> + Send;
}

/// One entry of the `things/{id}/properties` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ThingProperty {
    pub name: String,
    #[serde(default)]
    pub last_value: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

fn property<'a>(properties: &'a [ThingProperty], name: &str) -> Option<&'a Value> {
    properties
        .iter()
        .find(|p| p.name == name)
        .and_then(|p| p.last_value.as_ref())
}

fn numeric(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    finite(number)
}

fn direction(value: &Value) -> Option<f64> {
    match value {
        Value::String(label) => wind_direction_degrees(label),
        Value::Number(n) => n.as_f64().filter(|deg| (0.0..360.0).contains(deg)),
        _ => None,
    }
}

/// Maps a property listing onto an [`Observation`] for `date`.
///
/// A property that is absent, null, or not interpretable leaves its reading missing.
pub fn observation_from_properties(date: NaiveDate, properties: &[ThingProperty]) -> Observation {
    let read = |name: &str, convert: fn(&Value) -> Option<f64>| {
        let value = property(properties, name).and_then(convert);
        if value.is_none() {
            warn!("Property {} has no usable value for {}", name, date);
        }
        value
    };

    Observation {
        date,
        precipitation: read(PROPERTY_RAIN, numeric),
        temp_max: read(PROPERTY_TEMP_MAX, numeric),
        temp_min: read(PROPERTY_TEMP_MIN, numeric),
        wind_speed: read(PROPERTY_WIND_SPEED, numeric),
        wind_direction: read(PROPERTY_WIND_DIRECTION, direction),
    }
}

/// Reads the station's daily summary properties from the Arduino IoT Cloud.
///
/// Each fetch exchanges the client credentials for a fresh bearer token, then lists the
/// properties of the configured thing.
pub struct ArduinoCloudSource {
    client: Client,
    thing_id: String,
    client_id: String,
    client_secret: String,
    token_url: String,
    api_base: String,
    audience: String,
}

#[bon]
impl ArduinoCloudSource {
    #[builder]
    pub fn new(
        #[builder(into)] thing_id: String,
        #[builder(into)] client_id: String,
        #[builder(into)] client_secret: String,
        #[builder(into, default = DEFAULT_TOKEN_URL.to_string())] token_url: String,
        #[builder(into, default = DEFAULT_API_BASE.to_string())] api_base: String,
        #[builder(into, default = DEFAULT_AUDIENCE.to_string())] audience: String,
        #[builder(default = Duration::from_secs(30))] timeout: Duration,
    ) -> Result<Self, ObservationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ObservationError::ClientBuild)?;
        Ok(Self {
            client,
            thing_id,
            client_id,
            client_secret,
            token_url,
            api_base: api_base.trim_end_matches('/').to_string(),
            audience,
        })
    }

    pub fn properties_url(&self) -> String {
        format!("{}/v2/things/{}/properties", self.api_base, self.thing_id)
    }

    async fn access_token(&self) -> Result<String, ObservationError> {
        debug!("Requesting access token from {}", self.token_url);
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("audience", self.audience.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ObservationError::NetworkRequest(self.token_url.clone(), e))?;

        if !response.status().is_success() {
            warn!(
                "Token exchange with {} failed with status {}",
                self.token_url,
                response.status()
            );
            return Err(ObservationError::TokenExchange {
                url: self.token_url.clone(),
                status: response.status(),
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ObservationError::ResponseDecode(self.token_url.clone(), e))?;
        Ok(token.access_token)
    }

    /// Lists the thing's properties with their last reported values.
    pub async fn fetch_properties(&self) -> Result<Vec<ThingProperty>, ObservationError> {
        let token = self.access_token().await?;
        let url = self.properties_url();
        info!("Fetching station properties from {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ObservationError::NetworkRequest(url.clone(), e))?;
        let response = check_status(&url, response)?;

        response
            .json::<Vec<ThingProperty>>()
            .await
            .map_err(|e| ObservationError::ResponseDecode(url, e))
    }

    /// Fetches the readings and dates them `date`.
    pub async fn fetch_for(&self, date: NaiveDate) -> Result<Observation, ObservationError> {
        let properties = self.fetch_properties().await?;
        debug!("Received {} properties", properties.len());
        Ok(observation_from_properties(date, &properties))
    }
}

fn check_status(url: &str, response: Response) -> Result<Response, ObservationError> {
    response.error_for_status().map_err(|e| {
        warn!("HTTP error for {}: {:?}", url, e);
        match e.status() {
            Some(status) => ObservationError::HttpStatus {
                url: url.to_string(),
                status,
                source: e,
            },
            None => ObservationError::NetworkRequest(url.to_string(), e),
        }
    })
}

impl ObservationSource for ArduinoCloudSource {
    /// Dated with the local calendar day of the fetch.
    async fn fetch_latest(&self) -> Result<Observation, ObservationError> {
        self.fetch_for(Local::now().date_naive()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
    }

    fn source(server: &MockServer) -> ArduinoCloudSource {
        ArduinoCloudSource::builder()
            .thing_id("thing-1")
            .client_id("id")
            .client_secret("secret")
            .token_url(format!("{}/iot/v1/clients/token", server.uri()))
            .api_base(format!("{}/iot/", server.uri()))
            .build()
            .unwrap()
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/iot/v1/clients/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_secret=secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "token-123",
                "expires_in": 300
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_maps_properties() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/iot/v2/things/thing-1/properties"))
            .and(header("authorization", "Bearer token-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "name": "Rain", "last_value": 0.25 },
                { "name": "Max_temp_today", "last_value": 84.2 },
                { "name": "Min_temp_today", "last_value": "63.1" },
                { "name": "Max_wind_speed_today", "last_value": 11 },
                { "name": "Prevailing_wind_direction", "last_value": "SW" },
                { "name": "Humidity", "last_value": 40 }
            ])))
            .mount(&server)
            .await;

        let observation = source(&server).fetch_for(date()).await.unwrap();
        assert_eq!(
            observation,
            Observation::new(date())
                .with_precipitation(0.25)
                .with_temperatures(84.2, 63.1)
                .with_wind(11.0, 225.0)
        );
    }

    #[tokio::test]
    async fn test_refused_token_is_token_exchange_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/iot/v1/clients/token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = source(&server).fetch_for(date()).await.unwrap_err();
        assert!(matches!(
            err,
            ObservationError::TokenExchange { status, .. } if status == reqwest::StatusCode::UNAUTHORIZED
        ));
    }

    #[tokio::test]
    async fn test_failed_listing_is_http_status_error() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/iot/v2/things/thing-1/properties"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = source(&server).fetch_for(date()).await.unwrap_err();
        assert!(matches!(err, ObservationError::HttpStatus { .. }));
    }

    #[test]
    fn test_missing_and_unrecognized_properties_are_missing() {
        let properties = vec![
            ThingProperty {
                name: PROPERTY_TEMP_MAX.into(),
                last_value: Some(json!(70.0)),
            },
            ThingProperty {
                name: PROPERTY_WIND_DIRECTION.into(),
                last_value: Some(json!("Calm")),
            },
            ThingProperty {
                name: PROPERTY_RAIN.into(),
                last_value: None,
            },
        ];
        let observation = observation_from_properties(date(), &properties);
        assert_eq!(observation.temp_max, Some(70.0));
        assert_eq!(observation.precipitation, None);
        assert_eq!(observation.temp_min, None);
        assert_eq!(observation.wind_direction, None);
    }
}
