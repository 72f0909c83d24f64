use crate::api::{
    client::Client,
    error::{RestError, StatusError, TriggerError},
    session::Session,
    status::GenerationStatus,
};
use anyhow::{anyhow, Context, Error};
use serde::{
    de::{DeserializeOwned, IgnoredAny},
    Deserialize, Deserializer, Serialize,
};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct RestErrorResponse {
    message: Option<String>,
    detail: Option<String>,
    error: Option<String>,
}

impl RestErrorResponse {
    fn into_message(self) -> Option<String> {
        self.message.or(self.detail).or(self.error)
    }
}

/// The REST backend of the timetable platform.
pub struct Server {
    api_url: String,
    session: Session,
    timeout: Duration,
}

fn parse_error(response: ureq::Response) -> RestError {
    let status = response.status();
    let body = response
        .into_string()
        .unwrap_or_else(|_| "Could not turn error body into String.".to_string());

    let message = serde_json::from_str::<RestErrorResponse>(&body)
        .ok()
        .and_then(RestErrorResponse::into_message);
    if let Some(message) = message {
        RestError::Known { status, message }
    } else {
        RestError::Unknown { status, body }
    }
}

impl Server {
    pub fn new(api_url: impl Into<String>) -> Self {
        Server {
            api_url: api_url.into(),
            session: Session::anonymous(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn execute<Ep, Val, Hand, Err>(&mut self, request: Ep, error_handler: Hand) -> Result<Val, Err>
    where
        Ep: Endpoint<Value = Val> + EndpointExt,
        Hand: FnOnce(RestError) -> Err,
        Err: From<anyhow::Error>,
    {
        let url = format!("{}/{}", self.api_url.trim_end_matches('/'), Ep::PATH);
        let mut http_request = Ep::METHOD(&url);
        http_request
            .timeout(self.timeout)
            .set("Accept", "application/json");
        if let Some(authorization) = self.session.authorization() {
            http_request.set("Authorization", &authorization);
        }

        debug!(%url, "sending request");
        let http_response = if Ep::SENDS_BODY {
            let buffer = Ep::write_request_string(&request).context("serializing request failed")?;
            http_request
                .set("Content-Type", "application/json")
                .send_string(&buffer)
        } else {
            http_request.call()
        };

        if let Some(error) = http_response.synthetic_error() {
            return Err(anyhow!("request to {} failed: {}", url, error).into());
        }
        if http_response.error() {
            let error = parse_error(http_response);
            debug!(%url, status = error.status(), "request rejected");
            Err(error_handler(error))
        } else {
            let response_string = http_response.into_string().context("failed to turn response into string")?;
            let response = Ep::read_response_string(&response_string)
                .with_context(|| format!("deserializing response failed:\n{}", &response_string))?;
            let value = Ep::extract(response);
            Ok(value)
        }
    }
}

impl Client for Server {
    fn start_generation(&mut self) -> Result<(), TriggerError> {
        self.execute(StartGeneration {}, |error| {
            if error.is_unauthorized() {
                TriggerError::Unauthorized
            } else {
                TriggerError::Rejected(error)
            }
        })
    }

    fn generation_status(&mut self) -> Result<GenerationStatus, StatusError> {
        self.execute(GetGenerationStatus, |error| {
            if error.is_unauthorized() {
                StatusError::Unauthorized
            } else {
                StatusError::Rejected(error)
            }
        })
    }
}

trait Endpoint {
    const PATH: &'static str;
    const METHOD: fn(&str) -> ureq::Request;
    const SENDS_BODY: bool = true;

    type Response;
    type Value;

    fn extract(response: Self::Response) -> Self::Value;
}
trait VoidEndpoint {
    const PATH: &'static str;
    const METHOD: fn(&str) -> ureq::Request;
}
trait EndpointExt: Endpoint {
    fn read_response_string(response: &str) -> Result<Self::Response, Error>;
    fn write_request_string(request: &Self) -> Result<String, Error>;
}
impl<E> Endpoint for E
where
    E: VoidEndpoint,
{
    const PATH: &'static str = E::PATH;
    const METHOD: fn(&str) -> ureq::Request = E::METHOD;

    type Response = VoidResponse;
    type Value = ();

    fn extract(_response: Self::Response) -> Self::Value {}
}
impl<P, R, V> EndpointExt for P
where
    P: Serialize,
    R: DeserializeOwned,
    P: Endpoint<Response = R, Value = V>,
{
    fn read_response_string(response: &str) -> Result<Self::Response, Error> {
        // an empty body is fine for endpoints whose response is ignored
        let response = if response.trim().is_empty() { "null" } else { response };
        let response = serde_json::from_str::<'_, R>(response)?;
        Ok(response)
    }

    fn write_request_string(request: &Self) -> Result<String, Error> {
        Ok(serde_json::to_string(request)?)
    }
}

struct VoidResponse;
impl<'de> Deserialize<'de> for VoidResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        IgnoredAny::deserialize(deserializer)?;
        Ok(VoidResponse)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
struct StartGeneration {}
impl VoidEndpoint for StartGeneration {
    const PATH: &'static str = "timetable/generate";
    const METHOD: fn(&str) -> ureq::Request = ureq::post;
}

#[derive(Debug, Clone, Copy, Serialize)]
struct GetGenerationStatus;
impl Endpoint for GetGenerationStatus {
    const PATH: &'static str = "timetable/generation-status";
    const METHOD: fn(&str) -> ureq::Request = ureq::get;
    const SENDS_BODY: bool = false;
    type Response = GenerationStatus;
    type Value = GenerationStatus;

    fn extract(response: Self::Response) -> Self::Value {
        response
    }
}

#[cfg(test)]
mod tests {
    use super::{EndpointExt, GetGenerationStatus, RestErrorResponse, StartGeneration};

    #[test]
    fn parse_generation_status_response() {
        let response = r#"
        {
            "completed": true,
            "success_count": 1,
            "algorithms_completed": 3,
            "logs": [{ "message": "GA algorithm completed successfully" }]
        }
        "#;
        let parsed = GetGenerationStatus::read_response_string(response).unwrap();
        assert!(parsed.completed);
        assert_eq!(parsed.success_count, 1);
        assert_eq!(parsed.log_batch().len(), 1);
    }

    #[test]
    fn generate_response_is_ignored() {
        assert!(StartGeneration::read_response_string("").is_ok());
        assert!(StartGeneration::read_response_string(r#"{"timetables": [1, 2, 3]}"#).is_ok());
        assert_eq!(StartGeneration::write_request_string(&StartGeneration {}).unwrap(), "{}");
    }

    #[test]
    fn parse_error_body() {
        let parsed = serde_json::from_str::<RestErrorResponse>(r#"{"detail": "Invalid token"}"#).unwrap();
        assert_eq!(parsed.into_message().as_deref(), Some("Invalid token"));

        let parsed = serde_json::from_str::<RestErrorResponse>(r#"{"status": 500}"#).unwrap();
        assert!(parsed.into_message().is_none());
    }
}
