use futures::future::BoxFuture;
use thiserror::Error;

/// Failure to reach the light controller.
#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("light actuator unavailable: {0}")]
    Unavailable(String),
}

/// Turns controller lights on and off.
pub trait LightActuator: Send + Sync {
    fn set_lights(
        &self,
        controllers: Vec<usize>,
        on: bool,
    ) -> BoxFuture<'static, Result<(), ActuatorError>>;
}

/// Actuator used when no light controller is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLights;

impl LightActuator for NoopLights {
    fn set_lights(
        &self,
        _controllers: Vec<usize>,
        _on: bool,
    ) -> BoxFuture<'static, Result<(), ActuatorError>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(feature = "http-lights")]
pub use self::http::HttpLights;

#[cfg(feature = "http-lights")]
mod http {
    use std::{sync::Arc, time::Duration};

    use futures::future::BoxFuture;
    use reqwest::Client;
    use serde::Serialize;

    use super::{ActuatorError, LightActuator};

    const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

    #[derive(Serialize)]
    struct LightsBody<'a> {
        controllers: &'a [usize],
    }

    /// Light controller reached over HTTP: `POST {base}/on` or `{base}/off`.
    #[derive(Clone)]
    pub struct HttpLights {
        client: Client,
        base_url: Arc<str>,
    }

    impl HttpLights {
        pub fn new(base_url: &str) -> Result<Self, ActuatorError> {
            let client = Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .map_err(|err| ActuatorError::Unavailable(err.to_string()))?;
            Ok(Self {
                client,
                base_url: Arc::from(base_url.trim_end_matches('/')),
            })
        }

        pub(super) fn url(&self, on: bool) -> String {
            let action = if on { "on" } else { "off" };
            format!("{}/{action}", self.base_url)
        }
    }

    impl LightActuator for HttpLights {
        fn set_lights(
            &self,
            controllers: Vec<usize>,
            on: bool,
        ) -> BoxFuture<'static, Result<(), ActuatorError>> {
            let request = self
                .client
                .post(self.url(on))
                .json(&LightsBody {
                    controllers: &controllers,
                });
            Box::pin(async move {
                let response = request
                    .send()
                    .await
                    .map_err(|err| ActuatorError::Unavailable(err.to_string()))?;
                response
                    .error_for_status()
                    .map_err(|err| ActuatorError::Unavailable(err.to_string()))?;
                Ok(())
            })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn endpoints_follow_the_requested_state() {
            let lights = HttpLights::new("http://localhost:8001/").unwrap();
            assert_eq!(lights.url(true), "http://localhost:8001/on");
            assert_eq!(lights.url(false), "http://localhost:8001/off");
        }

        #[test]
        fn body_lists_controllers() {
            let json = serde_json::to_string(&LightsBody {
                controllers: &[0, 2],
            })
            .unwrap();
            assert_eq!(json, r#"{"controllers":[0,2]}"#);
        }
    }
}
