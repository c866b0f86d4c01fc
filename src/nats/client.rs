use anyhow::{Context, Result};
use async_nats::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }

    /// Publish a JSON-encoded message
    pub async fn publish_json<T: Serialize>(&self, subject: String, message: &T) -> Result<()> {
        let payload = serde_json::to_vec(message).context("Failed to encode NATS message")?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .with_context(|| format!("Failed to publish to {}", subject))?;

        debug!("Published to {}", subject);
        Ok(())
    }

    /// Publish from a synchronous context (engine `stop`/`cancel`).
    ///
    /// Fire-and-forget: the publish runs on the current runtime and failures
    /// are only logged.
    pub fn publish_json_detached<T: Serialize>(&self, subject: String, message: &T) {
        let payload = match serde_json::to_vec(message) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to encode NATS message for {}: {}", subject, e);
                return;
            }
        };

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("No runtime available to publish to {}", subject);
            return;
        };

        let client = self.client.clone();
        handle.spawn(async move {
            if let Err(e) = client.publish(subject.clone(), payload.into()).await {
                warn!("Failed to publish to {}: {}", subject, e);
            }
        });
    }

    pub async fn subscribe(&self, subject: String) -> Result<async_nats::Subscriber> {
        info!("Subscribing to {}", subject);

        let subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .with_context(|| format!("Failed to subscribe to {}", subject))?;

        Ok(subscriber)
    }
}
