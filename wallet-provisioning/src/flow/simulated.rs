use super::{RequestConfiguration, SecureElementFlow};
use crate::{
    errors::flow_error::FlowError,
    models::challenge::{Challenge, DeviceInfo},
    relay::FlowDelegate,
};
use log::{error, info};
use rand::RngCore;
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct SimulatedFlowConfig {
    pub can_add: bool,
    pub platform_version: String,
    pub model: String,
    pub completion_timeout: Duration,
}

impl Default for SimulatedFlowConfig {
    fn default() -> Self {
        SimulatedFlowConfig {
            can_add: true,
            platform_version: "17.0".to_string(),
            model: "Simulator".to_string(),
            completion_timeout: Duration::from_secs(60),
        }
    }
}

/// Stand-in for the platform flow when no secure element is attached.
///
/// Presenting issues a random challenge right away and reports the pass as added
/// as soon as completion material arrives, or fails once the timeout runs out.
#[derive(Debug)]
pub struct SimulatedFlow {
    config: SimulatedFlowConfig,
    presented: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SimulatedFlow {
    pub fn new(config: SimulatedFlowConfig) -> Self {
        SimulatedFlow {
            config,
            presented: Arc::new(Mutex::new(None)),
        }
    }

    fn generate_challenge(device: DeviceInfo) -> Challenge {
        let mut rng = rand::rng();
        let mut random_bytes = |length: usize| {
            let mut bytes = vec![0; length];
            rng.fill_bytes(&mut bytes);
            bytes
        };

        Challenge {
            certificates: vec![random_bytes(256), random_bytes(256)],
            nonce: random_bytes(4),
            nonce_signature: random_bytes(64),
            device,
        }
    }
}

impl SecureElementFlow for SimulatedFlow {
    fn can_add_payment_pass(&self) -> bool {
        self.config.can_add
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            platform_version: self.config.platform_version.clone(),
            model: self.config.model.clone(),
        }
    }

    fn present(
        &self,
        configuration: RequestConfiguration,
        delegate: FlowDelegate,
    ) -> Result<(), FlowError> {
        if !self.config.can_add {
            return Err(FlowError::NotPresented(
                "secure element unavailable".to_string(),
            ));
        }

        let mut presented = self
            .presented
            .lock()
            .or(Err(FlowError::NotPresented("flow lock poisoned".to_string())))?;

        if presented.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Err(FlowError::NotPresented(
                "another flow is on screen".to_string(),
            ));
        }

        info!(
            "Presenting simulated flow ({})",
            configuration.encryption_scheme.as_str()
        );

        let challenge = Self::generate_challenge(self.device_info());
        let completion_timeout = self.config.completion_timeout;

        *presented = Some(tokio::spawn(async move {
            let Some(response) = delegate.request_challenge_response(challenge).await else {
                return;
            };

            let result = match tokio::time::timeout(completion_timeout, response).await {
                Ok(Ok(material)) => {
                    info!(
                        "Simulated secure element accepted {} bytes of pass data",
                        material.encrypted_pass_data.len()
                    );
                    Ok(())
                }
                Ok(Err(_)) => Err(FlowError::Cancelled),
                Err(_) => Err(FlowError::TimedOut),
            };

            delegate.finished(result).await;
        }));

        Ok(())
    }

    fn dismiss(&self) {
        let handle = match self.presented.lock() {
            Ok(mut presented) => presented.take(),
            Err(error) => {
                error!("Could not dismiss simulated flow: {error}");
                return;
            }
        };

        if let Some(handle) = handle {
            handle.abort();
        }
    }
}
