//! Shared fixtures: a scriptable secure-element flow and a mock merchant backend.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use serde_json::{Value, json};
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::{
    net::TcpListener,
    sync::{broadcast, oneshot},
};
use wallet_provisioning::{
    backend::BackendClient,
    commands::CommandSurface,
    errors::flow_error::FlowError,
    flow::{RequestConfiguration, SecureElementFlow},
    models::{
        challenge::{Challenge, ChallengePayload, DeviceInfo},
        completion_material::CompletionMaterial,
    },
    notifier::{Notifier, ProvisioningEvent},
    relay::FlowDelegate,
    session_store::SessionStore,
};

/// Flow double: records what the surface asks of it and lets the test fire callbacks.
#[derive(Default)]
pub struct ManualFlow {
    unsupported: AtomicBool,
    refuse_present: AtomicBool,
    presented: AtomicUsize,
    dismissed: AtomicUsize,
    delegate: Mutex<Option<FlowDelegate>>,
    configurations: Mutex<Vec<RequestConfiguration>>,
}

impl ManualFlow {
    pub fn set_supported(&self, supported: bool) {
        self.unsupported.store(!supported, Ordering::SeqCst);
    }

    pub fn refuse_present(&self) {
        self.refuse_present.store(true, Ordering::SeqCst);
    }

    pub fn presented(&self) -> usize {
        self.presented.load(Ordering::SeqCst)
    }

    pub fn dismissed(&self) -> usize {
        self.dismissed.load(Ordering::SeqCst)
    }

    pub fn configurations(&self) -> Vec<RequestConfiguration> {
        self.configurations.lock().unwrap().clone()
    }

    fn delegate(&self) -> FlowDelegate {
        self.delegate
            .lock()
            .unwrap()
            .clone()
            .expect("flow was never presented")
    }

    pub async fn deliver_challenge(&self) -> Option<oneshot::Receiver<CompletionMaterial>> {
        self.delegate()
            .request_challenge_response(sample_challenge())
            .await
    }

    pub async fn finish(&self, result: Result<(), FlowError>) {
        self.delegate().finished(result).await;
    }
}

impl SecureElementFlow for ManualFlow {
    fn can_add_payment_pass(&self) -> bool {
        !self.unsupported.load(Ordering::SeqCst)
    }

    fn device_info(&self) -> DeviceInfo {
        sample_device()
    }

    fn present(
        &self,
        configuration: RequestConfiguration,
        delegate: FlowDelegate,
    ) -> Result<(), FlowError> {
        if self.refuse_present.load(Ordering::SeqCst) {
            return Err(FlowError::NotPresented("no view controller".to_string()));
        }

        self.presented.fetch_add(1, Ordering::SeqCst);
        self.configurations.lock().unwrap().push(configuration);
        *self.delegate.lock().unwrap() = Some(delegate);
        Ok(())
    }

    fn dismiss(&self) {
        self.dismissed.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn sample_device() -> DeviceInfo {
    DeviceInfo {
        platform_version: "17.4".to_string(),
        model: "iPhone".to_string(),
    }
}

pub fn sample_challenge() -> Challenge {
    Challenge {
        certificates: vec![b"leaf".to_vec(), b"intermediate".to_vec()],
        nonce: vec![1, 2, 3, 4],
        nonce_signature: vec![5, 6, 7, 8],
        device: sample_device(),
    }
}

pub fn valid_material() -> Value {
    json!({
        "activationData": "YWN0",
        "encryptedPassData": "cGFzcw==",
        "ephemeralPublicKey": "a2V5"
    })
}

pub fn decoded_material() -> CompletionMaterial {
    CompletionMaterial {
        activation_data: b"act".to_vec(),
        encrypted_pass_data: b"pass".to_vec(),
        ephemeral_public_key: b"key".to_vec(),
    }
}

pub fn completion_args(session_id: &str, material: Value) -> Value {
    let mut args = material;
    args["sessionId"] = Value::String(session_id.to_string());
    args
}

pub struct Harness {
    pub surface: CommandSurface,
    pub store: SessionStore,
    pub flow: Arc<ManualFlow>,
    pub events: broadcast::Receiver<ProvisioningEvent>,
}

pub fn harness() -> Harness {
    let flow = Arc::new(ManualFlow::default());
    let dyn_flow: Arc<dyn SecureElementFlow> = flow.clone();
    let store = SessionStore::spawn();
    let notifier = Notifier::new(32);
    let events = notifier.subscribe();

    let surface = CommandSurface::new(
        store.clone(),
        notifier,
        dyn_flow,
        BackendClient::new(),
        Duration::from_secs(5),
    );

    Harness {
        surface,
        store,
        flow,
        events,
    }
}

pub async fn next_event(events: &mut broadcast::Receiver<ProvisioningEvent>) -> ProvisioningEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("event in time")
        .expect("event channel open")
}

struct MockState {
    status: StatusCode,
    reply: Value,
    delay: Duration,
    received: Mutex<Vec<(ChallengePayload, HeaderMap)>>,
}

/// Merchant backend answering every challenge with a fixed reply.
pub struct MockBackend {
    pub url: String,
    state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start(status: StatusCode, reply: Value, delay: Duration) -> Self {
        let state = Arc::new(MockState {
            status,
            reply,
            delay,
            received: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/provision", post(provision))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockBackend {
            url: format!("http://{address}/provision"),
            state,
        }
    }

    pub fn received(&self) -> Vec<(ChallengePayload, HeaderMap)> {
        self.state.received.lock().unwrap().clone()
    }
}

async fn provision(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(payload): Json<ChallengePayload>,
) -> (StatusCode, Json<Value>) {
    state.received.lock().unwrap().push((payload, headers));
    tokio::time::sleep(state.delay).await;
    (state.status, Json(state.reply.clone()))
}
