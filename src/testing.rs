//! Mock implementations for testing
//!
//! These mocks enable dispatcher tests without real I/O.

use crate::connector::{
    Activity, ConnectorError, ConnectorService, ConversationParameters,
    ConversationResourceResponse, ResourceResponse,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Mock connector that replays queued errors and records every call
pub struct MockConnector {
    trusted: AtomicBool,
    errors: Mutex<VecDeque<ConnectorError>>,
    /// `(conversation_id, activity)` per send attempt
    pub sends: Mutex<Vec<(String, Activity)>>,
    pub creates: Mutex<Vec<ConversationParameters>>,
    /// Calls made before `trust_endpoint`
    pub untrusted_calls: Mutex<usize>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self {
            trusted: AtomicBool::new(false),
            errors: Mutex::new(VecDeque::new()),
            sends: Mutex::new(Vec::new()),
            creates: Mutex::new(Vec::new()),
            untrusted_calls: Mutex::new(0),
        }
    }

    /// Fail the next call with this error; calls past the queue succeed
    pub fn queue_error(&self, error: ConnectorError) {
        self.errors.lock().unwrap().push_back(error);
    }

    pub fn recorded_sends(&self) -> Vec<(String, Activity)> {
        self.sends.lock().unwrap().clone()
    }

    pub fn recorded_creates(&self) -> Vec<ConversationParameters> {
        self.creates.lock().unwrap().clone()
    }

    pub fn is_trusted(&self) -> bool {
        self.trusted.load(Ordering::SeqCst)
    }

    fn check_trust(&self) {
        if !self.is_trusted() {
            *self.untrusted_calls.lock().unwrap() += 1;
        }
    }

    fn next_error(&self) -> Option<ConnectorError> {
        self.errors.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl ConnectorService for MockConnector {
    fn trust_endpoint(&self) {
        self.trusted.store(true, Ordering::SeqCst);
    }

    async fn send_to_conversation(
        &self,
        conversation_id: &str,
        activity: &Activity,
    ) -> Result<ResourceResponse, ConnectorError> {
        self.check_trust();
        self.sends
            .lock()
            .unwrap()
            .push((conversation_id.to_string(), activity.clone()));
        match self.next_error() {
            Some(e) => Err(e),
            None => Ok(ResourceResponse {
                id: format!("activity-{}", self.sends.lock().unwrap().len()),
            }),
        }
    }

    async fn create_conversation(
        &self,
        params: &ConversationParameters,
    ) -> Result<ConversationResourceResponse, ConnectorError> {
        self.check_trust();
        self.creates.lock().unwrap().push(params.clone());
        match self.next_error() {
            Some(e) => Err(e),
            None => Ok(ConversationResourceResponse {
                id: format!("{};messageid=1", params.channel_id().unwrap_or_default()),
                activity_id: Some("1".to_string()),
                service_url: None,
            }),
        }
    }

    fn service_url(&self) -> &str {
        "https://smba.example.test/"
    }
}
