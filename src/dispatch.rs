//! Message dispatch: one outbound connector call per command, run through
//! the resilience policy

use crate::connector::{
    Activity, ConnectorError, ConnectorService, ConversationParameters,
    ConversationResourceResponse, Message, ResourceResponse,
};
use crate::resilience::ExecutionPolicy;
use std::sync::Arc;

pub struct Dispatcher<P> {
    connector: Arc<dyn ConnectorService>,
    policy: Arc<P>,
}

impl<P: ExecutionPolicy> Dispatcher<P> {
    pub fn new(connector: Arc<dyn ConnectorService>, policy: Arc<P>) -> Self {
        Self { connector, policy }
    }

    /// Post a message into a user conversation or an existing channel thread.
    pub async fn send_to_conversation(
        &self,
        conversation_id: &str,
        message: &Message,
    ) -> Result<ResourceResponse, ConnectorError> {
        let activity = Activity::from_message(message);
        self.connector.trust_endpoint();

        tracing::info!(conversation_id, notify = activity.notifies(), "Sending message");
        let connector = &self.connector;
        let activity = &activity;
        self.policy
            .execute(&move || connector.send_to_conversation(conversation_id, activity))
            .await
    }

    /// Start a new thread in a channel with the message as its first post.
    pub async fn create_thread(
        &self,
        channel_id: &str,
        message: &Message,
    ) -> Result<ConversationResourceResponse, ConnectorError> {
        let params =
            ConversationParameters::channel_thread(channel_id, Activity::from_message(message));
        self.connector.trust_endpoint();

        tracing::info!(channel_id, "Creating channel thread");
        let connector = &self.connector;
        let params = &params;
        self.policy
            .execute(&move || connector.create_conversation(params))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicyConfig;
    use crate::connector::ConnectorErrorKind;
    use crate::resilience::{compose, Jitter, ResiliencePolicy};
    use crate::testing::MockConnector;
    use std::time::Duration;
    use tokio::time::Instant;

    fn dispatcher(connector: &Arc<MockConnector>) -> Dispatcher<ResiliencePolicy> {
        let policy = compose(
            &PolicyConfig::default(),
            Jitter::seeded(Duration::from_millis(1000), 3),
        );
        Dispatcher::new(connector.clone(), Arc::new(policy))
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_user_message_makes_one_call() {
        let connector = Arc::new(MockConnector::new());
        let dispatcher = dispatcher(&connector);

        let resp = dispatcher
            .send_to_conversation("19:abc@thread", &Message::text("hello"))
            .await
            .unwrap();

        assert_eq!(resp.id, "activity-1");
        let sends = connector.recorded_sends();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].0, "19:abc@thread");
        assert_eq!(sends[0].1.text, "hello");
        assert!(!sends[0].1.notifies());
        assert!(connector.recorded_creates().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_endpoint_trusted_before_call() {
        let connector = Arc::new(MockConnector::new());
        let dispatcher = dispatcher(&connector);

        dispatcher
            .create_thread("19:channel@thread", &Message::text("kickoff"))
            .await
            .unwrap();

        assert!(connector.is_trusted());
        assert_eq!(*connector.untrusted_calls.lock().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notify_flag_reaches_activity() {
        let connector = Arc::new(MockConnector::new());
        let dispatcher = dispatcher(&connector);

        dispatcher
            .send_to_conversation(
                "19:thread@thread;messageid=9",
                &Message::text("ping").with_notify(true),
            )
            .await
            .unwrap();

        assert!(connector.recorded_sends()[0].1.notifies());
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_429s_then_success() {
        let connector = Arc::new(MockConnector::new());
        for _ in 0..3 {
            connector.queue_error(ConnectorError::rate_limited("Too Many Requests"));
        }
        let dispatcher = dispatcher(&connector);
        let started = Instant::now();

        let resp = dispatcher
            .send_to_conversation("19:abc@thread", &Message::text("hello"))
            .await
            .unwrap();

        assert_eq!(resp.id, "activity-4");
        assert_eq!(connector.recorded_sends().len(), 4);
        assert!(started.elapsed() >= Duration::from_secs(14));
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_thread_scoped_to_channel() {
        let connector = Arc::new(MockConnector::new());
        let dispatcher = dispatcher(&connector);

        let resp = dispatcher
            .create_thread("19:channel@thread", &Message::text("kickoff"))
            .await
            .unwrap();

        assert_eq!(resp.id, "19:channel@thread;messageid=1");
        let creates = connector.recorded_creates();
        assert_eq!(creates.len(), 1);
        assert!(creates[0].is_group);
        assert_eq!(creates[0].channel_id(), Some("19:channel@thread"));
        assert_eq!(creates[0].activity.text, "kickoff");
        assert!(connector.recorded_sends().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_failure_propagates_without_retry() {
        let connector = Arc::new(MockConnector::new());
        connector.queue_error(ConnectorError::auth("Authentication failed"));
        let dispatcher = dispatcher(&connector);

        let err = dispatcher
            .send_to_conversation("19:abc@thread", &Message::text("hello"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ConnectorErrorKind::Auth);
        assert_eq!(connector.recorded_sends().len(), 1);
    }
}
