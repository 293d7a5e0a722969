//! Event forwarder built on pluggable notifiers
//!
//! `EventForwarder` routes each event through the forwarding policy and
//! hands every selected receiver to the notifier registered under the
//! receiver's key. Delivery failures are logged and do not stop the
//! remaining deliveries.

use crate::provider::Notifier;
use crate::routing::EventForwarderSpec;
use crate::types::{Receiver, ResourceEvent};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;

pub struct EventForwarder {
    spec: EventForwarderSpec,

    /// Registered notifiers (notifier key → implementation)
    notifiers: HashMap<String, Arc<dyn Notifier>>,
}

impl EventForwarder {
    pub fn new(spec: EventForwarderSpec) -> Self {
        Self {
            spec,
            notifiers: HashMap::new(),
        }
    }

    /// Register a notifier under its own name, replacing any previous one
    pub fn register(&mut self, notifier: impl Notifier + 'static) -> &mut Self {
        let notifier: Arc<dyn Notifier> = Arc::new(notifier);
        self.notifiers.insert(notifier.name().to_string(), notifier);
        self
    }

    pub fn spec(&self) -> &EventForwarderSpec {
        &self.spec
    }

    /// Receivers the policy selects for `event`, without delivering
    pub fn receivers(&self, event: &ResourceEvent) -> Vec<Receiver> {
        self.spec.route(event)
    }

    /// Route `event` and deliver it; returns the receivers that accepted it
    pub async fn forward(&self, event: &ResourceEvent) -> Vec<Receiver> {
        let receivers = self.spec.route(event);
        if receivers.is_empty() {
            return receivers;
        }

        let deliveries = receivers.into_iter().map(|receiver| async move {
            let notifier = match self.notifiers.get(&receiver.notifier) {
                Some(notifier) => notifier,
                None => {
                    tracing::warn!(
                        notifier = %receiver.notifier,
                        "No notifier registered for receiver"
                    );
                    return None;
                }
            };

            match notifier.notify(&receiver, event).await {
                Ok(()) => Some(receiver),
                Err(e) => {
                    tracing::warn!(
                        notifier = %receiver.notifier,
                        to = ?receiver.to,
                        error = %e,
                        "Failed to deliver event"
                    );
                    None
                }
            }
        });

        let delivered: Vec<Receiver> = join_all(deliveries).await.into_iter().flatten().collect();

        tracing::debug!(
            kind = %event.resource_kind,
            name = %event.resource_name,
            delivered = delivered.len(),
            "Event forwarded"
        );

        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::ForwarderSpec;
    use crate::policy::{Policy, PolicyRule};
    use crate::provider::memory::MemoryNotifier;
    use crate::types::Operation;

    fn spec() -> EventForwarderSpec {
        EventForwarderSpec {
            csr_events: ForwarderSpec::enabled(),
            receivers: vec![
                Receiver::new("mailgun", ["ops@example.com"]),
                Receiver::new("slack", ["#alerts"]),
            ],
            rules: Policy::new(vec![PolicyRule::any().with_operations([Operation::Delete])]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_forward_to_registered_notifiers() {
        let mail = MemoryNotifier::new("mailgun");
        let chat = MemoryNotifier::new("slack");
        let mut forwarder = EventForwarder::new(spec());
        forwarder.register(mail.clone()).register(chat.clone());

        let event = ResourceEvent::deleted("", "secrets", "db", "prod");
        let delivered = forwarder.forward(&event).await;

        assert_eq!(delivered.len(), 2);
        assert_eq!(mail.deliveries().await.len(), 1);
        assert_eq!(chat.deliveries().await[0].event, event);
    }

    #[tokio::test]
    async fn test_unmatched_event_not_delivered() {
        let mail = MemoryNotifier::new("mailgun");
        let mut forwarder = EventForwarder::new(spec());
        forwarder.register(mail.clone());

        let delivered = forwarder
            .forward(&ResourceEvent::created("", "secrets", "db", "prod"))
            .await;
        assert!(delivered.is_empty());
        assert!(mail.deliveries().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_or_failing_notifier_is_skipped() {
        let mail = MemoryNotifier::new("mailgun");
        mail.fail_for("ops@example.com").await;
        let mut forwarder = EventForwarder::new(spec());
        forwarder.register(mail.clone());

        let event = ResourceEvent::created("certificates.k8s.io", "certificatesigningrequests", "csr-1", "");
        assert_eq!(forwarder.receivers(&event).len(), 2);

        let delivered = forwarder.forward(&event).await;
        assert!(delivered.is_empty());
    }
}
