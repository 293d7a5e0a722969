//! Event routing: legacy category toggles composed with policy rules
//!
//! Both paths select the same receiver list. An event accepted by either
//! path yields each receiver once.

use crate::namespace::ForwarderSpec;
use crate::policy::Policy;
use crate::types::{Operation, Receiver, ResourceEvent};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Deprecated per-category forwarding switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyCategory {
    NodeAdded,
    StorageAdded,
    IngressAdded,
    WarningEvents,
    CsrEvents,
}

impl LegacyCategory {
    /// Map an event onto the legacy category that covers it, if any
    pub fn classify(event: &ResourceEvent) -> Option<Self> {
        let group = event.api_group.as_str();
        let kind = event.resource_kind.as_str();
        let created = event.operation == Operation::Create;

        match (group, kind) {
            ("certificates.k8s.io", "certificatesigningrequests") => Some(Self::CsrEvents),
            ("", "nodes") if created => Some(Self::NodeAdded),
            ("", "persistentvolumes" | "persistentvolumeclaims")
            | ("storage.k8s.io", "storageclasses")
                if created =>
            {
                Some(Self::StorageAdded)
            }
            ("extensions" | "networking.k8s.io", "ingresses") if created => {
                Some(Self::IngressAdded)
            }
            ("" | "events.k8s.io", "events")
                if created && event.event_type.as_deref() == Some("Warning") =>
            {
                Some(Self::WarningEvents)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NodeAdded => "nodeAdded",
            Self::StorageAdded => "storageAdded",
            Self::IngressAdded => "ingressAdded",
            Self::WarningEvents => "warningEvents",
            Self::CsrEvents => "csrEvents",
        }
    }
}

/// Which mechanism accepted an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch {
    pub legacy: Option<LegacyCategory>,
    pub policy: bool,
}

impl RouteMatch {
    pub fn is_match(&self) -> bool {
        self.legacy.is_some() || self.policy
    }
}

/// Event forwarding configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventForwarderSpec {
    #[serde(default)]
    pub node_added: ForwarderSpec,

    #[serde(default)]
    pub storage_added: ForwarderSpec,

    #[serde(default)]
    pub ingress_added: ForwarderSpec,

    #[serde(default)]
    pub warning_events: ForwarderSpec,

    #[serde(default)]
    pub csr_events: ForwarderSpec,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub receivers: Vec<Receiver>,

    #[serde(default)]
    pub rules: Policy,
}

impl EventForwarderSpec {
    pub fn forwarder(&self, category: LegacyCategory) -> &ForwarderSpec {
        match category {
            LegacyCategory::NodeAdded => &self.node_added,
            LegacyCategory::StorageAdded => &self.storage_added,
            LegacyCategory::IngressAdded => &self.ingress_added,
            LegacyCategory::WarningEvents => &self.warning_events,
            LegacyCategory::CsrEvents => &self.csr_events,
        }
    }

    /// Evaluate both mechanisms without selecting receivers
    pub fn evaluate(&self, event: &ResourceEvent) -> RouteMatch {
        let legacy = LegacyCategory::classify(event)
            .filter(|category| self.forwarder(*category).is_allowed(&event.namespace));

        RouteMatch {
            legacy,
            policy: self.rules.matches(event),
        }
    }

    /// Receivers for `event`, each at most once, in configuration order
    pub fn route(&self, event: &ResourceEvent) -> Vec<Receiver> {
        let decision = self.evaluate(event);

        tracing::debug!(
            operation = %event.operation,
            group = %event.api_group,
            kind = %event.resource_kind,
            name = %event.resource_name,
            namespace = %event.namespace,
            legacy = ?decision.legacy.map(|c| c.as_str()),
            policy = decision.policy,
            "Routed event"
        );

        if !decision.is_match() {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        self.receivers
            .iter()
            .filter(|receiver| seen.insert(*receiver))
            .cloned()
            .collect()
    }
}
