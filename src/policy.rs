//! Policy rules for event forwarding
//!
//! A rule is a conjunction of three checks (operation, resource,
//! namespace); each check is a disjunction over its list, and an empty
//! list matches everything. A policy matches an event when any of its
//! rules does.

use crate::error::ConfigError;
use crate::namespace;
use crate::types::{Operation, ResourceEvent};
use serde::{Deserialize, Serialize};

/// Resource kinds within one API group
///
/// Resource strings are compared exactly: `pods` does not match
/// `pods/log` and vice versa.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GroupResources {
    /// API group, empty for the core group
    #[serde(default, alias = "Group")]
    pub group: String,

    #[serde(default, alias = "Resources", skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,

    /// Instance names; only valid together with `resources`
    #[serde(default, alias = "ResourceNames", skip_serializing_if = "Vec::is_empty")]
    pub resource_names: Vec<String>,
}

impl GroupResources {
    /// Every resource in `group`
    pub fn group(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            ..Default::default()
        }
    }

    /// The listed resources in `group`
    pub fn new<I, S>(group: impl Into<String>, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group: group.into(),
            resources: resources.into_iter().map(Into::into).collect(),
            resource_names: Vec::new(),
        }
    }

    /// Restrict to the named instances
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn matches(&self, event: &ResourceEvent) -> bool {
        if self.group != event.api_group {
            return false;
        }

        if self.resources.is_empty() {
            return true;
        }

        if !self.resources.iter().any(|r| *r == event.resource_kind) {
            return false;
        }

        self.resource_names.is_empty()
            || self.resource_names.iter().any(|n| *n == event.resource_name)
    }
}

/// A single forwarding rule
///
/// Unknown keys are rejected so a misspelled scope cannot turn the rule
/// into one that matches everything. Capitalized field names are accepted
/// for configs written by older operator releases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PolicyRule {
    #[serde(
        default,
        alias = "operation",
        alias = "Operation",
        alias = "Operations",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub operations: Vec<Operation>,

    #[serde(default, alias = "Resources", skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<GroupResources>,

    /// `""` matches cluster-scoped resources
    #[serde(default, alias = "Namespaces", skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<String>,
}

impl PolicyRule {
    /// A rule matching every event
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_operations(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.operations = operations.into_iter().collect();
        self
    }

    pub fn with_resources(mut self, resources: impl IntoIterator<Item = GroupResources>) -> Self {
        self.resources = resources.into_iter().collect();
        self
    }

    pub fn with_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    pub fn matches(&self, event: &ResourceEvent) -> bool {
        self.matches_operation(event.operation)
            && self.matches_resource(event)
            && namespace::is_allowed(&self.namespaces, &event.namespace)
    }

    fn matches_operation(&self, operation: Operation) -> bool {
        self.operations.is_empty() || self.operations.contains(&operation)
    }

    fn matches_resource(&self, event: &ResourceEvent) -> bool {
        self.resources.is_empty() || self.resources.iter().any(|gr| gr.matches(event))
    }

    /// Reject `resourceNames` without `resources`; `index` labels the error
    pub fn validate(&self, index: usize) -> Result<(), ConfigError> {
        for gr in &self.resources {
            if gr.resources.is_empty() && !gr.resource_names.is_empty() {
                return Err(ConfigError::ResourceNamesWithoutResources {
                    rule: index,
                    group: gr.group.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Ordered rule list evaluated with OR semantics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Policy {
    pub rules: Vec<PolicyRule>,
}

impl Policy {
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True iff any rule matches; an empty policy matches nothing
    pub fn matches(&self, event: &ResourceEvent) -> bool {
        self.rules.iter().any(|rule| rule.matches(event))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rules
            .iter()
            .enumerate()
            .try_for_each(|(i, rule)| rule.validate(i))
    }
}

impl From<Vec<PolicyRule>> for Policy {
    fn from(rules: Vec<PolicyRule>) -> Self {
        Self::new(rules)
    }
}
