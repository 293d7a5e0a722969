//! Namespace allow-lists
//!
//! An empty allow-list admits every namespace. The empty string stands
//! for cluster-scoped resources and can be listed explicitly.

use serde::{Deserialize, Serialize};

/// Returns true iff `allow_list` is empty or contains `ns`
pub fn is_allowed<S: AsRef<str>>(allow_list: &[S], ns: &str) -> bool {
    allow_list.is_empty() || allow_list.iter().any(|allowed| allowed.as_ref() == ns)
}

/// Legacy per-category forwarding toggle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwarderSpec {
    #[serde(default)]
    pub handle: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<String>,
}

impl ForwarderSpec {
    /// Forward events from every namespace
    pub fn enabled() -> Self {
        Self {
            handle: true,
            namespaces: Vec::new(),
        }
    }

    /// Forward events from the listed namespaces only
    pub fn for_namespaces<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            handle: true,
            namespaces: namespaces.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_allowed(&self, ns: &str) -> bool {
        self.handle && is_allowed(&self.namespaces, ns)
    }
}
