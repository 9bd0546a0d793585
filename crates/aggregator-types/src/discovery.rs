//! Discovery documents served from `/apis` and the group/version prefix.

use serde::{Deserialize, Serialize};

/// Response body of `GET /apis`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGroupList {
    /// Always `APIGroupList`.
    pub kind: String,
    /// Always `v1`.
    pub api_version: String,
    /// Served groups.
    pub groups: Vec<ApiGroup>,
}

impl ApiGroupList {
    /// Wraps a set of groups.
    #[must_use]
    pub fn new(groups: Vec<ApiGroup>) -> Self {
        Self {
            kind: "APIGroupList".to_owned(),
            api_version: "v1".to_owned(),
            groups,
        }
    }
}

/// One served API group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGroup {
    /// Group name.
    pub name: String,
    /// Served versions.
    pub versions: Vec<GroupVersionForDiscovery>,
    /// Version clients should prefer.
    pub preferred_version: GroupVersionForDiscovery,
}

impl ApiGroup {
    /// Describes a group served at a single version.
    #[must_use]
    pub fn single_version(group: &str, version: &str) -> Self {
        let entry = GroupVersionForDiscovery::new(group, version);
        Self {
            name: group.to_owned(),
            versions: vec![entry.clone()],
            preferred_version: entry,
        }
    }
}

/// A version entry in an [`ApiGroup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupVersionForDiscovery {
    /// `group/version`.
    pub group_version: String,
    /// Bare version.
    pub version: String,
}

impl GroupVersionForDiscovery {
    /// Builds an entry for `group` at `version`.
    #[must_use]
    pub fn new(group: &str, version: &str) -> Self {
        Self {
            group_version: format!("{group}/{version}"),
            version: version.to_owned(),
        }
    }
}

/// Response body of `GET /apis/{group}/{version}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResourceList {
    /// Always `APIResourceList`.
    pub kind: String,
    /// Always `v1`.
    pub api_version: String,
    /// `group/version` being described.
    pub group_version: String,
    /// Served resources, in registration order.
    pub resources: Vec<ApiResource>,
}

impl ApiResourceList {
    /// Builds the list for `group_version`.
    #[must_use]
    pub fn new(group_version: impl Into<String>, resources: Vec<ApiResource>) -> Self {
        Self {
            kind: "APIResourceList".to_owned(),
            api_version: "v1".to_owned(),
            group_version: group_version.into(),
            resources,
        }
    }
}

/// Discovery description of one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResource {
    /// Plural name.
    pub name: String,
    /// Singular name.
    pub singular_name: String,
    /// Whether the resource lives inside namespaces.
    pub namespaced: bool,
    /// Group override, when it differs from the served group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Version override, when it differs from the served version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Object kind.
    pub kind: String,
    /// Supported verbs.
    pub verbs: Vec<String>,
    /// Abbreviations usable on the command line.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub short_names: Vec<String>,
    /// Groupings such as `all`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}
