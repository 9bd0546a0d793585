//! Group/version/resource and group/version/kind identities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An API group at a specific version, e.g. `example.com/v1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersion {
    /// API group name. Empty for the legacy core group.
    pub group: String,
    /// Version within the group.
    pub version: String,
}

impl GroupVersion {
    /// Builds a group/version pair.
    #[must_use]
    pub fn new(group: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
        }
    }

    /// Renders the `apiVersion` form: `group/version`, or `version` alone for
    /// the core group.
    #[must_use]
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Path prefix under which the group's resources are served.
    #[must_use]
    pub fn path_prefix(&self) -> String {
        format!("/apis/{}/{}", self.group, self.version)
    }

    /// Names a resource within this group/version.
    #[must_use]
    pub fn with_resource(&self, resource: impl Into<String>) -> GroupVersionResource {
        GroupVersionResource {
            group: self.group.clone(),
            version: self.version.clone(),
            resource: resource.into(),
        }
    }

    /// Names a kind within this group/version.
    #[must_use]
    pub fn with_kind(&self, kind: impl Into<String>) -> GroupVersionKind {
        GroupVersionKind {
            group: self.group.clone(),
            version: self.version.clone(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for GroupVersion {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.api_version())
    }
}

/// Identity of a resource collection (the plural name used in URLs).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersionResource {
    /// API group name.
    pub group: String,
    /// API version.
    pub version: String,
    /// Plural resource name, e.g. `widgets`.
    pub resource: String,
}

impl GroupVersionResource {
    /// Builds a resource identity.
    #[must_use]
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            resource: resource.into(),
        }
    }

    /// Group/version half of the identity.
    #[must_use]
    pub fn group_version(&self) -> GroupVersion {
        GroupVersion::new(self.group.clone(), self.version.clone())
    }
}

impl fmt::Display for GroupVersionResource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(formatter, "{}/{}", self.version, self.resource)
        } else {
            write!(
                formatter,
                "{}.{}.{}",
                self.resource, self.version, self.group
            )
        }
    }
}

/// Identity of a serialized type, stamped into `apiVersion`/`kind`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersionKind {
    /// API group name.
    pub group: String,
    /// API version.
    pub version: String,
    /// Kind name, e.g. `Widget` or `WidgetList`.
    pub kind: String,
}

impl GroupVersionKind {
    /// Builds a kind identity.
    #[must_use]
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// The `apiVersion` field value for this kind.
    #[must_use]
    pub fn api_version(&self) -> String {
        GroupVersion::new(self.group.clone(), self.version.clone()).api_version()
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}, Kind={}", self.api_version(), self.kind)
    }
}
