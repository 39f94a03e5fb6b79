//! Host permissions required before the engine can use the camera

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::FacelensError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Internet,
    Camera,
    ReadExternalStorage,
    WriteExternalStorage,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Internet => "internet",
            Permission::Camera => "camera",
            Permission::ReadExternalStorage => "read_external_storage",
            Permission::WriteExternalStorage => "write_external_storage",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered set of permissions requested together
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionSet(Vec<Permission>);

impl PermissionSet {
    pub fn new(permissions: impl IntoIterator<Item = Permission>) -> Self {
        let mut set = Vec::new();
        for permission in permissions {
            if !set.contains(&permission) {
                set.push(permission);
            }
        }
        PermissionSet(set)
    }

    /// Network access, camera, storage read, storage write
    pub fn required() -> Self {
        Self::new([
            Permission::Internet,
            Permission::Camera,
            Permission::ReadExternalStorage,
            Permission::WriteExternalStorage,
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for PermissionSet {
    fn default() -> Self {
        Self::required()
    }
}

/// Outcome of a permission request, per permission
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PermissionGrants {
    pub granted: Vec<Permission>,
    pub denied: Vec<Permission>,
}

impl PermissionGrants {
    pub fn all_granted(set: &PermissionSet) -> Self {
        PermissionGrants {
            granted: set.iter().collect(),
            denied: Vec::new(),
        }
    }

    pub fn denying(set: &PermissionSet, denied: &[Permission]) -> Self {
        PermissionGrants {
            granted: set.iter().filter(|p| !denied.contains(p)).collect(),
            denied: set.iter().filter(|p| denied.contains(p)).collect(),
        }
    }

    pub fn is_denied(&self, permission: Permission) -> bool {
        self.denied.contains(&permission)
    }

    /// One `PermissionDenied` per refused permission
    pub fn denials(&self) -> impl Iterator<Item = FacelensError> + '_ {
        self.denied.iter().copied().map(FacelensError::PermissionDenied)
    }
}
