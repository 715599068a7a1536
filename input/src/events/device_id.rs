// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::DeviceClass;
use serde::{Serialize, Serializer};
use std::{fmt::{Display, Formatter},
          path::Path,
          sync::Arc};

/// Stable device identifier derived from the node path (e.g. `/dev/input/event2`).
/// Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(Arc<str>);

impl DeviceId {
    #[must_use]
    pub fn as_str(&self) -> &str { &self.0 }

    /// Node name without the directory, e.g. `event2`.
    #[must_use]
    pub fn node_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(it: &str) -> Self { Self(Arc::from(it)) }
}

impl From<String> for DeviceId {
    fn from(it: String) -> Self { Self(Arc::from(it)) }
}

impl From<&Path> for DeviceId {
    fn from(it: &Path) -> Self { Self(Arc::from(it.to_string_lossy().as_ref())) }
}

impl Display for DeviceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(&self.0) }
}

impl Serialize for DeviceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// What an event says about its source device: the id and the class it was decoded as.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceRef {
    pub id: DeviceId,
    pub class: DeviceClass,
}

impl DeviceRef {
    #[must_use]
    pub fn new(id: impl Into<DeviceId>, class: DeviceClass) -> Self {
        Self {
            id: id.into(),
            class,
        }
    }
}

impl Display for DeviceRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.id, self.class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_name_strips_directory() {
        assert_eq!(DeviceId::from("/dev/input/event7").node_name(), "event7");
        assert_eq!(DeviceId::from("replay").node_name(), "replay");
    }
}
