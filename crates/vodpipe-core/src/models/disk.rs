use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiskKind {
    Local,
    ObjectStore,
}

impl Display for DiskKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DiskKind::Local => write!(f, "local"),
            DiskKind::ObjectStore => write!(f, "object_store"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiskVisibility {
    #[default]
    Public,
    Private,
}

/// Connection settings for one named storage target.
///
/// Which of the optional parameter groups must be present depends on `kind`;
/// `validate` enforces that. Credentials for object stores come from the
/// process environment (AWS_ACCESS_KEY_ID and friends), not from here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiskSettings {
    pub name: String,
    pub kind: DiskKind,
    pub visibility: DiskVisibility,
    // Local disk parameters
    pub root: Option<String>,
    pub base_url: Option<String>,
    // Object store parameters
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>, // Custom endpoint for S3-compatible providers
}

impl DiskSettings {
    pub fn local(name: &str, root: &str, base_url: &str) -> Self {
        DiskSettings {
            name: name.to_string(),
            kind: DiskKind::Local,
            visibility: DiskVisibility::Public,
            root: Some(root.to_string()),
            base_url: Some(base_url.to_string()),
            bucket: None,
            region: None,
            endpoint: None,
        }
    }

    pub fn object_store(name: &str, bucket: &str, region: &str) -> Self {
        DiskSettings {
            name: name.to_string(),
            kind: DiskKind::ObjectStore,
            visibility: DiskVisibility::Public,
            root: None,
            base_url: None,
            bucket: Some(bucket.to_string()),
            region: Some(region.to_string()),
            endpoint: None,
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.name.trim().is_empty() {
            return Err(anyhow::anyhow!("disk name cannot be empty"));
        }
        match self.kind {
            DiskKind::Local => {
                if self.root.is_none() {
                    return Err(anyhow::anyhow!(
                        "DISK_{}_ROOT must be set for local disk '{}'",
                        self.name.to_uppercase(),
                        self.name
                    ));
                }
                if self.base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "DISK_{}_BASE_URL must be set for local disk '{}'",
                        self.name.to_uppercase(),
                        self.name
                    ));
                }
            }
            DiskKind::ObjectStore => {
                if self.bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "DISK_{}_BUCKET must be set for object store disk '{}'",
                        self.name.to_uppercase(),
                        self.name
                    ));
                }
                if self.region.is_none() {
                    return Err(anyhow::anyhow!(
                        "DISK_{}_REGION must be set for object store disk '{}'",
                        self.name.to_uppercase(),
                        self.name
                    ));
                }
            }
        }
        Ok(())
    }
}
