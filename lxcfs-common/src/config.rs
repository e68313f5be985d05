use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use lxcfs_macros::{logger, lxcfs_debug, lxcfs_info, lxcfs_log, with_dollar_sign};
use serde::Deserialize;

use crate::annotations::{LXCFS_INJECTOR_ANNOTATION_INJECT, LXCFS_INJECTOR_ANNOTATION_STATUS};
use crate::constants::{LXCFS_DEFAULT_ANNOTATION_REQUIRED, LXCFS_DEFAULT_NAMESPACE};
use crate::errors::InjectorError;
use crate::sidecar::SidecarSpecification;

logger!("Config");

fn default_annotation() -> String {
    LXCFS_INJECTOR_ANNOTATION_INJECT.to_string()
}

fn default_annotation_required() -> bool {
    LXCFS_DEFAULT_ANNOTATION_REQUIRED
}

fn default_namespace() -> String {
    LXCFS_DEFAULT_NAMESPACE.to_string()
}

/// Webhook configuration as read from the sidecar configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebhookConfig {
    #[serde(default = "default_annotation")]
    pub annotation: String,
    #[serde(rename = "requireAnnotation", default = "default_annotation_required")]
    pub require_annotation: bool,
    /// Advisory only, nothing in the mutation depends on it.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(rename = "sidecarConfig", default)]
    pub sidecar_config: SidecarSpecification,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        WebhookConfig {
            annotation: default_annotation(),
            require_annotation: default_annotation_required(),
            namespace: default_namespace(),
            sidecar_config: SidecarSpecification::default(),
        }
    }
}

impl WebhookConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, InjectorError> {
        match path {
            None => {
                info!("No sidecar config file given, using defaults");
                Ok(WebhookConfig::default())
            }
            Some(path) => {
                info!("Loading sidecar config from {}", path.display());
                let file = File::open(path).map_err(InjectorError::from_error(&format!(
                    "Unable to open sidecar config file {}",
                    path.display()
                )))?;
                let config: WebhookConfig = serde_yaml::from_reader(BufReader::new(file))
                    .map_err(InjectorError::from_error("Unable to parse sidecar config"))?;
                debug!("Sidecar config: {:?}", config);
                Ok(config)
            }
        }
    }

    pub fn policy(&self) -> MutationPolicy {
        MutationPolicy {
            annotation_key: self.annotation.clone(),
            annotation_required: self.require_annotation,
            status_annotation_key: LXCFS_INJECTOR_ANNOTATION_STATUS.to_string(),
        }
    }
}

/// Decides which annotation gates a mutation and which one marks it done.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationPolicy {
    pub annotation_key: String,
    pub annotation_required: bool,
    pub status_annotation_key: String,
}

impl Default for MutationPolicy {
    fn default() -> Self {
        WebhookConfig::default().policy()
    }
}
