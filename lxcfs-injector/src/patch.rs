use std::collections::BTreeMap;

use json_patch::{AddOperation, Patch, PatchOperation, ReplaceOperation};
use k8s_openapi::api::core::v1::{Container, Volume};
use lxcfs_common::errors::InjectorError;
use serde::Serialize;

/// Every shape of value the injector writes into a pod.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PatchValue {
    ContainerList(Vec<Container>),
    VolumeList(Vec<Volume>),
    SingleVolume(Volume),
    AnnotationMap(BTreeMap<String, String>),
    AnnotationValue(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SidecarPatch {
    pub op: PatchOp,
    pub path: String,
    pub value: PatchValue,
}

impl SidecarPatch {
    pub fn add(path: impl Into<String>, value: PatchValue) -> Self {
        SidecarPatch {
            op: PatchOp::Add,
            path: path.into(),
            value,
        }
    }

    pub fn replace(path: impl Into<String>, value: PatchValue) -> Self {
        SidecarPatch {
            op: PatchOp::Replace,
            path: path.into(),
            value,
        }
    }
}

/// Converts the typed operations into the wire JSON patch, keeping their order.
pub fn to_json_patch(patches: &[SidecarPatch]) -> Result<Patch, InjectorError> {
    let mut operations = Vec::with_capacity(patches.len());
    for p in patches {
        let value = serde_json::to_value(&p.value).map_err(InjectorError::from_error(&format!(
            "Unable to serialize patch value for {}",
            p.path
        )))?;
        operations.push(match p.op {
            PatchOp::Add => PatchOperation::Add(AddOperation {
                path: p.path.clone(),
                value,
            }),
            PatchOp::Replace => PatchOperation::Replace(ReplaceOperation {
                path: p.path.clone(),
                value,
            }),
        });
    }
    Ok(Patch(operations))
}
