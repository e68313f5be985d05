use std::collections::BTreeMap;
use std::sync::Arc;

use k8s_openapi::api::core::v1::{Container, Pod, Volume, VolumeMount};
use kube::api::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use lxcfs_common::annotations::{LXCFS_INJECTOR_ENABLED_VALUES, LXCFS_INJECTOR_STATUS_INJECTED};
use lxcfs_common::config::{MutationPolicy, WebhookConfig};
use lxcfs_common::errors::InjectorError;
use lxcfs_common::patch_annotation;
use lxcfs_common::sidecar::SidecarSpecification;
use lxcfs_common::traits::{Annotated, MaybeNamespaced, Named, ObjectRequest, PodSpecView};
use lxcfs_macros::{
    logger, lxcfs_debug, lxcfs_error, lxcfs_info, lxcfs_log, with_dollar_sign,
};

use crate::errors::AdmissionError;
use crate::patch::{to_json_patch, PatchValue, SidecarPatch};

logger!("LxcfsInjector");

const CONTAINERS_PATH: &str = "/spec/containers";
const VOLUMES_PATH: &str = "/spec/volumes";
const ANNOTATIONS_PATH: &str = "/metadata/annotations";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Decides whether a pod is mutated.
///
/// Nothing is ever mutated when the annotation is not required: opting in
/// through the annotation is the only path to a mutation.
pub fn should_mutate(
    policy: &MutationPolicy,
    annotations: Option<&BTreeMap<String, String>>,
) -> bool {
    if !policy.annotation_required {
        return false;
    }
    annotations
        .and_then(|xs| xs.get(&policy.annotation_key))
        .map(|v| LXCFS_INJECTOR_ENABLED_VALUES.contains(&v.as_str()))
        .unwrap_or(false)
}

trait Patched {
    fn patch(&self, pod: &Pod, annotations: &BTreeMap<String, String>) -> Vec<SidecarPatch>;
}

/// Patch builder for one sidecar specification.
struct LxcfsPod<'a> {
    sidecar: &'a SidecarSpecification,
}

impl Patched for LxcfsPod<'_> {
    fn patch(&self, pod: &Pod, annotations: &BTreeMap<String, String>) -> Vec<SidecarPatch> {
        let mut patches = vec![];
        patches.extend(add_volume_mounts(
            pod.containers(),
            &self.sidecar.volume_mounts,
            CONTAINERS_PATH,
        ));
        patches.extend(add_volumes(
            pod.volumes(),
            &self.sidecar.volumes,
            VOLUMES_PATH,
        ));
        patches.extend(update_annotations(pod.annotations(), annotations));
        debug!("Pod patches: {:?}", patches);
        patches
    }
}

/// One replace of the whole container list, every container carrying the
/// added mounts after its own.
fn add_volume_mounts(
    target: &[Container],
    added: &[VolumeMount],
    base_path: &str,
) -> Vec<SidecarPatch> {
    let containers = target
        .iter()
        .cloned()
        .map(|mut c| {
            c.volume_mounts
                .get_or_insert_with(Vec::new)
                .extend(added.iter().cloned());
            c
        })
        .collect();
    vec![SidecarPatch::replace(
        base_path,
        PatchValue::ContainerList(containers),
    )]
}

/// One add per volume. A missing or empty list is created by the first add,
/// the rest append with `/-`.
fn add_volumes(target: &[Volume], added: &[Volume], base_path: &str) -> Vec<SidecarPatch> {
    let mut first = target.is_empty();
    added
        .iter()
        .map(|v| {
            if first {
                first = false;
                SidecarPatch::add(base_path, PatchValue::VolumeList(vec![v.clone()]))
            } else {
                SidecarPatch::add(
                    format!("{}/-", base_path),
                    PatchValue::SingleVolume(v.clone()),
                )
            }
        })
        .collect()
}

/// Add-or-replace per key, always checked against the pod's own annotations
/// and never against the result of a previous operation of this patch.
fn update_annotations(
    target: Option<&BTreeMap<String, String>>,
    added: &BTreeMap<String, String>,
) -> Vec<SidecarPatch> {
    added
        .iter()
        .map(|(key, value)| {
            let existing = target
                .and_then(|xs| xs.get(key))
                .filter(|v| !v.is_empty());
            match existing {
                None => SidecarPatch::add(
                    ANNOTATIONS_PATH,
                    PatchValue::AnnotationMap(BTreeMap::from([(key.clone(), value.clone())])),
                ),
                Some(_) => SidecarPatch::replace(
                    format!("{}/{}", ANNOTATIONS_PATH, patch_annotation!(key)),
                    PatchValue::AnnotationValue(value.clone()),
                ),
            }
        })
        .collect()
}

/// Mounts, then volumes, then annotations.
pub fn build_patch(
    pod: &Pod,
    sidecar: &SidecarSpecification,
    annotations: &BTreeMap<String, String>,
) -> Vec<SidecarPatch> {
    LxcfsPod { sidecar }.patch(pod, annotations)
}

/// Decodes admission reviews and encodes the answers.
/// Built once at startup and shared read-only by every request.
#[derive(Debug, Clone)]
pub struct AdmissionCodec {
    content_type: &'static str,
}

impl Default for AdmissionCodec {
    fn default() -> Self {
        AdmissionCodec {
            content_type: JSON_CONTENT_TYPE,
        }
    }
}

impl AdmissionCodec {
    /// Media type match, parameters like `charset` are ignored.
    /// Media types are case-insensitive (RFC 9110), and the API server may send
    /// `application/json; charset=utf-8`, so an exact string match is too narrow.
    pub fn accepts(&self, content_type: Option<&str>) -> bool {
        content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().eq_ignore_ascii_case(self.content_type))
            .unwrap_or(false)
    }

    pub fn decode_request(
        &self,
        body: &[u8],
    ) -> Result<AdmissionRequest<DynamicObject>, InjectorError> {
        let admission_review = self.decode_review(body)?;
        let admission_request: AdmissionRequest<DynamicObject> = admission_review
            .try_into()
            .map_err(InjectorError::from_error("Unable to parse AdmissionReview"))?;
        Ok(admission_request)
    }

    pub fn decode_pod(
        &self,
        request: &AdmissionRequest<DynamicObject>,
    ) -> Result<Pod, InjectorError> {
        let object = request
            .object()
            .ok_or("Admission request does not contain a Pod")?;
        serde_json::to_value(object)
            .and_then(serde_json::from_value::<Pod>)
            .map_err(InjectorError::from_error("Could not unmarshal raw object"))
    }

    pub fn decode_review(
        &self,
        body: &[u8],
    ) -> Result<AdmissionReview<DynamicObject>, InjectorError> {
        serde_json::from_slice(body)
            .map_err(InjectorError::from_error("Unable to parse AdmissionReview"))
    }

    pub fn encode_review(
        &self,
        review: &AdmissionReview<DynamicObject>,
    ) -> Result<Vec<u8>, InjectorError> {
        serde_json::to_vec(review)
            .map_err(InjectorError::from_error("Unable to encode AdmissionReview"))
    }

    pub fn encode_response(&self, response: AdmissionResponse) -> Result<Vec<u8>, InjectorError> {
        self.encode_review(&response.into_review())
    }
}

/// Everything a request needs, loaded once at startup.
pub struct InjectorContext {
    pub config: Arc<WebhookConfig>,
    pub policy: MutationPolicy,
    pub codec: AdmissionCodec,
}

impl InjectorContext {
    pub fn new(config: WebhookConfig) -> Self {
        let policy = config.policy();
        InjectorContext {
            config: Arc::new(config),
            policy,
            codec: AdmissionCodec::default(),
        }
    }
}

/// Denial carrying the error text, still answering the given request.
fn invalid_response(
    request: &AdmissionRequest<DynamicObject>,
    e: InjectorError,
) -> AdmissionResponse {
    let mut response = AdmissionResponse::from(request);
    response.allowed = false;
    response.result = AdmissionResponse::invalid(e.to_string()).result;
    response
}

fn mutate(
    request: &AdmissionRequest<DynamicObject>,
    context: &InjectorContext,
) -> AdmissionResponse {
    let pod = match context.codec.decode_pod(request) {
        Ok(pod) => pod,
        Err(e) => {
            error!("{}", e);
            return invalid_response(request, e);
        }
    };

    info!(
        "AdmissionReview for Kind={:?}, Namespace={:?} Name={} ({}) UID={} Operation={:?} UserInfo={:?}",
        request.kind,
        request.namespace(),
        request.name,
        pod.name(),
        request.uid,
        request.operation,
        request.user_info
    );

    let response = AdmissionResponse::from(request);
    if !should_mutate(&context.policy, pod.annotations()) {
        info!("Skipping mutation");
        return response;
    }

    info!("Mutating pod");
    let annotations = BTreeMap::from([(
        context.policy.status_annotation_key.clone(),
        LXCFS_INJECTOR_STATUS_INJECTED.to_string(),
    )]);
    let patches = build_patch(&pod, &context.config.sidecar_config, &annotations);
    let patched = to_json_patch(&patches).and_then(|patch| {
        response
            .with_patch(patch)
            .map_err(InjectorError::from_error("Could not create patch"))
    });
    match patched {
        Ok(response) => {
            info!("Pod patched with {} patches", patches.len());
            response
        }
        Err(e) => {
            let e = e.with_pod(pod.name());
            error!("{}", e);
            invalid_response(request, e)
        }
    }
}

/// Turns an admission review body into the encoded answer.
///
/// Decoding failures are answered with a review carrying the error text and
/// no `allowed` flag. Only transport problems and a failed encoding are
/// returned as errors.
pub fn handle(
    body: &[u8],
    content_type: Option<&str>,
    context: &InjectorContext,
) -> Result<Vec<u8>, AdmissionError> {
    if body.is_empty() {
        error!("Empty body");
        return Err(AdmissionError::EmptyBody);
    }
    if !context.codec.accepts(content_type) {
        let content_type = content_type.unwrap_or_default().to_string();
        error!("Content-Type={}, expect {}", content_type, JSON_CONTENT_TYPE);
        return Err(AdmissionError::InvalidContentType(content_type));
    }

    debug!("Handling request: {}", String::from_utf8_lossy(body));

    let response = match context.codec.decode_request(body) {
        Ok(request) => mutate(&request, context),
        Err(e) => {
            error!("Can't decode body: {}", e);
            AdmissionResponse::invalid(e.to_string())
        }
    };

    debug!("Sending response: {:?}", response);
    context.codec.encode_response(response).map_err(|e| {
        error!("Can't encode response: {}", e);
        AdmissionError::Encode(e)
    })
}
