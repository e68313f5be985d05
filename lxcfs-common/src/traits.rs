use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Container, Pod, Volume};
use kube::core::admission::AdmissionRequest;
use kube::Resource;

pub trait Named {
    fn name(&self) -> String;
}

pub trait MaybeNamespaced {
    fn namespace(&self) -> Option<String>;
}

pub trait Annotated {
    fn annotations(&self) -> Option<&BTreeMap<String, String>>;
}

pub trait ObjectRequest<O: Resource> {
    fn object(&self) -> Option<&O>;
}

/// Read access to the parts of a pod spec the injector patches.
pub trait PodSpecView {
    fn containers(&self) -> &[Container];
    fn volumes(&self) -> &[Volume];
}

impl Named for Pod {
    fn name(&self) -> String {
        self.metadata
            .name
            .clone()
            .or_else(|| self.metadata.generate_name.clone())
            .unwrap_or_default()
    }
}

impl MaybeNamespaced for Pod {
    fn namespace(&self) -> Option<String> {
        self.metadata.namespace.clone()
    }
}

impl Annotated for Pod {
    fn annotations(&self) -> Option<&BTreeMap<String, String>> {
        self.metadata.annotations.as_ref()
    }
}

impl PodSpecView for Pod {
    fn containers(&self) -> &[Container] {
        self.spec
            .as_ref()
            .map(|s| s.containers.as_slice())
            .unwrap_or(&[])
    }

    fn volumes(&self) -> &[Volume] {
        self.spec
            .as_ref()
            .and_then(|s| s.volumes.as_deref())
            .unwrap_or(&[])
    }
}

impl<O: Resource> ObjectRequest<O> for AdmissionRequest<O> {
    fn object(&self) -> Option<&O> {
        self.object.as_ref()
    }
}

impl<O: Resource> MaybeNamespaced for AdmissionRequest<O> {
    fn namespace(&self) -> Option<String> {
        self.namespace.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::{Annotated, MaybeNamespaced, Named, PodSpecView};
    use k8s_openapi::api::core::v1::{Container, Pod, Volume, VolumeMount};
    use lxcfs_test_macros::{pod, set_pod_field};
    use std::collections::BTreeMap;

    #[test]
    fn test_pod_traits() {
        let p = pod!(1,
            containers => vec!["c1", "c2"],
            volumes => vec!["v1"],
            mounts => vec![("v1", "/data")],
            annotations => vec![("k", "v")]);
        assert_eq!(p.name(), "srv1");
        assert_eq!(p.namespace(), Some("ns1".to_string()));
        assert_eq!(
            p.annotations().and_then(|xs| xs.get("k")),
            Some(&"v".to_string())
        );
        assert_eq!(p.containers().len(), 2);
        assert_eq!(p.volumes().len(), 1);
        let mounts = p.containers()[1].volume_mounts.as_ref().unwrap();
        assert_eq!(mounts[0].mount_path, "/data");
    }

    #[test]
    fn test_pod_without_spec() {
        let p = Pod::default();
        assert_eq!(p.name(), "");
        assert!(p.annotations().is_none());
        assert!(p.containers().is_empty());
        assert!(p.volumes().is_empty());
    }
}
