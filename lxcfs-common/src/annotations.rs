use const_format::formatcp;

const DOMAIN_ANNOTATION: &str = "sidecar-injector.lxcfs";

macro_rules! lxcfs_annotate {
    ($annotation:literal) => {{
        formatcp!("{}/{}", DOMAIN_ANNOTATION, $annotation)
    }};
}

/// Default annotation that opts a pod into the injection.
pub const LXCFS_INJECTOR_ANNOTATION_INJECT: &str = lxcfs_annotate!("inject");
/// Written by the injector once a pod has been patched.
pub const LXCFS_INJECTOR_ANNOTATION_STATUS: &str = lxcfs_annotate!("status");
pub const LXCFS_INJECTOR_STATUS_INJECTED: &str = "injected";

/// Values of the inject annotation that request a mutation.
pub const LXCFS_INJECTOR_ENABLED_VALUES: [&str; 2] = ["yes", "true"];
