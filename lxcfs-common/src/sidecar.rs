use k8s_openapi::api::core::v1::{HostPathVolumeSource, Volume, VolumeMount};
use serde::{Deserialize, Serialize};

use crate::constants::LXCFS_HOST_PROC_DIR;

const LXCFS_VOLUME_PREFIX: &str = "lxcfs-proc";

/// Proc files served by lxcfs, in mount order.
pub const LXCFS_PROC_FILES: [&str; 6] = ["cpuinfo", "meminfo", "diskstats", "stat", "swaps", "uptime"];

/// Proc files in the order their host volumes are declared.
const LXCFS_PROC_VOLUMES: [&str; 6] = ["cpuinfo", "diskstats", "meminfo", "stat", "swaps", "uptime"];

/// Mounts appended to every container and host-path volumes appended to the pod.
/// Mounts and volumes are paired by name; the loader is trusted on that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidecarSpecification {
    #[serde(rename = "volumeMounts", default)]
    pub volume_mounts: Vec<VolumeMount>,
    #[serde(default)]
    pub volumes: Vec<Volume>,
}

fn lxcfs_volume_name(file: &str) -> String {
    format!("{}-{}", LXCFS_VOLUME_PREFIX, file)
}

pub fn mount(name: &str, mount_path: &str) -> VolumeMount {
    VolumeMount {
        name: name.to_string(),
        mount_path: mount_path.to_string(),
        ..Default::default()
    }
}

pub fn host_path_volume(name: &str, path: &str) -> Volume {
    Volume {
        name: name.to_string(),
        host_path: Some(HostPathVolumeSource {
            path: path.to_string(),
            type_: None,
        }),
        ..Default::default()
    }
}

impl SidecarSpecification {
    pub fn mount_names(&self) -> Vec<String> {
        self.volume_mounts.iter().map(|m| m.name.clone()).collect()
    }

    pub fn volume_names(&self) -> Vec<String> {
        self.volumes.iter().map(|v| v.name.clone()).collect()
    }
}

impl Default for SidecarSpecification {
    /// The lxcfs proc files: cpu, memory, disk, swap and uptime statistics.
    fn default() -> Self {
        SidecarSpecification {
            volume_mounts: LXCFS_PROC_FILES
                .iter()
                .map(|f| mount(&lxcfs_volume_name(f), &format!("/proc/{}", f)))
                .collect(),
            volumes: LXCFS_PROC_VOLUMES
                .iter()
                .map(|f| {
                    host_path_volume(
                        &lxcfs_volume_name(f),
                        &format!("{}/{}", LXCFS_HOST_PROC_DIR, f),
                    )
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SidecarSpecification;
    use std::collections::HashSet;

    #[test]
    fn test_default_mounts() {
        let spec = SidecarSpecification::default();
        let mounts: Vec<(String, String)> = spec
            .volume_mounts
            .iter()
            .map(|m| (m.name.clone(), m.mount_path.clone()))
            .collect();
        assert_eq!(
            mounts,
            vec![
                ("lxcfs-proc-cpuinfo".to_string(), "/proc/cpuinfo".to_string()),
                ("lxcfs-proc-meminfo".to_string(), "/proc/meminfo".to_string()),
                ("lxcfs-proc-diskstats".to_string(), "/proc/diskstats".to_string()),
                ("lxcfs-proc-stat".to_string(), "/proc/stat".to_string()),
                ("lxcfs-proc-swaps".to_string(), "/proc/swaps".to_string()),
                ("lxcfs-proc-uptime".to_string(), "/proc/uptime".to_string()),
            ]
        );
    }

    #[test]
    fn test_default_volumes_are_host_paths() {
        let spec = SidecarSpecification::default();
        assert_eq!(spec.volumes.len(), 6);
        assert_eq!(spec.volumes[1].name, "lxcfs-proc-diskstats");
        for v in spec.volumes.iter() {
            let host_path = v.host_path.as_ref().expect("Volume without hostPath");
            let file = v.name.trim_start_matches("lxcfs-proc-");
            assert_eq!(host_path.path, format!("/var/lib/lxcfs/proc/{}", file));
        }
    }

    #[test]
    fn test_default_mounts_and_volumes_pair_by_name() {
        let spec = SidecarSpecification::default();
        let mounts: HashSet<String> = spec.mount_names().into_iter().collect();
        let volumes: HashSet<String> = spec.volume_names().into_iter().collect();
        assert_eq!(mounts.len(), spec.volume_mounts.len());
        assert_eq!(volumes.len(), spec.volumes.len());
        assert_eq!(mounts, volumes);
    }

    #[test]
    fn test_specification_serializes_as_kubernetes_shapes() {
        let spec = SidecarSpecification::default();
        let value = serde_json::to_value(&spec).expect("Unable to serialize specification");
        assert_eq!(value["volumeMounts"][0]["mountPath"], "/proc/cpuinfo");
        assert_eq!(
            value["volumes"][0]["hostPath"]["path"],
            "/var/lib/lxcfs/proc/cpuinfo"
        );
    }
}
