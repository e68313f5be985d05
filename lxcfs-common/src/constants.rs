pub const LXCFS_DEFAULT_NAMESPACE: &str = "default";
pub const LXCFS_DEFAULT_ANNOTATION_REQUIRED: bool = true;
pub const LXCFS_LOG_CONFIG_FILE_ENV: &str = "LXCFS_LOG_CONFIG_FILE";
pub const LXCFS_LOG_CONFIG_FILE: &str = "/opt/lxcfs-injector/log4rs.yaml";
pub const LXCFS_SIDECAR_CONFIG_FILE_ENV: &str = "LXCFS_SIDECAR_CONFIG_FILE";
pub const LXCFS_CERT_FILE_ENV: &str = "LXCFS_CERT_FILE";
pub const LXCFS_KEY_FILE_ENV: &str = "LXCFS_KEY_FILE";
pub const LXCFS_CERT_FILE: &str = "/etc/webhook/certs/cert.pem";
pub const LXCFS_KEY_FILE: &str = "/etc/webhook/certs/key.pem";
pub const LXCFS_PORT_ENV: &str = "LXCFS_PORT";
pub const LXCFS_PORT: u16 = 443;
pub const LXCFS_HOST_PROC_DIR: &str = "/var/lib/lxcfs/proc";
