use crate::injector::InjectorContext;
use crate::server::{injector_handler, load_ssl, shutdown_signal, Acceptor};
use clap::Parser;
use futures_util::stream::StreamExt;
use hyper::server::accept;
use hyper::server::conn::AddrIncoming;
use hyper::service::{make_service_fn, service_fn};
use hyper::Server;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use lxcfs_common::config::WebhookConfig;
use lxcfs_common::constants::{
    LXCFS_CERT_FILE, LXCFS_CERT_FILE_ENV, LXCFS_KEY_FILE, LXCFS_KEY_FILE_ENV,
    LXCFS_LOG_CONFIG_FILE, LXCFS_LOG_CONFIG_FILE_ENV, LXCFS_PORT, LXCFS_PORT_ENV,
    LXCFS_SIDECAR_CONFIG_FILE_ENV,
};
use lxcfs_common::errors::InjectorError;
use lxcfs_macros::{logger, lxcfs_debug, lxcfs_error, lxcfs_info, lxcfs_log, with_dollar_sign};
use std::convert::Infallible;
use std::error::Error;
use std::future::ready;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tls_listener::TlsListener;

mod errors;
mod injector;
mod patch;
mod server;

logger!("Main");

#[derive(Debug, Parser)]
#[clap(name = "lxcfs-injector")]
struct LxcfsInjector {
    /// Port the webhook listens on
    #[arg(long, env = LXCFS_PORT_ENV, default_value_t = LXCFS_PORT)]
    port: u16,
    /// PEM file with the TLS certificate chain
    #[arg(long, env = LXCFS_CERT_FILE_ENV, default_value = LXCFS_CERT_FILE)]
    tls_cert_file: PathBuf,
    /// PEM file with the TLS private key
    #[arg(long, env = LXCFS_KEY_FILE_ENV, default_value = LXCFS_KEY_FILE)]
    tls_key_file: PathBuf,
    /// YAML file with the webhook and sidecar configuration
    #[arg(long, env = LXCFS_SIDECAR_CONFIG_FILE_ENV)]
    sidecar_config_file: Option<PathBuf>,
    /// log4rs configuration file
    #[arg(long, env = LXCFS_LOG_CONFIG_FILE_ENV, default_value = LXCFS_LOG_CONFIG_FILE)]
    log_config_file: PathBuf,
}

fn init_logging(log_config_file: &Path) -> Result<(), InjectorError> {
    if log_config_file.exists() {
        return log4rs::init_file(log_config_file, Default::default()).map_err(|e| {
            InjectorError::from_string(format!(
                "Unable to load log config {}: {}",
                log_config_file.display(),
                e
            ))
        });
    }
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {m}{n}",
        )))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))
        .map_err(InjectorError::from_error("Unable to build log config"))?;
    log4rs::init_config(config).map_err(InjectorError::from_error("Unable to init logger"))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = LxcfsInjector::parse();
    init_logging(&args.log_config_file)?;
    debug!("Running with {:?}", args);

    let config = WebhookConfig::load(args.sidecar_config_file.as_deref())?;
    let context = Arc::new(InjectorContext::new(config));

    let ssl_config = load_ssl(&args.tls_cert_file, &args.tls_key_file)?;
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let tls_acceptor: Acceptor = Arc::new(ssl_config).into();
    let make_service = {
        make_service_fn(move |_conn| {
            let context = context.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    injector_handler(req, context.clone())
                }))
            }
        })
    };
    let incoming = TlsListener::new(tls_acceptor, AddrIncoming::bind(&addr)?).filter(|c| {
        if let Err(e) = c {
            error!("Error accepting connection: {:?}", e);
            ready(false)
        } else {
            ready(true)
        }
    });

    info!("Starting LXCFS Injector server on {}", addr);
    Server::builder(accept::from_stream(incoming))
        .serve(make_service)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("LXCFS Injector server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::LxcfsInjector;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn test_cli_flags() {
        let args = LxcfsInjector::try_parse_from([
            "lxcfs-injector",
            "--port",
            "8443",
            "--tls-cert-file",
            "/tmp/cert.pem",
            "--tls-key-file",
            "/tmp/key.pem",
            "--sidecar-config-file",
            "/tmp/sidecar.yaml",
            "--log-config-file",
            "/tmp/log4rs.yaml",
        ])
        .expect("Unable to parse flags");
        assert_eq!(args.port, 8443);
        assert_eq!(args.tls_cert_file, PathBuf::from("/tmp/cert.pem"));
        assert_eq!(args.tls_key_file, PathBuf::from("/tmp/key.pem"));
        assert_eq!(
            args.sidecar_config_file,
            Some(PathBuf::from("/tmp/sidecar.yaml"))
        );
        assert_eq!(args.log_config_file, PathBuf::from("/tmp/log4rs.yaml"));
    }

    #[test]
    fn test_cli_rejects_bad_port() {
        assert!(LxcfsInjector::try_parse_from(["lxcfs-injector", "--port", "https"]).is_err());
    }
}
