//! Server module for running Terraform providers
//!
//! Generates an in-process self-signed TLS certificate, serves the provider,
//! health, and controller gRPC services, emits the RPCPlugin handshake line,
//! and waits for controller-initiated shutdown or parent-process death.

use crate::error::{Result, TfplugError};
use crate::grpc::GrpcProviderServer;
use crate::proto;
use crate::proto::provider_server::ProviderServer;
use crate::provider::Provider;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::io::Write;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::{Identity, Server, ServerTlsConfig};
use tonic::{Request, Response, Status};

/// Log level for the server
#[derive(Debug, Clone, Copy)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Bounds how many RPC handler bodies the servicer runs at once. Both
/// flavours dispatch through the same Tokio runtime; this only sizes the
/// semaphore `GrpcProviderServer` acquires a permit from before running a
/// handler (see `GrpcProviderServer::guarded`).
#[derive(Debug, Clone, Copy)]
pub enum ConcurrencyMode {
    /// Up to `workers` handler calls may run concurrently.
    Parallel { workers: usize },
    /// Handler calls are serialized one at a time, mirroring the legacy
    /// SDKv2 behavior of mutex-guarded provider RPCs.
    Cooperative,
}

impl Default for ConcurrencyMode {
    fn default() -> Self {
        ConcurrencyMode::Parallel { workers: 10 }
    }
}

/// Server configuration for running a Terraform provider
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Fixed port to bind; `None` lets the OS assign one.
    pub port: Option<u16>,
    /// Tokio runtime/dispatch shape the servicer runs under.
    pub concurrency: ConcurrencyMode,
    /// Maximum message size in bytes
    pub max_message_size: usize,
    /// Whether to enable logging
    pub enable_logging: bool,
    /// Log level
    pub log_level: LogLevel,
    /// Grace period given to in-flight RPCs on shutdown
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: None,
            concurrency: ConcurrencyMode::default(),
            max_message_size: 256 << 20, // 256MB
            enable_logging: true,
            log_level: LogLevel::Info,
            shutdown_timeout: Duration::from_secs(2),
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to a fixed port instead of letting the OS assign one
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the concurrency mode
    pub fn with_concurrency(mut self, concurrency: ConcurrencyMode) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the maximum message size
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Disable logging
    pub fn without_logging(mut self) -> Self {
        self.enable_logging = false;
        self
    }

    /// Set the log level
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Set the shutdown timeout
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

struct SelfSignedCert {
    /// DER encoding, base64-encoded for the handshake line.
    der_base64: String,
    identity: Identity,
}

/// Builds a fresh self-signed cert for the handshake, in memory, every
/// server start. rcgen's `ring` backend can't generate RSA keys, only
/// ECDSA/Ed25519, so this uses its default ECDSA P-256 key instead of the
/// RSA-2048 key a go-plugin host would generate; Terraform only checks that
/// the cert is well-formed and self-signed, not its key algorithm.
fn generate_self_signed_cert() -> Result<SelfSignedCert> {
    use rcgen::{
        BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose,
        IsCa, KeyPair, KeyUsagePurpose,
    };

    let mut params = CertificateParams::new(vec!["localhost".to_string()])
        .map_err(|e| TfplugError::TlsError(format!("invalid certificate params: {e}")))?;

    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, "tfplugin6");
    dn.push(DnType::OrganizationName, "tfplugin6");
    params.distinguished_name = dn;

    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
        KeyUsagePurpose::KeyAgreement,
        KeyUsagePurpose::KeyCertSign,
    ];
    params.extended_key_usages = vec![
        ExtendedKeyUsagePurpose::ServerAuth,
        ExtendedKeyUsagePurpose::ClientAuth,
    ];

    let now = time::OffsetDateTime::now_utc();
    params.not_before = now - time::Duration::seconds(30);
    params.not_after = now + time::Duration::days(3);

    let key_pair = KeyPair::generate()
        .map_err(|e| TfplugError::TlsError(format!("key generation failed: {e}")))?;
    let cert = params
        .self_signed(&key_pair)
        .map_err(|e| TfplugError::TlsError(format!("self-signing failed: {e}")))?;

    let der_base64 = BASE64.encode(cert.der().as_ref());

    Ok(SelfSignedCert {
        der_base64,
        identity: Identity::from_pem(cert.pem(), key_pair.serialize_pem()),
    })
}

/// Registers the health service and toggles `helloworld.Greeter`'s status
/// every 5 seconds so a client watching for transitions sees one.
fn spawn_health_toggler(
    reporter: tonic_health::server::HealthReporter,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        reporter
            .set_serving::<tonic_health::pb::health_server::HealthServer<
                tonic_health::server::HealthService,
            >>()
            .await;
        let mut serving = true;
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            serving = !serving;
            let status = if serving {
                tonic_health::ServingStatus::Serving
            } else {
                tonic_health::ServingStatus::NotServing
            };
            reporter.set_service_status("helloworld.Greeter", status).await;
        }
    })
}

struct GrpcController {
    shutdown: std::sync::Arc<Notify>,
}

#[tonic::async_trait]
impl proto::GrpcControllerService for GrpcController {
    async fn shutdown(
        &self,
        _request: Request<proto::Empty>,
    ) -> std::result::Result<Response<proto::Empty>, Status> {
        tracing::info!("controller requested shutdown");
        self.shutdown.notify_waiters();
        Ok(Response::new(proto::Empty {}))
    }
}

/// Polls the parent process id every second and requests shutdown if it
/// changes, e.g. the launching host died without sending Shutdown.
#[cfg(unix)]
fn spawn_parent_death_watch(shutdown: std::sync::Arc<Notify>) -> tokio::task::JoinHandle<()> {
    let initial_ppid = unsafe { libc::getppid() };
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let ppid = unsafe { libc::getppid() };
            if ppid != initial_ppid {
                tracing::warn!(
                    "parent process id changed ({initial_ppid} -> {ppid}), shutting down"
                );
                shutdown.notify_waiters();
                return;
            }
        }
    })
}

#[cfg(not(unix))]
fn spawn_parent_death_watch(_shutdown: std::sync::Arc<Notify>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async {})
}

/// Formats the RPCPlugin handshake line: `CORE-PROTOCOL|APP-PROTOCOL|
/// NETWORK|ADDRESS|PROTOCOL|SERVER-CERT`.
fn handshake_line(addr: std::net::SocketAddr, cert_der_base64: &str) -> String {
    format!("1|6|tcp|{}|grpc|{}", addr, cert_der_base64)
}

/// Serves `provider` over the Terraform plugin protocol until the host's
/// controller service requests shutdown or the parent process dies.
pub async fn serve<P: Provider + 'static>(provider: P, config: ServerConfig) -> Result<()> {
    if config.enable_logging {
        crate::logging::try_init_logging(config.log_level);
    }

    let port = config.port.unwrap_or(0);
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    let local_addr = listener.local_addr()?;

    let cert = generate_self_signed_cert()?;
    let tls_config = ServerTlsConfig::new().identity(cert.identity);

    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    spawn_health_toggler(health_reporter);

    let shutdown = std::sync::Arc::new(Notify::new());
    spawn_parent_death_watch(shutdown.clone());

    let grpc_controller_service = proto::GrpcControllerServer::new(GrpcController {
        shutdown: shutdown.clone(),
    });

    let provider_service =
        ProviderServer::new(GrpcProviderServer::with_concurrency(provider, config.concurrency))
            .max_decoding_message_size(config.max_message_size)
            .max_encoding_message_size(config.max_message_size);

    // Nothing may be written to stdout before the handshake line, and the
    // host blocks on reading it, so flush immediately.
    println!("{}", handshake_line(local_addr, &cert.der_base64));
    std::io::stdout().flush()?;

    let shutdown_signal = {
        let shutdown = shutdown.clone();
        async move {
            shutdown.notified().await;
        }
    };

    let server_future = Server::builder()
        .tls_config(tls_config)?
        .add_service(provider_service)
        .add_service(health_service)
        .add_service(grpc_controller_service)
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown_signal);

    // The grace period only starts once shutdown is actually requested; it
    // bounds how long we wait for in-flight RPCs to drain, not how long the
    // server may run. Exceeding it still exits cleanly — the host is
    // authoritative on when it gives up waiting.
    let grace_deadline = {
        let shutdown = shutdown.clone();
        let shutdown_timeout = config.shutdown_timeout;
        async move {
            shutdown.notified().await;
            tokio::time::sleep(shutdown_timeout).await;
        }
    };

    tokio::select! {
        result = server_future => result?,
        _ = grace_deadline => {
            tracing::warn!(
                grace = ?config.shutdown_timeout,
                "shutdown grace period exceeded, exiting anyway"
            );
        }
    }

    Ok(())
}

/// Convenience function to run a provider with default configuration
pub async fn serve_default<P: Provider + 'static>(provider: P) -> Result<()> {
    serve(provider, ServerConfig::default()).await
}
