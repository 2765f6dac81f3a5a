// # dnsmand - dnsman daemon
//
// Thin integration layer: reads configuration from the environment, builds
// a DnsManager through the backend registry and drives refresh passes.
// All DNS logic lives in dnsman-core and the backend crates.
//
// ## Configuration
//
// ### Backend
// - `DNSMAN_BACKEND`: cloudflare, dyndns or noip (required)
// - `DNSMAN_API_TOKEN`: Cloudflare API token
// - `DNSMAN_ZONE_ID`: Cloudflare zone id (optional)
// - `DNSMAN_USERNAME` / `DNSMAN_PASSWORD`: DynDNS/No-IP credentials
// - `DNSMAN_ENDPOINT`: override the backend base URL
//
// ### Records
// - `DNSMAN_RECORDS`: comma-separated list of `name` or `name@zone`
//
// ### Operation
// - `DNSMAN_COMMAND`: `set` (default) pushes the public address, `check` only verifies
// - `DNSMAN_INTERVAL_SECS`: seconds between passes; 0 (default) runs one pass
// - `DNSMAN_IP_LOOKUP_URLS`: comma-separated public address services
// - `DNSMAN_IP_VERSION`: v4, v6 or both (default); filters the public address
//   and picks the family `check` reads back through DNS
// - `DNSMAN_LOG_LEVEL`: trace, debug, info (default), warn, error
//
// ## Example
//
// ```bash
// export DNSMAN_BACKEND=cloudflare
// export DNSMAN_API_TOKEN=your_token
// export DNSMAN_RECORDS=home.example.com
// export DNSMAN_INTERVAL_SECS=300
//
// dnsmand
// ```

use anyhow::Result;
use dnsman_core::sync::{RecordStatus, RefreshReport, check_once, refresh_once};
use dnsman_core::{BackendConfig, BackendRegistry, DnsManager, DnsmanConfig, IpLookupConfig, IpVersion, RecordTarget};
use dnsman_ip_http::HttpAddressLookup;
use std::env;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum DnsmanExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (a pass failed)
    RuntimeError = 2,
}

impl From<DnsmanExitCode> for ExitCode {
    fn from(code: DnsmanExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Set,
    Check,
}

/// Application settings read from the environment
struct Settings {
    command: Command,
    config: DnsmanConfig,
    log_level: Level,
}

impl Settings {
    fn from_env() -> Result<Self> {
        let backend = env::var("DNSMAN_BACKEND")
            .map_err(|_| anyhow::anyhow!("DNSMAN_BACKEND is required (cloudflare, dyndns, noip)"))?
            .parse()?;

        let mut config = DnsmanConfig::new(backend);
        let ip_version = match non_empty_var("DNSMAN_IP_VERSION") {
            Some(s) => s.parse::<IpVersion>()?,
            None => IpVersion::default(),
        };

        config.backend_config = BackendConfig {
            api_token: non_empty_var("DNSMAN_API_TOKEN"),
            zone_id: non_empty_var("DNSMAN_ZONE_ID"),
            username: non_empty_var("DNSMAN_USERNAME"),
            password: non_empty_var("DNSMAN_PASSWORD"),
            endpoint: non_empty_var("DNSMAN_ENDPOINT"),
            timeout_secs: 0,
            ip_version,
        };

        config.records = env::var("DNSMAN_RECORDS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(RecordTarget::parse)
            .collect::<dnsman_core::Result<Vec<_>>>()?;

        if let Some(urls) = non_empty_var("DNSMAN_IP_LOOKUP_URLS") {
            config.ip_lookup = IpLookupConfig {
                urls: split_list(&urls),
                ..IpLookupConfig::default()
            };
        }
        config.ip_lookup.version = ip_version;

        config.refresh_interval_secs = match non_empty_var("DNSMAN_INTERVAL_SECS") {
            Some(s) => s
                .parse()
                .map_err(|_| anyhow::anyhow!("DNSMAN_INTERVAL_SECS must be a number. Got: {}", s))?,
            None => 0,
        };

        let command = match non_empty_var("DNSMAN_COMMAND").as_deref() {
            None | Some("set") => Command::Set,
            Some("check") => Command::Check,
            Some(other) => anyhow::bail!("DNSMAN_COMMAND '{}' is not valid. Valid: set, check", other),
        };

        let log_level = match non_empty_var("DNSMAN_LOG_LEVEL")
            .unwrap_or_else(|| "info".to_string())
            .to_lowercase()
            .as_str()
        {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            other => anyhow::bail!(
                "DNSMAN_LOG_LEVEL '{}' is not valid. Valid levels: trace, debug, info, warn, error",
                other
            ),
        };

        config.validate()?;

        Ok(Self {
            command,
            config,
            log_level,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DnsmanExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DnsmanExitCode::ConfigError.into();
    }

    info!(
        "Starting dnsmand: backend {}, {} record(s)",
        settings.config.backend,
        settings.config.records.len()
    );

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DnsmanExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(settings)).into()
}

fn build_registry() -> BackendRegistry {
    let registry = BackendRegistry::new();

    #[cfg(feature = "cloudflare")]
    dnsman_cloudflare::register(&registry);

    #[cfg(feature = "dyndns")]
    dnsman_dyndns::register(&registry);

    registry
}

async fn run(settings: Settings) -> DnsmanExitCode {
    let Settings { command, config, .. } = settings;

    let registry = build_registry();
    let mut manager = match registry.create_manager(config.backend, &config.backend_config) {
        Ok(manager) => manager,
        Err(e) => {
            error!("Cannot create {} backend: {}", config.backend, e);
            return DnsmanExitCode::ConfigError;
        }
    };

    let lookup = match HttpAddressLookup::new(&config.ip_lookup) {
        Ok(lookup) => lookup,
        Err(e) => {
            error!("Cannot create public address lookup: {}", e);
            return DnsmanExitCode::ConfigError;
        }
    };

    if command == Command::Check {
        return match check_once(&manager, &lookup, &config.records).await {
            Ok(report) => log_report(&report),
            Err(e) => {
                error!("{}", e);
                DnsmanExitCode::RuntimeError
            }
        };
    }

    if config.refresh_interval_secs == 0 {
        return run_pass(&mut manager, &lookup, &config.records).await;
    }

    // Handlers are installed once, before the first pass, so a signal that
    // arrives mid-pass or between passes is still delivered
    let mut shutdown = match ShutdownSignal::install() {
        Ok(shutdown) => shutdown,
        Err(e) => {
            error!("{}", e);
            return DnsmanExitCode::RuntimeError;
        }
    };

    let interval = Duration::from_secs(config.refresh_interval_secs);
    info!("Refreshing every {:?}", interval);

    loop {
        if until_shutdown(&mut shutdown, run_pass(&mut manager, &lookup, &config.records))
            .await
            .is_none()
        {
            return DnsmanExitCode::CleanShutdown;
        }

        if until_shutdown(&mut shutdown, tokio::time::sleep(interval))
            .await
            .is_none()
        {
            return DnsmanExitCode::CleanShutdown;
        }
    }
}

/// Drive `work` to completion unless a shutdown signal arrives first
///
/// Returns `None` when interrupted; `work` is dropped at its next await point.
async fn until_shutdown<F: Future>(shutdown: &mut ShutdownSignal, work: F) -> Option<F::Output> {
    tokio::select! {
        output = work => Some(output),
        name = shutdown.recv() => {
            info!("Received {}, shutting down", name);
            None
        }
    }
}

async fn run_pass(
    manager: &mut DnsManager,
    lookup: &HttpAddressLookup,
    records: &[RecordTarget],
) -> DnsmanExitCode {
    match refresh_once(manager, lookup, records).await {
        Ok(report) => log_report(&report),
        Err(e) => {
            error!("Refresh pass aborted: {}", e);
            DnsmanExitCode::RuntimeError
        }
    }
}

fn log_report(report: &RefreshReport) -> DnsmanExitCode {
    for (name, status) in &report.records {
        match status {
            RecordStatus::Pushed => info!("{}: updated to {}", name, report.address),
            RecordStatus::Cached => info!("{}: unchanged ({})", name, report.address),
            RecordStatus::Current => info!("{}: up to date ({})", name, report.address),
            RecordStatus::Stale => warn!("{}: does not point at {}", name, report.address),
            RecordStatus::Failed(e) => error!("{}: {}", name, e),
        }
    }

    if report.is_success() {
        DnsmanExitCode::CleanShutdown
    } else {
        DnsmanExitCode::RuntimeError
    }
}

/// SIGTERM/SIGINT listener that lives for the whole periodic loop
#[cfg(unix)]
struct ShutdownSignal {
    sigterm: Signal,
    sigint: Signal,
}

#[cfg(unix)]
impl ShutdownSignal {
    fn install() -> Result<Self> {
        let sigterm = signal(SignalKind::terminate())
            .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
        let sigint = signal(SignalKind::interrupt())
            .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

        Ok(Self { sigterm, sigint })
    }

    /// Wait for the next signal; cancel-safe
    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}

/// CTRL-C listener
///
/// Fallback implementation for Windows.
#[cfg(windows)]
struct ShutdownSignal {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(windows)]
impl ShutdownSignal {
    fn install() -> Result<Self> {
        let ctrl_c = tokio::signal::windows::ctrl_c()
            .map_err(|e| anyhow::anyhow!("Failed to setup CTRL-C handler: {}", e))?;
        Ok(Self { ctrl_c })
    }

    async fn recv(&mut self) -> &'static str {
        self.ctrl_c.recv().await;
        "CTRL-C"
    }
}
