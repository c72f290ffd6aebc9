//! Signal handling for graceful shutdown and configuration reload.
//!
//! SIGINT and SIGTERM request shutdown; SIGHUP requests the administrative
//! reload (Unix only). On Windows only Ctrl+C shutdown is available.

use tracing::info;

/// What a received signal asks the application to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Shutdown,
    Reload,
}

#[cfg(unix)]
pub struct SignalListener {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
    sighup: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalListener {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
            sighup: signal(SignalKind::hangup())?,
        })
    }

    /// Waits for the next lifecycle signal.
    pub async fn recv(&mut self) -> Lifecycle {
        tokio::select! {
            _ = self.sigint.recv() => {
                info!("Received SIGINT");
                Lifecycle::Shutdown
            }
            _ = self.sigterm.recv() => {
                info!("Received SIGTERM");
                Lifecycle::Shutdown
            }
            _ = self.sighup.recv() => {
                info!("Received SIGHUP");
                Lifecycle::Reload
            }
        }
    }
}

#[cfg(windows)]
pub struct SignalListener;

#[cfg(windows)]
impl SignalListener {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self)
    }

    pub async fn recv(&mut self) -> Lifecycle {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C");
        Lifecycle::Shutdown
    }
}
