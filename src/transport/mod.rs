//! Device transport: authenticated CLI sessions with retry discipline.
//!
//! The transport layer opens an authenticated command-line session to one
//! device, sends text commands, and returns raw text. It never interprets
//! command output; that is the vendor layer's job.
//!
//! Two seams keep everything above this module testable without a switch on
//! the bench: [`DeviceSession`] (one open session) and [`Connector`]
//! (session factory with the retry/backoff policy).

pub mod buffer;
pub mod config;
pub mod ssh;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use regex::bytes::Regex;
use russh::ChannelMsg;
use russh::client::Msg;
use secrecy::ExposeSecret;

use crate::config::{AuthSettings, ProcessingSettings};
use crate::error::{Result, TransportError};
use crate::model::Device;
use crate::vendor::VendorProfile;

pub use buffer::PatternBuffer;
pub use config::{AuthMethod, SshConfig};
pub use ssh::SshTransport;

/// One open, privilege-elevated CLI session on a device.
#[async_trait]
pub trait DeviceSession: Send {
    /// Send one line of vendor CLI and return the raw output.
    async fn send_command(&mut self, command: &str) -> Result<String>;

    /// Apply a batch of configuration lines inside the vendor's
    /// configuration mode. Used only by the mutation path.
    async fn send_config_set(&mut self, commands: &[String]) -> Result<String>;

    /// Release the session. Must be called exactly once per successful
    /// connect, on every exit path.
    async fn close(&mut self) -> Result<()>;
}

/// Session factory carrying the per-run retry discipline.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Attempt to open a session to `device`, retrying transient failures.
    ///
    /// Exhaustion returns `None` rather than an error so callers can branch
    /// into a failed result without unwinding.
    async fn connect(&self, device: &Device) -> Option<Box<dyn DeviceSession>>;
}

/// SSH-backed [`Connector`] using the shared fleet credentials.
pub struct SshConnector {
    auth: Arc<AuthSettings>,
    processing: ProcessingSettings,
}

impl SshConnector {
    pub fn new(auth: Arc<AuthSettings>, processing: ProcessingSettings) -> Self {
        Self { auth, processing }
    }

    async fn try_connect(&self, device: &Device) -> Result<SshSession> {
        let profile = device.family.profile();

        let auth = match &device.ssh_key_file {
            Some(path) => AuthMethod::PrivateKey {
                path: path.clone(),
                passphrase: None,
            },
            None => AuthMethod::Password(
                self.auth
                    .password
                    .as_ref()
                    .map(|p| p.expose_secret().to_owned())
                    .unwrap_or_default(),
            ),
        };

        let ssh_config = SshConfig {
            host: device.ip_address.clone(),
            username: self.auth.username.clone(),
            auth,
            timeout: self.processing.timeout(),
            ..SshConfig::default()
        };

        let mut session = SshSession::open(ssh_config, profile).await?;

        // Enter enable mode before handing the session out; elevation
        // failure is a connection failure.
        let enable_secret = self
            .auth
            .enable_password
            .as_ref()
            .map(|s| s.expose_secret().to_owned());
        if let Err(e) = session.elevate(enable_secret.as_deref()).await {
            let _ = session.close().await;
            return Err(e);
        }
        if let Err(e) = session.prepare_terminal().await {
            let _ = session.close().await;
            return Err(e);
        }

        Ok(session)
    }
}

#[async_trait]
impl Connector for SshConnector {
    async fn connect(&self, device: &Device) -> Option<Box<dyn DeviceSession>> {
        let session = with_retry(
            &device.hostname,
            self.processing.connection_retries,
            self.processing.retry_delay(),
            || self.try_connect(device),
        )
        .await?;
        Some(Box::new(session))
    }
}

/// Run `attempt` up to `retries` times, sleeping `delay` between attempts
/// but not after the final one. Exhaustion returns `None`.
pub(crate) async fn with_retry<T, F, Fut>(
    hostname: &str,
    retries: u32,
    delay: Duration,
    mut attempt: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let retries = retries.max(1);

    for n in 1..=retries {
        match attempt().await {
            Ok(value) => {
                info!("Successfully connected to {hostname}");
                return Some(value);
            }
            Err(e) => {
                warn!("Connection attempt {n} failed for {hostname}: {e}");
                if n < retries {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    error!("Failed to connect to {hostname} after {retries} attempts");
    None
}

/// A live prompt-scraped session over an SSH PTY.
pub struct SshSession {
    transport: Option<SshTransport>,
    channel: russh::Channel<Msg>,
    buffer: PatternBuffer,
    profile: VendorProfile,
    timeout: Duration,
}

impl SshSession {
    /// Connect, request a PTY + shell, and wait for the first prompt.
    pub async fn open(config: SshConfig, profile: VendorProfile) -> Result<Self> {
        let timeout = config.timeout;
        let transport = SshTransport::connect(config).await?;
        let channel = transport.open_channel().await?;

        let mut session = Self {
            transport: Some(transport),
            channel,
            buffer: PatternBuffer::default(),
            profile,
            timeout,
        };

        // Swallow the login banner up to the first prompt.
        if let Err(e) = session.read_until_prompt().await {
            let _ = session.close().await;
            return Err(e);
        }
        Ok(session)
    }

    /// Enter the vendor's privileged mode, answering the secret prompt
    /// if the device asks for one.
    pub async fn elevate(&mut self, enable_secret: Option<&str>) -> Result<()> {
        let Some(enable) = self.profile.enable.clone() else {
            return Ok(());
        };

        self.buffer.clear();
        self.send_line(enable.command).await?;

        let (matched, _) = self
            .read_until_any(&[&enable.auth_prompt, &enable.elevated_prompt])
            .await
            .map_err(|e| TransportError::ElevationFailed(e.to_string()))?;

        if matched == 0 {
            self.buffer.clear();
            self.send_line(enable_secret.unwrap_or_default()).await?;
            self.read_until(&enable.elevated_prompt)
                .await
                .map_err(|e| TransportError::ElevationFailed(e.to_string()))?;
        }

        debug!("Privilege elevation complete");
        Ok(())
    }

    /// Run the vendor's session-setup commands (pagination off, wide terminal).
    pub async fn prepare_terminal(&mut self) -> Result<()> {
        for command in self.profile.on_open {
            self.exec(command).await?;
        }
        Ok(())
    }

    async fn send_line(&mut self, line: &str) -> Result<()> {
        let payload = format!("{line}\n");
        self.channel
            .data(payload.as_bytes())
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }

    /// Read channel data into the buffer until `pattern` appears in the tail.
    async fn read_until(&mut self, pattern: &Regex) -> Result<Vec<u8>> {
        let (_, data) = self.read_until_any(&[pattern]).await?;
        Ok(data)
    }

    /// Read until any of `patterns` matches; returns the matching index and
    /// the buffered output.
    async fn read_until_any(&mut self, patterns: &[&Regex]) -> Result<(usize, Vec<u8>)> {
        loop {
            for (idx, pattern) in patterns.iter().enumerate() {
                if self.buffer.tail_contains(pattern) {
                    return Ok((idx, self.buffer.take()));
                }
            }
            self.fill().await?;
        }
    }

    async fn read_until_prompt(&mut self) -> Result<Vec<u8>> {
        let prompt = self.profile.prompt.clone();
        self.read_until(&prompt).await
    }

    /// Pull the next chunk of channel data into the buffer.
    async fn fill(&mut self) -> Result<()> {
        let msg = tokio::time::timeout(self.timeout, self.channel.wait())
            .await
            .map_err(|_| TransportError::PromptTimeout(self.timeout))?;

        match msg {
            Some(ChannelMsg::Data { data }) => {
                self.buffer.extend(&data);
                Ok(())
            }
            Some(ChannelMsg::ExtendedData { data, .. }) => {
                self.buffer.extend(&data);
                Ok(())
            }
            Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                Err(TransportError::Disconnected.into())
            }
            Some(_) => Ok(()),
        }
    }

    /// Send a command and return its output with the echo and trailing
    /// prompt stripped.
    async fn exec(&mut self, command: &str) -> Result<String> {
        if self.transport.is_none() {
            return Err(TransportError::Disconnected.into());
        }

        self.buffer.clear();
        self.send_line(command).await?;
        let data = self.read_until_prompt().await?;
        let raw = String::from_utf8_lossy(&data).to_string();

        Ok(normalize_output(&raw, command))
    }
}

#[async_trait]
impl DeviceSession for SshSession {
    async fn send_command(&mut self, command: &str) -> Result<String> {
        self.exec(command).await
    }

    async fn send_config_set(&mut self, commands: &[String]) -> Result<String> {
        let enter = self.profile.config_enter;
        let exit = self.profile.config_exit;

        let mut output = self.exec(enter).await?;
        for command in commands {
            output.push('\n');
            output.push_str(&self.exec(command).await?);
        }
        output.push('\n');
        output.push_str(&self.exec(exit).await?);
        Ok(output)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(transport) = self.transport.take() {
            let _ = self.channel.eof().await;
            transport.close().await?;
        }
        Ok(())
    }
}

/// Strip the command echo from the beginning and the prompt line from the
/// end of raw PTY output.
fn normalize_output(raw: &str, command: &str) -> String {
    let output = raw
        .strip_prefix(command)
        .unwrap_or(raw)
        .trim_start_matches(['\r', '\n']);

    match output.rfind('\n') {
        Some(pos) => output[..pos].to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_echo_and_prompt() {
        let raw = "show vlan brief\r\nVLAN Name\r\n1 default\r\nswitch#";
        let normalized = normalize_output(raw, "show vlan brief");
        assert_eq!(normalized, "VLAN Name\r\n1 default\r");
    }

    #[test]
    fn normalize_output_without_echo() {
        let raw = "some output\nswitch#";
        assert_eq!(normalize_output(raw, "other command"), "some output");
    }

    #[test]
    fn normalize_single_line_is_empty() {
        // Only the prompt came back: no output.
        assert_eq!(normalize_output("switch#", "show clock"), "");
    }

    #[tokio::test(start_paused = true)]
    async fn retry_exhaustion_returns_none_after_all_attempts() {
        let attempts = std::cell::Cell::new(0u32);
        let started = tokio::time::Instant::now();

        let outcome: Option<()> = with_retry("sw1", 3, Duration::from_secs(5), || {
            attempts.set(attempts.get() + 1);
            async { Err(TransportError::Disconnected.into()) }
        })
        .await;

        assert!(outcome.is_none());
        assert_eq!(attempts.get(), 3);
        // Two sleeps between three attempts; none after the final one.
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_stops_on_first_success() {
        let attempts = std::cell::Cell::new(0u32);

        let outcome = with_retry("sw1", 3, Duration::from_secs(5), || {
            attempts.set(attempts.get() + 1);
            let n = attempts.get();
            async move {
                if n < 2 {
                    Err(TransportError::Disconnected.into())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(outcome, Some(2));
        assert_eq!(attempts.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_treats_zero_as_one_attempt() {
        let attempts = std::cell::Cell::new(0u32);
        let outcome: Option<()> = with_retry("sw1", 0, Duration::from_secs(5), || {
            attempts.set(attempts.get() + 1);
            async { Err(TransportError::Disconnected.into()) }
        })
        .await;
        assert!(outcome.is_none());
        assert_eq!(attempts.get(), 1);
    }
}
