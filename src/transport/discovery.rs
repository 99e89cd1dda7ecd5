//! # MAC Address Discovery
//!
//! Finds a printer's IPv4 address from its MAC address by reading the
//! kernel's neighbour (ARP) table. DHCP can move a printer around the
//! subnet; its MAC never changes.
//!
//! ## Steps
//!
//! 1. Populate the ARP cache (best effort):
//!    `ping -c 1 -b 255.255.255.255`, or, if that cannot run, a sweep of
//!    `ping -c 1 <prefix>.1` … `<prefix>.254` when a sweep prefix is set
//! 2. Read the table: `arp -an`, falling back to `ip neigh show`
//! 3. Take the first line mentioning the MAC and pull out the address
//!
//! ## Table Formats
//!
//! ```text
//! ? (192.168.1.50) at aa:bb:cc:dd:ee:ff [ether] on eth0      arp -an
//! 192.168.1.50 dev eth0 lladdr aa:bb:cc:dd:ee:ff REACHABLE    ip neigh show
//! ```
//!
//! Every subprocess runs under a timeout. Discovery never fails: anything
//! that goes wrong ends in `None` and a log line.

use std::io::{self, Read};
use std::net::Ipv4Addr;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

/// Default timeout for each discovery subprocess
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Timeout for each ping of a subnet sweep
pub const SWEEP_PING_TIMEOUT: Duration = Duration::from_millis(100);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Neighbour table commands, tried in order
const NEIGHBOR_COMMANDS: &[(&str, &[&str])] = &[("arp", &["-an"]), ("ip", &["neigh", "show"])];

/// Source of neighbour-table text.
///
/// [`SystemNeighborTable`] shells out to `ping`, `arp` and `ip`; tests
/// supply canned output.
pub trait NeighborTable {
    /// Try to get the target into the cache. Failures are ignored.
    fn populate(&self, timeout: Duration);

    /// The raw table text, or `None` if no command produced any.
    fn dump(&self, timeout: Duration) -> Option<String>;
}

/// The host's ARP table, read through system commands.
#[derive(Debug, Clone, Default)]
pub struct SystemNeighborTable {
    /// `/24` prefix to sweep when broadcast ping is unavailable, e.g. "192.168.68"
    pub sweep_prefix: Option<String>,
}

impl SystemNeighborTable {
    pub fn new(sweep_prefix: Option<String>) -> Self {
        Self { sweep_prefix }
    }

    fn sweep(&self, prefix: &str) {
        debug!(prefix, "Broadcast ping failed, trying sequential ping");
        for host in 1..=254 {
            let target = format!("{}.{}", prefix, host);
            let _ = run_with_timeout(
                Command::new("ping").args(["-c", "1", target.as_str()]),
                SWEEP_PING_TIMEOUT,
            );
        }
    }
}

impl NeighborTable for SystemNeighborTable {
    fn populate(&self, timeout: Duration) {
        let broadcast = run_with_timeout(
            Command::new("ping").args(["-c", "1", "-b", "255.255.255.255"]),
            timeout,
        );

        match (broadcast, &self.sweep_prefix) {
            (Ok(Some(output)), _) if output.success() => {}
            (_, Some(prefix)) => self.sweep(prefix),
            (result, None) => debug!(?result, "Broadcast ping failed and no sweep prefix set"),
        }
    }

    fn dump(&self, timeout: Duration) -> Option<String> {
        first_successful(NEIGHBOR_COMMANDS, timeout)
    }
}

/// A command that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Run a command, capturing stdout, killing it after `timeout`.
///
/// Returns `Ok(None)` on timeout. Stdout is drained while the command runs,
/// so large tables cannot fill the pipe and stall it.
pub fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> io::Result<Option<CommandOutput>> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    let reader = child.stdout.take().map(|mut out| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            out.read_to_end(&mut buf).map(|_| buf)
        })
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stdout = match reader {
        Some(handle) => handle
            .join()
            .map_err(|_| io::Error::other("stdout reader panicked"))??,
        None => Vec::new(),
    };

    Ok(Some(CommandOutput {
        status,
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
    }))
}

/// Output of the first command that exits successfully.
fn first_successful(commands: &[(&str, &[&str])], timeout: Duration) -> Option<String> {
    for (program, args) in commands {
        match run_with_timeout(Command::new(program).args(*args), timeout) {
            Ok(Some(output)) if output.success() => return Some(output.stdout),
            Ok(Some(output)) => debug!(program, status = %output.status, "Command failed"),
            Ok(None) => debug!(program, "Command timed out"),
            Err(e) => debug!(program, error = %e, "Command could not run"),
        }
    }
    None
}

/// Lowercase a MAC address and use `:` separators.
///
/// ```
/// use etiqueta::transport::discovery::normalize_mac;
///
/// assert_eq!(normalize_mac("AA-BB-CC-DD-EE-FF"), "aa:bb:cc:dd:ee:ff");
/// ```
pub fn normalize_mac(mac: &str) -> String {
    mac.trim().to_lowercase().replace('-', ":")
}

/// Validate a MAC address format (XX:XX:XX:XX:XX:XX).
pub fn is_valid_mac(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split(':').collect();
    if parts.len() != 6 {
        return false;
    }
    parts
        .iter()
        .all(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Find the address for `mac` in `arp -an` or `ip neigh show` output.
///
/// `mac` must already be normalised. The first line that mentions it and
/// carries a parseable address wins.
pub fn parse_neighbor_table(output: &str, mac: &str) -> Option<Ipv4Addr> {
    output
        .lines()
        .filter(|line| line.to_lowercase().contains(mac))
        .find_map(line_address)
}

fn line_address(line: &str) -> Option<Ipv4Addr> {
    if let Some(open) = line.find('(') {
        let rest = &line[open + 1..];
        if let Some(close) = rest.find(')') {
            if let Ok(ip) = rest[..close].parse() {
                return Some(ip);
            }
        }
    }

    // Leading token must be followed by whitespace
    let (first, _) = line.split_once(char::is_whitespace)?;
    first.parse().ok()
}

/// Find a printer's IPv4 address by MAC using the system ARP table.
///
/// ## Example
///
/// ```no_run
/// use std::time::Duration;
/// use etiqueta::transport::discover_by_mac;
///
/// if let Some(ip) = discover_by_mac("AA:BB:CC:DD:EE:FF", Duration::from_secs(2)) {
///     println!("printer at {}", ip);
/// }
/// ```
pub fn discover_by_mac(mac: &str, timeout: Duration) -> Option<Ipv4Addr> {
    discover_by_mac_with(&SystemNeighborTable::default(), mac, timeout)
}

/// [`discover_by_mac`] against any neighbour table.
pub fn discover_by_mac_with(
    table: &dyn NeighborTable,
    mac: &str,
    timeout: Duration,
) -> Option<Ipv4Addr> {
    if mac.trim().is_empty() {
        error!("Cannot find printer: Empty MAC address provided");
        return None;
    }
    let mac = normalize_mac(mac);
    if !is_valid_mac(&mac) {
        warn!(mac = %mac, "MAC address does not look like XX:XX:XX:XX:XX:XX");
    }

    table.populate(timeout);

    let Some(output) = table.dump(timeout) else {
        error!("Could not get ARP information using any available command");
        return None;
    };

    match parse_neighbor_table(&output, &mac) {
        Some(ip) => {
            info!(mac = %mac, %ip, "Found printer");
            Some(ip)
        }
        None => {
            warn!(mac = %mac, "No device found with MAC address");
            None
        }
    }
}
