//! Plausible browser fingerprints for the challenge handshake.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

/// Operating system family the fingerprint pretends to run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    MacOs,
    Linux,
}

const WINDOWS_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
];

const MACOS_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.7; rv:133.0) Gecko/20100101 Firefox/133.0",
];

const LINUX_AGENTS: &[&str] = &[
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0",
];

const DEVICE_MEMORY: &[u32] = &[4, 8, 16, 32];
const HARDWARE_CONCURRENCY: &[u32] = &[4, 8, 16];

impl OsFamily {
    /// The family of the running host.
    pub fn current() -> Self {
        match std::env::consts::OS {
            "windows" => OsFamily::Windows,
            "macos" => OsFamily::MacOs,
            _ => OsFamily::Linux,
        }
    }

    /// `navigator.platform` value.
    pub fn platform(&self) -> &'static str {
        match self {
            OsFamily::Windows => "Win32",
            OsFamily::MacOs => "MacIntel",
            OsFamily::Linux => "Linux x86_64",
        }
    }

    pub fn user_agents(&self) -> &'static [&'static str] {
        match self {
            OsFamily::Windows => WINDOWS_AGENTS,
            OsFamily::MacOs => MACOS_AGENTS,
            OsFamily::Linux => LINUX_AGENTS,
        }
    }
}

/// A randomized but self-consistent browser identity.
#[derive(Debug, Clone)]
pub struct Fingerprint {
    pub user_agent: String,
    pub platform: &'static str,
    pub device_memory: u32,
    pub hardware_concurrency: u32,
}

impl Fingerprint {
    pub fn random(os: OsFamily) -> Self {
        let mut rng = rand::thread_rng();
        let user_agent = os
            .user_agents()
            .choose(&mut rng)
            .copied()
            .unwrap_or(LINUX_AGENTS[0]);
        Self {
            user_agent: user_agent.to_string(),
            platform: os.platform(),
            device_memory: DEVICE_MEMORY[rng.gen_range(0..DEVICE_MEMORY.len())],
            hardware_concurrency: HARDWARE_CONCURRENCY
                [rng.gen_range(0..HARDWARE_CONCURRENCY.len())],
        }
    }

    pub fn browser_info(&self) -> BrowserInfo<'_> {
        BrowserInfo {
            cookie_enabled: true,
            device_memory: self.device_memory,
            hardware_concurrency: self.hardware_concurrency,
            language: "zh-CN",
            platform: self.platform,
            timezone: "Asia/Shanghai",
            user_agent: &self.user_agent,
        }
    }
}

/// The `browser_info` object posted with a challenge answer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserInfo<'a> {
    pub cookie_enabled: bool,
    pub device_memory: u32,
    pub hardware_concurrency: u32,
    pub language: &'static str,
    pub platform: &'static str,
    pub timezone: &'static str,
    pub user_agent: &'a str,
}
