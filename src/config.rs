//! Configuration resolution: explicit arguments, then `LFPS_*` environment
//! variables, then an `.lfpsrc` file.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Public service endpoint used when no other URL is configured.
pub(crate) const DEFAULT_URL: &str = "https://lfps.usgs.gov/api/job";

#[derive(Debug, Default)]
struct RcConfig {
    url: Option<String>,
    email: Option<String>,
}

/// Base URL resolution; always succeeds because the crate ships a default.
pub(crate) fn resolve_url(explicit: Option<String>) -> Result<String> {
    if let Some(url) = first_nonempty([explicit]) {
        return Ok(url);
    }
    let rc = rc_field(|cfg| cfg.url)?;
    Ok(first_nonempty([std::env::var("LFPS_URL").ok(), rc])
        .unwrap_or_else(|| DEFAULT_URL.to_string()))
}

/// Requester email resolution; the service refuses anonymous jobs, so there
/// is no default. The rc file is only consulted when the explicit argument
/// and environment leave the email unresolved.
pub(crate) fn resolve_email(explicit: Option<&str>) -> Result<String> {
    if let Some(email) = first_nonempty([explicit.map(str::to_string)]) {
        return Ok(email);
    }
    let rc = rc_field(|cfg| cfg.email)?;
    email_from(None, std::env::var("LFPS_EMAIL").ok(), rc)
}

/// Pure precedence core, split out so it is testable without touching
/// process environment (mutating env vars is unsafe in edition 2024).
fn email_from(
    explicit: Option<String>,
    env: Option<String>,
    rc: Option<String>,
) -> Result<String> {
    first_nonempty([explicit, env, rc]).ok_or(Error::MissingEmail)
}

/// First candidate that is non-empty after trimming. Empty strings fall
/// through to the next source rather than masking it.
fn first_nonempty(candidates: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

fn rc_field(field: impl Fn(RcConfig) -> Option<String>) -> Result<Option<String>> {
    for path in rc_candidates() {
        if path.exists() {
            let cfg = read_rc(&path).map_err(|e| Error::Config {
                detail: format!("failed to read {}: {e}", path.display()),
            })?;
            return Ok(field(cfg));
        }
    }
    Ok(None)
}

/// Default location for the content-addressed dataset cache.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("lfps"))
        .unwrap_or_else(|| PathBuf::from("lfps-cache"))
}

fn read_rc(path: &Path) -> std::io::Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_rc(&text))
}

fn parse_rc(text: &str) -> RcConfig {
    let mut cfg = RcConfig::default();

    // Support formatting where `email:` is on one line and the value is on
    // the next line.
    let mut pending_key: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key {
            // Continuation value line (no colon)
            if !line.contains(':') {
                let v = strip_quotes(line);
                match pk {
                    "url" => cfg.url = Some(v.to_string()),
                    "email" => cfg.email = Some(v.to_string()),
                    _ => {}
                }
                pending_key = None;
                continue;
            }
            pending_key = None;
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            match k {
                "url" => {
                    if !v.is_empty() {
                        cfg.url = Some(v.to_string());
                    } else {
                        pending_key = Some("url");
                    }
                }
                "email" => {
                    if !v.is_empty() {
                        cfg.email = Some(v.to_string());
                    } else {
                        pending_key = Some("email");
                    }
                }
                _ => {}
            }
        }
    }

    cfg
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // Search order:
    // 1) LFPS_RC (explicit)
    // 2) ./.lfpsrc (current working directory)
    // 3) ~/.lfpsrc
    if let Ok(p) = std::env::var("LFPS_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".lfpsrc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".lfpsrc"));
    }
    v
}
