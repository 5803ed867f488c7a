use std::{env, fs, path::Path, path::PathBuf, time::Duration};

use crate::{errors::Error, suggest::DEFAULT_BOOKS, sweeper::OverduePolicy, Result};

pub const DEFAULT_DOOR_SERVICE_URL: &str = "http://100.110.75.56:5458";
pub const DEFAULT_ALLOWED_ROLES: [&str; 4] = ["BL001", "Member", "Mentor", "door"];

/// Typed configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub client_token: String,

    // Door relay
    pub door_service_url: String,
    pub door_allowed_roles: Vec<String>,
    pub door_channel: String,
    pub door_timeout: Duration,

    // Library
    pub borrow_channel: String,
    pub borrowings_file: PathBuf,
    pub book_suggestions: Vec<String>,

    // Reminders
    pub sweep_cron: String,
    pub overdue_policy: OverduePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_token: String::new(),
            door_service_url: DEFAULT_DOOR_SERVICE_URL.to_string(),
            door_allowed_roles: DEFAULT_ALLOWED_ROLES.iter().map(|s| s.to_string()).collect(),
            door_channel: "door".to_string(),
            door_timeout: Duration::from_millis(10_000),
            borrow_channel: "library".to_string(),
            borrowings_file: PathBuf::from("borrowings.json"),
            book_suggestions: DEFAULT_BOOKS.iter().map(|s| s.to_string()).collect(),
            sweep_cron: "0 8 * * *".to_string(),
            overdue_policy: OverduePolicy::Drop,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process environment in `load`).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        // Required
        let client_token = get("CLIENT_TOKEN").and_then(non_empty).ok_or_else(|| {
            Error::Config("CLIENT_TOKEN environment variable is required".to_string())
        })?;

        // Door relay
        let door_service_url = get("DOOR_SERVICE_URL")
            .and_then(non_empty)
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.door_service_url);
        if !door_service_url.starts_with("http://") && !door_service_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "DOOR_SERVICE_URL must be an http(s) URL, got {door_service_url}"
            )));
        }
        let door_allowed_roles =
            parse_csv(get("DOOR_ALLOWED_ROLES")).unwrap_or(defaults.door_allowed_roles);
        let door_channel = get("DOOR_CHANNEL")
            .and_then(non_empty)
            .unwrap_or(defaults.door_channel);
        let door_timeout = parse_u64(get("DOOR_TIMEOUT_MS"))
            .map(Duration::from_millis)
            .unwrap_or(defaults.door_timeout);

        // Library
        let borrow_channel = get("BORROW_CHANNEL")
            .and_then(non_empty)
            .unwrap_or(defaults.borrow_channel);
        let borrowings_file = get("BORROWINGS_FILE")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or(defaults.borrowings_file);
        let book_suggestions =
            parse_csv(get("BOOK_SUGGESTIONS")).unwrap_or(defaults.book_suggestions);

        // Reminders
        let sweep_cron = get("SWEEP_CRON")
            .and_then(non_empty)
            .unwrap_or(defaults.sweep_cron);
        let overdue_policy = match get("SWEEP_OVERDUE_POLICY").and_then(non_empty) {
            Some(v) => v.parse()?,
            None => defaults.overdue_policy,
        };

        Ok(Self {
            client_token,
            door_service_url,
            door_allowed_roles,
            door_channel,
            door_timeout,
            borrow_channel,
            borrowings_file,
            book_suggestions,
            sweep_cron,
            overdue_policy,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_u64(v: Option<String>) -> Option<u64> {
    v.and_then(|s| s.trim().parse::<u64>().ok())
}

fn parse_csv(v: Option<String>) -> Option<Vec<String>> {
    let v = v?;
    let out = v
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect::<Vec<_>>();
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn token_is_required() {
        assert!(matches!(
            Config::from_lookup(lookup(&[])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("CLIENT_TOKEN", "   ")])),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn defaults_match_the_community_setup() {
        let cfg = Config::from_lookup(lookup(&[("CLIENT_TOKEN", "abc")])).unwrap();
        assert_eq!(cfg.client_token, "abc");
        assert_eq!(cfg.door_service_url, DEFAULT_DOOR_SERVICE_URL);
        assert_eq!(cfg.door_allowed_roles, vec!["BL001", "Member", "Mentor", "door"]);
        assert_eq!(cfg.door_channel, "door");
        assert_eq!(cfg.borrow_channel, "library");
        assert_eq!(cfg.sweep_cron, "0 8 * * *");
        assert_eq!(cfg.overdue_policy, OverduePolicy::Drop);
        assert_eq!(cfg.book_suggestions.len(), 10);
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = Config::from_lookup(lookup(&[
            ("CLIENT_TOKEN", "abc"),
            ("DOOR_SERVICE_URL", "https://door.local:8443/"),
            ("DOOR_ALLOWED_ROLES", " Keyholder , ,Admin"),
            ("BORROW_CHANNEL", "books"),
            ("BOOK_SUGGESTIONS", "Dune,Emma"),
            ("SWEEP_OVERDUE_POLICY", "notify"),
            ("DOOR_TIMEOUT_MS", "2500"),
        ]))
        .unwrap();
        assert_eq!(cfg.door_service_url, "https://door.local:8443");
        assert_eq!(cfg.door_allowed_roles, vec!["Keyholder", "Admin"]);
        assert_eq!(cfg.borrow_channel, "books");
        assert_eq!(cfg.book_suggestions, vec!["Dune", "Emma"]);
        assert_eq!(cfg.overdue_policy, OverduePolicy::Notify);
        assert_eq!(cfg.door_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn bad_values_are_config_errors() {
        assert!(Config::from_lookup(lookup(&[
            ("CLIENT_TOKEN", "abc"),
            ("SWEEP_OVERDUE_POLICY", "maybe"),
        ]))
        .is_err());
        assert!(Config::from_lookup(lookup(&[
            ("CLIENT_TOKEN", "abc"),
            ("DOOR_SERVICE_URL", "door.local"),
        ]))
        .is_err());
    }

    #[test]
    fn dotenv_lines_are_parsed() {
        let parsed = parse_dotenv("# comment\nCLIENT_TOKEN=\"secret\"\n\nBAD LINE\nDOOR_CHANNEL = 'door'\n");
        assert_eq!(
            parsed,
            vec![
                ("CLIENT_TOKEN".to_string(), "secret".to_string()),
                ("DOOR_CHANNEL".to_string(), "door".to_string()),
            ]
        );
    }
}
