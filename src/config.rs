use std::env;
use std::path::PathBuf;
use std::time::Duration;

const APP_DIR: &str = "volley_tracker";

/// Who serves first when a new set starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewSetServe {
    /// Home always opens the set.
    #[default]
    Home,
    /// The side that received first in the previous set opens the next one.
    Alternate,
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub home_name: String,
    pub opponent: String,
    pub export_dir: PathBuf,
    pub new_set_serve: NewSetServe,
    pub demo: bool,
    pub demo_rally_interval: Duration,
    pub toast_secs: u64,
    pub sim_seed: Option<u64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            home_name: "HOME".to_string(),
            opponent: String::new(),
            export_dir: PathBuf::from("."),
            new_set_serve: NewSetServe::Home,
            demo: false,
            demo_rally_interval: Duration::from_millis(700),
            toast_secs: 3,
            sim_seed: None,
        }
    }
}

impl TrackerConfig {
    /// Loads `.env.local` / `.env` if present, then reads `VB_*` variables.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let home_name = lookup("VB_HOME_NAME")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.home_name);
        let opponent = lookup("VB_OPPONENT")
            .map(|v| v.trim().to_string())
            .unwrap_or_default();
        let export_dir = lookup("VB_EXPORT_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .or_else(|| default_export_dir(&lookup))
            .unwrap_or(defaults.export_dir);
        let new_set_serve = match lookup("VB_NEW_SET_SERVE")
            .map(|v| v.trim().to_lowercase())
            .as_deref()
        {
            Some("alternate") | Some("alt") => NewSetServe::Alternate,
            _ => NewSetServe::Home,
        };
        let demo = lookup("VB_DEMO").map(|v| parse_bool(&v)).unwrap_or(false);
        let demo_rally_ms = lookup("VB_DEMO_RALLY_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(700)
            .max(50);
        let toast_secs = lookup("VB_TOAST_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(defaults.toast_secs)
            .clamp(1, 30);
        let sim_seed = lookup("VB_SIM_SEED").and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            home_name,
            opponent,
            export_dir,
            new_set_serve,
            demo,
            demo_rally_interval: Duration::from_millis(demo_rally_ms),
            toast_secs,
            sim_seed,
        }
    }

    pub fn archive_path(&self) -> PathBuf {
        self.export_dir.join("archive.json")
    }
}

fn default_export_dir(lookup: &impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(base) = lookup("XDG_DATA_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(APP_DIR));
    }
    let home = lookup("HOME")?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR),
    )
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let cfg = TrackerConfig::from_lookup(|_| None);
        assert_eq!(cfg.home_name, "HOME");
        assert_eq!(cfg.new_set_serve, NewSetServe::Home);
        assert!(!cfg.demo);
        assert_eq!(cfg.export_dir, PathBuf::from("."));
        assert_eq!(cfg.toast_secs, 3);
    }

    #[test]
    fn values_are_parsed_and_clamped() {
        let cfg = TrackerConfig::from_lookup(lookup_from(&[
            ("VB_HOME_NAME", " Lions "),
            ("VB_NEW_SET_SERVE", "Alternate"),
            ("VB_DEMO", "yes"),
            ("VB_DEMO_RALLY_MS", "5"),
            ("VB_TOAST_SECS", "999"),
            ("VB_SIM_SEED", "42"),
            ("HOME", "/home/coach"),
        ]));
        assert_eq!(cfg.home_name, "Lions");
        assert_eq!(cfg.new_set_serve, NewSetServe::Alternate);
        assert!(cfg.demo);
        assert_eq!(cfg.demo_rally_interval, Duration::from_millis(50));
        assert_eq!(cfg.toast_secs, 30);
        assert_eq!(cfg.sim_seed, Some(42));
        assert_eq!(
            cfg.export_dir,
            PathBuf::from("/home/coach/.local/share/volley_tracker")
        );
    }

    #[test]
    fn explicit_export_dir_wins_over_xdg() {
        let cfg = TrackerConfig::from_lookup(lookup_from(&[
            ("VB_EXPORT_DIR", "/tmp/vb"),
            ("XDG_DATA_HOME", "/xdg"),
        ]));
        assert_eq!(cfg.archive_path(), PathBuf::from("/tmp/vb/archive.json"));
    }
}
