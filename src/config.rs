/*!
Structs to hold configuration data and global variables.
*/
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{auth::SessionKeys, store::Store};

/// Only a configuration value; change it in the config file for any real
/// deployment.
const DEFAULT_SESSION_SECRET: &str = "secret123";

#[derive(Deserialize)]
struct ConfigFile {
    db_path: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    template_dir: Option<String>,
    static_dir: Option<String>,
    session_secret: Option<String>,
    session_cookie: Option<String>,
    session_max_age: Option<u64>,
}

pub struct Cfg {
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub template_dir: PathBuf,
    pub static_dir: PathBuf,
    pub session_secret: String,
    pub session_cookie: String,
    /// Seconds. `None` means sessions last as long as the browser keeps
    /// the cookie.
    pub session_max_age: Option<u64>,
}

impl std::fmt::Debug for Cfg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cfg")
            .field("db_path", &self.db_path)
            .field("addr", &self.addr)
            .field("template_dir", &self.template_dir)
            .field("static_dir", &self.static_dir)
            .field("session_secret", &"[ redacted ]")
            .field("session_cookie", &self.session_cookie)
            .field("session_max_age", &self.session_max_age)
            .finish()
    }
}

impl std::default::Default for Cfg {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("roster.db"),
            addr: SocketAddr::from(([0, 0, 0, 0], 8001)),
            template_dir: PathBuf::from("templates"),
            static_dir: PathBuf::from("static"),
            session_secret: DEFAULT_SESSION_SECRET.to_owned(),
            session_cookie: "roster_session".to_owned(),
            session_max_age: None,
        }
    }
}

impl Cfg {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let file_contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Unable to read config file: {}", &e))?;
        Self::from_toml(&file_contents)
    }

    /// Settings from TOML text, with anything absent left at its default.
    pub fn from_toml(text: &str) -> Result<Self, String> {
        let cf: ConfigFile = toml::from_str(text)
            .map_err(|e| format!("Unable to deserialize config file: {}", &e))?;

        let mut c = Self::default();

        if let Some(s) = cf.db_path {
            c.db_path = PathBuf::from(s);
        }
        if let Some(s) = cf.host {
            let ip: IpAddr = s.parse().map_err(|e| format!(
                "Error parsing {:?} as IP address: {}",
                &s, &e
            ))?;
            c.addr.set_ip(ip);
        }
        if let Some(n) = cf.port {
            c.addr.set_port(n);
        }
        if let Some(s) = cf.template_dir {
            c.template_dir = PathBuf::from(s);
        }
        if let Some(s) = cf.static_dir {
            c.static_dir = PathBuf::from(s);
        }
        if let Some(s) = cf.session_secret {
            if s.is_empty() {
                return Err("session_secret must not be empty.".to_owned());
            }
            c.session_secret = s;
        }
        if let Some(s) = cf.session_cookie {
            c.session_cookie = s;
        }
        if let Some(n) = cf.session_max_age {
            c.session_max_age = Some(n);
        }

        Ok(c)
    }
}

/**
This guy hauls around the things every handler might need and is passed
in an `axum::Extension`.

Nothing in here changes after startup.
*/
#[derive(Debug)]
pub struct Glob {
    pub store: Store,
    pub sessions: SessionKeys,
}

/// Builds the `Glob` described by `cfg` and ensures all appropriate
/// database tables exist.
pub async fn load_configuration(cfg: &Cfg) -> Result<Glob, String> {
    log::trace!("load_configuration( {:?} ) called.", &cfg.db_path);

    let store = Store::new(&cfg.db_path);
    log::trace!("Checking state of data DB...");
    if let Err(e) = store.ensure_db_schema().await {
        let estr = format!("Unable to ensure state of data DB: {}", &e);
        return Err(estr);
    }
    log::trace!("...data DB okay.");

    let sessions = SessionKeys::new(
        &cfg.session_secret,
        cfg.session_cookie.clone(),
        cfg.session_max_age,
    ).map_err(|e| format!("Unable to set up sessions: {}", &e))?;

    Ok(Glob { store, sessions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::ensure_logging;

    #[test]
    fn defaults_from_empty_file() {
        let c = Cfg::from_toml("").unwrap();
        let d = Cfg::default();
        assert_eq!(c.db_path, d.db_path);
        assert_eq!(c.addr, d.addr);
        assert_eq!(c.session_secret, DEFAULT_SESSION_SECRET);
        assert_eq!(c.session_max_age, None);
    }

    #[test]
    fn overrides() {
        let c = Cfg::from_toml(r#"
db_path = "/var/lib/roster/school.db"
host = "127.0.0.1"
port = 8080
template_dir = "/usr/share/roster/templates"
session_secret = "frogs"
session_cookie = "sid"
session_max_age = 3600
"#).unwrap();

        assert_eq!(c.db_path, PathBuf::from("/var/lib/roster/school.db"));
        assert_eq!(c.addr, SocketAddr::from(([127, 0, 0, 1], 8080)));
        assert_eq!(c.template_dir, PathBuf::from("/usr/share/roster/templates"));
        assert_eq!(c.static_dir, PathBuf::from("static"));
        assert_eq!(c.session_secret, "frogs");
        assert_eq!(c.session_cookie, "sid");
        assert_eq!(c.session_max_age, Some(3600));
    }

    #[test]
    fn bad_files() {
        assert!(Cfg::from_toml(r#"host = "not an address""#).is_err());
        assert!(Cfg::from_toml(r#"port = "eighty""#).is_err());
        assert!(Cfg::from_toml(r#"session_secret = """#).is_err());
        assert!(Cfg::from_file("/definitely/not/here.toml").is_err());
    }

    #[tokio::test]
    async fn load_creates_schema() {
        ensure_logging();

        let dir = tempfile::tempdir().unwrap();
        let cfg = Cfg {
            db_path: dir.path().join("roster.db"),
            ..Cfg::default()
        };
        let glob = load_configuration(&cfg).await.unwrap();
        assert!(glob.store.list::<crate::store::Student>().await.unwrap().is_empty());
        assert_eq!(glob.sessions.cookie_name(), "roster_session");
    }
}
