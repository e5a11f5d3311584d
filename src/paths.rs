use anyhow::Result;
use std::{env, path::PathBuf};

#[derive(Clone)]
pub struct Paths {
    pub config: PathBuf,
}

/// Configuration directory: `$XDG_CONFIG_HOME/calsync`, falling back to
/// `~/.config/calsync`.
pub fn calsync_home() -> Result<PathBuf> {
    let xdg = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty());
    let base = xdg
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env::var_os("HOME").unwrap_or_default()).join(".config"));
    Ok(base.join("calsync"))
}

pub fn paths() -> Result<Paths> {
    Ok(Paths {
        config: calsync_home()?.join("config.toml"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::ffi::OsString;

    struct EnvGuard(&'static str, Option<OsString>);

    impl EnvGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let old = env::var_os(key);
            unsafe { env::set_var(key, value) };
            EnvGuard(key, old)
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.1 {
                Some(v) => unsafe { env::set_var(self.0, v) },
                None => unsafe { env::remove_var(self.0) },
            }
        }
    }

    #[test]
    #[serial]
    fn prefers_xdg_config_home() {
        let _xdg = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg");
        assert_eq!(calsync_home().unwrap(), PathBuf::from("/tmp/xdg/calsync"));
        assert_eq!(paths().unwrap().config, PathBuf::from("/tmp/xdg/calsync/config.toml"));
    }

    #[test]
    #[serial]
    fn falls_back_to_home_dot_config() {
        let _xdg = EnvGuard::set("XDG_CONFIG_HOME", "");
        let _home = EnvGuard::set("HOME", "/home/jane");
        assert_eq!(calsync_home().unwrap(), PathBuf::from("/home/jane/.config/calsync"));
    }
}
