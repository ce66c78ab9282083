//! Configuration loading: each setting reads from its environment variable
//! first, falling back to a command-line flag (env wins when present and
//! non-empty).

#[derive(Debug, Clone)]
pub struct Config {
    pub run_address: String,
    pub database_uri: String,
    pub accrual_system_address: String,
}

impl Config {
    /// Loads configuration from the process environment and argv:
    /// `RUN_ADDRESS`/`-a`, `DATABASE_URI`/`-d`, `ACCRUAL_SYSTEM_ADDRESS`/`-r`.
    pub fn load() -> Self {
        Self::from_args(std::env::args().skip(1))
    }

    fn from_args(args: impl Iterator<Item = String>) -> Self {
        let flags = parse_flags(args);

        Self {
            run_address: resolve("RUN_ADDRESS", "a", &flags).unwrap_or_else(|| ":8081".to_string()),
            database_uri: resolve("DATABASE_URI", "d", &flags).unwrap_or_default(),
            accrual_system_address: resolve("ACCRUAL_SYSTEM_ADDRESS", "r", &flags).unwrap_or_default(),
        }
    }
}

fn parse_flags(args: impl Iterator<Item = String>) -> std::collections::HashMap<String, String> {
    let mut flags = std::collections::HashMap::new();
    let mut args = args.peekable();

    while let Some(arg) = args.next() {
        let Some(name) = arg.strip_prefix('-') else {
            continue;
        };
        if let Some((name, value)) = name.split_once('=') {
            flags.insert(name.to_string(), value.to_string());
        } else if let Some(value) = args.peek() {
            if !value.starts_with('-') {
                flags.insert(name.to_string(), value.clone());
                args.next();
            }
        }
    }

    flags
}

fn resolve(env_key: &str, flag: &str, flags: &std::collections::HashMap<String, String>) -> Option<String> {
    std::env::var(env_key)
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| flags.get(flag).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_used_when_env_absent() {
        // SAFETY: test-only, single-threaded access to process env.
        unsafe {
            std::env::remove_var("RUN_ADDRESS");
        }
        let cfg = Config::from_args(vec!["-a".to_string(), "127.0.0.1:9000".to_string()].into_iter());
        assert_eq!(cfg.run_address, "127.0.0.1:9000");
    }

    #[test]
    fn defaults_apply_when_nothing_set() {
        unsafe {
            std::env::remove_var("RUN_ADDRESS");
        }
        let cfg = Config::from_args(std::iter::empty());
        assert_eq!(cfg.run_address, ":8081");
    }
}
