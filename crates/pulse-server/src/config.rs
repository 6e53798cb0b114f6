use clap::Parser;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATABASE: &str = "database.sqlite";
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

#[derive(Parser, Debug)]
#[command(name = "pulse-server")]
pub struct Args {
    /// Listen address; overrides BOT_LPORT.
    #[arg(long, default_value = "")]
    addr: String,
    /// SQLite database path; overrides DATABASE.
    #[arg(long, default_value = "")]
    database: String,
    #[arg(long, default_value_t = false)]
    debug: bool,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: String,
    pub database: String,
    pub bot_token: String,
    pub api_base: String,
    pub debug: bool,
}

impl Config {
    pub fn load() -> Self {
        let args = Args::parse();
        Self::from_args(args)
    }

    fn from_args(args: Args) -> Self {
        Self {
            addr: resolve_addr(&args.addr),
            database: resolve_or(&args.database, "DATABASE", DEFAULT_DATABASE),
            bot_token: env_or("TELEGRAM_BOT_TOKEN", ""),
            api_base: env_or("TELEGRAM_API_BASE", DEFAULT_API_BASE),
            debug: args.debug,
        }
    }
}

fn resolve_addr(addr_flag: &str) -> String {
    if !addr_flag.trim().is_empty() {
        return addr_flag.trim().to_string();
    }
    let port = env_or("BOT_LPORT", "")
        .parse::<u16>()
        .unwrap_or(DEFAULT_PORT);
    format!("127.0.0.1:{port}")
}

fn resolve_or(flag: &str, key: &str, default: &str) -> String {
    if !flag.trim().is_empty() {
        return flag.trim().to_string();
    }
    env_or(key, default)
}

fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addr_flag_wins_over_port_default() {
        assert_eq!(resolve_addr("0.0.0.0:9000"), "0.0.0.0:9000");
    }

    #[test]
    fn default_addr_is_loopback_on_default_port() {
        // BOT_LPORT is unset (or non-numeric) in the test environment either
        // way the fallback port applies.
        let addr = resolve_addr("");
        assert!(addr.starts_with("127.0.0.1:"));
    }
}
