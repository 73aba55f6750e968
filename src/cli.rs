use clap::{Parser, Subcommand};

/// Promodesk — credential registry backend for the book-promotion dashboard
#[derive(Parser)]
#[command(name = "promodesk", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the backend server
    Serve {
        /// Port to bind
        #[arg(short, long, env = "PROMODESK_PORT", default_value = "8080")]
        port: u16,
    },

    /// Manage external service configurations
    Service {
        #[command(subcommand)]
        command: ServiceCommands,
    },
}

#[derive(Subcommand)]
pub enum ServiceCommands {
    /// List the catalog with configuration status
    List,
    /// Save an encrypted configuration for a service
    Configure {
        /// Service name from the catalog (e.g. anthropic, twitter)
        name: String,
        /// Primary credential (maps onto the service's main field)
        #[arg(long)]
        key: Option<String>,
        /// Additional field as KEY=VALUE; may be repeated
        #[arg(long = "field", value_parser = parse_key_val)]
        fields: Vec<(String, String)>,
    },
    /// Run a single connectivity test
    Test { name: String },
    /// Remove a stored configuration
    Remove { name: String },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_port_prefers_env_over_builtin_default() {
        // single test owns this env var; set and clear within it
        std::env::set_var("PROMODESK_PORT", "7777");
        let cli = Cli::try_parse_from(["promodesk", "serve"]).unwrap();
        match cli.command {
            Some(Commands::Serve { port }) => assert_eq!(port, 7777),
            _ => panic!("expected serve command"),
        }

        // an explicit flag still wins
        let cli = Cli::try_parse_from(["promodesk", "serve", "--port", "9000"]).unwrap();
        match cli.command {
            Some(Commands::Serve { port }) => assert_eq!(port, 9000),
            _ => panic!("expected serve command"),
        }

        std::env::remove_var("PROMODESK_PORT");
        let cli = Cli::try_parse_from(["promodesk", "serve"]).unwrap();
        match cli.command {
            Some(Commands::Serve { port }) => assert_eq!(port, 8080),
            _ => panic!("expected serve command"),
        }
    }

    #[test]
    fn key_val_parsing() {
        assert_eq!(
            parse_key_val("asin=B0ABC").unwrap(),
            ("asin".to_string(), "B0ABC".to_string())
        );
        // values may contain '='
        assert_eq!(
            parse_key_val("token=a=b").unwrap(),
            ("token".to_string(), "a=b".to_string())
        );
        assert!(parse_key_val("no-separator").is_err());
        assert!(parse_key_val("=value").is_err());
    }
}
