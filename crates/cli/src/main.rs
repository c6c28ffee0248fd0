use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wgcf_core::constants::profile::DEFAULT_FILE_NAME as DEFAULT_PROFILE_FILE;
use wgcf_core::constants::relay::DEFAULT_ENDPOINT;
use wgcf_core::{
    write_profile, AccountConfig, DeviceConfig, KeyError, KeyManager, ProfileData, PublicKey,
};

#[derive(Parser)]
#[command(name = "wgcf")]
#[command(about = "Generate WireGuard keys and profiles for the relay's VPN service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Account config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a private key, store it in the account config and print its public key
    Generate {
        /// Replace an existing private key
        #[arg(long)]
        force: bool,
    },
    /// Print the public key of the stored private key
    Pubkey,
    /// Print a fresh preshared key
    Psk,
    /// Render a WireGuard profile from the stored private key
    Profile {
        /// Server public key assigned by the relay
        #[arg(long)]
        peer_public_key: String,
        /// Server endpoint as host:port
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,
        /// Assigned IPv4 address
        #[arg(long)]
        address_v4: String,
        /// Assigned IPv6 address
        #[arg(long)]
        address_v6: String,
        /// Output file
        #[arg(short, long, default_value = DEFAULT_PROFILE_FILE)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.unwrap_or_else(AccountConfig::default_path);
    debug!(config = %config_path.display(), "using account config");

    match cli.command {
        Commands::Generate { force } => generate(&config_path, force),
        Commands::Pubkey => print_public_key(&config_path),
        Commands::Psk => print_preshared_key(),
        Commands::Profile {
            peer_public_key,
            endpoint,
            address_v4,
            address_v6,
            output,
        } => {
            let device = DeviceConfig {
                peer_public_key,
                endpoint,
                address_v4,
                address_v6,
            };
            generate_profile(&config_path, device, &output)
        }
    }
}

/// Entropy failures are a host problem, not bad input; say so and stop.
fn entropy_context(err: KeyError) -> anyhow::Error {
    match err {
        KeyError::EntropyFailure(_) => anyhow::Error::new(err)
            .context("the system's secure random source is unavailable; refusing to continue"),
        other => other.into(),
    }
}

fn load_config(path: &Path) -> Result<AccountConfig> {
    AccountConfig::load(path)
        .with_context(|| format!("could not load account config from {}", path.display()))
}

fn generate(config_path: &Path, force: bool) -> Result<()> {
    let mut config = load_config(config_path)?;
    if config.has_private_key() && !force {
        bail!(
            "{} already holds a private key; pass --force to replace it",
            config_path.display()
        );
    }

    let private_key = KeyManager::new()
        .generate_private_key()
        .map_err(entropy_context)?;
    config.set_private_key(&private_key);
    config.save(config_path)?;

    info!("generated new private key");
    println!("{}", private_key.public_key());
    Ok(())
}

fn print_public_key(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let private_key = config.private_key()?;
    println!("{}", private_key.public_key());
    Ok(())
}

fn print_preshared_key() -> Result<()> {
    let psk = KeyManager::new()
        .generate_preshared_key()
        .map_err(entropy_context)?;
    println!("{}", psk.to_base64());
    Ok(())
}

fn generate_profile(config_path: &Path, mut device: DeviceConfig, output: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let private_key = config.private_key()?;

    let peer_key = PublicKey::from_base64(device.peer_public_key.trim())
        .context("peer_public_key is not a valid key")?;
    if peer_key.is_zero() {
        bail!("peer_public_key is the all-zero key");
    }
    device.peer_public_key = peer_key.to_base64();

    let profile = ProfileData::new(&private_key, &device).render();
    write_profile(output, &profile)
        .with_context(|| format!("could not write profile to {}", output.display()))?;

    println!("Profile written to {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_profile_command() {
        let cli = Cli::try_parse_from([
            "wgcf",
            "--config",
            "acct.toml",
            "profile",
            "--peer-public-key",
            "key",
            "--address-v4",
            "172.16.0.2",
            "--address-v6",
            "fd01::2",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("acct.toml")));
        match cli.command {
            Commands::Profile { output, endpoint, .. } => {
                assert_eq!(output, PathBuf::from(DEFAULT_PROFILE_FILE));
                assert_eq!(endpoint, DEFAULT_ENDPOINT);
            }
            _ => panic!("expected profile command"),
        }
    }

    #[test]
    fn test_generate_then_profile() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("account.toml");
        let output = dir.path().join("profile.conf");

        generate(&config_path, false).unwrap();
        assert!(generate(&config_path, false).is_err());

        let private_key = AccountConfig::load_file(&config_path)
            .unwrap()
            .private_key()
            .unwrap();
        let server = KeyManager::new().generate_private_key().unwrap().public_key();
        let device = DeviceConfig {
            peer_public_key: server.to_base64(),
            endpoint: "engage.cloudflareclient.com:2408".to_string(),
            address_v4: "172.16.0.2".to_string(),
            address_v6: "2606:4700::1".to_string(),
        };
        generate_profile(&config_path, device, &output).unwrap();

        let rendered = std::fs::read_to_string(&output).unwrap();
        assert!(rendered.contains(&format!("PrivateKey = {}", private_key.to_base64())));
        assert!(rendered.contains(&format!("PublicKey = {server}")));
    }

    #[test]
    fn test_profile_rejects_bad_peer_key() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("account.toml");
        generate(&config_path, false).unwrap();

        let device = DeviceConfig {
            peer_public_key: "AAAA".to_string(),
            endpoint: "host:1".to_string(),
            address_v4: "10.0.0.1".to_string(),
            address_v6: "fd00::1".to_string(),
        };
        let err = generate_profile(&config_path, device, &dir.path().join("p.conf")).unwrap_err();
        assert!(err.to_string().contains("peer_public_key"));
    }

    #[test]
    fn test_profile_writes_canonical_peer_key() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("account.toml");
        let output = dir.path().join("profile.conf");
        generate(&config_path, false).unwrap();

        let server = KeyManager::new().generate_private_key().unwrap().public_key();
        let device = DeviceConfig {
            peer_public_key: format!(" \t{server}\n"),
            endpoint: "host:1".to_string(),
            address_v4: "10.0.0.1".to_string(),
            address_v6: "fd00::1".to_string(),
        };
        generate_profile(&config_path, device, &output).unwrap();

        let rendered = std::fs::read_to_string(&output).unwrap();
        assert!(rendered.lines().any(|l| l == format!("PublicKey = {server}")));
    }
}
