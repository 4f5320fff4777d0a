use std::sync::Arc;

use clap::{Parser, Subcommand};
use gravatar_core::{
    load_profiles, Gravatar, GravatarConfig, Profile, ProfileSet, ProfileStore, Rating, Selector,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "gravatar")]
#[command(about = "Build Gravatar avatar URLs and check whether an avatar exists")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the avatar URL for an email address
    Url {
        email: String,
        /// Named profile from the profiles file
        #[arg(long)]
        profile: Option<String>,
        /// Default image: themed keyword or absolute URL
        #[arg(long)]
        fallback: Option<String>,
        #[arg(long)]
        size: Option<u64>,
        #[arg(long)]
        rating: Option<Rating>,
        #[arg(long)]
        secure: bool,
    },
    /// Check whether Gravatar has an avatar for an email address
    Exists {
        email: String,
        /// Fail on network errors instead of printing `false`
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = gravatar_core::load_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let gravatar = build_gravatar(&config)?;

    match cli.command {
        Commands::Url {
            email,
            profile,
            fallback,
            size,
            rating,
            secure,
        } => {
            let overrides = flag_overrides(size, rating, secure);
            let selector = build_selector(gravatar.store(), profile.as_deref(), &overrides);
            let request = match fallback.as_deref() {
                Some(value) => gravatar.fallback(value),
                None => gravatar.request(),
            };
            println!("{}", request.get(&email, selector)?);
        }
        Commands::Exists { email, strict } => {
            let found = if strict {
                gravatar.probe(&email).await?
            } else {
                gravatar.exists(&email).await?
            };
            println!("{found}");
        }
    }

    Ok(())
}

fn build_gravatar(config: &GravatarConfig) -> anyhow::Result<Gravatar> {
    let store = if config.profiles_path.exists() {
        load_profiles(&config.profiles_path)?
    } else {
        tracing::debug!(
            path = %config.profiles_path.display(),
            "profiles file not found, using built-in defaults"
        );
        ProfileSet::builtin()
    };
    Ok(Gravatar::from_config(Arc::new(store), config)?)
}

/// Turns command-line options into an override map. Unset flags are left
/// out so they do not mask profile values.
fn flag_overrides(size: Option<u64>, rating: Option<Rating>, secure: bool) -> Profile {
    let mut overrides = Profile::new();
    if let Some(size) = size {
        overrides = overrides.with("size", size);
    }
    if let Some(rating) = rating {
        overrides = overrides.with("maximumRating", rating.as_str());
    }
    if secure {
        overrides = overrides.with("secure", true);
    }
    overrides
}

/// Layers flag overrides over the named profile, which itself sits over
/// `default` once resolved.
fn build_selector(
    store: &dyn ProfileStore,
    profile: Option<&str>,
    overrides: &Profile,
) -> Selector {
    if overrides.is_empty() {
        return Selector::from(profile);
    }

    let base = match profile {
        Some(name) => store.profile(name).unwrap_or_else(|| {
            tracing::warn!(profile = %name, "unknown avatar profile, using default");
            Profile::new()
        }),
        None => Profile::new(),
    };
    Selector::Overrides(overrides.merged_over(&base))
}
