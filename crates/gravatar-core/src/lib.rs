//! Gravatar avatar URLs and existence checks.
//!
//! Build a [`Gravatar`] over a [`ProfileStore`], then call
//! [`Gravatar::get`] for a URL or [`Gravatar::exists`] to ask the service
//! whether an avatar is registered.

pub mod client;
pub mod config;
pub mod email;
pub mod error;
pub mod fallback;
pub mod params;
pub mod profile;

pub use client::{Gravatar, Request};
pub use config::{load_config, load_config_from_env, GravatarConfig};
pub use email::{hash_email, validate_email};
pub use error::{ConfigError, GravatarError};
pub use fallback::{Fallback, Theme};
pub use params::{ParamContext, ParameterFn, Rating};
pub use profile::{
    load_profiles, Profile, ProfileSet, ProfileStore, ResolvedProfile, Selector, DEFAULT_PROFILE,
};
pub use reqwest::Url;
