//! Query parameters derived from a resolved profile.
//!
//! Each parameter is produced by one [`ParameterFn`]. The builder holds an
//! ordered list of them; assembly runs them in order, and a later function
//! producing an already-present key replaces the earlier value in place.

use std::fmt;
use std::str::FromStr;

use crate::fallback::Fallback;
use crate::profile::ResolvedProfile;

/// Content-rating ceiling Gravatar applies when picking an avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rating {
    G,
    Pg,
    R,
    X,
}

impl Rating {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Rating::G => "g",
            Rating::Pg => "pg",
            Rating::R => "r",
            Rating::X => "x",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "g" => Ok(Rating::G),
            "pg" => Ok(Rating::Pg),
            "r" => Ok(Rating::R),
            "x" => Ok(Rating::X),
            other => Err(format!("unknown rating {other:?} (expected g, pg, r or x)")),
        }
    }
}

/// Inputs a parameter function sees for one call.
#[derive(Debug, Clone, Copy)]
pub struct ParamContext<'a> {
    pub profile: &'a ResolvedProfile,
    /// Validated per-call default image, if one was given.
    pub fallback: Option<&'a Fallback>,
}

/// Derives at most one query parameter.
pub type ParameterFn = fn(&ParamContext<'_>) -> Option<(&'static str, String)>;

/// `s=<n>` for a positive integer `size`.
#[must_use]
pub fn size_param(ctx: &ParamContext<'_>) -> Option<(&'static str, String)> {
    ctx.profile.size().map(|size| ("s", size.to_string()))
}

/// `d=<image>`: the per-call override when present, else the profile's
/// `fallback`.
#[must_use]
pub fn default_image_param(ctx: &ParamContext<'_>) -> Option<(&'static str, String)> {
    ctx.fallback
        .map(|fallback| fallback.as_str().to_string())
        .or_else(|| ctx.profile.fallback())
        .map(|image| ("d", image))
}

/// `r=<rating>` for one of `g`, `pg`, `r`, `x`.
#[must_use]
pub fn rating_param(ctx: &ParamContext<'_>) -> Option<(&'static str, String)> {
    ctx.profile
        .maximum_rating()
        .map(|rating| ("r", rating.as_str().to_string()))
}

/// `forcedefault=y` when `forceDefault` is literally `true`.
#[must_use]
pub fn force_default_param(ctx: &ParamContext<'_>) -> Option<(&'static str, String)> {
    ctx.profile
        .force_default()
        .then(|| ("forcedefault", "y".to_string()))
}

/// The standard pipeline, in output order: `s`, `d`, `r`, `forcedefault`.
#[must_use]
pub fn default_parameters() -> Vec<ParameterFn> {
    vec![
        size_param,
        default_image_param,
        rating_param,
        force_default_param,
    ]
}

/// Runs `parameters` in order and collects their output.
#[must_use]
pub fn assemble(parameters: &[ParameterFn], ctx: &ParamContext<'_>) -> Vec<(&'static str, String)> {
    let mut pairs: Vec<(&'static str, String)> = Vec::with_capacity(parameters.len());
    for derive in parameters {
        let Some((key, value)) = derive(ctx) else {
            continue;
        };
        if let Some(existing) = pairs.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = value;
        } else {
            pairs.push((key, value));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::fallback::Theme;
    use crate::profile::Profile;

    fn resolved(profile: serde_json::Value) -> ResolvedProfile {
        let profile: Profile = serde_json::from_value(profile).expect("profile map");
        ResolvedProfile::from_profile(&profile)
    }

    fn run(profile: &ResolvedProfile, fallback: Option<&Fallback>) -> Vec<(&'static str, String)> {
        assemble(&default_parameters(), &ParamContext { profile, fallback })
    }

    #[test]
    fn empty_profile_produces_no_parameters() {
        assert!(run(&resolved(json!({})), None).is_empty());
    }

    #[test]
    fn full_profile_is_assembled_in_fixed_order() {
        let profile = resolved(json!({
            "size": 120,
            "fallback": "retro",
            "maximumRating": "pg",
            "forceDefault": true
        }));
        let pairs = run(&profile, None);
        assert_eq!(
            pairs,
            vec![
                ("s", "120".to_string()),
                ("d", "retro".to_string()),
                ("r", "pg".to_string()),
                ("forcedefault", "y".to_string()),
            ]
        );
    }

    #[test]
    fn override_wins_over_profile_fallback() {
        let profile = resolved(json!({ "fallback": "retro" }));
        let fallback = Fallback::Theme(Theme::Wavatar);
        assert_eq!(run(&profile, Some(&fallback)), vec![("d", "wavatar".to_string())]);
    }

    #[test]
    fn invalid_rating_is_omitted() {
        let profile = resolved(json!({ "maximumRating": "invalid" }));
        assert!(run(&profile, None).is_empty());
    }

    #[test]
    fn later_parameter_replaces_same_key_in_place() {
        fn first(_: &ParamContext<'_>) -> Option<(&'static str, String)> {
            Some(("d", "first".to_string()))
        }
        fn middle(_: &ParamContext<'_>) -> Option<(&'static str, String)> {
            Some(("s", "10".to_string()))
        }
        fn last(_: &ParamContext<'_>) -> Option<(&'static str, String)> {
            Some(("d", "last".to_string()))
        }

        let profile = resolved(json!({}));
        let ctx = ParamContext {
            profile: &profile,
            fallback: None,
        };
        let pairs = assemble(&[first, middle, last], &ctx);
        assert_eq!(pairs, vec![("d", "last".to_string()), ("s", "10".to_string())]);
    }

    #[test]
    fn rating_parses_known_values_only() {
        assert_eq!("x".parse::<Rating>(), Ok(Rating::X));
        assert_eq!("pg".parse::<Rating>(), Ok(Rating::Pg));
        assert!("PG".parse::<Rating>().is_err());
        assert!("nc17".parse::<Rating>().is_err());
    }
}
