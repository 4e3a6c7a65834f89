//! Module identifiers.
//!
//! Each public content area owns exactly one snapshot. The set is closed:
//! adding a module means adding a variant here, a default TTL, a loader and a
//! fallback payload.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A logical content area with its own cached payload and TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Home,
    Services,
    Tenders,
    Careers,
    News,
    Media,
    Faq,
    Contact,
    SocialLinks,
    WaterToday,
    Leadership,
    Projects,
    Locations,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown content module `{0}`")]
pub struct UnknownModule(pub String);

impl Module {
    pub const ALL: [Module; 13] = [
        Module::Home,
        Module::Services,
        Module::Tenders,
        Module::Careers,
        Module::News,
        Module::Media,
        Module::Faq,
        Module::Contact,
        Module::SocialLinks,
        Module::WaterToday,
        Module::Leadership,
        Module::Projects,
        Module::Locations,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Module::Home => "home",
            Module::Services => "services",
            Module::Tenders => "tenders",
            Module::Careers => "careers",
            Module::News => "news",
            Module::Media => "media",
            Module::Faq => "faq",
            Module::Contact => "contact",
            Module::SocialLinks => "social_links",
            Module::WaterToday => "water_today",
            Module::Leadership => "leadership",
            Module::Projects => "projects",
            Module::Locations => "locations",
        }
    }

    /// Built-in freshness window, used unless `cache.ttl_seconds` overrides it.
    ///
    /// Fast-moving areas (the daily water bulletin, the home page that embeds
    /// it) get short windows; reference content gets long ones.
    pub fn default_ttl(self) -> Duration {
        let seconds = match self {
            Module::WaterToday => 60,
            Module::Home => 120,
            Module::News | Module::Tenders | Module::Careers => 300,
            Module::Media | Module::Projects => 900,
            Module::Services | Module::Leadership | Module::SocialLinks => 1800,
            Module::Faq | Module::Contact | Module::Locations => 3600,
        };
        Duration::from_secs(seconds)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = UnknownModule;

    /// Accepts the snake_case identifier, case-insensitively, with `-` allowed
    /// in place of `_` so URL paths like `/content/social-links` resolve.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Module::ALL
            .into_iter()
            .find(|module| module.as_str() == normalized)
            .ok_or_else(|| UnknownModule(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn identifiers_are_unique_and_round_trip() {
        let names: HashSet<_> = Module::ALL.iter().map(|m| m.as_str()).collect();
        assert_eq!(names.len(), Module::ALL.len());

        for module in Module::ALL {
            assert_eq!(module.as_str().parse::<Module>(), Ok(module));
        }
    }

    #[test]
    fn parse_accepts_url_style_names() {
        assert_eq!("social-links".parse::<Module>(), Ok(Module::SocialLinks));
        assert_eq!("WATER_TODAY".parse::<Module>(), Ok(Module::WaterToday));
    }

    #[test]
    fn parse_rejects_unknown_names() {
        let err = "weather".parse::<Module>().unwrap_err();
        assert_eq!(err, UnknownModule("weather".to_string()));
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Module::SocialLinks).expect("serialize");
        assert_eq!(json, "\"social_links\"");
    }

    #[test]
    fn every_module_has_a_positive_default_ttl() {
        for module in Module::ALL {
            assert!(module.default_ttl() > Duration::ZERO, "{module}");
        }
    }
}
