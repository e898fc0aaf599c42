//! Read-only site content (camp name, feature cards, donation settings). Built once at startup.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeatureCard {
    pub title: String,
    pub description: String,
    /// Icon key resolved with `icons::lookup`.
    pub icon: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DonationSettings {
    /// ISO 4217, lowercase.
    pub currency: String,
    /// Suggested tiles, in minor units.
    pub suggested_amounts: Vec<u64>,
    /// Smallest accepted amount, in minor units.
    pub minimum_amount: u64,
}

impl Default for DonationSettings {
    fn default() -> Self {
        DonationSettings {
            currency: "usd".into(),
            suggested_amounts: vec![2500, 5000, 7500, 10000, 25000],
            minimum_amount: 100,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub tagline: String,
    #[serde(default)]
    pub features: Vec<FeatureCard>,
    #[serde(default)]
    pub donation: DonationSettings,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let card = |title: &str, description: &str, icon: &str| FeatureCard {
            title: title.into(),
            description: description.into(),
            icon: icon.into(),
        };
        SiteConfig {
            name: "Camp".into(),
            tagline: "Build, burn, belong.".into(),
            features: vec![
                card("Art", "Large-scale installations built by members.", "palette"),
                card("Culture", "Radical inclusion and participation, year round.", "flame"),
                card("Events", "Build weekends, fundraisers and the playa itself.", "calendar"),
                card("Membership", "Dues, shifts and the people who make it happen.", "users"),
            ],
            donation: DonationSettings::default(),
        }
    }
}

impl SiteConfig {
    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(SiteConfig::default());
        };
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
        let site: SiteConfig = serde_json::from_str(&json).map_err(|e| ConfigError::Load(e.to_string()))?;
        site.check()?;
        Ok(site)
    }

    fn check(&self) -> Result<(), ConfigError> {
        let d = &self.donation;
        if d.currency.len() != 3 || !d.currency.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(ConfigError::Validation(format!("donation currency must be a lowercase ISO code: {}", d.currency)));
        }
        if d.minimum_amount == 0 {
            return Err(ConfigError::Validation("donation minimum_amount must be positive".into()));
        }
        if let Some(a) = d.suggested_amounts.iter().find(|a| **a < d.minimum_amount) {
            return Err(ConfigError::Validation(format!("suggested amount {} is below the minimum", a)));
        }
        Ok(())
    }
}
