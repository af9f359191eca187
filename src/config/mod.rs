use crate::coerce::FormatOptions;
use crate::context::TestContext;
use crate::failure::{Failure, Result};
use crate::verify::VerifyOptions;
use serde::Deserialize;
use std::path::Path;

/// Suite defaults loaded from a `.tablematch.yaml` profile.
///
/// ```yaml
/// timezone: Asia/Jerusalem
/// format:
///   parse_integer_dates: true
///   parse_numbers: [amount, qty]
/// verify:
///   strict_order: true
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
    /// IANA zone for zone-less dates and `[local]` values.
    pub timezone: Option<String>,
    pub format: FormatOptions,
    pub verify: VerifyOptions,
}

impl Profile {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let profile: Self = serde_yaml::from_str(text)
            .map_err(|error| Failure::Config(format!("invalid profile: {error}")))?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading profile");
        Self::from_yaml_str(&text)
            .map_err(|error| Failure::Config(format!("{}: {error}", path.display())))
    }

    /// A fresh context in the profile's timezone.
    pub fn context(&self) -> TestContext {
        match &self.timezone {
            Some(timezone) => TestContext::with_timezone(timezone.clone()),
            None => TestContext::new(),
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(timezone) = &self.timezone
            && timezone.parse::<chrono_tz::Tz>().is_err()
        {
            return Err(Failure::Config(format!("unknown timezone '{timezone}'")));
        }
        Ok(())
    }
}
