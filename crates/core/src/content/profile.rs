use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::payload::{ColorTheme, CompanyInfo, Link};
use crate::document::validate::{validate_link_group, ValidationError};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read institute profile {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse institute profile {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid institute profile: {0}")]
    Invalid(#[from] ValidationError),
}

/// Institute identity and link data the canonical payload is built from.
///
/// The built-in [`InstituteProfile::reference`] is the demo institute the
/// platform shipped with; other deployments load their own from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstituteProfile {
    pub company: CompanyInfo,
    pub company_policies: Vec<Link>,
    pub general_links: Vec<Link>,
    pub social_links: Vec<Link>,
    pub legal_links: Vec<Link>,
    /// Year printed in the copyright line. Fixed so output stays deterministic.
    pub copyright_year: u16,
    pub colors: ColorTheme,
}

impl InstituteProfile {
    /// The reference institute: 4 company-policy links and 6 general links.
    pub fn reference() -> Self {
        Self {
            company: CompanyInfo {
                name: "IICPA Institute".into(),
                tagline: "Professional accounting and finance education".into(),
                description: "Industry-aligned courses in accounting, taxation and finance, \
                              taught by practising professionals."
                    .into(),
                address: "2nd Floor, Knowledge Park, New Delhi 110001, India".into(),
                phone: "+91 11 4000 1234".into(),
                email: "info@iicpa.example".into(),
                logo: "/images/logo.png".into(),
            },
            company_policies: vec![
                Link::new("Privacy Policy", "/privacy-policy"),
                Link::new("Terms & Conditions", "/terms-and-conditions"),
                Link::new("Refund Policy", "/refund-policy"),
                Link::new("Cancellation Policy", "/cancellation-policy"),
            ],
            general_links: vec![
                Link::new("Home", "/"),
                Link::new("About Us", "/about"),
                Link::new("Courses", "/courses"),
                Link::new("Blog", "/blog"),
                Link::new("Careers", "/careers"),
                Link::new("Contact Us", "/contact"),
            ],
            social_links: vec![
                Link::new("Facebook", "https://www.facebook.com/iicpa"),
                Link::new("Instagram", "https://www.instagram.com/iicpa"),
                Link::new("LinkedIn", "https://www.linkedin.com/company/iicpa"),
                Link::new("YouTube", "https://www.youtube.com/@iicpa"),
            ],
            legal_links: vec![
                Link::new("Privacy", "/privacy-policy"),
                Link::new("Terms", "/terms-and-conditions"),
                Link::new("Sitemap", "/sitemap.xml"),
            ],
            copyright_year: 2024,
            colors: ColorTheme {
                background: "#0f172a".into(),
                text: "#cbd5e1".into(),
                heading: "#ffffff".into(),
                accent: "#f59e0b".into(),
                border: "#1e293b".into(),
            },
        }
    }

    /// Load a profile from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: display.clone(),
            source,
        })?;
        let profile: Self = serde_json::from_str(&raw).map_err(|source| ProfileError::Parse {
            path: display,
            source,
        })?;
        profile.validate()?;
        Ok(profile)
    }

    /// Every link group must be non-empty and every link complete.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_link_group("companyPolicies", &self.company_policies)?;
        validate_link_group("generalLinks", &self.general_links)?;
        validate_link_group("socialLinks", &self.social_links)?;
        validate_link_group("legalLinks", &self.legal_links)?;
        Ok(())
    }
}

impl Default for InstituteProfile {
    fn default() -> Self {
        Self::reference()
    }
}
