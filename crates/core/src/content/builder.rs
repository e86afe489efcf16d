use serde_json::Value;

use super::payload::{BottomBar, CanonicalPayload, FooterLinks};
use super::profile::InstituteProfile;
use crate::document::validate::ValidationError;

/// Produces the canonical payload for the singleton content document.
///
/// Construction validates the profile, so every payload this builder returns
/// classifies as canonical.
#[derive(Debug, Clone)]
pub struct CanonicalBuilder {
    profile: InstituteProfile,
}

impl CanonicalBuilder {
    pub fn new(profile: InstituteProfile) -> Result<Self, ValidationError> {
        profile.validate()?;
        Ok(Self { profile })
    }

    /// Typed canonical payload. Deterministic: no clock, no randomness.
    pub fn build(&self) -> CanonicalPayload {
        let p = &self.profile;
        CanonicalPayload {
            company_info: p.company.clone(),
            footer_links: FooterLinks {
                company_policies: p.company_policies.clone(),
                general_links: p.general_links.clone(),
            },
            social_links: p.social_links.clone(),
            bottom_bar: BottomBar {
                copyright: format!(
                    "© {} {}. All rights reserved.",
                    p.copyright_year, p.company.name
                ),
                legal_links: p.legal_links.clone(),
            },
            colors: p.colors.clone(),
        }
    }

    /// Canonical payload as the JSON value written to the store.
    pub fn build_payload(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self.build())
    }
}

impl Default for CanonicalBuilder {
    fn default() -> Self {
        Self {
            profile: InstituteProfile::reference(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::payload::Link;
    use crate::schema::{classify_payload, Shape};

    #[test]
    fn repeated_builds_are_deep_equal() {
        let builder = CanonicalBuilder::default();
        assert_eq!(builder.build_payload().unwrap(), builder.build_payload().unwrap());
    }

    #[test]
    fn reference_payload_has_fixed_cardinalities() {
        let payload = CanonicalBuilder::default().build_payload().unwrap();
        let links = &payload["footerLinks"];
        assert_eq!(links["companyPolicies"].as_array().unwrap().len(), 4);
        assert_eq!(links["generalLinks"].as_array().unwrap().len(), 6);
        assert_eq!(
            payload["bottomBar"]["copyright"],
            "© 2024 IICPA Institute. All rights reserved."
        );
    }

    #[test]
    fn output_classifies_as_canonical() {
        let mut profile = InstituteProfile::reference();
        profile.general_links = vec![Link::new("Home", "/")];
        let builder = CanonicalBuilder::new(profile).unwrap();
        assert_eq!(classify_payload(&builder.build_payload().unwrap()), Shape::Canonical);
    }

    #[test]
    fn invalid_profile_is_refused() {
        let mut profile = InstituteProfile::reference();
        profile.general_links[0].href = String::new();
        assert!(CanonicalBuilder::new(profile).is_err());
    }
}
