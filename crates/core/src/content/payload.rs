//! Typed form of the canonical site-content payload.
//!
//! Stored documents are untyped JSON; these structs describe only the shape
//! the builder writes. Field names serialize in camelCase to match what the
//! web frontend reads.

use serde::{Deserialize, Serialize};

/// Key of the link-group object inside a payload.
pub const FOOTER_LINKS_KEY: &str = "footerLinks";
pub const COMPANY_POLICIES_KEY: &str = "companyPolicies";
pub const GENERAL_LINKS_KEY: &str = "generalLinks";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub name: String,
    pub href: String,
}

impl Link {
    pub fn new(name: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            href: href.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub name: String,
    pub tagline: String,
    pub description: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub logo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterLinks {
    pub company_policies: Vec<Link>,
    pub general_links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BottomBar {
    pub copyright: String,
    pub legal_links: Vec<Link>,
}

/// Colour tokens consumed by the footer component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorTheme {
    pub background: String,
    pub text: String,
    pub heading: String,
    pub accent: String,
    pub border: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPayload {
    pub company_info: CompanyInfo,
    pub footer_links: FooterLinks,
    pub social_links: Vec<Link>,
    pub bottom_bar: BottomBar,
    pub colors: ColorTheme,
}
