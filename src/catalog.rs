//! Static catalog of the external services the dashboard knows about.
//!
//! The per-service field lists replace the old service-name switch with a
//! declarative table: adding a service is a new entry here, not new code.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    AiServices,
    SocialMedia,
    Analytics,
    BookPlatforms,
    EmailMarketing,
    AuthorSettings,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::AiServices,
        Category::SocialMedia,
        Category::Analytics,
        Category::BookPlatforms,
        Category::EmailMarketing,
        Category::AuthorSettings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::AiServices => "ai_services",
            Category::SocialMedia => "social_media",
            Category::Analytics => "analytics",
            Category::BookPlatforms => "book_platforms",
            Category::EmailMarketing => "email_marketing",
            Category::AuthorSettings => "author_settings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Password,
    Email,
    Checkbox,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

/// How the connectivity probe presents the primary credential.
#[derive(Debug, Clone, Copy)]
pub enum ProbeAuth {
    Bearer,
    Header(&'static str),
    Query(&'static str),
}

/// Lightweight authenticated endpoint used to verify a credential works.
/// Services without a probe pass the check vacuously.
#[derive(Debug, Clone, Copy)]
pub struct Probe {
    pub url: &'static str,
    pub auth: ProbeAuth,
}

#[derive(Debug, Clone, Copy)]
pub struct ServiceDescriptor {
    pub name: &'static str,
    pub category: Category,
    pub description: &'static str,
    pub fields: &'static [FieldSpec],
    /// Field key the REST body's `api_key` value maps onto.
    /// None for fields-only services (author settings).
    pub primary: Option<&'static str>,
    pub probe: Option<Probe>,
}

const fn text(key: &'static str, label: &'static str, required: bool) -> FieldSpec {
    FieldSpec { key, label, kind: FieldKind::Text, required }
}

const fn password(key: &'static str, label: &'static str, required: bool) -> FieldSpec {
    FieldSpec { key, label, kind: FieldKind::Password, required }
}

const fn email(key: &'static str, label: &'static str, required: bool) -> FieldSpec {
    FieldSpec { key, label, kind: FieldKind::Email, required }
}

const fn checkbox(key: &'static str, label: &'static str, required: bool) -> FieldSpec {
    FieldSpec { key, label, kind: FieldKind::Checkbox, required }
}

pub const CATALOG: &[ServiceDescriptor] = &[
    // -- AI services --
    ServiceDescriptor {
        name: "anthropic",
        category: Category::AiServices,
        description: "Claude AI for content generation",
        fields: &[
            password("api_key", "API key", true),
            text("model", "Model", false),
        ],
        primary: Some("api_key"),
        probe: Some(Probe {
            url: "https://api.anthropic.com/v1/models",
            auth: ProbeAuth::Header("x-api-key"),
        }),
    },
    ServiceDescriptor {
        name: "openai",
        category: Category::AiServices,
        description: "DALL-E 3 for image generation",
        fields: &[
            password("api_key", "API key", true),
            text("model", "Model", false),
        ],
        primary: Some("api_key"),
        probe: Some(Probe {
            url: "https://api.openai.com/v1/models",
            auth: ProbeAuth::Bearer,
        }),
    },
    // -- Social media --
    ServiceDescriptor {
        name: "instagram",
        category: Category::SocialMedia,
        description: "Instagram Business API",
        fields: &[
            password("access_token", "Access token", true),
            text("business_account_id", "Business account ID", true),
        ],
        primary: Some("access_token"),
        probe: None,
    },
    ServiceDescriptor {
        name: "facebook",
        category: Category::SocialMedia,
        description: "Facebook Graph API",
        fields: &[
            password("access_token", "Access token", true),
            text("page_id", "Page ID", true),
        ],
        primary: Some("access_token"),
        probe: None,
    },
    ServiceDescriptor {
        name: "twitter",
        category: Category::SocialMedia,
        description: "Twitter API v2",
        fields: &[
            password("api_key", "API key", true),
            password("api_secret", "API secret", true),
            password("access_token", "Access token", true),
            password("access_secret", "Access secret", true),
        ],
        primary: Some("api_key"),
        probe: None,
    },
    ServiceDescriptor {
        name: "tiktok",
        category: Category::SocialMedia,
        description: "TikTok for Business API",
        fields: &[password("api_key", "API key", true)],
        primary: Some("api_key"),
        probe: None,
    },
    ServiceDescriptor {
        name: "threads",
        category: Category::SocialMedia,
        description: "Threads API",
        fields: &[password("access_token", "Access token", true)],
        primary: Some("access_token"),
        probe: None,
    },
    ServiceDescriptor {
        name: "bluesky",
        category: Category::SocialMedia,
        description: "Bluesky API",
        fields: &[
            text("identifier", "Handle or DID", true),
            password("password", "App password", true),
        ],
        primary: Some("password"),
        probe: None,
    },
    // -- Analytics --
    ServiceDescriptor {
        name: "google_analytics",
        category: Category::Analytics,
        description: "Google Analytics 4",
        fields: &[text("measurement_id", "Measurement ID", true)],
        primary: Some("measurement_id"),
        probe: None,
    },
    ServiceDescriptor {
        name: "facebook_pixel",
        category: Category::Analytics,
        description: "Facebook Pixel tracking",
        fields: &[text("pixel_id", "Pixel ID", true)],
        primary: Some("pixel_id"),
        probe: None,
    },
    // -- Book platforms --
    ServiceDescriptor {
        name: "amazon_kdp",
        category: Category::BookPlatforms,
        description: "Amazon KDP sales tracking",
        fields: &[
            password("api_key", "API key", true),
            text("asin", "Book ASIN", true),
        ],
        primary: Some("api_key"),
        probe: None,
    },
    ServiceDescriptor {
        name: "bookbub",
        category: Category::BookPlatforms,
        description: "BookBub advertising API",
        fields: &[password("api_key", "API key", true)],
        primary: Some("api_key"),
        probe: None,
    },
    // -- Email marketing --
    ServiceDescriptor {
        name: "mailchimp",
        category: Category::EmailMarketing,
        description: "Mailchimp email campaigns",
        fields: &[
            password("api_key", "API key", true),
            text("audience_id", "Audience ID", true),
        ],
        primary: Some("api_key"),
        probe: None,
    },
    ServiceDescriptor {
        name: "convertkit",
        category: Category::EmailMarketing,
        description: "ConvertKit email automation",
        fields: &[password("api_key", "API key", true)],
        primary: Some("api_key"),
        probe: None,
    },
    // -- Author settings (fields-only, no credential) --
    ServiceDescriptor {
        name: "author_email",
        category: Category::AuthorSettings,
        description: "Author contact details for outgoing campaigns",
        fields: &[
            email("email", "Author email", true),
            text("name", "Author name", false),
        ],
        primary: None,
        probe: None,
    },
    ServiceDescriptor {
        name: "notification_preferences",
        category: Category::AuthorSettings,
        description: "Dashboard notification preferences",
        fields: &[
            checkbox("email_updates", "Email updates", true),
            checkbox("marketing_tips", "Weekly marketing tips", false),
        ],
        primary: None,
        probe: None,
    },
];

pub fn all() -> &'static [ServiceDescriptor] {
    CATALOG
}

pub fn lookup(name: &str) -> Option<&'static ServiceDescriptor> {
    CATALOG.iter().find(|d| d.name == name)
}

pub fn services_in(category: Category) -> impl Iterator<Item = &'static ServiceDescriptor> {
    CATALOG.iter().filter(move |d| d.category == category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = CATALOG.iter().map(|d| d.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), CATALOG.len());
    }

    #[test]
    fn every_category_has_services() {
        for category in Category::ALL {
            assert!(
                services_in(category).next().is_some(),
                "empty category: {}",
                category.as_str()
            );
        }
    }

    #[test]
    fn primary_field_exists_in_field_list() {
        for d in CATALOG {
            if let Some(primary) = d.primary {
                assert!(
                    d.fields.iter().any(|f| f.key == primary),
                    "{}: primary field '{}' not declared",
                    d.name,
                    primary
                );
            }
        }
    }

    #[test]
    fn fields_only_services_are_author_settings() {
        for d in CATALOG {
            if d.primary.is_none() {
                assert_eq!(d.category, Category::AuthorSettings, "{}", d.name);
            }
        }
    }

    #[test]
    fn lookup_finds_twitter_with_four_credential_fields() {
        let d = lookup("twitter").unwrap();
        assert_eq!(d.category, Category::SocialMedia);
        assert_eq!(d.fields.len(), 4);
        assert!(d.fields.iter().all(|f| f.required));
    }

    #[test]
    fn lookup_rejects_unknown_service() {
        assert!(lookup("myspace").is_none());
    }
}
