use serde::{Deserialize, Serialize};

/// Topic label used to pick a group of canned replies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Greeting,
    Services,
    Seo,
    SocialMedia,
    Ppc,
    Website,
    Ecommerce,
    Content,
    Email,
    Pricing,
    Results,
    Process,
    Whatsapp,
    Location,
    Team,
    Contact,
    Consultation,
    Default,
}

impl Category {
    /// Match order for keyword rules. Earlier entries win on ambiguous input.
    pub const PRECEDENCE: [Category; 18] = [
        Category::Greeting,
        Category::Seo,
        Category::SocialMedia,
        Category::Ppc,
        Category::Website,
        Category::Ecommerce,
        Category::Content,
        Category::Email,
        Category::Results,
        Category::Process,
        Category::Whatsapp,
        Category::Location,
        Category::Team,
        Category::Services,
        Category::Pricing,
        Category::Contact,
        Category::Consultation,
        Category::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Greeting => "greeting",
            Category::Services => "services",
            Category::Seo => "seo",
            Category::SocialMedia => "social-media",
            Category::Ppc => "ppc",
            Category::Website => "website",
            Category::Ecommerce => "ecommerce",
            Category::Content => "content",
            Category::Email => "email",
            Category::Pricing => "pricing",
            Category::Results => "results",
            Category::Process => "process",
            Category::Whatsapp => "whatsapp",
            Category::Location => "location",
            Category::Team => "team",
            Category::Contact => "contact",
            Category::Consultation => "consultation",
            Category::Default => "default",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::PRECEDENCE.into_iter().find(|c| c.as_str() == s)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_ends_with_default() {
        assert_eq!(Category::PRECEDENCE.last(), Some(&Category::Default));
        assert_eq!(Category::PRECEDENCE[0], Category::Greeting);
    }

    #[test]
    fn test_parse_round_trips_every_category() {
        for category in Category::PRECEDENCE {
            assert_eq!(Category::parse(category.as_str()), Some(category));
        }
        assert_eq!(Category::parse("social_media"), None);
    }

    #[test]
    fn test_serde_uses_kebab_case() {
        let json = serde_json::to_string(&Category::SocialMedia).unwrap();
        assert_eq!(json, "\"social-media\"");
        let parsed: Category = serde_json::from_str("\"ppc\"").unwrap();
        assert_eq!(parsed, Category::Ppc);
    }
}
