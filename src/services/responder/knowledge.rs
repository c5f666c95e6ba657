use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::errors::KnowledgeBaseError;
use crate::models::Category;

/// A category and the lower-case substrings that select it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeywordRule {
    pub category: Category,
    #[serde(default)]
    pub triggers: Vec<String>,
}

impl KeywordRule {
    pub fn new(category: Category, triggers: &[&str]) -> Self {
        Self {
            category,
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// `normalized` must already be lower-cased.
    pub fn matches(&self, normalized: &str) -> bool {
        self.triggers.iter().any(|t| normalized.contains(t.as_str()))
    }
}

/// Candidate replies per category.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ResponseBank(BTreeMap<Category, Vec<String>>);

impl ResponseBank {
    pub fn insert(&mut self, category: Category, responses: &[&str]) {
        self.0
            .insert(category, responses.iter().map(|r| r.to_string()).collect());
    }

    pub fn get(&self, category: Category) -> Option<&[String]> {
        self.0.get(&category).map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeBase {
    pub rules: Vec<KeywordRule>,
    pub responses: ResponseBank,
    pub nudge: String,
}

const WHATSAPP: &str = "+91 98765 43210";
const EMAIL: &str = "hello@brightpathdigital.com";

impl KnowledgeBase {
    pub fn from_json(s: &str) -> Result<Self, KnowledgeBaseError> {
        let kb: KnowledgeBase = serde_json::from_str(s)?;
        kb.validate()?;
        Ok(kb)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read knowledge base: {}", path.display()))?;
        let kb = Self::from_json(&raw)
            .with_context(|| format!("invalid knowledge base: {}", path.display()))?;
        tracing::info!(path = %path.display(), rules = kb.rules.len(), "loaded knowledge base");
        Ok(kb)
    }

    pub fn validate(&self) -> Result<(), KnowledgeBaseError> {
        match self.rules.last() {
            Some(rule) if rule.category == Category::Default => {
                if !rule.triggers.is_empty() {
                    return Err(KnowledgeBaseError::DefaultHasTriggers);
                }
            }
            _ => return Err(KnowledgeBaseError::DefaultNotLast),
        }

        let mut seen = HashSet::new();
        for (i, rule) in self.rules.iter().enumerate() {
            if !seen.insert(rule.category) {
                return Err(KnowledgeBaseError::DuplicateRule(rule.category));
            }
            let is_last = i + 1 == self.rules.len();
            if rule.category == Category::Default && !is_last {
                return Err(KnowledgeBaseError::DefaultNotLast);
            }
            if !is_last && rule.triggers.is_empty() {
                return Err(KnowledgeBaseError::NoTriggers(rule.category));
            }
            for trigger in &rule.triggers {
                if trigger.is_empty() {
                    return Err(KnowledgeBaseError::EmptyTrigger(rule.category));
                }
                if *trigger != trigger.to_lowercase() {
                    return Err(KnowledgeBaseError::UppercaseTrigger {
                        category: rule.category,
                        trigger: trigger.clone(),
                    });
                }
            }

            let responses = self
                .responses
                .get(rule.category)
                .ok_or(KnowledgeBaseError::MissingResponses(rule.category))?;
            if responses.is_empty() {
                return Err(KnowledgeBaseError::EmptyResponses(rule.category));
            }
            if responses.iter().any(|r| r.trim().is_empty()) {
                return Err(KnowledgeBaseError::BlankResponse(rule.category));
            }
        }

        if self.nudge.trim().is_empty() {
            return Err(KnowledgeBaseError::EmptyNudge);
        }

        Ok(())
    }

    /// Swaps the built-in WhatsApp number and email for the configured ones in
    /// every reply and the nudge.
    pub fn with_contact(mut self, whatsapp: &str, email: &str) -> Self {
        let rewrite = |text: &str| text.replace(WHATSAPP, whatsapp).replace(EMAIL, email);
        for replies in self.responses.0.values_mut() {
            for reply in replies.iter_mut() {
                *reply = rewrite(reply);
            }
        }
        self.nudge = rewrite(&self.nudge);
        self
    }

    /// The agency's own reply table.
    pub fn builtin() -> Self {
        let rules = vec![
            KeywordRule::new(
                Category::Greeting,
                &["hello", "hi", "hey", "good morning", "good afternoon", "good evening", "namaste"],
            ),
            KeywordRule::new(
                Category::Seo,
                &["seo", "search engine", "google ranking", "organic traffic"],
            ),
            KeywordRule::new(
                Category::SocialMedia,
                &["social media", "instagram", "facebook", "linkedin", "tiktok", "twitter", "youtube"],
            ),
            KeywordRule::new(
                Category::Ppc,
                &["ppc", "google ads", "pay per click", "paid ads", "adwords", "ad campaign"],
            ),
            KeywordRule::new(
                Category::Website,
                &["website", "web design", "web development", "landing page", "wordpress"],
            ),
            KeywordRule::new(
                Category::Ecommerce,
                &["ecommerce", "e-commerce", "online store", "shopify", "woocommerce", "sell online"],
            ),
            KeywordRule::new(
                Category::Content,
                &["content", "blog", "copywriting", "article", "video production"],
            ),
            KeywordRule::new(
                Category::Email,
                &["email marketing", "newsletter", "email campaign", "mailchimp", "drip"],
            ),
            KeywordRule::new(
                Category::Results,
                &["results", "roi", "case study", "portfolio", "success stories", "clients"],
            ),
            KeywordRule::new(
                Category::Process,
                &["process", "how do you work", "how does it work", "timeline", "onboarding"],
            ),
            KeywordRule::new(Category::Whatsapp, &["whatsapp", "wa.me"]),
            KeywordRule::new(
                Category::Location,
                &["where", "location", "office", "address", "based in", "located"],
            ),
            KeywordRule::new(
                Category::Team,
                &["team", "who are you", "experts", "staff", "founder"],
            ),
            KeywordRule::new(
                Category::Services,
                &["service", "what do you do", "what do you offer", "help with", "marketing"],
            ),
            KeywordRule::new(
                Category::Pricing,
                &["price", "pricing", "cost", "how much", "budget", "package", "quote"],
            ),
            KeywordRule::new(
                Category::Contact,
                &["contact", "reach", "phone", "call", "get in touch", "email you", "talk to"],
            ),
            KeywordRule::new(
                Category::Consultation,
                &["consultation", "consult", "free audit", "meeting", "appointment", "strategy session"],
            ),
            KeywordRule::new(Category::Default, &[]),
        ];

        let mut responses = ResponseBank::default();
        responses.insert(
            Category::Greeting,
            &[
                "Hello! 👋 Welcome to Brightpath Digital. How can we help you grow your business online today?",
                "Hi there! I'm the Brightpath assistant. Ask me about SEO, social media, ads, websites or anything else marketing.",
                "Hey! Great to see you here. Are you looking to boost traffic, leads or sales? Tell me what you need.",
            ],
        );
        responses.insert(
            Category::Seo,
            &[
                "Our SEO service covers technical audits, keyword research, on-page optimisation and link building. Most clients see meaningful organic growth within 3 to 6 months.",
                "We help you rank higher on Google with a data-driven SEO strategy: site audit, content optimisation, local SEO and monthly ranking reports.",
            ],
        );
        responses.insert(
            Category::SocialMedia,
            &[
                "We manage Instagram, Facebook, LinkedIn and more: content calendars, creatives, community management and monthly analytics.",
                "Our social media team builds your brand with platform-specific content and targeted campaigns that turn followers into customers.",
            ],
        );
        responses.insert(
            Category::Ppc,
            &[
                "We run Google Ads and Meta Ads campaigns focused on ROI: keyword targeting, ad copy testing, landing page optimisation and weekly bid management.",
                "Our PPC specialists set up and optimise paid campaigns so every rupee of ad spend is tracked against leads and sales.",
            ],
        );
        responses.insert(
            Category::Website,
            &[
                "We design fast, mobile-first websites that convert visitors into leads. Every build includes SEO basics, analytics and a CMS you can edit yourself.",
                "From landing pages to full business websites, our developers build on modern stacks with speed and conversion in mind.",
            ],
        );
        responses.insert(
            Category::Ecommerce,
            &[
                "We build and grow online stores on Shopify and WooCommerce: store setup, product SEO, payment integration and shopping ads.",
                "Selling online? We handle store design, catalogue optimisation and performance marketing to drive repeat purchases.",
            ],
        );
        responses.insert(
            Category::Content,
            &[
                "Our writers produce blogs, website copy, case studies and video scripts that rank well and speak to your customers.",
                "Content marketing is at the heart of what we do: a monthly content plan, SEO-optimised articles and distribution across your channels.",
            ],
        );
        responses.insert(
            Category::Email,
            &[
                "We plan and run email campaigns and automated drip sequences with segmentation, A/B testing and clear open and click reporting.",
                "Email marketing still delivers one of the best ROIs. We can set up your newsletter, welcome flows and promotional campaigns.",
            ],
        );
        responses.insert(
            Category::Results,
            &[
                "Our clients have seen up to 3x organic traffic and 40% lower cost per lead. Check the Portfolio page for detailed case studies.",
                "Results are what we're measured on. Every campaign comes with transparent monthly reporting on traffic, leads and revenue.",
            ],
        );
        responses.insert(
            Category::Process,
            &[
                "Our process is simple: 1) free discovery call, 2) audit and strategy, 3) execution, 4) monthly reporting and optimisation.",
                "We start by understanding your goals, then build a custom plan, launch campaigns and keep improving them based on data.",
            ],
        );
        responses.insert(
            Category::Whatsapp,
            &[
                "You can chat with us directly on WhatsApp at +91 98765 43210. We usually reply within an hour during business hours.",
                "Sure! Message us on WhatsApp at +91 98765 43210 and our team will get back to you right away.",
            ],
        );
        responses.insert(
            Category::Location,
            &[
                "Our office is in Kolkata, India, and we work with clients across India and worldwide, mostly remotely.",
                "We're based in Kolkata but serve businesses everywhere. Happy to meet online or at our office by appointment.",
            ],
        );
        responses.insert(
            Category::Team,
            &[
                "Brightpath is a team of SEO specialists, ad managers, designers, developers and writers, all focused on measurable growth.",
                "Our experts have years of experience across industries. Visit the About page to meet the team.",
            ],
        );
        responses.insert(
            Category::Services,
            &[
                "We offer SEO, social media marketing, PPC advertising, website design, e-commerce, content marketing and email marketing. Which one interests you?",
                "Brightpath is a full-service digital marketing agency: SEO, social media, paid ads, websites, online stores, content and email. How can we help?",
            ],
        );
        responses.insert(
            Category::Pricing,
            &[
                "Our pricing depends on your goals and the services you need. Packages start from ₹15,000/month. Share your requirements for a custom quote!",
                "We have flexible plans for startups and established brands alike. Tell us about your business and we'll send a tailored pricing proposal.",
            ],
        );
        responses.insert(
            Category::Contact,
            &[
                "You can reach us on WhatsApp at +91 98765 43210, email hello@brightpathdigital.com, or use the form on our Contact page.",
                "We'd love to hear from you! Call or WhatsApp +91 98765 43210, or email hello@brightpathdigital.com.",
            ],
        );
        responses.insert(
            Category::Consultation,
            &[
                "We offer a free 30-minute consultation and marketing audit. Message us on WhatsApp at +91 98765 43210 to book a slot.",
                "Let's talk strategy! Book your free consultation by emailing hello@brightpathdigital.com or via the Contact page.",
            ],
        );
        responses.insert(
            Category::Default,
            &[
                "Thanks for your message! I'm not sure I understood. Could you tell me a bit more about what you're looking for?",
                "Good question! Our team can answer that best. Reach us on WhatsApp at +91 98765 43210 or email hello@brightpathdigital.com.",
                "I can help with SEO, social media, ads, websites and more. What would you like to know?",
            ],
        );

        Self {
            rules,
            responses,
            nudge: format!(
                "Want a faster answer? Chat with our team on WhatsApp at {WHATSAPP} or email us at {EMAIL}. We're happy to help!"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_valid() {
        KnowledgeBase::builtin().validate().unwrap();
    }

    #[test]
    fn test_builtin_follows_precedence() {
        let kb = KnowledgeBase::builtin();
        let order: Vec<Category> = kb.rules.iter().map(|r| r.category).collect();
        assert_eq!(order, Category::PRECEDENCE.to_vec());
    }

    #[test]
    fn test_builtin_seo_triggers() {
        let kb = KnowledgeBase::builtin();
        let seo = kb.rules.iter().find(|r| r.category == Category::Seo).unwrap();
        assert_eq!(
            seo.triggers,
            vec!["seo", "search engine", "google ranking", "organic traffic"]
        );
    }

    #[test]
    fn test_builtin_response_counts() {
        let kb = KnowledgeBase::builtin();
        assert_eq!(kb.responses.get(Category::Greeting).unwrap().len(), 3);
        assert_eq!(kb.responses.get(Category::Pricing).unwrap().len(), 2);
        assert_eq!(kb.responses.get(Category::Whatsapp).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_default_rejected() {
        let mut kb = KnowledgeBase::builtin();
        kb.rules.pop();
        assert!(matches!(kb.validate(), Err(KnowledgeBaseError::DefaultNotLast)));
    }

    #[test]
    fn test_default_with_triggers_rejected() {
        let mut kb = KnowledgeBase::builtin();
        kb.rules.last_mut().unwrap().triggers.push("anything".into());
        assert!(matches!(
            kb.validate(),
            Err(KnowledgeBaseError::DefaultHasTriggers)
        ));
    }

    #[test]
    fn test_empty_response_list_rejected() {
        let mut kb = KnowledgeBase::builtin();
        kb.responses.insert(Category::Ppc, &[]);
        assert!(matches!(
            kb.validate(),
            Err(KnowledgeBaseError::EmptyResponses(Category::Ppc))
        ));
    }

    #[test]
    fn test_uppercase_trigger_rejected() {
        let mut kb = KnowledgeBase::builtin();
        kb.rules[1].triggers.push("SEO".into());
        assert!(matches!(
            kb.validate(),
            Err(KnowledgeBaseError::UppercaseTrigger { category: Category::Seo, .. })
        ));
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let mut kb = KnowledgeBase::builtin();
        kb.rules.insert(0, KeywordRule::new(Category::Seo, &["rank"]));
        assert!(matches!(
            kb.validate(),
            Err(KnowledgeBaseError::DuplicateRule(Category::Seo))
        ));
    }

    #[test]
    fn test_rule_without_triggers_rejected() {
        let mut kb = KnowledgeBase::builtin();
        kb.rules[3].triggers.clear();
        assert!(matches!(
            kb.validate(),
            Err(KnowledgeBaseError::NoTriggers(Category::Ppc))
        ));
    }

    #[test]
    fn test_empty_trigger_rejected() {
        let mut kb = KnowledgeBase::builtin();
        kb.rules[0].triggers.push(String::new());
        assert!(matches!(
            kb.validate(),
            Err(KnowledgeBaseError::EmptyTrigger(Category::Greeting))
        ));
    }

    #[test]
    fn test_blank_response_rejected() {
        let mut kb = KnowledgeBase::builtin();
        kb.responses.insert(Category::Team, &["fine", "   "]);
        assert!(matches!(
            kb.validate(),
            Err(KnowledgeBaseError::BlankResponse(Category::Team))
        ));
    }

    #[test]
    fn test_empty_nudge_rejected() {
        let mut kb = KnowledgeBase::builtin();
        kb.nudge = " ".into();
        assert!(matches!(kb.validate(), Err(KnowledgeBaseError::EmptyNudge)));
    }

    #[test]
    fn test_with_contact_rewrites_replies_and_nudge() {
        let kb = KnowledgeBase::builtin().with_contact("+44 20 7946 0000", "team@example.org");
        kb.validate().unwrap();
        assert!(kb.nudge.contains("+44 20 7946 0000"));
        assert!(kb.nudge.contains("team@example.org"));

        let all = kb.responses.0.values().flatten();
        for reply in all {
            assert!(!reply.contains(WHATSAPP), "stale number in {reply:?}");
            assert!(!reply.contains(EMAIL), "stale email in {reply:?}");
        }
        assert!(kb.responses.get(Category::Whatsapp).unwrap()[0].contains("+44 20 7946 0000"));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        let kb = KnowledgeBase::builtin();
        std::fs::write(&path, serde_json::to_string(&kb).unwrap()).unwrap();
        assert_eq!(KnowledgeBase::from_path(&path).unwrap(), kb);

        std::fs::write(&path, r#"{"rules": [], "responses": {}, "nudge": "x"}"#).unwrap();
        let err = KnowledgeBase::from_path(&path).unwrap_err();
        assert!(err.to_string().contains("invalid knowledge base"));

        assert!(KnowledgeBase::from_path(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_from_json_substitute_table() {
        let json = r#"{
            "rules": [
                {"category": "pricing", "triggers": ["cost"]},
                {"category": "default"}
            ],
            "responses": {
                "pricing": ["cheap"],
                "default": ["no idea"]
            },
            "nudge": "ping us"
        }"#;
        let kb = KnowledgeBase::from_json(json).unwrap();
        assert_eq!(kb.rules.len(), 2);
        assert_eq!(kb.responses.get(Category::Pricing).unwrap(), ["cheap"]);
    }

    #[test]
    fn test_from_json_missing_responses() {
        let json = r#"{
            "rules": [
                {"category": "seo", "triggers": ["seo"]},
                {"category": "default"}
            ],
            "responses": {"default": ["no idea"]},
            "nudge": "ping us"
        }"#;
        assert!(matches!(
            KnowledgeBase::from_json(json),
            Err(KnowledgeBaseError::MissingResponses(Category::Seo))
        ));
    }

    #[test]
    fn test_from_json_unknown_category() {
        let json = r#"{"rules": [{"category": "astrology"}], "responses": {}, "nudge": "x"}"#;
        assert!(matches!(
            KnowledgeBase::from_json(json),
            Err(KnowledgeBaseError::Parse(_))
        ));
    }
}
