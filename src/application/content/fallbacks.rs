//! Hand-authored defaults served when a module has never been cached and its
//! loader fails. Shapes match the loaders' payloads so templates need no
//! special case.

use serde_json::{Value, json};

use crate::cache::{FallbackRegistry, Module};

pub fn default_fallbacks() -> FallbackRegistry {
    Module::ALL
        .into_iter()
        .fold(FallbackRegistry::new(), |registry, module| {
            registry.register(module, fallback_payload(module))
        })
}

fn fallback_payload(module: Module) -> Value {
    match module {
        Module::Home => json!({
            "services": service_cards(),
            "leadership": [],
            "latest_news": [],
            "water_today": Value::Null,
            "social_links": [],
        }),
        Module::Services => json!({
            "hero": {
                "title": "Our services",
                "subtitle": "Water supply, sewerage and customer care",
            },
            "items": service_cards(),
        }),
        Module::Contact => json!({
            "items": [{
                "title": "Customer care",
                "body": { "note": "Visit any of our offices during working hours." },
            }],
            "locations": [],
        }),
        Module::SocialLinks => json!({ "links": [] }),
        Module::Tenders
        | Module::Careers
        | Module::News
        | Module::Media
        | Module::Faq
        | Module::WaterToday
        | Module::Leadership
        | Module::Projects
        | Module::Locations => json!({ "items": [] }),
    }
}

fn service_cards() -> Value {
    json!([
        { "title": "New connections", "body": { "summary": "Apply for a water or sewer connection." } },
        { "title": "Billing", "body": { "summary": "View and pay your water bill." } },
        { "title": "Report a leak", "body": { "summary": "Tell us about bursts and leaks." } },
    ])
}
