//! Denormalisation fan-out.
//!
//! A write to one module's data stales every snapshot whose payload embeds
//! that data. This table is the single place that knows which loaders embed
//! what; update it whenever a loader starts reading another module's rows.

use super::module::Module;

/// Modules whose snapshots must be purged after a write to `written`.
/// Always starts with `written` itself.
pub fn affected_modules(written: Module) -> &'static [Module] {
    match written {
        Module::SocialLinks => &[Module::SocialLinks, Module::Home],
        Module::Leadership => &[Module::Leadership, Module::Home],
        Module::Services => &[Module::Services, Module::Home],
        Module::News => &[Module::News, Module::Home],
        Module::WaterToday => &[Module::WaterToday, Module::Home],
        Module::Locations => &[Module::Locations, Module::Contact],
        Module::Home => &[Module::Home],
        Module::Tenders => &[Module::Tenders],
        Module::Careers => &[Module::Careers],
        Module::Media => &[Module::Media],
        Module::Faq => &[Module::Faq],
        Module::Contact => &[Module::Contact],
        Module::Projects => &[Module::Projects],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_write_purges_its_own_module_first() {
        for module in Module::ALL {
            assert_eq!(affected_modules(module).first(), Some(&module));
        }
    }

    #[test]
    fn social_link_write_reaches_home_but_not_tenders() {
        let affected = affected_modules(Module::SocialLinks);
        assert!(affected.contains(&Module::SocialLinks));
        assert!(affected.contains(&Module::Home));
        assert!(!affected.contains(&Module::Tenders));
    }

    #[test]
    fn location_write_reaches_contact() {
        assert_eq!(
            affected_modules(Module::Locations),
            &[Module::Locations, Module::Contact]
        );
    }

    #[test]
    fn no_module_is_listed_twice() {
        for module in Module::ALL {
            let affected = affected_modules(module);
            for (i, a) in affected.iter().enumerate() {
                assert!(!affected[i + 1..].contains(a), "{module} lists {a} twice");
            }
        }
    }
}
