//! Content entry rules.

use super::error::DomainError;
use crate::cache::Module;

const MAX_TITLE_LEN: usize = 200;

/// Modules whose payload is a list of content entries. `Home` is composed from
/// other modules and social links have their own table.
pub fn is_entry_backed(module: Module) -> bool {
    !matches!(module, Module::Home | Module::SocialLinks)
}

pub fn ensure_entry_backed(module: Module) -> Result<(), DomainError> {
    if is_entry_backed(module) {
        Ok(())
    } else {
        Err(DomainError::NotEntryBacked {
            module: module.as_str().to_string(),
        })
    }
}

pub fn normalize_title(raw: &str) -> Result<String, DomainError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(DomainError::validation("title", "must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(DomainError::validation(
            "title",
            format!("must be at most {MAX_TITLE_LEN} characters"),
        ));
    }
    Ok(title.to_string())
}
