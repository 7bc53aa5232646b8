//! Service aliases from link declarations

use crate::compose::Project;
use std::collections::{BTreeMap, BTreeSet};

/// Alternate names per service
pub type AliasMap = BTreeMap<String, BTreeSet<String>>;

/// Collect `SERVICE:ALIAS` links of every service. Links without an alias,
/// or aliasing a service to its own name, are skipped.
pub fn resolve_aliases(project: &Project) -> AliasMap {
    let mut aliases = AliasMap::new();
    for service in project.services.values() {
        for (target, alias) in service.link_aliases() {
            if target == alias {
                continue;
            }
            aliases
                .entry(target.to_string())
                .or_default()
                .insert(alias.to_string());
        }
    }
    aliases
}

/// The alias of `name`, when exactly one is declared
pub fn single_alias<'a>(aliases: &'a AliasMap, name: &str) -> Option<&'a str> {
    match aliases.get(name) {
        Some(set) if set.len() == 1 => set.iter().next().map(String::as_str),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::ServiceConfig;

    fn linking(links: &[&str]) -> ServiceConfig {
        ServiceConfig {
            links: links.iter().map(|l| l.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_aliases_from_links() {
        let project = Project::default()
            .with_service("web", linking(&["db:database", "cache", "queue:queue"]))
            .with_service("worker", linking(&["db:database", "cache:redis"]));

        let aliases = resolve_aliases(&project);
        assert_eq!(aliases.len(), 2);
        assert_eq!(single_alias(&aliases, "db"), Some("database"));
        assert_eq!(single_alias(&aliases, "cache"), Some("redis"));
        assert_eq!(single_alias(&aliases, "queue"), None);
    }

    #[test]
    fn test_ambiguous_alias_is_not_applied() {
        let project = Project::default()
            .with_service("web", linking(&["db:primary"]))
            .with_service("worker", linking(&["db:database"]));

        let aliases = resolve_aliases(&project);
        assert_eq!(aliases["db"].len(), 2);
        assert_eq!(single_alias(&aliases, "db"), None);
        assert_eq!(single_alias(&aliases, "web"), None);
    }
}
