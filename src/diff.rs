//! Report of what one API level added and deprecated.
//!
//! One fenced `diff` block per type, sorted by qualified name. Fields come
//! before methods, each sorted by key. `-` marks a deprecation and `+` an
//! addition; an item added and deprecated at the same level gets `-+`.

use crate::registry::{RegistryIndex, TypeEntry, VersionFact};
use crate::version::ApiLevel;
use std::collections::HashMap;

/// Render the report for `level`. Empty when nothing was added or deprecated there.
pub fn render(index: &RegistryIndex, level: ApiLevel) -> String {
    let mut types: Vec<(&String, &TypeEntry)> = index.entries().iter().collect();
    types.sort_by(|a, b| a.0.cmp(b.0));

    let mut out = String::new();
    for (name, entry) in types {
        let fields = touched(&entry.fields, level);
        let methods = touched(&entry.methods, level);
        if !entry.fact.touches(level) && fields.is_empty() && methods.is_empty() {
            continue;
        }

        out.push_str("```diff\n");
        out.push_str(markers(entry.fact, level));
        out.push_str(name);
        out.push('\n');
        for (key, fact) in fields.into_iter().chain(methods) {
            out.push_str(&format!("{}   {}\n", markers(fact, level), key));
        }
        out.push_str("```\n\n");
    }
    out
}

/// Members whose fact touches `level`, sorted by key.
fn touched(members: &HashMap<String, VersionFact>, level: ApiLevel) -> Vec<(&str, VersionFact)> {
    let mut kept: Vec<(&str, VersionFact)> = members
        .iter()
        .filter(|(_, fact)| fact.touches(level))
        .map(|(key, fact)| (key.as_str(), *fact))
        .collect();
    kept.sort_unstable_by(|a, b| a.0.cmp(b.0));
    kept
}

fn markers(fact: VersionFact, level: ApiLevel) -> &'static str {
    match (fact.deprecated == Some(level), fact.since == Some(level)) {
        (true, true) => "-+",
        (true, false) => "-",
        (false, true) => "+",
        (false, false) => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = r#"<api version="3">
    <class name="android/os/Bundle" since="1">
        <field name="EMPTY" since="1"/>
        <field name="MODE" since="5" deprecated="23"/>
        <method name="putAll(Landroid/os/PersistableBundle;)V" since="23"/>
        <method name="clear()V" since="1"/>
        <method name="both()V" since="23" deprecated="23"/>
    </class>
    <class name="android/app/Activity" since="23"/>
    <class name="android/app/Zed" since="2">
        <field name="Z" since="23"/>
        <field name="A" since="23"/>
    </class>
    <class name="android/app/Old" since="1"/>
</api>"#;

    fn report(level: i32) -> String {
        let index = RegistryIndex::parse(REGISTRY).unwrap();
        render(&index, ApiLevel::new(level))
    }

    #[test]
    fn groups_and_sorts_per_type() {
        assert_eq!(
            report(23),
            "```diff\n\
             +android/app/Activity\n\
             ```\n\
             \n\
             ```diff\n\
             android/app/Zed\n\
             +   A\n\
             +   Z\n\
             ```\n\
             \n\
             ```diff\n\
             android/os/Bundle\n\
             -   MODE\n\
             -+   both()V\n\
             +   putAll(LPersistableBundle;)V\n\
             ```\n\
             \n"
        );
    }

    #[test]
    fn deprecation_only_at_its_level() {
        let out = report(5);
        assert!(out.contains("+   MODE\n"));
        assert!(!out.contains("-   MODE"));
        assert!(!report(23).contains("+   MODE"));
    }

    #[test]
    fn untouched_level_renders_nothing() {
        assert_eq!(report(30), "");
    }
}
