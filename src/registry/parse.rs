//! Registry document walking.

use super::{RegistryError, TypeEntry, VersionFact};
use crate::descriptor;
use crate::version::ApiLevel;
use roxmltree::{Document, Node};
use std::collections::HashMap;
use tracing::warn;

pub(super) fn types(xml: &str) -> Result<HashMap<String, TypeEntry>, RegistryError> {
    let document = Document::parse(xml)?;
    let mut types = HashMap::new();

    for class in document.descendants().filter(|node| node.has_tag_name("class")) {
        let Some(name) = name_of(&class) else {
            continue;
        };

        let mut entry = TypeEntry {
            fact: fact_of(&class),
            ..TypeEntry::default()
        };

        for child in class.children().filter(|node| node.is_element()) {
            let is_field = child.has_tag_name("field");
            if !is_field && !child.has_tag_name("method") {
                continue;
            }
            let Some(member) = name_of(&child) else {
                continue;
            };
            let fact = fact_of(&child);
            if fact.is_empty() {
                continue;
            }
            if is_field {
                entry.fields.insert(member.to_string(), fact);
            } else {
                entry.methods.insert(descriptor::normalize(member), fact);
            }
        }

        if !entry.is_empty() {
            types.insert(name.to_string(), entry);
        }
    }

    Ok(types)
}

fn name_of<'a>(node: &Node<'a, '_>) -> Option<&'a str> {
    let name = node.attribute("name").filter(|name| !name.is_empty());
    if name.is_none() {
        let pos = node.document().text_pos_at(node.range().start);
        warn!(element = node.tag_name().name(), %pos, "registry element without a name, skipped");
    }
    name
}

fn fact_of(node: &Node<'_, '_>) -> VersionFact {
    VersionFact {
        since: level_of(node, "since"),
        deprecated: level_of(node, "deprecated"),
    }
}

/// An ordinal attribute. Values that are not integers count as absent.
fn level_of(node: &Node<'_, '_>, attribute: &str) -> Option<ApiLevel> {
    let value = node.attribute(attribute)?.trim();
    if value.is_empty() {
        return None;
    }
    match value.parse::<i32>() {
        Ok(level) => Some(ApiLevel::new(level)),
        Err(err) => {
            warn!(
                element = node.tag_name().name(),
                name = node.attribute("name").unwrap_or_default(),
                attribute,
                value,
                error = %err,
                "unparsable version number, treated as absent"
            );
            None
        }
    }
}
