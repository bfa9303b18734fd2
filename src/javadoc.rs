//! Merging version tags into documentation comments.
//!
//! Comments are only ever rewritten as a whole: an existing `/** ... */` is
//! re-rendered with the tags appended, a missing one is inserted in front of
//! the declaration. Text outside the returned [`Edit`] is never touched.

use crate::java::ast::{DocSite, Span};
use crate::registry::VersionFact;
use regex::Regex;
use std::sync::LazyLock;

/// Leading ` * ` margin of a comment line.
static RE_MARGIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[ \t]*\* ?").unwrap());

/// Replace `span` of the original source with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub span: Span,
    pub text: String,
}

/// Block tags describing `fact`, `@since` first.
pub fn version_tags(fact: VersionFact) -> Vec<String> {
    let mut tags = Vec::with_capacity(2);
    if let Some(since) = fact.since {
        tags.push(format!("@since {since}"));
    }
    if let Some(deprecated) = fact.deprecated {
        tags.push(format!("@deprecated {deprecated}"));
    }
    tags
}

/// Compute the edit that documents `fact` on the declaration at `site`.
///
/// Returns `None` when there is nothing to add, either because the fact is
/// empty or because every tag is already present verbatim.
pub fn merge(src: &str, site: &DocSite, fact: VersionFact) -> Option<Edit> {
    let tags = version_tags(fact);
    if tags.is_empty() {
        return None;
    }

    match site.doc {
        Some(span) => {
            let indent = line_indent(src, span.start);
            let eol = line_ending(src);
            let mut lines = comment_lines(&src[span.start..span.end]);

            let missing: Vec<String> = tags
                .into_iter()
                .filter(|tag| !lines.iter().any(|line| line.trim() == tag.as_str()))
                .collect();
            if missing.is_empty() {
                return None;
            }

            // separate the description from the first block tag
            let has_block_tags = lines.iter().any(|line| line.trim_start().starts_with('@'));
            if !lines.is_empty() && !has_block_tags {
                lines.push(String::new());
            }
            lines.extend(missing);

            Some(Edit {
                span,
                text: render(&lines, indent, eol),
            })
        }
        None => {
            let indent = line_indent(src, site.start);
            let eol = line_ending(src);
            let mut text = render(&tags, indent, eol);
            text.push_str(eol);
            text.push_str(indent);
            Some(Edit {
                span: Span {
                    start: site.start,
                    end: site.start,
                },
                text,
            })
        }
    }
}

/// Whitespace at the start of the line containing `offset`.
fn line_indent(src: &str, offset: usize) -> &str {
    let line_start = src[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line = &src[line_start..offset];
    let rest = line.trim_start_matches(|c: char| c == ' ' || c == '\t');
    &line[..line.len() - rest.len()]
}

/// Line terminator of the first line of `src`; comments are written with it.
fn line_ending(src: &str) -> &'static str {
    match src.find('\n') {
        Some(i) if src[..i].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

/// Text lines of a documentation comment with delimiters and margins removed
/// and blank lines at either end dropped.
fn comment_lines(comment: &str) -> Vec<String> {
    let body = comment.strip_prefix("/**").unwrap_or(comment);
    let body = body.strip_suffix("*/").unwrap_or(body);

    let mut lines: Vec<String> = body
        .lines()
        .map(|line| match RE_MARGIN.find(line) {
            Some(margin) => &line[margin.end()..],
            None => line.trim_start(),
        })
        .map(|line| line.trim_end().to_string())
        .collect();

    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|line| line.is_empty()).count();
    lines.drain(..leading);
    lines
}

fn render(lines: &[String], indent: &str, eol: &str) -> String {
    let mut out = format!("/**{eol}");
    for line in lines {
        if line.is_empty() {
            out.push_str(&format!("{indent} *{eol}"));
        } else {
            out.push_str(&format!("{indent} * {line}{eol}"));
        }
    }
    out.push_str(indent);
    out.push_str(" */");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::ApiLevel;

    fn since(level: i32) -> VersionFact {
        VersionFact {
            since: Some(ApiLevel::new(level)),
            deprecated: None,
        }
    }

    fn apply(src: &str, edit: &Edit) -> String {
        format!("{}{}{}", &src[..edit.span.start], edit.text, &src[edit.span.end..])
    }

    fn site_of(src: &str, declaration: &str) -> DocSite {
        let start = src.find(declaration).unwrap();
        let doc = src[..start].rfind("/**").map(|open| Span {
            start: open,
            end: src[open..].find("*/").unwrap() + open + 2,
        });
        DocSite { doc, start }
    }

    #[test]
    fn formats_tags() {
        let fact = VersionFact {
            since: Some(ApiLevel::new(21)),
            deprecated: Some(ApiLevel::new(99)),
        };
        assert_eq!(
            version_tags(fact),
            vec!["@since 5.0 Lollipop (21)".to_string(), "@deprecated unknown (99)".to_string()]
        );
        assert!(version_tags(VersionFact::default()).is_empty());
    }

    #[test]
    fn creates_missing_comment() {
        let src = "class A {\n    void foo() {}\n}\n";
        let edit = merge(src, &site_of(src, "void"), since(21)).unwrap();
        assert_eq!(
            apply(src, &edit),
            "class A {\n    /**\n     * @since 5.0 Lollipop (21)\n     */\n    void foo() {}\n}\n"
        );
    }

    #[test]
    fn appends_after_description() {
        let src = "class A {\n    /** Does things. */\n    void foo() {}\n}\n";
        let edit = merge(src, &site_of(src, "void"), since(22)).unwrap();
        assert_eq!(
            apply(src, &edit),
            "class A {\n    /**\n     * Does things.\n     *\n     * @since 5.1 Lollipop (22)\n     */\n    void foo() {}\n}\n"
        );
    }

    #[test]
    fn appends_after_existing_block_tags() {
        let src = "/**\n * Text.\n *\n *   indented\n * @param x the x\n */\nvoid f(int x) {}";
        let edit = merge(src, &site_of(src, "void"), since(3)).unwrap();
        assert_eq!(
            apply(src, &edit),
            "/**\n * Text.\n *\n *   indented\n * @param x the x\n * @since 1.5 Cupcake (3)\n */\nvoid f(int x) {}"
        );
    }

    #[test]
    fn keeps_prior_tags_of_the_same_kind() {
        let src = "/**\n * @deprecated use bar\n */\nvoid foo() {}";
        let fact = VersionFact {
            since: None,
            deprecated: Some(ApiLevel::new(23)),
        };
        let out = apply(src, &merge(src, &site_of(src, "void"), fact).unwrap());
        assert!(out.contains(" * @deprecated use bar\n * @deprecated 6.0 Marshmallow (23)\n"));
    }

    #[test]
    fn present_tags_are_not_repeated() {
        let src = "/**\n * @since 5.0 Lollipop (21)\n */\nvoid foo() {}";
        assert_eq!(merge(src, &site_of(src, "void"), since(21)), None);
    }

    #[test]
    fn empty_fact_makes_no_edit() {
        let src = "void foo() {}";
        assert_eq!(merge(src, &site_of(src, "void"), VersionFact::default()), None);
    }

    #[test]
    fn keeps_crlf_line_endings() {
        let src = "class Foo {\r\n    /**\r\n     * Doc.\r\n     */\r\n    void old() {}\r\n}\r\n";
        let edit = merge(src, &site_of(src, "void"), since(3)).unwrap();
        assert_eq!(
            apply(src, &edit),
            "class Foo {\r\n    /**\r\n     * Doc.\r\n     *\r\n     * @since 1.5 Cupcake (3)\r\n     */\r\n    void old() {}\r\n}\r\n"
        );

        let src = "class Foo {\r\n    int x;\r\n}\r\n";
        let edit = merge(src, &site_of(src, "int"), since(3)).unwrap();
        assert_eq!(
            apply(src, &edit),
            "class Foo {\r\n    /**\r\n     * @since 1.5 Cupcake (3)\r\n     */\r\n    int x;\r\n}\r\n"
        );
    }

    #[test]
    fn empty_comment_gets_tags_only() {
        let src = "/** */\nint x;";
        let edit = merge(src, &site_of(src, "int"), since(1)).unwrap();
        assert_eq!(apply(src, &edit), "/**\n * @since 1.0 (initial) (1)\n */\nint x;");
    }
}
