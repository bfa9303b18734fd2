//! Attaching registry facts to the declarations of one parsed file.

use crate::descriptor::{self, Callable};
use crate::java::ast::{CompilationUnit, DocSite, Member, TypeDecl};
use crate::javadoc::{self, Edit};
use crate::registry::{RegistryIndex, VersionFact};
use tracing::trace;

/// Result of annotating one file.
#[derive(Debug)]
pub struct Annotated {
    pub source: String,
    /// Number of declarations whose documentation changed.
    pub declarations: usize,
}

pub struct Annotator<'a> {
    index: &'a RegistryIndex,
}

impl<'a> Annotator<'a> {
    pub fn new(index: &'a RegistryIndex) -> Self {
        Self { index }
    }

    /// Rewrite `src` with version tags for every declaration of `unit` found
    /// in the registry. Without matches the source comes back unchanged.
    pub fn annotate(&self, src: &str, unit: &CompilationUnit) -> Annotated {
        let prefix = unit
            .package
            .as_deref()
            .map(|package| format!("{}/", package.replace('.', "/")))
            .unwrap_or_default();

        let mut edits = Vec::new();
        for decl in &unit.types {
            let name = format!("{prefix}{}", decl.name);
            self.visit_type(src, &name, decl, &mut edits);
        }

        Annotated {
            declarations: edits.len(),
            source: apply_edits(src, edits),
        }
    }

    fn visit_type(&self, src: &str, name: &str, decl: &TypeDecl, edits: &mut Vec<Edit>) {
        trace!(name, kind = ?decl.kind, members = decl.members.len(), "visit type");
        for member in &decl.members {
            if let Member::Type(nested) = member {
                let nested_name = format!("{name}${}", nested.name);
                self.visit_type(src, &nested_name, nested, edits);
            }
        }

        for member in &decl.members {
            let fact = match member {
                Member::Type(_) => continue,
                Member::Field(field) => self.index.lookup_field(name, &field.name),
                Member::EnumConstant(constant) => self.index.lookup_field(name, &constant.name),
                Member::Method(method) => self.lookup_callable(name, Callable::Method(method)),
                Member::Constructor(ctor) => self.lookup_callable(name, Callable::Constructor(ctor)),
            };
            push_edit(src, member.site(), fact, edits);
        }

        push_edit(src, &decl.site, self.index.lookup_type(name), edits);
    }

    fn lookup_callable(&self, type_name: &str, callable: Callable<'_>) -> Option<VersionFact> {
        let key = descriptor::declaration_descriptor(callable);
        let fact = self.index.lookup_method(type_name, &key);
        trace!(type_name, name = callable.name(), descriptor = %key, found = fact.is_some(), "method lookup");
        fact
    }
}

fn push_edit(src: &str, site: &DocSite, fact: Option<VersionFact>, edits: &mut Vec<Edit>) {
    if let Some(edit) = fact.and_then(|fact| javadoc::merge(src, site, fact)) {
        edits.push(edit);
    }
}

/// Splice non-overlapping edits into `src`.
fn apply_edits(src: &str, mut edits: Vec<Edit>) -> String {
    if edits.is_empty() {
        return src.to_string();
    }
    edits.sort_by_key(|edit| (edit.span.start, edit.span.end));

    let extra: usize = edits.iter().map(|edit| edit.text.len()).sum();
    let mut out = String::with_capacity(src.len() + extra);
    let mut cursor = 0;
    for edit in &edits {
        out.push_str(&src[cursor..edit.span.start]);
        out.push_str(&edit.text);
        cursor = edit.span.end;
    }
    out.push_str(&src[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::java::ast::Span;
    use crate::java::{self, LanguageLevel};

    const REGISTRY: &str = r#"<api version="3">
    <class name="android/app/Foo" since="1">
        <method name="foo(Landroid/os/Bundle;)V" since="21"/>
        <method name="&lt;init>(Landroid/content/Context;)V" since="3"/>
        <method name="bar([Ljava/lang/String;)V" since="9" deprecated="23"/>
        <field name="MODE" since="5"/>
    </class>
    <class name="android/app/Foo$Inner" since="11">
        <field name="A" since="14"/>
    </class>
</api>"#;

    fn annotate(src: &str) -> Annotated {
        let index = RegistryIndex::parse(REGISTRY).unwrap();
        let unit = java::parse(src, LanguageLevel::Java11).unwrap();
        Annotator::new(&index).annotate(src, &unit)
    }

    #[test]
    fn documents_matching_method() {
        let src = "package android.app;\n\nclass Foo {\n    void foo(Bundle b) {}\n}\n";
        let out = annotate(src);
        assert_eq!(out.declarations, 2);
        assert_eq!(
            out.source,
            "package android.app;\n\n/**\n * @since 1.0 (initial) (1)\n */\nclass Foo {\n    /**\n     * @since 5.0 Lollipop (21)\n     */\n    void foo(Bundle b) {}\n}\n"
        );
    }

    #[test]
    fn unmatched_file_is_unchanged() {
        let src = "package android.widget;\n\n// nothing here\nclass Bar {\n  /** Keep me. */\n  void foo(Bundle b) {}\n}\n";
        let out = annotate(src);
        assert_eq!(out.declarations, 0);
        assert_eq!(out.source, src);
    }

    #[test]
    fn nested_types_constructors_and_varargs() {
        let src = "package android.app;\n\
                   public class Foo {\n\
                   public Foo(android.content.Context context) {}\n\
                   public void bar(String... names) {}\n\
                   public static final int MODE = 1;\n\
                   public enum Inner { A, B }\n\
                   }\n";
        let out = annotate(src);
        // Foo, constructor, bar, MODE, Inner, A
        assert_eq!(out.declarations, 6);
        assert!(out.source.contains("@since 1.5 Cupcake (3)\n */\npublic Foo("));
        assert!(out.source.contains("@since 2.3 Gingerbread (9)\n * @deprecated 6.0 Marshmallow (23)\n */\npublic void bar"));
        assert!(out.source.contains("@since 3.0 Honeycomb (11)\n */\npublic enum Inner"));
        assert!(out.source.contains("@since 4.0 Ice Cream Sandwich (14)\n */\nA, B"));
        assert!(!out.source.contains("B }\n/**"));
    }

    #[test]
    fn second_run_is_a_no_op() {
        let src = "package android.app;\nclass Foo {\n    /** Foo it. */\n    void foo(Bundle b) {}\n}\n";
        let first = annotate(src);
        let second = annotate(&first.source);
        assert_eq!(second.declarations, 0);
        assert_eq!(second.source, first.source);
    }

    #[test]
    fn byte_order_mark_is_preserved() {
        let src = "\u{feff}package android.app;\nclass Foo {}\n";
        let unit = java::parse_with_fallback(src, LanguageLevel::Java11).unwrap();
        let index = RegistryIndex::parse(REGISTRY).unwrap();
        let out = Annotator::new(&index).annotate(src, &unit);
        assert_eq!(
            out.source,
            "\u{feff}package android.app;\n/**\n * @since 1.0 (initial) (1)\n */\nclass Foo {}\n"
        );
    }

    #[test]
    fn doc_below_annotations_is_extended_in_place() {
        let src = "package android.app;\n/** Foo. */\nclass Foo {\n    @Deprecated\n    /** Foo it. */\n    void foo(Bundle b) {}\n}\n";
        let out = annotate(src);
        assert_eq!(out.source.matches("/**").count(), 2);
        assert!(out.source.contains(
            "    @Deprecated\n    /**\n     * Foo it.\n     *\n     * @since 5.0 Lollipop (21)\n     */\n    void foo"
        ));
    }

    #[test]
    fn edits_are_spliced_in_order() {
        let src = "abcdef";
        let edits = vec![
            Edit {
                span: Span { start: 4, end: 5 },
                text: "E".to_string(),
            },
            Edit {
                span: Span { start: 1, end: 1 },
                text: "+".to_string(),
            },
        ];
        assert_eq!(apply_edits(src, edits), "a+bcdEf");
    }
}
