//! Method descriptors in the simple-name form used as registry keys.
//!
//! The registry records JVM descriptors with fully qualified reference types
//! (`Landroid/app/AlertDialog$Builder;`), while source code only tells us the
//! name as written (`Builder`, or `AlertDialog.Builder`). Both sides are
//! reduced to `LBuilder;` so they can be compared as plain strings.

use crate::java::ast::{BaseType, ConstructorDecl, MethodDecl, Primitive, TypeRef};

/// Reduce every reference type in `descriptor` to its innermost simple name.
///
/// `setX([Ljava/lang/CharSequence;ILandroid/content/DialogInterface$OnClickListener;)V`
/// becomes `setX([LCharSequence;ILOnClickListener;)V`. The method name, array
/// prefixes, primitive codes and parentheses are copied as they are, and an
/// already-normalized descriptor comes back unchanged.
pub fn normalize(descriptor: &str) -> String {
    if !descriptor.contains(';') {
        return descriptor.to_string();
    }

    // The name may contain any letter, including `L`; only the type list is tokenized.
    let (name, types) = match descriptor.find('(') {
        Some(open) => descriptor.split_at(open),
        None => ("", descriptor),
    };

    let mut out = String::with_capacity(descriptor.len());
    out.push_str(name);

    let mut rest = types;
    while let Some(c) = rest.chars().next() {
        if c == 'L' {
            match rest.find(';') {
                Some(end) => {
                    out.push('L');
                    out.push_str(simple_name(&rest[1..end]));
                    out.push(';');
                    rest = &rest[end + 1..];
                    continue;
                }
                None => {
                    // unterminated reference type
                    out.push_str(rest);
                    break;
                }
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}

/// Last `/`- or `$`-separated segment of a binary type name.
fn simple_name(path: &str) -> &str {
    path.rsplit(|c: char| c == '/' || c == '$')
        .find(|segment| !segment.is_empty())
        .unwrap_or(path)
}

/// A method or constructor, the two declaration kinds that carry a descriptor.
#[derive(Debug, Clone, Copy)]
pub enum Callable<'a> {
    Method(&'a MethodDecl),
    Constructor(&'a ConstructorDecl),
}

impl Callable<'_> {
    /// Name as declared; for constructors the type name.
    pub fn name(&self) -> &str {
        match self {
            Callable::Method(method) => &method.name,
            Callable::Constructor(ctor) => &ctor.name,
        }
    }
}

/// Build the normalized descriptor of a source declaration.
///
/// Matches [`normalize`] applied to the registry descriptor of the same
/// method whenever both spell reference types with the same simple names.
pub fn declaration_descriptor(callable: Callable<'_>) -> String {
    let (name, params, return_type) = match callable {
        Callable::Method(method) => (method.name.as_str(), &method.params, Some(&method.return_type)),
        Callable::Constructor(ctor) => ("<init>", &ctor.params, None),
    };

    let mut out = String::with_capacity(name.len() + 2 + params.len() * 8);
    out.push_str(name);
    out.push('(');
    for param in params {
        push_type(&mut out, param);
    }
    out.push(')');
    match return_type {
        Some(ty) => push_type(&mut out, ty),
        None => out.push('V'),
    }
    out
}

fn push_type(out: &mut String, ty: &TypeRef) {
    for _ in 0..ty.dims {
        out.push('[');
    }
    match &ty.base {
        BaseType::Void => out.push('V'),
        BaseType::Primitive(primitive) => out.push(primitive_code(*primitive)),
        BaseType::Named(segments) => {
            let last = segments.last().map(String::as_str).unwrap_or_default();
            out.push('L');
            out.push_str(simple_name(last));
            out.push(';');
        }
    }
}

fn primitive_code(primitive: Primitive) -> char {
    match primitive {
        Primitive::Boolean => 'Z',
        Primitive::Char => 'C',
        Primitive::Byte => 'B',
        Primitive::Short => 'S',
        Primitive::Int => 'I',
        Primitive::Long => 'J',
        Primitive::Float => 'F',
        Primitive::Double => 'D',
    }
}
