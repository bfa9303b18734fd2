//! Declaration-shape model of a parsed Java source file.
//!
//! Only what version matching needs is kept: names, parameter and return
//! types, and where each declaration's documentation comment lives. Bodies,
//! initializers and expressions are never materialized.

/// Byte range into the original source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Documentation anchor shared by every declaration kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocSite {
    /// Existing `/** ... */` comment directly before the declaration.
    pub doc: Option<Span>,
    /// Offset of the first token of the declaration, annotations included.
    pub start: usize,
}

#[derive(Debug, Default)]
pub struct CompilationUnit {
    /// Dotted package name, e.g. `android.app`.
    pub package: Option<String>,
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Annotation,
    Record,
}

#[derive(Debug)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub name: String,
    pub site: DocSite,
    /// Members in source order.
    pub members: Vec<Member>,
}

#[derive(Debug)]
pub enum Member {
    Type(TypeDecl),
    Field(FieldDecl),
    EnumConstant(EnumConstant),
    Method(MethodDecl),
    Constructor(ConstructorDecl),
}

impl Member {
    pub fn site(&self) -> &DocSite {
        match self {
            Member::Type(decl) => &decl.site,
            Member::Field(decl) => &decl.site,
            Member::EnumConstant(decl) => &decl.site,
            Member::Method(decl) => &decl.site,
            Member::Constructor(decl) => &decl.site,
        }
    }
}

/// A field declaration. Only the first declarator is named; `int a, b;`
/// shares one documentation comment.
#[derive(Debug)]
pub struct FieldDecl {
    pub name: String,
    pub site: DocSite,
}

#[derive(Debug)]
pub struct EnumConstant {
    pub name: String,
    pub site: DocSite,
}

#[derive(Debug)]
pub struct MethodDecl {
    pub name: String,
    pub params: Vec<TypeRef>,
    pub return_type: TypeRef,
    pub site: DocSite,
}

#[derive(Debug)]
pub struct ConstructorDecl {
    pub name: String,
    pub params: Vec<TypeRef>,
    pub site: DocSite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl Primitive {
    pub fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "boolean" => Primitive::Boolean,
            "char" => Primitive::Char,
            "byte" => Primitive::Byte,
            "short" => Primitive::Short,
            "int" => Primitive::Int,
            "long" => Primitive::Long,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseType {
    Primitive(Primitive),
    Void,
    /// Reference type as written, one entry per dotted segment, with type
    /// arguments and type annotations already dropped.
    Named(Vec<String>),
}

/// A written type: its element type plus array dimensions (varargs and
/// dimensions after a parameter name included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub base: BaseType,
    pub dims: usize,
}

impl TypeRef {
    #[cfg(test)]
    pub fn named(path: &str) -> Self {
        Self {
            base: BaseType::Named(path.split('.').map(str::to_string).collect()),
            dims: 0,
        }
    }

    #[cfg(test)]
    pub fn primitive(primitive: Primitive) -> Self {
        Self {
            base: BaseType::Primitive(primitive),
            dims: 0,
        }
    }

    pub fn array(mut self, dims: usize) -> Self {
        self.dims += dims;
        self
    }
}
