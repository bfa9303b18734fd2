//! Recursive-descent parser for Java declaration shapes.
//!
//! Only the declaration skeleton is understood. Method bodies, field
//! initializers, annotation arguments and class headers are skipped by
//! balanced-delimiter scanning, so expressions never need a grammar.

use super::ast::{
    BaseType, CompilationUnit, ConstructorDecl, DocSite, EnumConstant, FieldDecl, Member, MethodDecl,
    Primitive, TypeDecl, TypeKind, TypeRef,
};
use super::lexer::{Token, TokenKind};
use super::{LanguageLevel, ParseError};

type PResult<T> = Result<T, ParseError>;

/// Keywords and literals that can never name a declaration.
const RESERVED: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
    "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long", "native",
    "new", "package", "private", "protected", "public", "return", "short", "static", "strictfp",
    "super", "switch", "synchronized", "this", "throw", "throws", "transient", "try", "void",
    "volatile", "while", "true", "false", "null",
];

/// Contextual words that Java 17 sources may not use as names.
const RESTRICTED: &[&str] = &["sealed", "permits"];

const MODIFIERS: &[&str] = &[
    "public", "protected", "private", "static", "abstract", "final", "native", "synchronized",
    "transient", "volatile", "strictfp", "default",
];

pub struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    level: LanguageLevel,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str, mut tokens: Vec<Token>, level: LanguageLevel) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = src.len();
            tokens.push(Token {
                kind: TokenKind::Eof,
                span: super::ast::Span { start: end, end },
                doc: None,
            });
        }
        Self {
            src,
            tokens,
            pos: 0,
            level,
        }
    }

    pub fn compilation_unit(mut self) -> PResult<CompilationUnit> {
        let mut unit = CompilationUnit::default();

        while !self.at_eof() {
            if self.eat_punct(';') {
                continue;
            }
            if self.at_word("import") {
                self.skip_past(';')?;
                continue;
            }

            let mark = self.pos;
            self.modifiers()?;
            let site = self.declaration_site(mark);

            if self.at_word("package") {
                self.bump();
                unit.package = Some(self.qualified_name()?);
                self.expect_punct(';')?;
                continue;
            }
            if self.at_module_declaration() {
                self.skip_to_body()?;
                self.skip_balanced()?;
                continue;
            }

            match self.type_declaration(site)? {
                Some(decl) => unit.types.push(decl),
                None => return Err(self.error("expected a type declaration")),
            }
        }

        Ok(unit)
    }

    // -- token access --

    fn peek(&self) -> Token {
        self.tokens[self.pos]
    }

    fn peek_nth(&self, n: usize) -> Token {
        let last = self.tokens.len() - 1;
        self.tokens[(self.pos + n).min(last)]
    }

    fn text(&self, token: Token) -> &'a str {
        &self.src[token.span.start..token.span.end]
    }

    /// Consume the current token. Never moves past `Eof`.
    fn bump(&mut self) -> Token {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn at_ident(&self) -> bool {
        self.nth_is_ident(0)
    }

    fn nth_is_ident(&self, n: usize) -> bool {
        self.peek_nth(n).kind == TokenKind::Ident
    }

    fn at_punct(&self, c: char) -> bool {
        self.nth_is_punct(0, c)
    }

    fn nth_is_punct(&self, n: usize, c: char) -> bool {
        self.peek_nth(n).kind == TokenKind::Punct(c)
    }

    fn at_word(&self, word: &str) -> bool {
        self.nth_is_word(0, word)
    }

    fn nth_is_word(&self, n: usize, word: &str) -> bool {
        let token = self.peek_nth(n);
        token.kind == TokenKind::Ident && self.text(token) == word
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.at_punct(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char) -> PResult<()> {
        if self.eat_punct(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{c}`")))
        }
    }

    fn error(&self, message: impl AsRef<str>) -> ParseError {
        let token = self.peek();
        let found = match token.kind {
            TokenKind::Eof => "end of file".to_string(),
            _ => format!("`{}`", self.text(token)),
        };
        ParseError::at(self.src, token.span.start, format!("{}, found {}", message.as_ref(), found))
    }

    /// Site of a declaration whose first token is at `mark`. A doc comment
    /// placed between the annotations and the rest of the declaration counts
    /// when there is none in front of it.
    fn declaration_site(&self, mark: usize) -> DocSite {
        DocSite {
            doc: self.tokens[mark..=self.pos].iter().find_map(|token| token.doc),
            start: self.tokens[mark].span.start,
        }
    }

    fn ident(&mut self, what: &str) -> PResult<&'a str> {
        if !self.at_ident() {
            return Err(self.error(format!("expected {what}")));
        }
        let token = self.bump();
        Ok(self.text(token))
    }

    /// A declared name: any identifier except keywords, and under Java 17 the
    /// restricted words as well.
    fn expect_name(&mut self, what: &str) -> PResult<String> {
        if !self.at_ident() {
            return Err(self.error(format!("expected {what} name")));
        }
        let word = self.text(self.peek());
        let restricted = self.level.restricts_identifiers() && RESTRICTED.contains(&word);
        if RESERVED.contains(&word) || restricted {
            return Err(self.error(format!("`{word}` cannot be used as {what} name")));
        }
        self.bump();
        Ok(word.to_string())
    }

    fn qualified_name(&mut self) -> PResult<String> {
        let mut name = self.ident("a name")?.to_string();
        while self.at_punct('.') && self.nth_is_ident(1) {
            self.bump();
            name.push('.');
            name.push_str(self.ident("a name")?);
        }
        Ok(name)
    }

    // -- skipping --

    /// Skip a bracketed group starting at the current `(`, `[` or `{`.
    fn skip_balanced(&mut self) -> PResult<()> {
        let open = self.peek();
        let mut closers = Vec::new();
        loop {
            let token = self.bump();
            match token.kind {
                TokenKind::Punct('(') => closers.push(')'),
                TokenKind::Punct('[') => closers.push(']'),
                TokenKind::Punct('{') => closers.push('}'),
                TokenKind::Punct(c @ (')' | ']' | '}')) => {
                    if closers.pop() != Some(c) {
                        return Err(ParseError::at(self.src, token.span.start, format!("unbalanced `{c}`")));
                    }
                }
                TokenKind::Eof => {
                    return Err(ParseError::at(self.src, open.span.start, "unclosed delimiter"));
                }
                _ => {}
            }
            if closers.is_empty() {
                return Ok(());
            }
        }
    }

    /// Skip type parameters or arguments starting at the current `<`.
    fn skip_angle(&mut self) -> PResult<()> {
        let mut depth = 0usize;
        loop {
            match self.peek().kind {
                TokenKind::Punct('<') => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::Punct('>') => {
                    depth = depth.saturating_sub(1);
                    self.bump();
                    if depth == 0 {
                        return Ok(());
                    }
                }
                TokenKind::Punct('(') => self.skip_balanced()?,
                TokenKind::Punct(';' | '{' | '}') | TokenKind::Eof => {
                    return Err(self.error("unclosed type arguments"));
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    /// Skip up to and including `c`, stepping over bracketed groups.
    fn skip_past(&mut self, c: char) -> PResult<()> {
        loop {
            match self.peek().kind {
                TokenKind::Punct(p) if p == c => {
                    self.bump();
                    return Ok(());
                }
                TokenKind::Punct('(' | '[' | '{') => self.skip_balanced()?,
                TokenKind::Punct(')' | ']' | '}') | TokenKind::Eof => {
                    return Err(self.error(format!("expected `{c}`")));
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    /// Skip a declaration header up to the `{` that opens its body.
    fn skip_to_body(&mut self) -> PResult<()> {
        loop {
            match self.peek().kind {
                TokenKind::Punct('{') => return Ok(()),
                TokenKind::Punct('(') => self.skip_balanced()?,
                TokenKind::Punct(';' | '}' | ')') | TokenKind::Eof => {
                    return Err(self.error("expected `{`"));
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    // -- modifiers and annotations --

    fn annotation(&mut self) -> PResult<()> {
        self.expect_punct('@')?;
        self.qualified_name()?;
        if self.at_punct('(') {
            self.skip_balanced()?;
        }
        Ok(())
    }

    fn at_annotation(&self) -> bool {
        self.at_punct('@') && !self.nth_is_word(1, "interface")
    }

    fn skip_annotations(&mut self) -> PResult<()> {
        while self.at_annotation() {
            self.annotation()?;
        }
        Ok(())
    }

    fn modifiers(&mut self) -> PResult<()> {
        loop {
            if self.at_annotation() {
                self.annotation()?;
                continue;
            }
            if !self.at_ident() {
                return Ok(());
            }

            let word = self.text(self.peek());
            if MODIFIERS.contains(&word) {
                self.bump();
            } else if word == "non"
                && self.level.allows_sealed()
                && self.nth_is_punct(1, '-')
                && self.nth_is_word(2, "sealed")
            {
                for _ in 0..3 {
                    self.bump();
                }
            } else if word == "sealed" && self.sealed_is_modifier() {
                self.bump();
            } else {
                return Ok(());
            }
        }
    }

    fn sealed_is_modifier(&self) -> bool {
        match self.level {
            LanguageLevel::Java11 => false,
            LanguageLevel::Java17 => true,
            LanguageLevel::Permissive => self.nth_is_ident(1) || self.nth_is_punct(1, '@'),
        }
    }

    fn parameter_modifiers(&mut self) -> PResult<()> {
        loop {
            if self.at_annotation() {
                self.annotation()?;
            } else if self.at_word("final") {
                self.bump();
            } else {
                return Ok(());
            }
        }
    }

    // -- declarations --

    fn at_module_declaration(&self) -> bool {
        (self.at_word("module") && self.nth_is_ident(1))
            || (self.at_word("open") && self.nth_is_word(1, "module"))
    }

    fn at_record(&self) -> bool {
        self.level.allows_records()
            && self.at_word("record")
            && self.nth_is_ident(1)
            && (self.nth_is_punct(2, '(') || self.nth_is_punct(2, '<'))
    }

    /// Parse a type declaration if one starts here. Modifiers are already consumed.
    fn type_declaration(&mut self, site: DocSite) -> PResult<Option<TypeDecl>> {
        let kind = if self.at_word("class") {
            TypeKind::Class
        } else if self.at_word("interface") {
            TypeKind::Interface
        } else if self.at_word("enum") {
            TypeKind::Enum
        } else if self.at_punct('@') && self.nth_is_word(1, "interface") {
            self.bump();
            TypeKind::Annotation
        } else if self.at_record() {
            TypeKind::Record
        } else {
            return Ok(None);
        };
        self.bump();

        let name = self.expect_name("a type")?;
        self.skip_to_body()?;
        let members = match kind {
            TypeKind::Enum => self.enum_body()?,
            _ => self.class_body()?,
        };

        Ok(Some(TypeDecl {
            kind,
            name,
            site,
            members,
        }))
    }

    fn class_body(&mut self) -> PResult<Vec<Member>> {
        self.expect_punct('{')?;
        let mut members = Vec::new();
        self.member_list(&mut members)?;
        Ok(members)
    }

    fn enum_body(&mut self) -> PResult<Vec<Member>> {
        self.expect_punct('{')?;
        let mut members = Vec::new();

        loop {
            if self.eat_punct('}') {
                return Ok(members);
            }
            if self.eat_punct(';') {
                break;
            }

            let mark = self.pos;
            self.skip_annotations()?;
            let site = self.declaration_site(mark);
            let name = self.expect_name("an enum constant")?;
            if self.at_punct('(') {
                self.skip_balanced()?;
            }
            if self.at_punct('{') {
                self.skip_balanced()?;
            }
            members.push(Member::EnumConstant(EnumConstant { name, site }));

            if !self.eat_punct(',') && !self.at_punct(';') && !self.at_punct('}') {
                return Err(self.error("expected `,`, `;` or `}`"));
            }
        }

        self.member_list(&mut members)?;
        Ok(members)
    }

    /// Members up to and including the closing `}`.
    fn member_list(&mut self, members: &mut Vec<Member>) -> PResult<()> {
        loop {
            if self.eat_punct('}') {
                return Ok(());
            }
            if self.at_eof() {
                return Err(self.error("expected `}`"));
            }
            if let Some(member) = self.member()? {
                members.push(member);
            }
        }
    }

    fn member(&mut self) -> PResult<Option<Member>> {
        if self.eat_punct(';') {
            return Ok(None);
        }
        // initializer blocks
        if self.at_punct('{') {
            self.skip_balanced()?;
            return Ok(None);
        }
        if self.at_word("static") && self.nth_is_punct(1, '{') {
            self.bump();
            self.skip_balanced()?;
            return Ok(None);
        }

        let mark = self.pos;
        self.modifiers()?;
        let site = self.declaration_site(mark);

        if let Some(decl) = self.type_declaration(site)? {
            return Ok(Some(Member::Type(decl)));
        }
        if self.at_punct('<') {
            self.skip_angle()?;
        }

        if self.at_ident() && self.nth_is_punct(1, '(') {
            let name = self.expect_name("a constructor")?;
            let params = self.parameters()?;
            self.skip_method_tail()?;
            return Ok(Some(Member::Constructor(ConstructorDecl { name, params, site })));
        }
        // compact record constructor
        if self.at_ident() && self.nth_is_punct(1, '{') {
            self.bump();
            self.skip_balanced()?;
            return Ok(None);
        }

        let ty = self.type_ref()?;
        let name = self.expect_name("a member")?;
        if self.at_punct('(') {
            let params = self.parameters()?;
            let return_type = ty.array(self.dims()?);
            self.skip_method_tail()?;
            Ok(Some(Member::Method(MethodDecl {
                name,
                params,
                return_type,
                site,
            })))
        } else {
            self.skip_past(';')?;
            Ok(Some(Member::Field(FieldDecl { name, site })))
        }
    }

    /// Everything after a method's parameter list: throws clause, annotation
    /// element default, and the body or `;`.
    fn skip_method_tail(&mut self) -> PResult<()> {
        if self.at_word("throws") {
            self.bump();
            loop {
                match self.peek().kind {
                    TokenKind::Punct('{' | ';') => break,
                    TokenKind::Punct('(') => self.skip_balanced()?,
                    TokenKind::Punct('}') | TokenKind::Eof => {
                        return Err(self.error("expected method body"));
                    }
                    _ => {
                        self.bump();
                    }
                }
            }
        }
        if self.at_word("default") {
            self.bump();
            return self.skip_past(';');
        }
        if self.eat_punct(';') {
            return Ok(());
        }
        if self.at_punct('{') {
            return self.skip_balanced();
        }
        Err(self.error("expected method body or `;`"))
    }

    fn parameters(&mut self) -> PResult<Vec<TypeRef>> {
        self.expect_punct('(')?;
        let mut params = Vec::new();
        if self.eat_punct(')') {
            return Ok(params);
        }

        loop {
            self.parameter_modifiers()?;
            let mut ty = self.type_ref()?;
            self.skip_annotations()?;
            if self.peek().kind == TokenKind::Ellipsis {
                self.bump();
                ty = ty.array(1);
            }

            // receiver parameters (`Foo this`, `Outer.this`) have no descriptor slot
            if self.at_word("this") {
                self.bump();
            } else if self.at_ident() && self.nth_is_punct(1, '.') && self.nth_is_word(2, "this") {
                for _ in 0..3 {
                    self.bump();
                }
            } else {
                self.expect_name("a parameter")?;
                let dims = self.dims()?;
                params.push(ty.array(dims));
            }

            if self.eat_punct(',') {
                continue;
            }
            self.expect_punct(')')?;
            return Ok(params);
        }
    }

    fn type_ref(&mut self) -> PResult<TypeRef> {
        self.skip_annotations()?;
        if !self.at_ident() {
            return Err(self.error("expected a type"));
        }

        let word = self.text(self.peek());
        let base = if word == "void" {
            self.bump();
            BaseType::Void
        } else if let Some(primitive) = Primitive::from_keyword(word) {
            self.bump();
            BaseType::Primitive(primitive)
        } else {
            let mut segments = Vec::new();
            loop {
                self.skip_annotations()?;
                segments.push(self.ident("a type")?.to_string());
                if self.at_punct('<') {
                    self.skip_angle()?;
                }
                let continues = self.at_punct('.')
                    && !self.nth_is_word(1, "this")
                    && (self.nth_is_ident(1) || self.nth_is_punct(1, '@'));
                if !continues {
                    break;
                }
                self.bump();
            }
            BaseType::Named(segments)
        };

        let dims = self.dims()?;
        Ok(TypeRef { base, dims })
    }

    /// Count `[]` pairs, each optionally preceded by type annotations.
    fn dims(&mut self) -> PResult<usize> {
        let mut dims = 0;
        loop {
            let save = self.pos;
            self.skip_annotations()?;
            if self.at_punct('[') && self.nth_is_punct(1, ']') {
                self.bump();
                self.bump();
                dims += 1;
            } else {
                self.pos = save;
                return Ok(dims);
            }
        }
    }
}
