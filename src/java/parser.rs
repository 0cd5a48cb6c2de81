/// Structural parser for Java compilation units
///
/// Cursor-based, recognizing just enough structure for the refactoring
/// engine: package/imports, type declarations with annotations, fields,
/// methods with their top-level statements (`if` blocks kept structured),
/// and everything else captured as opaque text. String literals and
/// comments are handled lexically so braces inside them never confuse the
/// depth tracking.
use crate::java::ast::*;
use regex::Regex;

const TYPE_KEYWORDS: [&str; 3] = ["class", "interface", "enum"];
const MODIFIERS: [&str; 7] = [
    "public",
    "protected",
    "private",
    "static",
    "final",
    "transient",
    "volatile",
];
const COMPOUND_KEYWORDS: [&str; 6] = ["for", "while", "do", "switch", "try", "synchronized"];

enum MemberKind {
    Type,
    Method,
    Field,
    Init,
}

pub struct Parser {
    source: String,
    pos: usize,
    decl_re: Regex,
}

/// Parse a whole compilation unit.
pub fn parse_source(source: &str) -> Result<SourceUnit, String> {
    Parser::new(source).parse()
}

/// Parse a single method from template text. Fails on trailing input so a
/// malformed template is reported instead of silently truncated.
pub fn parse_method(source: &str, class_name: &str) -> Result<Method, String> {
    let mut p = Parser::new(source);
    let leading = p.skip_trivia();
    let annotations = p.parse_annotations()?;
    let method = p.parse_method_decl(class_name, leading, annotations)?;
    let _ = p.skip_trivia();
    if !p.at_end() {
        return Err(format!(
            "Trailing input after method template: '{}'",
            p.snippet()
        ));
    }
    Ok(method)
}

/// Parse a single statement from template text.
pub fn parse_statement(source: &str) -> Result<Statement, String> {
    let mut p = Parser::new(source);
    let leading = p.skip_trivia();
    if p.at_end() {
        return Err("Empty statement template".to_string());
    }
    let kind = p.parse_statement_kind()?;
    let _ = p.skip_trivia();
    if !p.at_end() {
        return Err(format!(
            "Trailing input after statement template: '{}'",
            p.snippet()
        ));
    }
    Ok(Statement { leading, kind })
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Parser {
            source: source.to_string(),
            pos: 0,
            // Local-variable declaration shape: optional `final`, a type
            // token (possibly qualified/generic/array), then a name followed
            // by `=`, `;` or `,`.
            decl_re: Regex::new(
                r"^(?:final\s+)?[A-Za-z_$][\w$.]*(?:\s*<[^=;]*>)?(?:\s*\[\s*\])*\s+[A-Za-z_$][\w$]*\s*[=;,]",
            )
            .unwrap(),
        }
    }

    pub fn parse(&mut self) -> Result<SourceUnit, String> {
        let mut unit = SourceUnit {
            leading: Vec::new(),
            package: None,
            imports: Vec::new(),
            types: Vec::new(),
        };
        let mut leading = self.skip_trivia();

        if self.starts_with_word("package") {
            unit.leading = std::mem::take(&mut leading);
            let text = self.read_statement_text()?;
            let pkg = text
                .trim()
                .strip_prefix("package")
                .unwrap_or(&text)
                .trim()
                .trim_end_matches(';')
                .trim()
                .to_string();
            unit.package = Some(pkg);
            leading = self.skip_trivia();
        }

        while self.starts_with_word("import") {
            unit.leading.append(&mut leading);
            unit.imports.push(self.parse_import()?);
            leading = self.skip_trivia();
        }

        while !self.at_end() {
            if self.peek() == Some(';') {
                self.advance();
                leading = self.skip_trivia();
                continue;
            }
            let annotations = self.parse_annotations()?;
            let t = self.parse_type_decl(std::mem::take(&mut leading), annotations)?;
            unit.types.push(t);
            leading = self.skip_trivia();
        }

        Ok(unit)
    }

    fn parse_import(&mut self) -> Result<Import, String> {
        self.expect("import")?;
        self.skip_ws();
        let is_static = if self.starts_with_word("static") {
            self.expect("static")?;
            self.skip_ws();
            true
        } else {
            false
        };
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == ';' {
                break;
            }
            self.advance();
        }
        let qualified_name = self.source[start..self.pos].trim().to_string();
        self.expect(";")?;
        Ok(Import {
            qualified_name,
            is_static,
        })
    }

    fn parse_annotations(&mut self) -> Result<Vec<Annotation>, String> {
        let mut annotations = Vec::new();
        loop {
            let _ = self.skip_trivia();
            if !self.starts_with("@") || self.starts_with("@interface") {
                break;
            }
            self.advance();
            let name = self.read_dotted_identifier()?;
            self.skip_ws();
            let args = if self.peek() == Some('(') {
                self.advance();
                Some(self.read_balanced('(', ')')?)
            } else {
                None
            };
            annotations.push(Annotation { name, args });
        }
        Ok(annotations)
    }

    fn parse_type_decl(
        &mut self,
        leading: Vec<String>,
        annotations: Vec<Annotation>,
    ) -> Result<TypeDecl, String> {
        let start = self.pos;

        // Modifiers (and any stray annotations) up to the kind keyword stay
        // part of the raw header.
        loop {
            self.skip_ws();
            if self.at_end() {
                return Err(format!(
                    "Expected type declaration at position {}",
                    self.pos
                ));
            }
            if self.peek() == Some('@') {
                self.advance();
                let _ = self.read_dotted_identifier()?;
                self.skip_ws();
                if self.peek() == Some('(') {
                    self.advance();
                    self.read_balanced('(', ')')?;
                }
                continue;
            }
            let word = self
                .read_identifier()
                .map_err(|_| format!("Expected type declaration, found '{}'", self.snippet()))?;
            if TYPE_KEYWORDS.contains(&word.as_str()) {
                break;
            }
        }

        self.skip_ws();
        let name = self.read_identifier()?;
        self.skip_ws();
        if self.peek() == Some('<') {
            self.advance();
            self.read_balanced('<', '>')?;
        }

        let mut extends = None;
        loop {
            self.skip_ws();
            match self.peek() {
                Some('{') => break,
                None => {
                    return Err(format!("Unexpected end of input in declaration of '{}'", name))
                }
                Some('<') => {
                    self.advance();
                    self.read_balanced('<', '>')?;
                }
                Some(c) if c.is_alphanumeric() || c == '_' || c == '$' => {
                    let word = self.read_identifier()?;
                    if word == "extends" && extends.is_none() {
                        self.skip_ws();
                        let sup = self.read_dotted_identifier()?;
                        let simple = sup.rsplit('.').next().unwrap_or(&sup).to_string();
                        extends = Some(simple);
                    }
                }
                Some(_) => self.advance(),
            }
        }

        let header = self.source[start..self.pos].trim().to_string();
        self.expect("{")?;

        let mut members = Vec::new();
        loop {
            let lead = self.skip_trivia();
            match self.peek() {
                Some('}') => {
                    self.advance();
                    break;
                }
                Some(';') => {
                    self.advance();
                    continue;
                }
                None => return Err(format!("Unclosed body of '{}'", name)),
                _ => {}
            }
            members.push(self.parse_member(&name, lead)?);
        }

        Ok(TypeDecl {
            leading,
            annotations,
            header,
            name,
            extends,
            members,
        })
    }

    fn parse_member(&mut self, class_name: &str, leading: Vec<String>) -> Result<Member, String> {
        if self.starts_with("@interface") {
            let text = self.read_raw_through_block()?;
            return Ok(Member::Other(OtherMember { leading, text }));
        }
        let annotations = self.parse_annotations()?;

        let save = self.pos;
        let kind = self.classify_member()?;
        self.pos = save;

        match kind {
            MemberKind::Type => Ok(Member::Type(self.parse_type_decl(leading, annotations)?)),
            MemberKind::Method => Ok(Member::Method(
                self.parse_method_decl(class_name, leading, annotations)?,
            )),
            MemberKind::Field => Ok(Member::Field(self.parse_field(leading, annotations)?)),
            MemberKind::Init => {
                let text = self.read_raw_through_block()?;
                Ok(Member::Other(OtherMember { leading, text }))
            }
        }
    }

    /// Look ahead to decide what kind of member starts here. The first
    /// structural character at top level settles it: `(` means a method,
    /// `=` or `;` a field, `{` an initializer block; a `class`/`interface`/
    /// `enum` keyword wins over all of them.
    fn classify_member(&mut self) -> Result<MemberKind, String> {
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Err("Unexpected end of input in class body".to_string()),
                Some('(') => return Ok(MemberKind::Method),
                Some('=') | Some(';') => return Ok(MemberKind::Field),
                Some('{') => return Ok(MemberKind::Init),
                Some('<') => {
                    self.advance();
                    self.read_balanced('<', '>')?;
                }
                Some('[') => {
                    self.advance();
                    self.read_balanced('[', ']')?;
                }
                Some('@') => {
                    self.advance();
                    let _ = self.read_dotted_identifier()?;
                    self.skip_ws();
                    if self.peek() == Some('(') {
                        self.advance();
                        self.read_balanced('(', ')')?;
                    }
                }
                Some(c) if c.is_alphanumeric() || c == '_' || c == '$' => {
                    let word = self.read_identifier()?;
                    if TYPE_KEYWORDS.contains(&word.as_str()) {
                        return Ok(MemberKind::Type);
                    }
                }
                Some(_) => self.advance(),
            }
        }
    }

    fn parse_field(
        &mut self,
        leading: Vec<String>,
        annotations: Vec<Annotation>,
    ) -> Result<Field, String> {
        let text = self.read_statement_text()?;
        let decl_end = top_level_find(&text, '=').unwrap_or_else(|| text.rfind(';').unwrap_or(text.len()));
        let decl = text[..decl_end].trim();

        let tokens: Vec<String> = split_top_level(decl, ' ')
            .into_iter()
            .filter(|t| !t.is_empty() && !MODIFIERS.contains(&t.as_str()))
            .collect();
        let (ty, name) = match tokens.len() {
            0 => (String::new(), String::new()),
            1 => (String::new(), tokens[0].clone()),
            _ => {
                let name = tokens[tokens.len() - 1]
                    .split(',')
                    .next()
                    .unwrap_or("")
                    .trim()
                    .to_string();
                (tokens[..tokens.len() - 1].join(" "), name)
            }
        };

        Ok(Field {
            leading,
            annotations,
            ty,
            name,
            text,
        })
    }

    fn parse_method_decl(
        &mut self,
        class_name: &str,
        leading: Vec<String>,
        annotations: Vec<Annotation>,
    ) -> Result<Method, String> {
        let start = self.pos;
        loop {
            self.skip_ws();
            match self.peek() {
                Some('(') => break,
                Some('<') => {
                    self.advance();
                    self.read_balanced('<', '>')?;
                }
                Some('[') => {
                    self.advance();
                    self.read_balanced('[', ']')?;
                }
                Some(c) if c.is_alphanumeric() || c == '_' || c == '$' => {
                    self.read_identifier()?;
                }
                Some(_) => self.advance(),
                None => return Err("Unexpected end of input in method declaration".to_string()),
            }
        }
        let pre_paren = self.source[start..self.pos].trim_end().to_string();
        self.advance();
        let params_text = self.read_balanced('(', ')')?;
        let mut signature = self.source[start..self.pos].trim().to_string();

        self.skip_ws();
        if self.starts_with_word("throws") {
            let throws_start = self.pos;
            while let Some(c) = self.peek() {
                if c == '{' || c == ';' {
                    break;
                }
                self.advance();
            }
            signature.push(' ');
            signature.push_str(self.source[throws_start..self.pos].trim());
        }

        let name = pre_paren
            .split_whitespace()
            .last()
            .unwrap_or("")
            .to_string();
        let non_modifier_tokens = pre_paren
            .split_whitespace()
            .filter(|t| !MODIFIERS.contains(t))
            .count();
        let is_constructor = name == class_name && non_modifier_tokens == 1;

        let params = parse_params(&params_text);

        let _ = self.skip_trivia();
        let body = match self.peek() {
            Some(';') => {
                self.advance();
                None
            }
            Some('{') => {
                self.advance();
                Some(self.parse_block_statements()?)
            }
            _ => {
                return Err(format!(
                    "Expected method body or ';' after '{}', found '{}'",
                    name,
                    self.snippet()
                ))
            }
        };

        Ok(Method {
            leading,
            annotations,
            signature,
            name,
            params,
            is_constructor,
            body,
        })
    }

    /// Parse statements until the closing `}` of the current block.
    fn parse_block_statements(&mut self) -> Result<Vec<Statement>, String> {
        let mut stmts = Vec::new();
        loop {
            let leading = self.skip_trivia();
            match self.peek() {
                None => return Err("Unclosed method body".to_string()),
                Some('}') => {
                    self.advance();
                    return Ok(stmts);
                }
                Some(';') => {
                    self.advance();
                    continue;
                }
                _ => {}
            }
            let kind = self.parse_statement_kind()?;
            stmts.push(Statement { leading, kind });
        }
    }

    fn parse_statement_kind(&mut self) -> Result<StmtKind, String> {
        if self.starts_with_word("if") {
            return self.parse_if();
        }
        for kw in COMPOUND_KEYWORDS {
            if self.starts_with_word(kw) {
                return Ok(StmtKind::Other(self.read_compound_raw(kw)?));
            }
        }
        if self.peek() == Some('{') {
            let start = self.pos;
            self.advance();
            self.read_balanced('{', '}')?;
            return Ok(StmtKind::Other(self.source[start..self.pos].to_string()));
        }
        if self.starts_with_word("return") {
            return Ok(StmtKind::Return(self.read_statement_text()?));
        }
        let text = self.read_statement_text()?;
        if self.decl_re.is_match(text.trim_start()) {
            Ok(StmtKind::Local(text))
        } else {
            Ok(StmtKind::Expr(text))
        }
    }

    fn parse_if(&mut self) -> Result<StmtKind, String> {
        self.expect("if")?;
        self.skip_ws();
        self.expect("(")?;
        let condition = self.read_balanced('(', ')')?.trim().to_string();
        let _ = self.skip_trivia();
        let body = if self.peek() == Some('{') {
            self.advance();
            self.parse_block_statements()?
        } else {
            let kind = self.parse_statement_kind()?;
            vec![Statement::new(kind)]
        };

        let save = self.pos;
        let _ = self.skip_trivia();
        let else_raw = if self.starts_with_word("else") {
            Some(self.read_else_raw()?)
        } else {
            self.pos = save;
            None
        };

        Ok(StmtKind::If(IfStmt {
            condition,
            body,
            else_raw,
        }))
    }

    fn read_else_raw(&mut self) -> Result<String, String> {
        let start = self.pos;
        self.expect("else")?;
        self.skip_ws();
        if self.starts_with_word("if") {
            self.expect("if")?;
            self.skip_ws();
            self.expect("(")?;
            self.read_balanced('(', ')')?;
            self.skip_ws();
            if self.peek() == Some('{') {
                self.advance();
                self.read_balanced('{', '}')?;
            } else {
                self.read_statement_text()?;
            }
            let save = self.pos;
            let _ = self.skip_trivia();
            if self.starts_with_word("else") {
                self.read_else_raw()?;
            } else {
                self.pos = save;
            }
        } else if self.peek() == Some('{') {
            self.advance();
            self.read_balanced('{', '}')?;
        } else {
            self.read_statement_text()?;
        }
        Ok(self.source[start..self.pos].trim_end().to_string())
    }

    /// Consume a loop/switch/try/synchronized statement, returning it as raw
    /// text. `do` bodies pull their trailing `while (...);` along, `try`
    /// blocks their catch/finally chain.
    fn read_compound_raw(&mut self, kw: &str) -> Result<String, String> {
        let start = self.pos;
        self.expect(kw)?;
        self.skip_ws();
        if self.peek() == Some('(') {
            self.advance();
            self.read_balanced('(', ')')?;
            self.skip_ws();
        }
        if self.peek() == Some('{') {
            self.advance();
            self.read_balanced('{', '}')?;
        } else {
            self.read_statement_text()?;
        }
        match kw {
            "do" => {
                self.skip_ws();
                if self.starts_with_word("while") {
                    self.expect("while")?;
                    self.skip_ws();
                    if self.peek() == Some('(') {
                        self.advance();
                        self.read_balanced('(', ')')?;
                    }
                    self.skip_ws();
                    if self.peek() == Some(';') {
                        self.advance();
                    }
                }
            }
            "try" => loop {
                let save = self.pos;
                self.skip_ws();
                if self.starts_with_word("catch") {
                    self.expect("catch")?;
                    self.skip_ws();
                    if self.peek() == Some('(') {
                        self.advance();
                        self.read_balanced('(', ')')?;
                    }
                    self.skip_ws();
                    self.expect("{")?;
                    self.read_balanced('{', '}')?;
                } else if self.starts_with_word("finally") {
                    self.expect("finally")?;
                    self.skip_ws();
                    self.expect("{")?;
                    self.read_balanced('{', '}')?;
                } else {
                    self.pos = save;
                    break;
                }
            },
            _ => {}
        }
        Ok(self.source[start..self.pos].trim_end().to_string())
    }

    /// Everything up to and including the next balanced `{...}` block, raw.
    fn read_raw_through_block(&mut self) -> Result<String, String> {
        let start = self.pos;
        while self.peek() != Some('{') {
            if self.at_end() {
                return Err("Expected '{' in member declaration".to_string());
            }
            self.advance();
        }
        self.advance();
        self.read_balanced('{', '}')?;
        Ok(self.source[start..self.pos].to_string())
    }

    // Cursor helpers

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.source[self.pos..].starts_with(s)
    }

    fn starts_with_word(&self, word: &str) -> bool {
        if !self.starts_with(word) {
            return false;
        }
        match self.source[self.pos + word.len()..].chars().next() {
            Some(c) => !(c.is_alphanumeric() || c == '_' || c == '$'),
            None => true,
        }
    }

    fn snippet(&self) -> String {
        self.source[self.pos..].chars().take(24).collect()
    }

    fn expect(&mut self, s: &str) -> Result<(), String> {
        if self.starts_with(s) {
            self.pos += s.len();
            Ok(())
        } else {
            Err(format!(
                "Expected '{}' at position {}, found '{}'",
                s,
                self.pos,
                self.snippet()
            ))
        }
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Skip whitespace and comments, returning the comment lines so callers
    /// can reattach them to the following node.
    fn skip_trivia(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.advance(),
                Some('/') if self.starts_with("//") => {
                    let start = self.pos;
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    lines.push(self.source[start..self.pos].trim_end().to_string());
                }
                Some('/') if self.starts_with("/*") => {
                    let start = self.pos;
                    self.consume_block_comment();
                    for line in self.source[start..self.pos].lines() {
                        lines.push(line.trim().to_string());
                    }
                }
                _ => break,
            }
        }
        lines
    }

    fn read_identifier(&mut self) -> Result<String, String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                self.advance();
            } else {
                break;
            }
        }
        if self.pos == start {
            Err(format!("Expected identifier, found '{}'", self.snippet()))
        } else {
            Ok(self.source[start..self.pos].to_string())
        }
    }

    fn read_dotted_identifier(&mut self) -> Result<String, String> {
        let mut name = self.read_identifier()?;
        while self.peek() == Some('.') {
            self.advance();
            name.push('.');
            name.push_str(&self.read_identifier()?);
        }
        Ok(name)
    }

    /// Content between the already-consumed `open` and its matching `close`.
    fn read_balanced(&mut self, open: char, close: char) -> Result<String, String> {
        let start = self.pos;
        let mut depth = 1;
        while let Some(c) = self.peek() {
            if c == '"' || c == '\'' {
                self.consume_string_literal();
                continue;
            }
            if self.starts_with("//") {
                while let Some(n) = self.peek() {
                    if n == '\n' {
                        break;
                    }
                    self.advance();
                }
                continue;
            }
            if self.starts_with("/*") {
                self.consume_block_comment();
                continue;
            }
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    let content = self.source[start..self.pos].to_string();
                    self.advance();
                    return Ok(content);
                }
            }
            self.advance();
        }
        Err(format!("Unbalanced '{}' starting at position {}", open, start))
    }

    /// One statement through its terminating `;` at top level.
    fn read_statement_text(&mut self) -> Result<String, String> {
        let start = self.pos;
        let mut paren = 0i32;
        let mut brace = 0i32;
        let mut bracket = 0i32;
        while let Some(c) = self.peek() {
            match c {
                '"' | '\'' => {
                    self.consume_string_literal();
                    continue;
                }
                '/' if self.starts_with("//") => {
                    while let Some(n) = self.peek() {
                        if n == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    continue;
                }
                '/' if self.starts_with("/*") => {
                    self.consume_block_comment();
                    continue;
                }
                '(' => paren += 1,
                ')' => paren -= 1,
                '[' => bracket += 1,
                ']' => bracket -= 1,
                '{' => brace += 1,
                '}' => {
                    if brace == 0 {
                        return Err(format!("Unterminated statement at position {}", start));
                    }
                    brace -= 1;
                }
                ';' if paren == 0 && brace == 0 && bracket == 0 => {
                    self.advance();
                    return Ok(self.source[start..self.pos].to_string());
                }
                _ => {}
            }
            self.advance();
        }
        Err(format!("Unterminated statement at position {}", start))
    }

    fn consume_string_literal(&mut self) {
        let quote = match self.peek() {
            Some(q) => q,
            None => return,
        };
        self.advance();
        while let Some(c) = self.peek() {
            self.advance();
            if c == '\\' {
                self.advance();
                continue;
            }
            if c == quote {
                break;
            }
        }
    }

    fn consume_block_comment(&mut self) {
        self.advance();
        self.advance();
        while !self.at_end() && !self.starts_with("*/") {
            self.advance();
        }
        if self.starts_with("*/") {
            self.advance();
            self.advance();
        }
    }
}

fn parse_params(params_text: &str) -> Vec<Param> {
    split_top_level(params_text, ',')
        .into_iter()
        .filter_map(|p| {
            let tokens: Vec<String> = split_top_level(&p, ' ')
                .into_iter()
                .filter(|t| !t.is_empty() && *t != "final" && !t.starts_with('@'))
                .collect();
            if tokens.len() < 2 {
                return None;
            }
            let name = tokens[tokens.len() - 1].clone();
            let ty = tokens[..tokens.len() - 1].join(" ");
            Some(Param { ty, name })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIVITY: &str = r#"
package com.example.app;

import android.os.Bundle;
import android.view.View;
import android.widget.TextView;
import butterknife.BindView;
import butterknife.ButterKnife;
import com.example.app.R2;

// main screen
public class MainActivity extends AppCompatActivity {

    @BindView(R2.id.title)
    TextView mTitle;

    private Unbinder unbinder;

    @Override
    protected void onCreate(Bundle savedInstanceState) {
        super.onCreate(savedInstanceState);
        setContentView(R.layout.activity_main);
        ButterKnife.bind(this);
    }

    @Override
    protected void onDestroy() {
        super.onDestroy();
        if (unbinder != null) {
            unbinder.unbind();
        }
    }

    class Holder {
        Holder(View itemView) {
            ButterKnife.bind(this, itemView);
        }
    }
}
"#;

    #[test]
    fn test_parse_unit_structure() {
        let unit = parse_source(ACTIVITY).unwrap();
        assert_eq!(unit.package.as_deref(), Some("com.example.app"));
        assert_eq!(unit.imports.len(), 6);
        assert_eq!(unit.types.len(), 1);

        let class = &unit.types[0];
        assert_eq!(class.name, "MainActivity");
        assert_eq!(class.extends.as_deref(), Some("AppCompatActivity"));
        assert_eq!(class.leading, vec!["// main screen"]);
        assert_eq!(class.fields().count(), 2);
        assert_eq!(class.methods().count(), 2);
        assert_eq!(class.nested_indices().len(), 1);
    }

    #[test]
    fn test_parse_field_annotation() {
        let unit = parse_source(ACTIVITY).unwrap();
        let class = &unit.types[0];
        let (_, field) = class.fields().next().unwrap();
        assert_eq!(field.name, "mTitle");
        assert_eq!(field.ty, "TextView");
        assert_eq!(field.annotations.len(), 1);
        assert_eq!(field.annotations[0].name, "BindView");
        assert_eq!(field.annotations[0].value_text().unwrap(), "R2.id.title");
    }

    #[test]
    fn test_parse_method_statements() {
        let unit = parse_source(ACTIVITY).unwrap();
        let class = &unit.types[0];
        let (_, on_create) = class.methods().next().unwrap();
        assert_eq!(on_create.name, "onCreate");
        assert_eq!(on_create.params.len(), 1);
        assert_eq!(on_create.params[0].ty, "Bundle");
        assert_eq!(on_create.params[0].name, "savedInstanceState");

        let body = on_create.body.as_ref().unwrap();
        assert_eq!(body.len(), 3);
        assert!(matches!(&body[0].kind, StmtKind::Expr(t) if t.starts_with("super.onCreate(")));
        assert!(matches!(&body[2].kind, StmtKind::Expr(t) if t == "ButterKnife.bind(this);"));
    }

    #[test]
    fn test_parse_if_statement_structured() {
        let unit = parse_source(ACTIVITY).unwrap();
        let class = &unit.types[0];
        let (_, on_destroy) = class.methods().nth(1).unwrap();
        let body = on_destroy.body.as_ref().unwrap();
        match &body[1].kind {
            StmtKind::If(ifst) => {
                assert_eq!(ifst.condition, "unbinder != null");
                assert_eq!(ifst.body.len(), 1);
                assert!(ifst.else_raw.is_none());
            }
            other => panic!("expected if statement, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_nested_class_constructor() {
        let unit = parse_source(ACTIVITY).unwrap();
        let class = &unit.types[0];
        let nested_idx = class.nested_indices()[0];
        let nested = match &class.members[nested_idx] {
            Member::Type(t) => t,
            other => panic!("expected nested type, got {:?}", other),
        };
        let (_, ctor) = nested.methods().next().unwrap();
        assert!(ctor.is_constructor);
        assert_eq!(ctor.params[0].ty, "View");
        assert_eq!(ctor.params[0].name, "itemView");
    }

    #[test]
    fn test_parse_method_template() {
        let m = parse_method(
            "private void __bindViews(View view) {\n    mTitle = view.findViewById(R.id.title);\n}",
            "MainActivity",
        )
        .unwrap();
        assert_eq!(m.name, "__bindViews");
        assert!(!m.is_constructor);
        assert_eq!(m.params.len(), 1);
        assert_eq!(m.body.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_method_template_invalid() {
        assert!(parse_method("private void broken(", "X").is_err());
    }

    #[test]
    fn test_parse_statement_template() {
        let st = parse_statement("View refactorView = parent.getRootView();").unwrap();
        assert!(matches!(st.kind, StmtKind::Local(_)));

        let st = parse_statement("__bindViews(view);").unwrap();
        assert!(matches!(st.kind, StmtKind::Expr(_)));

        assert!(parse_statement("View broken = ;;;;(").is_err());
    }

    #[test]
    fn test_statement_classification() {
        let src = "class C { void m() { int x = 1; x = 2; doThing(x); return; } }";
        let unit = parse_source(src).unwrap();
        let body = unit.types[0]
            .method_at(unit.types[0].first_method_index().unwrap())
            .unwrap()
            .body
            .clone()
            .unwrap();
        assert!(matches!(&body[0].kind, StmtKind::Local(_)));
        assert!(matches!(&body[1].kind, StmtKind::Expr(_)));
        assert!(matches!(&body[2].kind, StmtKind::Expr(_)));
        assert!(matches!(&body[3].kind, StmtKind::Return(_)));
    }

    #[test]
    fn test_braces_in_strings_do_not_confuse_depth() {
        let src = "class C { void m() { log(\"}{;\"); } }";
        let unit = parse_source(src).unwrap();
        let body = unit.types[0]
            .method_at(unit.types[0].first_method_index().unwrap())
            .unwrap()
            .body
            .clone()
            .unwrap();
        assert_eq!(body.len(), 1);
        assert!(matches!(&body[0].kind, StmtKind::Expr(t) if t.contains("log")));
    }

    #[test]
    fn test_loops_kept_opaque() {
        let src = "class C { void m() { for (int i = 0; i < 3; i++) { doThing(i); } done(); } }";
        let unit = parse_source(src).unwrap();
        let body = unit.types[0]
            .method_at(unit.types[0].first_method_index().unwrap())
            .unwrap()
            .body
            .clone()
            .unwrap();
        assert_eq!(body.len(), 2);
        assert!(matches!(&body[0].kind, StmtKind::Other(t) if t.starts_with("for")));
        assert!(matches!(&body[1].kind, StmtKind::Expr(_)));
    }

    #[test]
    fn test_abstract_method_has_no_body() {
        let src = "public abstract class C { protected abstract int provideLayout(); }";
        let unit = parse_source(src).unwrap();
        let (_, m) = unit.types[0].methods().next().unwrap();
        assert_eq!(m.name, "provideLayout");
        assert!(m.body.is_none());
    }

    #[test]
    fn test_static_import() {
        let src = "import static org.junit.Assert.assertEquals;\nclass C { }";
        let unit = parse_source(src).unwrap();
        assert!(unit.imports[0].is_static);
        assert_eq!(unit.imports[0].qualified_name, "org.junit.Assert.assertEquals");
    }
}
