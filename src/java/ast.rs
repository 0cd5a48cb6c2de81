/// Abstract syntax tree for Java compilation units
///
/// The tree is deliberately shallow: the refactoring engine only needs to see
/// imports, type declarations, annotated fields and methods, and the top-level
/// statements of each method body (with `if` blocks kept structured so code
/// can be placed inside or around them). Everything else is carried as opaque
/// text and round-trips through the printer untouched.

#[derive(Debug, Clone, PartialEq)]
pub struct SourceUnit {
    pub leading: Vec<String>,
    pub package: Option<String>,
    pub imports: Vec<Import>,
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub qualified_name: String,
    pub is_static: bool,
}

impl Import {
    pub fn text(&self) -> String {
        if self.is_static {
            format!("import static {};", self.qualified_name)
        } else {
            format!("import {};", self.qualified_name)
        }
    }
}

/// A class, interface or enum declaration.
///
/// `header` is the declaration text up to (not including) the opening brace,
/// e.g. `public class MainActivity extends AppCompatActivity`. Members keep
/// their source order so insertions land where a reader expects them.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub leading: Vec<String>,
    pub annotations: Vec<Annotation>,
    pub header: String,
    pub name: String,
    pub extends: Option<String>,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Field(Field),
    Method(Method),
    Type(TypeDecl),
    /// Static/instance initializer blocks and other members the engine never
    /// touches, kept verbatim.
    Other(OtherMember),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OtherMember {
    pub leading: Vec<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub leading: Vec<String>,
    pub annotations: Vec<Annotation>,
    pub ty: String,
    pub name: String,
    /// Full declaration text including modifiers, initializer and `;`.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub leading: Vec<String>,
    pub annotations: Vec<Annotation>,
    /// Declaration text from the first modifier through the parameter list
    /// (and throws clause), without the body.
    pub signature: String,
    pub name: String,
    pub params: Vec<Param>,
    pub is_constructor: bool,
    /// `None` for abstract/interface methods.
    pub body: Option<Vec<Statement>>,
}

impl Method {
    /// Signature plus rendered body, for textual containment checks.
    pub fn full_text(&self) -> String {
        let mut out = self.signature.clone();
        if let Some(body) = &self.body {
            out.push_str(" {\n");
            for st in body {
                out.push_str(&st.text());
                out.push('\n');
            }
            out.push('}');
        } else {
            out.push(';');
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub ty: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub name: String,
    pub args: Option<String>,
}

impl Annotation {
    pub fn text(&self) -> String {
        match &self.args {
            Some(args) => format!("@{}({})", self.name, args),
            None => format!("@{}", self.name),
        }
    }

    /// The annotation's single attribute value, unwrapping the `value = ...`
    /// named form. Array values are returned as-is (see [`value_list`]).
    ///
    /// [`value_list`]: Annotation::value_list
    pub fn value_text(&self) -> Option<String> {
        let args = self.args.as_deref()?.trim();
        if args.is_empty() {
            return None;
        }
        let stripped = args
            .strip_prefix("value")
            .map(|rest| rest.trim_start())
            .and_then(|rest| rest.strip_prefix('='))
            .map(|rest| rest.trim())
            .unwrap_or(args);
        Some(stripped.to_string())
    }

    /// Attribute value as a list: one element for a single value, one per
    /// entry for the `{a, b, c}` array form.
    pub fn value_list(&self) -> Vec<String> {
        let Some(value) = self.value_text() else {
            return Vec::new();
        };
        let trimmed = value.trim();
        if let Some(inner) = trimmed.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            split_top_level(inner, ',')
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        } else {
            vec![trimmed.to_string()]
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub leading: Vec<String>,
    pub kind: StmtKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Expression statement, e.g. `ButterKnife.bind(this);`
    Expr(String),
    /// Local variable declaration, e.g. `View view = inflater.inflate(...);`
    Local(String),
    Return(String),
    If(IfStmt),
    /// Loops, switches, try blocks, bare blocks - opaque.
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: String,
    pub body: Vec<Statement>,
    /// Raw `else ...` chain, starting with the `else` keyword.
    pub else_raw: Option<String>,
}

impl Statement {
    pub fn new(kind: StmtKind) -> Self {
        Statement {
            leading: Vec::new(),
            kind,
        }
    }

    /// Statement text without leading comments; reconstructed for `if`.
    pub fn text(&self) -> String {
        match &self.kind {
            StmtKind::Expr(t) | StmtKind::Local(t) | StmtKind::Return(t) | StmtKind::Other(t) => {
                t.clone()
            }
            StmtKind::If(ifst) => {
                let mut out = format!("if ({}) {{\n", ifst.condition);
                for st in &ifst.body {
                    out.push_str(&st.text());
                    out.push('\n');
                }
                out.push('}');
                if let Some(e) = &ifst.else_raw {
                    out.push(' ');
                    out.push_str(e);
                }
                out
            }
        }
    }
}

impl TypeDecl {
    pub fn methods(&self) -> impl Iterator<Item = (usize, &Method)> {
        self.members.iter().enumerate().filter_map(|(i, m)| match m {
            Member::Method(method) => Some((i, method)),
            _ => None,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = (usize, &Field)> {
        self.members.iter().enumerate().filter_map(|(i, m)| match m {
            Member::Field(field) => Some((i, field)),
            _ => None,
        })
    }

    pub fn method_at(&self, idx: usize) -> Option<&Method> {
        match self.members.get(idx) {
            Some(Member::Method(m)) => Some(m),
            _ => None,
        }
    }

    pub fn method_at_mut(&mut self, idx: usize) -> Option<&mut Method> {
        match self.members.get_mut(idx) {
            Some(Member::Method(m)) => Some(m),
            _ => None,
        }
    }

    pub fn first_method_index(&self) -> Option<usize> {
        self.methods().next().map(|(i, _)| i)
    }

    /// Member indices of nested type declarations, in source order.
    pub fn nested_indices(&self) -> Vec<usize> {
        self.members
            .iter()
            .enumerate()
            .filter_map(|(i, m)| match m {
                Member::Type(_) => Some(i),
                _ => None,
            })
            .collect()
    }
}

/// Split `s` at `sep` occurrences that sit outside any parentheses, braces,
/// brackets, angle brackets and string/char literals.
pub fn split_top_level(s: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut angle = 0i32;
    let mut current = String::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth -= 1,
            '<' => angle += 1,
            '>' if angle > 0 => angle -= 1,
            '"' | '\'' => {
                current.push(c);
                let quote = c;
                while let Some(n) = chars.next() {
                    current.push(n);
                    if n == '\\' {
                        if let Some(esc) = chars.next() {
                            current.push(esc);
                        }
                        continue;
                    }
                    if n == quote {
                        break;
                    }
                }
                continue;
            }
            _ => {}
        }
        if c == sep && depth == 0 && angle == 0 {
            parts.push(current.trim().to_string());
            current = String::new();
        } else {
            current.push(c);
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// First position of `target` outside any nesting or string/char literal.
pub fn top_level_find(s: &str, target: char) -> Option<usize> {
    let mut depth = 0i32;
    let mut chars = s.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth -= 1,
            '"' | '\'' => {
                let quote = c;
                while let Some((_, n)) = chars.next() {
                    if n == '\\' {
                        chars.next();
                        continue;
                    }
                    if n == quote {
                        break;
                    }
                }
            }
            _ => {
                if c == target && depth == 0 {
                    return Some(i);
                }
            }
        }
    }
    None
}

/// Leading identifier of a statement or expression text, if any.
pub fn leading_identifier(text: &str) -> Option<&str> {
    let trimmed = text.trim_start();
    let end = trimmed
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '$'))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    if end == 0 {
        None
    } else {
        Some(&trimmed[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_value_single() {
        let ann = Annotation {
            name: "BindView".to_string(),
            args: Some("R2.id.title".to_string()),
        };
        assert_eq!(ann.value_text().unwrap(), "R2.id.title");
        assert_eq!(ann.value_list(), vec!["R2.id.title"]);
    }

    #[test]
    fn test_annotation_value_named() {
        let ann = Annotation {
            name: "BindView".to_string(),
            args: Some("value = R2.id.title".to_string()),
        };
        assert_eq!(ann.value_text().unwrap(), "R2.id.title");
    }

    #[test]
    fn test_annotation_value_array() {
        let ann = Annotation {
            name: "OnClick".to_string(),
            args: Some("{R2.id.ok, R2.id.cancel}".to_string()),
        };
        assert_eq!(ann.value_list(), vec!["R2.id.ok", "R2.id.cancel"]);
    }

    #[test]
    fn test_split_top_level_respects_nesting() {
        let parts = split_top_level("this, inflater.inflate(a, b), c", ',');
        assert_eq!(parts, vec!["this", "inflater.inflate(a, b)", "c"]);
    }

    #[test]
    fn test_split_top_level_respects_generics() {
        let parts = split_top_level("Map<String, View> m, int x", ',');
        assert_eq!(parts, vec!["Map<String, View> m", "int x"]);
    }

    #[test]
    fn test_leading_identifier() {
        assert_eq!(leading_identifier("unbinder.unbind();"), Some("unbinder"));
        assert_eq!(leading_identifier("  mBinder != null"), Some("mBinder"));
        assert_eq!(leading_identifier("(a)"), None);
    }

    #[test]
    fn test_if_statement_text() {
        let st = Statement::new(StmtKind::If(IfStmt {
            condition: "view != null".to_string(),
            body: vec![Statement::new(StmtKind::Expr(
                "ButterKnife.bind(this, view);".to_string(),
            ))],
            else_raw: None,
        }));
        let text = st.text();
        assert!(text.starts_with("if (view != null) {"));
        assert!(text.contains("ButterKnife.bind(this, view);"));
    }
}
