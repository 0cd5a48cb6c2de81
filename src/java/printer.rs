/// Renders a mutated tree back to Java source
///
/// Output is normalized to 4-space indentation. Opaque statement text keeps
/// its internal structure; only the base indentation is rewritten.
use crate::java::ast::*;

const INDENT: &str = "    ";

pub fn render(unit: &SourceUnit) -> String {
    let mut out = String::new();

    if !unit.leading.is_empty() {
        push_comment_lines(&mut out, &unit.leading, 0);
        out.push('\n');
    }
    if let Some(pkg) = &unit.package {
        out.push_str(&format!("package {};\n\n", pkg));
    }
    if !unit.imports.is_empty() {
        for imp in &unit.imports {
            out.push_str(&imp.text());
            out.push('\n');
        }
        out.push('\n');
    }
    for (i, t) in unit.types.iter().enumerate() {
        render_type(&mut out, t, 0);
        if i + 1 < unit.types.len() {
            out.push('\n');
        }
    }
    out
}

fn render_type(out: &mut String, t: &TypeDecl, level: usize) {
    let pad = INDENT.repeat(level);
    push_comment_lines(out, &t.leading, level);
    for ann in &t.annotations {
        out.push_str(&pad);
        out.push_str(&ann.text());
        out.push('\n');
    }
    out.push_str(&pad);
    out.push_str(&t.header);
    out.push_str(" {\n");

    for (i, member) in t.members.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match member {
            Member::Field(f) => render_field(out, f, level + 1),
            Member::Method(m) => render_method(out, m, level + 1),
            Member::Type(nested) => render_type(out, nested, level + 1),
            Member::Other(o) => {
                push_comment_lines(out, &o.leading, level + 1);
                out.push_str(&reindent(&o.text, level + 1));
                out.push('\n');
            }
        }
    }

    out.push_str(&pad);
    out.push_str("}\n");
}

fn render_field(out: &mut String, f: &Field, level: usize) {
    let pad = INDENT.repeat(level);
    push_comment_lines(out, &f.leading, level);
    for ann in &f.annotations {
        out.push_str(&pad);
        out.push_str(&ann.text());
        out.push('\n');
    }
    out.push_str(&reindent(&f.text, level));
    out.push('\n');
}

fn render_method(out: &mut String, m: &Method, level: usize) {
    let pad = INDENT.repeat(level);
    push_comment_lines(out, &m.leading, level);
    for ann in &m.annotations {
        out.push_str(&pad);
        out.push_str(&ann.text());
        out.push('\n');
    }
    out.push_str(&reindent(&m.signature, level));
    match &m.body {
        None => out.push_str(";\n"),
        Some(body) => {
            out.push_str(" {\n");
            for st in body {
                render_statement(out, st, level + 1);
            }
            out.push_str(&pad);
            out.push_str("}\n");
        }
    }
}

fn render_statement(out: &mut String, st: &Statement, level: usize) {
    let pad = INDENT.repeat(level);
    push_comment_lines(out, &st.leading, level);
    match &st.kind {
        StmtKind::Expr(t) | StmtKind::Local(t) | StmtKind::Return(t) | StmtKind::Other(t) => {
            out.push_str(&reindent(t, level));
            out.push('\n');
        }
        StmtKind::If(ifst) => {
            out.push_str(&pad);
            out.push_str(&format!("if ({}) {{\n", ifst.condition));
            for inner in &ifst.body {
                render_statement(out, inner, level + 1);
            }
            out.push_str(&pad);
            out.push('}');
            if let Some(e) = &ifst.else_raw {
                out.push(' ');
                out.push_str(reindent(e, level).trim_start());
            }
            out.push('\n');
        }
    }
}

fn push_comment_lines(out: &mut String, lines: &[String], level: usize) {
    let pad = INDENT.repeat(level);
    for line in lines {
        out.push_str(&pad);
        // block-comment continuations keep their conventional alignment
        if line.starts_with('*') {
            out.push(' ');
        }
        out.push_str(line);
        out.push('\n');
    }
}

/// Re-base a possibly multi-line text to the given indentation level,
/// preserving relative nesting of continuation lines.
fn reindent(text: &str, level: usize) -> String {
    let pad = INDENT.repeat(level);
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= 1 {
        return format!("{}{}", pad, text.trim());
    }
    let min_indent = lines[1..]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    let mut out = format!("{}{}", pad, lines[0].trim());
    for line in &lines[1..] {
        out.push('\n');
        if line.trim().is_empty() {
            continue;
        }
        let stripped = if line.len() >= min_indent {
            &line[min_indent..]
        } else {
            line.trim_start()
        };
        out.push_str(&pad);
        out.push_str(stripped);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::java::parser::parse_source;

    #[test]
    fn test_render_round_trips_structure() {
        let src = r#"package com.example.app;

import android.view.View;

public class Simple {

    private int count;

    public void tick() {
        count = count + 1;
    }
}
"#;
        let unit = parse_source(src).unwrap();
        let rendered = render(&unit);
        assert!(rendered.starts_with("package com.example.app;\n"));
        assert!(rendered.contains("import android.view.View;"));
        assert!(rendered.contains("public class Simple {"));
        assert!(rendered.contains("    private int count;"));
        assert!(rendered.contains("    public void tick() {"));
        assert!(rendered.contains("        count = count + 1;"));

        // a second parse/print cycle is stable
        let again = render(&parse_source(&rendered).unwrap());
        assert_eq!(rendered, again);
    }

    #[test]
    fn test_render_if_with_else() {
        let src = "class C { void m() { if (a) { x(); } else { y(); } } }";
        let unit = parse_source(src).unwrap();
        let rendered = render(&unit);
        assert!(rendered.contains("if (a) {"));
        assert!(rendered.contains("} else {"));
    }

    #[test]
    fn test_render_preserves_comments() {
        let src = r#"
class C {
    // counts things
    int n;

    /**
     * Bumps the counter.
     */
    void bump() {
        n++;
    }
}
"#;
        let unit = parse_source(src).unwrap();
        let rendered = render(&unit);
        assert!(rendered.contains("// counts things"));
        assert!(rendered.contains("* Bumps the counter."));
    }

    #[test]
    fn test_render_nested_type_indented() {
        let src = "class Outer { class Inner { void m() { go(); } } }";
        let unit = parse_source(src).unwrap();
        let rendered = render(&unit);
        assert!(rendered.contains("    class Inner {"));
        assert!(rendered.contains("        void m() {"));
        assert!(rendered.contains("            go();"));
    }
}
