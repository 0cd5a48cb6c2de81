/// Anchor resolution: where generated calls get inserted
///
/// Eight heuristics tried in strict priority order, first success wins.
/// Resolution returns an immutable [`Anchor`] value; the only tree mutation
/// it ever performs is synthesizing the hook stubs and inflate statements
/// some stages require, and that happens strictly on their success paths, so
/// a class whose resolution fails is left untouched.
use crate::config::Config;
use crate::java::ast::*;
use crate::registry::ClassRegistry;

/// Location of a statement within a method body: directly in the body, or
/// one level down inside a top-level `if` block.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtLoc {
    Top(usize),
    InIf { if_idx: usize, inner: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    /// Member index of the enclosing method.
    pub method: usize,
    /// Insertion statement; `None` means "start of the (empty) body".
    pub statement: Option<StmtLoc>,
    /// Anchor was retargeted to the conditional guarding the bind call.
    pub in_guard: bool,
    /// Generated calls must go after the anchor statement regardless of its
    /// shape (synthesized inflate statements define the view they scope by).
    pub force_after: bool,
    /// Expression scoping generated lookups; `None` means `this`.
    pub view: Option<String>,
    /// The binder view was captured into a local, so the file needs a
    /// `View` import if it lacks one.
    pub needs_view_import: bool,
}

impl Anchor {
    fn at(method: usize, statement: Option<StmtLoc>, view: Option<&str>) -> Self {
        Anchor {
            method,
            statement,
            in_guard: false,
            force_after: false,
            view: view.map(String::from),
            needs_view_import: false,
        }
    }
}

pub fn resolve(
    class: &mut TypeDecl,
    registry: &ClassRegistry,
    config: &Config,
) -> Result<Option<Anchor>, String> {
    if let Some(a) = find_library_bind(class, config)? {
        return Ok(Some(a));
    }
    if let Some(a) = find_custom_hook(class, registry, config)? {
        return Ok(Some(a));
    }
    if let Some(a) = find_super_statement(class, "super.onCreateView(", Some("view")) {
        return Ok(Some(a));
    }
    if let Some(a) = find_on_view_created(class) {
        return Ok(Some(a));
    }
    if let Some(a) = find_super_statement(class, "super.onCreate(", None) {
        return Ok(Some(a));
    }
    if let Some(a) = synth_inflate_in_on_create_view(class, config)? {
        return Ok(Some(a));
    }
    // A constructor with a statement wins outright; an empty one is only a
    // fallback for when no onCreateView can be synthesized either.
    let ctor = find_view_constructor(class);
    if let Some(a) = &ctor {
        if a.statement.is_some() {
            return Ok(ctor);
        }
    }
    if let Some(a) = synth_on_create_view(class, config)? {
        return Ok(Some(a));
    }
    Ok(ctor)
}

#[derive(Debug)]
enum BindForm {
    /// Bare `ButterKnife.bind(...)` call statement.
    Call(Vec<String>),
    /// `unbinder = ButterKnife.bind(...)` assignment or declaration.
    Assign(Vec<String>),
}

/// Stage 1: the library's own bind invocation.
fn find_library_bind(class: &mut TypeDecl, config: &Config) -> Result<Option<Anchor>, String> {
    let entry = config.library.bind_entry.as_str();

    let mut hit: Option<(usize, StmtLoc, BindForm)> = None;
    'direct: for (mi, m) in class.methods() {
        let Some(body) = &m.body else { continue };
        for (si, st) in body.iter().enumerate() {
            if let Some(form) = bind_form(st, entry) {
                hit = Some((mi, StmtLoc::Top(si), form));
                break 'direct;
            }
        }
    }
    if hit.is_none() {
        'guarded: for (mi, m) in class.methods() {
            let Some(body) = &m.body else { continue };
            for (si, st) in body.iter().enumerate() {
                if let StmtKind::If(ifst) = &st.kind {
                    for (ii, inner) in ifst.body.iter().enumerate() {
                        if let Some(form) = bind_form(inner, entry) {
                            hit = Some((mi, StmtLoc::InIf { if_idx: si, inner: ii }, form));
                            break 'guarded;
                        }
                    }
                }
            }
        }
    }
    let Some((method, loc, form)) = hit else {
        return Ok(None);
    };

    let mut view: Option<String> = None;
    match &form {
        BindForm::Call(args) => {
            if let Some(last) = args.last() {
                if last != "this" {
                    view = Some(last.clone());
                }
            }
        }
        BindForm::Assign(args) => {
            if args.len() == 2 {
                view = args.last().cloned();
            }
        }
    }

    let mut statement = Some(loc);
    let mut in_guard = false;

    // Bare call inside a conditional whose guard references the bind's view
    // argument: retarget to the conditional so generated code runs exactly
    // when the original bind would have.
    let guard_if_idx = match (&form, &statement) {
        (BindForm::Call(_), Some(StmtLoc::InIf { if_idx, .. })) => Some(*if_idx),
        _ => None,
    };
    if let (Some(if_idx), Some(v)) = (guard_if_idx, view.clone()) {
        let guard_matches = class
            .method_at(method)
            .and_then(|m| m.body.as_ref())
            .and_then(|b| b.get(if_idx))
            .map(|st| matches!(&st.kind, StmtKind::If(ifst) if ifst.condition.contains(&v)))
            .unwrap_or(false);
        if guard_matches {
            statement = Some(StmtLoc::Top(if_idx));
            in_guard = true;
        }
    }

    // Compound view expressions get captured into a local once, so generated
    // code never re-evaluates a possibly side-effecting expression.
    let mut needs_view_import = false;
    if let Some(v) = view.clone() {
        if v.contains('.') {
            let capture = crate::java::parse_statement(&format!("View refactorView = {};", v))?;
            if let Some(loc) = statement.clone() {
                statement = Some(insert_shifting_before(class, method, &loc, capture)?);
            }
            view = Some("refactorView".to_string());
            needs_view_import = true;
        }
    }

    Ok(Some(Anchor {
        method,
        statement,
        in_guard,
        force_after: false,
        view,
        needs_view_import,
    }))
}

/// Stage 2: project-specific lifecycle hook, synthesizing a call-through
/// override when only a superclass declares it.
fn find_custom_hook(
    class: &mut TypeDecl,
    registry: &ClassRegistry,
    config: &Config,
) -> Result<Option<Anchor>, String> {
    let hooks = &config.anchors.custom_hooks;
    let existing = class
        .methods()
        .find(|(_, m)| hooks.iter().any(|h| h == &m.name))
        .map(|(i, m)| {
            (
                i,
                m.params.clone(),
                m.body.as_ref().map(|b| b.len()).unwrap_or(0),
            )
        });

    let (method_idx, params, body_len) = match existing {
        Some(found) => found,
        None => {
            let Some(hook) = registry.inherited_hook(class, hooks) else {
                return Ok(None);
            };
            let params_text = hook
                .params
                .iter()
                .map(|p| format!("{} {}", p.ty, p.name))
                .collect::<Vec<_>>()
                .join(", ");
            let args = hook
                .params
                .iter()
                .map(|p| p.name.clone())
                .collect::<Vec<_>>()
                .join(", ");
            let text = format!(
                "@Override\nprotected void {}({}) {{\n    super.{}({});\n}}",
                hook.name, params_text, hook.name, args
            );
            let params = hook.params.clone();
            let stub = crate::java::parse_method(&text, &class.name)?;
            let idx = class.first_method_index().unwrap_or(class.members.len());
            class.members.insert(idx, Member::Method(stub));
            (idx, params, 1)
        }
    };

    let view = params
        .iter()
        .find(|p| p.ty.contains("View"))
        .map(|p| p.name.clone())
        .unwrap_or_else(|| "root".to_string());
    Ok(Some(Anchor::at(
        method_idx,
        if body_len > 0 { Some(StmtLoc::Top(0)) } else { None },
        Some(view.as_str()),
    )))
}

/// Stages 3 and 5: a statement leading with the given superclass call.
fn find_super_statement(class: &TypeDecl, needle: &str, view: Option<&str>) -> Option<Anchor> {
    for (mi, m) in class.methods() {
        let Some(body) = &m.body else { continue };
        for (si, st) in body.iter().enumerate() {
            let text = st.text();
            if text.trim_start().starts_with(needle) {
                return Some(Anchor::at(mi, Some(StmtLoc::Top(si)), view));
            }
        }
    }
    None
}

/// Stage 4: first statement of an `onViewCreated` override.
fn find_on_view_created(class: &TypeDecl) -> Option<Anchor> {
    let (mi, m) = class
        .methods()
        .find(|(_, m)| m.signature.contains("onViewCreated("))?;
    let body = m.body.as_ref()?;
    if body.is_empty() {
        return None;
    }
    Some(Anchor::at(mi, Some(StmtLoc::Top(0)), Some("view")))
}

/// Stage 6: synthesize an inflate statement when a 3-parameter
/// `onCreateView` and a layout provider both exist.
fn synth_inflate_in_on_create_view(
    class: &mut TypeDecl,
    config: &Config,
) -> Result<Option<Anchor>, String> {
    let provider = &config.anchors.layout_provider;
    let found = class
        .methods()
        .find(|(_, m)| m.signature.contains("View onCreateView("))
        .map(|(i, m)| (i, m.params.clone()));
    let Some((mi, params)) = found else {
        return Ok(None);
    };
    let provider_needle = format!("int {}(", provider);
    if !class.methods().any(|(_, m)| m.signature.contains(&provider_needle)) {
        return Ok(None);
    }
    if params.len() != 3 {
        return Ok(None);
    }

    let text = format!(
        "View _view = {}.inflate({}(), {}, false);",
        params[0].name, provider, params[1].name
    );
    let inflate = crate::java::parse_statement(&text)?;
    let m = class
        .method_at_mut(mi)
        .ok_or_else(|| "onCreateView member is not a method".to_string())?;
    m.body.get_or_insert_with(Vec::new).insert(0, inflate);

    Ok(Some(Anchor {
        method: mi,
        statement: Some(StmtLoc::Top(0)),
        in_guard: false,
        force_after: true,
        view: Some("_view".to_string()),
        needs_view_import: false,
    }))
}

/// Stage 7: a constructor taking a `View`-typed parameter.
fn find_view_constructor(class: &TypeDecl) -> Option<Anchor> {
    for (mi, m) in class.methods() {
        if !m.is_constructor {
            continue;
        }
        let Some(param) = m.params.iter().find(|p| p.ty.contains("View")) else {
            continue;
        };
        let has_stmt = m.body.as_ref().map(|b| !b.is_empty()).unwrap_or(false);
        return Some(Anchor::at(
            mi,
            if has_stmt { Some(StmtLoc::Top(0)) } else { None },
            Some(param.name.as_str()),
        ));
    }
    None
}

/// Stage 8: synthesize a whole `onCreateView` override in fragments that
/// follow the project's init-method convention.
fn synth_on_create_view(class: &mut TypeDecl, config: &Config) -> Result<Option<Anchor>, String> {
    let needle = format!("{}(", config.anchors.fragment_init_hook);
    let target = class
        .methods()
        .find(|(_, m)| m.full_text().contains(&needle))
        .map(|(i, _)| i);
    let Some(idx) = target else {
        return Ok(None);
    };

    let text = format!(
        "@Override\npublic View onCreateView(LayoutInflater inflater, ViewGroup container, Bundle savedInstanceState) {{\n    View view = inflater.inflate({}(), container, false);\n    return super.onCreateView(inflater, container, savedInstanceState);\n}}",
        config.anchors.layout_provider
    );
    let method = crate::java::parse_method(&text, &class.name)?;
    class.members.insert(idx, Member::Method(method));

    Ok(Some(Anchor {
        method: idx,
        statement: Some(StmtLoc::Top(0)),
        in_guard: false,
        force_after: true,
        view: Some("view".to_string()),
        needs_view_import: false,
    }))
}

fn bind_form(st: &Statement, entry: &str) -> Option<BindForm> {
    let text = match &st.kind {
        StmtKind::Expr(t) | StmtKind::Local(t) => t,
        _ => return None,
    };
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix(entry) {
        return Some(BindForm::Call(call_args(rest)));
    }
    if let Some(eq) = top_level_find(trimmed, '=') {
        let rhs = trimmed[eq + 1..].trim_start();
        if let Some(rest) = rhs.strip_prefix(entry) {
            return Some(BindForm::Assign(call_args(rest)));
        }
    }
    None
}

/// Arguments of a call whose opening paren was already consumed.
fn call_args(after_open: &str) -> Vec<String> {
    let mut depth = 1i32;
    let mut end = after_open.len();
    let mut chars = after_open.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    end = i;
                    break;
                }
            }
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
            _ => {}
        }
    }
    split_top_level(&after_open[..end], ',')
}

/// Insert a statement immediately before `loc`, returning the anchor's new,
/// shifted location.
fn insert_shifting_before(
    class: &mut TypeDecl,
    method: usize,
    loc: &StmtLoc,
    st: Statement,
) -> Result<StmtLoc, String> {
    let m = class
        .method_at_mut(method)
        .ok_or_else(|| "anchor member is not a method".to_string())?;
    let body = m.body.get_or_insert_with(Vec::new);
    match loc {
        StmtLoc::Top(i) => {
            let at = (*i).min(body.len());
            body.insert(at, st);
            Ok(StmtLoc::Top(at + 1))
        }
        StmtLoc::InIf { if_idx, inner } => {
            let Some(stmt) = body.get_mut(*if_idx) else {
                return Err("anchor conditional vanished".to_string());
            };
            match &mut stmt.kind {
                StmtKind::If(ifst) => {
                    let at = (*inner).min(ifst.body.len());
                    ifst.body.insert(at, st);
                    Ok(StmtLoc::InIf {
                        if_idx: *if_idx,
                        inner: at + 1,
                    })
                }
                _ => Err("anchor conditional vanished".to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::java::parser::parse_source;

    fn config() -> Config {
        Config::default()
    }

    fn resolve_first(src: &str) -> (SourceUnit, Option<Anchor>) {
        let mut unit = parse_source(src).unwrap();
        let registry = ClassRegistry::new();
        let anchor = resolve(&mut unit.types[0], &registry, &config()).unwrap();
        (unit, anchor)
    }

    #[test]
    fn test_stage1_direct_bind_two_args() {
        let (_, anchor) = resolve_first(
            "class A { void init(View v) { ButterKnife.bind(this, v); } }",
        );
        let anchor = anchor.unwrap();
        assert_eq!(anchor.statement, Some(StmtLoc::Top(0)));
        assert_eq!(anchor.view.as_deref(), Some("v"));
        assert!(!anchor.in_guard);
    }

    #[test]
    fn test_stage1_bind_this_means_unscoped() {
        let (_, anchor) =
            resolve_first("class A { void onCreate(Bundle b) { ButterKnife.bind(this); } }");
        assert_eq!(anchor.unwrap().view, None);
    }

    #[test]
    fn test_stage1_assignment_form() {
        let (_, anchor) = resolve_first(
            "class A { void onCreate(Bundle b) { unbinder = ButterKnife.bind(this, view); } }",
        );
        let anchor = anchor.unwrap();
        assert_eq!(anchor.view.as_deref(), Some("view"));
        assert_eq!(anchor.statement, Some(StmtLoc::Top(0)));
    }

    #[test]
    fn test_stage1_guard_retargets_to_conditional() {
        let src = r#"
class A {
    void onCreateView(LayoutInflater inflater) {
        if (mRootView != null) {
            ButterKnife.bind(this, mRootView);
        }
    }
}
"#;
        let (_, anchor) = resolve_first(src);
        let anchor = anchor.unwrap();
        assert!(anchor.in_guard);
        assert_eq!(anchor.statement, Some(StmtLoc::Top(0)));
        assert_eq!(anchor.view.as_deref(), Some("mRootView"));
    }

    #[test]
    fn test_stage1_guard_without_view_reference_stays_inside() {
        let src = r#"
class A {
    void setup(View v) {
        if (mReady != null) {
            ButterKnife.bind(this, v);
        }
    }
}
"#;
        let (_, anchor) = resolve_first(src);
        let anchor = anchor.unwrap();
        assert!(!anchor.in_guard);
        assert_eq!(
            anchor.statement,
            Some(StmtLoc::InIf { if_idx: 0, inner: 0 })
        );
    }

    #[test]
    fn test_stage1_compound_view_captured_into_local() {
        let src = "class A { void init() { ButterKnife.bind(this, parent.getRootView()); } }";
        let (unit, anchor) = resolve_first(src);
        let anchor = anchor.unwrap();
        assert_eq!(anchor.view.as_deref(), Some("refactorView"));
        assert!(anchor.needs_view_import);
        assert_eq!(anchor.statement, Some(StmtLoc::Top(1)));

        let body = unit.types[0].method_at(anchor.method).unwrap().body.as_ref().unwrap();
        assert!(matches!(
            &body[0].kind,
            StmtKind::Local(t) if t == "View refactorView = parent.getRootView();"
        ));
    }

    #[test]
    fn test_stage2_existing_hook() {
        let src = "class A { protected void onInitilizeView(View root, Bundle state) { setup(); } }";
        let (_, anchor) = resolve_first(src);
        let anchor = anchor.unwrap();
        assert_eq!(anchor.view.as_deref(), Some("root"));
        assert_eq!(anchor.statement, Some(StmtLoc::Top(0)));
    }

    #[test]
    fn test_stage2_superclass_hook_synthesizes_stub() {
        let base = parse_source(
            "public class BaseActivity { protected void stepAllViews(View root, Bundle savedInstanceState) { } }",
        )
        .unwrap();
        let mut unit = parse_source(
            "public class LoginActivity extends BaseActivity { void other() { go(); } }",
        )
        .unwrap();
        let mut registry = ClassRegistry::new();
        registry.scan_unit(&base, &config().anchors.custom_hooks);

        let anchor = resolve(&mut unit.types[0], &registry, &config())
            .unwrap()
            .unwrap();
        let stub = unit.types[0].method_at(anchor.method).unwrap();
        assert_eq!(stub.name, "stepAllViews");
        assert_eq!(stub.annotations[0].name, "Override");
        let body = stub.body.as_ref().unwrap();
        assert!(matches!(
            &body[0].kind,
            StmtKind::Expr(t) if t == "super.stepAllViews(root, savedInstanceState);"
        ));
        assert_eq!(anchor.view.as_deref(), Some("root"));
    }

    #[test]
    fn test_stage3_super_on_create_view() {
        let src = "class F { public void onCreateView(LayoutInflater i, ViewGroup c, Bundle b) { super.onCreateView(i, c, b); init(); } }";
        let (_, anchor) = resolve_first(src);
        let anchor = anchor.unwrap();
        assert_eq!(anchor.view.as_deref(), Some("view"));
        assert_eq!(anchor.statement, Some(StmtLoc::Top(0)));
    }

    #[test]
    fn test_stage5_super_on_create() {
        let src = "class A { protected void onCreate(Bundle b) { super.onCreate(b); setContentView(R.layout.a); } }";
        let (_, anchor) = resolve_first(src);
        let anchor = anchor.unwrap();
        assert_eq!(anchor.view, None);
        assert_eq!(anchor.statement, Some(StmtLoc::Top(0)));
    }

    #[test]
    fn test_stage6_synthesized_inflate() {
        let src = r#"
class F {
    public View onCreateView(LayoutInflater inflater, ViewGroup container, Bundle state) {
        setup();
    }

    public int provideLayout() {
        return R.layout.frag;
    }
}
"#;
        let (unit, anchor) = resolve_first(src);
        let anchor = anchor.unwrap();
        assert_eq!(anchor.view.as_deref(), Some("_view"));
        assert!(anchor.force_after);
        let body = unit.types[0].method_at(anchor.method).unwrap().body.as_ref().unwrap();
        assert!(matches!(
            &body[0].kind,
            StmtKind::Local(t) if t == "View _view = inflater.inflate(provideLayout(), container, false);"
        ));
    }

    #[test]
    fn test_stage7_constructor_anchor() {
        let src = "class Holder { Holder(View itemView) { super(itemView); } }";
        let (_, anchor) = resolve_first(src);
        let anchor = anchor.unwrap();
        assert_eq!(anchor.view.as_deref(), Some("itemView"));
        assert_eq!(anchor.statement, Some(StmtLoc::Top(0)));
    }

    #[test]
    fn test_stage8_synthesized_on_create_view() {
        let src = "class F { private void myInit() { load(); } }";
        let (unit, anchor) = resolve_first(src);
        let anchor = anchor.unwrap();
        assert!(anchor.force_after);
        assert_eq!(anchor.view.as_deref(), Some("view"));

        let m = unit.types[0].method_at(anchor.method).unwrap();
        assert_eq!(m.name, "onCreateView");
        let body = m.body.as_ref().unwrap();
        assert_eq!(body.len(), 2);
        assert!(matches!(&body[1].kind, StmtKind::Return(_)));
    }

    #[test]
    fn test_empty_constructor_loses_to_stage8() {
        let src = "class F { F(View v) { } private void myInit() { load(); } }";
        let (unit, anchor) = resolve_first(src);
        let anchor = anchor.unwrap();
        let m = unit.types[0].method_at(anchor.method).unwrap();
        assert_eq!(m.name, "onCreateView");
    }

    #[test]
    fn test_no_anchor_resolves_to_none_without_mutation() {
        let src = "class P { void helper() { compute(); } }";
        let mut unit = parse_source(src).unwrap();
        let before = unit.clone();
        let anchor = resolve(&mut unit.types[0], &ClassRegistry::new(), &config()).unwrap();
        assert!(anchor.is_none());
        assert_eq!(unit, before);
    }
}
