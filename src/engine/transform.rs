/// The transformation engine: synthesis, insertion, cleanup, recursion
use crate::config::{Config, GuardedPlacement};
use crate::engine::anchor::{self, Anchor, StmtLoc};
use crate::engine::bindings::{
    collect_click_bindings, collect_field_bindings, delete_binding_annotations, ClickBinding,
    FieldBinding,
};
use crate::java::ast::*;
use crate::registry::ClassRegistry;
use crate::report::{BatchContext, Classification};

/// Transform one compilation unit in place.
///
/// Returns `true` iff the eligibility check passed, regardless of whether an
/// anchor was found; callers use it purely for progress accounting.
pub fn transform_unit(
    unit: &mut SourceUnit,
    registry: &ClassRegistry,
    ctx: &mut BatchContext,
    config: &Config,
) -> Result<bool, String> {
    if !check_eligibility(unit, ctx, config) {
        return Ok(false);
    }

    let mut needs_view_import = false;
    let mut interrupted = false;
    for t in &mut unit.types {
        interrupted |= transform_class(t, registry, ctx, config, &mut needs_view_import)?;
    }

    if needs_view_import {
        insert_view_import_if_absent(unit, ctx);
    }
    // Imports stay while any class in the file still carries its
    // annotations, so nothing ends up referencing a missing library.
    if !interrupted {
        cleanup_imports(unit, config);
    }
    Ok(true)
}

/// True iff some import references the target library. Side effect: a plain
/// `View` import seen during the scan is cached as a reusable template.
pub fn check_eligibility(unit: &SourceUnit, ctx: &mut BatchContext, config: &Config) -> bool {
    let token = config.library.package_token.to_lowercase();
    let mut eligible = false;
    for imp in &unit.imports {
        if imp.qualified_name == "android.view.View" {
            ctx.cache_view_import(&imp.qualified_name);
        }
        if imp.qualified_name.to_lowercase().contains(&token) {
            eligible = true;
        }
    }
    eligible
}

/// Steps 2-6 of the per-class contract, then recursion into nested classes.
/// Returns `true` if this class (or any nested one) had bindings but no
/// anchor, which suppresses import cleanup for the file.
fn transform_class(
    class: &mut TypeDecl,
    registry: &ClassRegistry,
    ctx: &mut BatchContext,
    config: &Config,
    needs_view_import: &mut bool,
) -> Result<bool, String> {
    let field_bindings = collect_field_bindings(class, config);
    let click_bindings = collect_click_bindings(class, config);
    let mut interrupted = false;

    if field_bindings.is_empty() && click_bindings.is_empty() {
        ctx.record(&class.name, Classification::ImportOnly);
    } else {
        match anchor::resolve(class, registry, config)? {
            None => {
                interrupted = true;
                ctx.record(&class.name, Classification::NoAnchor);
                ctx.push_notice(format!(
                    "no insertion point found in class '{}', library code left untouched",
                    class.name
                ));
            }
            Some(anchor) => {
                let after_bind = anchor
                    .statement
                    .as_ref()
                    .and_then(|loc| statement_text_at(class, anchor.method, loc))
                    .map(|t| t.trim_start().starts_with(config.library.bind_entry.as_str()))
                    .unwrap_or(false);
                if after_bind {
                    ctx.record(&class.name, Classification::AfterBind);
                } else {
                    let method_name = class
                        .method_at(anchor.method)
                        .map(|m| m.name.clone())
                        .unwrap_or_default();
                    ctx.record(&class.name, Classification::OtherAnchor(method_name));
                }

                insert_generated(class, &anchor, &field_bindings, &click_bindings, config)?;
                delete_binding_annotations(class, config);
                if anchor.needs_view_import {
                    *needs_view_import = true;
                }
            }
        }
    }

    if !interrupted {
        cleanup_class(class, config);
    }

    // Nested classes resolve independently; nothing of this class's anchor
    // state is visible to them.
    for idx in class.nested_indices() {
        if let Member::Type(nested) = &mut class.members[idx] {
            interrupted |= transform_class(nested, registry, ctx, config, needs_view_import)?;
        }
    }
    Ok(interrupted)
}

fn statement_text_at(class: &TypeDecl, method: usize, loc: &StmtLoc) -> Option<String> {
    let body = class.method_at(method)?.body.as_ref()?;
    match loc {
        StmtLoc::Top(i) => body.get(*i).map(|s| s.text()),
        StmtLoc::InIf { if_idx, inner } => match &body.get(*if_idx)?.kind {
            StmtKind::If(ifst) => ifst.body.get(*inner).map(|s| s.text()),
            _ => None,
        },
    }
}

/// Synthesize `__bindViews`/`__bindClicks` and wire their calls in at the
/// anchor. Methods land right after the anchor method; the view-binding call
/// goes before the anchor statement (after it for superclass calls, guarded
/// anchors per policy, and synthesized inflate statements), the click call
/// immediately after the view-binding call.
fn insert_generated(
    class: &mut TypeDecl,
    anchor: &Anchor,
    fields: &[FieldBinding],
    clicks: &[ClickBinding],
    config: &Config,
) -> Result<(), String> {
    let view = anchor.view.as_deref().filter(|v| !v.is_empty());
    let caller = view.map(|v| format!("{}.", v)).unwrap_or_default();
    let params_decl = view.map(|v| format!("View {}", v)).unwrap_or_default();
    let call_arg = view.unwrap_or("");

    let anchor_is_super = anchor
        .statement
        .as_ref()
        .and_then(|loc| statement_text_at(class, anchor.method, loc))
        .map(|t| {
            let t = t.trim_start();
            t.starts_with("super.") || t.starts_with("super(")
        })
        .unwrap_or(false);
    let after = anchor.force_after
        || anchor_is_super
        || (anchor.in_guard && config.policy.guarded_super_call == GuardedPlacement::After);

    let mut cursor: Option<StmtLoc> = None;

    if !fields.is_empty() {
        let mut lookups = String::new();
        for b in fields {
            lookups.push_str(&format!(
                "    {} = {}findViewById({});\n",
                b.field, caller, b.view_id
            ));
        }
        let method_text = format!("private void __bindViews({}) {{\n{}}}", params_decl, lookups);
        let method = crate::java::parse_method(&method_text, &class.name)?;
        class.members.insert(anchor.method + 1, Member::Method(method));

        let call = crate::java::parse_statement(&format!("__bindViews({});", call_arg))?;
        cursor = Some(insert_relative(
            class,
            anchor.method,
            anchor.statement.as_ref(),
            after,
            call,
        )?);
    }

    if !clicks.is_empty() {
        let mut registrations = String::new();
        for b in clicks {
            // the recorded invocation keeps the parameter policy; the
            // registration references the handler itself
            let invocation = b.call_expr(view);
            let handler = &invocation[..invocation.find('(').unwrap_or(invocation.len())];
            registrations.push_str(&format!(
                "    {}findViewById({}).setOnClickListener(this::{});\n",
                caller, b.view_id, handler
            ));
        }
        let method_text = format!(
            "private void __bindClicks({}) {{\n{}}}",
            params_decl, registrations
        );
        let method = crate::java::parse_method(&method_text, &class.name)?;
        class.members.insert(anchor.method + 1, Member::Method(method));

        let call = crate::java::parse_statement(&format!("__bindClicks({});", call_arg))?;
        match &cursor {
            Some(loc) => {
                insert_relative(class, anchor.method, Some(loc), true, call)?;
            }
            None => {
                insert_relative(class, anchor.method, anchor.statement.as_ref(), true, call)?;
            }
        }
    }

    Ok(())
}

fn insert_relative(
    class: &mut TypeDecl,
    method: usize,
    loc: Option<&StmtLoc>,
    after: bool,
    st: Statement,
) -> Result<StmtLoc, String> {
    let m = class
        .method_at_mut(method)
        .ok_or_else(|| "anchor member is not a method".to_string())?;
    let body = m.body.get_or_insert_with(Vec::new);
    match loc {
        None => {
            body.insert(0, st);
            Ok(StmtLoc::Top(0))
        }
        Some(StmtLoc::Top(i)) => {
            let at = (if after { i + 1 } else { *i }).min(body.len());
            body.insert(at, st);
            Ok(StmtLoc::Top(at))
        }
        Some(StmtLoc::InIf { if_idx, inner }) => {
            let Some(stmt) = body.get_mut(*if_idx) else {
                return Err("anchor conditional vanished".to_string());
            };
            match &mut stmt.kind {
                StmtKind::If(ifst) => {
                    let at = (if after { inner + 1 } else { *inner }).min(ifst.body.len());
                    ifst.body.insert(at, st);
                    Ok(StmtLoc::InIf {
                        if_idx: *if_idx,
                        inner: at,
                    })
                }
                _ => Err("anchor conditional vanished".to_string()),
            }
        }
    }
}

/// Step 6 cleanup: remaining bind statements plus the unbinder field and
/// everything that touches it.
fn cleanup_class(class: &mut TypeDecl, config: &Config) {
    delete_bind_statements(class, config);
    remove_unbinder(class, config);
}

fn delete_bind_statements(class: &mut TypeDecl, config: &Config) {
    let entry = config.library.bind_entry.clone();
    for member in &mut class.members {
        if let Member::Method(m) = member {
            if let Some(body) = &mut m.body {
                body.retain(|st| !stmt_mentions_bind(st, &entry));
                for st in body.iter_mut() {
                    if let StmtKind::If(ifst) = &mut st.kind {
                        ifst.body.retain(|s| !stmt_mentions_bind(s, &entry));
                    }
                }
            }
        }
    }
}

fn stmt_mentions_bind(st: &Statement, entry: &str) -> bool {
    matches!(&st.kind, StmtKind::Expr(t) | StmtKind::Local(t) if t.contains(entry))
}

fn remove_unbinder(class: &mut TypeDecl, config: &Config) {
    let unbinder_ty = config.library.unbinder_type.clone();
    let Some(field_name) = class
        .fields()
        .find(|(_, f)| f.ty.contains(unbinder_ty.as_str()))
        .map(|(_, f)| f.name.clone())
    else {
        return;
    };

    for member in &mut class.members {
        if let Member::Method(m) = member {
            if let Some(body) = &mut m.body {
                body.retain(|st| !unbinder_statement(st, &field_name));
            }
        }
    }
    class
        .members
        .retain(|m| !matches!(m, Member::Field(f) if f.name == field_name && f.ty.contains(unbinder_ty.as_str())));
}

fn unbinder_statement(st: &Statement, field: &str) -> bool {
    match &st.kind {
        // unbinder.unbind();
        StmtKind::Expr(t) => t
            .trim_start()
            .strip_prefix(field)
            .map(|rest| rest.starts_with('.'))
            .unwrap_or(false),
        // if (unbinder != null) { ... }
        StmtKind::If(ifst) => leading_identifier(&ifst.condition) == Some(field),
        _ => false,
    }
}

/// Step 7: drop library and generated-resource imports; if that leaves the
/// file without a canonical resource-class import, synthesize one for the
/// package the generated import pointed at.
fn cleanup_imports(unit: &mut SourceUnit, config: &Config) {
    let token = config.library.package_token.to_lowercase();
    let generated_suffix = format!(".{}", config.library.generated_id_prefix);
    let mut inferred_package: Option<String> = None;

    unit.imports.retain(|imp| {
        let q = &imp.qualified_name;
        if q.to_lowercase().contains(&token) {
            return false;
        }
        if q.contains(&generated_suffix) {
            inferred_package = Some(q.replace(&generated_suffix, ""));
            return false;
        }
        true
    });

    let resource_suffix = format!(".{}", config.library.resource_prefix);
    let has_resource_import = unit
        .imports
        .iter()
        .any(|i| i.qualified_name.ends_with(&resource_suffix));
    if !has_resource_import {
        if let Some(pkg) = inferred_package {
            unit.imports.push(Import {
                qualified_name: format!("{}.{}", pkg, config.library.resource_prefix),
                is_static: false,
            });
        }
    }
}

fn insert_view_import_if_absent(unit: &mut SourceUnit, ctx: &BatchContext) {
    let has_view_import = unit
        .imports
        .iter()
        .any(|i| i.qualified_name == "android.view.View");
    if !has_view_import {
        let qualified_name = ctx
            .view_import_template()
            .unwrap_or("android.view.View")
            .to_string();
        unit.imports.push(Import {
            qualified_name,
            is_static: false,
        });
    }
}
