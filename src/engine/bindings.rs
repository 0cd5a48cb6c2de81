/// Collection of annotation-driven bindings from a class
///
/// Two independent scans: fields carrying a `@BindView`-style annotation and
/// methods carrying an `@OnClick`-style one. Collection never mutates the
/// tree; the consumed annotations are deleted later, after the generated
/// replacements are in place.
use crate::config::Config;
use crate::java::ast::TypeDecl;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldBinding {
    /// Normalized identifier, e.g. `R.id.title`.
    pub view_id: String,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClickBinding {
    pub view_id: String,
    pub handler: String,
    pub has_param: bool,
}

impl ClickBinding {
    /// Handler invocation with the synthesized placeholder parameter,
    /// derived from the resolved binder view (`_v` when there is none).
    pub fn call_expr(&self, view: Option<&str>) -> String {
        if self.has_param {
            let token = view.filter(|v| !v.is_empty()).unwrap_or("v");
            format!("{}(_{})", self.handler, token)
        } else {
            format!("{}()", self.handler)
        }
    }
}

/// Rewrite the generated identifier namespace to the canonical resource
/// namespace, e.g. `R2.id.title` -> `R.id.title`.
pub fn rewrite_id(value: &str, config: &Config) -> String {
    let generated = format!("{}.", config.library.generated_id_prefix);
    let canonical = format!("{}.", config.library.resource_prefix);
    value.replace(&generated, &canonical)
}

/// Fields annotated with the bind-view marker, keyed by normalized
/// identifier. Two annotations sharing an identifier: last writer wins.
pub fn collect_field_bindings(class: &TypeDecl, config: &Config) -> Vec<FieldBinding> {
    let marker = &config.library.bind_view_marker;
    let mut bindings: Vec<FieldBinding> = Vec::new();
    for (_, field) in class.fields() {
        for ann in &field.annotations {
            if !ann.name.contains(marker.as_str()) {
                continue;
            }
            if let Some(value) = ann.value_text() {
                let view_id = rewrite_id(&value, config);
                if let Some(existing) = bindings.iter_mut().find(|b| b.view_id == view_id) {
                    existing.field = field.name.clone();
                } else {
                    bindings.push(FieldBinding {
                        view_id,
                        field: field.name.clone(),
                    });
                }
            }
        }
    }
    bindings
}

/// Click bindings from on-click annotated methods; an array-valued
/// annotation yields one binding per listed identifier.
pub fn collect_click_bindings(class: &TypeDecl, config: &Config) -> Vec<ClickBinding> {
    let marker = &config.library.on_click_marker;
    let mut bindings = Vec::new();
    for (_, method) in class.methods() {
        for ann in &method.annotations {
            if !ann.name.contains(marker.as_str()) {
                continue;
            }
            for value in ann.value_list() {
                bindings.push(ClickBinding {
                    view_id: rewrite_id(&value, config),
                    handler: method.name.clone(),
                    has_param: !method.params.is_empty(),
                });
            }
        }
    }
    bindings
}

/// Drop consumed annotations. Called once per class, strictly after the
/// generated replacements were inserted.
pub fn delete_binding_annotations(class: &mut TypeDecl, config: &Config) {
    let bind_marker = config.library.bind_view_marker.clone();
    let click_marker = config.library.on_click_marker.clone();
    for member in &mut class.members {
        match member {
            crate::java::ast::Member::Field(f) => {
                f.annotations.retain(|a| !a.name.contains(bind_marker.as_str()));
            }
            crate::java::ast::Member::Method(m) => {
                m.annotations.retain(|a| !a.name.contains(click_marker.as_str()));
            }
            _ => {}
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

    #[test]
    fn test_field_binding_rewrites_namespace() {
        let unit = parse_source(
            "class A { @BindView(R2.id.title) TextView title; }",
        )
        .unwrap();
        let bindings = collect_field_bindings(&unit.types[0], &config());
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].view_id, "R.id.title");
        assert_eq!(bindings[0].field, "title");
    }

    #[test]
    fn test_field_binding_last_writer_wins() {
        let unit = parse_source(
            "class A { @BindView(R2.id.x) TextView a; @BindView(R2.id.x) TextView b; }",
        )
        .unwrap();
        let bindings = collect_field_bindings(&unit.types[0], &config());
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].field, "b");
    }

    #[test]
    fn test_click_binding_array_value() {
        let unit = parse_source(
            "class A { @OnClick({R2.id.ok, R2.id.cancel}) void onTap(View v) { } }",
        )
        .unwrap();
        let bindings = collect_click_bindings(&unit.types[0], &config());
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].view_id, "R.id.ok");
        assert_eq!(bindings[1].view_id, "R.id.cancel");
        assert!(bindings.iter().all(|b| b.handler == "onTap"));
    }

    #[test]
    fn test_click_call_expr_param_policy() {
        let with_param = ClickBinding {
            view_id: "R.id.ok".to_string(),
            handler: "onTap".to_string(),
            has_param: true,
        };
        assert_eq!(with_param.call_expr(Some("view")), "onTap(_view)");
        assert_eq!(with_param.call_expr(None), "onTap(_v)");

        let without = ClickBinding {
            view_id: "R.id.ok".to_string(),
            handler: "onTap".to_string(),
            has_param: false,
        };
        assert_eq!(without.call_expr(Some("view")), "onTap()");
    }

    #[test]
    fn test_delete_binding_annotations_once_per_method() {
        let mut unit = parse_source(
            "class A { @OnClick({R2.id.a, R2.id.b}) @Deprecated void onTap(View v) { } }",
        )
        .unwrap();
        delete_binding_annotations(&mut unit.types[0], &config());
        let (_, m) = unit.types[0].methods().next().unwrap();
        assert_eq!(m.annotations.len(), 1);
        assert_eq!(m.annotations[0].name, "Deprecated");
    }
}
