/// Per-run batch context: classification log, notices and shared caches
///
/// One instance lives for exactly one batch run and is dropped with it, so
/// no state ever leaks across runs.

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Generated calls inserted right where the library bind call was.
    AfterBind,
    /// Inserted at some other anchor; carries the anchor method name.
    OtherAnchor(String),
    /// Library import present but no binding annotations.
    ImportOnly,
    /// Bindings present but no anchor found; class left untouched.
    NoAnchor,
}

#[derive(Debug, Default)]
pub struct BatchContext {
    after_bind: Vec<String>,
    other_anchor: Vec<(String, String)>,
    import_only: Vec<String>,
    no_anchor: Vec<String>,
    view_import: Option<String>,
    notices: Vec<String>,
}

impl BatchContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, class: &str, classification: Classification) {
        match classification {
            Classification::AfterBind => self.after_bind.push(class.to_string()),
            Classification::OtherAnchor(method) => {
                self.other_anchor.push((class.to_string(), method))
            }
            Classification::ImportOnly => self.import_only.push(class.to_string()),
            Classification::NoAnchor => self.no_anchor.push(class.to_string()),
        }
    }

    /// First `View` import seen during eligibility scans, reused as a
    /// template for files that need one synthesized.
    pub fn cache_view_import(&mut self, qualified_name: &str) {
        if self.view_import.is_none() {
            self.view_import = Some(qualified_name.to_string());
        }
    }

    pub fn view_import_template(&self) -> Option<&str> {
        self.view_import.as_deref()
    }

    pub fn push_notice(&mut self, notice: String) {
        self.notices.push(notice);
    }

    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// The four summary groupings. Draining: the context is reset so a
    /// caller cannot accidentally report the same run twice.
    pub fn summary(&mut self) -> Vec<String> {
        let lines = vec![
            format!(
                "inserted after bind call: [{}]",
                self.after_bind.join(", ")
            ),
            format!(
                "inserted at other anchor: [{}]",
                self.other_anchor
                    .iter()
                    .map(|(c, m)| format!("{}: {}", c, m))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            format!("import-only cleanup: [{}]", self.import_only.join(", ")),
            format!(
                "library usage without anchor, left untouched: [{}]",
                self.no_anchor.join(", ")
            ),
        ];
        self.after_bind.clear();
        self.other_anchor.clear();
        self.import_only.clear();
        self.no_anchor.clear();
        lines
    }
}
