use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub anchors: AnchorConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub traversal: TraversalConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryConfig {
    /// Import eligibility marker, matched case-insensitively.
    #[serde(default = "default_package_token")]
    pub package_token: String,
    #[serde(default = "default_bind_entry")]
    pub bind_entry: String,
    #[serde(default = "default_unbinder_type")]
    pub unbinder_type: String,
    #[serde(default = "default_bind_view_marker")]
    pub bind_view_marker: String,
    #[serde(default = "default_on_click_marker")]
    pub on_click_marker: String,
    /// Identifier namespace the annotation processor generated (`R2`),
    /// rewritten to `resource_prefix` in generated lookups.
    #[serde(default = "default_generated_id_prefix")]
    pub generated_id_prefix: String,
    #[serde(default = "default_resource_prefix")]
    pub resource_prefix: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            package_token: default_package_token(),
            bind_entry: default_bind_entry(),
            unbinder_type: default_unbinder_type(),
            bind_view_marker: default_bind_view_marker(),
            on_click_marker: default_on_click_marker(),
            generated_id_prefix: default_generated_id_prefix(),
            resource_prefix: default_resource_prefix(),
        }
    }
}

fn default_package_token() -> String {
    "butterknife".to_string()
}

fn default_bind_entry() -> String {
    "ButterKnife.bind(".to_string()
}

fn default_unbinder_type() -> String {
    "Unbinder".to_string()
}

fn default_bind_view_marker() -> String {
    "BindView".to_string()
}

fn default_on_click_marker() -> String {
    "OnClick".to_string()
}

fn default_generated_id_prefix() -> String {
    "R2".to_string()
}

fn default_resource_prefix() -> String {
    "R".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnchorConfig {
    /// Project-specific lifecycle hooks tried when no bind call exists.
    #[serde(default = "default_custom_hooks")]
    pub custom_hooks: Vec<String>,
    #[serde(default = "default_layout_provider")]
    pub layout_provider: String,
    #[serde(default = "default_fragment_init_hook")]
    pub fragment_init_hook: String,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            custom_hooks: default_custom_hooks(),
            layout_provider: default_layout_provider(),
            fragment_init_hook: default_fragment_init_hook(),
        }
    }
}

fn default_custom_hooks() -> Vec<String> {
    vec!["stepAllViews".to_string(), "onInitilizeView".to_string()]
}

fn default_layout_provider() -> String {
    "provideLayout".to_string()
}

fn default_fragment_init_hook() -> String {
    "myInit".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PolicyConfig {
    /// Where generated calls land when the anchor was retargeted to a
    /// conditional guarding the bind call.
    #[serde(default)]
    pub guarded_super_call: GuardedPlacement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GuardedPlacement {
    Before,
    #[default]
    After,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraversalConfig {
    #[serde(default = "default_ignore_dirs")]
    pub ignore_dirs: Vec<String>,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            ignore_dirs: default_ignore_dirs(),
        }
    }
}

fn default_ignore_dirs() -> Vec<String> {
    ["build", "gradle", "idea", "libs", "res", "assets", "jniLibs"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .context(format!("Failed to read {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .context(format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

/// `unknife.toml` in the working directory if present, defaults otherwise.
pub fn load_or_default() -> Result<Config> {
    let path = Path::new("unknife.toml");
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}
