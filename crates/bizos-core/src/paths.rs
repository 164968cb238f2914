use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Store keys
// ---------------------------------------------------------------------------

/// Prefix shared by every key this application writes.
pub const KEY_NAMESPACE: &str = "ai-business-os:";

pub const PHASE_PROGRESS_KEY: &str = "ai-business-os:phase-progress";
pub const PROGRESS_CONTEXT_KEY: &str = "ai-business-os:phase-progress:context";
pub const SELECTION_KEY: &str = "ai-business-os:selected-idea";

pub const BUSINESS_NAME_KEY: &str = "ai-business-os:business-name";
pub const LEGAL_SETUP_KEY: &str = "ai-business-os:phase2:legal-setup";
pub const LEGAL_STEPS_PREFIX: &str = "ai-business-os:legal-steps:done:";
pub const BRANDING_KEY: &str = "ai-business-os:phase3:branding";
pub const MARKETING_KEY: &str = "ai-business-os:phase4:marketing";
pub const GROWTH_KEY: &str = "ai-business-os:phase5:growth";

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const BIZOS_DIR: &str = ".bizos";
pub const CONFIG_FILE: &str = ".bizos/config.yaml";
pub const DEFAULT_STORE_FILE: &str = "store.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn bizos_dir(root: &Path) -> PathBuf {
    root.join(BIZOS_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve a store file name from config against the project's `.bizos/` dir.
pub fn store_path(root: &Path, store_file: &str) -> PathBuf {
    bizos_dir(root).join(store_file)
}

pub fn is_app_key(key: &str) -> bool {
    key.starts_with(KEY_NAMESPACE)
}

/// Done-step key for one location: `"Austin, TX"` becomes
/// `ai-business-os:legal-steps:done:austin-tx`. Blank locations map to `usa`.
pub fn legal_steps_key(location: &str) -> String {
    let mut slug = String::new();
    for c in location.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    let slug = if slug.is_empty() { "usa" } else { slug };
    format!("{LEGAL_STEPS_PREFIX}{slug}")
}
