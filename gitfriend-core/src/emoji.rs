//! Commit emoji reference table.
//!
//! A static catalog of gitmoji-style commit prefixes, grouped by the kind of
//! change they mark. Served read-only by the HTTP layer; there is nothing to
//! configure or persist here.

use serde::Serialize;

/// One commit emoji with its GitHub shortcode and conventional meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommitEmoji {
    pub emoji: &'static str,
    pub code: &'static str,
    pub description: &'static str,
    pub category: &'static str,
}

/// Categories present in [`COMMIT_EMOJIS`], in display order.
pub const CATEGORIES: &[&str] = &[
    "added",
    "fixed",
    "improved",
    "removed",
    "security",
    "config",
    "docs",
    "ui",
    "other",
];

const fn entry(
    emoji: &'static str,
    code: &'static str,
    description: &'static str,
    category: &'static str,
) -> CommitEmoji {
    CommitEmoji {
        emoji,
        code,
        description,
        category,
    }
}

pub const COMMIT_EMOJIS: &[CommitEmoji] = &[
    // Added
    entry("✨", ":sparkles:", "Introduce new features", "added"),
    entry("🎉", ":tada:", "Begin a project", "added"),
    entry("✅", ":white_check_mark:", "Add tests", "added"),
    entry("🔊", ":loud_sound:", "Add logs", "added"),
    entry("➕", ":heavy_plus_sign:", "Add dependencies", "added"),
    entry("🔌", ":electric_plug:", "Add plugin", "added"),
    entry("🚀", ":rocket:", "Deploy stuff", "added"),
    entry("🆕", ":new:", "Add something new", "added"),
    entry("👷", ":construction_worker:", "Add CI build system", "added"),
    // Fixed
    entry("🐛", ":bug:", "Fix a bug", "fixed"),
    entry("🚑", ":ambulance:", "Critical hotfix", "fixed"),
    entry("🔒", ":lock:", "Fix security issues", "fixed"),
    entry("🩹", ":adhesive_bandage:", "Simple fix for a non-critical issue", "fixed"),
    entry("💥", ":boom:", "Fix crash", "fixed"),
    entry("🧪", ":test_tube:", "Fix failing tests", "fixed"),
    entry("🔨", ":hammer:", "Fix build", "fixed"),
    entry("🚨", ":rotating_light:", "Fix compiler/linter warnings", "fixed"),
    // Improved
    entry("♻️", ":recycle:", "Refactor code", "improved"),
    entry("⚡️", ":zap:", "Improve performance", "improved"),
    entry("🚸", ":children_crossing:", "Improve user experience", "improved"),
    entry("💄", ":lipstick:", "Update UI and style files", "improved"),
    entry("🎨", ":art:", "Improve structure/format of the code", "improved"),
    entry("⬆️", ":arrow_up:", "Upgrade dependencies", "improved"),
    entry("⬇️", ":arrow_down:", "Downgrade dependencies", "improved"),
    entry("🔧", ":wrench:", "Add or update configuration files", "improved"),
    entry("🔖", ":bookmark:", "Release / Version tags", "improved"),
    // Removed
    entry("🔥", ":fire:", "Remove code or files", "removed"),
    entry("➖", ":heavy_minus_sign:", "Remove dependencies", "removed"),
    entry("🗑️", ":wastebasket:", "Deprecate code", "removed"),
    // Security
    entry("🔒", ":lock:", "Fix security issues", "security"),
    entry("🔐", ":closed_lock_with_key:", "Add or update secrets", "security"),
    entry("🛂", ":passport_control:", "Work on code related to authorization", "security"),
    // Config
    entry("🔧", ":wrench:", "Add or update configuration files", "config"),
    entry("🔨", ":hammer:", "Add or update development scripts", "config"),
    entry("📦", ":package:", "Add or update compiled files or packages", "config"),
    entry("👷", ":construction_worker:", "Add or update CI build system", "config"),
    // Docs
    entry("📝", ":memo:", "Add or update documentation", "docs"),
    entry("📚", ":books:", "Add or update documentation", "docs"),
    entry("💡", ":bulb:", "Add or update comments in source code", "docs"),
    entry("📄", ":page_facing_up:", "Add or update license", "docs"),
    // UI
    entry("💄", ":lipstick:", "Add or update the UI and style files", "ui"),
    entry("🎨", ":art:", "Improve structure/format of the code", "ui"),
    entry("🚸", ":children_crossing:", "Improve user experience / usability", "ui"),
    entry("♿️", ":wheelchair:", "Improve accessibility", "ui"),
    entry("💫", ":dizzy:", "Add or update animations and transitions", "ui"),
    // Other
    entry("🚧", ":construction:", "Work in progress", "other"),
    entry("💩", ":poop:", "Write bad code that needs to be improved", "other"),
    entry("🍻", ":beers:", "Write code drunkenly", "other"),
    entry("🔍", ":mag:", "Improve SEO", "other"),
    entry("💬", ":speech_balloon:", "Add or update text and literals", "other"),
    entry("🥚", ":egg:", "Add or update an easter egg", "other"),
    entry("🌱", ":seedling:", "Add or update seed files", "other"),
    entry("🏷️", ":label:", "Add or update types", "other"),
    entry("🏗️", ":building_construction:", "Make architectural changes", "other"),
    entry("📱", ":iphone:", "Work on responsive design", "other"),
    entry("🤡", ":clown_face:", "Mock things", "other"),
    entry("🥅", ":goal_net:", "Catch errors", "other"),
    entry("📸", ":camera_flash:", "Add or update snapshots", "other"),
    entry("⚗️", ":alembic:", "Perform experiments", "other"),
    entry("🏁", ":checkered_flag:", "Fix something on Windows", "other"),
    entry("🍎", ":apple:", "Fix something on macOS", "other"),
    entry("🐧", ":penguin:", "Fix something on Linux", "other"),
    entry("🤖", ":robot:", "Fix something on Android", "other"),
    entry("🍏", ":green_apple:", "Fix something on iOS", "other"),
];

/// Filter the table by category and free-text query.
///
/// A `category` of `None` or `"all"` matches every category. The query is
/// matched case-insensitively against the description and the `:shortcode:`,
/// and verbatim against the glyph so a pasted emoji finds its own entry.
pub fn search(category: Option<&str>, query: Option<&str>) -> Vec<&'static CommitEmoji> {
    let query = query.map(str::to_lowercase).unwrap_or_default();

    COMMIT_EMOJIS
        .iter()
        .filter(|e| match category {
            None | Some("all") => true,
            Some(c) => e.category == c,
        })
        .filter(|e| {
            query.is_empty()
                || e.description.to_lowercase().contains(&query)
                || e.code.to_lowercase().contains(&query)
                || e.emoji.contains(&query)
        })
        .collect()
}
