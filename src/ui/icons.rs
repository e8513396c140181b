//! Shared UI icons and emojis.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");

// Dashboard indicators
pub static REPO: Emoji<'_, '_> = Emoji("📁 ", "-");
pub static ISSUE: Emoji<'_, '_> = Emoji("🐛 ", "-");
pub static ROBOT: Emoji<'_, '_> = Emoji("🤖 ", "[AI]");
pub static LINK: Emoji<'_, '_> = Emoji("🔗 ", "->");
pub static USER: Emoji<'_, '_> = Emoji("👤 ", "");
