use serde::{Deserialize, Serialize};

/// Colours handed out to user avatars, indexed by a hash of the username.
const AVATAR_COLORS: [&str; 9] = [
    "#FFCC00", "#FF6666", "#CC66CC", "#9966FF", "#3366FF", "#66CCCC", "#33FF99", "#CCCC33",
    "#99CC33",
];

/// Profile of an authenticated user as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Server-side id. Only some endpoints send it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_username: Option<String>,
}

impl Identity {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Stable avatar colour derived from the username.
    pub fn avatar_color(&self) -> &'static str {
        let mut hash: i32 = 0;
        for unit in self.username.encode_utf16() {
            hash = (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit));
        }
        AVATAR_COLORS[hash.unsigned_abs() as usize % AVATAR_COLORS.len()]
    }
}
