/// Settings for the domain handlers.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Messages pushed after login, and the page size when a
    /// `load_messages` asks for `limit: 0`. Default: 100.
    pub history_limit: usize,
}

impl RouterConfig {
    /// Largest page a single `load_messages` may return.
    pub const MAX_PAGE: usize = 100;

    /// Resolves a requested page size: `0` means the default, anything
    /// else is clamped to `1..=MAX_PAGE`.
    pub fn page_size(&self, requested: u32) -> usize {
        let requested = if requested == 0 {
            self.history_limit
        } else {
            requested as usize
        };
        requested.clamp(1, Self::MAX_PAGE)
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { history_limit: 100 }
    }
}
