//! Per-item state flags

bitflags::bitflags! {
    /// State flags carried by every item record
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ItemFlags: u8 {
        /// Item is visible in the viewport
        const VISIBLE = 1;
        /// Item is a temporary preview, never persisted
        const TEMPORARY = 2;
    }
}

impl Default for ItemFlags {
    fn default() -> Self {
        ItemFlags::VISIBLE
    }
}

impl ItemFlags {
    /// Check the visibility bit
    pub fn is_visible(&self) -> bool {
        self.contains(ItemFlags::VISIBLE)
    }

    /// Check the temporary bit
    pub fn is_temporary(&self) -> bool {
        self.contains(ItemFlags::TEMPORARY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_visible() {
        let flags = ItemFlags::default();
        assert!(flags.is_visible());
        assert!(!flags.is_temporary());
    }

    #[test]
    fn test_toggle_visibility() {
        let mut flags = ItemFlags::default();
        flags.remove(ItemFlags::VISIBLE);
        assert!(!flags.is_visible());
        flags.insert(ItemFlags::VISIBLE);
        assert!(flags.is_visible());
    }
}
