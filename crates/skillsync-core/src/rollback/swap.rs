use std::path::Path;

/// Puts a fully staged tree in place of a live one.
///
/// Implementations must either complete the replacement or report through
/// [`skillsync_fs::Error::SwapFailed`] whether the live tree was restored.
pub trait TreeSwap: Send + Sync {
    fn swap(&self, staged: &Path, live: &Path) -> skillsync_fs::Result<()>;
}

/// Rename-based swap: live aside, staged in, old tree removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenameSwap;

impl TreeSwap for RenameSwap {
    fn swap(&self, staged: &Path, live: &Path) -> skillsync_fs::Result<()> {
        skillsync_fs::io::swap_dir(staged, live)
    }
}
