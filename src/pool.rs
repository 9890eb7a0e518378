use crate::batch::{BatchDrawCall, BatchPart};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Free lists of batch parts and draw calls shared by every geometry in the process.
///
/// Objects are reset when they are released and again when they are acquired, so nothing
/// a previous owner wrote is ever observed.
#[derive(Debug, Default)]
pub struct PoolManager {
    batch_parts: Vec<BatchPart>,
    draw_calls: Vec<BatchDrawCall>,
}

impl PoolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire_batch_part(&mut self) -> BatchPart {
        let mut part = self.batch_parts.pop().unwrap_or_default();
        part.reset();
        part
    }

    pub fn release_batch_part(&mut self, mut part: BatchPart) {
        part.reset();
        self.batch_parts.push(part);
    }

    pub fn acquire_draw_call(&mut self) -> BatchDrawCall {
        let mut call = self.draw_calls.pop().unwrap_or_default();
        call.reset();
        call
    }

    pub fn release_draw_call(&mut self, mut call: BatchDrawCall) {
        call.reset();
        self.draw_calls.push(call);
    }

    pub fn idle_batch_parts(&self) -> usize {
        self.batch_parts.len()
    }

    pub fn idle_draw_calls(&self) -> usize {
        self.draw_calls.len()
    }
}

// Global pool manager instance
static GLOBAL_POOL_MANAGER: OnceLock<Arc<Mutex<PoolManager>>> = OnceLock::new();

/// Get access to the global pool manager.
///
/// The pool manager is created on first use. Every geometry in the process checks batch
/// parts and draw calls out of it and returns them when it rebuilds, clears or is dropped.
///
/// # Examples
///
/// ```rust
/// use polybatch::get_global_pool_manager;
/// use std::thread;
///
/// let handles: Vec<_> = (0..4)
///     .map(|_| {
///         thread::spawn(|| {
///             let pool = get_global_pool_manager();
///             let mut guard = pool.lock().unwrap();
///             let part = guard.acquire_batch_part();
///             guard.release_batch_part(part);
///         })
///     })
///     .collect();
///
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// ```
pub fn get_global_pool_manager() -> Arc<Mutex<PoolManager>> {
    GLOBAL_POOL_MANAGER
        .get_or_init(|| Arc::new(Mutex::new(PoolManager::new())))
        .clone()
}

/// Initialize the global pool manager.
///
/// This is optional - the pool manager will be automatically initialized on first use.
pub fn initialize_global_pool_manager() {
    let _ = get_global_pool_manager();
}

/// Runs `f` with the global pool locked.
pub(crate) fn with_pool<R>(f: impl FnOnce(&mut PoolManager) -> R) -> R {
    let pool = get_global_pool_manager();
    let mut guard = pool.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}

#[cfg(test)]
mod tests {
    use super::PoolManager;
    use crate::color::Color;
    use crate::style::{BatchStyle, FillStyle};
    use crate::texture::Texture;

    #[test]
    fn released_batch_part_comes_back_reset() {
        let mut pool = PoolManager::new();
        let mut part = pool.acquire_batch_part();
        part.begin(BatchStyle::from(&FillStyle::solid(Color::WHITE)), 3, 3);
        part.end(9, 7);
        pool.release_batch_part(part);
        assert_eq!(pool.idle_batch_parts(), 1);

        let reused = pool.acquire_batch_part();
        assert!(reused.style().is_none());
        assert_eq!(reused.size(), 0);
        assert_eq!(pool.idle_batch_parts(), 0);
    }

    #[test]
    fn released_draw_call_drops_its_textures() {
        let mut pool = PoolManager::new();
        let mut call = pool.acquire_draw_call();
        call.textures.push(Texture::white());
        call.size = 6;
        pool.release_draw_call(call);

        let reused = pool.acquire_draw_call();
        assert!(reused.textures().is_empty());
        assert_eq!(reused.size(), 0);
    }
}
