use bytes::Bytes;

/// A borrowed byte region with a mutable `(offset, length)` window.
///
/// The window selects the logical extent inside the fixed backing
/// storage; adjusting it never reallocates. A buffer is written in
/// place and then either handed downstream with [`Buffer::into_bytes`]
/// or returned to its pool.
#[derive(Debug)]
pub struct Buffer {
    storage: Vec<u8>,
    offset: usize,
    len: usize,
}

impl Buffer {
    fn new(storage: Vec<u8>) -> Self {
        let len = storage.len();
        Self {
            storage,
            offset: 0,
            len,
        }
    }

    /// True allocated size of the backing storage.
    pub fn actual_capacity(&self) -> usize {
        self.storage.len()
    }

    /// Current window offset in bytes.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Current window length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Move the logical window. Capacity is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the window would extend past the allocated capacity.
    pub fn set_window(&mut self, offset: usize, len: usize) {
        assert!(
            offset + len <= self.storage.len(),
            "window exceeds buffer capacity"
        );
        self.offset = offset;
        self.len = len;
    }

    /// The bytes inside the current window.
    pub fn window(&self) -> &[u8] {
        &self.storage[self.offset..self.offset + self.len]
    }

    /// Mutable access to the current window.
    pub fn window_mut(&mut self) -> &mut [u8] {
        &mut self.storage[self.offset..self.offset + self.len]
    }

    /// Mutable access to the full backing storage, ignoring the window.
    ///
    /// Packing writes header words below the window offset through this.
    pub fn storage_mut(&mut self) -> &mut [u8] {
        &mut self.storage
    }

    /// Hand the windowed bytes downstream, consuming the buffer.
    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.storage).slice(self.offset..self.offset + self.len)
    }

    fn into_storage(self) -> Vec<u8> {
        self.storage
    }
}

/// Free-list allocator for packet buffers.
///
/// Storage handed out by [`BufferPool::acquire`] is zero-filled to its
/// capacity, which keeps padding bytes in finished packets
/// deterministic.
#[derive(Debug)]
pub struct BufferPool {
    free: Vec<Vec<u8>>,
    default_capacity: usize,
    max_pooled: usize,
}

impl BufferPool {
    /// Create a pool that hands out buffers of at least
    /// `default_capacity` bytes and retains up to `max_pooled` returned
    /// allocations.
    pub fn new(default_capacity: usize, max_pooled: usize) -> Self {
        Self {
            free: Vec::with_capacity(max_pooled),
            default_capacity,
            max_pooled,
        }
    }

    /// Acquire a zero-filled buffer of at least `min_capacity` bytes.
    pub fn acquire(&mut self, min_capacity: usize) -> Buffer {
        let capacity = min_capacity.max(self.default_capacity);
        let mut storage = self.free.pop().unwrap_or_default();
        storage.clear();
        storage.resize(capacity, 0);
        Buffer::new(storage)
    }

    /// Return a buffer's storage for reuse.
    pub fn release(&mut self, buffer: Buffer) {
        if self.free.len() < self.max_pooled {
            self.free.push(buffer.into_storage());
        }
    }

    /// Number of allocations currently held for reuse.
    pub fn available(&self) -> usize {
        self.free.len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(sigmux_wire::DEFAULT_MTU, 64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_meets_minimum_capacity() {
        let mut pool = BufferPool::new(64, 4);
        assert_eq!(pool.acquire(16).actual_capacity(), 64);
        assert_eq!(pool.acquire(256).actual_capacity(), 256);
    }

    #[test]
    fn acquired_storage_is_zero_filled() {
        let mut pool = BufferPool::new(32, 4);
        let mut buffer = pool.acquire(32);
        buffer.storage_mut().fill(0xAB);
        pool.release(buffer);

        let reused = pool.acquire(32);
        assert!(reused.window().iter().all(|&b| b == 0));
    }

    #[test]
    fn window_adjusts_without_reallocating() {
        let mut pool = BufferPool::new(64, 4);
        let mut buffer = pool.acquire(64);
        buffer.set_window(16, 8);

        assert_eq!(buffer.offset(), 16);
        assert_eq!(buffer.len(), 8);
        assert_eq!(buffer.actual_capacity(), 64);
        assert_eq!(buffer.window().len(), 8);
    }

    #[test]
    #[should_panic(expected = "window exceeds buffer capacity")]
    fn window_cannot_exceed_capacity() {
        let mut pool = BufferPool::new(16, 4);
        let mut buffer = pool.acquire(16);
        buffer.set_window(8, 16);
    }

    #[test]
    fn into_bytes_yields_window_only() {
        let mut pool = BufferPool::new(16, 4);
        let mut buffer = pool.acquire(16);
        buffer.storage_mut()[4..8].copy_from_slice(&[1, 2, 3, 4]);
        buffer.set_window(4, 4);

        assert_eq!(buffer.into_bytes().as_ref(), &[1, 2, 3, 4]);
    }

    #[test]
    fn release_caps_pooled_allocations() {
        let mut pool = BufferPool::new(8, 2);
        for _ in 0..4 {
            let buffer = Buffer::new(vec![0; 8]);
            pool.release(buffer);
        }
        assert_eq!(pool.available(), 2);
    }
}
