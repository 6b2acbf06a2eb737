use alloc::sync::Arc;
use core::{
    alloc::Layout,
    ptr,
    sync::atomic::{AtomicU32, Ordering},
};
use crossbeam_utils::CachePadded;
use thiserror::Error;

/// Errors surfaced when setting up a ring buffer. Short writes and reads are
/// not errors: they are the buffer's flow-control mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The requested capacity is zero, or normalizing it to a power of two
    /// would overflow the 32-bit cursor space.
    #[error("invalid requested capacity: {0}")]
    InvalidCapacity(u32),
    /// The backing storage could not be allocated.
    #[error("failed to allocate {0} bytes of backing storage")]
    AllocationFailure(u32),
}

/// Capacity normalization inherited from the original design: a request that
/// is already a power of two is bumped to the next power of two, so asking
/// for 8 yields a 16-byte buffer. The original left every other request
/// untouched, which silently breaks the `idx & (capacity - 1)` offset
/// masking; those are rounded up to the next power of two instead.
fn normalize_capacity(requested: u32) -> Option<u32> {
    if requested == 0 {
        return None;
    }
    if requested.is_power_of_two() {
        requested.checked_mul(2)
    } else {
        requested.checked_next_power_of_two()
    }
}

pub struct RingBuffer {
    storage: *mut u8,
    capacity: u32,
    idx_r: CachePadded<AtomicU32>,
    idx_w: CachePadded<AtomicU32>,
}

// The raw storage pointer is only ever dereferenced by the single writer and
// the single reader, on disjoint regions bounded by the cursors.
unsafe impl Send for RingBuffer {}
unsafe impl Sync for RingBuffer {}

impl RingBuffer {
    /// Set up a ring buffer and split it into its writer and reader halves.
    /// The capacity is normalized to a power of two (see
    /// [`normalize_capacity`]) so that offsets can be computed by masking
    /// instead of division.
    pub fn init(requested: u32) -> Result<(RingBufferWriter, RingBufferReader), Error> {
        let capacity = normalize_capacity(requested).ok_or(Error::InvalidCapacity(requested))?;
        // Capacity is in [2, 2^31], so the layout is always valid and
        // the allocation is never zero-sized.
        let storage = unsafe {
            let layout = Layout::from_size_align_unchecked(capacity as usize, 1);
            alloc::alloc::alloc(layout)
        };
        if storage.is_null() {
            return Err(Error::AllocationFailure(capacity));
        }
        let rb = Arc::new(RingBuffer {
            storage,
            capacity,
            idx_r: CachePadded::new(AtomicU32::new(0)),
            idx_w: CachePadded::new(AtomicU32::new(0)),
        });
        Ok((
            RingBufferWriter {
                inner: rb.clone(),
                cached_idx_r: 0,
                local_idx_w: 0,
            },
            RingBufferReader {
                inner: rb,
                local_idx_r: 0,
                cached_idx_w: 0,
            },
        ))
    }

    #[inline]
    fn mask(&self) -> u32 {
        // Since the capacity is a power of two, capacity-1 masks a cursor
        // down to its offset in storage. Cursors are left growing
        // indefinitely and naturally wrap around past u32::MAX.
        self.capacity - 1
    }

    /// Copy `src` into storage starting at the masked offset of `idx`,
    /// wrapping past the physical end as a second segment. The second copy
    /// has length zero whenever the run does not wrap.
    ///
    /// # Safety
    /// `src.len()` must not exceed the free space between the cursors.
    #[inline]
    unsafe fn copy_in(&self, idx: u32, src: &[u8]) {
        let off = (idx & self.mask()) as usize;
        let first = src.len().min(self.capacity as usize - off);
        ptr::copy_nonoverlapping(src.as_ptr(), self.storage.add(off), first);
        ptr::copy_nonoverlapping(src.as_ptr().add(first), self.storage, src.len() - first);
    }

    /// Mirror of [`Self::copy_in`] for the read path.
    ///
    /// # Safety
    /// `dst.len()` must not exceed the unread bytes between the cursors.
    #[inline]
    unsafe fn copy_out(&self, idx: u32, dst: &mut [u8]) {
        let off = (idx & self.mask()) as usize;
        let first = dst.len().min(self.capacity as usize - off);
        ptr::copy_nonoverlapping(self.storage.add(off), dst.as_mut_ptr(), first);
        ptr::copy_nonoverlapping(self.storage, dst.as_mut_ptr().add(first), dst.len() - first);
    }
}

impl Drop for RingBuffer {
    fn drop(&mut self) {
        // Runs once both halves are gone, so the storage is freed exactly
        // once.
        unsafe {
            let layout = Layout::from_size_align_unchecked(self.capacity as usize, 1);
            alloc::alloc::dealloc(self.storage, layout);
        }
    }
}

/// The producing half of a [`RingBuffer`]. It is the sole mutator of the
/// write cursor.
pub struct RingBufferWriter {
    inner: Arc<RingBuffer>,
    cached_idx_r: u32,
    local_idx_w: u32,
}

impl RingBufferWriter {
    /// Write as many bytes of `src` as currently fit and return the count.
    /// An empty `src` is a no-op returning 0. A count smaller than
    /// `src.len()` means the buffer ran out of space; the caller decides
    /// whether to retry with the remainder later.
    pub fn write(&mut self, src: &[u8]) -> usize {
        if src.is_empty() {
            return 0;
        }

        let capacity = self.inner.capacity;
        // The write and read cursors are left growing indefinitely, so the
        // distance between them must be computed with a wrapping
        // subtraction to account for any eventual overflow.
        let mut free = capacity - self.local_idx_w.wrapping_sub(self.cached_idx_r);
        if (free as usize) < src.len() {
            // The cached read cursor may be stale. Refresh it only when the
            // stale view cannot satisfy the request.
            self.cached_idx_r = self.inner.idx_r.load(Ordering::Acquire);
            free = capacity - self.local_idx_w.wrapping_sub(self.cached_idx_r);
        }

        let n = (free as usize).min(src.len());
        if n == 0 {
            return 0;
        }

        // The clamp above keeps the copy inside the free region, away from
        // anything the reader still owns.
        unsafe { self.inner.copy_in(self.local_idx_w, &src[..n]) };
        // Publish the cursor only after the bytes are in place, so the
        // reader never observes an advanced cursor over unwritten storage.
        self.local_idx_w = self.local_idx_w.wrapping_add(n as u32);
        self.inner.idx_w.store(self.local_idx_w, Ordering::Release);

        n
    }

    /// Check if the ring buffer is full and eventually update the internal
    /// cached read cursor.
    #[inline]
    pub fn is_full(&mut self) -> bool {
        // Check if the ring buffer is potentially full. This happens when
        // the wrapping difference between the write and read cursors equals
        // the capacity.
        if self.local_idx_w.wrapping_sub(self.cached_idx_r) == self.inner.capacity {
            self.cached_idx_r = self.inner.idx_r.load(Ordering::Acquire);
            // Check if the ring buffer is really full
            self.local_idx_w.wrapping_sub(self.cached_idx_r) == self.inner.capacity
        } else {
            false
        }
    }

    /// Number of bytes the buffer can accept right now. Always refreshes
    /// the cached read cursor.
    #[inline]
    pub fn free_space(&mut self) -> usize {
        self.cached_idx_r = self.inner.idx_r.load(Ordering::Acquire);
        (self.inner.capacity - self.local_idx_w.wrapping_sub(self.cached_idx_r)) as usize
    }

    /// Normalized capacity of the underlying buffer.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity as usize
    }
}

/// The consuming half of a [`RingBuffer`]. It is the sole mutator of the
/// read cursor.
pub struct RingBufferReader {
    inner: Arc<RingBuffer>,
    local_idx_r: u32,
    cached_idx_w: u32,
}

impl RingBufferReader {
    /// Read up to `dst.len()` bytes into `dst` and return the count, in
    /// FIFO order. An empty `dst` is a no-op returning 0. A count smaller
    /// than `dst.len()` means the buffer ran dry, not that anything failed.
    pub fn read(&mut self, dst: &mut [u8]) -> usize {
        if dst.is_empty() {
            return 0;
        }

        let mut available = self.cached_idx_w.wrapping_sub(self.local_idx_r);
        if (available as usize) < dst.len() {
            // The cached write cursor may be stale. Refresh it only when
            // the stale view cannot satisfy the request.
            self.cached_idx_w = self.inner.idx_w.load(Ordering::Acquire);
            available = self.cached_idx_w.wrapping_sub(self.local_idx_r);
        }

        let n = (available as usize).min(dst.len());
        if n == 0 {
            return 0;
        }

        // Only bytes strictly behind the published write cursor are read.
        unsafe { self.inner.copy_out(self.local_idx_r, &mut dst[..n]) };
        self.local_idx_r = self.local_idx_r.wrapping_add(n as u32);
        self.inner.idx_r.store(self.local_idx_r, Ordering::Release);

        n
    }

    /// Check if the ring buffer is empty and eventually update the internal
    /// cached write cursor.
    #[inline]
    pub fn is_empty(&mut self) -> bool {
        // Check if the ring buffer is potentially empty
        if self.local_idx_r == self.cached_idx_w {
            self.cached_idx_w = self.inner.idx_w.load(Ordering::Acquire);
            // Check if the ring buffer is really empty
            self.local_idx_r == self.cached_idx_w
        } else {
            false
        }
    }

    /// Number of unread bytes right now. Always refreshes the cached write
    /// cursor.
    #[inline]
    pub fn bytes_available(&mut self) -> usize {
        self.cached_idx_w = self.inner.idx_w.load(Ordering::Acquire);
        self.cached_idx_w.wrapping_sub(self.local_idx_r) as usize
    }

    /// Normalized capacity of the underlying buffer.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity as usize
    }
}
