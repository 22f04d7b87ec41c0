//! Position/limit byte views.
//!
//! A `ByteView` is a cursor pair over a backing region:
//!
//! ```text
//! 0 <= position <= limit <= capacity
//! ```
//!
//! Writers put bytes at `position` and advance it; `flip` turns a filled
//! view into a readable one (`limit = position`, `position = 0`). The
//! backing decides whether the view may grow: heap `Vec<u8>` and `BytesMut`
//! can, borrowed `&mut [u8]` regions ("direct" memory owned elsewhere)
//! never do.

use bytes::BytesMut;

use crate::crypto::CryptoError;

/// Memory behind a view.
pub trait Backing {
    fn as_slice(&self) -> &[u8];
    fn as_mut_slice(&mut self) -> &mut [u8];

    /// Resize to at least `new_len` bytes. Returns `false` if the region is fixed.
    fn grow_to(&mut self, _new_len: usize) -> bool {
        false
    }
}

impl Backing for Vec<u8> {
    fn as_slice(&self) -> &[u8] {
        self
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        self
    }

    fn grow_to(&mut self, new_len: usize) -> bool {
        if new_len > self.len() {
            self.resize(new_len, 0);
        }
        true
    }
}

impl Backing for BytesMut {
    fn as_slice(&self) -> &[u8] {
        self
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        self
    }

    fn grow_to(&mut self, new_len: usize) -> bool {
        if new_len > self.len() {
            self.resize(new_len, 0);
        }
        true
    }
}

impl Backing for &mut [u8] {
    fn as_slice(&self) -> &[u8] {
        self
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        self
    }
}

#[derive(Debug)]
pub struct ByteView<B: Backing> {
    buf: B,
    position: usize,
    limit: usize,
    growable: bool,
}

impl<B: Backing> ByteView<B> {
    /// Fixed-capacity view over the whole backing: `position = 0`, `limit = capacity`.
    pub fn new(buf: B) -> Self {
        let limit = buf.as_slice().len();
        Self { buf, position: 0, limit, growable: false }
    }

    /// Like `new`, but writes past the limit grow the backing when it can.
    pub fn growable(buf: B) -> Self {
        Self { growable: true, ..Self::new(buf) }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn capacity(&self) -> usize {
        self.buf.as_slice().len()
    }

    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    pub fn has_remaining(&self) -> bool {
        self.position < self.limit
    }

    pub fn is_growable(&self) -> bool {
        self.growable
    }

    pub fn set_position(&mut self, position: usize) -> Result<(), CryptoError> {
        if position > self.limit {
            return Err(CryptoError::BufferTooSmall { required: position, available: self.limit });
        }
        self.position = position;
        Ok(())
    }

    /// Moves the limit; the position is pulled back if it would pass it.
    pub fn set_limit(&mut self, limit: usize) -> Result<(), CryptoError> {
        if limit > self.capacity() {
            return Err(CryptoError::BufferTooSmall { required: limit, available: self.capacity() });
        }
        self.limit = limit;
        self.position = self.position.min(limit);
        Ok(())
    }

    /// Bytes between `position` and `limit`.
    pub fn remaining_slice(&self) -> &[u8] {
        &self.buf.as_slice()[self.position..self.limit]
    }

    pub fn remaining_mut(&mut self) -> &mut [u8] {
        let (start, end) = (self.position, self.limit);
        &mut self.buf.as_mut_slice()[start..end]
    }

    /// Skip `n` bytes (consumed by a reader or filled in place by a writer).
    pub fn advance(&mut self, n: usize) -> Result<(), CryptoError> {
        if n > self.remaining() {
            return Err(CryptoError::BufferTooSmall { required: n, available: self.remaining() });
        }
        self.position += n;
        Ok(())
    }

    /// Make room for `additional` bytes at `position`, growing if allowed.
    ///
    /// Never touches the contents; a failure leaves the view unchanged.
    pub fn reserve(&mut self, additional: usize) -> Result<(), CryptoError> {
        if additional <= self.remaining() {
            return Ok(());
        }
        let needed = self.position + additional;
        if self.growable && self.limit == self.capacity() {
            let new_cap = needed.max(self.capacity().saturating_mul(2));
            if self.buf.grow_to(new_cap) {
                self.limit = self.capacity();
                return Ok(());
            }
        }
        Err(CryptoError::BufferTooSmall { required: additional, available: self.remaining() })
    }

    /// Copy `data` in at `position` and advance.
    pub fn put(&mut self, data: &[u8]) -> Result<(), CryptoError> {
        self.reserve(data.len())?;
        let start = self.position;
        self.buf.as_mut_slice()[start..start + data.len()].copy_from_slice(data);
        self.position += data.len();
        Ok(())
    }

    /// Switch from filling to draining.
    pub fn flip(&mut self) {
        self.limit = self.position;
        self.position = 0;
    }

    /// Reset cursors for refilling. Contents are left as-is.
    pub fn clear(&mut self) {
        self.position = 0;
        self.limit = self.capacity();
    }

    /// Move unread bytes to the front and continue filling after them.
    pub fn compact(&mut self) {
        let (start, end) = (self.position, self.limit);
        self.buf.as_mut_slice().copy_within(start..end, 0);
        self.position = end - start;
        self.limit = self.capacity();
    }

    /// Bytes before `position`, i.e. what has been written so far.
    pub fn written(&self) -> &[u8] {
        &self.buf.as_slice()[..self.position]
    }

    pub fn get_ref(&self) -> &B {
        &self.buf
    }

    pub fn into_inner(self) -> B {
        self.buf
    }
}

impl ByteView<Vec<u8>> {
    /// Zeroed heap view of `capacity` bytes.
    pub fn allocate(capacity: usize) -> Self {
        Self::new(vec![0u8; capacity])
    }

    /// Readable view over existing data: `position = 0`, `limit = data.len()`.
    pub fn wrap(data: impl Into<Vec<u8>>) -> Self {
        Self::new(data.into())
    }
}

impl ByteView<BytesMut> {
    pub fn allocate_growable(capacity: usize) -> Self {
        Self::growable(BytesMut::zeroed(capacity))
    }
}

/// Carve disjoint views of the given sizes from the front of `region`.
///
/// Each window is an independent fixed view; adapters can work on them
/// side by side without overlapping.
pub fn split_windows<'a>(region: &'a mut [u8], sizes: &[usize]) -> Result<Vec<ByteView<&'a mut [u8]>>, CryptoError> {
    let total: usize = sizes.iter().sum();
    if total > region.len() {
        return Err(CryptoError::BufferTooSmall { required: total, available: region.len() });
    }

    let mut windows = Vec::with_capacity(sizes.len());
    let mut rest = region;
    for &size in sizes {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(size);
        windows.push(ByteView::new(head));
        rest = tail;
    }
    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_and_compact_move_cursors() {
        let mut view = ByteView::allocate(8);
        view.put(b"abcde").unwrap();
        view.flip();
        assert_eq!(view.remaining_slice(), b"abcde");

        view.advance(2).unwrap();
        view.compact();
        assert_eq!(view.position(), 3);
        assert_eq!(view.limit(), 8);
        assert_eq!(view.written(), b"cde");
    }

    #[test]
    fn fixed_view_refuses_overflow_without_writing() {
        let mut region = [0u8; 4];
        let mut view = ByteView::new(&mut region[..]);
        let err = view.put(b"too long").unwrap_err();
        assert_eq!(err, CryptoError::BufferTooSmall { required: 8, available: 4 });
        assert_eq!(view.position(), 0);
        assert_eq!(region, [0u8; 4]);
    }

    #[test]
    fn growable_views_extend() {
        let mut heap = ByteView::growable(Vec::<u8>::new());
        heap.put(b"0123456789").unwrap();
        assert_eq!(heap.written(), b"0123456789");

        let mut bm = ByteView::allocate_growable(2);
        bm.put(b"abc").unwrap();
        assert!(bm.capacity() >= 3);
        assert_eq!(bm.written(), b"abc");
    }

    #[test]
    fn shortened_limit_is_never_grown_past() {
        let mut view = ByteView::growable(vec![0u8; 8]);
        assert!(view.is_growable());
        view.set_limit(4).unwrap();
        assert!(view.set_limit(9).is_err());

        let err = view.put(b"abcdef").unwrap_err();
        assert_eq!(err, CryptoError::BufferTooSmall { required: 6, available: 4 });
        assert_eq!(view.capacity(), 8);
    }

    #[test]
    fn fill_in_place_then_take_backing() {
        let mut view = ByteView::allocate(6);
        view.remaining_mut()[..3].copy_from_slice(b"xyz");
        view.advance(3).unwrap();
        view.set_limit(2).unwrap();
        assert_eq!(view.position(), 2);
        assert_eq!(&view.into_inner()[..3], b"xyz");
    }

    #[test]
    fn windows_are_disjoint() {
        let mut region = vec![0u8; 10];
        {
            let mut windows = split_windows(&mut region, &[4, 6]).unwrap();
            windows[0].put(b"aaaa").unwrap();
            windows[1].put(b"bb").unwrap();
            assert!(windows[0].put(b"x").is_err());
        }
        assert_eq!(&region[..6], b"aaaabb");
        assert!(split_windows(&mut region, &[8, 8]).is_err());
    }
}
