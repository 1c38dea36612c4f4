/// Borrowed view over a caller-owned, row-major element buffer.
///
/// Every row holds `width` payload elements followed by `padding` trailing
/// elements, so the stride is `width + padding`. The trailing padding of the
/// last row may be absent from the buffer.
#[derive(Clone, Copy, Debug)]
pub struct Plane<'a, T> {
    data: &'a [T],
    width: u32,
    height: u32,
    padding: u32,
}

/// Mutable counterpart of [`Plane`].
#[derive(Debug)]
pub struct PlaneMut<'a, T> {
    data: &'a mut [T],
    width: u32,
    height: u32,
    padding: u32,
}

#[inline]
fn required_len(width: u32, height: u32, padding: u32) -> usize {
    if height == 0 {
        return 0;
    }
    (height as usize - 1) * (width + padding) as usize + width as usize
}

impl<'a, T: Copy> Plane<'a, T> {
    #[must_use]
    pub fn new(data: &'a [T], width: u32, height: u32, padding: u32) -> Self {
        debug_assert!(width != 0 && height != 0);
        debug_assert!(data.len() >= required_len(width, height, padding));
        Self {
            data,
            width,
            height,
            padding,
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn padding(&self) -> u32 {
        self.padding
    }

    #[inline]
    #[must_use]
    pub fn stride(&self) -> usize {
        (self.width + self.padding) as usize
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    #[must_use]
    pub fn value(&self, x: u32, y: u32) -> T {
        debug_assert!(self.contains(x, y));
        self.data[y as usize * self.stride() + x as usize]
    }

    #[inline]
    #[must_use]
    pub fn row(&self, y: u32) -> &'a [T] {
        debug_assert!(y < self.height);
        let offset = y as usize * self.stride();
        &self.data[offset..offset + self.width as usize]
    }
}

impl<'a, T: Copy> PlaneMut<'a, T> {
    #[must_use]
    pub fn new(data: &'a mut [T], width: u32, height: u32, padding: u32) -> Self {
        debug_assert!(width != 0 && height != 0);
        debug_assert!(data.len() >= required_len(width, height, padding));
        Self {
            data,
            width,
            height,
            padding,
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn padding(&self) -> u32 {
        self.padding
    }

    #[inline]
    #[must_use]
    pub fn stride(&self) -> usize {
        (self.width + self.padding) as usize
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    #[must_use]
    pub fn value(&self, x: u32, y: u32) -> T {
        debug_assert!(self.contains(x, y));
        self.data[y as usize * self.stride() + x as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: T) {
        debug_assert!(self.contains(x, y));
        let index = y as usize * self.stride() + x as usize;
        self.data[index] = value;
    }

    #[inline]
    #[must_use]
    pub fn row(&self, y: u32) -> &[T] {
        debug_assert!(y < self.height);
        let offset = y as usize * self.stride();
        &self.data[offset..offset + self.width as usize]
    }

    #[inline]
    #[must_use]
    pub fn row_mut(&mut self, y: u32) -> &mut [T] {
        debug_assert!(y < self.height);
        let offset = y as usize * self.stride();
        let width = self.width as usize;
        &mut self.data[offset..offset + width]
    }

    /// Sets every payload element, leaving the padding untouched.
    pub fn fill(&mut self, value: T) {
        for y in 0..self.height {
            self.row_mut(y).fill(value);
        }
    }

    /// Immutable reborrow of this view.
    #[inline]
    #[must_use]
    pub fn as_plane(&self) -> Plane<'_, T> {
        Plane {
            data: self.data,
            width: self.width,
            height: self.height,
            padding: self.padding,
        }
    }
}
