/// Read access to an 8-bit grayscale raster.
///
/// `x` is the column and `y` is the row. Callers check bounds with
/// [`PixelSource::contains`] before calling [`PixelSource::pixel`].
pub trait PixelSource {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn pixel(&self, x: usize, y: usize) -> u8;

    #[inline]
    fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width() && (y as usize) < self.height()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl<'a> GrayImageView<'a> {
    /// Wrap a row-major buffer. Returns `None` if `data.len() != width * height`.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Option<Self> {
        (width.checked_mul(height)? == data.len()).then_some(Self {
            width,
            height,
            data,
        })
    }
}

impl GrayImage {
    /// Allocate an image filled with a constant intensity.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }

    /// Paint the axis-aligned rectangle `[x0, x0 + w) × [y0, y0 + h)`, clipped to the image.
    pub fn fill_rect(&mut self, x0: usize, y0: usize, w: usize, h: usize, value: u8) {
        let x1 = (x0 + w).min(self.width);
        let y1 = (y0 + h).min(self.height);
        for y in y0.min(y1)..y1 {
            let row = y * self.width;
            self.data[row + x0.min(x1)..row + x1].fill(value);
        }
    }
}

impl PixelSource for GrayImageView<'_> {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn pixel(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }
}

impl PixelSource for GrayImage {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn pixel(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_rejects_mismatched_buffer() {
        let data = [0u8; 5];
        assert!(GrayImageView::new(2, 3, &data).is_none());
        assert!(GrayImageView::new(5, 1, &data).is_some());
    }

    #[test]
    fn fill_rect_is_clipped_and_row_major() {
        let mut img = GrayImage::filled(4, 3, 0);
        img.fill_rect(2, 1, 5, 5, 9);
        assert_eq!(img.data, vec![0, 0, 0, 0, 0, 0, 9, 9, 0, 0, 9, 9]);

        let view = img.view();
        assert_eq!(view.pixel(3, 2), 9);
        assert_eq!(view.pixel(1, 2), 0);
    }

    #[test]
    fn contains_checks_both_axes() {
        let img = GrayImage::filled(3, 2, 0);
        assert!(img.contains(2, 1));
        assert!(!img.contains(3, 1));
        assert!(!img.contains(0, 2));
        assert!(!img.contains(-1, 0));
    }
}
