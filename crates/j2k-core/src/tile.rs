//! Tile descriptors.

/// A rectangular region of an image, addressed by grid index and pixel origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileDescriptor {
    /// Column index in the tile grid.
    pub index_x: usize,
    /// Row index in the tile grid.
    pub index_y: usize,
    /// X offset in the image.
    pub origin_x: usize,
    /// Y offset in the image.
    pub origin_y: usize,
    /// Tile width (may be smaller than the configured size at the right edge).
    pub width: usize,
    /// Tile height (may be smaller than the configured size at the bottom edge).
    pub height: usize,
}

impl TileDescriptor {
    /// Number of samples covered.
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// True if pixel `(x, y)` lies inside the tile.
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.origin_x
            && y >= self.origin_y
            && x < self.origin_x + self.width
            && y < self.origin_y + self.height
    }

    /// Copies the tile's samples out of a row-major image.
    pub fn extract<T: Copy>(&self, image: &[T], image_width: usize) -> Vec<T> {
        let mut out = Vec::with_capacity(self.area());
        for y in self.origin_y..self.origin_y + self.height {
            let start = y * image_width + self.origin_x;
            out.extend_from_slice(&image[start..start + self.width]);
        }
        out
    }

    /// Writes tile samples back into a row-major image.
    pub fn insert<T: Copy>(&self, image: &mut [T], image_width: usize, samples: &[T]) {
        for (row, src) in samples.chunks_exact(self.width).enumerate() {
            let start = (self.origin_y + row) * image_width + self.origin_x;
            image[start..start + self.width].copy_from_slice(src);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_insert() {
        let image: Vec<u16> = (0..20).collect(); // 5x4
        let tile = TileDescriptor { index_x: 1, index_y: 1, origin_x: 3, origin_y: 2, width: 2, height: 2 };

        let samples = tile.extract(&image, 5);
        assert_eq!(samples, vec![13, 14, 18, 19]);

        let mut out = vec![0u16; 20];
        tile.insert(&mut out, 5, &samples);
        assert_eq!(out[13], 13);
        assert_eq!(out[19], 19);
        assert_eq!(out[12], 0);

        assert!(tile.contains(4, 3));
        assert!(!tile.contains(2, 3));
        assert_eq!(tile.area(), 4);
    }
}
