//! Tile grid computation.
//!
//! Splits an image into fixed-size tiles stepping by `tile - overlap`. The
//! last tile on each axis is shrunk to end exactly at the image edge, so tiles
//! never need padding and every pixel is covered.
//!
//! # Example
//!
//! ```rust
//! use j2k_compute::backend::compute_tile_grid;
//!
//! let tiles = compute_tile_grid(300, 300, 256, 256, 0).unwrap();
//! assert_eq!(tiles.len(), 4);
//! assert_eq!(tiles[1].width, 44);
//! ```

use tracing::debug;

use j2k_core::{Error, Result, TileDescriptor};

/// `(origin, length)` spans along one axis.
fn axis_spans(image: usize, tile: usize, overlap: usize) -> Vec<(usize, usize)> {
    let step = tile - overlap;
    let mut spans = Vec::with_capacity(image.div_ceil(step));
    let mut origin = 0;
    loop {
        let len = tile.min(image - origin);
        spans.push((origin, len));
        if origin + tile >= image {
            break;
        }
        origin += step;
    }
    spans
}

/// Tiles covering an `image_width x image_height` image, row by row.
///
/// Fails with a parameter error on zero image or tile dimensions, and when
/// `overlap` is not smaller than both tile dimensions.
pub fn compute_tile_grid(
    image_width: usize,
    image_height: usize,
    tile_width: usize,
    tile_height: usize,
    overlap: usize,
) -> Result<Vec<TileDescriptor>> {
    if image_width == 0 || image_height == 0 {
        return Err(Error::parameter(format!(
            "image dimensions must be positive, got {image_width}x{image_height}"
        )));
    }
    if tile_width == 0 || tile_height == 0 {
        return Err(Error::parameter(format!(
            "tile dimensions must be positive, got {tile_width}x{tile_height}"
        )));
    }
    if overlap >= tile_width || overlap >= tile_height {
        return Err(Error::parameter(format!(
            "overlap {overlap} must be smaller than tile size {tile_width}x{tile_height}"
        )));
    }

    let columns = axis_spans(image_width, tile_width, overlap);
    let rows = axis_spans(image_height, tile_height, overlap);

    let mut tiles = Vec::with_capacity(columns.len() * rows.len());
    for (index_y, &(origin_y, height)) in rows.iter().enumerate() {
        for (index_x, &(origin_x, width)) in columns.iter().enumerate() {
            tiles.push(TileDescriptor { index_x, index_y, origin_x, origin_y, width, height });
        }
    }

    debug!(
        image_width,
        image_height,
        tile_width,
        tile_height,
        overlap,
        tiles = tiles.len(),
        "computed tile grid"
    );
    Ok(tiles)
}
