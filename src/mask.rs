use image::{GrayImage, Luma, RgbaImage};

/// Flat offset of a pixel into an RGBA channel array: `(y * width + x) * 4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PixelIndex(usize);

impl PixelIndex {
    /// Index of the pixel at `(x, y)` in a raster `width` pixels wide.
    pub fn new(x: u32, y: u32, width: u32) -> Self {
        Self(((y as usize) * (width as usize) + x as usize) * 4)
    }

    /// Channel offset of the pixel's red byte.
    pub fn offset(self) -> usize {
        self.0
    }

    /// Offset of the pixel in pixel units.
    pub fn pixel(self) -> usize {
        self.0 / 4
    }

    /// Recover `(x, y)` for a raster `width` pixels wide.
    pub fn coords(self, width: u32) -> (u32, u32) {
        let width = width.max(1) as usize;
        let pixel = self.pixel();
        ((pixel % width) as u32, (pixel / width) as u32)
    }
}

/// Set of pixels belonging to a foreground subject, including dilation.
///
/// Backed by one flag per pixel of the raster it was derived from, so members
/// are unique and always inside that raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskSet {
    width: u32,
    height: u32,
    members: Vec<bool>,
}

impl MaskSet {
    /// Empty mask for a raster of the given size.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            members: vec![false; width as usize * height as usize],
        }
    }

    /// Dimensions of the raster the mask was derived from.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn contains(&self, index: PixelIndex) -> bool {
        self.members.get(index.pixel()).copied().unwrap_or(false)
            && index.offset() % 4 == 0
    }

    /// Whether the pixel at `(x, y)` is a member. Out-of-bounds is never a member.
    pub fn contains_xy(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.members[self.flat(x, y)]
    }

    pub fn len(&self) -> usize {
        self.members.iter().filter(|&&m| m).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.members.iter().any(|&m| m)
    }

    /// Members in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = PixelIndex> + '_ {
        self.members
            .iter()
            .enumerate()
            .filter(|(_, m)| **m)
            .map(|(pixel, _)| PixelIndex(pixel * 4))
    }

    /// Render the mask as a binary grayscale image (255 inside, 0 outside).
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([if self.contains_xy(x, y) { 255 } else { 0 }])
        })
    }

    fn flat(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + x as usize
    }
}

/// Compute the subject mask of a foreground cutout.
///
/// Every pixel with alpha > 0 is a member, together with every pixel within
/// Chebyshev distance `margin` of it, clipped to the raster bounds.
pub fn compute_mask(foreground: &RgbaImage, margin: u32) -> MaskSet {
    let (w, h) = foreground.dimensions();
    let seeds: Vec<bool> = foreground.pixels().map(|px| px[3] > 0).collect();

    let members = if margin == 0 || seeds.is_empty() {
        seeds
    } else {
        dilate_square(&seeds, w as usize, h as usize, margin as usize)
    };

    MaskSet {
        width: w,
        height: h,
        members,
    }
}

/// Square dilation as a row pass followed by a column pass.
fn dilate_square(seeds: &[bool], w: usize, h: usize, radius: usize) -> Vec<bool> {
    let mut rows = vec![false; w * h];
    for y in 0..h {
        let line = &seeds[y * w..(y + 1) * w];
        rows[y * w..(y + 1) * w].copy_from_slice(&dilate_line(line, radius));
    }

    let mut out = vec![false; w * h];
    let mut column = vec![false; h];
    for x in 0..w {
        for (y, cell) in column.iter_mut().enumerate() {
            *cell = rows[y * w + x];
        }
        for (y, value) in dilate_line(&column, radius).into_iter().enumerate() {
            out[y * w + x] = value;
        }
    }
    out
}

/// 1-D dilation: position `i` is set if any input within `radius` of it is set.
fn dilate_line(line: &[bool], radius: usize) -> Vec<bool> {
    // prefix[i] = number of set cells in line[..i]
    let mut prefix = Vec::with_capacity(line.len() + 1);
    prefix.push(0usize);
    for &cell in line {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + usize::from(cell));
    }

    (0..line.len())
        .map(|i| {
            let lo = i.saturating_sub(radius);
            let hi = (i + radius + 1).min(line.len());
            prefix[hi] > prefix[lo]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn transparent(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 0]))
    }

    fn with_opaque(w: u32, h: u32, points: &[(u32, u32)]) -> RgbaImage {
        let mut img = transparent(w, h);
        for &(x, y) in points {
            img.put_pixel(x, y, Rgba([10, 20, 30, 255]));
        }
        img
    }

    /// Direct translation of the neighbourhood definition, used as the oracle.
    fn naive_mask(fg: &RgbaImage, margin: u32) -> Vec<bool> {
        let (w, h) = fg.dimensions();
        let m = margin as i64;
        let mut out = vec![false; (w * h) as usize];
        for y in 0..h as i64 {
            for x in 0..w as i64 {
                if fg.get_pixel(x as u32, y as u32)[3] == 0 {
                    continue;
                }
                for my in -m..=m {
                    for mx in -m..=m {
                        let (nx, ny) = (x + mx, y + my);
                        if nx >= 0 && ny >= 0 && nx < w as i64 && ny < h as i64 {
                            out[(ny * w as i64 + nx) as usize] = true;
                        }
                    }
                }
            }
        }
        out
    }

    mod pixel_index {
        use super::*;

        #[test]
        fn offset_is_channel_based() {
            let idx = PixelIndex::new(3, 2, 10);
            assert_eq!(idx.offset(), (2 * 10 + 3) * 4);
            assert_eq!(idx.pixel(), 23);
            assert_eq!(idx.coords(10), (3, 2));
        }
    }

    mod compute_mask {
        use super::*;

        mod unit {
            use super::*;

            #[test]
            fn all_transparent_is_empty() {
                let mask = compute_mask(&transparent(6, 4), 3);
                assert!(mask.is_empty());
                assert_eq!(mask.len(), 0);
                assert_eq!(mask.dimensions(), (6, 4));
            }

            #[test]
            fn margin_zero_is_exact_alpha() {
                let fg = with_opaque(4, 4, &[(1, 1), (3, 0)]);
                let mask = compute_mask(&fg, 0);
                let members: Vec<_> = mask.iter().collect();
                assert_eq!(
                    members,
                    vec![PixelIndex::new(3, 0, 4), PixelIndex::new(1, 1, 4)]
                );
            }

            #[test]
            fn low_alpha_counts_as_subject() {
                let mut fg = transparent(2, 1);
                fg.put_pixel(1, 0, Rgba([0, 0, 0, 1]));
                let mask = compute_mask(&fg, 0);
                assert!(mask.contains_xy(1, 0));
                assert!(!mask.contains_xy(0, 0));
            }

            #[test]
            fn single_pixel_dilates_to_square() {
                let fg = with_opaque(7, 7, &[(3, 3)]);
                let mask = compute_mask(&fg, 2);
                assert_eq!(mask.len(), 25);
                for y in 0..7 {
                    for x in 0..7 {
                        let inside = (1..=5).contains(&x) && (1..=5).contains(&y);
                        assert_eq!(mask.contains_xy(x, y), inside, "pixel ({x}, {y})");
                    }
                }
            }

            #[test]
            fn dilation_is_clipped_not_wrapped() {
                // Corner seed: the square is cut by the top and left edges and
                // must not reappear on the opposite side of the row.
                let fg = with_opaque(5, 5, &[(0, 0)]);
                let mask = compute_mask(&fg, 2);
                assert_eq!(mask.len(), 9);
                assert!(!mask.contains_xy(4, 0));
                assert!(!mask.contains_xy(0, 4));
                assert!(mask.iter().all(|idx| idx.pixel() < 25));
            }

            #[test]
            fn margin_larger_than_image_covers_everything() {
                let fg = with_opaque(4, 3, &[(0, 0)]);
                let mask = compute_mask(&fg, 100);
                assert_eq!(mask.len(), 12);
            }

            #[test]
            fn contains_rejects_foreign_indices() {
                let mask = compute_mask(&with_opaque(2, 2, &[(0, 0)]), 0);
                assert!(mask.contains(PixelIndex::new(0, 0, 2)));
                assert!(!mask.contains(PixelIndex(1)));
                assert!(!mask.contains(PixelIndex::new(0, 5, 2)));
            }

            #[test]
            fn gray_export_matches_members() {
                let fg = with_opaque(3, 3, &[(1, 1)]);
                let gray = compute_mask(&fg, 0).to_gray_image();
                assert_eq!(gray.dimensions(), (3, 3));
                assert_eq!(gray.get_pixel(1, 1).0[0], 255);
                assert_eq!(gray.get_pixel(0, 0).0[0], 0);
            }
        }

        mod prop {
            use super::*;
            use proptest::prelude::*;

            fn foreground() -> impl Strategy<Value = RgbaImage> {
                (1u32..12, 1u32..12).prop_flat_map(|(w, h)| {
                    proptest::collection::vec(proptest::bool::weighted(0.15), (w * h) as usize)
                        .prop_map(move |cells| {
                            RgbaImage::from_fn(w, h, |x, y| {
                                let a = if cells[(y * w + x) as usize] { 200 } else { 0 };
                                Rgba([1, 2, 3, a])
                            })
                        })
                })
            }

            proptest! {
                /// compute_mask: matches the square-neighbourhood definition exactly
                #[test]
                fn matches_naive_dilation(fg in foreground(), margin in 0u32..6) {
                    let mask = compute_mask(&fg, margin);
                    let expected = naive_mask(&fg, margin);
                    let (w, _) = fg.dimensions();
                    for (i, &want) in expected.iter().enumerate() {
                        let (x, y) = PixelIndex(i * 4).coords(w);
                        prop_assert_eq!(mask.contains_xy(x, y), want);
                    }
                }

                /// compute_mask: margin 0 selects exactly the pixels with alpha > 0
                #[test]
                fn margin_zero_equals_alpha(fg in foreground()) {
                    let mask = compute_mask(&fg, 0);
                    for (x, y, px) in fg.enumerate_pixels() {
                        prop_assert_eq!(mask.contains_xy(x, y), px[3] > 0);
                    }
                }

                /// compute_mask: dilation never shrinks the mask
                #[test]
                fn monotonic_in_margin(fg in foreground(), margin in 0u32..5) {
                    let smaller = compute_mask(&fg, margin);
                    let larger = compute_mask(&fg, margin + 1);
                    for idx in smaller.iter() {
                        prop_assert!(larger.contains(idx));
                    }
                }
            }
        }
    }
}
