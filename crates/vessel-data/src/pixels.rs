//! Resampling helpers for the augmentation stage.
//!
//! Everything here works on 8-bit `image` buffers of any channel count, so the
//! same routine serves the single-channel label/mask planes and the RGB image.

use image::{ImageBuffer, Pixel};

/// An 8-bit plane with pixel type `P`
pub type Plane<P> = ImageBuffer<P, Vec<u8>>;

/// Maps an out-of-range index back into `[0, n)` by mirroring about the edge
/// pixels without repeating them (`... 2 1 | 0 1 2 ... n-1 | n-2 ...`).
#[inline]
pub fn reflect_index(i: i64, n: u32) -> u32 {
    if n <= 1 {
        return 0;
    }
    let n = n as i64;
    let period = 2 * (n - 1);
    let m = i.rem_euclid(period);
    (if m >= n { period - m } else { m }) as u32
}

/// Resamples `src` into a `width x height` plane.
///
/// `map` takes an output coordinate `(x, y)` and returns the source position to
/// sample. Sampling is bilinear; positions outside the source are reflected.
pub fn warp<P, F>(src: &Plane<P>, width: u32, height: u32, map: F) -> Plane<P>
where
    P: Pixel<Subpixel = u8>,
    F: Fn(f32, f32) -> (f32, f32),
{
    let channels = P::CHANNEL_COUNT as usize;
    let (sw, sh) = src.dimensions();
    let raw = src.as_raw();
    let stride = sw as usize * channels;

    let mut out: Plane<P> = ImageBuffer::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let (sx, sy) = map(x as f32, y as f32);
        let x0 = sx.floor();
        let y0 = sy.floor();
        let fx = sx - x0;
        let fy = sy - y0;

        let xa = reflect_index(x0 as i64, sw) as usize * channels;
        let xb = reflect_index(x0 as i64 + 1, sw) as usize * channels;
        let ya = reflect_index(y0 as i64, sh) as usize * stride;
        let yb = reflect_index(y0 as i64 + 1, sh) as usize * stride;

        for (c, value) in pixel.channels_mut().iter_mut().enumerate() {
            let p00 = raw[ya + xa + c] as f32;
            let p10 = raw[ya + xb + c] as f32;
            let p01 = raw[yb + xa + c] as f32;
            let p11 = raw[yb + xb + c] as f32;
            let v = (1.0 - fx) * (1.0 - fy) * p00
                + fx * (1.0 - fy) * p10
                + (1.0 - fx) * fy * p01
                + fx * fy * p11;
            *value = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Scales a plane by `factor` on both axes.
///
/// Output size is `round(dim * factor)`, at least one pixel.
pub fn rescale<P>(src: &Plane<P>, factor: f32) -> Plane<P>
where
    P: Pixel<Subpixel = u8>,
{
    let (w, h) = src.dimensions();
    let scaled = |d: u32| ((d as f32 * factor).round() as u32).max(1);
    let (nw, nh) = (scaled(w), scaled(h));
    let sx = w as f32 / nw as f32;
    let sy = h as f32 / nh as f32;
    warp(src, nw, nh, |x, y| ((x + 0.5) * sx - 0.5, (y + 0.5) * sy - 0.5))
}

/// Rotates a plane counter-clockwise by `degrees` about its centre, keeping
/// its size.
pub fn rotate<P>(src: &Plane<P>, degrees: f32) -> Plane<P>
where
    P: Pixel<Subpixel = u8>,
{
    let (w, h) = src.dimensions();
    let cx = (w as f32 - 1.0) / 2.0;
    let cy = (h as f32 - 1.0) / 2.0;
    let (sin, cos) = degrees.to_radians().sin_cos();
    warp(src, w, h, |x, y| {
        let dx = x - cx;
        let dy = y - cy;
        (cx + dx * cos - dy * sin, cy + dx * sin + dy * cos)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn gradient(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| Luma([(x * 10 + y) as u8]))
    }

    #[test]
    fn test_reflect_index() {
        assert_eq!(reflect_index(-1, 5), 1);
        assert_eq!(reflect_index(-2, 5), 2);
        assert_eq!(reflect_index(0, 5), 0);
        assert_eq!(reflect_index(4, 5), 4);
        assert_eq!(reflect_index(5, 5), 3);
        assert_eq!(reflect_index(6, 5), 2);
        assert_eq!(reflect_index(7, 1), 0);
    }

    #[test]
    fn test_identity_warp() {
        let img = gradient(8, 6);
        let warped = warp(&img, 8, 6, |x, y| (x, y));
        assert_eq!(warped, img);
    }

    #[test]
    fn test_rescale_dimensions() {
        let img = gradient(20, 10);
        assert_eq!(rescale(&img, 0.7).dimensions(), (14, 7));
        assert_eq!(rescale(&img, 1.2).dimensions(), (24, 12));
        assert_eq!(rescale(&img, 1.0), img);
    }

    #[test]
    fn test_rotate_zero_is_identity() {
        let img = gradient(9, 7);
        assert_eq!(rotate(&img, 0.0), img);
    }

    #[test]
    fn test_rotate_90_counter_clockwise() {
        // a bright pixel right of centre ends up above centre
        let mut img = GrayImage::new(5, 5);
        img.put_pixel(4, 2, Luma([255]));
        let rotated = rotate(&img, 90.0);
        assert_eq!(rotated.dimensions(), (5, 5));
        assert_eq!(rotated.get_pixel(2, 0)[0], 255);
        assert_eq!(rotated.get_pixel(4, 2)[0], 0);
    }
}
