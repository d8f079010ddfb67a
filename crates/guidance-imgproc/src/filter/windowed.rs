use guidance_image::{Image, ImageError};
use num_traits::Float;

use crate::parallel::{self, ExecutionStrategy};

/// Check that a window of half-width `radius` fits an axis of length `len`.
///
/// A valid radius is non-zero and leaves `2 * radius + 1 <= len`.
pub(crate) fn check_radius(radius: usize, len: usize) -> Result<(), ImageError> {
    // same as `2 * radius + 1 > len` without overflowing
    if radius == 0 || len == 0 || radius > (len - 1) / 2 {
        return Err(ImageError::InvalidRadius(radius, len));
    }
    Ok(())
}

/// Rows of the prefix-sum table whose difference is the window sum at row `i`.
///
/// Returns the upper row and, unless the window starts at row 0, the row to subtract.
fn window_bounds(i: usize, radius: usize, len: usize) -> (usize, Option<usize>) {
    if i <= radius {
        // top border: rows 0..=i+radius
        (i + radius, None)
    } else if i + radius < len {
        (i + radius, Some(i - radius - 1))
    } else {
        // bottom border: rows i-radius..len
        (len - 1, Some(i - radius - 1))
    }
}

/// Sum the values inside a vertical window around every pixel.
///
/// For every row `i` the output holds the sum over rows `i - radius ..= i + radius`
/// of the same column, with the window clipped at the first and last row. The
/// sums are read off a prefix-sum table, so the cost does not depend on `radius`.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W).
/// * `dst` - The destination image with shape (H, W).
/// * `radius` - Half-width of the window; the full window spans `2 * radius + 1` rows.
///
/// # Errors
///
/// * [`ImageError::InvalidImageSize`] if `src` and `dst` differ in size.
/// * [`ImageError::InvalidRadius`] if `radius` is zero or `2 * radius + 1 > H`.
///
/// # Example
///
/// ```
/// use guidance_image::Image;
/// use guidance_imgproc::filter::windowed_sum;
///
/// let src = Image::new([1, 5].into(), vec![1.0f32, 2.0, 3.0, 4.0, 5.0]).unwrap();
/// let mut dst = Image::from_size_val(src.size(), 0.0).unwrap();
///
/// windowed_sum(&src, &mut dst, 1).unwrap();
///
/// assert_eq!(dst.as_slice(), &[3.0, 6.0, 9.0, 12.0, 9.0]);
/// ```
pub fn windowed_sum<T>(src: &Image<T>, dst: &mut Image<T>, radius: usize) -> Result<(), ImageError>
where
    T: Float + Send + Sync,
{
    windowed_sum_with_strategy(src, dst, radius, ExecutionStrategy::Auto)
}

/// Sum the values inside a vertical window around every pixel with execution strategy control.
///
/// See [`windowed_sum`]. The prefix sums are accumulated sequentially down the rows;
/// the window differences of each output row are independent and follow `strategy`.
pub fn windowed_sum_with_strategy<T>(
    src: &Image<T>,
    dst: &mut Image<T>,
    radius: usize,
    strategy: ExecutionStrategy,
) -> Result<(), ImageError>
where
    T: Float + Send + Sync,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            dst.cols(),
            dst.rows(),
            src.cols(),
            src.rows(),
        ));
    }

    let rows = src.rows();
    let cols = src.cols();
    check_radius(radius, rows)?;

    // cumulative[r] = src[0] + ... + src[r], row by row
    let mut cumulative = src.as_slice().to_vec();
    for r in 1..rows {
        let (prev, cur) = cumulative.split_at_mut(r * cols);
        cur[..cols]
            .iter_mut()
            .zip(prev[(r - 1) * cols..].iter())
            .for_each(|(c, &p)| *c = *c + p);
    }

    let cumulative = cumulative.as_slice();
    parallel::for_each_row_mut(dst, strategy, |i, dst_row| {
        let (upper, lower) = window_bounds(i, radius, rows);
        let upper_row = &cumulative[upper * cols..(upper + 1) * cols];
        match lower {
            Some(lower) => {
                let lower_row = &cumulative[lower * cols..(lower + 1) * cols];
                dst_row
                    .iter_mut()
                    .zip(upper_row.iter().zip(lower_row.iter()))
                    .for_each(|(d, (&u, &l))| *d = u - l);
            }
            None => dst_row.copy_from_slice(upper_row),
        }
    });

    Ok(())
}
