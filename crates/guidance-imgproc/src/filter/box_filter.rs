use guidance_image::{ops::transpose, Image, ImageError, ImageSize};
use num_traits::Float;

use super::windowed::{check_radius, windowed_sum_with_strategy};
use crate::parallel::{self, ExecutionStrategy};

/// Sum the values inside a square window around every pixel.
///
/// The window spans `2 * radius + 1` pixels along each axis and is clipped at the
/// image border, so border pixels sum over fewer samples. The vertical pass runs
/// on `src`, the horizontal pass runs on the transposed intermediate, and the
/// result is transposed back. The cost is O(H * W) for any radius.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W).
/// * `dst` - The destination image with shape (H, W).
/// * `radius` - Half-width of the square window.
///
/// # Errors
///
/// * [`ImageError::InvalidImageSize`] if `src` and `dst` differ in size.
/// * [`ImageError::InvalidRadius`] if the window does not fit either dimension.
///
/// # Example
///
/// ```
/// use guidance_image::Image;
/// use guidance_imgproc::filter::box_sum;
///
/// let src = Image::from_size_val([4, 4].into(), 1.0f32).unwrap();
/// let mut dst = Image::from_size_val(src.size(), 0.0).unwrap();
///
/// box_sum(&src, &mut dst, 1).unwrap();
///
/// assert_eq!(dst.get_pixel(0, 0).unwrap(), 4.0);
/// assert_eq!(dst.get_pixel(1, 1).unwrap(), 9.0);
/// ```
pub fn box_sum<T>(src: &Image<T>, dst: &mut Image<T>, radius: usize) -> Result<(), ImageError>
where
    T: Float + Send + Sync,
{
    box_sum_with_strategy(src, dst, radius, ExecutionStrategy::Auto)
}

/// Sum the values inside a square window around every pixel with execution strategy control.
///
/// See [`box_sum`].
pub fn box_sum_with_strategy<T>(
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
    check_radius(radius, src.rows())?;
    check_radius(radius, src.cols())?;

    let mut vertical = Image::from_size_val(src.size(), T::zero())?;
    windowed_sum_with_strategy(src, &mut vertical, radius, strategy)?;

    let mut transposed = Image::from_size_val(src.size().transposed(), T::zero())?;
    transpose(&vertical, &mut transposed)?;

    let mut horizontal = Image::from_size_val(transposed.size(), T::zero())?;
    windowed_sum_with_strategy(&transposed, &mut horizontal, radius, strategy)?;

    transpose(&horizontal, dst)
}

/// Count the pixels contributing to the clipped window of every pixel.
///
/// This is the box sum of an all-ones image; interior pixels count
/// `(2 * radius + 1)^2`, corners `(radius + 1)^2`.
pub fn window_count<T>(
    size: ImageSize,
    radius: usize,
    strategy: ExecutionStrategy,
) -> Result<Image<T>, ImageError>
where
    T: Float + Send + Sync,
{
    let ones = Image::from_size_val(size, T::one())?;
    let mut count = Image::from_size_val(size, T::zero())?;
    box_sum_with_strategy(&ones, &mut count, radius, strategy)?;
    Ok(count)
}

/// Divide every pixel of `sums` by the matching window count, in place.
pub(crate) fn normalize_by_count<T>(
    count: &Image<T>,
    sums: &mut Image<T>,
    strategy: ExecutionStrategy,
) where
    T: Float + Send + Sync,
{
    parallel::iter_rows_val(count, sums, strategy, |&n, s| *s = *s / n);
}

/// Average the values inside a square window around every pixel.
///
/// Same window as [`box_sum`], normalized by the number of pixels actually
/// inside the clipped window, so border pixels are true local means.
///
/// # Example
///
/// ```
/// use guidance_image::Image;
/// use guidance_imgproc::filter::box_mean;
///
/// let src = Image::from_size_val([5, 5].into(), 0.25f32).unwrap();
/// let mut dst = Image::from_size_val(src.size(), 0.0).unwrap();
///
/// box_mean(&src, &mut dst, 1).unwrap();
///
/// assert!(dst.as_slice().iter().all(|&v| (v - 0.25).abs() < 1e-6));
/// ```
pub fn box_mean<T>(src: &Image<T>, dst: &mut Image<T>, radius: usize) -> Result<(), ImageError>
where
    T: Float + Send + Sync,
{
    box_mean_with_strategy(src, dst, radius, ExecutionStrategy::Auto)
}

/// Average the values inside a square window around every pixel with execution strategy control.
///
/// See [`box_mean`].
pub fn box_mean_with_strategy<T>(
    src: &Image<T>,
    dst: &mut Image<T>,
    radius: usize,
    strategy: ExecutionStrategy,
) -> Result<(), ImageError>
where
    T: Float + Send + Sync,
{
    box_sum_with_strategy(src, dst, radius, strategy)?;
    let count = window_count(src.size(), radius, strategy)?;
    normalize_by_count(&count, dst, strategy);
    Ok(())
}
