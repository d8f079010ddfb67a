use crate::{Image, ImageError};

// side of the square tiles used by `transpose`
const TRANSPOSE_BLOCK: usize = 32;

/// Convert an image to another pixel type and multiply every value by `scale`.
///
/// Typical use is bringing 8-bit data into `[0, 1]` floats before filtering.
///
/// # Errors
///
/// Returns [`ImageError::CastError`] if a value cannot be represented in `U`.
///
/// # Example
///
/// ```
/// use guidance_image::Image;
/// use guidance_image::ops::cast_and_scale;
///
/// let bytes = Image::new([2, 1].into(), vec![0u8, 255]).unwrap();
/// let unit = cast_and_scale(&bytes, 1.0f32 / 255.0).unwrap();
///
/// assert_eq!(unit.as_slice(), &[0.0, 1.0]);
/// ```
pub fn cast_and_scale<T, U>(src: &Image<T>, scale: U) -> Result<Image<U>, ImageError>
where
    T: Copy + num_traits::NumCast,
    U: Copy + num_traits::NumCast + std::ops::MulAssign,
{
    let mut dst = src.cast::<U>()?;
    dst.as_slice_mut().iter_mut().for_each(|v| *v *= scale);
    Ok(dst)
}

/// Swap the two axes of an image.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W).
/// * `dst` - The destination image with shape (W, H).
///
/// The copy walks the image in square tiles so that both the reads and the
/// writes stay within a few cache lines.
pub fn transpose<T: Copy>(src: &Image<T>, dst: &mut Image<T>) -> Result<(), ImageError> {
    let expected = src.size().transposed();
    if dst.size() != expected {
        return Err(ImageError::InvalidImageSize(
            dst.width(),
            dst.height(),
            expected.width,
            expected.height,
        ));
    }

    let rows = src.rows();
    let cols = src.cols();
    let src_data = src.as_slice();
    let dst_data = dst.as_slice_mut();

    for r0 in (0..rows).step_by(TRANSPOSE_BLOCK) {
        let r1 = (r0 + TRANSPOSE_BLOCK).min(rows);
        for c0 in (0..cols).step_by(TRANSPOSE_BLOCK) {
            let c1 = (c0 + TRANSPOSE_BLOCK).min(cols);
            for r in r0..r1 {
                for c in c0..c1 {
                    dst_data[c * rows + r] = src_data[r * cols + c];
                }
            }
        }
    }

    Ok(())
}

/// Concatenate two images side by side.
///
/// The result has the common height and the summed width, with `left`
/// occupying the first columns.
///
/// # Errors
///
/// Returns [`ImageError::InvalidImageSize`] if the heights differ.
pub fn hconcat<T: Copy>(left: &Image<T>, right: &Image<T>) -> Result<Image<T>, ImageError> {
    if left.height() != right.height() {
        return Err(ImageError::InvalidImageSize(
            right.width(),
            right.height(),
            right.width(),
            left.height(),
        ));
    }

    let mut data = Vec::with_capacity(left.size().num_pixels() + right.size().num_pixels());
    for (left_row, right_row) in left.rows_iter().zip(right.rows_iter()) {
        data.extend_from_slice(left_row);
        data.extend_from_slice(right_row);
    }

    Image::new([left.width() + right.width(), left.height()].into(), data)
}
