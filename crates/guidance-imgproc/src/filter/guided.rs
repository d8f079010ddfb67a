// reference: K. He, J. Sun, X. Tang, "Guided Image Filtering", ECCV 2010
use guidance_image::{Image, ImageError};
use num_traits::Float;

use super::box_filter::{box_sum_with_strategy, normalize_by_count, window_count};
use super::windowed::check_radius;
use crate::parallel::{self, ExecutionStrategy};

/// Smooth `input` while keeping the edges present in `guide`.
///
/// Every window of side `2 * radius + 1` fits a linear model `input ≈ a * guide + b`
/// by least squares, regularized by `epsilon`. The coefficients of all windows
/// covering a pixel are averaged and applied to the guide at that pixel. Where the
/// guide is flat the result falls back to the local mean of `input`; where it has
/// strong edges the output follows them. The output is not clamped.
///
/// # Arguments
///
/// * `guide` - The guide image with shape (H, W). May be `input` itself.
/// * `input` - The image to filter with shape (H, W).
/// * `dst` - The destination image with shape (H, W).
/// * `radius` - Half-width of the square window.
/// * `epsilon` - Regularizer; larger values smooth more and preserve fewer edges.
///
/// # Errors
///
/// Validation happens before any filtering:
///
/// * [`ImageError::ShapeMismatch`] if `guide` and `input` differ in size.
/// * [`ImageError::InvalidImageSize`] if `dst` differs from `input` in size.
/// * [`ImageError::InvalidEpsilon`] if `epsilon` is not strictly positive.
/// * [`ImageError::InvalidRadius`] if the window does not fit either dimension.
///
/// # Example
///
/// ```
/// use guidance_image::Image;
/// use guidance_imgproc::filter::guided_filter;
///
/// let image = Image::from_size_val([7, 7].into(), 1.0f32).unwrap();
/// let mut dst = Image::from_size_val(image.size(), 0.0).unwrap();
///
/// guided_filter(&image, &image, &mut dst, 2, 0.01).unwrap();
///
/// assert!(dst.as_slice().iter().all(|&v| (v - 1.0).abs() < 1e-6));
/// ```
pub fn guided_filter<T>(
    guide: &Image<T>,
    input: &Image<T>,
    dst: &mut Image<T>,
    radius: usize,
    epsilon: T,
) -> Result<(), ImageError>
where
    T: Float + Send + Sync,
{
    guided_filter_with_strategy(guide, input, dst, radius, epsilon, ExecutionStrategy::Auto)
}

/// Smooth `input` while keeping the edges present in `guide`, with execution strategy control.
///
/// See [`guided_filter`]. Both the box sums and the per-pixel arithmetic follow `strategy`.
pub fn guided_filter_with_strategy<T>(
    guide: &Image<T>,
    input: &Image<T>,
    dst: &mut Image<T>,
    radius: usize,
    epsilon: T,
    strategy: ExecutionStrategy,
) -> Result<(), ImageError>
where
    T: Float + Send + Sync,
{
    if guide.size() != input.size() {
        return Err(ImageError::ShapeMismatch(
            guide.cols(),
            guide.rows(),
            input.cols(),
            input.rows(),
        ));
    }

    if dst.size() != input.size() {
        return Err(ImageError::InvalidImageSize(
            dst.cols(),
            dst.rows(),
            input.cols(),
            input.rows(),
        ));
    }

    if epsilon.is_nan() || epsilon <= T::zero() {
        return Err(ImageError::InvalidEpsilon(
            epsilon.to_f64().unwrap_or(f64::NAN),
        ));
    }

    check_radius(radius, input.rows())?;
    check_radius(radius, input.cols())?;

    log::debug!(
        "guided filter: size={} radius={} epsilon={} strategy={:?}",
        input.size(),
        radius,
        epsilon.to_f64().unwrap_or(f64::NAN),
        strategy
    );

    let count = window_count(input.size(), radius, strategy)?;
    let box_mean = |src: &Image<T>| -> Result<Image<T>, ImageError> {
        let mut mean = Image::from_size_val(src.size(), T::zero())?;
        box_sum_with_strategy(src, &mut mean, radius, strategy)?;
        normalize_by_count(&count, &mut mean, strategy);
        Ok(mean)
    };

    let mean_guide = box_mean(guide)?;
    let mean_input = box_mean(input)?;
    let mean_guide_input = box_mean(&product(guide, input, strategy)?)?;
    let mean_squared_guide = box_mean(&product(guide, guide, strategy)?)?;

    // cov(guide, input) = E[guide * input] - E[guide] * E[input]
    let mut covariance = mean_guide_input;
    parallel::iter_rows_val_two(
        &mean_guide,
        &mean_input,
        &mut covariance,
        strategy,
        |&g, &p, c| *c = *c - g * p,
    );

    // var(guide) = E[guide^2] - E[guide]^2
    let mut variance = mean_squared_guide;
    parallel::iter_rows_val(&mean_guide, &mut variance, strategy, |&g, v| {
        *v = *v - g * g
    });

    // a = cov / (var + epsilon)
    let mut a = covariance;
    parallel::iter_rows_val(&variance, &mut a, strategy, |&v, a| *a = *a / (v + epsilon));

    // b = E[input] - a * E[guide]
    let mut b = mean_input;
    parallel::iter_rows_val_two(&a, &mean_guide, &mut b, strategy, |&a, &g, b| {
        *b = *b - a * g
    });

    let mean_a = box_mean(&a)?;
    let mean_b = box_mean(&b)?;

    parallel::iter_rows_val_two(&mean_a, guide, dst, strategy, |&a, &g, d| *d = a * g);
    parallel::iter_rows_val(&mean_b, dst, strategy, |&b, d| *d = *d + b);

    Ok(())
}

/// Elementwise product of two images of the same size.
fn product<T>(
    src1: &Image<T>,
    src2: &Image<T>,
    strategy: ExecutionStrategy,
) -> Result<Image<T>, ImageError>
where
    T: Float + Send + Sync,
{
    let mut dst = Image::from_size_val(src1.size(), T::zero())?;
    parallel::iter_rows_val_two(src1, src2, &mut dst, strategy, |&x, &y, d| *d = x * y);
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::box_mean;
    use approx::assert_abs_diff_eq;
    use guidance_image::ImageSize;

    #[test]
    fn test_guided_filter_constant() -> Result<(), ImageError> {
        let image = Image::from_size_val([7, 7].into(), 1.0f32)?;
        let mut dst = Image::from_size_val(image.size(), 0.0)?;
        guided_filter(&image, &image, &mut dst, 2, 0.01)?;

        assert_eq!(dst.size(), image.size());
        for &v in dst.as_slice() {
            assert_abs_diff_eq!(v, 1.0, epsilon = 1e-6);
        }
        Ok(())
    }

    /// Direct per-window least squares, without prefix sums.
    fn reference_guided_filter(
        guide: &Image<f64>,
        input: &Image<f64>,
        radius: usize,
        epsilon: f64,
    ) -> Vec<f64> {
        let (rows, cols) = (guide.rows(), guide.cols());
        let window = |y: usize, x: usize| {
            let ys = y.saturating_sub(radius)..=(y + radius).min(rows - 1);
            let xs = x.saturating_sub(radius)..=(x + radius).min(cols - 1);
            ys.flat_map(move |yy| xs.clone().map(move |xx| yy * cols + xx))
                .collect::<Vec<_>>()
        };

        let g = guide.as_slice();
        let p = input.as_slice();
        let mut a = vec![0.0; rows * cols];
        let mut b = vec![0.0; rows * cols];
        for y in 0..rows {
            for x in 0..cols {
                let idx = window(y, x);
                let n = idx.len() as f64;
                let mg = idx.iter().map(|&k| g[k]).sum::<f64>() / n;
                let mp = idx.iter().map(|&k| p[k]).sum::<f64>() / n;
                let cov = idx.iter().map(|&k| (g[k] - mg) * (p[k] - mp)).sum::<f64>() / n;
                let var = idx.iter().map(|&k| (g[k] - mg).powi(2)).sum::<f64>() / n;
                a[y * cols + x] = cov / (var + epsilon);
                b[y * cols + x] = mp - a[y * cols + x] * mg;
            }
        }

        let mut out = vec![0.0; rows * cols];
        for y in 0..rows {
            for x in 0..cols {
                let idx = window(y, x);
                let n = idx.len() as f64;
                let ma = idx.iter().map(|&k| a[k]).sum::<f64>() / n;
                let mb = idx.iter().map(|&k| b[k]).sum::<f64>() / n;
                out[y * cols + x] = ma * g[y * cols + x] + mb;
            }
        }
        out
    }

    #[test]
    fn test_guided_filter_impulse_matches_reference() -> Result<(), ImageError> {
        let mut image = Image::from_size_val([5, 5].into(), 0.0f64)?;
        image.set_pixel(2, 2, 10.0)?;

        let mut dst = Image::from_size_val(image.size(), 0.0)?;
        guided_filter(&image, &image, &mut dst, 1, 1.0)?;

        let expected = reference_guided_filter(&image, &image, 1, 1.0);
        for (&got, &want) in dst.as_slice().iter().zip(expected.iter()) {
            assert_abs_diff_eq!(got, want, epsilon = 1e-9);
        }

        // the local variance around the impulse (~9.9) dominates epsilon, so the
        // peak survives far above the plain box mean of 10 / 9
        let mut blurred = Image::from_size_val(image.size(), 0.0)?;
        box_mean(&image, &mut blurred, 1)?;
        assert!(dst.get_pixel(2, 2)? > 8.0);
        assert_abs_diff_eq!(blurred.get_pixel(2, 2)?, 10.0 / 9.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_guided_filter_random_matches_reference() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 8,
            height: 6,
        };
        let guide = Image::new(
            size,
            (0..size.num_pixels())
                .map(|i| ((i * 37) % 17) as f64 / 17.0)
                .collect(),
        )?;
        let input = Image::new(
            size,
            (0..size.num_pixels())
                .map(|i| ((i * 11) % 7) as f64 / 7.0)
                .collect(),
        )?;

        let mut dst = Image::from_size_val(size, 0.0)?;
        guided_filter(&guide, &input, &mut dst, 2, 0.05)?;

        let expected = reference_guided_filter(&guide, &input, 2, 0.05);
        for (&got, &want) in dst.as_slice().iter().zip(expected.iter()) {
            assert_abs_diff_eq!(got, want, epsilon = 1e-9);
        }
        Ok(())
    }

    #[test]
    fn test_guided_filter_flat_guide_is_double_box_mean() -> Result<(), ImageError> {
        let guide = Image::from_size_val([6, 6].into(), 0.3f64)?;
        let input = Image::new(
            [6, 6].into(),
            (0..36).map(|i| ((i * 5) % 9) as f64).collect(),
        )?;

        let mut dst = Image::from_size_val(input.size(), 0.0)?;
        guided_filter(&guide, &input, &mut dst, 1, 0.01)?;

        // zero guide variance gives a = 0 and b = local mean of the input
        let mut mean = Image::from_size_val(input.size(), 0.0)?;
        box_mean(&input, &mut mean, 1)?;
        let mut expected = Image::from_size_val(input.size(), 0.0)?;
        box_mean(&mean, &mut expected, 1)?;

        for (&got, &want) in dst.as_slice().iter().zip(expected.as_slice()) {
            assert_abs_diff_eq!(got, want, epsilon = 1e-9);
        }
        Ok(())
    }

    #[test]
    fn test_guided_filter_huge_epsilon_is_box_mean_of_means() -> Result<(), ImageError> {
        let data = (0..36).map(|i| ((i * 5) % 7) as f64).collect::<Vec<_>>();
        let image = Image::new([6, 6].into(), data)?;

        let mut dst = Image::from_size_val(image.size(), 0.0)?;
        guided_filter(&image, &image, &mut dst, 1, 1e12)?;

        // a -> 0, b -> local mean, then averaged once more
        let mut mean = Image::from_size_val(image.size(), 0.0)?;
        box_mean(&image, &mut mean, 1)?;
        let mut expected = Image::from_size_val(image.size(), 0.0)?;
        box_mean(&mean, &mut expected, 1)?;

        for (&got, &want) in dst.as_slice().iter().zip(expected.as_slice()) {
            assert_abs_diff_eq!(got, want, epsilon = 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_guided_filter_preserves_step_edge() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 10,
            height: 6,
        };
        let data = (0..size.num_pixels())
            .map(|i| if i % size.width < 5 { 0.0 } else { 1.0 })
            .collect::<Vec<f32>>();
        let image = Image::new(size, data)?;

        let mut dst = Image::from_size_val(size, 0.0)?;
        guided_filter(&image, &image, &mut dst, 2, 1e-4)?;

        let mut blurred = Image::from_size_val(size, 0.0)?;
        box_mean(&image, &mut blurred, 2)?;

        // next to the edge the guided result stays close to the step, the blur does not
        let guided_err = (dst.get_pixel(4, 3)? - 0.0).abs() + (dst.get_pixel(5, 3)? - 1.0).abs();
        let blur_err =
            (blurred.get_pixel(4, 3)? - 0.0).abs() + (blurred.get_pixel(5, 3)? - 1.0).abs();
        assert!(guided_err < 0.05, "guided error {guided_err}");
        assert!(blur_err > 0.5, "blur error {blur_err}");
        Ok(())
    }

    #[test]
    fn test_guided_filter_strategies_agree() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 12,
            height: 9,
        };
        let guide = Image::new(
            size,
            (0..size.num_pixels())
                .map(|i| ((i * 3) % 10) as f32 / 10.0)
                .collect(),
        )?;
        let input = Image::new(
            size,
            (0..size.num_pixels())
                .map(|i| ((i * 7) % 13) as f32 / 13.0)
                .collect(),
        )?;

        let mut serial = Image::from_size_val(size, 0.0)?;
        guided_filter_with_strategy(
            &guide,
            &input,
            &mut serial,
            2,
            0.05,
            ExecutionStrategy::Serial,
        )?;
        let mut parallel = Image::from_size_val(size, 0.0)?;
        guided_filter_with_strategy(
            &guide,
            &input,
            &mut parallel,
            2,
            0.05,
            ExecutionStrategy::Parallel,
        )?;

        assert_eq!(serial, parallel);
        Ok(())
    }

    #[test]
    fn test_guided_filter_window_spans_image() -> Result<(), ImageError> {
        let image = Image::from_size_val([5, 5].into(), 1.0f32)?;
        let mut dst = Image::from_size_val(image.size(), 0.0)?;
        guided_filter(&image, &image, &mut dst, 2, 0.01)?;

        for &v in dst.as_slice() {
            assert_abs_diff_eq!(v, 1.0, epsilon = 1e-6);
        }

        let image = Image::from_size_val([7, 7].into(), 0.25f64)?;
        let mut dst = Image::from_size_val(image.size(), 0.0)?;
        guided_filter(&image, &image, &mut dst, 3, 0.01)?;
        assert_eq!(dst.size(), image.size());
        for &v in dst.as_slice() {
            assert_abs_diff_eq!(v, 0.25, epsilon = 1e-9);
        }
        Ok(())
    }

    #[test]
    fn test_guided_filter_errors() -> Result<(), ImageError> {
        let guide = Image::from_size_val([6, 6].into(), 0.5f32)?;
        let input = Image::from_size_val([6, 6].into(), 0.5f32)?;
        let mut dst = Image::from_size_val(input.size(), 0.0)?;

        let other = Image::from_size_val([6, 7].into(), 0.5f32)?;
        assert_eq!(
            guided_filter(&other, &input, &mut dst, 1, 0.1),
            Err(ImageError::ShapeMismatch(6, 7, 6, 6))
        );

        let mut small = Image::from_size_val([5, 5].into(), 0.0f32)?;
        assert_eq!(
            guided_filter(&guide, &input, &mut small, 1, 0.1),
            Err(ImageError::InvalidImageSize(5, 5, 6, 6))
        );

        assert_eq!(
            guided_filter(&guide, &input, &mut dst, 1, 0.0),
            Err(ImageError::InvalidEpsilon(0.0))
        );
        assert_eq!(
            guided_filter(&guide, &input, &mut dst, 1, -1.0),
            Err(ImageError::InvalidEpsilon(-1.0))
        );
        assert!(matches!(
            guided_filter(&guide, &input, &mut dst, 1, f32::NAN),
            Err(ImageError::InvalidEpsilon(_))
        ));

        assert_eq!(
            guided_filter(&guide, &input, &mut dst, 0, 0.1),
            Err(ImageError::InvalidRadius(0, 6))
        );
        assert_eq!(
            guided_filter(&guide, &input, &mut dst, 3, 0.1),
            Err(ImageError::InvalidRadius(3, 6))
        );

        // nothing was written on failure
        assert!(dst.as_slice().iter().all(|&v| v == 0.0));
        Ok(())
    }
}
