use rayon::prelude::*;

use guidance_image::Image;

/// Images with at least this many pixels run in parallel under [`ExecutionStrategy::Auto`].
pub const AUTO_PARALLEL_MIN_PIXELS: usize = 100_000;

/// Controls how row-wise operations are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// Run sequentially on the current thread.
    ///
    /// Useful for small images, debugging, or when the overhead of parallelization
    /// outweighs the benefits.
    Serial,

    /// Use the global Rayon thread pool to process rows in parallel.
    Parallel,

    /// Pick [`ExecutionStrategy::Parallel`] for images of at least
    /// [`AUTO_PARALLEL_MIN_PIXELS`] pixels, [`ExecutionStrategy::Serial`] otherwise.
    #[default]
    Auto,
}

impl ExecutionStrategy {
    /// Whether an image with `num_pixels` pixels should be processed in parallel.
    pub fn is_parallel(&self, num_pixels: usize) -> bool {
        match self {
            ExecutionStrategy::Serial => false,
            ExecutionStrategy::Parallel => true,
            ExecutionStrategy::Auto => num_pixels >= AUTO_PARALLEL_MIN_PIXELS,
        }
    }
}

/// Apply a function to every row of the image, passing the row index.
pub fn for_each_row_mut<T>(
    dst: &mut Image<T>,
    strategy: ExecutionStrategy,
    f: impl Fn(usize, &mut [T]) + Send + Sync,
) where
    T: Send + Sync,
{
    let cols = dst.cols().max(1);
    let parallel = strategy.is_parallel(dst.size().num_pixels());
    let dst_data = dst.as_slice_mut();

    if parallel {
        dst_data
            .par_chunks_exact_mut(cols)
            .enumerate()
            .for_each(|(r, row)| f(r, row));
    } else {
        dst_data
            .chunks_exact_mut(cols)
            .enumerate()
            .for_each(|(r, row)| f(r, row));
    }
}

/// Apply a function to each pixel of `src` and the matching pixel of `dst`.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
pub fn iter_rows_val<T1, T2>(
    src: &Image<T1>,
    dst: &mut Image<T2>,
    strategy: ExecutionStrategy,
    f: impl Fn(&T1, &mut T2) + Send + Sync,
) where
    T1: Send + Sync,
    T2: Send + Sync,
{
    let cols = src.cols().max(1);
    let parallel = strategy.is_parallel(src.size().num_pixels());

    if parallel {
        src.as_slice()
            .par_chunks_exact(cols)
            .zip(dst.as_slice_mut().par_chunks_exact_mut(cols))
            .for_each(|(src_chunk, dst_chunk)| {
                src_chunk
                    .iter()
                    .zip(dst_chunk.iter_mut())
                    .for_each(|(src_pixel, dst_pixel)| f(src_pixel, dst_pixel));
            });
    } else {
        src.as_slice()
            .iter()
            .zip(dst.as_slice_mut().iter_mut())
            .for_each(|(src_pixel, dst_pixel)| f(src_pixel, dst_pixel));
    }
}

/// Apply a function to each pixel pair of `src1` and `src2`, writing into `dst`.
///
/// PRECONDITION: `src1`, `src2` and `dst` must have the same shape.
pub fn iter_rows_val_two<T1, T2, T3>(
    src1: &Image<T1>,
    src2: &Image<T2>,
    dst: &mut Image<T3>,
    strategy: ExecutionStrategy,
    f: impl Fn(&T1, &T2, &mut T3) + Send + Sync,
) where
    T1: Send + Sync,
    T2: Send + Sync,
    T3: Send + Sync,
{
    let cols = src1.cols().max(1);
    let parallel = strategy.is_parallel(src1.size().num_pixels());

    if parallel {
        src1.as_slice()
            .par_chunks_exact(cols)
            .zip(src2.as_slice().par_chunks_exact(cols))
            .zip(dst.as_slice_mut().par_chunks_exact_mut(cols))
            .for_each(|((src1_chunk, src2_chunk), dst_chunk)| {
                src1_chunk
                    .iter()
                    .zip(src2_chunk.iter())
                    .zip(dst_chunk.iter_mut())
                    .for_each(|((src1_pixel, src2_pixel), dst_pixel)| {
                        f(src1_pixel, src2_pixel, dst_pixel);
                    });
            });
    } else {
        src1.as_slice()
            .iter()
            .zip(src2.as_slice().iter())
            .zip(dst.as_slice_mut().iter_mut())
            .for_each(|((src1_pixel, src2_pixel), dst_pixel)| {
                f(src1_pixel, src2_pixel, dst_pixel);
            });
    }
}
