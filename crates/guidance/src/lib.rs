//! Edge-preserving guided filtering of single-channel float images.
//!
//! ```
//! use guidance::image::Image;
//! use guidance::imgproc::filter::guided_filter;
//!
//! let image = Image::from_size_val([8, 8].into(), 0.5f32).unwrap();
//! let mut smoothed = Image::from_size_val(image.size(), 0.0).unwrap();
//!
//! guided_filter(&image, &image, &mut smoothed, 2, 0.05).unwrap();
//! ```

#[doc(inline)]
pub use guidance_image as image;

#[doc(inline)]
pub use guidance_imgproc as imgproc;
