use argh::FromArgs;
use std::path::PathBuf;

use guidance::image::{ops, Image, ImageSize};
use guidance::imgproc;

#[derive(FromArgs)]
/// Smooth a grayscale image with a self-guided filter and save it next to the original
struct Args {
    /// path to the input image
    #[argh(option, short = 'i')]
    image_path: PathBuf,

    /// path to the side-by-side output image
    #[argh(option, short = 'o', default = "PathBuf::from(\"guided_filter.png\")")]
    output: PathBuf,

    /// half-width of the filter window
    #[argh(option, default = "5")]
    radius: usize,

    /// regularization; larger values smooth across more edges
    #[argh(option, default = "0.05")]
    epsilon: f32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    // decode and convert to grayscale
    let gray = image::open(&args.image_path)?.to_luma8();
    let size = ImageSize {
        width: gray.width() as usize,
        height: gray.height() as usize,
    };
    log::info!("Loaded {} with {}", args.image_path.display(), size);

    let img_u8 = Image::new(size, gray.into_raw())?;
    let img_f32 = ops::cast_and_scale(&img_u8, 1f32 / 255.)?;

    // the image guides itself
    let mut filtered = Image::from_size_val(size, 0f32)?;
    imgproc::filter::guided_filter(
        &img_f32,
        &img_f32,
        &mut filtered,
        args.radius,
        args.epsilon,
    )?;
    log::info!(
        "Filtered with radius {} and epsilon {}",
        args.radius,
        args.epsilon
    );

    // original on the left, result on the right
    let side_by_side = ops::hconcat(&img_f32, &filtered)?;

    let (width, height) = (side_by_side.width() as u32, side_by_side.height() as u32);

    // the filter does not clamp, so clamp only for display
    let pixels = side_by_side
        .into_vec()
        .into_iter()
        .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect::<Vec<_>>();

    let output = image::GrayImage::from_raw(width, height, pixels)
    .ok_or("output buffer does not match the image size")?;
    output.save(&args.output)?;

    log::info!("Saved {}", args.output.display());

    Ok(())
}
