/// An error type for image containers and the filters operating on them.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when the data length does not match the image size.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when the source and destination sizes do not match.
    #[error("Image size ({0}x{1}) does not match the expected size ({2}x{3})")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when the guide and the input image sizes differ.
    #[error("Guide size ({0}x{1}) does not match the input size ({2}x{3})")]
    ShapeMismatch(usize, usize, usize, usize),

    /// Error when the window radius is zero or the window does not fit the axis.
    #[error("Invalid radius {0}: window 2*radius+1 must not exceed the axis length {1}")]
    InvalidRadius(usize, usize),

    /// Error when the regularizer is not strictly positive.
    #[error("Invalid epsilon {0}: must be strictly positive")]
    InvalidEpsilon(f64),

    /// Error when the pixel coordinates are out of bounds.
    #[error("Pixel coordinates ({0}, {1}) are out of bounds ({2}, {3})")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when a value cannot be cast to the target type.
    #[error("Failed to cast image data to {0}")]
    CastError(String),
}
