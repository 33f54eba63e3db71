use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Failed to decode {key}: {message}")]
    Decode { key: String, message: String },
    #[error("Pixel buffer {width}x{height} needs {expected} bytes, got {actual}")]
    InvalidBuffer {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    /// A region survived the split pass larger than `max_rect_size`. This is a merger defect.
    #[error("Region {width}x{height} exceeds max_rect_size {max} after splitting")]
    OversizeRegion { width: i32, height: i32, max: u32 },
    #[error("Region {width}x{height} cannot fit a {page_width}x{page_height} page (margin {margin})")]
    RegionTooLarge {
        width: u32,
        height: u32,
        page_width: u32,
        page_height: u32,
        margin: u32,
    },
    #[error("Out of space: placed {placed} of {total} regions")]
    OutOfSpace { placed: usize, total: usize },
    #[error("Packer contract violated: {0}")]
    PackerContract(String),
    #[error("Generation cancelled")]
    Cancelled,
    #[error("Nothing to pack")]
    Empty,
}

pub type Result<T> = std::result::Result<T, AtlasError>;
