//! Image dimension lookup.
//!
//! Coordinates in the output are scaled to the size of the page image.
//! That size is either supplied directly or read from the image header;
//! pixel data is never decoded.

use crate::error::{Error, Result};
use crate::geometry::PageSize;
use std::path::Path;

/// Read the dimensions of an image file.
///
/// # Example
/// ```no_run
/// use textract2page::detect::image_dimensions;
///
/// let size = image_dimensions("scan.png").unwrap();
/// println!("{}", size);
/// ```
pub fn image_dimensions<P: AsRef<Path>>(path: P) -> Result<PageSize> {
    let path = path.as_ref();
    let (width, height) = image::ImageReader::open(path)?
        .with_guessed_format()?
        .into_dimensions()?;
    log::debug!("Read {}x{} from {}", width, height, path.display());
    Ok(PageSize::new(width, height))
}

/// Decide the page size from what the caller supplied.
///
/// Explicit dimensions win; the image is then not opened at all. Without
/// them the image header is read. With neither, the input is rejected.
pub fn resolve_page_size(explicit: Option<PageSize>, image: Option<&Path>) -> Result<PageSize> {
    match (explicit, image) {
        (Some(size), _) => Ok(size),
        (None, Some(path)) => image_dimensions(path),
        (None, None) => Err(Error::MalformedInput(
            "image width and height are required: pass them explicitly or supply the image"
                .to_string(),
        )),
    }
}

/// Check if a file looks like an image the converter can measure.
pub fn is_supported_image<P: AsRef<Path>>(path: P) -> bool {
    image::ImageFormat::from_path(path)
        .map(|format| {
            matches!(
                format,
                image::ImageFormat::Png | image::ImageFormat::Jpeg | image::ImageFormat::Tiff
            )
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::GrayImage::new(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_dimensions_from_garbage() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"definitely not an image").unwrap();
        let result = image_dimensions(file.path());
        assert!(matches!(result, Err(Error::Image(_))));
    }

    #[test]
    fn test_dimensions_from_file() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(&png_bytes(12, 34)).unwrap();
        let size = image_dimensions(file.path()).unwrap();
        assert_eq!(size.width, 12);
        assert_eq!(size.height, 34);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = image_dimensions("/nonexistent/scan.png");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_explicit_size_wins() {
        // the path is never opened
        let size = resolve_page_size(
            Some(PageSize::new(100, 200)),
            Some(Path::new("/nonexistent/scan.png")),
        )
        .unwrap();
        assert_eq!(size, PageSize::new(100, 200));
    }

    #[test]
    fn test_no_size_source() {
        let result = resolve_page_size(None, None);
        assert!(matches!(result, Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_image_read_without_explicit_size() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&png_bytes(5, 6)).unwrap();
        let size = resolve_page_size(None, Some(file.path())).unwrap();
        assert_eq!(size, PageSize::new(5, 6));
    }

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image("scan.PNG"));
        assert!(is_supported_image("photo.jpeg"));
        assert!(is_supported_image("page.tif"));
        assert!(!is_supported_image("notes.txt"));
    }
}
