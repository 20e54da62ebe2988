/// EXIF orientation correction applied right after decoding, so the grid we
/// equalize is the upright image a viewer shows.
///
/// Tag values 2..=8 map to a flip and/or rotation; 1 (or no tag) is upright.

use image::DynamicImage;
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Normal,
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    Transpose,
    Rotate90,
    Transverse,
    Rotate270,
}

impl Orientation {
    pub fn from_exif(value: u32) -> Option<Self> {
        match value {
            1 => Some(Orientation::Normal),
            2 => Some(Orientation::FlipHorizontal),
            3 => Some(Orientation::Rotate180),
            4 => Some(Orientation::FlipVertical),
            5 => Some(Orientation::Transpose),
            6 => Some(Orientation::Rotate90),
            7 => Some(Orientation::Transverse),
            8 => Some(Orientation::Rotate270),
            _ => None,
        }
    }

    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Orientation::Normal => img,
            Orientation::FlipHorizontal => img.fliph(),
            Orientation::Rotate180 => img.rotate180(),
            Orientation::FlipVertical => img.flipv(),
            Orientation::Transpose => img.rotate270().fliph(),
            Orientation::Rotate90 => img.rotate90(),
            Orientation::Transverse => img.rotate90().fliph(),
            Orientation::Rotate270 => img.rotate270(),
        }
    }
}

/// Orientation stored in the file's EXIF block, `None` when there is none or it is unreadable.
pub fn read_orientation(path: &Path) -> Option<Orientation> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut reader).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    Orientation::from_exif(field.value.get_uint(0)?)
}

/// Rotate/flip a decoded image according to the EXIF tag of the file it came from.
/// Returns the image unchanged when no usable tag is present.
pub fn apply_exif_orientation(img: DynamicImage, path: &Path) -> DynamicImage {
    match read_orientation(path) {
        Some(orientation) if orientation != Orientation::Normal => {
            debug!("{}: applying EXIF orientation {:?}", path.display(), orientation);
            orientation.apply(img)
        }
        _ => img,
    }
}
