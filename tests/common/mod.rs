#![allow(dead_code)]

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};

/// A gray image with a lighter "floor" band, enough texture to encode.
pub fn room_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |_, y| {
        if y > height * 2 / 3 {
            Rgb([180, 160, 140])
        } else {
            Rgb([90, 90, 100])
        }
    })
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    room_image(width, height)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

/// Writes a room image; the format follows the extension.
pub fn write_room_image(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    room_image(width, height).save(path).expect("write image");
}
