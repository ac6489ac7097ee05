//! Raster pages to a multi-page PDF.
//!
//! Every page is one full-bleed RGB image XObject. The page box is the
//! raster size at 96 dpi (0.75 pt per pixel), so pages keep their own
//! dimensions and orientation.

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use serde::Serialize;
use std::io::Write;

use crate::error::DiplomaError;

/// PDF points per raster pixel.
pub const PT_PER_PX: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn of(width: u32, height: u32) -> Self {
        if width > height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// Size and orientation of one assembled page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub width_px: u32,
    pub height_px: u32,
    pub width_pt: f32,
    pub height_pt: f32,
    pub orientation: Orientation,
}

impl PageInfo {
    fn for_raster(image: &RgbImage) -> Self {
        let (w, h) = image.dimensions();
        Self {
            width_px: w,
            height_px: h,
            width_pt: w as f32 * PT_PER_PX,
            height_pt: h as f32 * PT_PER_PX,
            orientation: Orientation::of(w, h),
        }
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, DiplomaError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Build a PDF with one page per raster, in order.
pub fn assemble_pdf(pages: &[RgbImage]) -> Result<(Vec<u8>, Vec<PageInfo>), DiplomaError> {
    if pages.is_empty() {
        return Err(DiplomaError::Pdf("no pages to assemble".to_string()));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    let mut infos = Vec::with_capacity(pages.len());

    for raster in pages {
        let info = PageInfo::for_raster(raster);

        let image_stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => info.width_px as i64,
                "Height" => info.height_px as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            deflate(raster.as_raw())?,
        );
        let image_id = doc.add_object(image_stream);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(info.width_pt),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(info.height_pt),
                        Object::Integer(0),
                        Object::Integer(0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| DiplomaError::Pdf(format!("content stream: {}", e)))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(info.width_pt),
                Object::Real(info.height_pt),
            ],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
        infos.push(info);
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| DiplomaError::Pdf(e.to_string()))?;
    Ok((bytes, infos))
}
