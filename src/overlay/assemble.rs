//! PDF Assembly
//!
//! Writes composed pages into a single PDF document. Each page carries its
//! background as a DCT-encoded image XObject filling the media box, and its
//! text runs as an invisible Helvetica text object. The media box is sized
//! in source pixels, so run coordinates need no unit conversion.

use pdf_writer::types::TextRenderingMode;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str};

use super::SearchablePage;

const FONT_NAME: Name = Name(b"F0");
const IMAGE_NAME: Name = Name(b"Im0");

/// Serialize composed pages, in order, into PDF bytes
pub fn assemble(pages: &[SearchablePage]) -> Vec<u8> {
    let mut pdf = Pdf::new();
    let mut ref_counter = std::iter::successors(Some(1), |n| Some(n + 1));
    let mut next_ref = move || Ref::new(ref_counter.next().unwrap_or(i32::MAX));

    let catalog_ref = next_ref();
    let page_tree_ref = next_ref();
    let font_ref = next_ref();

    pdf.catalog(catalog_ref).pages(page_tree_ref);
    pdf.type1_font(font_ref)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    let page_refs: Vec<Ref> = pages.iter().map(|_| next_ref()).collect();
    pdf.pages(page_tree_ref)
        .kids(page_refs.iter().copied())
        .count(pages.len() as i32);

    for (page, &page_ref) in pages.iter().zip(&page_refs) {
        let content_ref = next_ref();
        let image_ref = next_ref();
        write_page(&mut pdf, page, page_ref, page_tree_ref, font_ref, content_ref, image_ref);
    }

    pdf.finish()
}

fn write_page(
    pdf: &mut Pdf,
    page: &SearchablePage,
    page_ref: Ref,
    page_tree_ref: Ref,
    font_ref: Ref,
    content_ref: Ref,
    image_ref: Ref,
) {
    let width = page.width as f32;
    let height = page.height as f32;

    let mut page_obj = pdf.page(page_ref);
    page_obj.media_box(Rect::new(0.0, 0.0, width, height));
    page_obj.parent(page_tree_ref);
    page_obj.contents(content_ref);
    let mut resources = page_obj.resources();
    resources.fonts().pair(FONT_NAME, font_ref);
    resources.x_objects().pair(IMAGE_NAME, image_ref);
    resources.finish();
    page_obj.finish();

    let mut content = Content::new();
    content.save_state();
    content.transform([width, 0.0, 0.0, height, 0.0, 0.0]);
    content.x_object(IMAGE_NAME);
    content.restore_state();

    if !page.runs.is_empty() {
        content.begin_text();
        content.set_text_rendering_mode(TextRenderingMode::Invisible);
        for run in &page.runs {
            content.set_font(FONT_NAME, run.font_size as f32);
            content.set_horizontal_scaling(run.h_scale as f32);
            content.set_text_matrix([1.0, 0.0, 0.0, 1.0, run.x as f32, run.y as f32]);
            content.show(Str(&run.encoded));
        }
        content.end_text();
    }
    pdf.stream(content_ref, &content.finish());

    let mut image_xobject = pdf.image_xobject(image_ref, &page.jpeg);
    image_xobject.filter(Filter::DctDecode);
    image_xobject.width(page.width as i32);
    image_xobject.height(page.height as i32);
    image_xobject.color_space().device_rgb();
    image_xobject.bits_per_component(8);
    image_xobject.finish();
}
