// src/extract/pdf.rs
// =============================================================================
// PDF text extraction with `lopdf`.
//
// Text is pulled page by page so that one broken page only costs that
// page: it is skipped and the rest of the document is still returned.
// =============================================================================

use lopdf::Document;

use crate::error::ExtractError;

/// Extracts the text of every readable page, one page per line block.
///
/// Returns an empty string when the trimmed text is shorter than
/// `min_content_size` characters.
pub fn extract_pdf(raw: &[u8], min_content_size: usize) -> Result<String, ExtractError> {
    let document = Document::load_mem(raw)?;

    let pages = document
        .get_pages()
        .into_keys()
        .map(|page_number| (page_number, document.extract_text(&[page_number])));
    Ok(join_pages(pages, min_content_size))
}

// Joins the text of the readable pages; unreadable ones are logged and left out
fn join_pages<I>(pages: I, min_content_size: usize) -> String
where
    I: IntoIterator<Item = (u32, lopdf::Result<String>)>,
{
    let mut content = String::new();
    for (page_number, text) in pages {
        match text {
            Ok(text) => {
                content.push_str(&text);
                content.push('\n');
            }
            Err(e) => log::debug!("skipping unreadable pdf page {}: {}", page_number, e),
        }
    }

    let content = content.trim();
    if content.chars().count() < min_content_size {
        return String::new();
    }
    content.to_string()
}

/// Builds small PDFs for tests, one text line per page.
#[cfg(test)]
pub(crate) fn sample_pdf(pages: &[&str]) -> Vec<u8> {
    let pages: Vec<Option<&str>> = pages.iter().copied().map(Some).collect();
    build_pdf(&pages)
}

/// Like sample_pdf, but a `None` page points at a content stream that
/// does not exist in the file.
#[cfg(test)]
fn build_pdf(pages: &[Option<&str>]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let Some(text) = text else {
            let dangling: lopdf::ObjectId = (9_999, 0);
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => dangling,
            });
            kids.push(page_id.into());
            continue;
        };
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}
