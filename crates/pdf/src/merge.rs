//! Page-wise PDF concatenation: every page of the base document followed by
//! every page of the attachment, content untouched. Both inputs must parse
//! as structurally valid PDFs; nothing is ever silently truncated.

use std::collections::BTreeMap;

use lopdf::{Document, Object, ObjectId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("malformed PDF document ({which}): {detail}")]
    MalformedDocument { which: &'static str, detail: String },
    #[error("PDF assembly failed: {0}")]
    Assembly(String),
}

/// Concatenate `attachment` after `base`.
///
/// Order-preserving and not commutative: the result is always base pages in
/// their original order, then attachment pages in theirs. No renumbering of
/// visible content, bookmarks, or content inspection happens.
pub fn merge_pdfs(base: &[u8], attachment: &[u8]) -> Result<Vec<u8>, MergeError> {
    let base_document = Document::load_mem(base)
        .map_err(|error| MergeError::MalformedDocument { which: "base", detail: error.to_string() })?;
    let attachment_document = Document::load_mem(attachment).map_err(|error| {
        MergeError::MalformedDocument { which: "attachment", detail: error.to_string() }
    })?;

    concatenate(vec![base_document, attachment_document])
}

fn concatenate(documents: Vec<Document>) -> Result<Vec<u8>, MergeError> {
    let mut max_id = 1;
    // Pages are kept as an ordered list; object ids after renumbering carry
    // no page-order meaning.
    let mut all_pages: Vec<(ObjectId, Object)> = Vec::new();
    let mut all_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut document in documents {
        document.renumber_objects_with(max_id);
        max_id = document.max_id + 1;

        for (_, object_id) in document.get_pages() {
            let object = document
                .get_object(object_id)
                .map_err(|error| MergeError::Assembly(error.to_string()))?
                .to_owned();
            all_pages.push((object_id, object));
        }

        all_objects.append(&mut document.objects);
    }

    let mut merged = Document::with_version("1.5");
    let mut catalog_object: Option<(ObjectId, Object)> = None;
    let mut pages_object: Option<(ObjectId, Object)> = None;

    for (object_id, object) in &all_objects {
        match object.type_name().unwrap_or("") {
            "Catalog" => {
                // First catalog wins; the merged document needs exactly one.
                catalog_object.get_or_insert((*object_id, object.clone()));
            }
            "Pages" => {
                if let Ok(dictionary) = object.as_dict() {
                    let mut dictionary = dictionary.clone();
                    if let Some((_, ref previous)) = pages_object {
                        if let Ok(previous) = previous.as_dict() {
                            dictionary.extend(previous);
                        }
                    }
                    pages_object = Some((*object_id, Object::Dictionary(dictionary)));
                }
            }
            // Page objects are re-attached below in concatenation order.
            "Page" => {}
            // The merged document carries no bookmarks.
            "Outlines" | "Outline" => {}
            _ => {
                merged.objects.insert(*object_id, object.clone());
            }
        }
    }

    let (pages_id, pages_root) =
        pages_object.ok_or_else(|| MergeError::Assembly("no pages root found".to_string()))?;
    let (catalog_id, catalog_root) =
        catalog_object.ok_or_else(|| MergeError::Assembly("no catalog found".to_string()))?;

    for (object_id, object) in &all_pages {
        if let Ok(dictionary) = object.as_dict() {
            let mut dictionary = dictionary.clone();
            dictionary.set("Parent", pages_id);
            merged.objects.insert(*object_id, Object::Dictionary(dictionary));
        }
    }

    if let Ok(dictionary) = pages_root.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Count", all_pages.len() as u32);
        dictionary.set(
            "Kids",
            all_pages.iter().map(|(id, _)| Object::Reference(*id)).collect::<Vec<_>>(),
        );
        merged.objects.insert(pages_id, Object::Dictionary(dictionary));
    }

    if let Ok(dictionary) = catalog_root.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Pages", pages_id);
        dictionary.remove(b"Outlines");
        merged.objects.insert(catalog_id, Object::Dictionary(dictionary));
    }

    merged.trailer.set("Root", catalog_id);
    merged.max_id = merged.objects.len() as u32;
    merged.renumber_objects();
    merged.compress();

    let mut bytes = Vec::new();
    merged.save_to(&mut bytes).map_err(|error| MergeError::Assembly(error.to_string()))?;
    Ok(bytes)
}
