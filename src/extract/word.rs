//! Word-processor extraction.

use crate::model::{ImageBlob, Metadata, Table, WordDocument};

/// Paragraph text in document order, one paragraph per line.
pub(super) fn text(doc: &WordDocument) -> String {
    doc.paragraphs().collect::<Vec<_>>().join("\n")
}

/// Hyperlink targets in relationship-table order, not the order the links
/// appear in the body.
pub(super) fn links(doc: &WordDocument) -> Vec<String> {
    doc.relationships
        .iter()
        .filter(|rel| rel.is_hyperlink())
        .map(|rel| rel.target.clone())
        .collect()
}

pub(super) fn images(doc: &WordDocument) -> Vec<ImageBlob> {
    doc.relationships
        .iter()
        .filter(|rel| rel.is_image())
        .filter_map(|rel| {
            doc.media_for(&rel.id)
                .map(|data| ImageBlob::new(data.to_vec()).with_name(rel.target.clone()))
        })
        .collect()
}

pub(super) fn tables(doc: &WordDocument) -> Vec<Table> {
    doc.tables().cloned().collect()
}

pub(super) fn metadata(doc: &WordDocument) -> Metadata {
    doc.properties
        .as_ref()
        .map(|p| p.to_metadata())
        .unwrap_or_else(Metadata::standard)
}
