//! PDF extraction: everything was collected per page at load time.

use crate::model::{ImageBlob, Metadata, PdfContent, Table};

pub(super) fn text(content: &PdfContent) -> String {
    content.text.clone()
}

pub(super) fn links(content: &PdfContent) -> Vec<String> {
    content
        .pages
        .iter()
        .flat_map(|page| page.links.iter().cloned())
        .collect()
}

pub(super) fn images(content: &PdfContent) -> Vec<ImageBlob> {
    content
        .pages
        .iter()
        .flat_map(|page| page.images.iter().cloned())
        .collect()
}

pub(super) fn tables(content: &PdfContent) -> Vec<Table> {
    content
        .pages
        .iter()
        .flat_map(|page| page.tables.iter().cloned())
        .collect()
}

pub(super) fn metadata(content: &PdfContent) -> Metadata {
    content
        .properties
        .as_ref()
        .map(|p| p.to_metadata())
        .unwrap_or_else(Metadata::standard)
}
