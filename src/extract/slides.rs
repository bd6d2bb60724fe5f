//! Slide-deck extraction. Every operation walks slides, then shapes, in order.

use crate::model::{ImageBlob, Metadata, Presentation, Shape, ShapeKind, Table};

fn shapes(deck: &Presentation) -> impl Iterator<Item = &Shape> {
    deck.slides.iter().flat_map(|slide| slide.shapes.iter())
}

/// Text of every text-bearing shape, one shape per line. Shapes whose text is
/// blank are left out entirely.
pub(super) fn text(deck: &Presentation) -> String {
    shapes(deck)
        .filter_map(Shape::text)
        .filter(|text| !text.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub(super) fn links(deck: &Presentation) -> Vec<String> {
    shapes(deck)
        .filter_map(|shape| match &shape.kind {
            ShapeKind::Text(paragraphs) => Some(paragraphs),
            _ => None,
        })
        .flatten()
        .flat_map(|paragraph| paragraph.runs.iter())
        .filter_map(|run| run.hyperlink.clone())
        .collect()
}

pub(super) fn images(deck: &Presentation) -> Vec<ImageBlob> {
    shapes(deck)
        .filter_map(|shape| match &shape.kind {
            ShapeKind::Picture(image) => Some(image.clone()),
            _ => None,
        })
        .collect()
}

pub(super) fn tables(deck: &Presentation) -> Vec<Table> {
    shapes(deck)
        .filter_map(|shape| match &shape.kind {
            ShapeKind::Table(table) => Some(table.clone()),
            _ => None,
        })
        .collect()
}

pub(super) fn metadata(deck: &Presentation) -> Metadata {
    deck.properties
        .as_ref()
        .map(|p| p.to_metadata())
        .unwrap_or_else(Metadata::standard)
}
