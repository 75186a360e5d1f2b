//! The persisted annotation entity.

use serde::{Deserialize, Serialize};

use super::anchor::Anchor;
use super::style::ToolStyle;

pub type AnnotationId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationKind {
    Line,
    Rect,
}

/// A completed (or completing) annotation. The two logical anchor points are
/// the durable state; pixel caches are maintained by the reconciliation
/// engine. Once `finished`, only the style and the pixel caches may change.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub id: AnnotationId,
    pub kind: AnnotationKind,
    pub start: Anchor,
    pub end: Anchor,
    pub style: ToolStyle,
    pub finished: bool,
}
