/// One unit produced by a document loader (spec.md §4.2): text plus the
/// per-item metadata a chunker needs to attach to its output chunks.
#[derive(Clone, Debug, Default)]
pub struct Item {
    pub text: String,
    pub heading: Option<String>,
    pub heading_level: Option<u8>,
    /// Ancestor heading labels, outermost (level-1 "procedure") first,
    /// excluding `heading` itself.
    pub ancestors: Vec<String>,
    pub numeric_prefix: Option<String>,
    pub block_type: Option<String>,
    pub page: Option<u32>,
    pub slide_number: Option<u32>,
    pub sheet_name: Option<String>,
    pub images: Vec<InlineImage>,
}

/// An inline image block within an item's text (spec.md §4.2 "Inline
/// figures"), at the byte offset it occurred at in `Item::text`.
#[derive(Clone, Debug)]
pub struct InlineImage {
    pub offset: usize,
    pub figure_id: String,
    pub image_ref: String,
    pub filename: String,
    pub caption: Option<String>,
}
