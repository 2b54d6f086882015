use std::{
    fmt,
    sync::{Mutex, PoisonError},
};

use comrak::{
    adapters::{HeadingAdapter, HeadingMeta},
    nodes::Sourcepos,
};

use crate::domain::slug::AnchorSlugger;

/// Deepest heading level that receives an anchor id.
const MAX_ANCHORED_LEVEL: u8 = 4;

/// Heading renderer that stamps Markdown headings with unique anchor ids.
///
/// Only headings parsed from Markdown pass through the adapter; raw HTML
/// headings are emitted verbatim and never consume a slug. One instance
/// covers exactly one document.
#[derive(Default)]
pub(crate) struct HeadingAnchors {
    slugger: Mutex<AnchorSlugger>,
}

impl HeadingAnchors {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn anchor_for(&self, heading: &HeadingMeta) -> Option<String> {
        if heading.level > MAX_ANCHORED_LEVEL {
            return None;
        }
        let normalized = heading.content.split_whitespace().collect::<Vec<_>>().join(" ");
        self.slugger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .anchor_for(&normalized)
            .ok()
    }
}

impl HeadingAdapter for HeadingAnchors {
    fn enter(
        &self,
        output: &mut dyn fmt::Write,
        heading: &HeadingMeta,
        _sourcepos: Option<Sourcepos>,
    ) -> fmt::Result {
        write!(output, "<h{}", heading.level)?;
        // slugs are limited to [a-z0-9-], so no escaping is needed
        if let Some(anchor) = self.anchor_for(heading) {
            write!(output, " id=\"{anchor}\"")?;
        }
        output.write_str(">")
    }

    fn exit(&self, output: &mut dyn fmt::Write, heading: &HeadingMeta) -> fmt::Result {
        writeln!(output, "</h{}>", heading.level)
    }
}
