use std::collections::BTreeMap;

use rtlify_dom::{Document, TreeTraverser};
use serde::{Deserialize, Serialize};

use crate::TagCategory;
use crate::classify::round_ratio;
use crate::style::{PROCESSED_ATTR, applied_ratio};

/// Summary of the elements currently styled in a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub count: usize,
    /// Mean applied ratio, rounded to two decimals. Zero when nothing is styled.
    pub mean_ratio: f32,
    pub by_category: BTreeMap<TagCategory, usize>,
}

impl Stats {
    /// Recompute from the processed markers present in the document
    pub fn collect(doc: &Document) -> Self {
        let mut stats = Self::default();
        let mut ratio_sum = 0.0;

        for node_id in TreeTraverser::new(doc) {
            let Some(element) = doc.get_node(node_id).and_then(|node| node.element_data()) else {
                continue;
            };
            if !element.has_attr(PROCESSED_ATTR) {
                continue;
            }
            stats.count += 1;
            ratio_sum += applied_ratio(doc, node_id).unwrap_or(0.0);
            *stats
                .by_category
                .entry(TagCategory::of_element(element))
                .or_default() += 1;
        }

        if stats.count > 0 {
            stats.mean_ratio = round_ratio(ratio_sum / stats.count as f32);
        }
        stats
    }
}
