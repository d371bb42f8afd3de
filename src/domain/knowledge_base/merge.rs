//! Parent document reconstruction from child chunks

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::document::Document;

/// How reconstructed chunks are ordered before merging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOrdering {
    /// One flat sort by `order_index` across all parents. Chunks of different
    /// parents sharing index ranges interleave and break merge runs.
    Global,
    /// Group by parent, parents ranked by their best hit, then `order_index`
    #[default]
    PerParent,
}

impl std::fmt::Display for MergeOrdering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::PerParent => write!(f, "per_parent"),
        }
    }
}

impl std::str::FromStr for MergeOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Self::Global),
            "per_parent" | "per-parent" => Ok(Self::PerParent),
            other => Err(format!(
                "Unknown merge ordering '{}', expected 'global' or 'per_parent'",
                other
            )),
        }
    }
}

/// Merge two overlapping chunks
///
/// Keeps all of `first`, then a newline, then what follows the longest
/// common prefix in `second`. The prefix is measured in chars, so a
/// multi-byte character is never split.
pub fn merge_common_prefix(first: &str, second: &str) -> String {
    let prefix_len: usize = first
        .chars()
        .zip(second.chars())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a.len_utf8())
        .sum();

    let rest = &second[prefix_len..];
    let mut merged = String::with_capacity(first.len() + 1 + rest.len());
    merged.push_str(first);
    merged.push('\n');
    merged.push_str(rest);
    merged
}

/// Distinct parent ids among ranked hits, best hit first
///
/// Hits without a string `parent_id` cannot be grouped and are skipped.
pub fn collect_parent_ids(hits: &[Document]) -> Vec<String> {
    let mut parents: Vec<String> = Vec::new();
    for parent_id in hits.iter().filter_map(Document::parent_id) {
        if !parents.iter().any(|p| p == parent_id) {
            parents.push(parent_id.to_string());
        }
    }
    parents
}

/// Rebuild parent documents from their full chunk sets
///
/// `ranked_parents` is the parent order from [`collect_parent_ids`];
/// `children` is every chunk of those parents, in any order. Consecutive
/// chunks of the same parent are folded into the first with
/// [`merge_common_prefix`]; empty results are dropped and the output is
/// truncated to `limit`.
pub fn reconstruct_parents(
    ranked_parents: &[String],
    mut children: Vec<Document>,
    ordering: MergeOrdering,
    limit: usize,
) -> Vec<Document> {
    let order_of = |doc: &Document| doc.order_index().unwrap_or(i64::MAX);

    match ordering {
        MergeOrdering::Global => children.sort_by_key(order_of),
        MergeOrdering::PerParent => {
            let rank: HashMap<&str, usize> = ranked_parents
                .iter()
                .enumerate()
                .map(|(i, p)| (p.as_str(), i))
                .collect();
            children.sort_by_key(|doc| {
                let parent_rank = doc
                    .parent_id()
                    .and_then(|p| rank.get(p).copied())
                    .unwrap_or(usize::MAX);
                (parent_rank, order_of(doc))
            });
        }
    }

    let mut merged: Vec<Document> = Vec::with_capacity(children.len());
    for doc in children {
        match merged.last_mut() {
            Some(running) if running.parent_id().is_some() && running.parent_id() == doc.parent_id() => {
                running.page_content = merge_common_prefix(&running.page_content, &doc.page_content);
            }
            _ => merged.push(doc),
        }
    }

    merged.retain(|doc| !doc.page_content.is_empty());
    merged.truncate(limit);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(parent: &str, idx: i64, content: &str) -> Document {
        Document::new(content).with_parent(parent, idx)
    }

    #[test]
    fn test_merge_common_prefix() {
        assert_eq!(merge_common_prefix("abcHello", "abcWorld"), "abcHello\nWorld");
        assert_eq!(merge_common_prefix("Hello", "World"), "Hello\nWorld");
        assert_eq!(merge_common_prefix("same", "same"), "same\n");
        assert_eq!(merge_common_prefix("", "next"), "\nnext");
    }

    #[test]
    fn test_merge_common_prefix_multibyte() {
        // 'é' and 'è' share their first UTF-8 byte
        assert_eq!(merge_common_prefix("caé", "caè"), "caé\nè");
        assert_eq!(merge_common_prefix("知识库A", "知识库B"), "知识库A\nB");
    }

    #[test]
    fn test_collect_parent_ids_dedups_in_rank_order() {
        let hits = vec![
            chunk("P2", 1, "x"),
            Document::new("orphan"),
            chunk("P1", 0, "y"),
            chunk("P2", 0, "z"),
        ];
        assert_eq!(collect_parent_ids(&hits), vec!["P2", "P1"]);
    }

    #[test]
    fn test_three_children_merge_in_order() {
        let children = vec![
            chunk("P", 2, "Part three"),
            chunk("P", 0, "Part one"),
            chunk("P", 1, "Part two"),
        ];

        for ordering in [MergeOrdering::Global, MergeOrdering::PerParent] {
            let result = reconstruct_parents(&["P".to_string()], children.clone(), ordering, 5);
            assert_eq!(result.len(), 1);
            assert_eq!(result[0].page_content, "Part one\ntwo\nthree");
            assert_eq!(result[0].order_index(), Some(0));
        }
    }

    #[test]
    fn test_global_ordering_interleaves_parents() {
        let parents = vec!["A".to_string(), "B".to_string()];
        let children = vec![
            chunk("A", 0, "a0"),
            chunk("A", 1, "a1"),
            chunk("B", 0, "b0"),
            chunk("B", 1, "b1"),
        ];

        let result = reconstruct_parents(&parents, children, MergeOrdering::Global, 10);
        // A0 B0 A1 B1: no two neighbours share a parent
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_per_parent_ordering_groups_by_rank() {
        let parents = vec!["B".to_string(), "A".to_string()];
        let children = vec![
            chunk("A", 0, "a0"),
            chunk("A", 1, "a1"),
            chunk("B", 0, "b0"),
            chunk("B", 1, "b1"),
        ];

        let result = reconstruct_parents(&parents, children, MergeOrdering::PerParent, 10);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].parent_id(), Some("B"));
        assert_eq!(result[0].page_content, "b0\n1");
        assert_eq!(result[1].page_content, "a0\n1");
    }

    #[test]
    fn test_empty_documents_dropped_and_truncated() {
        let parents = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let children = vec![
            chunk("A", 0, "alpha"),
            chunk("B", 0, ""),
            chunk("C", 0, "gamma"),
        ];

        let result = reconstruct_parents(&parents, children.clone(), MergeOrdering::PerParent, 10);
        assert_eq!(result.len(), 2);

        let result = reconstruct_parents(&parents, children, MergeOrdering::PerParent, 1);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].page_content, "alpha");
    }

    #[test]
    fn test_no_children() {
        assert!(reconstruct_parents(&[], Vec::new(), MergeOrdering::default(), 3).is_empty());
    }

    #[test]
    fn test_ordering_parse() {
        assert_eq!("global".parse::<MergeOrdering>().unwrap(), MergeOrdering::Global);
        assert_eq!("per_parent".parse::<MergeOrdering>().unwrap(), MergeOrdering::PerParent);
        assert!("random".parse::<MergeOrdering>().is_err());
    }
}
