//! Property-based tests for tree paths, config merging, and classification.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::classifier::Classifier;
    use crate::config::{FetchMode, NodeDefinition};
    use crate::path::{join_tree_path, normalize_tree_path, split_parent, split_segments};
    use crate::resolver::{deep_merge, get_by_path, set_by_path};
    use proptest::prelude::*;
    use serde_yaml::{Mapping, Value};

    fn segment() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,8}"
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| Value::from(i64::from(n))),
            "[a-z]{0,6}".prop_map(Value::String),
        ]
    }

    fn mapping() -> impl Strategy<Value = Mapping> {
        let leaf = scalar();
        let value = leaf.prop_recursive(3, 24, 4, |inner| {
            prop::collection::btree_map("[a-c]", inner, 0..4).prop_map(|m| {
                Value::Mapping(m.into_iter().map(|(k, v)| (Value::String(k), v)).collect())
            })
        });
        prop::collection::btree_map("[a-c]", value, 0..4)
            .prop_map(|m| m.into_iter().map(|(k, v)| (Value::String(k), v)).collect())
    }

    // ============================================================================
    // tree path property tests
    // ============================================================================

    proptest! {
        /// Property: normalized paths are absolute and never contain `.`, `..`,
        /// or empty segments
        #[test]
        fn normalize_produces_canonical_paths(
            current in prop::collection::vec(segment(), 0..4),
            input in prop::collection::vec(
                prop_oneof![
                    segment(),
                    Just(".".to_string()),
                    Just("..".to_string()),
                    Just(String::new())
                ],
                0..6,
            ),
        ) {
            let current = format!("/{}", current.join("/"));
            let result = normalize_tree_path(&current, &input.join("/"));
            prop_assert!(result.starts_with('/'));
            prop_assert!(result == "/" || !result.ends_with('/'));
            for seg in result.split('/').skip(1).filter(|s| !s.is_empty()) {
                prop_assert!(seg != "." && seg != "..");
            }
        }

        /// Property: normalization is idempotent
        #[test]
        fn normalize_is_idempotent(
            current in prop::collection::vec(segment(), 0..4),
            input in "[a-z./]{0,20}",
        ) {
            let current = format!("/{}", current.join("/"));
            let once = normalize_tree_path(&current, &input);
            let twice = normalize_tree_path("/", &once);
            prop_assert_eq!(once, twice);
        }

        /// Property: `..` from any non-root path lands on its parent
        #[test]
        fn dot_dot_is_parent(segments in prop::collection::vec(segment(), 1..5)) {
            let path = format!("/{}", segments.join("/"));
            let (parent, name) = split_parent(&path).unwrap();
            prop_assert_eq!(normalize_tree_path(&path, ".."), parent.clone());
            prop_assert_eq!(join_tree_path(&parent, &name), path);
        }

        /// Property: split_segments inverts joining
        #[test]
        fn split_segments_round_trip(segments in prop::collection::vec(segment(), 0..5)) {
            let path = segments
                .iter()
                .fold("/".to_string(), |acc, s| join_tree_path(&acc, s));
            let split: Vec<String> = split_segments(&path)
                .into_iter()
                .map(str::to_string)
                .collect();
            prop_assert_eq!(split, segments);
        }
    }

    // ============================================================================
    // deep_merge / get_by_path property tests
    // ============================================================================

    proptest! {
        /// Property: merging the same source twice changes nothing the second time
        #[test]
        fn deep_merge_is_idempotent(dst in mapping(), src in mapping()) {
            let mut once = dst.clone();
            deep_merge(&mut once, &src);
            let mut twice = once.clone();
            deep_merge(&mut twice, &src);
            prop_assert_eq!(once, twice);
        }

        /// Property: merging into an empty map yields the source
        #[test]
        fn deep_merge_into_empty_is_copy(src in mapping()) {
            let mut dst = Mapping::new();
            deep_merge(&mut dst, &src);
            prop_assert_eq!(dst, src);
        }

        /// Property: every top-level scalar of the source wins after a merge
        #[test]
        fn deep_merge_source_scalars_win(dst in mapping(), src in mapping()) {
            let mut merged = dst.clone();
            deep_merge(&mut merged, &src);
            for (key, value) in &src {
                if !value.is_mapping() {
                    prop_assert_eq!(merged.get(key), Some(value));
                }
            }
        }

        /// Property: a value set by path can be read back by the same path
        #[test]
        fn set_then_get_round_trip(
            base in mapping(),
            keys in prop::collection::vec("[a-d]", 1..4),
            value in scalar(),
        ) {
            let path = keys.join(".");
            let mut map = base;
            set_by_path(&mut map, &path, value.clone());
            prop_assert_eq!(get_by_path(&map, &path), Some(&value));
        }
    }

    // ============================================================================
    // classifier property tests
    // ============================================================================

    proptest! {
        /// Property: a name ending in an eager suffix is eager regardless of case
        #[test]
        fn suffix_match_is_eager(
            stem in "[a-zA-Z][a-zA-Z0-9]{0,10}",
            pattern in prop_oneof![Just("-monorepo"), Just("-repo"), Just("-workspace")],
            upper in any::<bool>(),
        ) {
            let classifier = Classifier::new(["-monorepo", "-repo", "-workspace"]);
            let suffix = if upper { pattern.to_uppercase() } else { pattern.to_string() };
            let node =
                NodeDefinition::repo(format!("{}{}", stem, suffix), "https://example.com/x.git");
            prop_assert!(!classifier.effective_lazy(&node));
        }

        /// Property: a pattern in the middle of a name never matches
        #[test]
        fn infix_pattern_does_not_match(stem in "[a-z]{1,8}", tail in "[a-z]{1,8}") {
            let classifier = Classifier::new(["-repo"]);
            let name = format!("{}-repo-{}", stem, tail);
            let node = NodeDefinition::repo(name, "https://example.com/x.git");
            prop_assert!(classifier.effective_lazy(&node));
        }

        /// Property: explicit fetch modes always win over patterns
        #[test]
        fn explicit_fetch_wins(name in "[a-z]{1,8}(-monorepo)?") {
            let classifier = Classifier::new(["-monorepo"]);
            let url = "https://example.com/x.git";
            let eager = NodeDefinition::repo(name.clone(), url).with_fetch(FetchMode::Eager);
            let lazy = NodeDefinition::repo(name, url).with_fetch(FetchMode::Lazy);
            prop_assert!(!classifier.effective_lazy(&eager));
            prop_assert!(classifier.effective_lazy(&lazy));
        }
    }
}
