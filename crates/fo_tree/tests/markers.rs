#![allow(clippy::unwrap_used, reason = "tests build fixtures with known-good input")]

#[cfg(test)]
mod tests {
    use fo_tree::{AreaSpan, FoKind, FoTree, MarkerRegistry, RetrievePosition};

    #[test]
    fn marker_must_precede_content_and_be_unique() {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut tree = FoTree::new();
        let block = tree.append(tree.root(), FoKind::Block).unwrap();
        let marker = tree.add_marker(block, "chapter").unwrap();
        tree.append_text(marker, "Chapter 1").unwrap();

        let duplicate = tree.add_marker(block, "chapter").unwrap_err();
        assert!(duplicate.to_string().contains("'chapter'"));
        tree.add_marker(block, "section").unwrap();
        tree.append_text(block, "body text").unwrap();
        // markers after content are rejected too
        tree.add_marker(block, "late").unwrap_err();

        let markers = tree.markers(block).unwrap();
        assert_eq!(markers.len(), 2);
        assert_eq!(markers.get("chapter"), Some(&marker));
        // markers never show up as content children
        assert_eq!(tree.child_nodes(block).len(), 1);
    }

    #[test]
    fn registry_resolves_each_retrieve_position() {
        let mut tree = FoTree::new();
        let mut marked_block = || {
            let block = tree.append(tree.root(), FoKind::Block).unwrap();
            tree.add_marker(block, "chapter").unwrap()
        };
        let whole = marked_block();
        let split = marked_block();
        let later = marked_block();
        let at = |registry: &MarkerRegistry, position| registry.resolve("chapter", position);

        let mut registry = MarkerRegistry::new();
        registry.begin_page(1);
        registry.register("chapter", whole, AreaSpan::WHOLE);
        // the second block runs on to page 2
        let continues = AreaSpan {
            starts: true,
            ends: false,
        };
        registry.register("chapter", split, continues);
        assert_eq!(at(&registry, RetrievePosition::FirstStartingWithinPage), Some(whole));
        assert_eq!(at(&registry, RetrievePosition::FirstIncludingCarryover), Some(whole));
        assert_eq!(at(&registry, RetrievePosition::LastStartingWithinPage), Some(split));
        assert_eq!(at(&registry, RetrievePosition::LastEndingWithinPage), Some(whole));

        registry.begin_page(2);
        assert_eq!(registry.page(), 2);
        let finishes = AreaSpan {
            starts: false,
            ends: true,
        };
        registry.register("chapter", split, finishes);
        registry.register("chapter", later, AreaSpan::WHOLE);
        assert_eq!(at(&registry, RetrievePosition::FirstStartingWithinPage), Some(later));
        assert_eq!(at(&registry, RetrievePosition::FirstIncludingCarryover), Some(split));
        assert_eq!(at(&registry, RetrievePosition::LastStartingWithinPage), Some(later));
        assert_eq!(at(&registry, RetrievePosition::LastEndingWithinPage), Some(later));

        // a page without markers retrieves what the previous page ended with
        registry.begin_page(3);
        assert_eq!(at(&registry, RetrievePosition::FirstStartingWithinPage), Some(later));
        assert_eq!(at(&registry, RetrievePosition::FirstIncludingCarryover), Some(later));
    }

    #[test]
    fn earlier_page_does_not_shadow_a_new_marker() {
        let mut tree = FoTree::new();
        let first = tree.append(tree.root(), FoKind::Block).unwrap();
        let second = tree.append(tree.root(), FoKind::Block).unwrap();
        let first_marker = tree.add_marker(first, "chapter").unwrap();
        let second_marker = tree.add_marker(second, "chapter").unwrap();

        let mut registry = MarkerRegistry::new();
        registry.begin_page(1);
        registry.register("chapter", first_marker, AreaSpan::WHOLE);
        registry.begin_page(2);
        registry.register("chapter", second_marker, AreaSpan::WHOLE);
        assert_eq!(
            registry.resolve("chapter", RetrievePosition::FirstIncludingCarryover),
            Some(second_marker)
        );
        assert_eq!(
            registry.resolve("chapter", RetrievePosition::LastEndingWithinPage),
            Some(second_marker)
        );
    }

    #[test]
    fn placeholder_resolution_consults_registry() {
        let mut tree = FoTree::new();
        let block = tree.append(tree.root(), FoKind::Block).unwrap();
        let marker = tree.add_marker(block, "title").unwrap();
        let placeholder = tree
            .append(
                tree.root(),
                FoKind::RetrieveMarker {
                    class_name: "title".to_owned(),
                    position: RetrievePosition::FirstIncludingCarryover,
                },
            )
            .unwrap();

        let mut registry = MarkerRegistry::new();
        assert_eq!(tree.resolve_marker_placeholder(placeholder, &registry), None);
        registry.register("title", marker, AreaSpan::WHOLE);
        assert_eq!(
            tree.resolve_marker_placeholder(placeholder, &registry),
            Some(marker)
        );
        assert_eq!(tree.resolve_marker_placeholder(block, &registry), Some(block));
    }
}
