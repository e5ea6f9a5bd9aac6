#![allow(clippy::unwrap_used, reason = "tests build fixtures with known-good input")]

mod common;

#[cfg(test)]
mod tests {
    use crate::common::{Document, areas_of, document};
    use fo_layout::{Area, AreaKind, LayoutConfig, LayoutTree, Page, PageBreaker, PageMaster};
    use fo_tree::{FoKind, FoTree, PropertyValue, RetrievePosition};

    /// Two lines of two two-letter words fit on a page.
    fn small_pages() -> LayoutConfig {
        LayoutConfig::default().with_page_masters(vec![PageMaster::new(27_000, 28_800)])
    }

    fn single_line_breaks(doc: &mut Document) {
        let flow = doc.flow;
        doc.set(flow, "orphans", PropertyValue::Integer(1));
        doc.set(flow, "widows", PropertyValue::Integer(1));
    }

    fn lay_out(doc: &Document, config: &LayoutConfig) -> Vec<Page> {
        let mut tree = LayoutTree::new(&doc.fo, config);
        PageBreaker::default().layout(&mut tree, doc.page_sequence).unwrap()
    }

    #[test]
    fn flow_is_split_across_pages() {
        let mut doc = document();
        single_line_breaks(&mut doc);
        doc.paragraph("aa bb cc dd ee ff");
        let pages = lay_out(&doc, &small_pages());

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].number, 1);
        assert_eq!(pages[0].body.words(), ["aa", "bb", "cc", "dd"]);
        assert_eq!(pages[0].body.bpd, 28_800);
        assert_eq!(pages[1].number, 2);
        assert_eq!(pages[1].body.words(), ["ee", "ff"]);
        assert_eq!(pages[1].body.bpd, 14_400);
    }

    #[test]
    fn wider_master_reflows_the_remaining_lines() {
        let mut doc = document();
        single_line_breaks(&mut doc);
        doc.paragraph("aa bb cc dd ee ff gg");
        let config = LayoutConfig::default().with_page_masters(vec![
            PageMaster::new(27_000, 28_800),
            PageMaster::new(42_000, 28_800),
        ]);
        let pages = lay_out(&doc, &config);

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].body.words(), ["aa", "bb", "cc", "dd"]);
        assert_eq!(pages[1].master.ipd, 42_000);
        // three words now fit on one line
        assert_eq!(pages[1].body.words(), ["ee", "ff", "gg"]);
        assert_eq!(areas_of(&pages[1].body, &AreaKind::Line).len(), 1);
    }

    #[test]
    fn split_block_adds_its_after_space_once() {
        let mut doc = document();
        single_line_breaks(&mut doc);
        let block = doc.paragraph("aa bb cc dd ee ff");
        doc.set(block, "space-after", PropertyValue::Length(5_000));
        let pages = lay_out(&doc, &small_pages());

        assert_eq!(pages.len(), 2);
        let heights: Vec<_> = pages
            .iter()
            .map(|page| areas_of(&page.body, &AreaKind::Block)[0].bpd)
            .collect();
        assert_eq!(heights, [28_800, 19_400]);
        assert_eq!(pages[0].body.bpd, 28_800);
        assert_eq!(pages[1].body.bpd, 19_400);
    }

    #[test]
    fn retrieve_positions_follow_the_areas_on_each_page() {
        let mut doc = document();
        single_line_breaks(&mut doc);
        for position in [
            RetrievePosition::FirstIncludingCarryover,
            RetrievePosition::FirstStartingWithinPage,
            RetrievePosition::LastEndingWithinPage,
        ] {
            let region = doc.fo.append(doc.page_sequence, FoKind::StaticContent).unwrap();
            let class_name = "chapter".to_owned();
            doc.fo
                .append(region, FoKind::RetrieveMarker { class_name, position })
                .unwrap();
        }
        // "One" runs over onto page 2, where "Two" starts
        for (title, body) in [("One", "aa bb cc dd ee ff"), ("Two", "gg")] {
            let block = doc.fo.append(doc.flow, FoKind::Block).unwrap();
            let marker = doc.fo.add_marker(block, "chapter").unwrap();
            doc.fo.append_text(marker, title).unwrap();
            doc.fo.append_text(block, body).unwrap();
        }
        let config = LayoutConfig::default()
            .with_page_masters(vec![PageMaster::new(27_000, 28_800).with_before_extent(14_400)]);
        let pages = lay_out(&doc, &config);

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].body.words(), ["ee", "ff", "gg"]);
        let retrieved: Vec<Vec<Vec<&str>>> = pages
            .iter()
            .map(|page| page.static_content.iter().map(Area::words).collect())
            .collect();
        let nothing: Vec<&str> = Vec::new();
        assert_eq!(
            retrieved,
            [
                vec![vec!["One"], vec!["One"], nothing],
                vec![vec!["One"], vec!["Two"], vec!["Two"]],
            ]
        );
    }

    #[test]
    fn static_content_is_clipped_to_the_region_before() {
        let mut doc = document();
        doc.paragraph("body");
        let region = doc.fo.append(doc.page_sequence, FoKind::StaticContent).unwrap();
        for text in ["One", "Two"] {
            let block = doc.fo.append(region, FoKind::Block).unwrap();
            doc.fo.append_text(block, text).unwrap();
        }
        let master = PageMaster::new(100_000, 100_000);
        let config = LayoutConfig::default().with_page_masters(vec![master.with_before_extent(20_000)]);
        let pages = lay_out(&doc, &config);
        assert_eq!(pages[0].static_content[0].words(), ["One"]);
        assert_eq!(pages[0].static_content[0].bpd, 14_400);

        // no region-before at all
        let bare = LayoutConfig::default().with_page_masters(vec![master]);
        let bare_pages = lay_out(&doc, &bare);
        assert!(bare_pages[0].static_content[0].words().is_empty());
    }

    #[test]
    fn static_managers_are_dropped_after_each_page() {
        let mut doc = document();
        let region = doc.fo.append(doc.page_sequence, FoKind::StaticContent).unwrap();
        let header = doc.fo.append(region, FoKind::Block).unwrap();
        doc.fo.append_text(header, "Head").unwrap();
        for (index, text) in ["one", "two", "three"].into_iter().enumerate() {
            let block = doc.paragraph(text);
            if index > 0 {
                doc.set_keyword(block, "break-before", "page");
            }
        }
        let config = LayoutConfig::default();
        let mut tree = LayoutTree::new(&doc.fo, &config);
        let pages = PageBreaker::default().layout(&mut tree, doc.page_sequence).unwrap();

        assert_eq!(pages.len(), 3);
        assert!(pages.iter().all(|page| page.static_content[0].words() == ["Head"]));
        // the flow, its three blocks and their texts
        assert_eq!(tree.len(), 7);
    }

    #[test]
    fn keep_together_is_relaxed_when_nothing_fits() {
        let mut doc = document();
        single_line_breaks(&mut doc);
        let block = doc.paragraph("aa bb cc dd ee ff");
        doc.set_keyword(block, "keep-together", "always");
        let pages = lay_out(&doc, &small_pages());

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].body.words(), ["aa", "bb", "cc", "dd"]);
        assert_eq!(pages[1].body.words(), ["ee", "ff"]);
    }

    #[test]
    fn orphans_move_a_short_paragraph_to_the_next_page() {
        let mut doc = document();
        doc.paragraph("aa");
        // two lines that may not be split with the default two orphans
        doc.paragraph("bb cc dd ee");
        let pages = lay_out(&doc, &small_pages());

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].body.words(), ["aa"]);
        assert_eq!(pages[1].body.words(), ["bb", "cc", "dd", "ee"]);
        assert_eq!(areas_of(&pages[1].body, &AreaKind::Line).len(), 2);
    }

    #[test]
    fn carried_lines_are_rebroken_when_keeps_are_relaxed() {
        let mut doc = document();
        doc.paragraph("aa");
        // three lines with no break allowed between them
        doc.paragraph("bb cc dd ee ff");
        let pages = lay_out(&doc, &small_pages());

        let words: Vec<Vec<&str>> = pages.iter().map(|page| page.body.words()).collect();
        assert_eq!(words, [vec!["aa"], vec!["bb", "cc", "dd", "ee"], vec!["ff"]]);
    }

    #[test]
    fn break_before_starts_a_new_page() {
        let mut doc = document();
        doc.paragraph("first");
        let second = doc.paragraph("second");
        doc.set_keyword(second, "break-before", "page");
        let pages = lay_out(&doc, &LayoutConfig::default());

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].body.words(), ["first"]);
        assert_eq!(pages[1].body.words(), ["second"]);
    }

    #[test]
    fn retrieve_marker_shows_the_marker_of_each_page() {
        let mut doc = document();
        let header = doc.fo.append(doc.page_sequence, FoKind::StaticContent).unwrap();
        doc.fo
            .append(
                header,
                FoKind::RetrieveMarker {
                    class_name: "chapter".to_owned(),
                    position: RetrievePosition::FirstStartingWithinPage,
                },
            )
            .unwrap();
        for (title, body, new_page) in [("One", "alpha", false), ("Two", "beta", true)] {
            let block = doc.fo.append(doc.flow, FoKind::Block).unwrap();
            let marker = doc.fo.add_marker(block, "chapter").unwrap();
            doc.fo.append_text(marker, title).unwrap();
            doc.fo.append_text(block, body).unwrap();
            if new_page {
                doc.set_keyword(block, "break-before", "page");
            }
        }
        let pages = lay_out(&doc, &LayoutConfig::default());

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].body.words(), ["alpha"]);
        assert_eq!(pages[0].static_content[0].words(), ["One"]);
        assert_eq!(pages[1].body.words(), ["beta"]);
        assert_eq!(pages[1].static_content[0].words(), ["Two"]);
    }

    #[test]
    fn page_limit_is_enforced() {
        let mut doc = document();
        single_line_breaks(&mut doc);
        doc.paragraph("aa bb cc dd ee ff");
        let mut config = small_pages();
        config.max_pages = 1;
        let mut tree = LayoutTree::new(&doc.fo, &config);
        let error = PageBreaker::default().layout(&mut tree, doc.page_sequence).unwrap_err();
        assert_eq!(error.to_string(), "layout exceeds 1 pages");
    }

    #[test]
    fn page_sequence_without_flow_is_an_error() {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut fo = FoTree::new();
        let page_sequence = fo.append(fo.root(), FoKind::PageSequence).unwrap();
        let config = LayoutConfig::default();
        let mut tree = LayoutTree::new(&fo, &config);
        let error = PageBreaker::default().layout(&mut tree, page_sequence).unwrap_err();
        assert!(error.to_string().ends_with("has no flow"));
    }
}
