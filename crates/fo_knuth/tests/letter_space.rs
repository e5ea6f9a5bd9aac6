#[cfg(test)]
mod tests {
    use fo_knuth::{
        Element, KnuthSequence, LetterSpacing, ManagerId, Millipoints, NoLetterSpacing, SequenceKind,
    };
    use smallvec::SmallVec;

    const OWNER: ManagerId = ManagerId::new(7);

    /// Records every request and answers with one widened box.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<(ManagerId, Vec<Element>)>,
    }

    impl LetterSpacing for Recorder {
        fn add_letter_space_to(
            &mut self,
            owner: ManagerId,
            removed: SmallVec<Element, 4>,
        ) -> Vec<Element> {
            let width: Millipoints = removed.iter().map(Element::width).sum();
            self.calls.push((owner, removed.into_vec()));
            vec![Element::new_box(width + 250, 0).with_owner(owner)]
        }
    }

    fn inline(elements: Vec<Element>) -> KnuthSequence {
        KnuthSequence::from_elements(SequenceKind::Inline, elements)
    }

    fn word(width: Millipoints) -> Element {
        Element::new_box(width, 0).with_owner(OWNER)
    }

    #[test]
    fn auxiliary_tail_is_replaced_by_owner() {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut first = inline(vec![
            word(5),
            Element::penalty(0, false),
            Element::glue(3, 2, 0),
            Element::auxiliary_box(0, 0).with_owner(OWNER),
        ]);
        let mut second = inline(vec![word(4)]);
        let mut recorder = Recorder::default();

        assert!(first.append(&mut second, &mut recorder));
        assert_eq!(recorder.calls.len(), 1);
        let (owner, removed) = &recorder.calls[0];
        assert_eq!(*owner, OWNER);
        assert_eq!(removed.len(), 4);
        assert!(removed[0].is_box() && !removed[0].is_auxiliary());
        assert!(removed[3].is_auxiliary());

        // one replacement element plus the appended box, instead of 5
        assert_eq!(first.len(), 2);
        assert_eq!(first.elements()[0].width(), 5 + 3 + 250);
        assert_eq!(first.elements()[1].width(), 4);
        assert!(second.is_empty());
    }

    #[test]
    fn adjacent_words_get_a_letter_space() {
        let mut first = inline(vec![word(5)]);
        let mut second = inline(vec![word(4), Element::glue(1, 1, 0)]);
        let mut recorder = Recorder::default();

        assert!(first.append(&mut second, &mut recorder));
        assert_eq!(recorder.calls.len(), 1);
        assert_eq!(first.len(), 3);
        assert_eq!(first.elements()[0].width(), 255);
    }

    #[test]
    fn no_insertion_without_adjacent_content_boxes() {
        let cases = [
            // other starts with glue
            (vec![word(5)], vec![Element::glue(1, 0, 0), word(4)]),
            // other starts with an auxiliary box
            (vec![word(5)], vec![Element::auxiliary_box(2, 0), word(4)]),
            // receiver ends with a zero-width box
            (vec![word(0)], vec![word(4)]),
            // receiver ends with penalty
            (vec![word(5), Element::penalty(0, false)], vec![word(4)]),
            // auxiliary tail without the expected pattern
            (
                vec![word(5), Element::glue(3, 2, 0), Element::auxiliary_box(0, 0)],
                vec![word(4)],
            ),
            // pattern whose opening box is itself auxiliary
            (
                vec![
                    Element::auxiliary_box(5, 0),
                    Element::penalty(0, false),
                    Element::glue(3, 2, 0),
                    Element::auxiliary_box(0, 0),
                ],
                vec![word(4)],
            ),
        ];

        for (receiver, appended) in cases {
            let expected = receiver.len() + appended.len();
            let mut first = inline(receiver);
            let mut second = inline(appended);
            let mut recorder = Recorder::default();
            assert!(first.append(&mut second, &mut recorder));
            assert!(recorder.calls.is_empty());
            assert_eq!(first.len(), expected);
        }
    }

    #[test]
    fn closed_receiver_rejects_append_untouched() {
        let mut first = inline(vec![word(5)]);
        first.close();
        let mut second = inline(vec![word(4)]);
        let (first_before, second_before) = (first.clone(), second.clone());

        assert!(!first.append(&mut second, &mut NoLetterSpacing));
        assert_eq!(first, first_before);
        assert_eq!(second, second_before);
    }

    #[test]
    fn inline_runs_concatenate_in_order() {
        let mut first = inline(vec![word(5), Element::glue(1, 1, 1)]);
        let mut second = inline(vec![word(4), Element::glue(1, 1, 1), word(3)]);
        second.close();

        assert!(first.append(&mut second, &mut NoLetterSpacing));
        assert_eq!(first.len(), 6);
        let widths: Vec<Millipoints> = first.elements().iter().map(Element::width).collect();
        assert_eq!(widths, [5, 1, 4, 1, 3, 0]);
        // the trailing margin travels with the closing penalty
        assert_eq!(first.ignore_at_end(), 1);
        assert!(!first.is_closed());
        assert!(first.is_well_formed());
    }
}
