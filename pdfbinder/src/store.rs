//! Ordered collection of pending inputs.
//!
//! Store order is output order: pages of the first item come first in a
//! merge, and so on. The store enforces `(name, size)` uniqueness on insert
//! for PDF inputs; reordering and sorting never re-check it.

use std::cmp::Ordering;
use std::str::FromStr;

use tracing::debug;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::error::{PdfBinderError, Result};
use crate::item::{InputItem, InputKind, RawInput};

/// Sort orders offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// A to Z.
    NameAsc,
    /// Z to A.
    NameDesc,
    /// Most recently modified first.
    DateDesc,
}

impl FromStr for SortKey {
    type Err = PdfBinderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "name-asc" | "az" => Ok(Self::NameAsc),
            "name-desc" | "za" => Ok(Self::NameDesc),
            "date" | "date-desc" => Ok(Self::DateDesc),
            _ => Err(PdfBinderError::invalid_config(format!(
                "Invalid sort key: {s}. Must be one of: name-asc, name-desc, date"
            ))),
        }
    }
}

/// What an `add` call did with its candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddOutcome {
    /// Items appended to the store.
    pub added: usize,
    /// Candidates dropped because an equal `(name, size)` was already there.
    pub duplicates: usize,
    /// Candidates dropped because their MIME type did not match.
    pub rejected: usize,
}

/// Ordered sequence of [`InputItem`]s.
#[derive(Debug, Clone, Default)]
pub struct Store {
    items: Vec<InputItem>,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the candidates that match `kind`.
    ///
    /// For [`InputKind::Pdf`] candidates duplicating an item already in the
    /// store, or an earlier candidate of the same batch, are dropped.
    ///
    /// # Errors
    ///
    /// [`PdfBinderError::NoValidInput`] when no PDF candidate matched the
    /// kind. The store is left untouched. Image batches never fail.
    pub fn add<I>(&mut self, candidates: I, kind: InputKind) -> Result<AddOutcome>
    where
        I: IntoIterator<Item = RawInput>,
    {
        let mut outcome = AddOutcome::default();
        let mut accepted = Vec::new();

        for raw in candidates {
            if kind.accepts(&raw.mime) {
                accepted.push(InputItem::from(raw));
            } else {
                debug!(name = %raw.name, mime = %raw.mime, "rejected input of the wrong kind");
                outcome.rejected += 1;
            }
        }

        if accepted.is_empty() && kind == InputKind::Pdf {
            return Err(PdfBinderError::NoValidInput {
                expected: kind.label(),
            });
        }

        for item in accepted {
            if kind == InputKind::Pdf && self.contains_duplicate_of(&item) {
                debug!(name = item.name(), size = item.size(), "skipped duplicate input");
                outcome.duplicates += 1;
                continue;
            }
            self.items.push(item);
            outcome.added += 1;
        }

        Ok(outcome)
    }

    /// Remove and return the item at `index`.
    pub fn remove_at(&mut self, index: usize) -> Result<InputItem> {
        self.check_index(index)?;
        Ok(self.items.remove(index))
    }

    /// Move the item at `from` so that it ends up at `to`.
    ///
    /// The item is taken out first and reinserted at `to` in the shortened
    /// sequence, so every other item keeps its relative order. Equal indices
    /// are a no-op.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(());
        }

        let item = self.items.remove(from);
        self.items.insert(to, item);
        Ok(())
    }

    /// Stable sort by `key`.
    pub fn sort(&mut self, key: SortKey) {
        match key {
            SortKey::NameAsc => self.items.sort_by(|a, b| collate(a.name(), b.name())),
            SortKey::NameDesc => self.items.sort_by(|a, b| collate(b.name(), a.name())),
            SortKey::DateDesc => self
                .items
                .sort_by(|a, b| b.last_modified().cmp(&a.last_modified())),
        }
    }

    /// Drop every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the store holds nothing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at `index`.
    pub fn get(&self, index: usize) -> Option<&InputItem> {
        self.items.get(index)
    }

    /// Iterate in store order.
    pub fn iter(&self) -> std::slice::Iter<'_, InputItem> {
        self.items.iter()
    }

    /// Snapshot of the items, used to hand work to the pipeline.
    pub fn snapshot(&self) -> Vec<InputItem> {
        self.items.clone()
    }

    /// Names in store order.
    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(InputItem::name).collect()
    }

    fn contains_duplicate_of(&self, item: &InputItem) -> bool {
        self.items.iter().any(|existing| existing.is_duplicate_of(item))
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(PdfBinderError::IndexOutOfRange {
                index,
                len: self.items.len(),
            })
        }
    }
}

impl<'a> IntoIterator for &'a Store {
    type Item = &'a InputItem;
    type IntoIter = std::slice::Iter<'a, InputItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Compare two names the way a user expects to see them listed.
///
/// Primary order ignores case and accents, whether the accent is precomposed
/// or a separate combining mark; lowercase sorts before uppercase on a tie;
/// the raw code points decide the rest, so only identical strings compare
/// equal.
pub fn collate(a: &str, b: &str) -> Ordering {
    fold(a)
        .cmp(fold(b))
        .then_with(|| {
            let case = |c: char| !c.is_lowercase();
            a.chars().map(case).cmp(b.chars().map(case))
        })
        .then_with(|| a.cmp(b))
}

fn fold(name: &str) -> impl Iterator<Item = char> + '_ {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::PDF_MIME;
    use rstest::rstest;

    fn pdf(name: &str, size: usize, last_modified: i64) -> RawInput {
        RawInput::from_bytes(name, PDF_MIME, last_modified, vec![0; size])
    }

    fn image(name: &str, mime: &str) -> RawInput {
        RawInput::from_bytes(name, mime, 0, vec![0; 4])
    }

    fn store_of(names: &[&str]) -> Store {
        let mut store = Store::new();
        store
            .add(
                names.iter().enumerate().map(|(i, n)| pdf(n, 10 + i, i as i64)),
                InputKind::Pdf,
            )
            .unwrap();
        store
    }

    #[test]
    fn test_add_duplicate_is_noop() {
        let mut store = Store::new();
        store.add([pdf("a.pdf", 10, 1)], InputKind::Pdf).unwrap();
        let outcome = store.add([pdf("a.pdf", 10, 2)], InputKind::Pdf).unwrap();

        assert_eq!(store.names(), vec!["a.pdf"]);
        assert_eq!(outcome.added, 0);
        assert_eq!(outcome.duplicates, 1);
    }

    #[test]
    fn test_add_same_name_different_size_is_kept() {
        let mut store = Store::new();
        store
            .add([pdf("a.pdf", 10, 1), pdf("a.pdf", 11, 1)], InputKind::Pdf)
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_add_dedups_within_batch() {
        let mut store = Store::new();
        let outcome = store
            .add([pdf("a.pdf", 10, 1), pdf("a.pdf", 10, 5)], InputKind::Pdf)
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(outcome.duplicates, 1);
    }

    #[test]
    fn test_add_filters_kind_and_keeps_order() {
        let mut store = Store::new();
        let outcome = store
            .add(
                [
                    pdf("b.pdf", 1, 0),
                    image("x.png", "image/png"),
                    pdf("a.pdf", 2, 0),
                ],
                InputKind::Pdf,
            )
            .unwrap();

        assert_eq!(store.names(), vec!["b.pdf", "a.pdf"]);
        assert_eq!(
            outcome,
            AddOutcome {
                added: 2,
                duplicates: 0,
                rejected: 1
            }
        );
    }

    #[test]
    fn test_add_no_valid_pdf_fails_without_mutation() {
        let mut store = store_of(&["a.pdf"]);
        let err = store
            .add([image("x.png", "image/png")], InputKind::Pdf)
            .unwrap_err();

        assert!(matches!(err, PdfBinderError::NoValidInput { .. }));
        assert_eq!(store.names(), vec!["a.pdf"]);
    }

    #[test]
    fn test_add_images_never_fails_and_keeps_duplicates() {
        let mut store = Store::new();
        let outcome = store
            .add([pdf("a.pdf", 1, 0)], InputKind::Image)
            .unwrap();
        assert_eq!(outcome.added, 0);
        assert!(store.is_empty());

        store
            .add(
                [image("x.png", "image/png"), image("x.png", "image/png")],
                InputKind::Image,
            )
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_remove_at() {
        let mut store = store_of(&["a.pdf", "b.pdf", "c.pdf"]);
        let removed = store.remove_at(1).unwrap();
        assert_eq!(removed.name(), "b.pdf");
        assert_eq!(store.names(), vec!["a.pdf", "c.pdf"]);
    }

    #[test]
    fn test_remove_at_out_of_range() {
        let mut store = store_of(&["a.pdf"]);
        let err = store.remove_at(1).unwrap_err();
        assert!(matches!(
            err,
            PdfBinderError::IndexOutOfRange { index: 1, len: 1 }
        ));
    }

    #[rstest]
    #[case(0, 2, &["b", "c", "a", "d"])]
    #[case(3, 0, &["d", "a", "b", "c"])]
    #[case(1, 2, &["a", "c", "b", "d"])]
    #[case(2, 1, &["a", "c", "b", "d"])]
    #[case(1, 1, &["a", "b", "c", "d"])]
    fn test_move_item_splice_semantics(
        #[case] from: usize,
        #[case] to: usize,
        #[case] expected: &[&str],
    ) {
        let mut store = store_of(&["a", "b", "c", "d"]);
        store.move_item(from, to).unwrap();
        assert_eq!(store.names(), expected);
    }

    #[test]
    fn test_move_item_preserves_multiset_for_all_pairs() {
        let names = ["a", "b", "c", "d", "e"];
        for from in 0..names.len() {
            for to in 0..names.len() {
                let mut store = store_of(&names);
                store.move_item(from, to).unwrap();

                let after = store.names();
                assert_eq!(after[to], names[from]);

                let mut sorted = after.clone();
                sorted.sort();
                assert_eq!(sorted, names);

                let others_before: Vec<&str> =
                    names.iter().copied().filter(|n| *n != names[from]).collect();
                let others_after: Vec<&str> =
                    after.iter().copied().filter(|n| *n != names[from]).collect();
                assert_eq!(others_before, others_after);
            }
        }
    }

    #[test]
    fn test_move_item_out_of_range() {
        let mut store = store_of(&["a", "b"]);
        assert!(store.move_item(0, 2).is_err());
        assert!(store.move_item(2, 0).is_err());
        assert_eq!(store.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_sort_name_desc_reverses_name_asc() {
        let mut store = store_of(&["delta.pdf", "Alpha.pdf", "charlie.pdf", "Bravo.pdf"]);

        store.sort(SortKey::NameAsc);
        let ascending = store.names().into_iter().map(String::from).collect::<Vec<_>>();
        assert_eq!(
            ascending,
            vec!["Alpha.pdf", "Bravo.pdf", "charlie.pdf", "delta.pdf"]
        );

        store.sort(SortKey::NameDesc);
        let mut descending = store.names().into_iter().map(String::from).collect::<Vec<_>>();
        descending.reverse();
        assert_eq!(descending, ascending);
    }

    #[test]
    fn test_sort_date_desc_is_stable() {
        let mut store = Store::new();
        store
            .add(
                [
                    pdf("old.pdf", 1, 100),
                    pdf("tie-first.pdf", 2, 200),
                    pdf("new.pdf", 3, 300),
                    pdf("tie-second.pdf", 4, 200),
                ],
                InputKind::Pdf,
            )
            .unwrap();

        store.sort(SortKey::DateDesc);
        assert_eq!(
            store.names(),
            vec!["new.pdf", "tie-first.pdf", "tie-second.pdf", "old.pdf"]
        );
    }

    #[test]
    fn test_collate() {
        assert_eq!(collate("apple", "Banana"), Ordering::Less);
        assert_eq!(collate("école", "ecole2"), Ordering::Less);
        assert_eq!(collate("e\u{301}cole.pdf", "ecole2.pdf"), Ordering::Less);
        assert_eq!(collate("a", "A"), Ordering::Less);
        assert_eq!(collate("same", "same"), Ordering::Equal);
        assert_eq!(collate("Zeta", "alpha"), Ordering::Greater);
    }

    #[rstest]
    #[case("šb.pdf", "sc.pdf")]
    #[case("őa.pdf", "ob.pdf")]
    #[case("Ăa.pdf", "ab.pdf")]
    #[case("e\u{301}a.pdf", "éb.pdf")]
    fn test_collate_folds_extended_latin(#[case] first: &str, #[case] second: &str) {
        assert_eq!(collate(first, second), Ordering::Less);
        assert_eq!(collate(second, first), Ordering::Greater);
    }

    #[test]
    fn test_sort_decomposed_names() {
        let mut store = store_of(&["zeta.pdf", "e\u{301}te\u{301}.pdf", "Alpha.pdf"]);
        store.sort(SortKey::NameAsc);
        assert_eq!(
            store.names(),
            vec!["Alpha.pdf", "e\u{301}te\u{301}.pdf", "zeta.pdf"]
        );
    }


    #[test]
    fn test_sort_key_from_str() {
        assert_eq!("az".parse::<SortKey>().unwrap(), SortKey::NameAsc);
        assert_eq!("name-desc".parse::<SortKey>().unwrap(), SortKey::NameDesc);
        assert_eq!("date".parse::<SortKey>().unwrap(), SortKey::DateDesc);
        assert!("size".parse::<SortKey>().is_err());
    }
}
