/*!
A declarative filter + sort + limit combinator, reused by the in-memory
metadata store's `list` and by the default scan-and-filter
[crate::observations::storage_adapter::ObservationsStorage::query_rows]
implementation.

Callers build the active predicate list themselves (only pushing a
predicate when its keyed option is present), apply a total sort order,
then cap with an optional limit applied strictly after sorting.
*/

use std::cmp::Ordering;

/// A boxed, possibly-borrowing predicate over `&T`.
pub type Predicate<'a, T> = Box<dyn Fn(&T) -> bool + 'a>;

/// Filter `items` by the conjunction of `predicates`, sort by `cmp`,
/// then truncate to `limit` if given. `limit: Some(0)` yields an empty
/// result.
pub fn filter_sort_limit<T>(
    items: Vec<T>,
    predicates: &[Predicate<'_, T>],
    mut cmp: impl FnMut(&T, &T) -> Ordering,
    limit: Option<usize>,
) -> Vec<T> {
    let mut filtered: Vec<T> = items
        .into_iter()
        .filter(|item| predicates.iter().all(|p| p(item)))
        .collect();
    filtered.sort_by(&mut cmp);
    if let Some(limit) = limit {
        filtered.truncate(limit);
    }
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_are_conjunctive() {
        let items = vec![1, 2, 3, 4, 5, 6];
        let predicates: Vec<Predicate<i32>> = vec![
            Box::new(|x: &i32| *x % 2 == 0),
            Box::new(|x: &i32| *x > 2),
        ];
        let result = filter_sort_limit(items, &predicates, |a, b| a.cmp(b), None);
        assert_eq!(result, vec![4, 6]);
    }

    #[test]
    fn test_no_predicates_keeps_everything() {
        let items = vec![3, 1, 2];
        let result = filter_sort_limit(items, &[], |a, b| a.cmp(b), None);
        assert_eq!(result, vec![1, 2, 3]);
    }

    #[test]
    fn test_limit_zero_yields_nothing() {
        let items = vec![1, 2, 3];
        let result = filter_sort_limit(items, &[], |a, b| a.cmp(b), Some(0));
        assert!(result.is_empty());
    }

    #[test]
    fn test_limit_applied_after_sort() {
        let items = vec![5, 1, 3, 2, 4];
        let result = filter_sort_limit(items, &[], |a, b| b.cmp(a), Some(2));
        assert_eq!(result, vec![5, 4]);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_result_length_never_exceeds_limit(
            items in prop::collection::vec(any::<i32>(), 0..64),
            limit in 0usize..64,
        ) {
            let result = filter_sort_limit(items, &[], |a, b| a.cmp(b), Some(limit));
            prop_assert!(result.len() <= limit);
        }

        #[test]
        fn test_result_is_sorted_ascending(items in prop::collection::vec(any::<i32>(), 0..64)) {
            let result = filter_sort_limit(items, &[], |a, b| a.cmp(b), None);
            for window in result.windows(2) {
                prop_assert!(window[0] <= window[1]);
            }
        }

        #[test]
        fn test_every_element_satisfies_every_predicate(items in prop::collection::vec(any::<i32>(), 0..64)) {
            let predicates: Vec<Predicate<i32>> = vec![
                Box::new(|x: &i32| *x % 2 == 0),
                Box::new(|x: &i32| *x >= 0),
            ];
            let result = filter_sort_limit(items, &predicates, |a, b| a.cmp(b), None);
            prop_assert!(result.iter().all(|x| *x % 2 == 0 && *x >= 0));
        }
    }
}
