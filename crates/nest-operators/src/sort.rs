//! Sort configuration shared by key levels and leaf values.
//!
//! Sorting is stable everywhere. `reverse` flips every comparison instead of
//! reversing the output, so elements that compare equal keep their encounter
//! order in both directions.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use nest_core::Scalar;

pub type Comparator<E> = Arc<dyn Fn(&E, &E) -> Ordering + Send + Sync>;
pub type SortKeyFn<E> = Arc<dyn Fn(&E) -> Scalar + Send + Sync>;

/// How to order a set of keys (`E = Scalar`) or a leaf's records (`E = T`).
///
/// - key extractor set: elements are ordered by the extracted `Scalar`s,
///   computed once per element and compared with `key_comparator` (or
///   `Scalar` order when unset).
/// - comparator only: elements are ordered by the comparator.
/// - neither: keys use `Scalar` order; leaf records compare equal, so only
///   an explicit comparator or extractor reorders them.
///
/// For key sorts the element type is `Scalar` already, so a `comparator`
/// given next to an extractor compares the extracted keys. A record
/// comparator cannot see extracted keys; with an extractor it only breaks
/// ties.
pub struct SortSpec<E> {
    pub comparator: Option<Comparator<E>>,
    pub key_extractor: Option<SortKeyFn<E>>,
    pub key_comparator: Option<Comparator<Scalar>>,
    pub reverse: bool,
}

impl<E> Default for SortSpec<E> {
    fn default() -> Self {
        Self {
            comparator: None,
            key_extractor: None,
            key_comparator: None,
            reverse: false,
        }
    }
}

impl<E> Clone for SortSpec<E> {
    fn clone(&self) -> Self {
        Self {
            comparator: self.comparator.clone(),
            key_extractor: self.key_extractor.clone(),
            key_comparator: self.key_comparator.clone(),
            reverse: self.reverse,
        }
    }
}

impl<E> fmt::Debug for SortSpec<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortSpec")
            .field("comparator", &self.comparator.is_some())
            .field("key_extractor", &self.key_extractor.is_some())
            .field("key_comparator", &self.key_comparator.is_some())
            .field("reverse", &self.reverse)
            .finish()
    }
}

impl<E: 'static> SortSpec<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default ordering, reversed.
    pub fn descending() -> Self {
        Self::new().reversed()
    }

    pub fn by<F>(comparator: F) -> Self
    where
        F: Fn(&E, &E) -> Ordering + Send + Sync + 'static,
    {
        Self::new().with_comparator(comparator)
    }

    pub fn by_key<F, K>(extractor: F) -> Self
    where
        F: Fn(&E) -> K + Send + Sync + 'static,
        K: Into<Scalar> + 'static,
    {
        Self::new().with_key(extractor)
    }

    /// Order by `E`'s own `Ord`.
    pub fn natural() -> Self
    where
        E: Ord,
    {
        Self::by(|a: &E, b: &E| a.cmp(b))
    }

    pub fn with_comparator<F>(mut self, comparator: F) -> Self
    where
        F: Fn(&E, &E) -> Ordering + Send + Sync + 'static,
    {
        self.comparator = Some(Arc::new(comparator));
        self
    }

    pub fn with_key<F, K>(mut self, extractor: F) -> Self
    where
        F: Fn(&E) -> K + Send + Sync + 'static,
        K: Into<Scalar> + 'static,
    {
        self.key_extractor = Some(Arc::new(move |e: &E| extractor(e).into()));
        self
    }

    /// Compare extracted keys with `comparator` instead of `Scalar` order.
    pub fn with_key_comparator<F>(mut self, comparator: F) -> Self
    where
        F: Fn(&Scalar, &Scalar) -> Ordering + Send + Sync + 'static,
    {
        self.key_comparator = Some(Arc::new(comparator));
        self
    }

    pub fn reversed(self) -> Self {
        self.with_reverse(true)
    }

    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }
}

impl<E> SortSpec<E> {
    /// Stable sort of `items`, where `project` exposes the element each item
    /// is ordered by and `fallback` orders elements when neither a comparator
    /// nor a key extractor is set.
    pub(crate) fn sort_by_spec<X, P, D>(&self, items: Vec<X>, project: P, fallback: D) -> Vec<X>
    where
        P: Fn(&X) -> &E,
        D: Fn(&E, &E) -> Ordering,
    {
        let mut decorated: Vec<(Option<Scalar>, X)> = items
            .into_iter()
            .map(|x| {
                let key = self.key_extractor.as_ref().map(|f| f(project(&x)));
                (key, x)
            })
            .collect();

        decorated.sort_by(|(ka, a), (kb, b)| {
            let (ea, eb) = (project(a), project(b));
            let ord = match (ka, kb) {
                (Some(ka), Some(kb)) => {
                    let by_key = match &self.key_comparator {
                        Some(key_cmp) => key_cmp(ka, kb),
                        None => ka.cmp(kb),
                    };
                    match &self.comparator {
                        Some(cmp) => by_key.then_with(|| cmp(ea, eb)),
                        None => by_key,
                    }
                }
                _ => match &self.comparator {
                    Some(cmp) => cmp(ea, eb),
                    None => fallback(ea, eb),
                },
            };
            if self.reverse {
                ord.reverse()
            } else {
                ord
            }
        });

        decorated.into_iter().map(|(_, x)| x).collect()
    }
}

/// Order distinct group keys.
pub(crate) fn order_keys(spec: &SortSpec<Scalar>, keys: Vec<Scalar>) -> Vec<Scalar> {
    spec.sort_by_spec(keys, |k| k, Scalar::cmp)
}

/// Normalize a key-level spec: keys are scalars, so a comparator set next to
/// an extractor compares the extracted values.
pub(crate) fn key_order(mut spec: SortSpec<Scalar>) -> SortSpec<Scalar> {
    if spec.key_extractor.is_some() && spec.key_comparator.is_none() {
        spec.key_comparator = spec.comparator.take();
    }
    spec
}

/// Order a leaf's records.
pub(crate) fn order_values<'a, T>(spec: &SortSpec<T>, records: Vec<&'a T>) -> Vec<&'a T> {
    spec.sort_by_spec(records, |r| *r, |_, _| Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Scalar> {
        values.iter().map(|v| Scalar::I64(*v)).collect()
    }

    #[test]
    fn test_default_spec_sorts_keys_ascending() {
        let out = order_keys(&SortSpec::new(), ints(&[3, 1, 2]));
        assert_eq!(out, ints(&[1, 2, 3]));
    }

    #[test]
    fn test_reverse_keeps_ties_in_encounter_order() {
        // Compare by parity only: 4 and 2 tie, 3 and 1 tie.
        let spec = SortSpec::by(|a: &Scalar, b: &Scalar| {
            let pa = a.as_i64().unwrap_or(0) % 2;
            let pb = b.as_i64().unwrap_or(0) % 2;
            pa.cmp(&pb)
        })
        .reversed();
        let out = order_keys(&spec, ints(&[4, 3, 2, 1]));
        assert_eq!(out, ints(&[3, 1, 4, 2]));
    }

    fn strs(values: &[&str]) -> Vec<Scalar> {
        values.iter().map(|v| Scalar::from(*v)).collect()
    }

    #[test]
    fn test_key_comparator_orders_extracted_keys() {
        // Longest first; equal lengths keep encounter order.
        let spec = SortSpec::by_key(|s: &Scalar| s.to_string().len() as i64)
            .with_comparator(|a: &Scalar, b: &Scalar| b.cmp(a));
        let spec = key_order(spec);
        let out = order_keys(&spec, strs(&["bb", "a", "aa", "c"]));
        assert_eq!(out, strs(&["bb", "aa", "a", "c"]));

        let reversed = spec.reversed();
        let out = order_keys(&reversed, strs(&["bb", "a", "aa", "c"]));
        assert_eq!(out, strs(&["a", "c", "bb", "aa"]));
    }

    #[test]
    fn test_explicit_key_comparator_wins_over_promotion() {
        let spec = SortSpec::by_key(|s: &Scalar| s.to_string().len() as i64)
            .with_key_comparator(|a: &Scalar, b: &Scalar| a.cmp(b))
            .with_comparator(|a: &Scalar, b: &Scalar| b.cmp(a));
        // Short first by key; the raw comparator breaks the length ties.
        let out = order_keys(&key_order(spec), strs(&["bb", "a", "aa", "c"]));
        assert_eq!(out, strs(&["c", "a", "bb", "aa"]));
    }

    #[test]
    fn test_record_sort_with_key_comparator() {
        let data = [(1i64, 'x'), (3, 'y'), (2, 'z'), (3, 'w')];
        let refs: Vec<&(i64, char)> = data.iter().collect();
        let spec = SortSpec::by_key(|r: &(i64, char)| r.0)
            .with_key_comparator(|a: &Scalar, b: &Scalar| b.cmp(a))
            .with_comparator(|a: &(i64, char), b: &(i64, char)| a.1.cmp(&b.1));
        let out: Vec<char> = order_values(&spec, refs).into_iter().map(|r| r.1).collect();
        assert_eq!(out, ['w', 'y', 'z', 'x']);
    }

    #[test]
    fn test_values_without_ordering_are_left_alone() {
        let data = [5, 1, 3];
        let refs: Vec<&i32> = data.iter().collect();
        let out = order_values(&SortSpec::new().reversed(), refs.clone());
        assert_eq!(out, refs);

        let out = order_values(&SortSpec::natural(), refs);
        assert_eq!(out, vec![&1, &3, &5]);
    }
}
