//! Top-N rankings.

/// The `n` highest-scoring items, best first. The sort is stable, so items
/// with equal scores keep their input order.
pub fn top_n<T, F>(items: &[T], score: F, n: usize) -> Vec<&T>
where
    F: Fn(&T) -> f64,
{
    let mut scored: Vec<(f64, &T)> = items.iter().map(|item| (score(item), item)).collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().take(n).map(|(_, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_highest_scores_first() {
        let values = [3.0, 9.0, 1.0, 7.0];
        let top = top_n(&values, |v| *v, 2);
        assert_eq!(top, vec![&9.0, &7.0]);
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let items = [("a", 5.0), ("b", 8.0), ("c", 5.0), ("d", 5.0)];
        let top = top_n(&items, |i| i.1, 4);
        let names: Vec<_> = top.iter().map(|i| i.0).collect();
        assert_eq!(names, vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn n_larger_than_input_returns_everything() {
        let items: [f64; 2] = [1.0, 2.0];
        assert_eq!(top_n(&items, |v| *v, 10).len(), 2);
        assert!(top_n(&items, |v| *v, 0).is_empty());
        assert!(top_n::<f64, _>(&[], |v| *v, 3).is_empty());
    }
}
