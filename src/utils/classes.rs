use std::hash::Hash;

/// Invert a map by swapping keys and values
pub fn invert_map<K, V, MK, MV>(original: MK) -> MV
where
    K: Ord + Hash + Eq,
    V: Ord + Hash + Eq + Clone,
    MK: IntoIterator<Item = (K, V)>,
    MV: FromIterator<(V, K)>,
{
    original
        .into_iter()
        .map(|(key, value)| (value, key))
        .collect()
}

/// Index of the largest value; ties go to the lowest index
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (index, value)| match best {
            Some((_, top)) if *value <= top => best,
            _ => Some((index, *value)),
        })
        .map(|(index, _)| index)
}

/// Exponentiate and normalize logits in place
pub fn softmax_in_place(logits: &mut [f32]) {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    let mut sum = 0.0;
    for logit in logits.iter_mut() {
        *logit = (*logit - max).exp();
        sum += *logit;
    }

    if sum > 0.0 {
        for p in logits.iter_mut() {
            *p /= sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn inverts_pairs() {
        let inverted: HashMap<&str, usize> = invert_map(vec![(0, "bug"), (1, "docs")]);

        assert_eq!(inverted["docs"], 1);
    }

    #[test]
    fn argmax_prefers_first_of_ties() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn softmax_sums_to_one() {
        let mut logits = vec![1.0, 2.0, 3.0];
        softmax_in_place(&mut logits);

        assert!((logits.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!(logits[2] > logits[1] && logits[1] > logits[0]);

        let mut single = vec![-4.2];
        softmax_in_place(&mut single);
        assert_eq!(single, vec![1.0]);
    }
}
