/// Splits `items` into `number_of_groups` contiguous groups, minimising the
/// heaviest group's total weight. Missing groups are padded with empty ones.
pub fn group_evenly<T, F>(items: &[T], number_of_groups: usize, weight: F) -> Vec<Vec<T>>
where
    T: Clone,
    F: Fn(&T) -> usize,
{
    if items.is_empty() {
        return Vec::new();
    }

    let weights: Vec<usize> = items.iter().map(weight).collect();
    let running_totals = running_totals(&weights);

    let mut group_sizes = vec![items.len()];
    let mut largest_size: usize = weights.iter().sum();

    while let Some(limit) = largest_size.checked_sub(1) {
        match split(&running_totals, limit) {
            Some((sizes, largest)) if sizes.len() <= number_of_groups => {
                group_sizes = sizes;
                largest_size = largest;
            }
            _ => break,
        }
    }

    let mut start = 0;
    let mut groups: Vec<Vec<T>> = group_sizes
        .iter()
        .map(|size| {
            let group = items[start..start + size].to_vec();
            start += size;
            group
        })
        .collect();

    while groups.len() < number_of_groups {
        groups.push(Vec::new());
    }

    groups
}

// Row i holds the cumulative weights of items i.., so row[j] is the weight of
// a group spanning items i..=i+j.
fn running_totals(weights: &[usize]) -> Vec<Vec<usize>> {
    (0..weights.len())
        .map(|i| {
            weights[i..]
                .iter()
                .scan(0, |total, weight| {
                    *total += weight;
                    Some(*total)
                })
                .collect()
        })
        .collect()
}

/// Greedy split where no group exceeds `limit`. Returns the group sizes and
/// the heaviest group, or `None` if a single item is already too heavy.
fn split(running_totals: &[Vec<usize>], limit: usize) -> Option<(Vec<usize>, usize)> {
    let mut group_sizes = Vec::new();
    let mut largest = 0;
    let mut i = 0;

    while i < running_totals.len() {
        let row = &running_totals[i];
        if row[0] > limit {
            return None;
        }

        let mut j = 0;
        while j + 1 < row.len() && row[j + 1] <= limit {
            j += 1;
        }

        largest = largest.max(row[j]);
        group_sizes.push(j + 1);
        i += j + 1;
    }

    Some((group_sizes, largest))
}
