use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    pub label: String,
    pub count: usize,
}

/// Value counts, most frequent first. Ties keep the order of first appearance.
pub fn tally(items: impl IntoIterator<Item = String>) -> Vec<Tally> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<Tally> = Vec::new();

    for item in items {
        match index.get(&item) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(item.clone(), counts.len());
                counts.push(Tally { label: item, count: 1 });
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}
