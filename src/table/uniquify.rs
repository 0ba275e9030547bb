// src/table/uniquify.rs

use std::collections::{HashMap, HashSet};

/// Make column names pairwise distinct while keeping their order.
///
/// The first occurrence of a name is kept as is; the k-th repeat becomes
/// `name_k`. If a suffixed name is itself already taken the counter keeps
/// climbing until a free name is found.
pub fn uniquify<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut repeats: HashMap<&str, usize> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::with_capacity(names.len());
    let mut out = Vec::with_capacity(names.len());

    for name in names {
        let name = name.as_ref();
        let count = repeats.entry(name).or_insert(0);
        let candidate = if *count == 0 && !taken.contains(name) {
            name.to_string()
        } else {
            loop {
                *count += 1;
                let suffixed = format!("{}_{}", name, count);
                if !taken.contains(&suffixed) {
                    break suffixed;
                }
            }
        };
        taken.insert(candidate.clone());
        out.push(candidate);
    }
    out
}
