//! Standard reference operations over std collections
//!
//! Inputs are deterministic functions of the size. Operations that leave
//! their input as they found it are marked repeatable so the profiler can
//! batch them; `vec_pop` and `vec_insert_front` undo their own change to
//! qualify. Lookups additionally spread a fixed set of lookups over the key
//! range so every execution touches the same amount of the structure.
//! Sorts consume their input and get one execution per fresh input;
//! `bubble_sort` profiles on its own smaller ladder.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasherDefault;
use std::hint::black_box;

use crate::profiler::{Reference, ReferenceRegistry};

/// Lookups per execution of lookup-style operations.
const LOOKUPS: u64 = 256;

/// Ladder for the quadratic sort: the run's largest sizes would take minutes.
const BUBBLE_SORT_SIZES: [usize; 5] = [200, 400, 800, 1_600, 3_200];

type DeterministicHashMap<K, V> = HashMap<K, V, BuildHasherDefault<DefaultHasher>>;

/// Ascending `0..n`.
#[must_use]
pub fn ascending(n: usize) -> Vec<u64> {
    (0..n as u64).collect()
}

/// Descending `n..0`, the worst case for exchange sorts.
#[must_use]
pub fn descending(n: usize) -> Vec<u64> {
    (0..n as u64).rev().collect()
}

/// Fixed-seed pseudo-random values (64-bit LCG).
#[must_use]
pub fn scrambled(n: usize) -> Vec<u64> {
    let mut state = 0x2545_f491_4f6c_dd1d_u64;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            state >> 11
        })
        .collect()
}

/// In-place bubble sort with early exit.
pub fn bubble_sort<T: Ord>(values: &mut [T]) {
    let len = values.len();
    for pass in 0..len {
        let mut swapped = false;
        for i in 0..len - 1 - pass {
            if values[i] > values[i + 1] {
                values.swap(i, i + 1);
                swapped = true;
            }
        }
        if !swapped {
            break;
        }
    }
}

/// Lookup keys spread evenly over `0..n`.
fn lookup_keys(n: u64) -> impl Iterator<Item = u64> {
    (0..LOOKUPS).map(move |i| i * n / LOOKUPS)
}

/// Registry of every builtin reference.
#[must_use]
pub fn registry() -> ReferenceRegistry {
    ReferenceRegistry::new()
        .with(
            "vec_index",
            Reference::new(ascending, |v| {
                black_box(v[black_box(v.len() - 1)]);
            })
            .repeatable()
            .describe("Vec element access by index"),
        )
        .with(
            "vec_pop",
            Reference::new(ascending, |v| {
                if let Some(last) = black_box(v.pop()) {
                    v.push(last);
                }
            })
            .repeatable()
            .describe("Vec::pop from the back, pushed back after"),
        )
        .with(
            "hashmap_get",
            Reference::new(
                |n| (0..n as u64).map(|k| (k, k)).collect::<DeterministicHashMap<u64, u64>>(),
                |map| {
                    let n = map.len() as u64;
                    for key in lookup_keys(n) {
                        black_box(map.get(&black_box(key)));
                    }
                },
            )
            .repeatable()
            .describe("HashMap::get, 256 lookups"),
        )
        .with(
            "binary_search",
            Reference::new(ascending, |v| {
                let n = v.len() as u64;
                for key in lookup_keys(n) {
                    let _ = black_box(v.binary_search(&black_box(key)));
                }
            })
            .repeatable()
            .describe("slice::binary_search on sorted data, 256 lookups"),
        )
        .with(
            "btreemap_get",
            Reference::new(
                |n| (0..n as u64).map(|k| (k, k)).collect::<BTreeMap<u64, u64>>(),
                |map| {
                    let n = map.len() as u64;
                    for key in lookup_keys(n) {
                        black_box(map.get(&black_box(key)));
                    }
                },
            )
            .repeatable()
            .describe("BTreeMap::get, 256 lookups"),
        )
        .with(
            "linear_scan",
            Reference::new(ascending, |v| {
                black_box(v.contains(&black_box(u64::MAX)));
            })
            .repeatable()
            .describe("slice::contains for an absent value"),
        )
        .with(
            "vec_clone",
            Reference::new(ascending, |v| {
                black_box(v.clone());
            })
            .repeatable()
            .describe("Vec::clone"),
        )
        .with(
            "vec_insert_front",
            Reference::new(
                |n| {
                    let mut v = Vec::with_capacity(n + 1);
                    v.extend(0..n as u64);
                    v
                },
                |v| {
                    v.insert(0, black_box(u64::MAX));
                    black_box(v.remove(0));
                },
            )
            .repeatable()
            .describe("Vec::insert at index 0 and remove it again, without reallocation"),
        )
        .with(
            "vec_sort",
            Reference::new(scrambled, |v| v.sort())
                .describe("slice::sort (stable) on scrambled data"),
        )
        .with(
            "bubble_sort",
            Reference::new(descending, |v| bubble_sort(black_box(v.as_mut_slice())))
                .input_sizes(BUBBLE_SORT_SIZES)
                .describe("bubble sort on reverse-ordered data"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inputs_are_deterministic() {
        assert_eq!(ascending(4), vec![0, 1, 2, 3]);
        assert_eq!(descending(4), vec![3, 2, 1, 0]);
        assert_eq!(scrambled(16), scrambled(16));
        assert_eq!(scrambled(16).len(), 16);
    }

    #[test]
    fn test_bubble_sort_sorts() {
        let mut values = descending(50);
        bubble_sort(&mut values);
        assert_eq!(values, ascending(50));

        let mut empty: Vec<u64> = Vec::new();
        bubble_sort(&mut empty);
        assert!(empty.is_empty());

        let mut scrambled_values = scrambled(100);
        bubble_sort(&mut scrambled_values);
        assert!(scrambled_values.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_lookup_keys_in_range() {
        let keys: Vec<u64> = lookup_keys(1000).collect();
        assert_eq!(keys.len(), 256);
        assert!(keys.iter().all(|&k| k < 1000));
    }

    #[test]
    fn test_repeatable_operations_restore_their_input() {
        let registry = registry();
        for name in ["vec_pop", "vec_insert_front"] {
            let reference = registry.get(name).unwrap();
            assert!(reference.is_repeatable(), "{name}");
        }

        let mut v = ascending(8);
        if let Some(last) = v.pop() {
            v.push(last);
        }
        assert_eq!(v, ascending(8));
    }

    #[test]
    fn test_sorts_are_not_batched() {
        let registry = registry();
        for name in ["vec_sort", "bubble_sort"] {
            assert!(!registry.get(name).unwrap().is_repeatable(), "{name}");
        }
        assert_eq!(registry.get("bubble_sort").unwrap().sizes(), Some(&BUBBLE_SORT_SIZES[..]));
        assert!(crate::profiler::validate_sizes(&BUBBLE_SORT_SIZES).is_ok());
    }

    #[test]
    fn test_registry_contents() {
        let registry = registry();
        assert_eq!(registry.len(), 10);
        for name in ["vec_index", "linear_scan", "vec_sort", "bubble_sort"] {
            assert!(registry.contains(name), "missing {name}");
            assert!(registry.get(name).unwrap().description().is_some());
        }
    }
}
