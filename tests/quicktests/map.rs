use avl::{KeyValue, Map};

use std::collections::BTreeMap;

use crate::Op;

/// Applies a set of operations to a map and a `BTreeMap`.
/// This way we can ensure that after a random smattering of writes
/// and removes both hold the same entries in the same order.
fn do_ops<K, V>(ops: &[Op<K, V>], map: &mut Map<K, V>, model: &mut BTreeMap<K, V>)
where
    K: Ord + Clone,
    V: Clone,
{
    for op in ops {
        match op {
            Op::Insert(k, v) => {
                map.set(k.clone(), Some(v.clone()));
                model.insert(k.clone(), v.clone());
            }
            Op::Remove(k) => {
                map.set(k.clone(), None);
                model.remove(k);
            }
        }
    }
}

#[quickcheck]
fn fuzz_multiple_operations_i8(ops: Vec<Op<i8, i8>>) -> bool {
    let mut map: Map<i8, i8> = Map::new();
    let mut model = BTreeMap::new();

    do_ops(&ops, &mut map, &mut model);
    map.len() == model.len()
        && (i8::MIN..=i8::MAX).all(|key| map.get(&key) == model.get(&key))
        && map
            .iter()
            .map(|element| (element.key(), element.value()))
            .eq(model.iter())
}

#[quickcheck]
fn set_returns_previous(ops: Vec<Op<u8, u16>>) -> bool {
    let mut map: Map<u8, u16> = Map::new();
    let mut model = BTreeMap::new();

    ops.iter().all(|op| match op {
        Op::Insert(k, v) => map.set(*k, Some(*v)) == model.insert(*k, *v),
        Op::Remove(k) => map.remove_key(k) == model.remove(k),
    })
}
